//! Provider-side 402 issuance and `X-Payment` extraction (spec §4.D).
//!
//! A protected-resource handler uses [`challenge_response`] to issue a 402
//! when no `X-Payment` header is present, and [`extract_payment`] plus
//! [`verify_task_hash`] to decode and bind an incoming header to the exact
//! challenge it answers. Recomputing the task hash from the challenge-echoed
//! `service_id`/`task_data` and the envelope's `nonce` is what makes replay
//! against a different request fail closed (spec §4.D, property P4).

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use taskrow_core::hash::task_hash;
use taskrow_core::EscrowError;

use crate::challenge::{PaymentChallenge, PaymentChallengeBody};
use crate::envelope::{decode_header, XPaymentEnvelope};
use crate::error::X402Error;

const PAYMENT_HEADER: &str = "X-Payment";

/// Builds the `402 Payment Required` response carrying `challenge` as its
/// body (spec §3, §6).
pub fn challenge_response(challenge: PaymentChallenge) -> Response {
    (StatusCode::PAYMENT_REQUIRED, Json(PaymentChallengeBody::new(challenge))).into_response()
}

/// Reads and decodes the `X-Payment` header, if present.
///
/// Returns `Ok(None)` when the header is absent (the caller should issue a
/// fresh challenge), `Ok(Some(_))` on a well-formed envelope, and `Err` on a
/// malformed header (bad base64/JSON) — spec §7 `BadRequest`.
pub fn extract_payment(headers: &HeaderMap) -> Result<Option<XPaymentEnvelope>, X402Error> {
    let Some(value) = headers.get(PAYMENT_HEADER) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|e| EscrowError::bad_request(format!("non-UTF8 X-Payment header: {e}")))?;
    Ok(Some(decode_header(value)?))
}

/// Recomputes the expected task hash from the challenge-echoed
/// `service_id`/`task_data` and the envelope's `nonce`, and checks it
/// against the envelope's own claimed `task_hash` (spec §4.D, P4).
///
/// This binds a payment to the exact request it answers: replaying a valid
/// header against a different `service_id`/`task_data` pair fails here.
pub fn verify_task_hash(
    challenge: &PaymentChallenge,
    envelope: &XPaymentEnvelope,
) -> Result<(), X402Error> {
    let expected = task_hash(&challenge.service_id, &challenge.task_data, envelope.payload.nonce);
    let claimed = envelope.task_hash_bytes()?;
    if expected != claimed {
        return Err(EscrowError::TaskHashMismatch.into());
    }
    Ok(())
}

impl IntoResponse for X402Error {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            X402Error::Escrow(EscrowError::BadRequest(_)) => (StatusCode::BAD_REQUEST, "bad_request"),
            X402Error::Escrow(EscrowError::SchemeMismatch(_)) => {
                (StatusCode::BAD_REQUEST, "scheme_mismatch")
            }
            X402Error::Escrow(EscrowError::TaskHashMismatch) => {
                (StatusCode::BAD_REQUEST, "task_hash_mismatch")
            }
            X402Error::Escrow(EscrowError::NotVerified(_)) => {
                (StatusCode::PAYMENT_REQUIRED, "not_verified")
            }
            X402Error::Escrow(EscrowError::WrongStatus(_) | EscrowError::AlreadyExists) => {
                (StatusCode::CONFLICT, "conflict")
            }
            X402Error::Escrow(EscrowError::WrongSigner | EscrowError::WrongAuthority) => {
                (StatusCode::FORBIDDEN, "forbidden")
            }
            X402Error::Escrow(EscrowError::TransientNetwork(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "transient_network")
            }
            X402Error::DoublePaywall => (StatusCode::BAD_GATEWAY, "double_paywall"),
            X402Error::Transport(_) | X402Error::Escrow(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        };
        (status, Json(json!({ "error": kind, "details": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{encode_header, Payload};

    fn sample_challenge() -> PaymentChallenge {
        PaymentChallenge {
            recipient: "Provider1111111111111111111111111111111111".into(),
            escrow_program: "EscRow11111111111111111111111111111111111".into(),
            amount: 8.0,
            token: "TKN".into(),
            network: "devnet".into(),
            service_id: "s1".into(),
            task_data: "Q4".into(),
        }
    }

    fn sample_envelope(nonce: u64, hash: [u8; 32]) -> XPaymentEnvelope {
        XPaymentEnvelope::new(
            "devnet",
            Payload {
                serialized_transaction: "dGVzdA==".into(),
                escrow_pda: "EscrowPda111111111111111111111111111111111".into(),
                service_id: "s1".into(),
                task_hash: hex::encode(hash),
                nonce,
            },
        )
    }

    #[test]
    fn extract_payment_returns_none_when_absent() {
        let headers = HeaderMap::new();
        assert!(extract_payment(&headers).unwrap().is_none());
    }

    #[test]
    fn extract_payment_decodes_present_header() {
        let envelope = sample_envelope(1, [0u8; 32]);
        let encoded = encode_header(&envelope).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(PAYMENT_HEADER, encoded.parse().unwrap());
        let decoded = extract_payment(&headers).unwrap().unwrap();
        assert_eq!(decoded.payload.nonce, 1);
    }

    #[test]
    fn task_hash_binding_accepts_matching_echo() {
        let challenge = sample_challenge();
        let nonce = 1_700_000_000_001;
        let hash = task_hash(&challenge.service_id, &challenge.task_data, nonce);
        let envelope = sample_envelope(nonce, hash);
        assert!(verify_task_hash(&challenge, &envelope).is_ok());
    }

    #[test]
    fn task_hash_binding_rejects_tampered_task_data() {
        // spec §8 scenario 2: attacker swaps taskData but replays the header.
        let mut challenge = sample_challenge();
        let nonce = 1_700_000_000_001;
        let original_hash = task_hash(&challenge.service_id, &challenge.task_data, nonce);
        let envelope = sample_envelope(nonce, original_hash);

        challenge.task_data = "different-payload".into();
        assert!(verify_task_hash(&challenge, &envelope).is_err());
    }
}
