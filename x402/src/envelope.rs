//! `X-Payment` header codec: a pure, I/O-free encode/decode layer (spec §9
//! REDESIGN FLAGS: "split ad-hoc base64/JSON parsing into a pure codec layer
//! ... and a transport layer").

use serde::{Deserialize, Serialize};
use taskrow_core::EscrowError;

use crate::error::X402Error;

const SUPPORTED_VERSION: u8 = 1;
const SUPPORTED_SCHEME: &str = "escrow";

/// The decoded `X-Payment` header value (spec §3, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XPaymentEnvelope {
    /// Protocol version; only `1` is accepted.
    pub x402_version: u8,
    /// Payment scheme; only `"escrow"` is accepted.
    pub scheme: String,
    /// Cluster/network tag, must match the provider's configuration.
    pub network: String,
    /// The escrow-specific payload.
    pub payload: Payload,
}

/// Escrow-specific fields of the `X-Payment` envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    /// Base64-encoded, client-signed, self-contained transaction that
    /// creates (if needed) the escrow token account and initializes the
    /// escrow.
    pub serialized_transaction: String,
    /// The escrow PDA the transaction targets, base58 (or ledger-native)
    /// string form.
    #[serde(rename = "escrowPDA")]
    pub escrow_pda: String,
    /// Human identifier for the service, echoed from the challenge.
    pub service_id: String,
    /// Hex-encoded 32-byte task hash binding this payment to this request.
    pub task_hash: String,
    /// Client-chosen nonce, millisecond-resolution monotonic by convention.
    pub nonce: u64,
}

impl XPaymentEnvelope {
    /// Builds an envelope, defaulting to the only supported version/scheme.
    pub fn new(network: impl Into<String>, payload: Payload) -> Self {
        Self {
            x402_version: SUPPORTED_VERSION,
            scheme: SUPPORTED_SCHEME.to_string(),
            network: network.into(),
            payload,
        }
    }

    /// Rejects anything but the one supported `(x402Version, scheme)` pair,
    /// and checks the network tag against the caller's configuration.
    pub fn validate(&self, expected_network: &str) -> Result<(), X402Error> {
        if self.x402_version != SUPPORTED_VERSION {
            return Err(EscrowError::scheme_mismatch(format!(
                "unsupported x402Version {}",
                self.x402_version
            ))
            .into());
        }
        if self.scheme != SUPPORTED_SCHEME {
            return Err(EscrowError::scheme_mismatch(format!(
                "unsupported scheme {:?}",
                self.scheme
            ))
            .into());
        }
        if self.network != expected_network {
            return Err(EscrowError::scheme_mismatch(format!(
                "network {:?} does not match expected {:?}",
                self.network, expected_network
            ))
            .into());
        }
        Ok(())
    }

    /// Decodes the 32-byte task hash from its hex wire form.
    pub fn task_hash_bytes(&self) -> Result<[u8; 32], X402Error> {
        let bytes = hex::decode(&self.payload.task_hash)
            .map_err(|e| EscrowError::bad_request(format!("invalid hex task hash: {e}")))?;
        bytes
            .try_into()
            .map_err(|_| EscrowError::bad_request("task hash must be exactly 32 bytes").into())
    }
}

/// Base64-encodes an envelope's JSON form for the `X-Payment` header.
pub fn encode_header(envelope: &XPaymentEnvelope) -> Result<String, X402Error> {
    use base64::Engine;
    let json = serde_json::to_vec(envelope)
        .map_err(|e| EscrowError::bad_request(format!("envelope serialization failed: {e}")))?;
    Ok(base64::engine::general_purpose::STANDARD.encode(json))
}

/// Decodes an `X-Payment` header value into its envelope.
pub fn decode_header(header: &str) -> Result<XPaymentEnvelope, X402Error> {
    use base64::Engine;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(header.trim())
        .map_err(|e| EscrowError::bad_request(format!("invalid base64 in X-Payment: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| EscrowError::bad_request(format!("invalid X-Payment JSON: {e}")).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payload() -> Payload {
        Payload {
            serialized_transaction: "dGVzdA==".into(),
            escrow_pda: "EscrowPdaAddress1111111111111111111111111".into(),
            service_id: "s1".into(),
            task_hash: hex::encode([7u8; 32]),
            nonce: 1_700_000_000_001,
        }
    }

    #[test]
    fn round_trips_through_header_encoding() {
        let envelope = XPaymentEnvelope::new("devnet", sample_payload());
        let header = encode_header(&envelope).unwrap();
        let decoded = decode_header(&header).unwrap();
        assert_eq!(decoded.payload.nonce, 1_700_000_000_001);
        assert_eq!(decoded.scheme, "escrow");
    }

    #[test]
    fn rejects_wrong_version() {
        let mut envelope = XPaymentEnvelope::new("devnet", sample_payload());
        envelope.x402_version = 2;
        assert!(envelope.validate("devnet").is_err());
    }

    #[test]
    fn rejects_wrong_scheme() {
        let mut envelope = XPaymentEnvelope::new("devnet", sample_payload());
        envelope.scheme = "exact".into();
        assert!(envelope.validate("devnet").is_err());
    }

    #[test]
    fn rejects_network_mismatch() {
        let envelope = XPaymentEnvelope::new("devnet", sample_payload());
        assert!(envelope.validate("mainnet").is_err());
    }

    #[test]
    fn rejects_malformed_base64() {
        assert!(decode_header("not valid base64!!!").is_err());
    }

    #[test]
    fn wire_keys_match_spec() {
        let envelope = XPaymentEnvelope::new("devnet", sample_payload());
        let json = serde_json::to_string(&envelope).unwrap();
        assert!(json.contains("\"x402Version\""), "got {json}");
        assert!(json.contains("\"escrowPDA\""), "got {json}");
        assert!(!json.contains("\"escrowPda\""), "got {json}");

        let wire = format!(
            "{{\"x402Version\":1,\"scheme\":\"escrow\",\"network\":\"devnet\",\"payload\":{{\
             \"serializedTransaction\":\"dGVzdA==\",\"escrowPDA\":\"Escrow1111111111111111111111111111111111\",\
             \"serviceId\":\"s1\",\"taskHash\":\"{}\",\"nonce\":1}}}}",
            hex::encode([7u8; 32])
        );
        let decoded: XPaymentEnvelope = serde_json::from_str(&wire).unwrap();
        assert_eq!(decoded.payload.escrow_pda, "Escrow1111111111111111111111111111111111");
    }
}
