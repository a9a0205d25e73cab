//! Client-side x402 request wrapper (spec §4.D).
//!
//! [`X402Client`] issues a request, and on `402` builds the payment
//! envelope (via a caller-supplied closure — this crate stays ledger-agnostic
//! and never depends on `taskrow-client`) and retries **exactly once**. A
//! second `402` is a hard protocol failure, not a further retry.

use std::future::Future;

use reqwest::StatusCode;

use crate::challenge::PaymentChallenge;
use crate::envelope::{encode_header, XPaymentEnvelope};
use crate::error::X402Error;

/// Thin wrapper around a `reqwest::Client` implementing the client half of
/// the x402 retry protocol.
pub struct X402Client {
    http: reqwest::Client,
    network: String,
}

impl X402Client {
    /// Builds a client expecting challenges/envelopes for `network`.
    pub fn new(http: reqwest::Client, network: impl Into<String>) -> Self {
        Self { http, network: network.into() }
    }

    /// Issues `GET url`. If the provider answers `402`, calls `build_payment`
    /// with the decoded challenge to obtain a signed envelope, retries once
    /// with `X-Payment` set, and returns that response. A second `402` is
    /// surfaced as [`X402Error::DoublePaywall`].
    pub async fn get_with_payment<F, Fut>(
        &self,
        url: &str,
        build_payment: F,
    ) -> Result<reqwest::Response, X402Error>
    where
        F: FnOnce(PaymentChallenge) -> Fut,
        Fut: Future<Output = Result<XPaymentEnvelope, X402Error>>,
    {
        let first = self.http.get(url).send().await.map_err(X402Error::transport)?;
        if first.status() != StatusCode::PAYMENT_REQUIRED {
            return Ok(first);
        }

        let body: crate::challenge::PaymentChallengeBody =
            first.json().await.map_err(X402Error::transport)?;

        let envelope = build_payment(body.payment).await?;
        envelope.validate(&self.network)?;
        let header = encode_header(&envelope)?;

        let retry = self
            .http
            .get(url)
            .header("X-Payment", header)
            .send()
            .await
            .map_err(X402Error::transport)?;

        if retry.status() == StatusCode::PAYMENT_REQUIRED {
            return Err(X402Error::DoublePaywall);
        }

        Ok(retry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Payload;

    fn sample_envelope() -> XPaymentEnvelope {
        XPaymentEnvelope::new(
            "devnet",
            Payload {
                serialized_transaction: "dGVzdA==".into(),
                escrow_pda: "EscrowPda111111111111111111111111111111111".into(),
                service_id: "s1".into(),
                task_hash: hex::encode([1u8; 32]),
                nonce: 1,
            },
        )
    }

    #[tokio::test]
    async fn passthrough_on_non_402() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("GET", "/resource").with_status(200).with_body("ok").create_async().await;

        let client = X402Client::new(reqwest::Client::new(), "devnet");
        let resp = client
            .get_with_payment(&format!("{}/resource", server.url()), |_challenge| async {
                unreachable!("build_payment must not run without a 402")
            })
            .await
            .unwrap();

        assert_eq!(resp.status(), 200);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn retries_once_then_fails_on_second_402() {
        let mut server = mockito::Server::new_async().await;
        let challenge_body = serde_json::json!({
            "payment": {
                "recipient": "Provider1111111111111111111111111111111111",
                "escrowProgram": "EscRow11111111111111111111111111111111111",
                "amount": 8.0,
                "token": "TKN",
                "network": "devnet",
                "serviceId": "s1",
                "taskData": "Q4",
            }
        });
        let _mock = server
            .mock("GET", "/resource")
            .with_status(402)
            .with_header("content-type", "application/json")
            .with_body(challenge_body.to_string())
            .expect(2)
            .create_async()
            .await;

        let client = X402Client::new(reqwest::Client::new(), "devnet");
        let result = client
            .get_with_payment(&format!("{}/resource", server.url()), |_challenge| async {
                Ok(sample_envelope())
            })
            .await;

        assert!(matches!(result, Err(X402Error::DoublePaywall)));
    }
}
