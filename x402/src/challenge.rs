//! `PaymentChallenge`, the body of an HTTP 402 response (spec §3/§6).

use serde::{Deserialize, Serialize};
use taskrow_core::EscrowError;

/// Outer envelope of a 402 response body: `{ "payment": { ... } }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentChallengeBody {
    /// The challenge itself.
    pub payment: PaymentChallenge,
}

impl PaymentChallengeBody {
    /// Wraps a challenge in its response envelope.
    pub fn new(payment: PaymentChallenge) -> Self {
        Self { payment }
    }
}

/// Fields a provider quotes to a client before work begins (spec §3, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentChallenge {
    /// Provider's ledger account, to receive payment.
    pub recipient: String,
    /// Escrow program identifier.
    #[serde(rename = "escrowProgram")]
    pub escrow_program: String,
    /// Amount in decimal display units (not smallest units).
    pub amount: f64,
    /// Token symbol.
    pub token: String,
    /// Cluster/network tag.
    pub network: String,
    /// Human identifier for the requested service, echoed back by the
    /// client for task-hash recomputation.
    pub service_id: String,
    /// Opaque request payload, echoed back by the client for task-hash
    /// recomputation.
    pub task_data: String,
}

impl PaymentChallenge {
    /// Converts [`Self::amount`] to the smallest token unit using a fixed
    /// `decimals` for this `(token, network)` (spec §9 open question 3).
    ///
    /// Rejects amounts whose conversion is not an exact integer number of
    /// smallest units — ambiguous decimal conversions are refused before a
    /// challenge is ever honored, rather than silently rounded.
    pub fn amount_smallest_units(&self, decimals: u8) -> Result<u64, EscrowError> {
        let scale = 10f64.powi(decimals as i32);
        let scaled = self.amount * scale;
        let rounded = scaled.round();
        if (scaled - rounded).abs() > 1e-6 {
            return Err(EscrowError::bad_request(format!(
                "amount {} is not representable as an integer multiple of 10^-{decimals} units",
                self.amount
            )));
        }
        if rounded < 0.0 || rounded > u64::MAX as f64 {
            return Err(EscrowError::bad_request("amount out of range"));
        }
        Ok(rounded as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(amount: f64) -> PaymentChallenge {
        PaymentChallenge {
            recipient: "11111111111111111111111111111111".into(),
            escrow_program: "EscRow11111111111111111111111111111111111".into(),
            amount,
            token: "TKN".into(),
            network: "devnet".into(),
            service_id: "s1".into(),
            task_data: "Q4".into(),
        }
    }

    #[test]
    fn exact_conversion_succeeds() {
        // spec §8 scenario 1: amount=8 display units -> 8_000_000 smallest units at 6 decimals.
        let challenge = sample(8.0);
        assert_eq!(challenge.amount_smallest_units(6).unwrap(), 8_000_000);
    }

    #[test]
    fn ambiguous_conversion_is_rejected() {
        let challenge = sample(0.0000001);
        assert!(challenge.amount_smallest_units(2).is_err());
    }

    #[test]
    fn round_trips_through_json() {
        let challenge = sample(1.5);
        let body = PaymentChallengeBody::new(challenge);
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"escrowProgram\""));
        let decoded: PaymentChallengeBody = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.payment.amount, 1.5);
    }
}
