use sha2::{Digest, Sha256};

/// Computes `SHA256(service_id ‖ ":" ‖ task_data ‖ ":" ‖ nonce)` (spec §4.B).
///
/// `nonce` is mandatory for uniqueness: two requests with identical
/// `(service_id, task_data)` must get distinct task hashes, and therefore
/// distinct escrow PDAs. This is the one function every on-ledger and
/// off-ledger code path must agree on byte-for-byte (P1, P4).
pub fn task_hash(service_id: &str, task_data: &str, nonce: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(service_id.as_bytes());
    hasher.update(b":");
    hasher.update(task_data.as_bytes());
    hasher.update(b":");
    hasher.update(nonce.to_string().as_bytes());
    hasher.finalize().into()
}

/// Computes `SHA256(input_hash ‖ output_hash)`, the provider's proof of work.
///
/// Per the glossary, this does not prove correctness of the artifact: it
/// only binds that the provider saw `input_hash` and produced `output_hash`.
pub fn proof_hash(input_hash: &[u8; 32], output_hash: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(input_hash);
    hasher.update(output_hash);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_nonces_yield_distinct_hashes() {
        let a = task_hash("s1", "Q4", 1);
        let b = task_hash("s1", "Q4", 2);
        assert_ne!(a, b);
    }

    #[test]
    fn deterministic() {
        let a = task_hash("analyze", "payload", 1_700_000_000_001);
        let b = task_hash("analyze", "payload", 1_700_000_000_001);
        assert_eq!(a, b);
    }

    #[test]
    fn matches_scenario_vector() {
        // §8 scenario 1: taskHash=SHA256("s1:Q4:1700000000001")
        let expected = Sha256::digest(b"s1:Q4:1700000000001");
        assert_eq!(task_hash("s1", "Q4", 1_700_000_000_001), expected.as_slice());
    }
}
