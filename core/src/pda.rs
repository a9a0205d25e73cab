/// PDA seed prefix shared with the on-ledger program's `ESCROW` constant
/// (`programs/escrow/src/constants.rs`). Kept in one place so off-ledger
/// derivation can never silently drift from the on-ledger seeds (§4.B).
pub const ESCROW_SEED: &[u8] = b"escrow";

/// Builds the seed list used to derive an escrow PDA, in the fixed order
/// `[ESCROW_SEED, client, provider, task_hash]`.
///
/// This crate is ledger-agnostic and does not perform the actual
/// `find_program_address` call (that requires a ledger SDK); callers such as
/// `taskrow_client::router` combine these seeds with their ledger's PDA
/// derivation function so that the same bytes are hashed on both the
/// on-ledger and off-ledger side.
pub fn escrow_seeds<'a>(client: &'a [u8], provider: &'a [u8], task_hash: &'a [u8; 32]) -> [&'a [u8]; 4] {
    [ESCROW_SEED, client, provider, task_hash]
}
