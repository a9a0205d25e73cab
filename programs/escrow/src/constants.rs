/// PDA seed prefix for escrow accounts.
///
/// Seeds: `[ESCROW, client, provider, task_hash]`. Identical bytes are used
/// by every off-ledger decoder (see `taskrow_core::pda`); changing this
/// constant changes every escrow address already issued.
pub const ESCROW: &[u8] = b"escrow";

/// Maximum length, in bytes, of `service_id`.
pub const MAX_SERVICE_ID_LEN: usize = 64;
