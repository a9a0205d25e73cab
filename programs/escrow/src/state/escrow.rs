use anchor_lang::prelude::*;

use crate::constants::MAX_SERVICE_ID_LEN;

/// Escrow lifecycle status.
///
/// Variant order is part of the wire contract: Borsh encodes the tag by
/// variant index, and the discriminants below document the values every
/// off-ledger decoder must agree on.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EscrowStatus {
    /// Funds locked, no proof submitted yet.
    Pending = 0,
    /// Provider has submitted a proof hash; release is now possible.
    ProofSubmitted = 1,
    /// Funds released to the provider. Terminal.
    Completed = 2,
    /// Funds refunded to the client. Terminal.
    Cancelled = 3,
}

/// One escrow per task, keyed by the PDA derived in `taskrow_core::pda`.
#[account]
#[derive(Debug)]
pub struct Escrow {
    /// Commissioning party.
    pub client: Pubkey,
    /// Party entitled to payment once proof is accepted.
    pub provider: Pubkey,
    /// Locked amount, smallest token unit.
    pub amount: u64,
    /// Human identifier for the service invoked, `<= MAX_SERVICE_ID_LEN` bytes.
    pub service_id: String,
    /// Digest binding the semantic task; see `taskrow_core::hash::task_hash`.
    pub task_hash: [u8; 32],
    /// `SHA256(input_hash || output_hash)` once the provider submits it.
    pub proof_hash: Option<[u8; 32]>,
    /// Current lifecycle state.
    pub status: EscrowStatus,
    /// Wall-clock creation time. Advisory only, not authoritative.
    pub created_at: i64,
    /// PDA bump seed.
    pub bump: u8,
}

impl Escrow {
    /// Upper bound on serialized account size, used for `space` at `init`.
    ///
    /// Sized for the worst case (`service_id` at its maximum length and
    /// `proof_hash` populated); actual serialized size can be smaller, which
    /// Borsh handles transparently on read since decoding is sequential, not
    /// fixed-offset.
    pub const MAX_SIZE: usize = 8 // discriminator
        + 32 // client
        + 32 // provider
        + 8 // amount
        + 4 + MAX_SERVICE_ID_LEN // service_id (len-prefixed string)
        + 32 // task_hash
        + 1 + 32 // proof_hash (Option tag + payload)
        + 1 // status
        + 8 // created_at
        + 1; // bump
}
