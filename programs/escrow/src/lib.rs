#![allow(unexpected_cfgs)]

use anchor_lang::prelude::*;

pub mod constants;
pub mod errors;
pub mod instructions;
pub mod state;

use instructions::*;

declare_id!("EscRow11111111111111111111111111111111111");

#[program]
pub mod taskrow_escrow {
    use super::*;

    /// Locks `amount` tokens for `service_id`/`task_hash` in a fresh per-task
    /// escrow PDA. Fails if the PDA already exists (`init` constraint raises
    /// `AccountAlreadyInUse`, the on-ledger form of `AlreadyExists`).
    pub fn initialize_escrow(
        ctx: Context<InitializeEscrow>,
        amount: u64,
        service_id: String,
        task_hash: [u8; 32],
    ) -> Result<()> {
        initialize_escrow::handler(ctx, amount, service_id, task_hash)
    }

    /// Records the provider's proof hash and advances `Pending -> ProofSubmitted`.
    pub fn submit_proof(ctx: Context<SubmitProof>, proof_hash: [u8; 32]) -> Result<()> {
        submit_proof::handler(ctx, proof_hash)
    }

    /// Transfers the locked amount to the provider and advances
    /// `ProofSubmitted -> Completed`.
    pub fn release_payment(ctx: Context<ReleasePayment>) -> Result<()> {
        release_payment::handler(ctx)
    }

    /// Refunds the locked amount to the client and advances `Pending -> Cancelled`.
    pub fn cancel_escrow(ctx: Context<CancelEscrow>) -> Result<()> {
        cancel_escrow::handler(ctx)
    }
}
