use anchor_lang::prelude::*;

use crate::constants::ESCROW;
use crate::errors::EscrowError;
use crate::state::{Escrow, EscrowStatus};

#[derive(Accounts)]
pub struct SubmitProof<'info> {
    pub provider: Signer<'info>,

    #[account(
        mut,
        seeds = [ESCROW, escrow.client.as_ref(), provider.key().as_ref(), escrow.task_hash.as_ref()],
        bump = escrow.bump,
    )]
    pub escrow: Account<'info, Escrow>,
}

pub fn handler(ctx: Context<SubmitProof>, proof_hash: [u8; 32]) -> Result<()> {
    let escrow = &mut ctx.accounts.escrow;

    require!(escrow.status == EscrowStatus::Pending, EscrowError::WrongStatus);
    require_keys_eq!(escrow.provider, ctx.accounts.provider.key(), EscrowError::WrongSigner);

    escrow.proof_hash = Some(proof_hash);
    escrow.status = EscrowStatus::ProofSubmitted;

    emit!(ProofSubmitted {
        escrow: escrow.key(),
        provider: escrow.provider,
        proof_hash,
    });

    Ok(())
}

#[event]
pub struct ProofSubmitted {
    pub escrow: Pubkey,
    pub provider: Pubkey,
    pub proof_hash: [u8; 32],
}
