use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

use crate::constants::ESCROW;
use crate::errors::EscrowError;
use crate::state::{Escrow, EscrowStatus};

#[derive(Accounts)]
pub struct ReleasePayment<'info> {
    /// The sole release authority: the escrow's client (§9 design decision,
    /// never the gateway).
    pub authority: Signer<'info>,

    #[account(
        mut,
        seeds = [ESCROW, authority.key().as_ref(), escrow.provider.as_ref(), escrow.task_hash.as_ref()],
        bump = escrow.bump,
    )]
    pub escrow: Account<'info, Escrow>,

    #[account(
        mut,
        constraint = escrow_token_account.owner == escrow.key() @ EscrowError::BadTokenAccount,
    )]
    pub escrow_token_account: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = provider_token_account.owner == escrow.provider @ EscrowError::BadTokenAccount,
        constraint = provider_token_account.mint == escrow_token_account.mint @ EscrowError::BadTokenAccount,
    )]
    pub provider_token_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

pub fn handler(ctx: Context<ReleasePayment>) -> Result<()> {
    let escrow = &ctx.accounts.escrow;

    require!(escrow.status == EscrowStatus::ProofSubmitted, EscrowError::WrongStatus);
    require_keys_eq!(ctx.accounts.authority.key(), escrow.client, EscrowError::WrongAuthority);
    require!(
        ctx.accounts.escrow_token_account.amount == escrow.amount,
        EscrowError::BalanceMismatch
    );

    let client_key = escrow.client;
    let provider_key = escrow.provider;
    let task_hash = escrow.task_hash;
    let amount = escrow.amount;
    let bump = escrow.bump;

    let seeds: &[&[u8]] = &[
        ESCROW,
        client_key.as_ref(),
        provider_key.as_ref(),
        task_hash.as_ref(),
        &[bump],
    ];

    token::transfer(
        CpiContext::new_with_signer(
            ctx.accounts.token_program.to_account_info(),
            Transfer {
                from: ctx.accounts.escrow_token_account.to_account_info(),
                to: ctx.accounts.provider_token_account.to_account_info(),
                authority: ctx.accounts.escrow.to_account_info(),
            },
            &[seeds],
        ),
        amount,
    )?;

    let escrow = &mut ctx.accounts.escrow;
    escrow.status = EscrowStatus::Completed;

    emit!(PaymentReleased {
        escrow: escrow.key(),
        provider: provider_key,
        amount,
    });

    Ok(())
}

#[event]
pub struct PaymentReleased {
    pub escrow: Pubkey,
    pub provider: Pubkey,
    pub amount: u64,
}
