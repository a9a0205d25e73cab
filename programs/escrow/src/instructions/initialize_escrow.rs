use anchor_lang::prelude::*;
use anchor_spl::associated_token::AssociatedToken;
use anchor_spl::token::{self, Mint, Token, TokenAccount, Transfer};

use crate::constants::{ESCROW, MAX_SERVICE_ID_LEN};
use crate::errors::EscrowError;
use crate::state::{Escrow, EscrowStatus};

#[derive(Accounts)]
#[instruction(amount: u64, service_id: String, task_hash: [u8; 32])]
pub struct InitializeEscrow<'info> {
    #[account(mut)]
    pub client: Signer<'info>,

    /// CHECK: not a signer; only used to derive the PDA and record identity.
    pub provider: UncheckedAccount<'info>,

    pub mint: Account<'info, Mint>,

    #[account(
        init,
        payer = client,
        space = Escrow::MAX_SIZE,
        seeds = [ESCROW, client.key().as_ref(), provider.key().as_ref(), task_hash.as_ref()],
        bump,
    )]
    pub escrow: Account<'info, Escrow>,

    #[account(
        mut,
        constraint = client_token_account.mint == mint.key() @ EscrowError::BadTokenAccount,
        constraint = client_token_account.owner == client.key() @ EscrowError::BadTokenAccount,
    )]
    pub client_token_account: Account<'info, TokenAccount>,

    #[account(
        init_if_needed,
        payer = client,
        associated_token::mint = mint,
        associated_token::authority = escrow,
    )]
    pub escrow_token_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

pub fn handler(
    ctx: Context<InitializeEscrow>,
    amount: u64,
    service_id: String,
    task_hash: [u8; 32],
) -> Result<()> {
    require!(amount > 0, EscrowError::ZeroAmount);
    require!(
        service_id.len() <= MAX_SERVICE_ID_LEN,
        EscrowError::ServiceIdTooLong
    );
    require!(
        ctx.accounts.client_token_account.amount >= amount,
        EscrowError::InsufficientFunds
    );

    token::transfer(
        CpiContext::new(
            ctx.accounts.token_program.to_account_info(),
            Transfer {
                from: ctx.accounts.client_token_account.to_account_info(),
                to: ctx.accounts.escrow_token_account.to_account_info(),
                authority: ctx.accounts.client.to_account_info(),
            },
        ),
        amount,
    )?;

    let escrow = &mut ctx.accounts.escrow;
    escrow.client = ctx.accounts.client.key();
    escrow.provider = ctx.accounts.provider.key();
    escrow.amount = amount;
    escrow.service_id = service_id;
    escrow.task_hash = task_hash;
    escrow.proof_hash = None;
    escrow.status = EscrowStatus::Pending;
    escrow.created_at = Clock::get()?.unix_timestamp;
    escrow.bump = ctx.bumps.escrow;

    emit!(EscrowInitialized {
        escrow: escrow.key(),
        client: escrow.client,
        provider: escrow.provider,
        amount: escrow.amount,
        task_hash: escrow.task_hash,
    });

    Ok(())
}

#[event]
pub struct EscrowInitialized {
    pub escrow: Pubkey,
    pub client: Pubkey,
    pub provider: Pubkey,
    pub amount: u64,
    pub task_hash: [u8; 32],
}
