use anchor_lang::prelude::*;

#[error_code]
pub enum EscrowError {
    #[msg("amount must be greater than zero")]
    ZeroAmount,

    #[msg("service_id exceeds maximum length")]
    ServiceIdTooLong,

    #[msg("token account does not match escrow mint or owner")]
    BadTokenAccount,

    #[msg("insufficient funds for transfer")]
    InsufficientFunds,

    #[msg("escrow is not in the required status for this operation")]
    WrongStatus,

    #[msg("signer is not the escrow provider")]
    WrongSigner,

    #[msg("signer is not the escrow release authority")]
    WrongAuthority,

    #[msg("escrow token account balance does not match escrow amount")]
    BalanceMismatch,
}
