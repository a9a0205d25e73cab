//! Off-ledger client library for the taskrow escrow system.
//!
//! This crate provides [`EscrowClient`], the public contract of spec §4.C:
//! deriving escrow PDAs, checking account state, initializing/cancelling
//! escrows, submitting proofs, and releasing payment through the dual-path
//! [`router::TransactionRouter`].
//!
//! # Example
//!
//! ```ignore
//! use taskrow_client::EscrowClient;
//!
//! async fn release(client: &EscrowClient, pda: solana_sdk::pubkey::Pubkey, provider: solana_sdk::pubkey::Pubkey) -> taskrow_client::Result<()> {
//!     let (signature, used_gateway) = client.release_payment_via_gateway(pda, provider).await?;
//!     tracing::info!(%signature, used_gateway, "payment released");
//!     Ok(())
//! }
//! ```

pub use error::ClientError;
pub use solana::{EscrowClient, EscrowLookup, InitOutcome, ResolvedEscrow};

pub mod error;
pub mod router;
pub mod solana;

/// Result type alias using [`ClientError`].
pub type Result<T> = std::result::Result<T, ClientError>;
