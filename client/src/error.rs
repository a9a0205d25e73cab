//! Error types for the taskrow client.
//!
//! Provides [`ClientError`] for all client-side operations: ledger
//! interactions, key management, and gateway/RPC routing.

use thiserror::Error;

/// Errors arising from client operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ClientError {
    /// Error loading or parsing a keypair file.
    #[error("keypair error: {0}")]
    Keypair(String),

    /// Solana-specific agent error, with operation context.
    #[error("solana agent: {context} - {message}")]
    Solana {
        /// Operation context (e.g. "initialize_escrow", "release_payment").
        context: &'static str,
        /// Underlying error message.
        message: String,
    },

    /// Error serializing or deserializing data.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Solana RPC client error.
    #[error("Solana RPC error: {0}")]
    SolanaRpc(#[from] Box<solana_client::client_error::ClientError>),

    /// Solana Anchor program error.
    #[error("Anchor program error: {0}")]
    AnchorProgram(#[from] anchor_lang::prelude::ProgramError),

    /// Transaction was dropped or not confirmed.
    #[error("transaction dropped: {0}")]
    TransactionDropped(String),

    /// The gateway's optimized transaction-processing path failed; caller
    /// should fall back to direct RPC (spec §4.E.1).
    #[error("gateway transaction service unavailable: {0}")]
    GatewayUnavailable(String),

    /// The escrow's associated token account already exists with an
    /// unexpected owner. Never silently reused (spec §4.C).
    #[error("associated token account owner mismatch for escrow {escrow}")]
    AtaOwnerMismatch {
        /// The escrow PDA whose ATA is in an unexpected state.
        escrow: String,
    },

    /// Error from the shared `taskrow-core` taxonomy.
    #[error("core library error: {0}")]
    Core(#[from] taskrow_core::EscrowError),
}

impl ClientError {
    /// Creates a Solana agent error with context.
    pub fn solana(context: &'static str, msg: impl ToString) -> Self {
        Self::Solana {
            context,
            message: msg.to_string(),
        }
    }

    /// Creates a transaction dropped error with details.
    pub fn tx_dropped(details: impl ToString) -> Self {
        Self::TransactionDropped(details.to_string())
    }
}

impl From<solana_client::client_error::ClientError> for ClientError {
    fn from(value: solana_client::client_error::ClientError) -> Self {
        Self::SolanaRpc(Box::new(value))
    }
}

impl From<solana_sdk::pubkey::ParsePubkeyError> for ClientError {
    fn from(value: solana_sdk::pubkey::ParsePubkeyError) -> Self {
        Self::Solana {
            context: "parse_pubkey",
            message: value.to_string(),
        }
    }
}
