//! Error type for the x402 codec and transport layers.

use taskrow_core::EscrowError;
use thiserror::Error;

/// Errors arising from x402 challenge/envelope handling.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum X402Error {
    /// Shared escrow error taxonomy (`BadRequest`, `SchemeMismatch`,
    /// `TaskHashMismatch`, ...), surfaced without loss per spec §7.
    #[error(transparent)]
    Escrow(#[from] EscrowError),

    /// Underlying HTTP transport failure talking to the provider or gateway.
    #[error("x402 transport error: {0}")]
    Transport(String),

    /// A second `402` was returned after the client already retried once.
    /// Per the protocol this is a hard failure, never a further retry.
    #[error("second 402 Payment Required after retry; aborting per x402 protocol")]
    DoublePaywall,
}

impl X402Error {
    /// Wraps a transport-layer error (HTTP client, connection, timeout).
    pub fn transport(err: impl ToString) -> Self {
        Self::Transport(err.to_string())
    }
}
