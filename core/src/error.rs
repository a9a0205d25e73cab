use thiserror::Error;

/// Error taxonomy shared uniformly across the on-ledger program, the client
/// library, the x402 codec, and the payment gateway (spec §7).
///
/// Every layer maps its own failures into this taxonomy rather than
/// inventing a parallel one; the gateway is the single place that further
/// maps these kinds onto HTTP status codes (see `taskrow_gateway::error`).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EscrowError {
    /// Malformed envelope, bad base64, missing fields.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Unsupported `x402Version` or `scheme`.
    #[error("scheme mismatch: {0}")]
    SchemeMismatch(String),

    /// Recomputed task hash differs from the envelope's.
    #[error("task hash mismatch")]
    TaskHashMismatch,

    /// State-machine precondition violated.
    #[error("wrong status: {0}")]
    WrongStatus(String),

    /// Signer is not the account named for this operation.
    #[error("wrong signer")]
    WrongSigner,

    /// Signer is not the designated release/cancel authority.
    #[error("wrong authority")]
    WrongAuthority,

    /// PDA already exists; must never be retried with the same seeds.
    #[error("escrow already exists")]
    AlreadyExists,

    /// Client or escrow token balance too low for the requested transfer.
    #[error("insufficient funds")]
    InsufficientFunds,

    /// Transient network error; caller should retry, then fall back.
    #[error("transient network error: {0}")]
    TransientNetwork(String),

    /// Deterministic rejection from the ledger program; never retried.
    #[error("ledger reject: {0}")]
    LedgerReject(String),

    /// Proof not yet on-ledger; surfaced as HTTP 402 by the gateway.
    #[error("not verified: status is {0}")]
    NotVerified(String),
}

impl EscrowError {
    /// Builds a [`EscrowError::BadRequest`] from any displayable value.
    pub fn bad_request(msg: impl ToString) -> Self {
        Self::BadRequest(msg.to_string())
    }

    /// Builds a [`EscrowError::SchemeMismatch`] from any displayable value.
    pub fn scheme_mismatch(msg: impl ToString) -> Self {
        Self::SchemeMismatch(msg.to_string())
    }

    /// Builds a [`EscrowError::WrongStatus`] from any displayable value.
    pub fn wrong_status(msg: impl ToString) -> Self {
        Self::WrongStatus(msg.to_string())
    }

    /// Builds a [`EscrowError::TransientNetwork`] from any displayable value.
    pub fn transient(msg: impl ToString) -> Self {
        Self::TransientNetwork(msg.to_string())
    }

    /// Builds a [`EscrowError::LedgerReject`] from any displayable value.
    pub fn ledger_reject(msg: impl ToString) -> Self {
        Self::LedgerReject(msg.to_string())
    }

    /// Builds a [`EscrowError::NotVerified`] naming the observed status.
    pub fn not_verified(status: impl ToString) -> Self {
        Self::NotVerified(status.to_string())
    }

    /// Whether this error kind is safe to retry transparently (transient
    /// network failures only; everything else is either deterministic or
    /// requires a fresh nonce/seeds per spec §7).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientNetwork(_))
    }
}
