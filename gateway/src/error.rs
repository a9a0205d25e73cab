//! Error taxonomy -> HTTP status mapping (spec §7).
//!
//! The gateway is the one place in the system that turns the shared
//! [`taskrow_core::EscrowError`] taxonomy into HTTP status codes; every
//! other layer (client library, x402 codec) propagates the taxonomy
//! unchanged.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use taskrow_client::ClientError;
use taskrow_core::EscrowError;
use thiserror::Error;

/// Errors arising anywhere in the gateway service.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GatewayError {
    /// Shared escrow error taxonomy, mapped per spec §7's propagation table.
    #[error(transparent)]
    Escrow(#[from] EscrowError),

    /// Error from the underlying escrow client library (RPC, routing,
    /// ledger rejects). Ledger rejects are unwrapped into the shared
    /// taxonomy where possible; anything else is opaque.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The escrow PDA named in a request does not parse as a valid address.
    #[error("invalid escrow address: {0}")]
    InvalidAddress(String),
}

impl GatewayError {
    /// Maps this error to the `(HTTP status, error kind tag)` pair, per the
    /// propagation table in spec §7.
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            GatewayError::Escrow(EscrowError::NotVerified(_)) => {
                (StatusCode::PAYMENT_REQUIRED, "not_verified")
            }
            GatewayError::Escrow(EscrowError::BadRequest(_) | EscrowError::SchemeMismatch(_)) => {
                (StatusCode::BAD_REQUEST, "bad_request")
            }
            GatewayError::Escrow(EscrowError::TaskHashMismatch) => {
                (StatusCode::BAD_REQUEST, "task_hash_mismatch")
            }
            GatewayError::Escrow(EscrowError::WrongStatus(_) | EscrowError::AlreadyExists) => {
                (StatusCode::CONFLICT, "conflict")
            }
            GatewayError::Escrow(EscrowError::WrongSigner | EscrowError::WrongAuthority) => {
                (StatusCode::FORBIDDEN, "forbidden")
            }
            GatewayError::Escrow(EscrowError::TransientNetwork(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "transient_network")
            }
            GatewayError::Escrow(EscrowError::InsufficientFunds) => {
                (StatusCode::BAD_REQUEST, "insufficient_funds")
            }
            GatewayError::Escrow(EscrowError::LedgerReject(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "ledger_reject")
            }
            // `EscrowError` is `#[non_exhaustive]`: catches any variant added
            // upstream that this match doesn't yet name explicitly.
            GatewayError::Escrow(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            GatewayError::Client(ClientError::Core(inner)) => {
                return GatewayError::Escrow(inner.clone()).status_and_kind();
            }
            GatewayError::InvalidAddress(_) => (StatusCode::BAD_REQUEST, "invalid_address"),
            GatewayError::Client(_) => (StatusCode::INTERNAL_SERVER_ERROR, "client_error"),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        let body = Json(json!({ "error": kind, "details": self.to_string() }));
        (status, body).into_response()
    }
}
