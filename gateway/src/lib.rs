#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Taskrow Payment Gateway
//!
//! # Overview
//!
//! `taskrow_gateway` is the off-chain service of spec §4.E: it exposes
//! `/verify-proof` and `/claim-payment`, enforcing the HTTP 402 paywall
//! that only releases escrowed funds once a proof is confirmed on-ledger.
//!
//! - **Configuration** (`config.rs`): environment-driven [`config::GatewayConfig`].
//! - **Error mapping** (`error.rs`): the shared error taxonomy's HTTP
//!   projection (spec §7's propagation table).
//! - **Handlers** (`handlers.rs`): the two endpoints' request/response
//!   types and logic.
//! - **Marketplace** (`marketplace.rs`): the DI'd job-lifecycle collaborator
//!   interface (spec §9: no global singletons).
//! - **State** (`state.rs`): constructor-injected [`state::AppState`].

use axum::routing::post;
use axum::Router;

/// Environment-driven configuration.
pub mod config;

/// Error taxonomy -> HTTP status mapping.
pub mod error;

/// `/verify-proof` and `/claim-payment` handlers.
pub mod handlers;

/// Marketplace collaborator interface (trait + implementations).
pub mod marketplace;

/// Constructor-injected application state.
pub mod state;

pub use error::GatewayError;
pub use state::AppState;

/// Builds the gateway's axum router against `state`.
///
/// Split out from `main` so integration tests can exercise the router
/// in-process (via `tower::ServiceExt::oneshot`) without binding a socket.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", axum::routing::get(handlers::health))
        .route("/verify-proof", post(handlers::verify_proof))
        .route("/claim-payment", post(handlers::claim_payment))
        .with_state(state)
}
