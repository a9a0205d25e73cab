#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Taskrow x402 Protocol
//!
//! # Overview
//!
//! `taskrow_x402` implements spec §4.D: the HTTP 402 challenge/response
//! wire format, the `X-Payment` header codec, and both sides of the
//! protocol exchange.
//!
//! - **Codec** (`challenge.rs`, `envelope.rs`): pure, I/O-free
//!   (de)serialization of the `PaymentChallenge` body and the
//!   `X-Payment` envelope. Fuzzable in isolation of any transport.
//! - **Provider side** (`provider.rs`): axum extractors/helpers a
//!   protected-resource handler uses to issue a 402 challenge, then decode
//!   and validate an incoming `X-Payment` header against that challenge.
//! - **Client side** (`client.rs`): [`client::X402Client`], a thin
//!   `reqwest`-based wrapper that retries a request exactly once after a
//!   402, per spec §4.D ("a second 402 is a hard failure").

/// `PaymentChallenge`, the 402 response body (spec §3, §6).
pub mod challenge;

/// Client-side retry-once-on-402 request wrapper (spec §4.D).
pub mod client;

/// Error type for the x402 codec and transport layers.
pub mod error;

/// `X-Payment` header codec (spec §3, §6).
pub mod envelope;

/// Provider-side 402 issuance and `X-Payment` validation (spec §4.D).
pub mod provider;

pub use challenge::{PaymentChallenge, PaymentChallengeBody};
pub use envelope::{Payload, XPaymentEnvelope};
pub use error::X402Error;
