#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(rustdoc::invalid_html_tags, rustdoc::broken_intra_doc_links)]

//! Taskrow Core Library
//!
//! # Overview
//!
//! `taskrow_core` is a pure, ledger-agnostic library providing the shared
//! primitives for a paid, verifiable agent-task escrow system. This crate
//! exposes:
//!
//! - **Task hashing** (`hash.rs`): the deterministic digest binding a payment
//!   to a specific request and nonce.
//! - **Account decoding** (`account.rs`): a sequential reader for the
//!   on-ledger `Escrow` account layout, shared by the client library and the
//!   payment gateway so both agree with the on-ledger program byte-for-byte.
//! - **Event types** (`event.rs`): the closed `EscrowEvent` variant set
//!   dispatched by tag rather than duck-typed message matching.
//! - **Transaction journal** (`journal.rs`): append-only, advisory recording
//!   of submission attempts, routing path, and outcome.
//! - **Error handling** (`error.rs`): the error taxonomy shared uniformly
//!   across the on-ledger program, the client library, and the gateway.

/// Sequential decoder for the on-ledger `Escrow` account layout.
pub mod account;

/// Error types used throughout the `taskrow_core` crate and its consumers.
pub mod error;

/// The closed set of escrow lifecycle events.
pub mod event;

/// Task-hash computation (§4.B of the escrow protocol).
pub mod hash;

/// Append-only transaction journal.
pub mod journal;

/// PDA seed constants shared between the on-ledger program and every
/// off-ledger decoder.
pub mod pda;

pub use account::EscrowAccount;
pub use error::EscrowError;
pub use event::EscrowEvent;
pub use hash::task_hash;

/// `Result` type for all core operations, using [`EscrowError`] as the error.
pub type Result<T> = std::result::Result<T, EscrowError>;
