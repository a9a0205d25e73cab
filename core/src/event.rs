/// Closed set of escrow lifecycle events (spec §9: replace duck-typed
/// message dispatch with a tagged variant set).
///
/// The on-ledger program emits the ledger-native analogues of these via
/// `emit!`; the HTTP layer (gateway, x402 provider) exposes the same events
/// through typed request/response bodies rather than free-text matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscrowEvent {
    /// A provider issued a 402 challenge for a task.
    PaymentRequested {
        /// Service identifier from the challenge.
        service_id: String,
        /// Amount, in smallest token units.
        amount: u64,
    },
    /// `initialize_escrow` landed on-ledger.
    EscrowInitialized {
        /// Escrow PDA.
        escrow: [u8; 32],
        /// Locked amount.
        amount: u64,
    },
    /// `submit_proof` landed on-ledger.
    ProofSubmitted {
        /// Escrow PDA.
        escrow: [u8; 32],
        /// Proof hash recorded.
        proof_hash: [u8; 32],
    },
    /// `release_payment` landed on-ledger.
    PaymentReleased {
        /// Escrow PDA.
        escrow: [u8; 32],
        /// Amount transferred to the provider.
        amount: u64,
    },
    /// `cancel_escrow` landed on-ledger.
    Cancelled {
        /// Escrow PDA.
        escrow: [u8; 32],
        /// Amount refunded to the client.
        amount: u64,
    },
}

impl EscrowEvent {
    /// Short tag used for structured logging and dashboards.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::PaymentRequested { .. } => "payment_requested",
            Self::EscrowInitialized { .. } => "escrow_initialized",
            Self::ProofSubmitted { .. } => "proof_submitted",
            Self::PaymentReleased { .. } => "payment_released",
            Self::Cancelled { .. } => "cancelled",
        }
    }
}
