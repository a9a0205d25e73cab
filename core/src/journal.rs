use std::collections::VecDeque;
use std::sync::Mutex;

/// Kind of ledger submission attempt a journal record describes (spec §4.F).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    /// `initialize_escrow`.
    InitEscrow,
    /// `submit_proof`.
    SubmitProof,
    /// `release_payment`.
    ReleasePayment,
    /// `cancel_escrow`.
    CancelEscrow,
}

/// Outcome of a submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalStatus {
    /// Confirmed on-ledger.
    Success,
    /// Rejected, timed out, or otherwise did not land.
    Failed,
    /// Submitted, confirmation still outstanding.
    Pending,
}

/// Which path carried a transaction to the ledger (spec §4.E.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingPath {
    /// Delivered via the optimized external gateway service.
    Gateway,
    /// Gateway attempt failed; delivered via direct RPC.
    RpcFallback,
    /// Gateway was never attempted; delivered via direct RPC.
    RpcDirect,
}

/// One append-only record per submission attempt (spec §4.F).
///
/// The journal is advisory: its absence must never block a legitimate state
/// transition, and a write failure here is never propagated as an operation
/// failure.
#[derive(Debug, Clone)]
pub struct JournalRecord {
    /// Which operation this attempt was for.
    pub kind: TransactionKind,
    /// Outcome.
    pub status: JournalStatus,
    /// Delivery path used.
    pub routing: RoutingPath,
    /// Ledger transaction signature, if one was produced.
    pub signature: Option<String>,
    /// Commissioning party.
    pub client: String,
    /// Party entitled to payment.
    pub provider: String,
    /// Amount involved, smallest token unit.
    pub amount: u64,
    /// Escrow PDA this attempt concerns.
    pub escrow_pda: String,
    /// Caller-supplied wall-clock timestamp (non-authoritative, §9 Q4).
    pub submitted_at: i64,
    /// Wall-clock duration of the attempt, in milliseconds.
    pub elapsed_ms: u64,
    /// Error string, if `status == Failed`.
    pub error: Option<String>,
}

/// Sink for [`JournalRecord`]s. Implementations must not block the caller on
/// anything but local, best-effort work; a slow or unavailable journal must
/// never stall a release or cancellation.
pub trait JournalSink: Send + Sync {
    /// Records one submission attempt.
    fn record(&self, record: JournalRecord);
}

/// Default sink: emits each record as a structured `tracing` event.
///
/// This mirrors the density of logging the client library already uses
/// around instruction submission; it makes that previously-implicit
/// operational log into an explicit, typed sink (§9: no global singletons —
/// callers construct and inject this rather than reaching for a static).
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingJournal;

impl JournalSink for TracingJournal {
    fn record(&self, record: JournalRecord) {
        match record.status {
            JournalStatus::Success => tracing::info!(
                kind = ?record.kind,
                routing = ?record.routing,
                signature = record.signature.as_deref(),
                escrow_pda = %record.escrow_pda,
                amount = record.amount,
                elapsed_ms = record.elapsed_ms,
                "journal: transaction succeeded"
            ),
            JournalStatus::Pending => tracing::debug!(
                kind = ?record.kind,
                escrow_pda = %record.escrow_pda,
                "journal: transaction pending confirmation"
            ),
            JournalStatus::Failed => tracing::warn!(
                kind = ?record.kind,
                routing = ?record.routing,
                escrow_pda = %record.escrow_pda,
                error = record.error.as_deref().unwrap_or("unknown"),
                elapsed_ms = record.elapsed_ms,
                "journal: transaction failed"
            ),
        }
    }
}

/// In-memory ring-buffer sink, for tests and any in-process dashboard.
pub struct InMemoryJournal {
    records: Mutex<VecDeque<JournalRecord>>,
    capacity: usize,
}

impl InMemoryJournal {
    /// Creates a journal retaining at most `capacity` most-recent records.
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Returns a snapshot of the currently retained records, oldest first.
    pub fn snapshot(&self) -> Vec<JournalRecord> {
        self.records.lock().expect("journal mutex poisoned").iter().cloned().collect()
    }
}

impl JournalSink for InMemoryJournal {
    fn record(&self, record: JournalRecord) {
        let mut records = self.records.lock().expect("journal mutex poisoned");
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(status: JournalStatus) -> JournalRecord {
        JournalRecord {
            kind: TransactionKind::ReleasePayment,
            status,
            routing: RoutingPath::Gateway,
            signature: Some("sig123".into()),
            client: "client1".into(),
            provider: "provider1".into(),
            amount: 8_000_000,
            escrow_pda: "pda1".into(),
            submitted_at: 1_700_000_000,
            elapsed_ms: 42,
            error: None,
        }
    }

    #[test]
    fn ring_buffer_evicts_oldest() {
        let journal = InMemoryJournal::new(2);
        journal.record(sample(JournalStatus::Success));
        journal.record(sample(JournalStatus::Pending));
        journal.record(sample(JournalStatus::Failed));

        let snapshot = journal.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].status, JournalStatus::Pending);
        assert_eq!(snapshot[1].status, JournalStatus::Failed);
    }
}
