//! Shared, constructor-injected application state (spec §9: no global
//! singletons — every handler receives its dependencies explicitly via
//! axum's `State` extractor rather than reaching for a process-wide static).

use std::sync::Arc;

use taskrow_client::EscrowClient;
use taskrow_core::journal::JournalSink;

use crate::marketplace::MarketplaceClient;

/// Everything a gateway handler needs, held behind an `Arc` and cloned per
/// request (axum's standard shared-state pattern).
#[derive(Clone)]
pub struct AppState {
    /// Escrow client library instance, holding the release authority key.
    pub escrow_client: Arc<EscrowClient>,
    /// Marketplace collaborator (spec §4.F component G); `NullMarketplaceClient`
    /// when no marketplace integration is configured.
    pub marketplace: Arc<dyn MarketplaceClient>,
    /// Transaction journal sink (spec §4.F).
    pub journal: Arc<dyn JournalSink>,
}
