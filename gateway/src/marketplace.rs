//! Marketplace collaborator interface (spec §4.E step 3, §6 component F).
//!
//! The marketplace is an external collaborator (spec §1 "out of scope"):
//! provider discovery and job-accounting storage live elsewhere. The
//! gateway's only obligation is to report a completed job, best-effort —
//! spec §4.E.1 "Partial" failure semantics: if the release transaction
//! lands but this update fails, the release stands. This trait replaces
//! the teacher's pattern of a single global client singleton (spec §9
//! "replace global singletons with DI") with an explicit, constructor-
//! injected handle.

use async_trait::async_trait;
use tracing::warn;

/// A provider-entitled job completion, reported after a successful release.
#[derive(Debug, Clone)]
pub struct JobCompletion<'a> {
    /// Escrow PDA, base58 string form.
    pub escrow_pda: &'a str,
    /// Ledger transaction signature of the release.
    pub tx_signature: &'a str,
    /// Amount released, smallest token unit.
    pub amount: u64,
}

/// Reports job-lifecycle side effects to the marketplace.
///
/// Implementations must never block or fail the caller's release flow:
/// `mark_completed` errors are logged by the caller and otherwise ignored
/// (spec §4.E.1 "Partial").
#[async_trait]
pub trait MarketplaceClient: Send + Sync {
    /// Marks the job backing `completion.escrow_pda` as completed.
    async fn mark_completed(&self, completion: JobCompletion<'_>) -> anyhow::Result<()>;
}

/// No-op marketplace client, used when no marketplace integration is
/// configured (spec §9: marketplace divergence is a reporting bug, not a
/// correctness bug — running without one at all is a valid deployment).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMarketplaceClient;

#[async_trait]
impl MarketplaceClient for NullMarketplaceClient {
    async fn mark_completed(&self, _completion: JobCompletion<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Marketplace client backed by an HTTP job-lifecycle endpoint.
pub struct HttpMarketplaceClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpMarketplaceClient {
    /// Builds a client posting job updates to `base_url`.
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self { http, base_url: base_url.into() }
    }
}

#[async_trait]
impl MarketplaceClient for HttpMarketplaceClient {
    async fn mark_completed(&self, completion: JobCompletion<'_>) -> anyhow::Result<()> {
        let url = format!("{}/jobs/{}/complete", self.base_url, completion.escrow_pda);
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({
                "txSignature": completion.tx_signature,
                "amount": completion.amount,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("marketplace returned {}", response.status());
        }
        Ok(())
    }
}

/// Calls `mark_completed`, logging (never propagating) any failure.
pub async fn report_completion_best_effort(
    marketplace: &dyn MarketplaceClient,
    completion: JobCompletion<'_>,
) {
    if let Err(e) = marketplace.mark_completed(completion.clone()).await {
        warn!(
            escrow_pda = completion.escrow_pda,
            error = %e,
            "marketplace job-completion update failed; release already stands"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_client_always_succeeds() {
        let client = NullMarketplaceClient;
        let completion = JobCompletion { escrow_pda: "pda1", tx_signature: "sig1", amount: 8_000_000 };
        assert!(client.mark_completed(completion).await.is_ok());
    }

    #[tokio::test]
    async fn http_client_reports_non_success_as_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("POST", "/jobs/pda1/complete").with_status(500).create_async().await;

        let client = HttpMarketplaceClient::new(reqwest::Client::new(), server.url());
        let completion = JobCompletion { escrow_pda: "pda1", tx_signature: "sig1", amount: 8_000_000 };
        assert!(client.mark_completed(completion).await.is_err());
    }

    #[tokio::test]
    async fn best_effort_never_panics_on_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("POST", "/jobs/pda1/complete").with_status(500).create_async().await;

        let client = HttpMarketplaceClient::new(reqwest::Client::new(), server.url());
        let completion = JobCompletion { escrow_pda: "pda1", tx_signature: "sig1", amount: 8_000_000 };
        report_completion_best_effort(&client, completion).await;
    }
}
