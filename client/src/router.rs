//! Dual-path transaction routing (spec §4.E.1).
//!
//! Every release, init, or cancel transaction is first offered to an
//! optimized external gateway transaction service; on any failure the
//! router falls back to direct RPC submission with a freshly fetched
//! blockhash and `skip_preflight = true`. This mirrors the fetch-blockhash
//! -> build -> sign -> send flow of `SolanaAgent::submit_transaction` in the
//! teacher, generalized with a first optional hop.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use solana_client::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_sdk::instruction::Instruction;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::transaction::Transaction;
use taskrow_core::journal::{JournalRecord, JournalStatus, JournalSink, RoutingPath, TransactionKind};
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::Result;

/// Response body from the external gateway's transaction-build endpoint.
///
/// The gateway returns a fee- and compute-tuned, blockhash-refreshed
/// transaction for the client to sign; it does not sign on the client's
/// behalf (the client remains the sole signer, per §9 open question 2).
#[derive(Debug, Deserialize)]
struct BuildTransactionResponse {
    /// Base64-encoded unsigned transaction with a fresh blockhash baked in.
    transaction: String,
}

#[derive(Debug, Serialize)]
struct BuildTransactionRequest<'a> {
    instructions_b64: Vec<String>,
    payer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<&'a str>,
}

/// Result of offering a transaction to the external gateway, keeping a
/// delivery failure (never reached the ledger) distinct from a ledger
/// rejection (reached the ledger, and the ledger said no).
enum GatewayOutcome {
    /// No gateway is configured; never attempted.
    NotConfigured,
    /// Confirmed on-ledger via the gateway-built transaction.
    Delivered(Signature),
    /// Could not reach, parse, or get a usable transaction out of the
    /// gateway's `/build-transaction` endpoint. Retry-eligible: the caller
    /// falls back to direct RPC with the same instructions.
    DeliveryFailed(ClientError),
    /// The gateway built and the client signed a transaction, but the
    /// ledger rejected it. This is a final, deterministic answer (spec §7)
    /// and must never trigger a resubmission.
    LedgerRejected(ClientError),
}

/// Routes a signed instruction set to the ledger, trying the optimizing
/// gateway first and falling back to direct RPC.
pub struct TransactionRouter {
    rpc: RpcClient,
    http: reqwest::Client,
    gateway_url: Option<String>,
    journal: Box<dyn JournalSink>,
}

impl TransactionRouter {
    /// Builds a router against `rpc_url`, optionally using `gateway_url` as
    /// the first, optimizing hop.
    pub fn new(rpc_url: &str, gateway_url: Option<String>, journal: Box<dyn JournalSink>) -> Self {
        Self {
            rpc: RpcClient::new(rpc_url.to_string()),
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("reqwest client builder"),
            gateway_url,
            journal,
        }
    }

    fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    /// Submits `instructions` signed by `payer`/`signers`, trying the
    /// gateway first (if configured), then direct RPC.
    ///
    /// Returns the confirmed signature and which path delivered it.
    pub async fn submit(
        &self,
        kind: TransactionKind,
        instructions: &[Instruction],
        payer: &Keypair,
        signers: &[&Keypair],
        escrow_pda: &str,
        client: &str,
        provider: &str,
        amount: u64,
    ) -> Result<(Signature, bool)> {
        let start = std::time::Instant::now();

        let gateway_outcome = if self.gateway_url.is_some() {
            self.try_gateway(instructions, payer, signers).await
        } else {
            GatewayOutcome::NotConfigured
        };

        let (signature, routing) = match gateway_outcome {
            GatewayOutcome::Delivered(sig) => (sig, RoutingPath::Gateway),
            GatewayOutcome::DeliveryFailed(e) => {
                warn!(error = %e, "gateway transaction path failed, falling back to direct RPC");
                let sig = self.submit_via_rpc(instructions, payer, signers)?;
                (sig, RoutingPath::RpcFallback)
            }
            GatewayOutcome::LedgerRejected(e) => {
                // The gateway delivered a transaction and the ledger rejected
                // it (e.g. `WrongStatus` on a double-release): this is a
                // deterministic answer, not a delivery problem, so it must
                // never be resubmitted via RPC fallback (spec §7).
                self.journal.record(JournalRecord {
                    kind,
                    status: JournalStatus::Failed,
                    routing: RoutingPath::Gateway,
                    signature: None,
                    client: client.to_string(),
                    provider: provider.to_string(),
                    amount,
                    escrow_pda: escrow_pda.to_string(),
                    submitted_at: 0,
                    elapsed_ms: start.elapsed().as_millis() as u64,
                    error: Some(e.to_string()),
                });
                return Err(e);
            }
            GatewayOutcome::NotConfigured => {
                let sig = self.submit_via_rpc(instructions, payer, signers)?;
                (sig, RoutingPath::RpcDirect)
            }
        };

        self.journal.record(JournalRecord {
            kind,
            status: JournalStatus::Success,
            routing,
            signature: Some(signature.to_string()),
            client: client.to_string(),
            provider: provider.to_string(),
            amount,
            escrow_pda: escrow_pda.to_string(),
            submitted_at: 0,
            elapsed_ms: start.elapsed().as_millis() as u64,
            error: None,
        });

        Ok((signature, matches!(routing, RoutingPath::Gateway)))
    }

    /// Offers `instructions` to the external gateway, distinguishing a
    /// failure to *deliver* the transaction (reach/parse the gateway's
    /// `/build-transaction` endpoint — retry-eligible, falls back to direct
    /// RPC) from the ledger *rejecting* a transaction the gateway did
    /// successfully build and the client did sign (never retried: the
    /// ledger has already given its answer).
    async fn try_gateway(
        &self,
        instructions: &[Instruction],
        payer: &Keypair,
        signers: &[&Keypair],
    ) -> GatewayOutcome {
        let Some(url) = self.gateway_url.as_ref() else {
            return GatewayOutcome::NotConfigured;
        };
        let request = BuildTransactionRequest {
            instructions_b64: instructions
                .iter()
                .map(|ix| base64_encode(&bincode_ix(ix)))
                .collect(),
            payer: payer.pubkey().to_string(),
            priority: Some("auto"),
        };

        let response = match self
            .http
            .post(format!("{url}/build-transaction"))
            .json(&request)
            .send()
            .await
        {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                return GatewayOutcome::DeliveryFailed(ClientError::GatewayUnavailable(format!(
                    "gateway returned {}",
                    r.status()
                )))
            }
            Err(e) => return GatewayOutcome::DeliveryFailed(ClientError::GatewayUnavailable(e.to_string())),
        };

        let body: BuildTransactionResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => return GatewayOutcome::DeliveryFailed(ClientError::GatewayUnavailable(e.to_string())),
        };

        let mut tx: Transaction = match decode_transaction(&body.transaction) {
            Ok(tx) => tx,
            Err(e) => return GatewayOutcome::DeliveryFailed(ClientError::GatewayUnavailable(e)),
        };

        let blockhash = tx.message.recent_blockhash;
        tx.sign(signers, blockhash);

        debug!("submitting gateway-built transaction");
        match self.rpc().send_and_confirm_transaction(&tx) {
            Ok(sig) => GatewayOutcome::Delivered(sig),
            Err(e) => GatewayOutcome::LedgerRejected(ClientError::Solana {
                context: "gateway_submit",
                message: e.to_string(),
            }),
        }
    }

    fn submit_via_rpc(
        &self,
        instructions: &[Instruction],
        payer: &Keypair,
        signers: &[&Keypair],
    ) -> Result<Signature> {
        let recent_hash = self
            .rpc()
            .get_latest_blockhash()
            .map_err(|e| ClientError::solana("get_latest_blockhash", e))?;

        let tx = Transaction::new_signed_with_payer(
            instructions,
            Some(&payer.pubkey()),
            signers,
            recent_hash,
        );

        // skip_preflight is accepted only here, on the explicit fallback
        // path (spec §9): it avoids blockhash-expiry flakes at the cost of
        // losing client-side simulation errors.
        let config = RpcSendTransactionConfig {
            skip_preflight: true,
            ..Default::default()
        };

        let signature = self
            .rpc()
            .send_transaction_with_config(&tx, config)
            .map_err(|e| ClientError::solana("rpc_fallback_submit", e))?;

        self.rpc()
            .confirm_transaction(&signature)
            .map_err(|e| ClientError::solana("rpc_fallback_confirm", e))?;

        info!(%signature, "transaction confirmed via direct RPC");
        Ok(signature)
    }
}

fn base64_encode(bytes: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

fn bincode_ix(ix: &Instruction) -> Vec<u8> {
    bincode::serde::encode_to_vec(ix, bincode::config::standard())
        .expect("instruction serialization never fails")
}

pub(crate) fn decode_transaction(b64: &str) -> std::result::Result<Transaction, String> {
    use base64::Engine;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64)
        .map_err(|e| e.to_string())?;
    bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
        .map(|(tx, _)| tx)
        .map_err(|e| e.to_string())
}
