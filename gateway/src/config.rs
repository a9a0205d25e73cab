//! Environment-driven configuration (spec §6 "Environment inputs").
//!
//! Loaded the way the teacher's CLI and the `x402-rs` facilitator sibling
//! read their environment: one function per setting, `dotenvy` loaded
//! first so a local `.env` can stand in for exported variables, explicit
//! defaults where the spec allows one, hard failure where it does not.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};

/// All environment-derived configuration for one gateway instance.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// JSON RPC endpoint for the target cluster.
    pub rpc_url: String,
    /// Escrow program address.
    pub escrow_program_id: String,
    /// SPL token mint used for escrowed payments.
    pub mint: String,
    /// Cluster tag (`devnet`, `mainnet-beta`, ...), checked against incoming
    /// x402 envelopes.
    pub network: String,
    /// Path to the release authority's keypair file (spec §9 open question
    /// 2: the client is the sole release authority; the gateway holds this
    /// key only to *sequence* release transactions on the authority's
    /// behalf, never to act as a second authority).
    pub authority_keypair_path: String,
    /// Fixed decimal count for `(token, network)`, used to convert a
    /// challenge's decimal `amount` into smallest units (spec §9 open
    /// question 3).
    pub decimals: u8,
    /// Optional external optimizing transaction gateway (spec §4.E.1).
    pub external_gateway_url: Option<String>,
    /// Optional API key for the external gateway.
    pub external_gateway_api_key: Option<String>,
    /// Base URL of the marketplace collaborator, if job-lifecycle side
    /// effects are enabled (spec §4.F / §6 "F. Marketplace Collaborator").
    pub marketplace_url: Option<String>,
    /// Address this service binds to.
    pub bind_addr: SocketAddr,
    /// Deadline for outbound calls to the external gateway (spec §5, default 30s).
    pub gateway_timeout: Duration,
    /// Deadline for direct RPC reads (spec §5, default 10s).
    pub rpc_timeout: Duration,
}

fn env_var(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("missing required environment variable {key}"))
}

fn env_var_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl GatewayConfig {
    /// Loads configuration from the process environment, reading a local
    /// `.env` file first if one is present (no-op otherwise).
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let bind_host = env_var_or("TASKROW_GATEWAY_HOST", "0.0.0.0");
        let bind_port: u16 = env_var_or("TASKROW_GATEWAY_PORT", "8402")
            .parse()
            .context("TASKROW_GATEWAY_PORT must be a valid port number")?;
        let bind_addr = format!("{bind_host}:{bind_port}")
            .parse()
            .context("invalid TASKROW_GATEWAY_HOST/TASKROW_GATEWAY_PORT")?;

        let decimals: u8 = env_var_or("TASKROW_TOKEN_DECIMALS", "6")
            .parse()
            .context("TASKROW_TOKEN_DECIMALS must be a small integer")?;

        let gateway_timeout_secs: u64 = env_var_or("TASKROW_GATEWAY_TIMEOUT_SECS", "30")
            .parse()
            .context("TASKROW_GATEWAY_TIMEOUT_SECS must be an integer")?;
        let rpc_timeout_secs: u64 = env_var_or("TASKROW_RPC_TIMEOUT_SECS", "10")
            .parse()
            .context("TASKROW_RPC_TIMEOUT_SECS must be an integer")?;

        Ok(Self {
            rpc_url: env_var_or("TASKROW_RPC_URL", "http://127.0.0.1:8899"),
            escrow_program_id: env_var("TASKROW_PROGRAM_ID")?,
            mint: env_var("TASKROW_MINT")?,
            network: env_var_or("TASKROW_NETWORK", "devnet"),
            authority_keypair_path: env_var("TASKROW_AUTHORITY_KEYPAIR")?,
            decimals,
            external_gateway_url: env_var_opt("TASKROW_EXTERNAL_GATEWAY_URL"),
            external_gateway_api_key: env_var_opt("TASKROW_EXTERNAL_GATEWAY_API_KEY"),
            marketplace_url: env_var_opt("TASKROW_MARKETPLACE_URL"),
            bind_addr,
            gateway_timeout: Duration::from_secs(gateway_timeout_secs),
            rpc_timeout: Duration::from_secs(rpc_timeout_secs),
        })
    }
}
