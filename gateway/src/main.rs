//! Gateway service entry point: loads configuration, wires dependencies,
//! and serves the axum router over `TASKROW_GATEWAY_HOST`/`_PORT`.

use std::sync::Arc;
use std::time::Duration;

use taskrow_client::EscrowClient;
use taskrow_core::journal::TracingJournal;
use taskrow_gateway::config::GatewayConfig;
use taskrow_gateway::marketplace::{HttpMarketplaceClient, MarketplaceClient, NullMarketplaceClient};
use taskrow_gateway::{build_router, AppState};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    let config = GatewayConfig::from_env()?;
    info!(bind_addr = %config.bind_addr, network = %config.network, "starting taskrow gateway");

    let authority = EscrowClient::load_keypair(&config.authority_keypair_path)?;
    let program_id = EscrowClient::parse_pubkey(&config.escrow_program_id)?;
    let mint = EscrowClient::parse_pubkey(&config.mint)?;

    let escrow_client = Arc::new(EscrowClient::new(
        &config.rpc_url,
        program_id,
        mint,
        authority,
        config.external_gateway_url.clone(),
    ));

    let marketplace: Arc<dyn MarketplaceClient> = match &config.marketplace_url {
        Some(url) => {
            info!(%url, "marketplace job-completion reporting enabled");
            Arc::new(HttpMarketplaceClient::new(reqwest::Client::new(), url.clone()))
        }
        None => {
            info!("no TASKROW_MARKETPLACE_URL set; marketplace updates are no-ops");
            Arc::new(NullMarketplaceClient)
        }
    };

    let state = AppState { escrow_client, marketplace, journal: Arc::new(TracingJournal) };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("taskrow gateway listening on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
