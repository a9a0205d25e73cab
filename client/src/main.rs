use clap::{Parser, Subcommand};
use solana_sdk::pubkey::Pubkey;
use taskrow_client::{EscrowClient, EscrowLookup, InitOutcome};
use taskrow_core::hash::task_hash;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// JSON RPC endpoint for the target cluster.
    #[arg(long, env = "TASKROW_RPC_URL", default_value = "http://127.0.0.1:8899")]
    rpc_url: String,

    /// Optional optimizing transaction gateway, tried before direct RPC.
    #[arg(long, env = "TASKROW_GATEWAY_URL")]
    gateway_url: Option<String>,

    /// Escrow program address.
    #[arg(long, env = "TASKROW_PROGRAM_ID")]
    program_id: String,

    /// SPL token mint used for escrowed payments.
    #[arg(long, env = "TASKROW_MINT")]
    mint: String,

    /// Path to the client's keypair file.
    #[arg(long, env = "TASKROW_CLIENT_KEYPAIR")]
    keypair: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Lock funds for `provider` under a fresh task hash.
    Init {
        /// Provider address.
        #[arg(long)]
        provider: String,
        /// Amount in the mint's smallest unit.
        #[arg(long)]
        amount: u64,
        /// Human-readable service identifier, carried on-ledger.
        #[arg(long)]
        service_id: String,
        /// Opaque task payload hashed into the task hash.
        #[arg(long)]
        task_data: String,
        /// Nonce distinguishing otherwise-identical tasks.
        #[arg(long)]
        nonce: u64,
    },

    /// Look up an escrow's on-ledger state.
    Status {
        /// Provider address (needed to re-derive the PDA).
        #[arg(long)]
        provider: String,
        /// Opaque task payload used at init time.
        #[arg(long)]
        task_data: String,
        /// Nonce used at init time.
        #[arg(long)]
        nonce: u64,
        /// Service identifier used at init time.
        #[arg(long)]
        service_id: String,
    },

    /// Release locked funds to the provider. Client is always the authority.
    Release {
        /// Provider address.
        #[arg(long)]
        provider: String,
        /// Opaque task payload used at init time.
        #[arg(long)]
        task_data: String,
        /// Nonce used at init time.
        #[arg(long)]
        nonce: u64,
        /// Service identifier used at init time.
        #[arg(long)]
        service_id: String,
    },

    /// Cancel a pending escrow and refund the client.
    Cancel {
        /// Provider address.
        #[arg(long)]
        provider: String,
        /// Opaque task payload used at init time.
        #[arg(long)]
        task_data: String,
        /// Nonce used at init time.
        #[arg(long)]
        nonce: u64,
        /// Service identifier used at init time.
        #[arg(long)]
        service_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing. In order to view logs, run `RUST_LOG=info cargo run`
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    info!("Starting command handling");

    let keypair = EscrowClient::load_keypair(&cli.keypair)?;
    let program_id = EscrowClient::parse_pubkey(&cli.program_id)?;
    let mint = EscrowClient::parse_pubkey(&cli.mint)?;
    let client = EscrowClient::new(&cli.rpc_url, program_id, mint, keypair, cli.gateway_url);

    execute(&client, cli.command).await
}

async fn execute(client: &EscrowClient, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Init {
            provider,
            amount,
            service_id,
            task_data,
            nonce,
        } => {
            let provider = EscrowClient::parse_pubkey(&provider)?;
            let hash = task_hash(&service_id, &task_data, nonce);

            info!("Initializing escrow");
            match client
                .initialize_escrow_via_gateway(provider, amount, service_id, hash)
                .await?
            {
                InitOutcome::Created { signature, used_gateway } => {
                    info!(%signature, used_gateway, "escrow initialized");
                }
                InitOutcome::AlreadyExists => {
                    info!("escrow already pending for these seeds, nothing to do");
                }
            }
        }

        Commands::Status {
            provider,
            task_data,
            nonce,
            service_id,
        } => {
            let provider = EscrowClient::parse_pubkey(&provider)?;
            let hash = task_hash(&service_id, &task_data, nonce);
            let (pda, _bump) = escrow_pda(client, &provider, &hash);

            match client.check_escrow(&pda)? {
                EscrowLookup::Exists(escrow) => {
                    info!(%pda, status = ?escrow.status, amount = escrow.amount, "escrow found");
                    println!("{escrow:#?}");
                }
                EscrowLookup::NotExists => {
                    info!(%pda, "no escrow at this address");
                }
            }
        }

        Commands::Release {
            provider,
            task_data,
            nonce,
            service_id,
        } => {
            let provider = EscrowClient::parse_pubkey(&provider)?;
            let hash = task_hash(&service_id, &task_data, nonce);
            let (pda, _bump) = escrow_pda(client, &provider, &hash);

            info!(%pda, "releasing payment");
            let (signature, used_gateway) = client.release_payment_via_gateway(pda, provider).await?;
            info!(%signature, used_gateway, "payment released");
        }

        Commands::Cancel {
            provider,
            task_data,
            nonce,
            service_id,
        } => {
            let provider = EscrowClient::parse_pubkey(&provider)?;
            let hash = task_hash(&service_id, &task_data, nonce);
            let (pda, _bump) = escrow_pda(client, &provider, &hash);

            info!(%pda, "cancelling escrow");
            let signature = client.cancel_escrow(pda)?;
            info!(%signature, "escrow cancelled");
        }
    }
    Ok(())
}

fn escrow_pda(client: &EscrowClient, provider: &Pubkey, task_hash: &[u8; 32]) -> (Pubkey, u8) {
    let client_pubkey = client.signer_pubkey();
    client.derive_escrow_pda(&client_pubkey, provider, task_hash)
}
