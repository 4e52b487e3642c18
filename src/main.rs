//! Verifiable randomness CLI.
//!
//! # Architecture Overview
//!
//! ```text
//!                   ┌──────────────────────────────────────────────────────┐
//!                   │                  RANDOMNESS CLIENT                   │
//!                   │                                                      │
//!   instant ────────┼─▶ ReadOnlyClient ──▶ contract view ─────────────────┼──▶ result
//!                   │        │ (lazy RPC connection)                       │
//!                   │        ▼                                             │
//!   verifiable ─────┼─▶ SessionManager ──▶ contract tx ──▶ confirmation ──┼──▶ result
//!                   │   (wallet, network)   (wallet signs)   (receipt poll)│   + provenance
//!                   │                                            │         │
//!                   │                                            ▼         │
//!                   │                                     EventCorrelator  │
//!                   │                                                      │
//!                   │  ┌────────────────────────────────────────────────┐ │
//!                   │  │ config · observability · lifecycle · resilience │ │
//!                   │  └────────────────────────────────────────────────┘ │
//!                   └──────────────────────────────────────────────────────┘
//! ```

use alloy::primitives::B256;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use randomness_client::config::{load_config, AppConfig};
use randomness_client::lifecycle::signals::cancel_on_interrupt;
use randomness_client::observability::{logging, metrics};
use randomness_client::randomness::RecordKind;
use randomness_client::wallet::{LocalWallet, WalletProvider};
use randomness_client::{Cancellation, Mode, RandomnessRequest, RandomnessService};

#[derive(Parser)]
#[command(name = "randomness-cli")]
#[command(about = "Instant and verifiable on-chain randomness", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults target Flow EVM mainnet.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Random number in [min, max]
    Number {
        #[arg(long)]
        min: u64,
        #[arg(long)]
        max: u64,
        /// Submit a transaction instead of reading
        #[arg(long)]
        verifiable: bool,
    },
    /// Pick one of the given items
    Pick {
        #[arg(required = true)]
        items: Vec<String>,
        /// Submit a transaction instead of reading
        #[arg(long)]
        verifiable: bool,
    },
    /// Ask the contract for a YOLO decision (always verifiable)
    Yolo,
    /// Show the stored on-chain record for a request ID
    Record {
        /// number, selection or decision
        kind: String,
        id: B256,
    },
    /// Show the configured network
    Network,
}

fn mode(verifiable: bool) -> Mode {
    if verifiable {
        Mode::Verifiable
    } else {
        Mode::Instant
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!("randomness-cli v{} starting", env!("CARGO_PKG_VERSION"));

    if let Some(address) = &config.observability.metrics_address {
        match address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(metrics_address = %address, "Failed to parse metrics address"),
        }
    }

    let network = randomness_client::NetworkDescriptor::from(&config.network);
    let wallet = LocalWallet::from_env(&config.wallet.private_key_env, network)?
        .map(|w| w.with_send_timeout(std::time::Duration::from_secs(config.rpc.timeout_secs)))
        .map(|w| Arc::new(w) as Arc<dyn WalletProvider>);
    if wallet.is_none() {
        tracing::info!(
            var = %config.wallet.private_key_env,
            "No wallet key configured; verifiable requests are unavailable"
        );
    }

    let service = RandomnessService::from_config(&config, wallet)?;
    service.sessions().mount();

    let cancellation = Arc::new(Cancellation::new());
    let interrupt = cancel_on_interrupt(cancellation.clone());
    let cancel = cancellation.token();

    let output = match cli.command {
        Commands::Number { min, max, verifiable } => {
            let request = RandomnessRequest::number(mode(verifiable), min, max);
            let result = if verifiable {
                service.request_verifiable_with_cancel(&request, &cancel).await?
            } else {
                service.query_instant(&request).await?
            };
            with_explorer(serde_json::to_value(&result)?, service.explorer_url(&result))
        }
        Commands::Pick { items, verifiable } => {
            let request = RandomnessRequest::selection(mode(verifiable), items);
            let result = if verifiable {
                service.request_verifiable_with_cancel(&request, &cancel).await?
            } else {
                service.query_instant(&request).await?
            };
            with_explorer(serde_json::to_value(&result)?, service.explorer_url(&result))
        }
        Commands::Yolo => {
            let result = service
                .request_verifiable_with_cancel(&RandomnessRequest::decision(), &cancel)
                .await?;
            with_explorer(serde_json::to_value(&result)?, service.explorer_url(&result))
        }
        Commands::Record { kind, id } => {
            let kind: RecordKind = kind.parse()?;
            serde_json::to_value(service.record(kind, id).await?)?
        }
        Commands::Network => {
            let mut value = serde_json::to_value(service.network())?;
            value["contract"] = serde_json::json!(service.network().address_url(&service.contract_address()));
            value
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);

    interrupt.abort();
    service.sessions().unmount();
    Ok(())
}

fn with_explorer(mut value: serde_json::Value, explorer_url: Option<String>) -> serde_json::Value {
    if let Some(url) = explorer_url {
        value["explorerUrl"] = serde_json::Value::String(url);
    }
    value
}
