//! tradebench: synthetic order flow against a trading-engine API.
//!
//! Provisions a set of funded traders, then drives the order endpoint from
//! a fixed pool of worker threads and reports sustained throughput and
//! round-trip latency.

mod api;
mod config;
mod error;
mod harness;
mod load;
mod models;
mod report;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use rust_decimal::Decimal;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::api::EngineClient;
use crate::config::{RangeSpec, RunConfig};
use crate::error::Error;
use crate::harness::Harness;
use crate::load::ShutdownCoordinator;

/// Load-generation CLI.
#[derive(Parser)]
#[command(name = "tradebench")]
#[command(about = "Generate synthetic order flow against a trading engine", long_about = None)]
struct Cli {
    /// Root URL of the trading-engine API
    #[arg(long, env = "TRADEBENCH_URL", default_value = "http://localhost:8000")]
    url: String,

    /// Currencies to fund each trader in (comma-separated, at least two)
    #[arg(long, value_delimiter = ',', default_value = "usd,btc")]
    currencies: Vec<String>,

    /// Markets to submit orders against (comma-separated)
    #[arg(long, value_delimiter = ',', default_value = "btcusd")]
    markets: Vec<String>,

    /// Number of synthetic traders to provision
    #[arg(short, long, default_value = "10")]
    traders: usize,

    /// Target number of completed orders
    #[arg(short, long, default_value = "1000")]
    orders: u64,

    /// Number of parallel worker threads
    #[arg(short, long, default_value = "4")]
    workers: usize,

    /// Smallest order volume
    #[arg(long, default_value = "0.1")]
    volume_min: Decimal,

    /// Largest order volume
    #[arg(long, default_value = "1.0")]
    volume_max: Decimal,

    /// Volume grid step
    #[arg(long, default_value = "0.1")]
    volume_step: Decimal,

    /// Lowest order price
    #[arg(long, default_value = "100")]
    price_min: Decimal,

    /// Highest order price
    #[arg(long, default_value = "200")]
    price_max: Decimal,

    /// Price grid step
    #[arg(long, default_value = "10")]
    price_step: Decimal,

    /// Base64-encoded RSA private key PEM for session tokens
    #[arg(long, env = "TRADEBENCH_TOKEN_KEY", hide_env_values = true)]
    token_key: Option<String>,

    /// Base64-encoded RSA private key PEM for management calls
    #[arg(long, env = "TRADEBENCH_MANAGEMENT_KEY", hide_env_values = true)]
    management_key: Option<String>,

    /// Signer name the engine matches management signatures by
    #[arg(long, env = "TRADEBENCH_MANAGEMENT_SIGNER", default_value = "tradebench")]
    management_signer: String,

    /// Write the run report to this file as JSON
    #[arg(long)]
    report: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn into_config(self) -> RunConfig {
        RunConfig {
            url: self.url,
            currencies: self.currencies,
            markets: self.markets,
            traders: self.traders,
            orders: self.orders,
            workers: self.workers,
            volume: RangeSpec::new(self.volume_min, self.volume_max, self.volume_step),
            price: RangeSpec::new(self.price_min, self.price_max, self.price_step),
            token_key: self.token_key,
            management_key: self.management_key,
            management_signer: self.management_signer,
            report_path: self.report,
        }
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = cli.into_config();
    config.validate()?;

    let client = EngineClient::new(
        &config.url,
        config.build_session_signer()?,
        config.build_management_signer()?,
    )?;

    let coordinator = Arc::new(ShutdownCoordinator::new());
    let shutdown = coordinator.flag();
    coordinator
        .install()
        .context("failed to install signal handlers")?;

    info!(
        url = %config.url,
        traders = config.traders,
        orders = config.orders,
        workers = config.workers,
        "Starting run"
    );

    let harness = Harness::new(config.clone(), Arc::new(client));
    match harness.run(shutdown) {
        Ok(report) => {
            println!("{}", report.summary_line());
            if let Some(path) = &config.report_path {
                report.write_to(path)?;
                info!(path = %path.display(), "Report written");
            }
        }
        Err(Error::Report(reason)) => {
            warn!(%reason, "Run produced no usable statistics");
            println!("insufficient data: {reason}");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
