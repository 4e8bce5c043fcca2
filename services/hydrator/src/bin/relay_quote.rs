//! Relay Quote Tool
//!
//! Hydrates every pool in a ledger snapshot and prints a routed quote as JSON.
//!
//! Architecture:
//! Snapshot file → StaticSource → Hydrator → PoolRegistry → Router → stdout

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use relay_amm::{build_all_feeds, PoolRegistry, Router};
use relay_config::{load_config, RelayConfig};
use relay_hydrator::{Hydrator, LedgerSnapshot, StaticSource};
use relay_types::{Decimal, Quantity, TokenId};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Output received for paying in `amount` of `from`
    Return,
    /// Input of `from` needed to receive `amount` of `to`
    Cost,
}

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "relay_quote")]
#[command(about = "Quote a conversion across relay pools from a ledger snapshot")]
struct Args {
    /// Ledger snapshot (JSON)
    #[arg(short, long)]
    snapshot: PathBuf,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Environment (development, staging, production)
    #[arg(short, long)]
    environment: Option<String>,

    /// Token paid in, `contract-CODE`
    #[arg(long)]
    from: TokenId,

    /// Token received, `contract-CODE`
    #[arg(long)]
    to: TokenId,

    /// Amount of `from` (return) or `to` (cost)
    #[arg(long)]
    amount: Decimal,

    #[arg(long, value_enum, default_value = "return")]
    mode: Mode,

    /// Also print USD feeds and the deepest pool per pair
    #[arg(long)]
    feeds: bool,
}

fn init_tracing(config: &RelayConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&config.global.log_level))
        .context("Invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

/// Precision of `token` as held in any hydrated reserve
fn precision_of(registry: &PoolRegistry, token: &TokenId) -> Result<u8> {
    registry
        .hydrated_pools()
        .flat_map(|pool| pool.reserves.iter())
        .find(|reserve| &reserve.token == token)
        .map(|reserve| reserve.balance.precision())
        .ok_or_else(|| anyhow!("{token} is not a reserve of any hydrated pool"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => RelayConfig::load(Some(path.as_path()), args.environment.as_deref())?,
        None => load_config(args.environment.as_deref())?,
    };
    init_tracing(&config)?;
    info!("Snapshot: {:?}", args.snapshot);

    let json = tokio::fs::read_to_string(&args.snapshot)
        .await
        .with_context(|| format!("Failed to read snapshot {:?}", args.snapshot))?;
    let snapshot = LedgerSnapshot::from_json(&json).context("Failed to parse snapshot")?;
    let source = Arc::new(StaticSource::from_snapshot(&snapshot)?);

    let hydrator = Hydrator::new(source, config.hydration.clone());
    let registry = PoolRegistry::new(snapshot.dry_pools.clone());
    let (registry, report) = hydrator
        .refresh(&registry, &snapshot.share_contract, &snapshot.relay_contract)
        .await;
    for failure in &report.failures {
        warn!(pool = %failure.pool, error = %failure.error, "Pool excluded");
    }

    let blacklist = config.routing.blacklisted_tokens()?;
    let registry = registry.without_blacklisted(&blacklist);
    let router = Router::new(&registry);

    let route = match args.mode {
        Mode::Return => {
            let amount = Quantity::new(args.amount, args.from.clone(), precision_of(&registry, &args.from)?);
            router.get_return(&amount, &args.to)
        }
        Mode::Cost => {
            let desired = Quantity::new(args.amount, args.to.clone(), precision_of(&registry, &args.to)?);
            router.get_cost(&args.from, &desired)
        }
    }
    .with_context(|| format!("No quote from {} to {}", args.from, args.to))?;

    println!("{}", serde_json::to_string_pretty(&route)?);

    if args.feeds {
        let known = config.feeds.known_prices()?;
        let feeds = build_all_feeds(registry.hydrated_pools(), &known);
        let deepest: Vec<String> = registry
            .convertible_pools(&feeds)
            .iter()
            .map(|pool| pool.id().to_string())
            .collect();
        println!("{}", serde_json::to_string_pretty(&feeds)?);
        println!("{}", serde_json::to_string_pretty(&deepest)?);
    }

    Ok(())
}
