//! Historical data service entry point.
//!
//! Opens one tick store per symbol under the data directory, starts the
//! trade pump (unless disabled), and serves historical DTC queries.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info, warn};

use btx_bridge::bittrex::rest::BittrexClient;
use btx_core::config::HistSettings;
use btx_core::logging::{init_logging, level_name};
use btx_hist::pump::Pump;
use btx_hist::server::{self, HistService};
use btx_hist::store::TickStore;

/// Historical data service for the BTREX bridge.
#[derive(Parser)]
#[command(name = "btx-hist", about = "Historical trade data service")]
struct Cli {
    /// Plan pump windows without writing.
    #[arg(long = "dry-run", default_value_t = false)]
    dry_run: bool,

    /// Serve queries only; do not ingest.
    #[arg(long = "no-pump", default_value_t = false)]
    no_pump: bool,

    /// Earliest backfill date (YYYY-MM-DD).
    #[arg(long)]
    start: Option<String>,

    /// DTC listen port.
    #[arg(long, default_value_t = 5576)]
    port: u16,

    /// Detach from the terminal (handled by the deployment wrapper).
    #[arg(long, default_value_t = false)]
    daemon: bool,

    /// Root directory for the per-symbol tick stores.
    #[arg(long, default_value = "data/bittrex")]
    datadir: PathBuf,

    /// PID file path (used by the deployment wrapper).
    #[arg(long, default_value = "run/btrex-hist.pid")]
    pidfile: PathBuf,

    /// Log file path.
    #[arg(long, default_value = "log/btrex-hist.log")]
    logfile: PathBuf,

    /// Log level: 1=error, 2=info, 3=debug.
    #[arg(long, default_value_t = 2)]
    loglevel: u8,

    /// Symbols to ingest and serve (e.g. BTC-ETH BTC-LTC).
    symbols: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(level_name(cli.loglevel), Some(&cli.logfile));

    if cli.daemon {
        warn!("--daemon is handled by the deployment wrapper; running in the foreground");
    }
    if cli.symbols.is_empty() {
        anyhow::bail!("no symbols given");
    }

    let start_s = match cli.start.as_deref() {
        Some(date) => {
            let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .with_context(|| format!("bad --start date {date:?}"))?;
            parsed
                .and_hms_opt(0, 0, 0)
                .context("midnight conversion")?
                .and_utc()
                .timestamp() as u64
        }
        None => 0,
    };

    let settings = HistSettings {
        port: cli.port,
        datadir: cli.datadir.clone(),
        start_s,
        dry_run: cli.dry_run,
        no_pump: cli.no_pump,
        symbols: cli.symbols.clone(),
    };

    let mut stores = HashMap::new();
    for symbol in &settings.symbols {
        let store = TickStore::open(&settings.datadir, symbol)?;
        info!("{symbol}: {} ticks on disk", store.len());
        stores.insert(symbol.clone(), store);
    }
    let stores = Arc::new(stores);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    if settings.no_pump {
        info!("pump disabled (--no-pump)");
    } else {
        let exchange = Arc::new(BittrexClient::new()?);
        let pump = Pump::new(exchange, Arc::clone(&stores), settings.clone())?;
        tokio::spawn(pump.run(shutdown_rx.clone()));
    }

    let service = Arc::new(HistService {
        server_name: "btrex-hist".into(),
        port: settings.port,
        stores,
    });
    let server_shutdown = shutdown_rx.clone();
    let server_task = tokio::spawn(async move {
        if let Err(e) = server::run_server(service, server_shutdown).await {
            error!("historical server failed: {e}");
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);
    let _ = server_task.await;
    info!("goodbye");
    Ok(())
}
