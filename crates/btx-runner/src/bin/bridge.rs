//! Live bridge entry point.
//!
//! Fetches the static currency and ticker tables (fatal on failure), then
//! starts the REST queue consumer, the upstream WebSocket supervisor, the
//! ticker refresher, and the DTC server, and waits for Ctrl+C.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info, warn};

use btx_bridge::bittrex::Exchange as _;
use btx_bridge::bittrex::rest::BittrexClient;
use btx_bridge::bittrex::ws::{self, UpstreamConfig};
use btx_bridge::{Bridge, refresher, server};
use btx_core::config::BridgeSettings;
use btx_core::logging::{bridge_filter, init_logging};
use btx_core::state::MarketState;
use btx_core::time_util;

/// Upstream stream endpoint.
const UPSTREAM_WS_URL: &str = "wss://socket.bittrex.com/feed";

/// DTC bridge to the Bittrex exchange.
#[derive(Parser)]
#[command(name = "btx-bridge", about = "DTC bridge to the Bittrex exchange")]
struct Cli {
    /// Per-client account refresh period in seconds.
    #[arg(long = "update-client-span", default_value_t = 30)]
    update_client_span: u64,

    /// Outbound upstream WebSocket heartbeat interval in seconds.
    #[arg(long)]
    heartbeat: Option<u64>,

    /// Upstream watchdog timeout in seconds.
    #[arg(long, default_value_t = 60)]
    timeout: u64,

    /// Serve DTC over TLS (certificate loading is handled by the deployment).
    #[arg(long, default_value_t = false)]
    tls: bool,

    /// DTC listen port.
    #[arg(long, default_value_t = 5573)]
    port: u16,

    /// Detach from the terminal (handled by the deployment wrapper).
    #[arg(long, default_value_t = false)]
    daemon: bool,

    /// PID file path (used by the deployment wrapper).
    #[arg(long, default_value = "run/btrex.pid")]
    pidfile: PathBuf,

    /// Log file path.
    #[arg(long, default_value = "log/btrex.log")]
    logfile: PathBuf,

    /// Log level: 1=error, 2=info, 3=debug.
    #[arg(long, default_value_t = 2)]
    loglevel: u8,

    /// Log level for the DTC protocol layer.
    #[arg(long = "loglevel-dtc", default_value_t = 2)]
    loglevel_dtc: u8,

    /// Log level for the exchange layer.
    #[arg(long = "loglevel-btrex", default_value_t = 2)]
    loglevel_btrex: u8,

    /// TLS certificate file.
    #[arg(long = "crt-file", default_value = "ssl/bitsouk.com.crt")]
    crt_file: PathBuf,

    /// TLS key file.
    #[arg(long = "key-file", default_value = "ssl/bitsouk.com.key")]
    key_file: PathBuf,

    /// Sierra Chart mode: skip the unsolicited post-logon security
    /// definition stream unless the client asks for it.
    #[arg(long = "sc", default_value_t = false)]
    sierra_chart: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = bridge_filter(cli.loglevel, cli.loglevel_dtc, cli.loglevel_btrex);
    init_logging(&filter, Some(&cli.logfile));

    if cli.daemon {
        warn!("--daemon is handled by the deployment wrapper; running in the foreground");
    }
    if cli.tls {
        warn!(
            "--tls is terminated by the deployment front end ({} / {})",
            cli.crt_file.display(),
            cli.key_file.display()
        );
    }

    let settings = BridgeSettings {
        server_name: "btrex".into(),
        port: cli.port,
        update_client_span: Duration::from_secs(cli.update_client_span),
        ws_heartbeat: cli.heartbeat.map(Duration::from_secs),
        ws_timeout: Duration::from_secs(cli.timeout),
        sierra_chart: cli.sierra_chart,
    };

    let exchange = Arc::new(BittrexClient::new()?);
    let state = Arc::new(MarketState::new());

    // Initial currency and ticker fetch is the one REST failure that aborts.
    let currencies = exchange
        .get_currencies()
        .await
        .context("initial currency fetch failed")?;
    info!("loaded {} currencies", currencies.len());
    state.set_currencies(currencies);

    let tickers = exchange
        .get_tickers()
        .await
        .context("initial ticker fetch failed")?;
    info!("loaded {} tickers", tickers.len());
    let now_us = time_util::now_us();
    for (symbol, ticker) in tickers {
        state.put_ticker(&symbol, now_us, ticker);
    }

    let bridge = Arc::new(Bridge::new(state, exchange, settings));

    // Margin routing is best-effort; an empty set just routes everything
    // through the exchange account.
    match bridge.exchange.margin_enabled_markets().await {
        Ok(markets) => {
            info!("{} margin-enabled markets", markets.len());
            bridge.set_margin_symbols(markets);
        }
        Err(e) => warn!("margin market fetch failed: {e}"),
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let rest = Arc::clone(&bridge.rest);
    tokio::spawn(async move { rest.run().await });

    let upstream = UpstreamConfig {
        url: UPSTREAM_WS_URL.to_string(),
        heartbeat: bridge.settings.ws_heartbeat,
        timeout: bridge.settings.ws_timeout,
    };
    tokio::spawn(ws::run_upstream(Arc::clone(&bridge), upstream, shutdown_rx.clone()));
    tokio::spawn(refresher::run_ticker_refresher(Arc::clone(&bridge), shutdown_rx.clone()));

    let server_bridge = Arc::clone(&bridge);
    let server_shutdown = shutdown_rx.clone();
    let server_task = tokio::spawn(async move {
        if let Err(e) = server::run_server(server_bridge, server_shutdown).await {
            error!("DTC server failed: {e}");
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);
    let _ = server_task.await;
    info!("goodbye");
    Ok(())
}
