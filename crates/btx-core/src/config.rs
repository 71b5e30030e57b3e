//! Settings structs consumed by the runner binaries.
//!
//! The CLI layer (clap, in `btx-runner`) parses flags and fills these in;
//! the services themselves only ever see the structs, so tests can construct
//! them directly.

use std::path::PathBuf;
use std::time::Duration;

/// Settings for the live DTC bridge.
#[derive(Debug, Clone)]
pub struct BridgeSettings {
    /// Server name announced in the logon response.
    pub server_name: String,
    /// TCP listen port.
    pub port: u16,
    /// Period of the per-client account refresh (orders/trades/balances).
    pub update_client_span: Duration,
    /// Optional outbound heartbeat interval for the upstream WebSocket.
    pub ws_heartbeat: Option<Duration>,
    /// Upstream watchdog timeout: reconnect when no event arrives within it.
    pub ws_timeout: Duration,
    /// Sierra Chart mode: suppress the unsolicited post-logon security
    /// definition stream unless the client asked for it.
    pub sierra_chart: bool,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            server_name: "btx-bridge".into(),
            port: 5573,
            update_client_span: Duration::from_secs(30),
            ws_heartbeat: None,
            ws_timeout: Duration::from_secs(60),
            sierra_chart: false,
        }
    }
}

/// Settings for the historical data service.
#[derive(Debug, Clone)]
pub struct HistSettings {
    /// TCP listen port.
    pub port: u16,
    /// Root directory holding one tick store per symbol.
    pub datadir: PathBuf,
    /// Earliest date to backfill, seconds since epoch (0 = store genesis).
    pub start_s: u64,
    /// Plan pump windows but do not write.
    pub dry_run: bool,
    /// Serve queries only; do not ingest.
    pub no_pump: bool,
    /// Symbols to ingest and serve.
    pub symbols: Vec<String>,
}

impl Default for HistSettings {
    fn default() -> Self {
        Self {
            port: 5576,
            datadir: PathBuf::from("data/bittrex"),
            start_s: 0,
            dry_run: false,
            no_pump: false,
            symbols: Vec::new(),
        }
    }
}
