//! Logging setup for the runner binaries.
//!
//! Both services log through `tracing`: a colored console layer always, and
//! a daily-rotated file layer when a `--logfile` path is given (the file's
//! directory and name become the rotation target). The CLI surface speaks
//! numeric levels, `1` = error, `2` = info, `3` = debug; a `RUST_LOG`
//! environment variable overrides whatever the flags ask for.

use std::path::Path;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Map a numeric CLI log level to a tracing level name. Out-of-range values
/// fall back to `info`.
pub fn level_name(level: u8) -> &'static str {
    match level {
        1 => "error",
        3 => "debug",
        _ => "info",
    }
}

/// Filter directives for the live bridge's three level flags: the base
/// level plus per-layer overrides for the protocol and exchange crates.
pub fn bridge_filter(loglevel: u8, loglevel_dtc: u8, loglevel_btrex: u8) -> String {
    format!(
        "{},btx_dtc={},btx_bridge={}",
        level_name(loglevel),
        level_name(loglevel_dtc),
        level_name(loglevel_btrex),
    )
}

/// Install the global subscriber. Call once, before anything logs.
///
/// `filter` is a tracing directive string (see [`bridge_filter`]); it only
/// applies when `RUST_LOG` is unset. `logfile`, when given, enables the
/// daily-rotating file layer alongside the console.
pub fn init_logging(filter: &str, logfile: Option<&Path>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Option<Layer> is itself a layer, so the file half simply collapses
    // away when no path was configured.
    let file_layer = logfile.map(|path| {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let name = path.file_name().unwrap_or_else(|| "btx.log".as_ref());
        fmt::layer()
            .with_writer(tracing_appender::rolling::daily(dir, name))
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .init();
}
