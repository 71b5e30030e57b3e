//! Trade pump: periodic ingest of recent market history per symbol.
//!
//! Each round fetches the exchange's recent trade history for every tracked
//! symbol and inserts it into the symbol's tick store (idempotently; the
//! store skips records it already holds). Hours fully covered by a batch are
//! marked fetched in the control file; the latest hour is deliberately left
//! unmarked so it is fetched again next round.
//!
//! The configured `--start` date bounds the backfill: prints older than it
//! are dropped before storage, and every control-file window before it is
//! pre-marked so nothing ever tries to fill them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info};

use btx_bridge::bittrex::{Exchange, MarketTrade};
use btx_core::config::HistSettings;

use crate::ctrl::{self, CtrlFile};
use crate::store::TickStore;

/// Time between pump rounds.
pub const PUMP_INTERVAL: Duration = Duration::from_secs(60);

/// Per-symbol stores and control files plus the exchange handle.
pub struct Pump {
    exchange: Arc<dyn Exchange>,
    stores: Arc<HashMap<String, TickStore>>,
    ctrls: HashMap<String, CtrlFile>,
    settings: HistSettings,
}

impl Pump {
    pub fn new(
        exchange: Arc<dyn Exchange>,
        stores: Arc<HashMap<String, TickStore>>,
        settings: HistSettings,
    ) -> anyhow::Result<Self> {
        let start_hour = ctrl::hour_index(settings.start_s).unwrap_or(0);
        let mut ctrls = HashMap::new();
        for symbol in &settings.symbols {
            let path = settings.datadir.join(symbol).join("CtrlFile");
            let mut ctrl = CtrlFile::open(path)?;
            if start_hour > 0 {
                ctrl.mark_before(start_hour);
                ctrl.flush()?;
            }
            ctrls.insert(symbol.clone(), ctrl);
        }
        Ok(Self { exchange, stores, ctrls, settings })
    }

    /// Run pump rounds until shutdown.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut tick = tokio::time::interval(PUMP_INTERVAL);
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("[pump] shutdown");
                    return;
                }
                _ = tick.tick() => self.round().await,
            }
        }
    }

    /// One pump round over every symbol. Failures are logged per symbol and
    /// never stop the loop.
    pub async fn round(&mut self) {
        let symbols = self.settings.symbols.clone();
        for symbol in symbols {
            if let Err(e) = self.pump_symbol(&symbol).await {
                error!("[pump] {symbol}: {e}");
            }
        }
    }

    async fn pump_symbol(&mut self, symbol: &str) -> anyhow::Result<()> {
        let fetched = self
            .exchange
            .get_market_history(symbol)
            .await
            .map_err(|e| anyhow::anyhow!("history fetch: {e}"))?;
        let (trades, hours) = plan_batch(fetched, self.settings.start_s);
        if trades.is_empty() {
            debug!("[pump] {symbol}: no trades after {}", self.settings.start_s);
            return Ok(());
        }

        if self.settings.dry_run {
            info!(
                "[pump] {symbol}: dry run, {} trades completing hours {hours:?}",
                trades.len()
            );
            return Ok(());
        }

        let store = self
            .stores
            .get(symbol)
            .ok_or_else(|| anyhow::anyhow!("no store for {symbol}"))?;
        let stored = store.insert_trades(&trades)?;

        if let Some(ctrl) = self.ctrls.get_mut(symbol) {
            for hour in hours {
                ctrl.mark_fetched(hour);
            }
            ctrl.flush()?;
        }

        debug!("[pump] {symbol}: {stored} new trades stored");
        Ok(())
    }
}

/// Shape one fetched batch: drop prints older than `start_s` and list the
/// hour windows the remainder completes (the newest hour is still filling
/// and stays unlisted so the next round fetches it again).
fn plan_batch(mut trades: Vec<MarketTrade>, start_s: u64) -> (Vec<MarketTrade>, Vec<u64>) {
    if start_s > 0 {
        let cutoff_ns = start_s * 1_000_000_000;
        trades.retain(|t| t.timestamp_ns >= cutoff_ns);
    }
    let mut hours: Vec<u64> = trades
        .iter()
        .filter_map(|t| ctrl::hour_index(t.timestamp_ns / 1_000_000_000))
        .collect();
    hours.sort_unstable();
    hours.dedup();
    hours.pop();
    (trades, hours)
}

#[cfg(test)]
mod tests {
    use super::*;
    use btx_core::types::Side;

    fn trade_at(ts_s: u64) -> MarketTrade {
        MarketTrade {
            timestamp_ns: ts_s * 1_000_000_000,
            side: Side::Buy,
            price: 0.05,
            quantity: 1.0,
        }
    }

    #[test]
    fn batch_drops_prints_before_start() {
        let genesis = ctrl::genesis_s();
        let start = genesis + 10 * ctrl::HOUR_S;
        let batch = vec![
            trade_at(genesis + 9 * ctrl::HOUR_S), // before --start
            trade_at(start),
            trade_at(start + ctrl::HOUR_S),
        ];
        let (trades, hours) = plan_batch(batch, start);
        assert_eq!(trades.len(), 2);
        assert!(trades.iter().all(|t| t.timestamp_ns >= start * 1_000_000_000));
        // Hour 10 completes; hour 11 is the newest and stays open.
        assert_eq!(hours, vec![10]);
    }

    #[test]
    fn batch_without_start_keeps_everything() {
        let genesis = ctrl::genesis_s();
        let batch = vec![trade_at(genesis), trade_at(genesis + ctrl::HOUR_S)];
        let (trades, hours) = plan_batch(batch, 0);
        assert_eq!(trades.len(), 2);
        assert_eq!(hours, vec![0]);
    }

    #[test]
    fn single_hour_batch_completes_nothing() {
        let genesis = ctrl::genesis_s();
        let (trades, hours) = plan_batch(vec![trade_at(genesis + 5)], 0);
        assert_eq!(trades.len(), 1);
        assert!(hours.is_empty());
    }
}
