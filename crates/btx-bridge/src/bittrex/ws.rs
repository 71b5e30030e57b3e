//! Upstream WebSocket supervisor.
//!
//! Maintains exactly one upstream stream at a time:
//!
//! 1. Connects (TLS) with exponential backoff.
//! 2. Re-subscribes every symbol in the ticker table; stream ids change on
//!    every reconnect, so the `subid → symbol` map is rebuilt from the
//!    snapshots that follow.
//! 3. Reads book snapshots, deltas, and trade prints; applies them to the
//!    market state and fans them out to subscribed clients.
//! 4. A watchdog restarts the connection when no event arrives within the
//!    configured timeout. Decode and I/O errors also restart; none are fatal
//!    to the process.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use btx_core::book::BookUpdate;
use btx_core::state::MarketState;
use btx_core::time_util;
use btx_core::types::{LatestTrade, Side};
use btx_dtc::MessageType;
use btx_dtc::messages::{self, AtBidOrAsk, DepthUpdateType};

use crate::Bridge;

/// Upstream connection parameters.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// WebSocket URL of the exchange stream.
    pub url: String,
    /// Optional outbound heartbeat interval, passed through to the transport.
    pub heartbeat: Option<Duration>,
    /// Watchdog timeout: restart when no event arrives within it.
    pub timeout: Duration,
}

// ---------------------------------------------------------------------------
// Upstream message variants
// ---------------------------------------------------------------------------

/// Messages observed on the upstream stream.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpstreamMsg {
    /// Initial book for a newly subscribed symbol, tagged with the stream id
    /// the exchange chose.
    Snapshot {
        subid: u64,
        symbol: String,
        bids: Vec<(f64, f64)>,
        asks: Vec<(f64, f64)>,
    },
    /// Single book level change against a previously snapshotted symbol.
    Update {
        subid: u64,
        side: Option<Side>,
        price: f64,
        quantity: f64,
    },
    /// A trade print. `timestamp` is milliseconds since epoch.
    Trade {
        subid: u64,
        timestamp: u64,
        side: Side,
        price: f64,
        quantity: f64,
    },
    Error { message: String },
}

/// The subscribe command sent once per symbol after every (re)connect.
pub fn subscribe_commands(state: &MarketState) -> Vec<String> {
    state
        .symbols()
        .into_iter()
        .map(|s| format!(r#"{{"op":"subscribe","symbol":"{s}"}}"#))
        .collect()
}

// ---------------------------------------------------------------------------
// Watchdog
// ---------------------------------------------------------------------------

/// Tracks the arrival time of the last upstream event.
///
/// `last_event == 0` means no event has arrived yet on this connection; the
/// watchdog never restarts in that state.
#[derive(Debug, Default)]
pub struct Watchdog {
    last_event_us: AtomicU64,
}

impl Watchdog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event arrival.
    pub fn touch(&self, now_us: u64) {
        self.last_event_us.store(now_us, Ordering::Relaxed);
    }

    /// Forget the last event (called on reconnect).
    pub fn reset(&self) {
        self.last_event_us.store(0, Ordering::Relaxed);
    }

    /// Whether the connection should restart at time `now_us`.
    pub fn should_restart(&self, now_us: u64, timeout: Duration) -> bool {
        let last = self.last_event_us.load(Ordering::Relaxed);
        last != 0 && now_us.saturating_sub(last) > timeout.as_micros() as u64
    }
}

// ---------------------------------------------------------------------------
// Event handling + fan-out
// ---------------------------------------------------------------------------

/// Apply one upstream message to the market state and fan it out.
pub fn handle_upstream_message(bridge: &Bridge, msg: UpstreamMsg) {
    let now_us = time_util::now_us();
    match msg {
        UpstreamMsg::Snapshot { subid, symbol, bids, asks } => {
            debug!("[upstream] snapshot {symbol} (subid {subid}, {}x{} levels)", bids.len(), asks.len());
            bridge.state.bind_subid(subid, &symbol);
            bridge.state.set_book_snapshot(&symbol, &bids, &asks, now_us);
        }
        UpstreamMsg::Update { subid, side, price, quantity } => {
            let Some(symbol) = bridge.state.symbol_for_subid(subid) else {
                error!("[upstream] update for unknown subid {subid}");
                return;
            };
            let update = BookUpdate { side, price, qty: quantity };
            if let Err(e) = bridge.state.apply_book_updates(&symbol, &[update], now_us) {
                error!("[upstream] bad update for {symbol}: {e}");
                return;
            }
            fan_out_depth_update(bridge, &symbol, side.unwrap_or(Side::Buy), price, quantity, now_us);
        }
        UpstreamMsg::Trade { subid, timestamp, side, price, quantity } => {
            let Some(symbol) = bridge.state.symbol_for_subid(subid) else {
                error!("[upstream] trade for unknown subid {subid}");
                return;
            };
            let ts_us = timestamp * 1_000;
            bridge.state.put_latest_trade(
                &symbol,
                LatestTrade { timestamp_us: ts_us, side, price, quantity },
            );
            fan_out_trade(bridge, &symbol, side, price, quantity, ts_us);
        }
        UpstreamMsg::Error { message } => {
            error!("[upstream] exchange error: {message}");
        }
    }
}

/// Send a depth level change to every depth-subscribed client.
fn fan_out_depth_update(
    bridge: &Bridge,
    symbol: &str,
    side: Side,
    price: f64,
    quantity: f64,
    now_us: u64,
) {
    let wire_side = match side {
        Side::Buy => AtBidOrAsk::AtBid,
        Side::Sell => AtBidOrAsk::AtAsk,
    };
    let update_type = if quantity > 0.0 {
        DepthUpdateType::DepthInsertUpdateLevel
    } else {
        DepthUpdateType::DepthDeleteLevel
    };
    for conn in bridge.registry.all() {
        if let Some(symbol_id) = conn.depth_id_for(symbol) {
            conn.writer.try_send(
                MessageType::MarketDepthUpdateLevel,
                &messages::MarketDepthUpdateLevel {
                    symbol_id,
                    side: wire_side as i32,
                    price,
                    quantity,
                    update_type: update_type as i32,
                    date_time: time_util::us_to_float_seconds(now_us),
                },
            );
        }
    }
}

/// Send a trade print to every market-data-subscribed client.
///
/// An aggressive buy executes against the ask, so `side == Buy` maps to
/// `at_ask` (and vice versa).
fn fan_out_trade(bridge: &Bridge, symbol: &str, side: Side, price: f64, quantity: f64, ts_us: u64) {
    let at = match side {
        Side::Buy => AtBidOrAsk::AtAsk,
        Side::Sell => AtBidOrAsk::AtBid,
    };
    for conn in bridge.registry.all() {
        if let Some(symbol_id) = conn.md_id_for(symbol) {
            conn.writer.try_send(
                MessageType::MarketDataUpdateTrade,
                &messages::MarketDataUpdateTrade {
                    symbol_id,
                    at_bid_or_ask: at as i32,
                    price,
                    volume: quantity,
                    date_time: time_util::us_to_float_seconds(ts_us),
                },
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Supervisor loop
// ---------------------------------------------------------------------------

/// Connect, subscribe, read, and reconnect until shutdown.
pub async fn run_upstream(
    bridge: Arc<Bridge>,
    config: UpstreamConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut backoff = Duration::from_millis(100);
    let max_backoff = Duration::from_secs(30);
    let watchdog = Watchdog::new();

    loop {
        if *shutdown.borrow() {
            info!("[upstream] shutdown requested");
            return;
        }

        info!("[upstream] connecting to {}", config.url);
        let ws_stream = match tokio_tungstenite::connect_async(&config.url).await {
            Ok((s, _)) => {
                backoff = Duration::from_millis(100);
                info!("[upstream] connected");
                s
            }
            Err(e) => {
                error!("[upstream] connection failed: {e}, retrying in {backoff:?}");
                tokio::select! {
                    _ = tokio::time::sleep(backoff) => {},
                    _ = shutdown.changed() => return,
                }
                backoff = (backoff * 2).min(max_backoff);
                continue;
            }
        };

        let (mut ws_write, mut ws_read) = ws_stream.split();

        // Stream ids are connection-scoped; stale bindings must not resolve.
        bridge.state.clear_subids();
        watchdog.reset();

        // One subscribe per symbol currently known to the ticker table.
        let mut subscribe_failed = false;
        for cmd in subscribe_commands(&bridge.state) {
            if let Err(e) = ws_write.send(Message::Text(cmd.into())).await {
                error!("[upstream] subscribe send failed: {e}");
                subscribe_failed = true;
                break;
            }
        }
        if subscribe_failed {
            continue;
        }

        let mut watchdog_tick = tokio::time::interval(config.timeout);
        watchdog_tick.tick().await; // consume the immediate first tick

        let heartbeat = config.heartbeat;
        tokio::pin! {
            let hb_tick = async {
                if let Some(interval) = heartbeat {
                    let mut tick = tokio::time::interval(interval);
                    tick.tick().await;
                    loop {
                        tick.tick().await;
                    }
                } else {
                    std::future::pending::<()>().await
                }
            };
        }

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("[upstream] shutdown signal received");
                    let _ = ws_write.close().await;
                    return;
                }

                msg = ws_read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            watchdog.touch(time_util::now_us());
                            match serde_json::from_str::<UpstreamMsg>(&text) {
                                Ok(m) => handle_upstream_message(&bridge, m),
                                Err(e) => {
                                    error!("[upstream] decode error: {e}");
                                    break;
                                }
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            watchdog.touch(time_util::now_us());
                            let _ = ws_write.send(Message::Pong(data)).await;
                        }
                        Some(Ok(Message::Close(_))) => {
                            warn!("[upstream] received close frame");
                            break;
                        }
                        Some(Err(e)) => {
                            error!("[upstream] read error: {e}");
                            break;
                        }
                        None => {
                            warn!("[upstream] stream ended");
                            break;
                        }
                        _ => {} // Pong, Binary, Frame — ignore
                    }
                }

                _ = watchdog_tick.tick() => {
                    if watchdog.should_restart(time_util::now_us(), config.timeout) {
                        warn!(
                            "[upstream] no events for {:?}, restarting connection",
                            config.timeout
                        );
                        break;
                    }
                }

                _ = &mut hb_tick => {
                    if let Err(e) = ws_write.send(Message::Ping(vec![].into())).await {
                        error!("[upstream] heartbeat send error: {e}");
                        break;
                    }
                }
            }
        }

        warn!("[upstream] disconnected, reconnecting in {backoff:?}");
        tokio::select! {
            _ = tokio::time::sleep(backoff) => {},
            _ = shutdown.changed() => return,
        }
        backoff = (backoff * 2).min(max_backoff);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watchdog_quiet_before_first_event() {
        let wd = Watchdog::new();
        // No event yet: never restart, no matter how much time passed.
        assert!(!wd.should_restart(u64::MAX, Duration::from_secs(60)));
    }

    #[test]
    fn watchdog_restarts_exactly_when_stale() {
        let wd = Watchdog::new();
        let t0 = 1_000_000_000;
        wd.touch(t0);
        let timeout = Duration::from_secs(60);
        assert!(!wd.should_restart(t0 + 59_000_000, timeout));
        assert!(!wd.should_restart(t0 + 60_000_000, timeout));
        assert!(wd.should_restart(t0 + 60_000_001, timeout));

        wd.reset();
        assert!(!wd.should_restart(t0 + 120_000_000, timeout));
    }

    #[test]
    fn one_subscribe_per_known_symbol() {
        let state = MarketState::new();
        for s in ["BTC-ETH", "BTC-LTC"] {
            state.put_ticker(s, 1, Default::default());
        }
        let cmds = subscribe_commands(&state);
        assert_eq!(
            cmds,
            vec![
                r#"{"op":"subscribe","symbol":"BTC-ETH"}"#,
                r#"{"op":"subscribe","symbol":"BTC-LTC"}"#,
            ]
        );
    }

    #[test]
    fn upstream_messages_deserialize() {
        let snap: UpstreamMsg = serde_json::from_str(
            r#"{"type":"snapshot","subid":7,"symbol":"BTC-ETH",
                "bids":[[0.05,1.0]],"asks":[[0.051,2.0]]}"#,
        )
        .unwrap();
        assert_eq!(
            snap,
            UpstreamMsg::Snapshot {
                subid: 7,
                symbol: "BTC-ETH".into(),
                bids: vec![(0.05, 1.0)],
                asks: vec![(0.051, 2.0)],
            }
        );

        let update: UpstreamMsg = serde_json::from_str(
            r#"{"type":"update","subid":7,"side":"sell","price":0.051,"quantity":0.0}"#,
        )
        .unwrap();
        assert_eq!(
            update,
            UpstreamMsg::Update { subid: 7, side: Some(Side::Sell), price: 0.051, quantity: 0.0 }
        );

        // A missing side deserializes to None and is rejected downstream.
        let no_side: UpstreamMsg = serde_json::from_str(
            r#"{"type":"update","subid":7,"price":0.051,"quantity":1.0}"#,
        )
        .unwrap();
        assert!(matches!(no_side, UpstreamMsg::Update { side: None, .. }));

        let trade: UpstreamMsg = serde_json::from_str(
            r#"{"type":"trade","subid":7,"timestamp":1700000000000,
                "side":"buy","price":0.05,"quantity":10.0}"#,
        )
        .unwrap();
        assert!(matches!(trade, UpstreamMsg::Trade { side: Side::Buy, .. }));
    }
}
