//! Periodic refreshers: the 60 s ticker poll and the per-client account
//! refresh.
//!
//! Both enqueue their REST work onto the shared queue rather than calling the
//! exchange directly, so refreshes interleave with client-triggered calls in
//! a single ordered stream.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, warn};

use btx_core::time_util;
use btx_core::types::Ticker;
use btx_dtc::MessageType;
use btx_dtc::messages;

use crate::Bridge;
use crate::bittrex::Exchange as _;
use crate::connection::Connection;
use crate::handlers::security_definition;

/// Period of the ticker refresher.
pub const TICKER_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Ticker refresher (process-wide)
// ---------------------------------------------------------------------------

/// Enqueue one `update_tickers` call per minute until shutdown.
pub async fn run_ticker_refresher(bridge: Arc<Bridge>, mut shutdown: watch::Receiver<bool>) {
    let mut tick = tokio::time::interval(TICKER_REFRESH_INTERVAL);
    tick.tick().await;
    loop {
        tokio::select! {
            _ = shutdown.changed() => return,
            _ = tick.tick() => {
                let job_bridge = Arc::clone(&bridge);
                bridge
                    .rest
                    .push(Box::pin(async move { update_tickers(&job_bridge).await }))
                    .await;
            }
        }
    }
}

/// Fetch all tickers, store them, and fan out per-field updates.
pub async fn update_tickers(bridge: &Bridge) {
    let tickers = match bridge.exchange.get_tickers().await {
        Ok(t) => t,
        Err(e) => {
            error!("[refresher] ticker fetch failed: {e}");
            return;
        }
    };

    let now_us = time_util::now_us();
    for (symbol, ticker) in tickers {
        let prev = bridge.state.put_ticker(&symbol, now_us, ticker);
        emit_ticker_updates(bridge, &symbol, prev.map(|(_, t)| t), ticker);
    }
}

/// Send the per-field market data updates one changed ticker produces.
///
/// A first sighting installs the ticker without deltas; clients that asked
/// for security definitions get one for the new symbol first.
fn emit_ticker_updates(bridge: &Bridge, symbol: &str, prev: Option<Ticker>, new: Ticker) {
    let first_sighting = prev.is_none();
    let prev = prev.unwrap_or(new);

    for conn in bridge.registry.all() {
        if first_sighting && conn.send_secdefs() {
            conn.writer.try_send(
                MessageType::SecurityDefinitionResponse,
                &security_definition(symbol, 0, true),
            );
        }

        let Some(symbol_id) = conn.md_id_for(symbol) else {
            continue;
        };
        if new.base_volume != prev.base_volume {
            conn.writer.try_send(
                MessageType::MarketDataUpdateSessionVolume,
                &messages::MarketDataUpdateSessionVolume { symbol_id, volume: new.base_volume },
            );
        }
        if new.low24h != prev.low24h {
            conn.writer.try_send(
                MessageType::MarketDataUpdateSessionLow,
                &messages::MarketDataUpdateSessionLow { symbol_id, price: new.low24h },
            );
        }
        if new.high24h != prev.high24h {
            conn.writer.try_send(
                MessageType::MarketDataUpdateSessionHigh,
                &messages::MarketDataUpdateSessionHigh { symbol_id, price: new.high24h },
            );
        }
        // Depth subscribers already see best bid/ask through depth updates.
        if (new.bid != prev.bid || new.ask != prev.ask) && conn.depth_id_for(symbol).is_none() {
            conn.writer.try_send(
                MessageType::MarketDataUpdateBidAsk,
                &messages::MarketDataUpdateBidAsk {
                    symbol_id,
                    bid_price: new.bid,
                    bid_quantity: 0.0,
                    ask_price: new.ask,
                    ask_quantity: 0.0,
                    date_time: time_util::now_s() as u32,
                },
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Per-client account refresh
// ---------------------------------------------------------------------------

/// Start the periodic account refresh for one connection. The loop stops
/// itself when the connection's writer closes.
pub fn spawn_client_refresh(bridge: Arc<Bridge>, conn: Arc<Connection>) {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(bridge.settings.update_client_span);
        tick.tick().await;
        loop {
            tokio::select! {
                _ = conn.writer.closed() => break,
                _ = tick.tick() => {
                    enqueue_refresh(&bridge, &conn);
                }
            }
        }
        debug!("[{}] account refresh stopped", conn.addr);
    });
}

/// Enqueue one round of orders/trades/balances refresh thunks.
pub fn enqueue_refresh(bridge: &Arc<Bridge>, conn: &Arc<Connection>) {
    let (b, c) = (Arc::clone(bridge), Arc::clone(conn));
    bridge.rest.push_nowait(Box::pin(async move { update_orders(&b, &c).await }));
    let (b, c) = (Arc::clone(bridge), Arc::clone(conn));
    bridge.rest.push_nowait(Box::pin(async move { update_trades(&b, &c).await }));
    let (b, c) = (Arc::clone(bridge), Arc::clone(conn));
    bridge.rest.push_nowait(Box::pin(async move { update_balances(&b, &c).await }));
}

/// Replace the connection's open order cache from the exchange.
pub async fn update_orders(bridge: &Bridge, conn: &Connection) {
    let creds = conn.credentials();
    if creds.is_empty() {
        return;
    }
    match bridge.exchange.get_open_orders(&creds).await {
        Ok(list) => {
            let table: HashMap<_, _> = list.into_iter().map(|o| (o.uuid.clone(), o)).collect();
            *conn.orders.lock().unwrap() = table;
        }
        Err(e) => warn!("[{}] open order refresh failed: {e}", conn.addr),
    }
}

/// Replace the connection's fill cache from the exchange's order history.
pub async fn update_trades(bridge: &Bridge, conn: &Connection) {
    let creds = conn.credentials();
    if creds.is_empty() {
        return;
    }
    match bridge.exchange.get_order_history(&creds).await {
        Ok(list) => {
            {
                let table = conn.trades.lock().unwrap();
                for fill in &list {
                    if !table.contains_key(&fill.uuid) {
                        // TODO: emit an order_update (reason=order_filled or
                        // order_filled_partially) to the client when a new
                        // fill for a tracked order first appears here.
                        debug!("[{}] new fill {} on {}", conn.addr, fill.uuid, fill.symbol);
                    }
                }
            }
            let table: HashMap<_, _> = list.into_iter().map(|f| (f.uuid.clone(), f)).collect();
            *conn.trades.lock().unwrap() = table;
        }
        Err(e) => warn!("[{}] trade refresh failed: {e}", conn.addr),
    }
}

/// Replace both balance caches from the exchange.
pub async fn update_balances(bridge: &Bridge, conn: &Connection) {
    let creds = conn.credentials();
    if creds.is_empty() {
        return;
    }
    match bridge.exchange.get_balances(&creds).await {
        Ok(list) => {
            *conn.balances.lock().unwrap() = list.into_iter().collect();
        }
        Err(e) => warn!("[{}] balance refresh failed: {e}", conn.addr),
    }
    match bridge.exchange.get_margin_balances(&creds).await {
        Ok(list) => {
            *conn.margin_balances.lock().unwrap() = list.into_iter().collect();
        }
        Err(e) => warn!("[{}] margin balance refresh failed: {e}", conn.addr),
    }
}

/// Replace the connection's margin position cache from the exchange.
pub async fn update_positions(bridge: &Bridge, conn: &Connection) {
    let creds = conn.credentials();
    if creds.is_empty() {
        return;
    }
    match bridge.exchange.get_positions(&creds).await {
        Ok(list) => {
            let table: HashMap<_, _> = list.into_iter().map(|p| (p.symbol.clone(), p)).collect();
            *conn.positions.lock().unwrap() = table;
        }
        Err(e) => warn!("[{}] position refresh failed: {e}", conn.addr),
    }
}
