//! Request dispatch and handlers for the live DTC server.
//!
//! After the encoding handshake, every inbound frame is decoded by type id
//! and routed through [`dispatch`]. Unknown type ids and malformed payloads
//! are logged and dropped; they never close the connection. Validation
//! failures come back as typed rejects with a human-readable text.

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use btx_core::time_util;
use btx_core::types::{MILLI_BTC_SCALE, OpenOrderStatus, WIRE_QTY_SCALE};
use btx_dtc::MessageType;
use btx_dtc::codec::{EncodingMsg, decode_payload, encode_encoding_frame, parse_encoding_payload};
use btx_dtc::messages::{self, LogonStatus, OrderStatusEnum, OrderUpdateReason, PriceDisplayFormat, RequestAction, SecurityType};

use crate::bittrex::{Credentials, Exchange as _};
use crate::connection::Connection;
use crate::{ACCOUNT_EXCHANGE, ACCOUNT_MARGIN, Bridge, EXCHANGE_NAME, orders, refresher};

/// Logon flag bit requesting the post-logon security definition stream.
const LOGON_FLAG_SEND_SECDEFS: i32 = 1 << 7;

/// Dispatch one decoded frame. Returns `false` when the connection should
/// close (logoff).
pub async fn dispatch(
    bridge: &Arc<Bridge>,
    conn: &Arc<Connection>,
    type_id: u16,
    payload: &[u8],
) -> bool {
    let Some(msg_type) = MessageType::from_u16(type_id) else {
        warn!("[{}] unknown message type {type_id}, dropped", conn.addr);
        return true;
    };

    macro_rules! decoded {
        ($t:ty) => {
            match decode_payload::<$t>(type_id, payload) {
                Ok(msg) => msg,
                Err(e) => {
                    warn!("[{}] dropped malformed {msg_type:?}: {e}", conn.addr);
                    return true;
                }
            }
        };
    }

    match msg_type {
        MessageType::EncodingRequest => {
            match parse_encoding_payload(payload) {
                Ok(req) => {
                    debug!(
                        "[{}] encoding request v{} enc{}",
                        conn.addr, req.protocol_version, req.encoding
                    );
                    // The server always answers protobuf at version 7.
                    conn.writer.try_send_raw(encode_encoding_frame(
                        MessageType::EncodingResponse,
                        EncodingMsg::protobuf_response(),
                    ));
                }
                Err(e) => warn!("[{}] bad encoding request: {e}", conn.addr),
            }
            true
        }
        MessageType::LogonRequest => {
            handle_logon(bridge, conn, decoded!(messages::LogonRequest)).await;
            true
        }
        MessageType::Heartbeat => {
            let hb = decoded!(messages::Heartbeat);
            debug!("[{}] heartbeat (client dropped {})", conn.addr, hb.num_dropped_messages);
            true
        }
        MessageType::Logoff => {
            let off = decoded!(messages::Logoff);
            info!("[{}] logoff: {}", conn.addr, off.reason);
            false
        }
        MessageType::SecurityDefinitionForSymbolRequest => {
            handle_security_definition(
                bridge,
                conn,
                decoded!(messages::SecurityDefinitionForSymbolRequest),
            )
            .await;
            true
        }
        MessageType::MarketDataRequest => {
            handle_market_data(bridge, conn, decoded!(messages::MarketDataRequest)).await;
            true
        }
        MessageType::MarketDepthRequest => {
            handle_market_depth(bridge, conn, decoded!(messages::MarketDepthRequest)).await;
            true
        }
        MessageType::OpenOrdersRequest => {
            handle_open_orders(conn, decoded!(messages::OpenOrdersRequest)).await;
            true
        }
        MessageType::CurrentPositionsRequest => {
            handle_positions(conn, decoded!(messages::CurrentPositionsRequest)).await;
            true
        }
        MessageType::HistoricalOrderFillsRequest => {
            handle_historical_fills(conn, decoded!(messages::HistoricalOrderFillsRequest)).await;
            true
        }
        MessageType::TradeAccountsRequest => {
            handle_trade_accounts(conn, decoded!(messages::TradeAccountsRequest)).await;
            true
        }
        MessageType::AccountBalanceRequest => {
            handle_account_balance(conn, decoded!(messages::AccountBalanceRequest)).await;
            true
        }
        MessageType::SubmitNewSingleOrder => {
            orders::handle_submit(bridge, conn, decoded!(messages::SubmitNewSingleOrder)).await;
            true
        }
        MessageType::CancelOrder => {
            orders::handle_cancel(bridge, conn, decoded!(messages::CancelOrder)).await;
            true
        }
        MessageType::CancelReplaceOrder => {
            orders::handle_cancel_replace(bridge, conn, decoded!(messages::CancelReplaceOrder))
                .await;
            true
        }
        other => {
            warn!("[{}] unexpected inbound {other:?}, dropped", conn.addr);
            true
        }
    }
}

// ---------------------------------------------------------------------------
// Logon
// ---------------------------------------------------------------------------

async fn handle_logon(bridge: &Arc<Bridge>, conn: &Arc<Connection>, req: messages::LogonRequest) {
    let creds = Credentials::new(req.username.clone(), req.password.clone());
    let send_secdefs = req.integer_1 & LOGON_FLAG_SEND_SECDEFS != 0;
    conn.set_send_secdefs(send_secdefs);
    conn.set_credentials(creds.clone());

    let (trading_supported, result_text) = if creds.is_empty() {
        (false, "Trading disabled: No credentials".to_string())
    } else if req.integer_2 != 0 {
        (false, "Trading disabled: Invalid Bittrex credentials".to_string())
    } else {
        // Validate the credentials with a margin account summary call,
        // serialized through the REST queue like everything else.
        let (tx, rx) = oneshot::channel();
        let exchange = Arc::clone(&bridge.exchange);
        let check_creds = creds.clone();
        bridge
            .rest
            .push(Box::pin(async move {
                let ok = exchange.margin_account_summary(&check_creds).await.is_ok();
                let _ = tx.send(ok);
            }))
            .await;
        match rx.await {
            Ok(true) => (true, "Trading enabled: Valid Bittrex credentials".to_string()),
            _ => (false, "Trading disabled: Invalid Bittrex credentials".to_string()),
        }
    };

    info!("[{}] logon ({result_text})", conn.addr);

    conn.writer
        .send(
            MessageType::LogonResponse,
            &messages::LogonResponse {
                protocol_version: btx_dtc::types::PROTOCOL_VERSION,
                result: LogonStatus::LogonSuccess as i32,
                result_text,
                server_name: bridge.settings.server_name.clone(),
                symbol_exchange_delimiter: "-".to_string(),
                market_depth_updates_best_bid_and_ask: true,
                trading_is_supported: trading_supported,
                security_definitions_supported: true,
                market_data_supported: true,
                market_depth_is_supported: true,
                order_cancel_replace_supported: true,
                ocoorders_supported: false,
                bracket_orders_supported: false,
                historical_price_data_supported: false,
                ..Default::default()
            },
        )
        .await;

    if req.heartbeat_interval_in_seconds > 0 {
        spawn_heartbeat(Arc::clone(conn), req.heartbeat_interval_in_seconds as u64);
    }

    if !bridge.settings.sierra_chart || send_secdefs {
        stream_security_definitions(bridge, conn).await;
    }

    // Even a read-only logon schedules the periodic account refresh; the
    // refresh functions short-circuit without credentials.
    refresher::spawn_client_refresh(Arc::clone(bridge), Arc::clone(conn));
}

/// Emit a heartbeat every `interval_s` seconds until the writer closes.
fn spawn_heartbeat(conn: Arc<Connection>, interval_s: u64) {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(std::time::Duration::from_secs(interval_s));
        tick.tick().await;
        loop {
            tokio::select! {
                _ = conn.writer.closed() => break,
                _ = tick.tick() => {
                    conn.writer.try_send(
                        MessageType::Heartbeat,
                        &messages::Heartbeat {
                            num_dropped_messages: conn.writer.dropped(),
                            current_date_time: time_util::now_s() as i64,
                        },
                    );
                }
            }
        }
        debug!("[{}] heartbeat loop stopped", conn.addr);
    });
}

/// One security definition per known ticker, final flag on the last.
async fn stream_security_definitions(bridge: &Bridge, conn: &Connection) {
    let symbols = bridge.state.symbols();
    let n = symbols.len();
    for (i, symbol) in symbols.iter().enumerate() {
        conn.writer
            .send(
                MessageType::SecurityDefinitionResponse,
                &security_definition(symbol, 0, i + 1 == n),
            )
            .await;
    }
}

/// The fixed metadata every BTREX symbol shares.
pub fn security_definition(
    symbol: &str,
    request_id: i32,
    is_final: bool,
) -> messages::SecurityDefinitionResponse {
    messages::SecurityDefinitionResponse {
        request_id,
        symbol: symbol.to_string(),
        exchange: EXCHANGE_NAME.to_string(),
        security_type: SecurityType::SecurityTypeForex as i32,
        description: String::new(),
        min_price_increment: 1e-8,
        price_display_format: PriceDisplayFormat::DisplayFormatDecimal8 as i32,
        currency_value_per_increment: 1e-8,
        is_final_message: is_final,
        updates_bid_ask_only: false,
        has_market_depth_data: true,
    }
}

async fn handle_security_definition(
    bridge: &Bridge,
    conn: &Connection,
    req: messages::SecurityDefinitionForSymbolRequest,
) {
    if req.exchange != EXCHANGE_NAME || !bridge.state.has_symbol(&req.symbol) {
        conn.writer
            .send(
                MessageType::SecurityDefinitionReject,
                &messages::SecurityDefinitionReject {
                    request_id: req.request_id,
                    reject_text: format!("Unknown symbol {}", req.symbol),
                },
            )
            .await;
        return;
    }
    conn.writer
        .send(
            MessageType::SecurityDefinitionResponse,
            &security_definition(&req.symbol, req.request_id, true),
        )
        .await;
}

// ---------------------------------------------------------------------------
// Market data / depth
// ---------------------------------------------------------------------------

/// Build a market data snapshot from the current ticker, latest trade, and
/// best bid/ask of the book.
pub fn build_snapshot(bridge: &Bridge, symbol: &str, symbol_id: u32) -> messages::MarketDataSnapshot {
    let mut snap = messages::MarketDataSnapshot { symbol_id, ..Default::default() };

    if let Some((_, ticker)) = bridge.state.ticker(symbol) {
        snap.session_high_price = ticker.high24h;
        snap.session_low_price = ticker.low24h;
        snap.session_volume = ticker.base_volume;
    }
    if let Some(trade) = bridge.state.latest_trade(symbol) {
        snap.last_trade_price = trade.price;
        snap.last_trade_volume = trade.quantity;
        snap.last_trade_date_time = time_util::us_to_float_seconds(trade.timestamp_us);
    }
    if let Some(book) = bridge.state.book(symbol) {
        if let Some((price, qty)) = book.bids.best_bid() {
            snap.bid_price = price;
            snap.bid_quantity = qty;
        }
        if let Some((price, qty)) = book.asks.best_ask() {
            snap.ask_price = price;
            snap.ask_quantity = qty;
        }
        let ts = book.last_mutation_us();
        if ts != 0 {
            snap.bid_ask_date_time = time_util::us_to_float_seconds(ts);
        }
    }
    snap
}

async fn handle_market_data(bridge: &Bridge, conn: &Connection, req: messages::MarketDataRequest) {
    let reject = |text: String| messages::MarketDataReject { symbol_id: req.symbol_id, reject_text: text };

    if req.exchange != EXCHANGE_NAME {
        conn.writer
            .send(MessageType::MarketDataReject, &reject(format!("Unknown exchange {}", req.exchange)))
            .await;
        return;
    }
    if !bridge.state.has_symbol(&req.symbol) {
        conn.writer
            .send(MessageType::MarketDataReject, &reject(format!("Unknown symbol {}", req.symbol)))
            .await;
        return;
    }

    match RequestAction::try_from(req.request_action) {
        Ok(RequestAction::Unsubscribe) => {
            conn.subs_md.lock().unwrap().unsubscribe(req.symbol_id);
        }
        Ok(RequestAction::Snapshot) => {
            let snap = build_snapshot(bridge, &req.symbol, req.symbol_id);
            conn.writer.send(MessageType::MarketDataSnapshot, &snap).await;
        }
        Ok(RequestAction::Subscribe) => {
            let result = conn.subs_md.lock().unwrap().subscribe(req.symbol_id, &req.symbol);
            match result {
                Err(existing) => {
                    conn.writer
                        .send(
                            MessageType::MarketDataReject,
                            &reject(format!(
                                "Already subscribed to {existing} with id {}",
                                req.symbol_id
                            )),
                        )
                        .await;
                }
                Ok(()) => {
                    let snap = build_snapshot(bridge, &req.symbol, req.symbol_id);
                    conn.writer.send(MessageType::MarketDataSnapshot, &snap).await;
                }
            }
        }
        _ => {
            conn.writer
                .send(MessageType::MarketDataReject, &reject("Unknown request action".into()))
                .await;
        }
    }
}

async fn handle_market_depth(bridge: &Bridge, conn: &Connection, req: messages::MarketDepthRequest) {
    let reject = |text: String| messages::MarketDepthReject { symbol_id: req.symbol_id, reject_text: text };

    if req.exchange != EXCHANGE_NAME {
        conn.writer
            .send(MessageType::MarketDepthReject, &reject(format!("Unknown exchange {}", req.exchange)))
            .await;
        return;
    }
    if !bridge.state.has_symbol(&req.symbol) {
        conn.writer
            .send(MessageType::MarketDepthReject, &reject(format!("Unknown symbol {}", req.symbol)))
            .await;
        return;
    }

    // Depth is served incrementally via the upstream update path; the
    // snapshot is a single final-of-batch sentinel with no levels.
    let sentinel = messages::MarketDepthSnapshotLevel {
        symbol_id: req.symbol_id,
        is_last_message_in_batch: true,
        ..Default::default()
    };

    match RequestAction::try_from(req.request_action) {
        Ok(RequestAction::Unsubscribe) => {
            conn.subs_depth.lock().unwrap().unsubscribe(req.symbol_id);
        }
        Ok(RequestAction::Snapshot) => {
            conn.writer.send(MessageType::MarketDepthSnapshotLevel, &sentinel).await;
        }
        Ok(RequestAction::Subscribe) => {
            let result = conn.subs_depth.lock().unwrap().subscribe(req.symbol_id, &req.symbol);
            match result {
                Err(existing) => {
                    conn.writer
                        .send(
                            MessageType::MarketDepthReject,
                            &reject(format!(
                                "Already subscribed to {existing} with id {}",
                                req.symbol_id
                            )),
                        )
                        .await;
                }
                Ok(()) => {
                    conn.writer.send(MessageType::MarketDepthSnapshotLevel, &sentinel).await;
                }
            }
        }
        _ => {
            conn.writer
                .send(MessageType::MarketDepthReject, &reject("Unknown request action".into()))
                .await;
        }
    }
}

// ---------------------------------------------------------------------------
// Orders / positions / fills
// ---------------------------------------------------------------------------

async fn handle_open_orders(conn: &Connection, req: messages::OpenOrdersRequest) {
    let client_orders: Vec<(String, messages::SubmitNewSingleOrder)> = {
        let table = conn.client_orders.lock().unwrap();
        table.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    };

    if client_orders.is_empty() {
        conn.writer
            .send(
                MessageType::OrderUpdate,
                &messages::OrderUpdate {
                    request_id: req.request_id,
                    total_num_messages: 1,
                    message_number: 1,
                    order_update_reason: OrderUpdateReason::OpenOrdersRequestResponse as i32,
                    no_orders: true,
                    ..Default::default()
                },
            )
            .await;
        return;
    }

    let total = client_orders.len() as i32;
    for (i, (uuid, submit)) in client_orders.iter().enumerate() {
        let open = conn.orders.lock().unwrap().get(uuid).cloned();
        let (status, filled, remaining) = match open {
            Some(ref o) => {
                let status = match o.status {
                    OpenOrderStatus::Open => OrderStatusEnum::OrderStatusOpen,
                    OpenOrderStatus::PartiallyFilled => OrderStatusEnum::OrderStatusPartiallyFilled,
                };
                (status, o.filled() * WIRE_QTY_SCALE, o.quantity_remaining * WIRE_QTY_SCALE)
            }
            None => (OrderStatusEnum::OrderStatusOpen, 0.0, submit.quantity),
        };
        conn.writer
            .send(
                MessageType::OrderUpdate,
                &messages::OrderUpdate {
                    request_id: req.request_id,
                    total_num_messages: total,
                    message_number: i as i32 + 1,
                    symbol: submit.symbol.clone(),
                    exchange: EXCHANGE_NAME.to_string(),
                    server_order_id: uuid.clone(),
                    client_order_id: submit.client_order_id.clone(),
                    order_status: status as i32,
                    order_update_reason: OrderUpdateReason::OpenOrdersRequestResponse as i32,
                    order_type: submit.order_type,
                    buy_sell: submit.buy_sell,
                    price1: submit.price1,
                    time_in_force: submit.time_in_force,
                    order_quantity: submit.quantity,
                    filled_quantity: filled,
                    remaining_quantity: remaining,
                    trade_account: submit.trade_account.clone(),
                    ..Default::default()
                },
            )
            .await;
    }
}

async fn handle_positions(conn: &Connection, req: messages::CurrentPositionsRequest) {
    let positions: Vec<btx_core::types::MarginPosition> =
        conn.positions.lock().unwrap().values().cloned().collect();

    if positions.is_empty() {
        conn.writer
            .send(
                MessageType::PositionUpdate,
                &messages::PositionUpdate {
                    request_id: req.request_id,
                    total_number_messages: 1,
                    message_number: 1,
                    trade_account: ACCOUNT_MARGIN.to_string(),
                    no_positions: true,
                    ..Default::default()
                },
            )
            .await;
        return;
    }

    let total = positions.len() as i32;
    for (i, pos) in positions.iter().enumerate() {
        conn.writer
            .send(
                MessageType::PositionUpdate,
                &messages::PositionUpdate {
                    request_id: req.request_id,
                    total_number_messages: total,
                    message_number: i as i32 + 1,
                    symbol: pos.symbol.clone(),
                    exchange: EXCHANGE_NAME.to_string(),
                    quantity: pos.quantity * WIRE_QTY_SCALE,
                    average_price: pos.base_price,
                    position_identifier: pos.symbol.clone(),
                    trade_account: ACCOUNT_MARGIN.to_string(),
                    ..Default::default()
                },
            )
            .await;
    }
}

async fn handle_historical_fills(conn: &Connection, req: messages::HistoricalOrderFillsRequest) {
    let fills: Vec<btx_core::types::TradeFill> = {
        let table = conn.trades.lock().unwrap();
        table
            .values()
            .filter(|f| req.server_order_id.is_empty() || f.order_uuid == req.server_order_id)
            .cloned()
            .collect()
    };

    if fills.is_empty() {
        conn.writer
            .send(
                MessageType::HistoricalOrderFillResponse,
                &messages::HistoricalOrderFillResponse {
                    request_id: req.request_id,
                    total_number_messages: 1,
                    message_number: 1,
                    no_order_fills: true,
                    ..Default::default()
                },
            )
            .await;
        return;
    }

    let total = fills.len() as i32;
    for (i, fill) in fills.iter().enumerate() {
        conn.writer
            .send(
                MessageType::HistoricalOrderFillResponse,
                &messages::HistoricalOrderFillResponse {
                    request_id: req.request_id,
                    total_number_messages: total,
                    message_number: i as i32 + 1,
                    symbol: fill.symbol.clone(),
                    exchange: EXCHANGE_NAME.to_string(),
                    server_order_id: fill.order_uuid.clone(),
                    buy_sell: orders::wire_side(fill.side),
                    price: fill.price,
                    quantity: fill.quantity * WIRE_QTY_SCALE,
                    date_time: (fill.executed_us / 1_000_000) as i64,
                    unique_execution_id: fill.uuid.clone(),
                    trade_account: ACCOUNT_EXCHANGE.to_string(),
                    ..Default::default()
                },
            )
            .await;
    }
}

// ---------------------------------------------------------------------------
// Accounts / balances
// ---------------------------------------------------------------------------

async fn handle_trade_accounts(conn: &Connection, req: messages::TradeAccountsRequest) {
    for (i, account) in [ACCOUNT_EXCHANGE, ACCOUNT_MARGIN].iter().enumerate() {
        conn.writer
            .send(
                MessageType::TradeAccountResponse,
                &messages::TradeAccountResponse {
                    total_number_messages: 2,
                    message_number: i as i32 + 1,
                    trade_account: account.to_string(),
                    request_id: req.request_id,
                },
            )
            .await;
    }
}

/// Exchange account balance: total BTC value of all holdings, in mBTC.
fn exchange_balance_update(
    conn: &Connection,
    request_id: i32,
    message_number: i32,
    total: i32,
) -> messages::AccountBalanceUpdate {
    let table = conn.balances.lock().unwrap();
    let cash: f64 = table.values().map(|b| b.btc_value).sum::<f64>() * MILLI_BTC_SCALE;
    messages::AccountBalanceUpdate {
        request_id,
        cash_balance: cash,
        balance_available_for_new_positions: cash,
        account_currency: "mBTC".to_string(),
        trade_account: ACCOUNT_EXCHANGE.to_string(),
        total_number_messages: total,
        message_number,
        no_account_balances: table.is_empty(),
        ..Default::default()
    }
}

/// Margin account balance: the BTC margin balance, in mBTC.
fn margin_balance_update(
    conn: &Connection,
    request_id: i32,
    message_number: i32,
    total: i32,
) -> messages::AccountBalanceUpdate {
    let table = conn.margin_balances.lock().unwrap();
    let cash = table.get("BTC").copied().unwrap_or(0.0) * MILLI_BTC_SCALE;
    messages::AccountBalanceUpdate {
        request_id,
        cash_balance: cash,
        balance_available_for_new_positions: cash,
        account_currency: "mBTC".to_string(),
        trade_account: ACCOUNT_MARGIN.to_string(),
        total_number_messages: total,
        message_number,
        no_account_balances: table.is_empty(),
        ..Default::default()
    }
}

async fn handle_account_balance(conn: &Connection, req: messages::AccountBalanceRequest) {
    match req.trade_account.as_str() {
        "" => {
            let first = exchange_balance_update(conn, req.request_id, 1, 2);
            let second = margin_balance_update(conn, req.request_id, 2, 2);
            conn.writer.send(MessageType::AccountBalanceUpdate, &first).await;
            conn.writer.send(MessageType::AccountBalanceUpdate, &second).await;
        }
        ACCOUNT_EXCHANGE => {
            let update = exchange_balance_update(conn, req.request_id, 1, 1);
            conn.writer.send(MessageType::AccountBalanceUpdate, &update).await;
        }
        ACCOUNT_MARGIN => {
            let update = margin_balance_update(conn, req.request_id, 1, 1);
            conn.writer.send(MessageType::AccountBalanceUpdate, &update).await;
        }
        other => {
            conn.writer
                .send(
                    MessageType::AccountBalanceReject,
                    &messages::AccountBalanceReject {
                        request_id: req.request_id,
                        reject_text: format!("Unknown account {other}"),
                    },
                )
                .await;
        }
    }
}
