//! Order lifecycle: submit, cancel, and cancel/replace.
//!
//! Validation happens inline in the handler; the REST call and the resulting
//! order updates run inside a RestSync thunk so that every exchange call in
//! the process executes in enqueue order. Every failure surfaces as an
//! `order_update` with `order_status = rejected` and a populated `info_text`.

use std::sync::Arc;

use tracing::{error, info, warn};

use btx_core::time_util;
use btx_core::types::{OpenOrder, OpenOrderStatus, Side, Tif, WIRE_QTY_SCALE};
use btx_dtc::MessageType;
use btx_dtc::messages::{
    self, BuySellEnum, OrderStatusEnum, OrderTypeEnum, OrderUpdateReason, TimeInForceEnum,
};

use crate::bittrex::{ApiError, Exchange as _, OrderRequest, SubmitResult};
use crate::connection::Connection;
use crate::{Bridge, EXCHANGE_NAME};

/// Map an internal side to the wire enum value.
pub fn wire_side(side: Side) -> i32 {
    match side {
        Side::Buy => BuySellEnum::Buy as i32,
        Side::Sell => BuySellEnum::Sell as i32,
    }
}

/// Base order update carrying the fields every lifecycle emission shares.
fn update_from_submit(req: &messages::SubmitNewSingleOrder, server_order_id: &str) -> messages::OrderUpdate {
    messages::OrderUpdate {
        total_num_messages: 1,
        message_number: 1,
        symbol: req.symbol.clone(),
        exchange: EXCHANGE_NAME.to_string(),
        server_order_id: server_order_id.to_string(),
        client_order_id: req.client_order_id.clone(),
        order_type: req.order_type,
        buy_sell: req.buy_sell,
        price1: req.price1,
        time_in_force: req.time_in_force,
        order_quantity: req.quantity,
        trade_account: req.trade_account.clone(),
        ..Default::default()
    }
}

/// Emit a submit rejection and log it.
fn reject_submit(conn: &Connection, req: &messages::SubmitNewSingleOrder, text: String) {
    warn!("[{}] order rejected: {text}", conn.addr);
    let mut update = update_from_submit(req, "");
    update.order_status = OrderStatusEnum::OrderStatusRejected as i32;
    update.order_update_reason = OrderUpdateReason::NewOrderRejected as i32;
    update.info_text = text;
    conn.writer.try_send(MessageType::OrderUpdate, &update);
}

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

/// Validated submit parameters, in exchange units.
struct ValidatedSubmit {
    side: Side,
    price: f64,
    tif: Tif,
}

/// Run the validation ladder. Each failure short-circuits with reject text.
fn validate_submit(
    bridge: &Bridge,
    req: &mut messages::SubmitNewSingleOrder,
) -> Result<ValidatedSubmit, String> {
    // 1. Symbol present, known, exchange matches.
    if req.symbol.is_empty() || !bridge.state.has_symbol(&req.symbol) {
        return Err(format!("Unknown symbol {}", req.symbol));
    }
    if req.exchange != EXCHANGE_NAME {
        return Err(format!("Unknown exchange {}", req.exchange));
    }
    let side = match BuySellEnum::try_from(req.buy_sell) {
        Ok(BuySellEnum::Buy) => Side::Buy,
        Ok(BuySellEnum::Sell) => Side::Sell,
        _ => return Err("Buy/sell side unset".into()),
    };

    // 2. Time-in-force. Day silently maps to GTC.
    let tif = match TimeInForceEnum::try_from(req.time_in_force) {
        Ok(TimeInForceEnum::TifDay) | Ok(TimeInForceEnum::TifGoodTillCanceled) => Tif::Gtc,
        Ok(TimeInForceEnum::TifImmediateOrCancel) => Tif::Ioc,
        Ok(TimeInForceEnum::TifFillOrKill) => Tif::Fok,
        Ok(TimeInForceEnum::TifUnset) => return Err("Time in force unset".into()),
        _ => return Err("Unsupported time in force".into()),
    };

    // 3. Order type. Market becomes a marketable FOK limit at 2x the
    //    24-hour high; limit requires a price.
    let (price, tif) = match OrderTypeEnum::try_from(req.order_type) {
        Ok(OrderTypeEnum::OrderTypeMarket) => {
            let Some((_, ticker)) = bridge.state.ticker(&req.symbol) else {
                return Err(format!("Unknown symbol {}", req.symbol));
            };
            let price = 2.0 * ticker.high24h;
            req.price1 = price;
            (price, Tif::Fok)
        }
        Ok(OrderTypeEnum::OrderTypeLimit) => {
            if req.price1 <= 0.0 {
                return Err("Limit order without a price".into());
            }
            (req.price1, tif)
        }
        _ => return Err("Unsupported order type".into()),
    };

    Ok(ValidatedSubmit { side, price, tif })
}

pub async fn handle_submit(
    bridge: &Arc<Bridge>,
    conn: &Arc<Connection>,
    mut req: messages::SubmitNewSingleOrder,
) {
    let validated = match validate_submit(bridge, &mut req) {
        Ok(v) => v,
        Err(text) => {
            reject_submit(conn, &req, text);
            return;
        }
    };

    let order_req = OrderRequest {
        symbol: req.symbol.clone(),
        side: validated.side,
        price: validated.price,
        quantity: req.quantity / WIRE_QTY_SCALE,
        tif: validated.tif,
    };
    let margin = bridge.is_margin_symbol(&req.symbol);

    let bridge = Arc::clone(bridge);
    let conn = Arc::clone(conn);
    let thunk_bridge = Arc::clone(&bridge);
    bridge
        .rest
        .push(Box::pin(async move {
            let creds = conn.credentials();
            let result = if margin {
                thunk_bridge.exchange.submit_margin_order(&creds, &order_req).await
            } else {
                thunk_bridge.exchange.submit_order(&creds, &order_req).await
            };
            match result {
                Err(ApiError::Api(msg)) => reject_submit(&conn, &req, msg),
                Err(ApiError::Transport(e)) => reject_submit(&conn, &req, e.to_string()),
                Ok(res) => {
                    complete_submit(&thunk_bridge, &conn, &req, &order_req, res, margin);
                }
            }
        }))
        .await;
}

/// Record the accepted order and emit the resulting update.
fn complete_submit(
    bridge: &Arc<Bridge>,
    conn: &Arc<Connection>,
    req: &messages::SubmitNewSingleOrder,
    order_req: &OrderRequest,
    res: SubmitResult,
    margin: bool,
) {
    info!(
        "[{}] order accepted: {} {} {} qty={} -> {}",
        conn.addr, req.symbol, order_req.side, order_req.price, order_req.quantity, res.uuid
    );

    let fully_filled = res.amount_unfilled == 0.0 && !res.trades.is_empty();
    let status = if res.trades.is_empty() {
        OpenOrderStatus::Open
    } else {
        OpenOrderStatus::PartiallyFilled
    };
    conn.client_orders.lock().unwrap().insert(res.uuid.clone(), req.clone());
    conn.orders.lock().unwrap().insert(
        res.uuid.clone(),
        OpenOrder {
            uuid: res.uuid.clone(),
            symbol: req.symbol.clone(),
            side: order_req.side,
            status,
            price: order_req.price,
            quantity: order_req.quantity,
            quantity_remaining: res.amount_unfilled,
            opened_us: time_util::now_us(),
        },
    );

    let mut update = update_from_submit(req, &res.uuid);
    if res.trades.is_empty() {
        update.order_status = OrderStatusEnum::OrderStatusOpen as i32;
        update.order_update_reason = OrderUpdateReason::NewOrderAccepted as i32;
        update.filled_quantity = 0.0;
        update.remaining_quantity = req.quantity;
    } else if fully_filled {
        update.order_status = OrderStatusEnum::OrderStatusFilled as i32;
        update.order_update_reason = OrderUpdateReason::OrderFilled as i32;
        update.filled_quantity = req.quantity;
        update.remaining_quantity = 0.0;
    } else {
        let filled: f64 = res.trades.iter().map(|t| t.quantity).sum();
        update.order_status = OrderStatusEnum::OrderStatusPartiallyFilled as i32;
        update.order_update_reason = OrderUpdateReason::OrderFilledPartially as i32;
        update.filled_quantity = filled * WIRE_QTY_SCALE;
        update.remaining_quantity = (order_req.quantity - filled) * WIRE_QTY_SCALE;
    }
    conn.writer.try_send(MessageType::OrderUpdate, &update);

    if margin && !res.trades.is_empty() {
        let (b, c) = (Arc::clone(bridge), Arc::clone(conn));
        bridge.rest.push_nowait(Box::pin(async move {
            crate::refresher::update_positions(&b, &c).await;
        }));
    }
}

// ---------------------------------------------------------------------------
// Cancel
// ---------------------------------------------------------------------------

/// Emit a cancel rejection.
fn reject_cancel(conn: &Connection, server_order_id: &str, client_order_id: &str, text: String) {
    warn!("[{}] cancel rejected: {text}", conn.addr);
    conn.writer.try_send(
        MessageType::OrderUpdate,
        &messages::OrderUpdate {
            total_num_messages: 1,
            message_number: 1,
            exchange: EXCHANGE_NAME.to_string(),
            server_order_id: server_order_id.to_string(),
            client_order_id: client_order_id.to_string(),
            order_status: OrderStatusEnum::OrderStatusRejected as i32,
            order_update_reason: OrderUpdateReason::OrderCancelRejected as i32,
            info_text: text,
            ..Default::default()
        },
    );
}

pub async fn handle_cancel(bridge: &Arc<Bridge>, conn: &Arc<Connection>, req: messages::CancelOrder) {
    if req.server_order_id.is_empty() {
        reject_cancel(conn, "", &req.client_order_id, "No server order id".into());
        return;
    }

    let bridge = Arc::clone(bridge);
    let conn = Arc::clone(conn);
    let rest = Arc::clone(&bridge.rest);
    rest.push(Box::pin(async move {
        let creds = conn.credentials();
        match bridge.exchange.cancel_order(&creds, &req.server_order_id).await {
            Err(ApiError::Api(msg)) => {
                reject_cancel(&conn, &req.server_order_id, &req.client_order_id, msg);
            }
            Err(ApiError::Transport(e)) => {
                reject_cancel(&conn, &req.server_order_id, &req.client_order_id, e.to_string());
            }
            Ok(()) => {
                let client_order =
                    conn.client_orders.lock().unwrap().get(&req.server_order_id).cloned();
                let open_order = conn.orders.lock().unwrap().remove(&req.server_order_id);

                // client_orders is kept for audit; only the open order table
                // forgets the order.
                let mut update = match (client_order, open_order) {
                    (Some(submit), _) => update_from_submit(&submit, &req.server_order_id),
                    (None, Some(open)) => {
                        let mut u = messages::OrderUpdate {
                            total_num_messages: 1,
                            message_number: 1,
                            symbol: open.symbol.clone(),
                            exchange: EXCHANGE_NAME.to_string(),
                            server_order_id: req.server_order_id.clone(),
                            client_order_id: req.client_order_id.clone(),
                            price1: open.price,
                            order_quantity: open.quantity * WIRE_QTY_SCALE,
                            ..Default::default()
                        };
                        u.buy_sell = wire_side(open.side);
                        u
                    }
                    (None, None) => {
                        error!(
                            "[{}] cancelled order {} unknown to both tables",
                            conn.addr, req.server_order_id
                        );
                        update_from_submit(&messages::SubmitNewSingleOrder::default(), &req.server_order_id)
                    }
                };
                update.order_status = OrderStatusEnum::OrderStatusCanceled as i32;
                update.order_update_reason = OrderUpdateReason::OrderCanceled as i32;
                conn.writer.try_send(MessageType::OrderUpdate, &update);
                info!("[{}] order {} cancelled", conn.addr, req.server_order_id);
            }
        }
    }))
    .await;
}

// ---------------------------------------------------------------------------
// Cancel/replace
// ---------------------------------------------------------------------------

fn reject_replace(conn: &Connection, req: &messages::CancelReplaceOrder, text: String) {
    warn!("[{}] cancel/replace rejected: {text}", conn.addr);
    conn.writer.try_send(
        MessageType::OrderUpdate,
        &messages::OrderUpdate {
            total_num_messages: 1,
            message_number: 1,
            exchange: EXCHANGE_NAME.to_string(),
            server_order_id: req.server_order_id.clone(),
            client_order_id: req.client_order_id.clone(),
            order_status: OrderStatusEnum::OrderStatusRejected as i32,
            order_update_reason: OrderUpdateReason::OrderCancelReplaceRejected as i32,
            info_text: text,
            ..Default::default()
        },
    );
}

pub async fn handle_cancel_replace(
    bridge: &Arc<Bridge>,
    conn: &Arc<Connection>,
    req: messages::CancelReplaceOrder,
) {
    // The upstream supports neither order-type nor TIF modification.
    if req.order_type != OrderTypeEnum::OrderTypeUnset as i32 {
        reject_replace(conn, &req, "Order type change not supported".into());
        return;
    }
    if req.time_in_force != TimeInForceEnum::TifUnset as i32 {
        reject_replace(conn, &req, "Time in force change not supported".into());
        return;
    }
    if req.server_order_id.is_empty() {
        reject_replace(conn, &req, "No server order id".into());
        return;
    }
    if !req.price1_is_set || req.price1 <= 0.0 {
        reject_replace(conn, &req, "No price".into());
        return;
    }

    let bridge = Arc::clone(bridge);
    let conn = Arc::clone(conn);
    let rest = Arc::clone(&bridge.rest);
    rest.push(Box::pin(async move {
        let creds = conn.credentials();
        let new_quantity = (req.quantity > 0.0).then(|| req.quantity / WIRE_QTY_SCALE);
        let orig_id = req.server_order_id.clone();
        match bridge
            .exchange
            .modify_order(&creds, &orig_id, new_quantity, req.price1)
            .await
        {
            Err(ApiError::Api(msg)) => reject_replace(&conn, &req, msg),
            Err(ApiError::Transport(e)) => reject_replace(&conn, &req, e.to_string()),
            Ok(res) => {
                // Rewire both tables from the old id to the new one.
                let mut base = {
                    let mut table = conn.client_orders.lock().unwrap();
                    match table.remove(&orig_id) {
                        Some(mut submit) => {
                            submit.price1 = req.price1;
                            if req.quantity > 0.0 {
                                submit.quantity = req.quantity;
                            }
                            let update = update_from_submit(&submit, &res.uuid);
                            table.insert(res.uuid.clone(), submit);
                            update
                        }
                        None => {
                            warn!(
                                "[{}] replaced order {orig_id} missing from client orders",
                                conn.addr
                            );
                            update_from_submit(&messages::SubmitNewSingleOrder::default(), &res.uuid)
                        }
                    }
                };
                {
                    let mut table = conn.orders.lock().unwrap();
                    match table.remove(&orig_id) {
                        Some(mut open) => {
                            open.uuid = res.uuid.clone();
                            open.price = req.price1;
                            open.quantity_remaining = res.amount_unfilled;
                            table.insert(res.uuid.clone(), open);
                        }
                        None => {
                            warn!(
                                "[{}] replaced order {orig_id} missing from open orders",
                                conn.addr
                            );
                        }
                    }
                }
                base.previous_server_order_id = orig_id.clone();
                base.order_status = OrderStatusEnum::OrderStatusOpen as i32;
                base.order_update_reason = OrderUpdateReason::OrderCancelReplaceComplete as i32;
                base.remaining_quantity = res.amount_unfilled * WIRE_QTY_SCALE;
                conn.writer.try_send(MessageType::OrderUpdate, &base);
                info!("[{}] order {orig_id} replaced by {}", conn.addr, res.uuid);
            }
        }
    }))
    .await;
}
