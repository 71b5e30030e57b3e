//! Trading-related data structures — balances, open orders, and fills.
//!
//! These types are the contract between the exchange REST client and the
//! per-connection caches; the DTC handlers translate them onto the wire.

use serde::{Deserialize, Serialize};

use super::enums::{OpenOrderStatus, Side};

/// Scale factor between wire quantities and exchange quantities.
///
/// The DTC wire format carries quantities in multiples of 1e-4 of the
/// exchange's base unit: multiply by this on egress, divide on ingress.
pub const WIRE_QTY_SCALE: f64 = 1e4;

/// Scale factor applied to BTC cash values, which are reported in mBTC.
pub const MILLI_BTC_SCALE: f64 = 1e3;

// ---------------------------------------------------------------------------
// Balances
// ---------------------------------------------------------------------------

/// One currency's balance on the exchange account.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ExchangeBalance {
    /// Amount free for new orders.
    pub available: f64,
    /// Amount reserved by open orders.
    pub on_orders: f64,
    /// Total value expressed in BTC.
    pub btc_value: f64,
}

// ---------------------------------------------------------------------------
// Open orders
// ---------------------------------------------------------------------------

/// A cached open order, keyed by its exchange-assigned uuid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenOrder {
    pub uuid: String,
    pub symbol: String,
    pub side: Side,
    pub status: OpenOrderStatus,
    pub price: f64,
    pub quantity: f64,
    pub quantity_remaining: f64,
    /// Time the order was opened (microseconds since epoch).
    pub opened_us: u64,
}

impl OpenOrder {
    /// Quantity already executed against this order.
    pub fn filled(&self) -> f64 {
        self.quantity - self.quantity_remaining
    }
}

// ---------------------------------------------------------------------------
// Historical fills
// ---------------------------------------------------------------------------

/// A historical fill from the exchange's order history, keyed by trade uuid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeFill {
    pub uuid: String,
    /// Uuid of the order this fill executed against.
    pub order_uuid: String,
    pub symbol: String,
    pub side: Side,
    pub price: f64,
    pub quantity: f64,
    /// Execution time (microseconds since epoch).
    pub executed_us: u64,
}

/// A margin position reported by the exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginPosition {
    pub symbol: String,
    /// Net amount, positive = long.
    pub quantity: f64,
    pub base_price: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filled_quantity() {
        let o = OpenOrder {
            uuid: "u".into(),
            symbol: "BTC-ETH".into(),
            side: Side::Buy,
            status: OpenOrderStatus::PartiallyFilled,
            price: 0.05,
            quantity: 10.0,
            quantity_remaining: 4.0,
            opened_us: 0,
        };
        assert_eq!(o.filled(), 6.0);
    }

    #[test]
    fn wire_scale_round_trip() {
        let wire = 50_000.0_f64;
        let exchange = wire / WIRE_QTY_SCALE;
        assert_eq!(exchange, 5.0);
        assert_eq!(exchange * WIRE_QTY_SCALE, wire);
    }
}
