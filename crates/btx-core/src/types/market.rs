//! Market data structures — tickers, trades, and currency metadata.
//!
//! # Timestamp convention
//!
//! All timestamps are in **microseconds since Unix epoch** unless a field name
//! says otherwise. The historical tick store uses nanoseconds; conversion
//! happens at that boundary.

use serde::{Deserialize, Serialize};

use super::enums::Side;

// ---------------------------------------------------------------------------
// Ticker
// ---------------------------------------------------------------------------

/// Latest per-symbol summary fields from the exchange.
///
/// Updated only by the periodic REST refresher; WebSocket snapshots and trades
/// never touch these fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Ticker {
    pub bid: f64,
    pub ask: f64,
    pub last: f64,
    pub low24h: f64,
    pub high24h: f64,
    pub base_volume: f64,
}

// ---------------------------------------------------------------------------
// LatestTrade
// ---------------------------------------------------------------------------

/// The most recent trade print observed on the upstream WebSocket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatestTrade {
    pub timestamp_us: u64,
    pub side: Side,
    pub price: f64,
    pub quantity: f64,
}

// ---------------------------------------------------------------------------
// Currency
// ---------------------------------------------------------------------------

/// Static currency metadata, fetched once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    /// Exchange currency code (e.g. `"BTC"`).
    pub code: String,
    /// Human-readable name (e.g. `"Bitcoin"`).
    pub name: String,
    /// Transaction fee charged on withdrawal.
    pub tx_fee: f64,
    /// Whether the currency is active for trading.
    pub is_active: bool,
}

impl std::fmt::Display for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Ticker(bid={:.8} ask={:.8} last={:.8} lo={:.8} hi={:.8} vol={:.4})",
            self.bid, self.ask, self.last, self.low24h, self.high24h, self.base_volume
        )
    }
}
