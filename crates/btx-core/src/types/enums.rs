//! Enumerations used throughout the bridge.
//!
//! These are the *internal* enums flowing between the upstream clients and the
//! market state tables. The DTC wire protocol has its own numeric enums in the
//! protocol crate; translation happens at the handler boundary.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Trade / book side
// ---------------------------------------------------------------------------

/// Buy or sell side of a trade or book level.
///
/// Upstream messages that omit the side fail to parse; a book mutation with
/// an unset side is rejected before it reaches the tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

// ---------------------------------------------------------------------------
// Time-in-force
// ---------------------------------------------------------------------------

/// Time-in-force accepted by the order path.
///
/// `Day` is accepted from clients and silently mapped to `Gtc` before the
/// order reaches the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tif {
    Gtc,
    Ioc,
    Fok,
}

impl Tif {
    /// The exchange query parameter for this TIF, if the exchange needs one.
    ///
    /// GTC is the exchange default and is sent as `None`.
    pub fn as_exchange_param(&self) -> Option<&'static str> {
        match self {
            Self::Gtc => None,
            Self::Ioc => Some("IMMEDIATE_OR_CANCEL"),
            Self::Fok => Some("FILL_OR_KILL"),
        }
    }
}

// ---------------------------------------------------------------------------
// Open-order status
// ---------------------------------------------------------------------------

/// Status of a cached open order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpenOrderStatus {
    Open,
    PartiallyFilled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Side::Buy).unwrap(), "\"buy\"");
        let s: Side = serde_json::from_str("\"sell\"").unwrap();
        assert_eq!(s, Side::Sell);
    }

    #[test]
    fn tif_exchange_params() {
        assert_eq!(Tif::Gtc.as_exchange_param(), None);
        assert_eq!(Tif::Fok.as_exchange_param(), Some("FILL_OR_KILL"));
        assert_eq!(Tif::Ioc.as_exchange_param(), Some("IMMEDIATE_OR_CANCEL"));
    }
}
