//! Serde records for the Bittrex REST API.
//!
//! Every endpoint wraps its result in the `{success, message, result}`
//! envelope; field names are PascalCase on the wire. Timestamps arrive as
//! naive UTC strings (`"2017-02-12T02:05:45.27"`).

use anyhow::{Context, anyhow};
use chrono::NaiveDateTime;
use serde::Deserialize;

use btx_core::types::Side;

/// The `{success, message, result}` wrapper on every response.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub result: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CurrencyRecord {
    pub currency: String,
    pub currency_long: String,
    pub tx_fee: f64,
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MarketSummaryRecord {
    pub market_name: String,
    pub bid: f64,
    pub ask: f64,
    pub last: f64,
    pub high: f64,
    pub low: f64,
    pub base_volume: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MarketRecord {
    pub market_name: String,
    pub is_active: bool,
    #[serde(default)]
    pub margin_enabled: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MarketHistoryRecord {
    pub id: u64,
    pub time_stamp: String,
    pub price: f64,
    pub quantity: f64,
    /// `"BUY"` or `"SELL"`.
    pub order_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BalanceRecord {
    pub currency: String,
    pub balance: f64,
    pub available: f64,
    #[serde(default)]
    pub btc_value: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MarginBalanceRecord {
    pub currency: String,
    pub margin_balance: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MarginSummaryRecord {
    #[serde(default)]
    pub net_asset_value: f64,
    #[serde(default)]
    pub required_margin: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OpenOrderRecord {
    pub order_uuid: String,
    /// Market symbol, e.g. `"BTC-ETH"`.
    pub exchange: String,
    /// `"LIMIT_BUY"` / `"LIMIT_SELL"`.
    pub order_type: String,
    pub limit: f64,
    pub quantity: f64,
    pub quantity_remaining: f64,
    pub opened: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrderHistoryRecord {
    pub order_uuid: String,
    pub exchange: String,
    pub order_type: String,
    pub time_stamp: String,
    pub quantity: f64,
    pub quantity_remaining: f64,
    /// Average execution price per unit.
    #[serde(default)]
    pub price_per_unit: Option<f64>,
    pub limit: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MarginPositionRecord {
    pub market_name: String,
    pub quantity: f64,
    pub base_price: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubmitRecord {
    pub order_id: String,
    #[serde(default)]
    pub trades: Vec<SubmitFillRecord>,
    #[serde(default)]
    pub quantity_remaining: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubmitFillRecord {
    pub price: f64,
    pub quantity: f64,
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

/// Parse a Bittrex naive-UTC timestamp into microseconds since epoch.
pub fn parse_timestamp_us(ts: &str) -> anyhow::Result<u64> {
    let parsed = NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f")
        .with_context(|| format!("bad timestamp {ts:?}"))?;
    Ok(parsed.and_utc().timestamp_micros() as u64)
}

/// Map an order-type string (`"BUY"`, `"LIMIT_SELL"`, …) to a [`Side`].
pub fn parse_side(order_type: &str) -> anyhow::Result<Side> {
    if order_type.ends_with("BUY") {
        Ok(Side::Buy)
    } else if order_type.ends_with("SELL") {
        Ok(Side::Sell)
    } else {
        Err(anyhow!("unknown order type {order_type:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_with_failure_message() {
        let raw = r#"{"success":false,"message":"INSUFFICIENT_FUNDS","result":null}"#;
        let env: Envelope<Vec<BalanceRecord>> = serde_json::from_str(raw).unwrap();
        assert!(!env.success);
        assert_eq!(env.message.as_deref(), Some("INSUFFICIENT_FUNDS"));
        assert!(env.result.is_none());
    }

    #[test]
    fn market_summary_pascal_case() {
        let raw = r#"{"MarketName":"BTC-ETH","Bid":0.05,"Ask":0.051,"Last":0.0505,
                      "High":0.052,"Low":0.049,"BaseVolume":1234.5}"#;
        let rec: MarketSummaryRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(rec.market_name, "BTC-ETH");
        assert_eq!(rec.base_volume, 1234.5);
    }

    #[test]
    fn timestamps_parse_with_and_without_fraction() {
        assert!(parse_timestamp_us("2017-02-12T02:05:45.27").unwrap() > 0);
        assert!(parse_timestamp_us("2017-02-12T02:05:45").unwrap() > 0);
        assert!(parse_timestamp_us("garbage").is_err());
    }

    #[test]
    fn sides_from_order_type_strings() {
        assert_eq!(parse_side("BUY").unwrap(), Side::Buy);
        assert_eq!(parse_side("LIMIT_SELL").unwrap(), Side::Sell);
        assert!(parse_side("HOLD").is_err());
    }
}
