//! Bittrex exchange access.
//!
//! The [`Exchange`] trait is the REST contract the bridge core consumes;
//! everything that talks to the exchange goes through it, so tests substitute
//! an in-memory implementation. [`rest::BittrexClient`] is the production
//! implementation; [`ws`] maintains the real-time stream.
//!
//! All methods take `&self` and are safe to call from multiple tasks; in
//! practice the RestSync queue serializes them anyway.

pub mod rest;
pub mod types;
pub mod ws;

use async_trait::async_trait;
use thiserror::Error;

use btx_core::types::{
    Currency, ExchangeBalance, MarginPosition, OpenOrder, Side, Ticker, Tif, TradeFill,
};

/// API key/secret pair. Both empty = read-only session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub key: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self { key: key.into(), secret: secret.into() }
    }

    pub fn is_empty(&self) -> bool {
        self.key.is_empty() && self.secret.is_empty()
    }
}

/// Why an exchange call failed.
///
/// `Api` carries the exchange's own failure message and is surfaced to
/// clients verbatim; `Transport` is everything else (connect, timeout,
/// malformed body) and is surfaced stringified.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bittrex: {0}")]
    Api(String),
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

/// A recent public trade from the market history endpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketTrade {
    pub timestamp_ns: u64,
    pub side: Side,
    pub price: f64,
    pub quantity: f64,
}

/// Result of a submit or modify call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubmitResult {
    /// Exchange-assigned order uuid.
    pub uuid: String,
    /// Immediate fills, possibly empty.
    pub trades: Vec<FillPart>,
    /// Quantity still resting after immediate fills.
    pub amount_unfilled: f64,
}

/// One immediate fill inside a [`SubmitResult`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillPart {
    pub price: f64,
    pub quantity: f64,
}

/// Margin account summary used to validate credentials at logon.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MarginSummary {
    pub net_asset_value: f64,
    pub required_margin: f64,
}

/// An order to place, already validated and in exchange units.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: Side,
    pub price: f64,
    pub quantity: f64,
    pub tif: Tif,
}

/// The upstream REST surface the bridge consumes.
#[async_trait]
pub trait Exchange: Send + Sync {
    // -- public --------------------------------------------------------------

    async fn get_currencies(&self) -> Result<Vec<Currency>, ApiError>;

    /// All market summaries as `(symbol, ticker)` pairs.
    async fn get_tickers(&self) -> Result<Vec<(String, Ticker)>, ApiError>;

    /// Recent public trades for one symbol, oldest first.
    async fn get_market_history(&self, symbol: &str) -> Result<Vec<MarketTrade>, ApiError>;

    /// Symbols with leveraged trading enabled.
    async fn margin_enabled_markets(&self) -> Result<Vec<String>, ApiError>;

    // -- account -------------------------------------------------------------

    async fn margin_account_summary(
        &self,
        creds: &Credentials,
    ) -> Result<MarginSummary, ApiError>;

    async fn get_balances(
        &self,
        creds: &Credentials,
    ) -> Result<Vec<(String, ExchangeBalance)>, ApiError>;

    async fn get_margin_balances(
        &self,
        creds: &Credentials,
    ) -> Result<Vec<(String, f64)>, ApiError>;

    async fn get_open_orders(&self, creds: &Credentials) -> Result<Vec<OpenOrder>, ApiError>;

    async fn get_order_history(&self, creds: &Credentials) -> Result<Vec<TradeFill>, ApiError>;

    async fn get_positions(&self, creds: &Credentials)
        -> Result<Vec<MarginPosition>, ApiError>;

    // -- trading -------------------------------------------------------------

    async fn submit_order(
        &self,
        creds: &Credentials,
        req: &OrderRequest,
    ) -> Result<SubmitResult, ApiError>;

    async fn submit_margin_order(
        &self,
        creds: &Credentials,
        req: &OrderRequest,
    ) -> Result<SubmitResult, ApiError>;

    async fn cancel_order(&self, creds: &Credentials, uuid: &str) -> Result<(), ApiError>;

    /// Cancel/replace in one exchange call. `new_quantity = None` keeps the
    /// remaining quantity.
    async fn modify_order(
        &self,
        creds: &Credentials,
        uuid: &str,
        new_quantity: Option<f64>,
        new_price: f64,
    ) -> Result<SubmitResult, ApiError>;
}
