//! Bittrex REST client.
//!
//! Signed requests carry `apikey` and `nonce` query parameters and an
//! `apisign` header: HMAC-SHA512 of the full request URI keyed by the API
//! secret. Every call has a 30 second timeout on the shared client.
//!
//! | Operation              | Path                                        |
//! |------------------------|---------------------------------------------|
//! | Currencies             | `/api/v1.1/public/getcurrencies`            |
//! | Market summaries       | `/api/v1.1/public/getmarketsummaries`       |
//! | Markets (margin flags) | `/api/v1.1/public/getmarkets`               |
//! | Market history         | `/api/v1.1/public/getmarkethistory`         |
//! | Balances               | `/api/v2.0/key/balance/getbalances`         |
//! | Margin balances        | `/api/v2.0/key/balance/getmarginbalances`   |
//! | Margin summary         | `/api/v2.0/key/balance/getmarginaccountsummary` |
//! | Open orders            | `/api/v2.0/key/market/getopenorders`        |
//! | Order history          | `/api/v2.0/key/orders/getorderhistory`      |
//! | Submit                 | `/api/v2.0/key/market/trade{buy,sell}`      |
//! | Submit (margin)        | `/api/v2.0/key/market/margintrade{buy,sell}`|
//! | Cancel                 | `/api/v2.0/key/market/tradecancel`          |
//! | Modify                 | `/api/v2.0/key/market/trademodify`          |
//! | Positions              | `/api/v2.0/key/market/getmarginopenpositions` |

use std::time::Duration;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use sha2::Sha512;
use tracing::debug;

use btx_core::time_util;
use btx_core::types::{
    Currency, ExchangeBalance, MarginPosition, OpenOrder, OpenOrderStatus, Side, Ticker,
    TradeFill,
};

use super::types::*;
use super::{
    ApiError, Credentials, Exchange, FillPart, MarginSummary, MarketTrade, OrderRequest,
    SubmitResult,
};

/// Per-call timeout on the shared HTTP client.
const REST_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_BASE_URL: &str = "https://bittrex.com";

type HmacSha512 = Hmac<Sha512>;

/// Compute the `apisign` header: HMAC-SHA512 of the full URI, hex-encoded.
pub fn sign_uri(secret: &str, uri: &str) -> String {
    let mut mac =
        HmacSha512::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(uri.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Production [`Exchange`] implementation over HTTPS.
pub struct BittrexClient {
    http: reqwest::Client,
    base_url: String,
}

impl BittrexClient {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REST_TIMEOUT)
            .build()
            .context("building HTTP client")?;
        Ok(Self { http, base_url: base_url.into() })
    }

    fn url(&self, path: &str, params: &[(&str, &str)]) -> String {
        let mut url = format!("{}{}", self.base_url, path);
        let mut sep = '?';
        for (k, v) in params {
            url.push(sep);
            url.push_str(k);
            url.push('=');
            url.push_str(&urlencoding::encode(v));
            sep = '&';
        }
        url
    }

    async fn fetch<T: DeserializeOwned>(&self, url: &str, apisign: Option<String>) -> Result<T, ApiError> {
        debug!("[bittrex] GET {url}");
        let mut req = self.http.get(url);
        if let Some(sign) = apisign {
            req = req.header("apisign", sign);
        }
        let resp = req
            .send()
            .await
            .context("request failed")?
            .error_for_status()
            .context("HTTP error status")?;
        let env: Envelope<T> = resp.json().await.context("malformed response body")?;

        if !env.success {
            return Err(ApiError::Api(
                env.message.unwrap_or_else(|| "unspecified error".into()),
            ));
        }
        env.result
            .ok_or_else(|| ApiError::Transport(anyhow!("success without result")))
    }

    async fn get_public<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = self.url(path, params);
        self.fetch(&url, None).await
    }

    async fn get_signed<T: DeserializeOwned>(
        &self,
        creds: &Credentials,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let nonce = time_util::now_us().to_string();
        let mut all: Vec<(&str, &str)> = vec![("apikey", &creds.key), ("nonce", &nonce)];
        all.extend_from_slice(params);
        let url = self.url(path, &all);
        let sign = sign_uri(&creds.secret, &url);
        self.fetch(&url, Some(sign)).await
    }

    async fn trade(
        &self,
        creds: &Credentials,
        path: &str,
        req: &OrderRequest,
    ) -> Result<SubmitResult, ApiError> {
        let qty = format!("{:.8}", req.quantity);
        let rate = format!("{:.8}", req.price);
        let mut params: Vec<(&str, &str)> = vec![
            ("marketname", &req.symbol),
            ("ordertype", "LIMIT"),
            ("quantity", &qty),
            ("rate", &rate),
        ];
        if let Some(tif) = req.tif.as_exchange_param() {
            params.push(("timeineffect", tif));
        }
        let rec: SubmitRecord = self.get_signed(creds, path, &params).await?;
        Ok(submit_result_from(rec))
    }
}

fn submit_result_from(rec: SubmitRecord) -> SubmitResult {
    SubmitResult {
        uuid: rec.order_id,
        trades: rec
            .trades
            .iter()
            .map(|t| FillPart { price: t.price, quantity: t.quantity })
            .collect(),
        amount_unfilled: rec.quantity_remaining,
    }
}

fn open_order_from(rec: OpenOrderRecord) -> anyhow::Result<OpenOrder> {
    let side = parse_side(&rec.order_type)?;
    let status = if rec.quantity_remaining < rec.quantity {
        OpenOrderStatus::PartiallyFilled
    } else {
        OpenOrderStatus::Open
    };
    Ok(OpenOrder {
        uuid: rec.order_uuid,
        symbol: rec.exchange,
        side,
        status,
        price: rec.limit,
        quantity: rec.quantity,
        quantity_remaining: rec.quantity_remaining,
        opened_us: parse_timestamp_us(&rec.opened)?,
    })
}

fn trade_fill_from(rec: OrderHistoryRecord) -> anyhow::Result<TradeFill> {
    let side = parse_side(&rec.order_type)?;
    Ok(TradeFill {
        uuid: rec.order_uuid.clone(),
        order_uuid: rec.order_uuid,
        symbol: rec.exchange,
        side,
        price: rec.price_per_unit.unwrap_or(rec.limit),
        quantity: rec.quantity - rec.quantity_remaining,
        executed_us: parse_timestamp_us(&rec.time_stamp)?,
    })
}

#[async_trait]
impl Exchange for BittrexClient {
    async fn get_currencies(&self) -> Result<Vec<Currency>, ApiError> {
        let recs: Vec<CurrencyRecord> =
            self.get_public("/api/v1.1/public/getcurrencies", &[]).await?;
        Ok(recs
            .into_iter()
            .map(|r| Currency {
                code: r.currency,
                name: r.currency_long,
                tx_fee: r.tx_fee,
                is_active: r.is_active,
            })
            .collect())
    }

    async fn get_tickers(&self) -> Result<Vec<(String, Ticker)>, ApiError> {
        let recs: Vec<MarketSummaryRecord> =
            self.get_public("/api/v1.1/public/getmarketsummaries", &[]).await?;
        Ok(recs
            .into_iter()
            .map(|r| {
                let ticker = Ticker {
                    bid: r.bid,
                    ask: r.ask,
                    last: r.last,
                    low24h: r.low,
                    high24h: r.high,
                    base_volume: r.base_volume,
                };
                (r.market_name, ticker)
            })
            .collect())
    }

    async fn get_market_history(&self, symbol: &str) -> Result<Vec<MarketTrade>, ApiError> {
        let recs: Vec<MarketHistoryRecord> = self
            .get_public("/api/v1.1/public/getmarkethistory", &[("market", symbol)])
            .await?;
        let mut trades = Vec::with_capacity(recs.len());
        for r in recs {
            trades.push(MarketTrade {
                timestamp_ns: parse_timestamp_us(&r.time_stamp)? * 1_000,
                side: parse_side(&r.order_type)?,
                price: r.price,
                quantity: r.quantity,
            });
        }
        // The endpoint returns newest first; callers want chronological order.
        trades.sort_by_key(|t| t.timestamp_ns);
        Ok(trades)
    }

    async fn margin_enabled_markets(&self) -> Result<Vec<String>, ApiError> {
        let recs: Vec<MarketRecord> = self.get_public("/api/v1.1/public/getmarkets", &[]).await?;
        Ok(recs
            .into_iter()
            .filter(|r| r.is_active && r.margin_enabled)
            .map(|r| r.market_name)
            .collect())
    }

    async fn margin_account_summary(
        &self,
        creds: &Credentials,
    ) -> Result<MarginSummary, ApiError> {
        let rec: MarginSummaryRecord = self
            .get_signed(creds, "/api/v2.0/key/balance/getmarginaccountsummary", &[])
            .await?;
        Ok(MarginSummary {
            net_asset_value: rec.net_asset_value,
            required_margin: rec.required_margin,
        })
    }

    async fn get_balances(
        &self,
        creds: &Credentials,
    ) -> Result<Vec<(String, ExchangeBalance)>, ApiError> {
        let recs: Vec<BalanceRecord> =
            self.get_signed(creds, "/api/v2.0/key/balance/getbalances", &[]).await?;
        Ok(recs
            .into_iter()
            .map(|r| {
                let bal = ExchangeBalance {
                    available: r.available,
                    on_orders: r.balance - r.available,
                    btc_value: r.btc_value,
                };
                (r.currency, bal)
            })
            .collect())
    }

    async fn get_margin_balances(
        &self,
        creds: &Credentials,
    ) -> Result<Vec<(String, f64)>, ApiError> {
        let recs: Vec<MarginBalanceRecord> = self
            .get_signed(creds, "/api/v2.0/key/balance/getmarginbalances", &[])
            .await?;
        Ok(recs.into_iter().map(|r| (r.currency, r.margin_balance)).collect())
    }

    async fn get_open_orders(&self, creds: &Credentials) -> Result<Vec<OpenOrder>, ApiError> {
        let recs: Vec<OpenOrderRecord> =
            self.get_signed(creds, "/api/v2.0/key/market/getopenorders", &[]).await?;
        let mut orders = Vec::with_capacity(recs.len());
        for r in recs {
            orders.push(open_order_from(r)?);
        }
        Ok(orders)
    }

    async fn get_order_history(&self, creds: &Credentials) -> Result<Vec<TradeFill>, ApiError> {
        let recs: Vec<OrderHistoryRecord> = self
            .get_signed(creds, "/api/v2.0/key/orders/getorderhistory", &[])
            .await?;
        let mut fills = Vec::with_capacity(recs.len());
        for r in recs {
            // Orders that never executed are not fills.
            if r.quantity - r.quantity_remaining <= 0.0 {
                continue;
            }
            fills.push(trade_fill_from(r)?);
        }
        Ok(fills)
    }

    async fn get_positions(
        &self,
        creds: &Credentials,
    ) -> Result<Vec<MarginPosition>, ApiError> {
        let recs: Vec<MarginPositionRecord> = self
            .get_signed(creds, "/api/v2.0/key/market/getmarginopenpositions", &[])
            .await?;
        Ok(recs
            .into_iter()
            .map(|r| MarginPosition {
                symbol: r.market_name,
                quantity: r.quantity,
                base_price: r.base_price,
            })
            .collect())
    }

    async fn submit_order(
        &self,
        creds: &Credentials,
        req: &OrderRequest,
    ) -> Result<SubmitResult, ApiError> {
        let path = match req.side {
            Side::Buy => "/api/v2.0/key/market/tradebuy",
            Side::Sell => "/api/v2.0/key/market/tradesell",
        };
        self.trade(creds, path, req).await
    }

    async fn submit_margin_order(
        &self,
        creds: &Credentials,
        req: &OrderRequest,
    ) -> Result<SubmitResult, ApiError> {
        let path = match req.side {
            Side::Buy => "/api/v2.0/key/market/margintradebuy",
            Side::Sell => "/api/v2.0/key/market/margintradesell",
        };
        self.trade(creds, path, req).await
    }

    async fn cancel_order(&self, creds: &Credentials, uuid: &str) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .get_signed(creds, "/api/v2.0/key/market/tradecancel", &[("orderid", uuid)])
            .await?;
        Ok(())
    }

    async fn modify_order(
        &self,
        creds: &Credentials,
        uuid: &str,
        new_quantity: Option<f64>,
        new_price: f64,
    ) -> Result<SubmitResult, ApiError> {
        let rate = format!("{new_price:.8}");
        let qty = new_quantity.map(|q| format!("{q:.8}"));
        let mut params: Vec<(&str, &str)> = vec![("orderid", uuid), ("rate", &rate)];
        if let Some(ref q) = qty {
            params.push(("quantity", q));
        }
        let rec: SubmitRecord = self
            .get_signed(creds, "/api/v2.0/key/market/trademodify", &params)
            .await?;
        Ok(submit_result_from(rec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apisign_is_sha512_hex() {
        let sign = sign_uri("secret", "https://bittrex.com/api/v1.1/account/getbalances?apikey=k&nonce=1");
        assert_eq!(sign.len(), 128); // 64 bytes → 128 hex chars
        // Deterministic for fixed inputs.
        assert_eq!(sign, sign_uri("secret", "https://bittrex.com/api/v1.1/account/getbalances?apikey=k&nonce=1"));
    }

    #[test]
    fn url_builder_encodes_params() {
        let client = BittrexClient::with_base_url("https://example.test").unwrap();
        let url = client.url("/api/v1.1/public/getmarkethistory", &[("market", "BTC-ETH")]);
        assert_eq!(url, "https://example.test/api/v1.1/public/getmarkethistory?market=BTC-ETH");
    }

    #[test]
    fn open_order_status_from_remaining() {
        let rec = OpenOrderRecord {
            order_uuid: "u1".into(),
            exchange: "BTC-ETH".into(),
            order_type: "LIMIT_BUY".into(),
            limit: 0.05,
            quantity: 10.0,
            quantity_remaining: 10.0,
            opened: "2017-02-12T02:05:45.27".into(),
        };
        let o = open_order_from(rec).unwrap();
        assert_eq!(o.status, OpenOrderStatus::Open);

        let rec = OpenOrderRecord {
            order_uuid: "u2".into(),
            exchange: "BTC-ETH".into(),
            order_type: "LIMIT_SELL".into(),
            limit: 0.05,
            quantity: 10.0,
            quantity_remaining: 4.0,
            opened: "2017-02-12T02:05:45".into(),
        };
        let o = open_order_from(rec).unwrap();
        assert_eq!(o.status, OpenOrderStatus::PartiallyFilled);
        assert_eq!(o.filled(), 6.0);
    }
}
