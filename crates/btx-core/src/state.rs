//! Process-wide market state tables.
//!
//! One [`MarketState`] instance is created at startup and passed by handle
//! into every handler and background task; tests construct their own. The
//! tables are read by request handlers and written by the WebSocket
//! supervisor and the periodic ticker refresher. Each table takes a
//! read-mostly lock; writers hold it only for the table mutation, never
//! across an await.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::book::{Book, BookUpdate};
use crate::error::BtxError;
use crate::types::{Currency, LatestTrade, Ticker};

/// Shared market state: currencies, tickers, books, latest trades, and the
/// upstream `subid → symbol` map.
#[derive(Debug, Default)]
pub struct MarketState {
    currencies: RwLock<HashMap<String, Currency>>,
    /// `symbol → (observed_us, ticker)`; the timestamp is monotone
    /// non-decreasing per symbol.
    tickers: RwLock<HashMap<String, (u64, Ticker)>>,
    books: RwLock<HashMap<String, Book>>,
    latest_trades: RwLock<HashMap<String, LatestTrade>>,
    /// Upstream stream id → symbol, repopulated from every snapshot.
    subids: RwLock<HashMap<u64, String>>,
}

impl MarketState {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Currencies
    // -----------------------------------------------------------------------

    pub fn set_currencies(&self, currencies: Vec<Currency>) {
        let mut table = self.currencies.write().unwrap();
        table.clear();
        for c in currencies {
            table.insert(c.code.clone(), c);
        }
    }

    pub fn currency(&self, code: &str) -> Option<Currency> {
        self.currencies.read().unwrap().get(code).cloned()
    }

    // -----------------------------------------------------------------------
    // Tickers
    // -----------------------------------------------------------------------

    /// Store a ticker observed at `now_us`, returning the previous entry.
    ///
    /// The stored timestamp never goes backwards: a stale `now_us` keeps the
    /// previous timestamp.
    pub fn put_ticker(&self, symbol: &str, now_us: u64, ticker: Ticker) -> Option<(u64, Ticker)> {
        let mut table = self.tickers.write().unwrap();
        let prev = table.get(symbol).copied();
        let ts = match prev {
            Some((prev_ts, _)) => prev_ts.max(now_us),
            None => now_us,
        };
        table.insert(symbol.to_string(), (ts, ticker));
        prev
    }

    pub fn ticker(&self, symbol: &str) -> Option<(u64, Ticker)> {
        self.tickers.read().unwrap().get(symbol).copied()
    }

    pub fn has_symbol(&self, symbol: &str) -> bool {
        self.tickers.read().unwrap().contains_key(symbol)
    }

    /// All known symbols, sorted for deterministic iteration.
    pub fn symbols(&self) -> Vec<String> {
        let mut syms: Vec<String> = self.tickers.read().unwrap().keys().cloned().collect();
        syms.sort();
        syms
    }

    // -----------------------------------------------------------------------
    // Books
    // -----------------------------------------------------------------------

    /// Replace a symbol's book from an upstream snapshot.
    pub fn set_book_snapshot(
        &self,
        symbol: &str,
        bids: &[(f64, f64)],
        asks: &[(f64, f64)],
        now_us: u64,
    ) {
        let mut table = self.books.write().unwrap();
        table
            .entry(symbol.to_string())
            .or_default()
            .set_snapshot(bids, asks, now_us);
    }

    /// Apply a batch of book updates atomically for one symbol.
    pub fn apply_book_updates(
        &self,
        symbol: &str,
        updates: &[BookUpdate],
        now_us: u64,
    ) -> Result<(), BtxError> {
        let mut table = self.books.write().unwrap();
        table
            .entry(symbol.to_string())
            .or_default()
            .apply_batch(updates, now_us)
    }

    pub fn book(&self, symbol: &str) -> Option<Book> {
        self.books.read().unwrap().get(symbol).cloned()
    }

    // -----------------------------------------------------------------------
    // Latest trades
    // -----------------------------------------------------------------------

    pub fn put_latest_trade(&self, symbol: &str, trade: LatestTrade) {
        self.latest_trades
            .write()
            .unwrap()
            .insert(symbol.to_string(), trade);
    }

    pub fn latest_trade(&self, symbol: &str) -> Option<LatestTrade> {
        self.latest_trades.read().unwrap().get(symbol).copied()
    }

    // -----------------------------------------------------------------------
    // Upstream subscription ids
    // -----------------------------------------------------------------------

    /// Record the `subid → symbol` binding carried by a snapshot.
    pub fn bind_subid(&self, subid: u64, symbol: &str) {
        self.subids
            .write()
            .unwrap()
            .insert(subid, symbol.to_string());
    }

    /// Resolve an upstream `subid` to its symbol.
    pub fn symbol_for_subid(&self, subid: u64) -> Option<String> {
        self.subids.read().unwrap().get(&subid).cloned()
    }

    /// Drop all subid bindings (they change on every upstream reconnect).
    pub fn clear_subids(&self) {
        self.subids.write().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Side;

    #[test]
    fn ticker_timestamp_is_monotone() {
        let state = MarketState::new();
        let t = Ticker { bid: 1.0, ..Default::default() };
        assert!(state.put_ticker("BTC-ETH", 100, t).is_none());
        state.put_ticker("BTC-ETH", 200, t);
        // A stale clock reading must not move the timestamp backwards.
        state.put_ticker("BTC-ETH", 150, t);
        let (ts, _) = state.ticker("BTC-ETH").unwrap();
        assert_eq!(ts, 200);
    }

    #[test]
    fn subid_bindings() {
        let state = MarketState::new();
        state.bind_subid(17, "BTC-ETH");
        assert_eq!(state.symbol_for_subid(17).as_deref(), Some("BTC-ETH"));
        assert_eq!(state.symbol_for_subid(18), None);
        state.clear_subids();
        assert_eq!(state.symbol_for_subid(17), None);
    }

    #[test]
    fn book_updates_through_state() {
        let state = MarketState::new();
        state.set_book_snapshot("BTC-ETH", &[(0.05, 1.0)], &[(0.051, 2.0)], 1);
        state
            .apply_book_updates(
                "BTC-ETH",
                &[BookUpdate::new(Side::Sell, 0.051, 0.0)],
                2,
            )
            .unwrap();
        let book = state.book("BTC-ETH").unwrap();
        assert!(book.asks.is_empty());
        assert_eq!(book.bids.best_bid(), Some((0.05, 1.0)));
    }

    #[test]
    fn symbols_are_sorted() {
        let state = MarketState::new();
        for s in ["BTC-ZEC", "BTC-ETH", "BTC-LTC"] {
            state.put_ticker(s, 1, Ticker::default());
        }
        assert_eq!(state.symbols(), vec!["BTC-ETH", "BTC-LTC", "BTC-ZEC"]);
    }
}
