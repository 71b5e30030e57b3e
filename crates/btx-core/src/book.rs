//! Per-symbol order books with incremental batch updates.
//!
//! The upstream WebSocket delivers an initial snapshot per symbol followed by
//! single-level deltas. Each side is an ordered `price → quantity` map:
//!
//! - Bids are scanned **descending** (best bid = maximum key).
//! - Asks are scanned **ascending** (best ask = minimum key).
//!
//! Prices are keyed as satoshi integers (`price × 1e8`, rounded) so the maps
//! have a total order without floating-point comparison. A level with
//! quantity `0` is a deletion; the maps never hold entries with
//! `quantity <= 0`.

use std::collections::BTreeMap;

use crate::error::BtxError;
use crate::types::Side;

/// Number of satoshi per whole unit (1e8).
pub const SATS_PER_UNIT: f64 = 1e8;

/// Convert a float price to its satoshi integer key.
#[inline]
pub fn price_to_sats(price: f64) -> i64 {
    (price * SATS_PER_UNIT).round() as i64
}

/// Convert a satoshi integer key back to a float price.
#[inline]
pub fn sats_to_price(sats: i64) -> f64 {
    sats as f64 / SATS_PER_UNIT
}

// ---------------------------------------------------------------------------
// BookSide
// ---------------------------------------------------------------------------

/// One side of a book: an ordered price ladder plus the time of its last
/// mutation (microseconds since epoch, `0` = never touched).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookSide {
    levels: BTreeMap<i64, f64>,
    ts_us: u64,
}

impl BookSide {
    /// Insert, update, or delete one level. Quantity `0` deletes.
    fn apply(&mut self, price: f64, qty: f64, now_us: u64) {
        let key = price_to_sats(price);
        if qty > 0.0 {
            self.levels.insert(key, qty);
        } else {
            self.levels.remove(&key);
        }
        self.ts_us = now_us;
    }

    /// Best level on a bid side (maximum price).
    pub fn best_bid(&self) -> Option<(f64, f64)> {
        self.levels
            .iter()
            .next_back()
            .map(|(&k, &q)| (sats_to_price(k), q))
    }

    /// Best level on an ask side (minimum price).
    pub fn best_ask(&self) -> Option<(f64, f64)> {
        self.levels
            .iter()
            .next()
            .map(|(&k, &q)| (sats_to_price(k), q))
    }

    /// Last mutation time (microseconds since epoch, `0` = never).
    pub fn ts_us(&self) -> u64 {
        self.ts_us
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Iterate all levels in ascending price order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.levels.iter().map(|(&k, &q)| (sats_to_price(k), q))
    }
}

// ---------------------------------------------------------------------------
// Book
// ---------------------------------------------------------------------------

/// One `(side, price, quantity)` mutation from the upstream feed.
///
/// `side = None` models an upstream entry whose side field was absent; it is
/// rejected by [`Book::apply_batch`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BookUpdate {
    pub side: Option<Side>,
    pub price: f64,
    pub qty: f64,
}

impl BookUpdate {
    pub fn new(side: Side, price: f64, qty: f64) -> Self {
        Self { side: Some(side), price, qty }
    }
}

/// Both sides of a symbol's book.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Book {
    pub bids: BookSide,
    pub asks: BookSide,
}

impl Book {
    /// Apply a batch of updates atomically (all or nothing).
    ///
    /// The batch is validated first so a malformed entry cannot leave the
    /// book half-mutated.
    pub fn apply_batch(&mut self, updates: &[BookUpdate], now_us: u64) -> Result<(), BtxError> {
        if updates.iter().any(|u| u.side.is_none()) {
            return Err(BtxError::Parse("book update with unset side".into()));
        }
        for u in updates {
            match u.side {
                Some(Side::Buy) => self.bids.apply(u.price, u.qty, now_us),
                Some(Side::Sell) => self.asks.apply(u.price, u.qty, now_us),
                None => unreachable!("validated above"),
            }
        }
        Ok(())
    }

    /// Replace both ladders from a snapshot.
    pub fn set_snapshot(
        &mut self,
        bids: &[(f64, f64)],
        asks: &[(f64, f64)],
        now_us: u64,
    ) {
        self.bids = BookSide::default();
        self.asks = BookSide::default();
        for &(p, q) in bids {
            self.bids.apply(p, q, now_us);
        }
        for &(p, q) in asks {
            self.asks.apply(p, q, now_us);
        }
    }

    /// `max(bid.ts, ask.ts)`, the snapshot's bid/ask date-time field.
    pub fn last_mutation_us(&self) -> u64 {
        self.bids.ts_us().max(self.asks.ts_us())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_and_best_levels() {
        let mut book = Book::default();
        book.set_snapshot(
            &[(0.0500, 1.0), (0.0499, 2.0), (0.0498, 3.0)],
            &[(0.0501, 1.5), (0.0502, 2.5)],
            10,
        );
        assert_eq!(book.bids.best_bid(), Some((0.0500, 1.0)));
        assert_eq!(book.asks.best_ask(), Some((0.0501, 1.5)));
        assert_eq!(book.last_mutation_us(), 10);
    }

    #[test]
    fn zero_quantity_deletes() {
        let mut book = Book::default();
        book.set_snapshot(&[(0.05, 1.0), (0.04, 2.0)], &[], 1);
        book.apply_batch(&[BookUpdate::new(Side::Buy, 0.05, 0.0)], 2)
            .unwrap();
        assert_eq!(book.bids.best_bid(), Some((0.04, 2.0)));
        assert_eq!(book.bids.ts_us(), 2);
        // No entry with quantity <= 0 survives.
        assert!(book.bids.iter().all(|(_, q)| q > 0.0));
    }

    #[test]
    fn unset_side_rejected_without_mutation() {
        let mut book = Book::default();
        book.set_snapshot(&[(0.05, 1.0)], &[], 1);
        let batch = [
            BookUpdate::new(Side::Buy, 0.06, 1.0),
            BookUpdate { side: None, price: 0.07, qty: 1.0 },
        ];
        assert!(book.apply_batch(&batch, 2).is_err());
        // Atomic: the valid leading entry was not applied either.
        assert_eq!(book.bids.len(), 1);
        assert_eq!(book.bids.ts_us(), 1);
    }

    #[test]
    fn no_crossed_book_from_snapshot() {
        let mut book = Book::default();
        book.set_snapshot(
            &[(0.0500, 1.0), (0.0499, 1.0)],
            &[(0.0501, 1.0), (0.0503, 1.0)],
            1,
        );
        let (bid, _) = book.bids.best_bid().unwrap();
        let (ask, _) = book.asks.best_ask().unwrap();
        assert!(bid <= ask, "snapshot produced a crossed book");
    }

    #[test]
    fn price_key_round_trip() {
        for p in [0.00000001, 0.05, 1.0, 19_999.12345678] {
            assert!((sats_to_price(price_to_sats(p)) - p).abs() < 1e-9);
        }
    }
}
