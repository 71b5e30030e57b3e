//! On-disk tick store, one ordered key/value tree per symbol.
//!
//! Keys are big-endian nanosecond timestamps, so lexicographic key order is
//! timestamp order and range scans are chronological. Values are 17 bytes:
//! `side (u8) ++ price (i64 BE, satoshi) ++ quantity (i64 BE, satoshi)`.
//!
//! Identical timestamps inside a pump batch get `+1 ns` per collision so the
//! key stays unique and ordering stays monotone; re-inserting a trade that is
//! already stored byte-identically is a no-op, which makes the pump
//! idempotent across overlapping fetches.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing::debug;

use btx_bridge::bittrex::MarketTrade;
use btx_core::book::{price_to_sats, sats_to_price};
use btx_core::types::Side;

use crate::granulator::Tick;

/// Encoded value length: side + price + quantity.
const VALUE_LEN: usize = 17;

const SIDE_BUY: u8 = 0;
const SIDE_SELL: u8 = 1;

/// Sled-backed tick store for one symbol.
pub struct TickStore {
    db: sled::Db,
}

impl TickStore {
    /// Open (or create) the store at `<datadir>/<symbol>/`.
    pub fn open(datadir: &Path, symbol: &str) -> Result<Self> {
        let path = datadir.join(symbol);
        let db = sled::open(&path)
            .with_context(|| format!("opening tick store at {}", path.display()))?;
        Ok(Self { db })
    }

    fn encode_key(ts_ns: u64) -> [u8; 8] {
        ts_ns.to_be_bytes()
    }

    fn decode_key(key: &[u8]) -> Result<u64> {
        let bytes: [u8; 8] = key.try_into().map_err(|_| anyhow!("bad key length"))?;
        Ok(u64::from_be_bytes(bytes))
    }

    fn encode_value(side: Side, price: f64, qty: f64) -> [u8; VALUE_LEN] {
        let mut buf = [0u8; VALUE_LEN];
        buf[0] = match side {
            Side::Buy => SIDE_BUY,
            Side::Sell => SIDE_SELL,
        };
        buf[1..9].copy_from_slice(&price_to_sats(price).to_be_bytes());
        buf[9..17].copy_from_slice(&price_to_sats(qty).to_be_bytes());
        buf
    }

    fn decode_value(value: &[u8]) -> Result<(Side, f64, f64)> {
        if value.len() != VALUE_LEN {
            return Err(anyhow!("bad value length {}", value.len()));
        }
        let side = match value[0] {
            SIDE_BUY => Side::Buy,
            SIDE_SELL => Side::Sell,
            other => return Err(anyhow!("bad side byte {other}")),
        };
        let price = i64::from_be_bytes(value[1..9].try_into().unwrap());
        let qty = i64::from_be_bytes(value[9..17].try_into().unwrap());
        Ok((side, sats_to_price(price), sats_to_price(qty)))
    }

    /// Insert a batch of trades, bumping colliding timestamps by 1 ns each.
    ///
    /// Returns the number of newly stored trades (already-present identical
    /// records are skipped).
    pub fn insert_trades(&self, trades: &[MarketTrade]) -> Result<usize> {
        let mut stored = 0usize;
        for trade in trades {
            let value = Self::encode_value(trade.side, trade.price, trade.quantity);
            let mut ts = trade.timestamp_ns;
            loop {
                match self.db.get(Self::encode_key(ts))? {
                    Some(existing) if existing.as_ref() == &value[..] => break, // already stored
                    Some(_) => ts += 1, // monotonic tie-break
                    None => {
                        self.db.insert(Self::encode_key(ts), &value[..])?;
                        stored += 1;
                        break;
                    }
                }
            }
        }
        self.db.flush()?;
        debug!("stored {stored}/{} trades", trades.len());
        Ok(stored)
    }

    /// Iterate ticks with `start_ns <= ts <= end_ns` in timestamp order.
    /// `end_ns = None` is open-ended.
    pub fn range(
        &self,
        start_ns: u64,
        end_ns: Option<u64>,
    ) -> impl Iterator<Item = Result<Tick>> + '_ {
        let lower = Self::encode_key(start_ns);
        let iter = match end_ns {
            Some(end) => self.db.range(lower..=Self::encode_key(end)),
            None => self.db.range(lower..),
        };
        iter.map(|entry| {
            let (key, value) = entry.context("tick store scan")?;
            let ts_ns = Self::decode_key(&key)?;
            let (side, price, qty) = Self::decode_value(&value)?;
            Ok(Tick { ts_ns, side, price, qty })
        })
    }

    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(ts_ns: u64, side: Side, price: f64, qty: f64) -> MarketTrade {
        MarketTrade { timestamp_ns: ts_ns, side, price, quantity: qty }
    }

    fn temp_store() -> (tempfile::TempDir, TickStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = TickStore::open(dir.path(), "BTC-ETH").unwrap();
        (dir, store)
    }

    #[test]
    fn round_trip_in_timestamp_order() {
        let (_dir, store) = temp_store();
        store
            .insert_trades(&[
                trade(3_000, Side::Sell, 0.051, 1.0),
                trade(1_000, Side::Buy, 0.050, 2.0),
                trade(2_000, Side::Buy, 0.049, 3.0),
            ])
            .unwrap();

        let ticks: Vec<Tick> = store.range(0, None).map(|t| t.unwrap()).collect();
        assert_eq!(ticks.len(), 3);
        assert_eq!(
            ticks.iter().map(|t| t.ts_ns).collect::<Vec<_>>(),
            vec![1_000, 2_000, 3_000]
        );
        assert_eq!(ticks[0].side, Side::Buy);
        assert!((ticks[0].price - 0.050).abs() < 1e-9);
        assert!((ticks[2].qty - 1.0).abs() < 1e-9);
    }

    #[test]
    fn colliding_timestamps_bump_one_nanosecond() {
        let (_dir, store) = temp_store();
        store
            .insert_trades(&[
                trade(5_000, Side::Buy, 0.05, 1.0),
                trade(5_000, Side::Sell, 0.06, 2.0),
                trade(5_000, Side::Buy, 0.07, 3.0),
            ])
            .unwrap();

        let ticks: Vec<Tick> = store.range(0, None).map(|t| t.unwrap()).collect();
        assert_eq!(
            ticks.iter().map(|t| t.ts_ns).collect::<Vec<_>>(),
            vec![5_000, 5_001, 5_002]
        );
        // Insertion order is preserved through the tie-break.
        assert!((ticks[1].price - 0.06).abs() < 1e-9);
    }

    #[test]
    fn identical_reinsert_is_idempotent() {
        let (_dir, store) = temp_store();
        let batch = [trade(9_000, Side::Buy, 0.05, 1.0)];
        assert_eq!(store.insert_trades(&batch).unwrap(), 1);
        assert_eq!(store.insert_trades(&batch).unwrap(), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn bounded_range_is_inclusive() {
        let (_dir, store) = temp_store();
        store
            .insert_trades(&[
                trade(1_000, Side::Buy, 0.05, 1.0),
                trade(2_000, Side::Buy, 0.05, 1.0),
                trade(3_000, Side::Buy, 0.05, 1.0),
            ])
            .unwrap();
        let ticks: Vec<Tick> = store.range(2_000, Some(3_000)).map(|t| t.unwrap()).collect();
        assert_eq!(
            ticks.iter().map(|t| t.ts_ns).collect::<Vec<_>>(),
            vec![2_000, 3_000]
        );
    }
}
