//! Hourly fetched-window bookkeeping.
//!
//! A `CtrlFile` is a bitvector over hourly windows since the store genesis
//! (2017-01-01 UTC): bit set = that hour's history has been fetched. The
//! latest hour is never trusted as complete, so callers always refetch it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};

/// Seconds per control-file window.
pub const HOUR_S: u64 = 3600;

/// Store genesis: 2017-01-01T00:00:00Z.
pub fn genesis_s() -> u64 {
    Utc.with_ymd_and_hms(2017, 1, 1, 0, 0, 0).unwrap().timestamp() as u64
}

/// Hour index of a timestamp, `None` before genesis.
pub fn hour_index(ts_s: u64) -> Option<u64> {
    ts_s.checked_sub(genesis_s()).map(|d| d / HOUR_S)
}

/// Bitvector of fetched hourly windows, persisted to one file per symbol.
pub struct CtrlFile {
    path: PathBuf,
    bits: Vec<u8>,
}

impl CtrlFile {
    /// Load an existing control file or start empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let bits = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", path.display()));
            }
        };
        Ok(Self { path, bits })
    }

    pub fn is_fetched(&self, hour: u64) -> bool {
        let byte = (hour / 8) as usize;
        let bit = (hour % 8) as u8;
        self.bits.get(byte).is_some_and(|b| b & (1 << bit) != 0)
    }

    pub fn mark_fetched(&mut self, hour: u64) {
        let byte = (hour / 8) as usize;
        let bit = (hour % 8) as u8;
        if byte >= self.bits.len() {
            self.bits.resize(byte + 1, 0);
        }
        self.bits[byte] |= 1 << bit;
    }

    /// Mark every window strictly before `hour` as fetched. Used to exclude
    /// everything older than a configured backfill start.
    pub fn mark_before(&mut self, hour: u64) {
        let full_bytes = (hour / 8) as usize;
        if self.bits.len() < full_bytes {
            self.bits.resize(full_bytes, 0);
        }
        for byte in &mut self.bits[..full_bytes] {
            *byte = 0xff;
        }
        for h in (full_bytes as u64 * 8)..hour {
            self.mark_fetched(h);
        }
    }

    /// Persist the bitvector.
    pub fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        std::fs::write(&self.path, &self.bits)
            .with_context(|| format!("writing {}", self.path.display()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_is_2017() {
        assert_eq!(genesis_s(), 1_483_228_800);
    }

    #[test]
    fn hour_indexing() {
        assert_eq!(hour_index(genesis_s()), Some(0));
        assert_eq!(hour_index(genesis_s() + HOUR_S - 1), Some(0));
        assert_eq!(hour_index(genesis_s() + HOUR_S), Some(1));
        assert_eq!(hour_index(genesis_s() - 1), None);
    }

    #[test]
    fn mark_before_covers_exactly_the_older_windows() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctrl = CtrlFile::open(dir.path().join("x.ctrl")).unwrap();
        ctrl.mark_before(19);
        for hour in 0..19 {
            assert!(ctrl.is_fetched(hour), "hour {hour} should be marked");
        }
        assert!(!ctrl.is_fetched(19));
        assert!(!ctrl.is_fetched(20));

        // Zero is a no-op.
        let mut empty = CtrlFile::open(dir.path().join("y.ctrl")).unwrap();
        empty.mark_before(0);
        assert!(!empty.is_fetched(0));
    }

    #[test]
    fn bits_round_trip_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("BTC-ETH.ctrl");

        let mut ctrl = CtrlFile::open(&path).unwrap();
        assert!(!ctrl.is_fetched(0));
        ctrl.mark_fetched(0);
        ctrl.mark_fetched(9);
        ctrl.mark_fetched(1000);
        ctrl.flush().unwrap();

        let reopened = CtrlFile::open(&path).unwrap();
        assert!(reopened.is_fetched(0));
        assert!(reopened.is_fetched(9));
        assert!(reopened.is_fetched(1000));
        assert!(!reopened.is_fetched(1));
        assert!(!reopened.is_fetched(1001));
    }
}
