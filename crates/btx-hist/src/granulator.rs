//! Streaming tick → OHLCV granulator.
//!
//! A single pass over an ordered tick sequence, no intermediate buffering: a
//! tick either lands in the current bucket or closes it and opens the next
//! one at its own timestamp. Buckets are anchored at the first tick they
//! contain, not on wall-clock boundaries.

use btx_core::types::Side;

/// One trade from the tick store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub ts_ns: u64,
    pub side: Side,
    pub price: f64,
    pub qty: f64,
}

/// One OHLCV bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    /// First tick's timestamp.
    pub start_ns: u64,
    /// Inclusive end: `start + span - 1 ns`.
    pub end_ns: u64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub last: f64,
    pub volume: f64,
    pub num_trades: u32,
    /// Volume on the buy side; `None` until a buy lands in the bucket.
    pub bid_volume: Option<f64>,
    /// Volume on the sell side; `None` until a sell lands in the bucket.
    pub ask_volume: Option<f64>,
}

impl Bar {
    fn open_at(tick: &Tick, span_ns: u64) -> Self {
        Self {
            start_ns: tick.ts_ns,
            end_ns: tick.ts_ns + span_ns - 1,
            open: tick.price,
            high: tick.price,
            low: tick.price,
            last: tick.price,
            volume: tick.qty,
            num_trades: 1,
            bid_volume: (tick.side == Side::Buy).then_some(tick.qty),
            ask_volume: (tick.side == Side::Sell).then_some(tick.qty),
        }
    }

    fn absorb(&mut self, tick: &Tick) {
        self.high = self.high.max(tick.price);
        self.low = self.low.min(tick.price);
        self.last = tick.price;
        self.volume += tick.qty;
        self.num_trades += 1;
        match tick.side {
            Side::Buy => self.bid_volume = Some(self.bid_volume.unwrap_or(0.0) + tick.qty),
            Side::Sell => self.ask_volume = Some(self.ask_volume.unwrap_or(0.0) + tick.qty),
        }
    }
}

/// Online accumulator over a single symbol's ordered ticks.
///
/// `span_ns` must be non-zero; span-0 queries stream raw ticks and never
/// construct a granulator.
#[derive(Debug)]
pub struct Granulator {
    span_ns: u64,
    current: Option<Bar>,
}

impl Granulator {
    pub fn new(span_ns: u64) -> Self {
        debug_assert!(span_ns > 0);
        Self { span_ns, current: None }
    }

    /// Feed one tick; returns a completed bucket when this tick opens a new
    /// one.
    pub fn push(&mut self, tick: &Tick) -> Option<Bar> {
        match self.current {
            None => {
                self.current = Some(Bar::open_at(tick, self.span_ns));
                None
            }
            Some(ref mut bar) if tick.ts_ns <= bar.end_ns => {
                bar.absorb(tick);
                None
            }
            Some(_) => {
                let done = self.current.replace(Bar::open_at(tick, self.span_ns));
                done
            }
        }
    }

    /// Emit the in-progress bucket after the last tick.
    pub fn finish(self) -> Option<Bar> {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPAN: u64 = 60 * 1_000_000_000; // one minute

    fn tick(ts_ns: u64, side: Side, price: f64, qty: f64) -> Tick {
        Tick { ts_ns, side, price, qty }
    }

    #[test]
    fn single_tick_bucket() {
        let mut g = Granulator::new(SPAN);
        assert_eq!(g.push(&tick(1_000, Side::Buy, 0.05, 2.0)), None);
        let bar = g.finish().unwrap();
        assert_eq!(bar.start_ns, 1_000);
        assert_eq!(bar.end_ns, 1_000 + SPAN - 1);
        assert_eq!((bar.open, bar.high, bar.low, bar.last), (0.05, 0.05, 0.05, 0.05));
        assert_eq!(bar.volume, 2.0);
        assert_eq!(bar.num_trades, 1);
        assert_eq!(bar.bid_volume, Some(2.0));
        assert_eq!(bar.ask_volume, None);
    }

    #[test]
    fn reproduces_generating_ohlcv() {
        // Generate ticks from a known OHLCV sequence, one bucket per row:
        // (open, high, low, last, per-tick qty).
        let rows = [
            (0.050, 0.056, 0.048, 0.051),
            (0.051, 0.051, 0.044, 0.045),
            (0.045, 0.060, 0.045, 0.060),
        ];
        let mut ticks = Vec::new();
        for (i, &(o, h, l, c)) in rows.iter().enumerate() {
            let base = 1_700_000_000_000_000_000 + i as u64 * SPAN;
            ticks.push(tick(base, Side::Buy, o, 1.0));
            ticks.push(tick(base + 1_000, Side::Sell, h, 2.0));
            ticks.push(tick(base + 2_000, Side::Buy, l, 3.0));
            ticks.push(tick(base + 3_000, Side::Sell, c, 4.0));
        }

        let mut g = Granulator::new(SPAN);
        let mut bars = Vec::new();
        for t in &ticks {
            bars.extend(g.push(t));
        }
        bars.extend(g.finish());

        assert_eq!(bars.len(), rows.len());
        for (bar, &(o, h, l, c)) in bars.iter().zip(rows.iter()) {
            assert_eq!(bar.open, o);
            assert_eq!(bar.high, h);
            assert_eq!(bar.low, l);
            assert_eq!(bar.last, c);
            assert_eq!(bar.volume, 10.0);
            assert_eq!(bar.num_trades, 4);
            assert_eq!(bar.bid_volume, Some(4.0));
            assert_eq!(bar.ask_volume, Some(6.0));
        }
    }

    #[test]
    fn tick_on_inclusive_end_stays_in_bucket() {
        let mut g = Granulator::new(SPAN);
        g.push(&tick(0, Side::Buy, 1.0, 1.0));
        assert_eq!(g.push(&tick(SPAN - 1, Side::Sell, 2.0, 1.0)), None);
        let done = g.push(&tick(SPAN, Side::Buy, 3.0, 1.0)).unwrap();
        assert_eq!(done.num_trades, 2);
        assert_eq!(done.last, 2.0);
        let tail = g.finish().unwrap();
        assert_eq!(tail.start_ns, SPAN);
        assert_eq!(tail.open, 3.0);
    }

    #[test]
    fn gap_opens_bucket_at_tick_timestamp() {
        let mut g = Granulator::new(SPAN);
        g.push(&tick(100, Side::Buy, 1.0, 1.0));
        // Several empty spans later: the next bucket starts at the tick, not
        // on a span boundary.
        let done = g.push(&tick(100 + 10 * SPAN + 7, Side::Sell, 2.0, 1.0)).unwrap();
        assert_eq!(done.start_ns, 100);
        let tail = g.finish().unwrap();
        assert_eq!(tail.start_ns, 100 + 10 * SPAN + 7);
    }

    #[test]
    fn empty_input_produces_nothing() {
        let g = Granulator::new(SPAN);
        assert_eq!(g.finish(), None);
    }
}
