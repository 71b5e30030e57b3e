//! Wall-clock readings for the bridge.
//!
//! The tick store keys trades by nanosecond and DTC date-time fields are
//! seconds (whole or floating-point), so every caller funnels through one
//! nanosecond reading and scales down from there. Linux reads the realtime
//! clock directly to keep the full resolution the store key needs; other
//! platforms settle for `SystemTime`.

/// Nanoseconds since Unix epoch.
#[inline]
pub fn now_ns() -> u64 {
    #[cfg(target_os = "linux")]
    {
        let mut ts = libc::timespec { tv_sec: 0, tv_nsec: 0 };
        // On failure ts stays zeroed and the reading collapses to epoch,
        // which downstream treats as "no event yet".
        unsafe { libc::clock_gettime(libc::CLOCK_REALTIME, &mut ts) };
        ts.tv_sec as u64 * 1_000_000_000 + ts.tv_nsec as u64
    }
    #[cfg(not(target_os = "linux"))]
    {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    }
}

/// Microseconds since Unix epoch.
#[inline]
pub fn now_us() -> u64 {
    now_ns() / 1_000
}

/// Whole seconds since Unix epoch.
#[inline]
pub fn now_s() -> u64 {
    now_ns() / 1_000_000_000
}

/// Microsecond timestamp as floating-point seconds since epoch, the
/// representation DTC uses for sub-second date-time fields.
#[inline]
pub fn us_to_float_seconds(us: u64) -> f64 {
    us as f64 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clocks_are_plausible() {
        let ns = now_ns();
        // 2020-01-01 in nanoseconds.
        assert!(ns > 1_577_836_800_000_000_000);
    }

    #[test]
    fn scales_agree() {
        let ns = now_ns();
        let us = now_us();
        let s = now_s();
        assert!(us >= ns / 1_000 - 1_000_000);
        assert!(s <= us / 1_000_000 + 1);
    }

    #[test]
    fn float_seconds() {
        assert_eq!(us_to_float_seconds(1_500_000), 1.5);
    }
}
