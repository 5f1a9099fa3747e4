//! Numeric primitives shared by the structure components
//!
//! Rolling extremes, pivot confirmation and ATR. All functions take index-aligned
//! slices and never allocate except [`atr`].

use crate::{OHLCVExt, OHLCV};

// ============================================================
// CONSTANTS
// ============================================================

/// Lookback of the internal (minor) swing detector
pub const MINOR_SWING_LENGTH: usize = 5;
/// ATR period used when the caller does not supply a series
pub const DEFAULT_ATR_PERIOD: usize = 200;
/// A candle is an order-block candidate while its range is below this many ATRs
pub const ORDER_BLOCK_RANGE_FACTOR: f64 = 2.0;

// ============================================================
// ROLLING EXTREMES
// ============================================================

/// Highest value of the `len` values ending at `end` (inclusive).
#[inline]
pub fn highest(values: &[f64], end: usize, len: usize) -> f64 {
    let start = (end + 1).saturating_sub(len);
    values[start..=end]
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max)
}

/// Lowest value of the `len` values ending at `end` (inclusive).
#[inline]
pub fn lowest(values: &[f64], end: usize, len: usize) -> f64 {
    let start = (end + 1).saturating_sub(len);
    values[start..=end]
        .iter()
        .copied()
        .fold(f64::INFINITY, f64::min)
}

// ============================================================
// PIVOTS
// ============================================================

/// Pivot high at `center`: strictly above the `k` values on each side.
/// `None` when the window does not fit or the value is not a pivot.
#[inline]
pub fn pivot_high(values: &[f64], center: usize, k: usize) -> Option<f64> {
    if center < k || center + k >= values.len() {
        return None;
    }
    let v = values[center];
    let left = &values[center - k..center];
    let right = &values[center + 1..=center + k];
    (left.iter().all(|&x| x < v) && right.iter().all(|&x| x < v)).then_some(v)
}

/// Pivot low at `center`: strictly below the `k` values on each side.
#[inline]
pub fn pivot_low(values: &[f64], center: usize, k: usize) -> Option<f64> {
    if center < k || center + k >= values.len() {
        return None;
    }
    let v = values[center];
    let left = &values[center - k..center];
    let right = &values[center + 1..=center + k];
    (left.iter().all(|&x| x > v) && right.iter().all(|&x| x > v)).then_some(v)
}

/// Pivot high confirmed on bar `index`, i.e. centered `k` bars back.
#[inline]
pub fn confirmed_pivot_high(values: &[f64], index: usize, k: usize) -> Option<f64> {
    index
        .checked_sub(k)
        .and_then(|center| pivot_high(&values[..=index], center, k))
}

/// Pivot low confirmed on bar `index`.
#[inline]
pub fn confirmed_pivot_low(values: &[f64], index: usize, k: usize) -> Option<f64> {
    index
        .checked_sub(k)
        .and_then(|center| pivot_low(&values[..=index], center, k))
}

// ============================================================
// ATR
// ============================================================

/// True range against the previous close
#[inline]
pub fn true_range(prev_close: f64, high: f64, low: f64) -> f64 {
    let hl = high - low;
    let hc = (high - prev_close).abs();
    let lc = (low - prev_close).abs();
    hl.max(hc).max(lc)
}

/// Wilder ATR. The first bar uses high - low; until `period` true ranges exist
/// the value is their running mean, then Wilder smoothing takes over.
pub fn atr<T: OHLCV>(bars: &[T], period: usize) -> Vec<f64> {
    let period = period.max(1);
    let mut out = Vec::with_capacity(bars.len());
    let mut value = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        let tr = if i == 0 {
            bar.range()
        } else {
            true_range(bars[i - 1].close(), bar.high(), bar.low())
        };

        let n = i + 1;
        value = if n <= period {
            value + (tr - value) / n as f64
        } else {
            (value * (period - 1) as f64 + tr) / period as f64
        };
        out.push(value);
    }

    out
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Candle;

    #[test]
    fn test_highest_lowest_window() {
        let values = [1.0, 5.0, 3.0, 2.0, 4.0];
        assert_eq!(highest(&values, 4, 3), 4.0);
        assert_eq!(highest(&values, 4, 5), 5.0);
        assert_eq!(lowest(&values, 4, 3), 2.0);
        assert_eq!(lowest(&values, 1, 10), 1.0);
    }

    #[test]
    fn test_pivot_high_strict() {
        let values = [1.0, 2.0, 5.0, 2.0, 1.0];
        assert_eq!(pivot_high(&values, 2, 2), Some(5.0));
        assert_eq!(pivot_high(&values, 1, 1), None);

        // Ties on either side do not confirm
        let flat = [1.0, 5.0, 5.0, 1.0];
        assert_eq!(pivot_high(&flat, 1, 1), None);
        assert_eq!(pivot_high(&flat, 2, 1), None);
    }

    #[test]
    fn test_pivot_low_window_bounds() {
        let values = [5.0, 4.0, 1.0, 4.0, 5.0];
        assert_eq!(pivot_low(&values, 2, 2), Some(1.0));
        assert_eq!(pivot_low(&values, 2, 3), None);
        assert_eq!(pivot_low(&values, 4, 1), None);
    }

    #[test]
    fn test_confirmed_pivot_uses_only_past_bars() {
        let values = [1.0, 2.0, 5.0, 2.0, 1.0, 9.0];
        assert_eq!(confirmed_pivot_high(&values, 4, 2), Some(5.0));
        assert_eq!(confirmed_pivot_high(&values, 3, 2), None);
        assert_eq!(confirmed_pivot_high(&values, 1, 2), None);
    }

    #[test]
    fn test_true_range_gap() {
        assert_eq!(true_range(10.0, 12.0, 11.0), 2.0);
        assert_eq!(true_range(10.0, 9.0, 8.0), 2.0);
        assert_eq!(true_range(10.0, 10.5, 9.0), 1.5);
    }

    #[test]
    fn test_atr_constant_range() {
        let bars: Vec<Candle> = (0..50)
            .map(|i| Candle {
                time: i,
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.0,
                volume: 0.0,
            })
            .collect();
        let values = atr(&bars, 14);
        assert_eq!(values.len(), 50);
        assert!(values.iter().all(|v| (v - 2.0).abs() < 1e-9));
    }
}
