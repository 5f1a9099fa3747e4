//! Equal highs and lows
//!
//! Consecutive confirmed pivots closer than `threshold / 10` ATR mark a liquidity
//! zone spanning from the earlier pivot to the later one.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::helpers::{confirmed_pivot_high, confirmed_pivot_low};
use super::Series;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EqualKind {
    High,
    Low,
}

/// An equal-high or equal-low zone. `value` is the earlier pivot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EqualLevel {
    pub kind: EqualKind,
    pub value: f64,
    pub start_index: usize,
    pub end_index: usize,
}

#[derive(Debug, Clone, Copy)]
struct Pivot {
    value: f64,
    origin: usize,
}

#[derive(Debug, Clone)]
pub struct EqualLevelDetector {
    confirmation: usize,
    atr_fraction: f64,
    prev_top: Option<Pivot>,
    prev_bottom: Option<Pivot>,
}

impl EqualLevelDetector {
    pub fn new(confirmation: usize, atr_fraction: f64) -> Self {
        Self {
            confirmation,
            atr_fraction,
            prev_top: None,
            prev_bottom: None,
        }
    }

    /// Check the pivots confirmed on bar `index`; returns the zones they close.
    pub fn update(&mut self, series: &Series, index: usize) -> Vec<EqualLevel> {
        let mut zones = Vec::new();
        let k = self.confirmation;
        let tolerance = series.atr[index] * self.atr_fraction;

        if let Some(top) = confirmed_pivot_high(&series.high, index, k) {
            let origin = index - k;
            if let Some(prev) = self.prev_top {
                let max = top.max(prev.value);
                let min = top.min(prev.value);
                if max < min + tolerance {
                    zones.push(EqualLevel {
                        kind: EqualKind::High,
                        value: prev.value,
                        start_index: prev.origin,
                        end_index: origin,
                    });
                }
            }
            self.prev_top = Some(Pivot { value: top, origin });
        }

        if let Some(bottom) = confirmed_pivot_low(&series.low, index, k) {
            let origin = index - k;
            if let Some(prev) = self.prev_bottom {
                let max = bottom.max(prev.value);
                let min = bottom.min(prev.value);
                if min > max - tolerance {
                    zones.push(EqualLevel {
                        kind: EqualKind::Low,
                        value: prev.value,
                        start_index: prev.origin,
                        end_index: origin,
                    });
                }
            }
            self.prev_bottom = Some(Pivot {
                value: bottom,
                origin,
            });
        }

        for zone in &zones {
            debug!(
                kind = ?zone.kind,
                value = zone.value,
                start = zone.start_index,
                end = zone.end_index,
                "equal level"
            );
        }
        zones
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(highs: &[f64], lows: &[f64], atr: f64) -> Series {
        let n = highs.len();
        Series {
            open: lows.to_vec(),
            high: highs.to_vec(),
            low: lows.to_vec(),
            close: lows.to_vec(),
            time: (0..n as i64).collect(),
            atr: vec![atr; n],
        }
    }

    fn run(detector: &mut EqualLevelDetector, s: &Series) -> Vec<EqualLevel> {
        (0..s.len()).flat_map(|i| detector.update(s, i)).collect()
    }

    #[test]
    fn test_equal_highs_within_tolerance() {
        let highs = [100.0, 105.0, 100.0, 98.0, 100.0, 105.05, 100.0, 99.0];
        let lows = [90.0; 8];
        let s = series(&highs, &lows, 1.0);
        let mut detector = EqualLevelDetector::new(1, 0.1);

        let zones = run(&mut detector, &s);
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].kind, EqualKind::High);
        assert_eq!(zones[0].value, 105.0);
        assert_eq!((zones[0].start_index, zones[0].end_index), (1, 5));
    }

    #[test]
    fn test_distant_highs_do_not_match() {
        let highs = [100.0, 105.0, 100.0, 98.0, 100.0, 106.0, 100.0, 99.0];
        let lows = [90.0; 8];
        let s = series(&highs, &lows, 1.0);
        let mut detector = EqualLevelDetector::new(1, 0.1);
        assert!(run(&mut detector, &s).is_empty());
    }

    #[test]
    fn test_equal_lows() {
        let highs = [110.0; 8];
        let lows = [100.0, 95.0, 100.0, 101.0, 100.0, 95.02, 100.0, 101.0];
        let s = series(&highs, &lows, 1.0);
        let mut detector = EqualLevelDetector::new(1, 0.1);

        let zones = run(&mut detector, &s);
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].kind, EqualKind::Low);
        assert_eq!(zones[0].value, 95.0);
    }

    #[test]
    fn test_previous_pivot_always_replaced() {
        // 105, then 110 (no match), then 110.05 matches 110 rather than 105
        let highs = [100.0, 105.0, 100.0, 110.0, 100.0, 110.05, 100.0];
        let lows = [90.0; 7];
        let s = series(&highs, &lows, 1.0);
        let mut detector = EqualLevelDetector::new(1, 0.1);

        let zones = run(&mut detector, &s);
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].value, 110.0);
        assert_eq!(zones[0].start_index, 3);
    }
}
