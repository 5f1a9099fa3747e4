//! Strong/weak high and low tracking
//!
//! The running extremes of the whole series are labelled by the major trend: the
//! high is strong while the trend is bearish, the low while it is bullish.

use serde::{Deserialize, Serialize};

use super::Series;
use crate::Direction;

/// A price level and the time of the bar that set it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    pub time: i64,
    pub value: f64,
}

/// Latest snapshot per category; `None` until first written
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StrongWeakLevels {
    pub strong_high: Option<LevelSnapshot>,
    pub weak_high: Option<LevelSnapshot>,
    pub strong_low: Option<LevelSnapshot>,
    pub weak_low: Option<LevelSnapshot>,
}

/// Running max of highs and min of lows since the first bar
#[derive(Debug, Clone, Copy, Default)]
pub struct TrailingExtremes {
    up: Option<(f64, usize)>,
    down: Option<(f64, usize)>,
}

impl TrailingExtremes {
    pub fn update(&mut self, series: &Series, index: usize) {
        let high = series.high[index];
        let up = self.up.map_or(high, |(v, _)| v.max(high));
        let up_origin = match self.up {
            Some((_, origin)) if up != high => origin,
            _ => index,
        };
        self.up = Some((up, up_origin));

        let low = series.low[index];
        let down = self.down.map_or(low, |(v, _)| v.min(low));
        let down_origin = match self.down {
            Some((_, origin)) if down != low => origin,
            _ => index,
        };
        self.down = Some((down, down_origin));
    }

    /// `(value, origin index)` of the running high
    pub fn up(&self) -> Option<(f64, usize)> {
        self.up
    }

    pub fn down(&self) -> Option<(f64, usize)> {
        self.down
    }

    /// Overwrite the snapshots for the current major trend.
    pub fn snapshot(&self, series: &Series, trend: Direction, levels: &mut StrongWeakLevels) {
        if let Some((value, origin)) = self.up {
            let snap = LevelSnapshot {
                time: series.time[origin],
                value,
            };
            if trend.is_bearish() {
                levels.strong_high = Some(snap);
            } else {
                levels.weak_high = Some(snap);
            }
        }

        if let Some((value, origin)) = self.down {
            let snap = LevelSnapshot {
                time: series.time[origin],
                value,
            };
            if trend.is_bullish() {
                levels.strong_low = Some(snap);
            } else {
                levels.weak_low = Some(snap);
            }
        }
    }
}
