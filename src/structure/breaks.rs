//! Trend state and BOS/CHoCH classification
//!
//! Each resolution remembers its latest swing high and low. A close crossing a
//! remembered level fires once per swing: the level's armed flag is cleared by the
//! break and set again only when a new swing of the same kind is confirmed.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Series, SwingKind, SwingPoint};
use crate::{BreakEvent, BreakKind, Direction, Resolution};

/// A remembered swing level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingLevel {
    pub value: f64,
    pub origin: usize,
}

/// Trend tracker and break classifier for one resolution
#[derive(Debug, Clone)]
pub struct BreakTracker {
    resolution: Resolution,
    trend: Direction,
    top: Option<SwingLevel>,
    bottom: Option<SwingLevel>,
    top_armed: bool,
    bottom_armed: bool,
}

impl BreakTracker {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            trend: Direction::Neutral,
            top: None,
            bottom: None,
            top_armed: true,
            bottom_armed: true,
        }
    }

    #[inline]
    pub fn trend(&self) -> Direction {
        self.trend
    }

    #[inline]
    pub fn top(&self) -> Option<SwingLevel> {
        self.top
    }

    #[inline]
    pub fn bottom(&self) -> Option<SwingLevel> {
        self.bottom
    }

    #[inline]
    pub fn top_armed(&self) -> bool {
        self.top_armed
    }

    #[inline]
    pub fn bottom_armed(&self) -> bool {
        self.bottom_armed
    }

    /// Remember a newly confirmed swing and re-arm its side.
    pub fn on_swing(&mut self, swing: &SwingPoint) {
        let level = SwingLevel {
            value: swing.value,
            origin: swing.origin_index,
        };
        match swing.kind {
            SwingKind::Top => {
                self.top = Some(level);
                self.top_armed = true;
            },
            SwingKind::Bottom => {
                self.bottom = Some(level);
                self.bottom_armed = true;
            },
        }
    }

    /// Check bar `index` for breaks of the remembered levels.
    ///
    /// `reference` is the major tracker when this one is the minor: a minor level
    /// equal to the major level of the same side does not fire.
    pub fn detect(
        &mut self,
        series: &Series,
        index: usize,
        reference: Option<&BreakTracker>,
    ) -> [Option<BreakEvent>; 2] {
        if index == 0 {
            return [None, None];
        }
        let close = series.close[index];
        let prev_close = series.close[index - 1];

        let mut bullish = None;
        if let Some(top) = self.top {
            let distinct = reference.map_or(true, |r| r.top.map(|t| t.value) != Some(top.value));
            if self.top_armed && distinct && close > top.value && prev_close < top.value {
                let kind = if self.trend.is_bearish() {
                    BreakKind::HighChoch
                } else {
                    BreakKind::HighBos
                };
                self.top_armed = false;
                self.trend = Direction::Bullish;
                bullish = Some(self.event(kind, top, index));
            }
        }

        let mut bearish = None;
        if let Some(bottom) = self.bottom {
            let distinct =
                reference.map_or(true, |r| r.bottom.map(|b| b.value) != Some(bottom.value));
            if self.bottom_armed && distinct && close < bottom.value && prev_close > bottom.value {
                let kind = if self.trend.is_bullish() {
                    BreakKind::LowChoch
                } else {
                    BreakKind::LowBos
                };
                self.bottom_armed = false;
                self.trend = Direction::Bearish;
                bearish = Some(self.event(kind, bottom, index));
            }
        }

        [bullish, bearish]
    }

    fn event(&self, kind: BreakKind, level: SwingLevel, index: usize) -> BreakEvent {
        debug!(
            resolution = ?self.resolution,
            kind = ?kind,
            level = level.value,
            origin = level.origin,
            index,
            "structure break"
        );
        BreakEvent {
            kind,
            resolution: self.resolution,
            level: level.value,
            start_index: level.origin,
            end_index: index,
        }
    }
}
