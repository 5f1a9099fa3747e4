//! Swing detection
//!
//! A swing is confirmed `length` bars after it formed: the bar `length` back is
//! compared with the extremes of the `length` bars after it. A sticky two-valued
//! oscillator records which side last made a new extreme, and a swing is emitted
//! only when the oscillator changes side.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::helpers::{highest, lowest};
use super::Series;
use crate::Resolution;

/// Side of the sticky swing oscillator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwingSide {
    /// Last extreme was a high (`os = 0`)
    #[default]
    Top,
    /// Last extreme was a low (`os = 1`)
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwingKind {
    Top,
    Bottom,
}

/// Swing compared with the previous swing of the same kind and resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwingLabel {
    HigherHigh,
    LowerHigh,
    HigherLow,
    LowerLow,
}

impl SwingLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            SwingLabel::HigherHigh => "HH",
            SwingLabel::LowerHigh => "LH",
            SwingLabel::HigherLow => "HL",
            SwingLabel::LowerLow => "LL",
        }
    }
}

/// A confirmed swing high or low
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingPoint {
    pub kind: SwingKind,
    pub resolution: Resolution,
    pub value: f64,
    /// Bar the swing formed on
    pub origin_index: usize,
    /// Bar the swing was confirmed on
    pub confirmed_index: usize,
    pub label: SwingLabel,
}

/// Swing detector for one resolution
#[derive(Debug, Clone)]
pub struct SwingDetector {
    length: usize,
    resolution: Resolution,
    side: SwingSide,
    last_top: Option<f64>,
    last_bottom: Option<f64>,
}

impl SwingDetector {
    pub fn new(length: usize, resolution: Resolution) -> Self {
        Self {
            length,
            resolution,
            side: SwingSide::Top,
            last_top: None,
            last_bottom: None,
        }
    }

    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn side(&self) -> SwingSide {
        self.side
    }

    /// Advance the oscillator to bar `index`; returns the swing confirmed on it.
    pub fn update(&mut self, series: &Series, index: usize) -> Option<SwingPoint> {
        // Warm-up: no bar `length` back yet
        if index < self.length {
            return None;
        }

        let origin = index - self.length;
        let h = series.high[origin];
        let l = series.low[origin];
        let upper = highest(&series.high, index, self.length);
        let lower = lowest(&series.low, index, self.length);

        let previous = self.side;
        if h > upper {
            self.side = SwingSide::Top;
        } else if l < lower {
            self.side = SwingSide::Bottom;
        }

        if self.side == previous {
            return None;
        }

        let swing = match self.side {
            SwingSide::Top => {
                let label = match self.last_top {
                    Some(prev) if h <= prev => SwingLabel::LowerHigh,
                    _ => SwingLabel::HigherHigh,
                };
                self.last_top = Some(h);
                SwingPoint {
                    kind: SwingKind::Top,
                    resolution: self.resolution,
                    value: h,
                    origin_index: origin,
                    confirmed_index: index,
                    label,
                }
            },
            SwingSide::Bottom => {
                let label = match self.last_bottom {
                    Some(prev) if l >= prev => SwingLabel::HigherLow,
                    _ => SwingLabel::LowerLow,
                };
                self.last_bottom = Some(l);
                SwingPoint {
                    kind: SwingKind::Bottom,
                    resolution: self.resolution,
                    value: l,
                    origin_index: origin,
                    confirmed_index: index,
                    label,
                }
            },
        };

        trace!(
            resolution = ?swing.resolution,
            kind = ?swing.kind,
            value = swing.value,
            origin = swing.origin_index,
            label = swing.label.as_str(),
            "swing confirmed"
        );
        Some(swing)
    }
}
