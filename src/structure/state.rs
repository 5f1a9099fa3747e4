//! Per-run scan state
//!
//! Everything mutable during a scan lives here and is created fresh for each run,
//! so an engine can be reused without leaking state between scans.

use tracing::debug;

use super::helpers::MINOR_SWING_LENGTH;
use super::order_block::extract_into;
use super::{
    BreakTracker, EqualLevelDetector, ExtractionMemo, OrderBlockList, Series, StrongWeakLevels,
    SwingDetector, TrailingExtremes,
};
use crate::{BarUpdate, Direction, Resolution, SmcConfig};

/// State threaded through one forward pass
#[derive(Debug, Clone)]
pub struct ScanState {
    order_block_number: usize,
    major_swings: SwingDetector,
    minor_swings: SwingDetector,
    major: BreakTracker,
    minor: BreakTracker,
    memo: ExtractionMemo,
    bullish: OrderBlockList,
    bearish: OrderBlockList,
    equal: Option<EqualLevelDetector>,
    trail: TrailingExtremes,
    levels: StrongWeakLevels,
}

impl ScanState {
    pub fn new(config: &SmcConfig) -> Self {
        let equal = config.eq_enable.then(|| {
            EqualLevelDetector::new(
                config.eq_bars_confirmation.get(),
                config.eq_threshold.atr_fraction(),
            )
        });

        Self {
            order_block_number: config.order_block_number,
            major_swings: SwingDetector::new(config.swing_length.get(), Resolution::Long),
            minor_swings: SwingDetector::new(MINOR_SWING_LENGTH, Resolution::Short),
            major: BreakTracker::new(Resolution::Long),
            minor: BreakTracker::new(Resolution::Short),
            memo: ExtractionMemo::default(),
            bullish: OrderBlockList::new(),
            bearish: OrderBlockList::new(),
            equal,
            trail: TrailingExtremes::default(),
            levels: StrongWeakLevels::default(),
        }
    }

    /// Process bar `index`. Bars must be stepped in order starting from 0.
    pub fn step(&mut self, series: &Series, index: usize) -> BarUpdate {
        let mut update = BarUpdate {
            index,
            ..BarUpdate::default()
        };

        // Swings
        if let Some(swing) = self.major_swings.update(series, index) {
            self.major.on_swing(&swing);
            update.swings.push(swing);
        }
        if let Some(swing) = self.minor_swings.update(series, index) {
            self.minor.on_swing(&swing);
            update.swings.push(swing);
        }

        self.trail.update(series, index);

        // Minor breaks. Tops feed the bullish list, bottoms the bearish list.
        let [bull, bear] = self.minor.detect(series, index, Some(&self.major));
        if let Some(event) = bull {
            extract_into(
                &mut self.bullish,
                series,
                false,
                index,
                event.start_index,
                &mut self.memo,
            );
            update.breaks.push(event);
        }
        if let Some(event) = bear {
            extract_into(
                &mut self.bearish,
                series,
                true,
                index,
                event.start_index,
                &mut self.memo,
            );
            update.breaks.push(event);
        }

        // Major breaks feed the opposite lists.
        let [bull, bear] = self.major.detect(series, index, None);
        if let Some(event) = bull {
            extract_into(
                &mut self.bearish,
                series,
                false,
                index,
                event.start_index,
                &mut self.memo,
            );
            update.breaks.push(event);
        }
        if let Some(event) = bear {
            extract_into(
                &mut self.bullish,
                series,
                true,
                index,
                event.start_index,
                &mut self.memo,
            );
            update.breaks.push(event);
        }

        let close = series.close[index];
        for (name, list) in [("bullish", &mut self.bullish), ("bearish", &mut self.bearish)] {
            for block in list.prune(close, self.order_block_number) {
                debug!(
                    list = name,
                    time = block.time,
                    is_top = block.is_top,
                    index,
                    "order block removed"
                );
            }
        }

        if let Some(equal) = self.equal.as_mut() {
            update.equal_levels = equal.update(series, index);
        }

        self.trail.snapshot(series, self.major.trend(), &mut self.levels);

        update.major_trend = self.major.trend();
        update.minor_trend = self.minor.trend();
        update
    }

    pub fn major_trend(&self) -> Direction {
        self.major.trend()
    }

    pub fn minor_trend(&self) -> Direction {
        self.minor.trend()
    }

    pub fn major(&self) -> &BreakTracker {
        &self.major
    }

    pub fn minor(&self) -> &BreakTracker {
        &self.minor
    }

    pub fn major_swings(&self) -> &SwingDetector {
        &self.major_swings
    }

    pub fn minor_swings(&self) -> &SwingDetector {
        &self.minor_swings
    }

    pub fn bullish_blocks(&self) -> &OrderBlockList {
        &self.bullish
    }

    pub fn bearish_blocks(&self) -> &OrderBlockList {
        &self.bearish
    }

    pub fn levels(&self) -> &StrongWeakLevels {
        &self.levels
    }

    /// Durable outputs: bullish list, bearish list, strong/weak levels
    pub fn into_outputs(self) -> (OrderBlockList, OrderBlockList, StrongWeakLevels) {
        (self.bullish, self.bearish, self.levels)
    }
}
