//! Order block extraction and lifecycle
//!
//! On every structure break the candles between the broken swing and the breaking
//! bar are scanned for the extreme low-range candle, which becomes an order block.
//! Both lists are pruned every bar: blocks whose level was closed through are
//! removed, then anything past the capacity.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::helpers::ORDER_BLOCK_RANGE_FACTOR;
use super::Series;

// ============================================================
// ORDER BLOCK
// ============================================================

/// Candidate support/resistance candle. Identity is `(is_top, time)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderBlock {
    pub is_top: bool,
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl OrderBlock {
    fn from_bar(series: &Series, index: usize, is_top: bool) -> Self {
        Self {
            is_top,
            time: series.time[index],
            open: series.open[index],
            high: series.high[index],
            low: series.low[index],
            close: series.close[index],
        }
    }

    #[inline]
    pub fn identity(&self) -> (bool, i64) {
        (self.is_top, self.time)
    }

    /// Support closed below its close, or resistance closed above its high
    #[inline]
    pub fn is_invalidated_by(&self, close: f64) -> bool {
        if self.is_top {
            close > self.high
        } else {
            close < self.close
        }
    }
}

// ============================================================
// ORDER BLOCK LIST
// ============================================================

/// Newest-first list of order blocks with unique identities
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderBlockList {
    blocks: Vec<OrderBlock>,
}

impl OrderBlockList {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[OrderBlock] {
        &self.blocks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OrderBlock> {
        self.blocks.iter()
    }

    pub fn contains(&self, identity: (bool, i64)) -> bool {
        self.blocks.iter().any(|b| b.identity() == identity)
    }

    /// Prepend a block unless one with the same identity is already listed.
    /// Returns whether it was inserted.
    pub fn push_front(&mut self, block: OrderBlock) -> bool {
        if self.contains(block.identity()) {
            return false;
        }
        self.blocks.insert(0, block);
        true
    }

    /// Remove the block with this identity. Absent identities are a no-op.
    pub fn remove(&mut self, identity: (bool, i64)) -> Option<OrderBlock> {
        let pos = self.blocks.iter().position(|b| b.identity() == identity)?;
        Some(self.blocks.remove(pos))
    }

    /// Drop blocks invalidated by `close`, then every block positioned past
    /// `capacity` in the list as it stood before pruning. Returns the removed blocks.
    pub fn prune(&mut self, close: f64, capacity: usize) -> Vec<OrderBlock> {
        let mut removed = Vec::new();
        let mut position = 0;
        self.blocks.retain(|block| {
            let keep = !block.is_invalidated_by(close) && position <= capacity;
            position += 1;
            if !keep {
                removed.push(*block);
            }
            keep
        });
        removed
    }

    pub fn into_vec(self) -> Vec<OrderBlock> {
        self.blocks
    }
}

impl<'a> IntoIterator for &'a OrderBlockList {
    type Item = &'a OrderBlock;
    type IntoIter = std::slice::Iter<'a, OrderBlock>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

// ============================================================
// EXTRACTION
// ============================================================

/// Last candidate index per extraction direction
///
/// Both slots start empty rather than at bar 0: until a direction has produced a
/// candidate, a break with no qualifying candle falls back to the broken swing's
/// origin bar instead of the first bar of the series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionMemo {
    pub bullish: Option<usize>,
    pub bearish: Option<usize>,
}

impl ExtractionMemo {
    fn slot(&mut self, use_max: bool) -> &mut Option<usize> {
        if use_max {
            &mut self.bearish
        } else {
            &mut self.bullish
        }
    }
}

/// Pick the order block candle for a break at `break_index` of a swing formed at
/// `origin`.
///
/// Scans `break_index` down to `origin` over candles whose range is below twice
/// their ATR, keeping the highest high (`use_max`) or the lowest low. Without any
/// qualifying candle the memo's last candidate is reused, or `origin` if there is none.
pub fn extract(
    series: &Series,
    use_max: bool,
    break_index: usize,
    origin: usize,
    memo: &mut ExtractionMemo,
) -> OrderBlock {
    let slot = memo.slot(use_max);
    let mut extreme: Option<f64> = None;
    let mut candidate = None;

    for k in (origin..=break_index).rev() {
        let range = series.high[k] - series.low[k];
        if range >= ORDER_BLOCK_RANGE_FACTOR * series.atr[k] {
            continue;
        }

        let value = if use_max { series.high[k] } else { series.low[k] };
        let better = match extreme {
            None => true,
            Some(e) if use_max => value > e,
            Some(e) => value < e,
        };
        if better {
            extreme = Some(value);
            candidate = Some(k);
            *slot = Some(k);
        }
    }

    let index = candidate.or(*slot).unwrap_or(origin);
    OrderBlock::from_bar(series, index, use_max)
}

/// Extract a block and add it to `list`, logging the insertion.
pub fn extract_into(
    list: &mut OrderBlockList,
    series: &Series,
    use_max: bool,
    break_index: usize,
    origin: usize,
    memo: &mut ExtractionMemo,
) {
    let block = extract(series, use_max, break_index, origin, memo);
    if list.push_front(block) {
        debug!(
            is_top = block.is_top,
            time = block.time,
            high = block.high,
            low = block.low,
            "order block added"
        );
    }
}

// ============================================================
// TESTS
// ============================================================
