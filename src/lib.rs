//! # smcstruct - Smart Money Concepts market structure
//!
//! Single-pass market-structure engine over OHLC candles: swing highs/lows at two
//! resolutions, Break of Structure / Change of Character events, bullish and bearish
//! order blocks, equal highs/lows and trailing strong/weak levels.
//!
//! ## Quick Start
//!
//! ```rust
//! use smcstruct::prelude::*;
//!
//! // Define your OHLCV data
//! struct Bar { o: f64, h: f64, l: f64, c: f64, t: i64 }
//!
//! impl OHLCV for Bar {
//!     fn open(&self) -> f64 { self.o }
//!     fn high(&self) -> f64 { self.h }
//!     fn low(&self) -> f64 { self.l }
//!     fn close(&self) -> f64 { self.c }
//!     fn volume(&self) -> f64 { 0.0 }
//!     fn timestamp(&self) -> Option<i64> { Some(self.t) }
//! }
//!
//! let engine = SmcBuilder::new()
//!     .swing_length(10)
//!     .equal_levels(true)
//!     .build()
//!     .unwrap();
//!
//! let bars: Vec<Bar> = (0..64)
//!     .map(|i| {
//!         let p = 100.0 + (i as f64 * 0.4).sin() * 5.0;
//!         Bar { o: p, h: p + 1.0, l: p - 1.0, c: p + 0.2, t: i as i64 * 60 }
//!     })
//!     .collect();
//! let atr = vec![2.0; bars.len()];
//!
//! let output = engine.scan(&bars, &atr).unwrap();
//! assert_eq!(output.records.len(), bars.len());
//! ```

pub mod params;
pub mod structure;

pub mod prelude {
    pub use crate::{
        // Parameters
        params::{get_count, get_period, get_threshold, ParamMeta, ParamType, Parameterized},
        // Parallel
        scan_parallel,
        // Structure components
        structure::{
            EqualKind, EqualLevel, LevelSnapshot, OrderBlock, OrderBlockList, ScanState, Series,
            StrongWeakLevels, SwingKind, SwingLabel, SwingPoint,
        },
        BarUpdate,
        BreakEvent,
        BreakKind,
        Candle,
        Direction,
        EqThreshold,
        OHLCVExt,
        Period,
        Resolution,
        Result,
        ScanError,
        ScanResult,
        Signal,
        SmcBuilder,
        SmcConfig,
        SmcEngine,
        SmcError,
        StructureIterator,
        StructureOutput,
        StructureRecord,
        OHLCV,
    };
}

use serde::{Deserialize, Serialize};
use tracing::debug;

use structure::{EqualLevel, OrderBlockList, ScanState, Series, StrongWeakLevels, SwingPoint};

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, SmcError>;

/// Errors returned before a scan starts
#[derive(Debug, Clone, thiserror::Error)]
pub enum SmcError {
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Mismatched input: {field} has {got} values, expected {expected}")]
    MismatchedInput {
        field: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Insufficient data: need {need} bars, got {got}")]
    InsufficientData { need: usize, got: usize },

    #[error("Invalid OHLCV at index {index}: {reason}")]
    InvalidOHLCV { index: usize, reason: &'static str },
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Period (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(SmcError::InvalidValue("Period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

/// Equal high/low tolerance in tenths of ATR (1..=5)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct EqThreshold(u8);

impl EqThreshold {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(SmcError::OutOfRange {
                field: "eq_threshold",
                value: value as f64,
                min: Self::MIN as f64,
                max: Self::MAX as f64,
            });
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: u8) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> u8 {
        self.0
    }

    /// Tolerance as a fraction of ATR (`threshold / 10`)
    #[inline]
    pub fn atr_fraction(self) -> f64 {
        self.0 as f64 / 10.0
    }
}

impl Serialize for EqThreshold {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> Deserialize<'de> for EqThreshold {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = u8::deserialize(d)?;
        EqThreshold::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// OHLCV TRAITS
// ============================================================

/// Core OHLCV data trait
pub trait OHLCV {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn volume(&self) -> f64;

    /// Bar time. Order blocks are identified by it; bars without one use their index.
    fn timestamp(&self) -> Option<i64> {
        None
    }
}

/// Extension trait with computed properties for OHLCV data
pub trait OHLCVExt: OHLCV {
    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    /// Validate OHLCV data consistency
    fn validate(&self) -> Result<()> {
        let values = [self.open(), self.high(), self.low(), self.close()];
        if values.iter().any(|v| v.is_nan()) {
            return Err(SmcError::InvalidOHLCV {
                index: 0,
                reason: "NaN in OHLCV",
            });
        }
        if values.iter().any(|v| v.is_infinite()) {
            return Err(SmcError::InvalidOHLCV {
                index: 0,
                reason: "Infinite value in OHLCV",
            });
        }
        if self.high() < self.low() {
            return Err(SmcError::InvalidOHLCV {
                index: 0,
                reason: "high < low",
            });
        }
        Ok(())
    }
}

impl<T: OHLCV> OHLCVExt for T {}

/// Plain candle, for callers holding column arrays rather than their own bar type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Zip index-aligned columns into candles. All columns must have the same length.
    pub fn from_slices(
        time: &[i64],
        open: &[f64],
        high: &[f64],
        low: &[f64],
        close: &[f64],
    ) -> Result<Vec<Candle>> {
        let expected = time.len();
        for (field, got) in [
            ("open", open.len()),
            ("high", high.len()),
            ("low", low.len()),
            ("close", close.len()),
        ] {
            if got != expected {
                return Err(SmcError::MismatchedInput {
                    field,
                    expected,
                    got,
                });
            }
        }

        Ok((0..expected)
            .map(|i| Candle {
                time: time[i],
                open: open[i],
                high: high[i],
                low: low[i],
                close: close[i],
                volume: 0.0,
            })
            .collect())
    }
}

impl OHLCV for Candle {
    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn timestamp(&self) -> Option<i64> {
        Some(self.time)
    }
}

// ============================================================
// STRUCTURE EVENTS
// ============================================================

/// Trend sign. Neutral only before the first break of a resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Bullish,
    #[default]
    Neutral,
    Bearish,
}

impl Direction {
    #[inline]
    pub fn is_bullish(self) -> bool {
        matches!(self, Direction::Bullish)
    }

    #[inline]
    pub fn is_bearish(self) -> bool {
        matches!(self, Direction::Bearish)
    }

    /// -1, 0 or 1
    #[inline]
    pub fn sign(self) -> i8 {
        match self {
            Direction::Bullish => 1,
            Direction::Neutral => 0,
            Direction::Bearish => -1,
        }
    }
}

/// Swing resolution: `Short` is the fixed 5-bar internal structure, `Long` uses `swing_length`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    Short,
    Long,
}

/// Kind of structural break
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BreakKind {
    HighBos,
    HighChoch,
    LowBos,
    LowChoch,
}

impl BreakKind {
    /// Close crossed above a swing high
    #[inline]
    pub fn is_bullish(self) -> bool {
        matches!(self, BreakKind::HighBos | BreakKind::HighChoch)
    }

    #[inline]
    pub fn is_choch(self) -> bool {
        matches!(self, BreakKind::HighChoch | BreakKind::LowChoch)
    }
}

/// A BOS/CHoCH event. The level is carried by every bar in `start_index..=end_index`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakEvent {
    pub kind: BreakKind,
    pub resolution: Resolution,
    pub level: f64,
    /// Origin bar of the broken swing
    pub start_index: usize,
    /// Bar whose close broke the level
    pub end_index: usize,
}

/// Per-bar classification derived from the breaks fired on that bar
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    Buy,
    #[default]
    Hold,
    Sell,
}

/// Per-bar output
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StructureRecord {
    pub high_short: Option<BreakEvent>,
    pub high_long: Option<BreakEvent>,
    pub low_short: Option<BreakEvent>,
    pub low_long: Option<BreakEvent>,
    pub equal_high: Option<f64>,
    pub equal_low: Option<f64>,
    /// Major trend after this bar
    pub major_trend: Direction,
    /// Minor trend after this bar
    pub minor_trend: Direction,
    pub signal: Signal,
}

impl StructureRecord {
    /// Break carried at this bar for one resolution and side
    pub fn break_at(&self, resolution: Resolution, bullish: bool) -> Option<&BreakEvent> {
        match (resolution, bullish) {
            (Resolution::Short, true) => self.high_short.as_ref(),
            (Resolution::Long, true) => self.high_long.as_ref(),
            (Resolution::Short, false) => self.low_short.as_ref(),
            (Resolution::Long, false) => self.low_long.as_ref(),
        }
    }

    /// Level of a specific break kind at this bar, if one is carried
    pub fn level(&self, kind: BreakKind, resolution: Resolution) -> Option<f64> {
        self.break_at(resolution, kind.is_bullish())
            .filter(|event| event.kind == kind)
            .map(|event| event.level)
    }

    fn carry(&mut self, event: BreakEvent) {
        let slot = match (event.resolution, event.kind.is_bullish()) {
            (Resolution::Short, true) => &mut self.high_short,
            (Resolution::Long, true) => &mut self.high_long,
            (Resolution::Short, false) => &mut self.low_short,
            (Resolution::Long, false) => &mut self.low_long,
        };
        *slot = Some(event);
    }
}

/// Everything one bar of the scan produced
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BarUpdate {
    pub index: usize,
    pub swings: Vec<SwingPoint>,
    pub breaks: Vec<BreakEvent>,
    pub equal_levels: Vec<EqualLevel>,
    pub major_trend: Direction,
    pub minor_trend: Direction,
}

impl BarUpdate {
    pub fn signal(&self) -> Signal {
        let bullish = self.breaks.iter().any(|b| b.kind.is_bullish());
        let bearish = self.breaks.iter().any(|b| !b.kind.is_bullish());
        match (bullish, bearish) {
            (true, false) => Signal::Buy,
            (false, true) => Signal::Sell,
            _ => Signal::Hold,
        }
    }
}

/// Result of a full scan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureOutput {
    pub records: Vec<StructureRecord>,
    /// Break events in firing order
    pub events: Vec<BreakEvent>,
    /// Confirmed swings in confirmation order
    pub swings: Vec<SwingPoint>,
    pub equal_levels: Vec<EqualLevel>,
    /// Newest first
    pub bullish_blocks: OrderBlockList,
    /// Newest first
    pub bearish_blocks: OrderBlockList,
    pub levels: StrongWeakLevels,
}

// ============================================================
// CONFIG
// ============================================================

/// Market structure parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmcConfig {
    /// Major swing lookback
    pub swing_length: Period,
    /// Order blocks kept per list beyond the newest one
    pub order_block_number: usize,
    pub eq_enable: bool,
    pub eq_bars_confirmation: Period,
    pub eq_threshold: EqThreshold,
}

impl Default for SmcConfig {
    fn default() -> Self {
        Self {
            swing_length: Period::new_const(50),
            order_block_number: 5,
            eq_enable: false,
            eq_bars_confirmation: Period::new_const(3),
            eq_threshold: EqThreshold::new_const(1),
        }
    }
}

impl SmcConfig {
    /// Checks invariants that `new_const` constructors can bypass
    pub fn validate(&self) -> Result<()> {
        if self.swing_length.get() == 0 {
            return Err(SmcError::InvalidConfig("swing_length must be > 0".into()));
        }
        if self.eq_bars_confirmation.get() == 0 {
            return Err(SmcError::InvalidConfig(
                "eq_bars_confirmation must be >= 1".into(),
            ));
        }
        let t = self.eq_threshold.get();
        if !(EqThreshold::MIN..=EqThreshold::MAX).contains(&t) {
            return Err(SmcError::InvalidConfig(format!(
                "eq_threshold must be in {}..={}, got {t}",
                EqThreshold::MIN,
                EqThreshold::MAX
            )));
        }
        Ok(())
    }
}

// ============================================================
// ENGINE
// ============================================================

/// Market structure engine. Immutable; every scan runs on a fresh [`ScanState`].
#[derive(Debug, Clone)]
pub struct SmcEngine {
    config: SmcConfig,
    validate_data: bool,
}

impl SmcEngine {
    pub fn config(&self) -> &SmcConfig {
        &self.config
    }

    // ===========================================
    // LOW-LEVEL: Primitives
    // ===========================================

    /// Validate inputs and build the column view a scan runs on.
    pub fn prepare<T: OHLCV>(&self, bars: &[T], atr: &[f64]) -> Result<Series> {
        let need = self.config.swing_length.get() + 1;
        if bars.len() < need {
            return Err(SmcError::InsufficientData {
                need,
                got: bars.len(),
            });
        }
        if self.validate_data {
            validate_bars(bars)?;
        }
        Series::from_bars(bars, atr)
    }

    /// Fresh state for an incremental scan over a prepared series.
    pub fn new_state(&self) -> ScanState {
        ScanState::new(&self.config)
    }

    // ===========================================
    // HIGH-LEVEL: Batch processing
    // ===========================================

    /// Scan all bars with a caller-supplied ATR series.
    pub fn scan<T: OHLCV>(&self, bars: &[T], atr: &[f64]) -> Result<StructureOutput> {
        let series = self.prepare(bars, atr)?;
        Ok(self.scan_series(&series))
    }

    /// Scan all bars, computing ATR(200) internally.
    pub fn scan_bars<T: OHLCV>(&self, bars: &[T]) -> Result<StructureOutput> {
        let atr = structure::atr(bars, structure::DEFAULT_ATR_PERIOD);
        self.scan(bars, &atr)
    }

    /// Scan an already prepared series.
    pub fn scan_series(&self, series: &Series) -> StructureOutput {
        let len = series.len();
        debug!(
            bars = len,
            swing_length = self.config.swing_length.get(),
            "scanning market structure"
        );

        let mut state = self.new_state();
        let mut records = vec![StructureRecord::default(); len];
        let mut events = Vec::new();
        let mut swings = Vec::new();
        let mut equal_levels = Vec::new();

        for i in 0..len {
            let update = state.step(series, i);

            for event in &update.breaks {
                for record in &mut records[event.start_index..=event.end_index] {
                    record.carry(*event);
                }
            }
            for level in &update.equal_levels {
                for record in &mut records[level.start_index..=level.end_index] {
                    match level.kind {
                        structure::EqualKind::High => record.equal_high = Some(level.value),
                        structure::EqualKind::Low => record.equal_low = Some(level.value),
                    }
                }
            }

            let record = &mut records[i];
            record.major_trend = update.major_trend;
            record.minor_trend = update.minor_trend;
            record.signal = update.signal();

            events.extend(update.breaks);
            swings.extend(update.swings);
            equal_levels.extend(update.equal_levels);
        }

        let (bullish_blocks, bearish_blocks, levels) = state.into_outputs();
        debug!(
            events = events.len(),
            swings = swings.len(),
            bullish_blocks = bullish_blocks.len(),
            bearish_blocks = bearish_blocks.len(),
            "scan complete"
        );

        StructureOutput {
            records,
            events,
            swings,
            equal_levels,
            bullish_blocks,
            bearish_blocks,
            levels,
        }
    }

    /// Iterate bar by bar over the scan.
    pub fn iter<T: OHLCV>(&self, bars: &[T], atr: &[f64]) -> Result<StructureIterator> {
        let series = self.prepare(bars, atr)?;
        Ok(StructureIterator::new(series, self.new_state()))
    }
}

fn validate_bars<T: OHLCV>(bars: &[T]) -> Result<()> {
    for (i, bar) in bars.iter().enumerate() {
        bar.validate().map_err(|e| match e {
            SmcError::InvalidOHLCV { reason, .. } => SmcError::InvalidOHLCV { index: i, reason },
            other => other,
        })?;
    }
    Ok(())
}

// ============================================================
// STRUCTURE ITERATOR
// ============================================================

/// Iterator over bars yielding what each bar produced
pub struct StructureIterator {
    series: Series,
    state: ScanState,
    current: usize,
}

impl StructureIterator {
    fn new(series: Series, state: ScanState) -> Self {
        Self {
            series,
            state,
            current: 0,
        }
    }

    /// State after the last yielded bar
    pub fn state(&self) -> &ScanState {
        &self.state
    }
}

impl Iterator for StructureIterator {
    type Item = BarUpdate;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.series.len() {
            return None;
        }

        let update = self.state.step(&self.series, self.current);
        self.current += 1;
        Some(update)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.series.len().saturating_sub(self.current);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for StructureIterator {}

// ============================================================
// BUILDER
// ============================================================

/// Builder for creating SmcEngine instances
#[derive(Debug, Clone, Default)]
pub struct SmcBuilder {
    config: SmcConfig,
    swing_length: Option<usize>,
    eq_bars_confirmation: Option<usize>,
    eq_threshold: Option<u8>,
    validate_data: bool,
}

impl SmcBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: SmcConfig) -> Self {
        self.config = config;
        self.swing_length = None;
        self.eq_bars_confirmation = None;
        self.eq_threshold = None;
        self
    }

    pub fn swing_length(mut self, length: usize) -> Self {
        self.swing_length = Some(length);
        self
    }

    pub fn order_block_number(mut self, number: usize) -> Self {
        self.config.order_block_number = number;
        self
    }

    /// Enable/disable equal high/low detection
    pub fn equal_levels(mut self, enable: bool) -> Self {
        self.config.eq_enable = enable;
        self
    }

    pub fn eq_bars_confirmation(mut self, bars: usize) -> Self {
        self.eq_bars_confirmation = Some(bars);
        self
    }

    pub fn eq_threshold(mut self, threshold: u8) -> Self {
        self.eq_threshold = Some(threshold);
        self
    }

    /// Enable/disable OHLCV validation before each scan
    pub fn validate_data(mut self, enable: bool) -> Self {
        self.validate_data = enable;
        self
    }

    /// Build the engine
    pub fn build(self) -> Result<SmcEngine> {
        let mut config = self.config;
        if let Some(length) = self.swing_length {
            config.swing_length = Period::new(length)
                .map_err(|_| SmcError::InvalidConfig("swing_length must be > 0".into()))?;
        }
        if let Some(bars) = self.eq_bars_confirmation {
            config.eq_bars_confirmation = Period::new(bars)
                .map_err(|_| SmcError::InvalidConfig("eq_bars_confirmation must be >= 1".into()))?;
        }
        if let Some(threshold) = self.eq_threshold {
            config.eq_threshold = EqThreshold::new(threshold)?;
        }
        config.validate()?;

        Ok(SmcEngine {
            config,
            validate_data: self.validate_data,
        })
    }
}

// ============================================================
// PARALLEL SCANNING
// ============================================================

use rayon::prelude::*;

/// Result of scanning a single instrument
#[derive(Debug)]
pub struct ScanResult {
    pub symbol: String,
    pub output: StructureOutput,
}

/// Error from scanning a single instrument
#[derive(Debug)]
pub struct ScanError {
    pub symbol: String,
    pub error: SmcError,
}

/// Parallel scanning of multiple instruments, each as `(symbol, bars, atr)`
pub fn scan_parallel<'a, T, I>(
    engine: &SmcEngine,
    instruments: I,
) -> (Vec<ScanResult>, Vec<ScanError>)
where
    T: OHLCV + Sync + 'a,
    I: IntoParallelIterator<Item = (&'a str, &'a [T], &'a [f64])>,
{
    let results: Vec<_> = instruments
        .into_par_iter()
        .map(|(symbol, bars, atr)| {
            engine
                .scan(bars, atr)
                .map(|output| ScanResult {
                    symbol: symbol.to_string(),
                    output,
                })
                .map_err(|error| ScanError {
                    symbol: symbol.to_string(),
                    error,
                })
        })
        .collect();

    let mut successes = Vec::new();
    let mut errors = Vec::new();

    for result in results {
        match result {
            Ok(r) => successes.push(r),
            Err(e) => errors.push(e),
        }
    }

    (successes, errors)
}

// ============================================================
// TESTS
// ============================================================
