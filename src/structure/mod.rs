//! Market structure components
//!
//! One forward pass drives these, leaves first:
//!
//! - **helpers**: rolling extremes, pivots and ATR
//! - **swing**: sticky swing oscillator at two resolutions
//! - **breaks**: trend sign, armed flags and BOS/CHoCH classification
//! - **order_block**: extraction on each break and per-bar pruning
//! - **equal_levels**: equal highs/lows within an ATR tolerance
//! - **levels**: trailing strong/weak highs and lows
//! - **state**: [`ScanState`], the per-run state threaded through the pass

pub mod helpers;

pub mod breaks;
pub mod equal_levels;
pub mod levels;
pub mod order_block;
pub mod series;
pub mod state;
pub mod swing;

pub use breaks::{BreakTracker, SwingLevel};
pub use equal_levels::{EqualKind, EqualLevel, EqualLevelDetector};
pub use helpers::*;
pub use levels::{LevelSnapshot, StrongWeakLevels, TrailingExtremes};
pub use order_block::{ExtractionMemo, OrderBlock, OrderBlockList};
pub use series::Series;
pub use state::ScanState;
pub use swing::{SwingDetector, SwingKind, SwingLabel, SwingPoint, SwingSide};
