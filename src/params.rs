//! Parameter metadata for the structure engine
//!
//! This module provides metadata about configuration parameters, enabling:
//! - Grid search optimization
//! - Parameter documentation
//! - Construction from loosely typed maps
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use smcstruct::params::Parameterized;
//! use smcstruct::prelude::*;
//!
//! for param in SmcConfig::param_meta() {
//!     println!("{}: {:?} (default: {})", param.name, param.param_type, param.default);
//! }
//!
//! let mut params = HashMap::new();
//! params.insert("swing_length", 20.0);
//! let config = SmcConfig::with_params(&params).unwrap();
//! assert_eq!(config.swing_length.get(), 20);
//! ```

use std::collections::HashMap;

use crate::{EqThreshold, Period, Result, SmcConfig, SmcError};

// ============================================================
// PARAMETER TYPES
// ============================================================

/// Type of parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
  /// Period value (positive integer)
  Period,
  /// Non-negative integer count
  Count,
  /// Equal-level threshold in tenths of ATR (1..=5)
  Threshold,
  /// Boolean switch, non-zero means enabled
  Flag,
}

/// Metadata for a single parameter
#[derive(Debug, Clone)]
pub struct ParamMeta {
  /// Parameter name (e.g., "swing_length")
  pub name: &'static str,
  pub param_type: ParamType,
  pub default: f64,
  /// Range for optimization: (min, max, step)
  pub range: (f64, f64, f64),
  /// Human-readable description
  pub description: &'static str,
}

impl ParamMeta {
  pub const fn new(
    name: &'static str,
    param_type: ParamType,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type, default, range, description }
  }

  /// Generate all values for grid search
  pub fn generate_grid(&self) -> Vec<f64> {
    let (min, max, step) = self.range;
    let mut values = Vec::new();
    let mut v = min;
    while v <= max + f64::EPSILON {
      values.push(v);
      v += step;
    }
    values
  }

  /// Validate a value for this parameter
  pub fn validate(&self, value: f64) -> Result<()> {
    let (min, max, _) = self.range;
    if value < min || value > max {
      return Err(SmcError::OutOfRange { field: self.name, value, min, max });
    }
    match self.param_type {
      ParamType::Flag => Ok(()),
      ParamType::Period | ParamType::Count | ParamType::Threshold => {
        if value.fract() != 0.0 {
          return Err(SmcError::InvalidValue("Integer parameter must be a whole number"));
        }
        Ok(())
      },
    }
  }
}

// ============================================================
// PARAMETERIZED TRAIT
// ============================================================

/// Types constructible from a parameter map
pub trait Parameterized: Sized {
  /// Returns metadata for all configurable parameters
  fn param_meta() -> &'static [ParamMeta];

  /// Creates a value from a HashMap
  ///
  /// Missing parameters use their default values.
  fn with_params(params: &HashMap<&str, f64>) -> Result<Self>;
}

static SMC_PARAMS: [ParamMeta; 5] = [
  ParamMeta::new(
    "swing_length",
    ParamType::Period,
    50.0,
    (10.0, 100.0, 10.0),
    "Lookback of the major swing detector",
  ),
  ParamMeta::new(
    "order_block_number",
    ParamType::Count,
    5.0,
    (1.0, 10.0, 1.0),
    "Order blocks kept per list beyond the newest",
  ),
  ParamMeta::new("eq_enable", ParamType::Flag, 0.0, (0.0, 1.0, 1.0), "Detect equal highs/lows"),
  ParamMeta::new(
    "eq_bars_confirmation",
    ParamType::Period,
    3.0,
    (1.0, 10.0, 1.0),
    "Bars on each side confirming an equal-level pivot",
  ),
  ParamMeta::new(
    "eq_threshold",
    ParamType::Threshold,
    1.0,
    (1.0, 5.0, 1.0),
    "Equal-level tolerance in tenths of ATR",
  ),
];

impl Parameterized for SmcConfig {
  fn param_meta() -> &'static [ParamMeta] {
    &SMC_PARAMS
  }

  fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
    let defaults = SmcConfig::default();
    let config = SmcConfig {
      swing_length: get_period(params, "swing_length", defaults.swing_length.get())?,
      order_block_number: get_count(params, "order_block_number", defaults.order_block_number)?,
      eq_enable: params.get("eq_enable").map_or(defaults.eq_enable, |v| *v != 0.0),
      eq_bars_confirmation: get_period(
        params,
        "eq_bars_confirmation",
        defaults.eq_bars_confirmation.get(),
      )?,
      eq_threshold: get_threshold(params, "eq_threshold", defaults.eq_threshold.get())?,
    };
    config.validate()?;
    Ok(config)
  }
}

// ============================================================
// PARAMETER VALUE HELPERS
// ============================================================

/// Helper to get a Period from params with default fallback
pub fn get_period(params: &HashMap<&str, f64>, key: &str, default: usize) -> Result<Period> {
  let value = params.get(key).copied().unwrap_or(default as f64);
  if value < 0.0 || value.fract() != 0.0 {
    return Err(SmcError::InvalidValue("Period must be a positive integer"));
  }
  Period::new(value as usize)
}

/// Helper to get a non-negative count from params with default fallback
pub fn get_count(params: &HashMap<&str, f64>, key: &str, default: usize) -> Result<usize> {
  let value = params.get(key).copied().unwrap_or(default as f64);
  if value < 0.0 || value.fract() != 0.0 {
    return Err(SmcError::InvalidValue("Count must be a non-negative integer"));
  }
  Ok(value as usize)
}

/// Helper to get an EqThreshold from params with default fallback
pub fn get_threshold(params: &HashMap<&str, f64>, key: &str, default: u8) -> Result<EqThreshold> {
  let value = params.get(key).copied().unwrap_or(default as f64);
  if value.fract() != 0.0 || !(0.0..=u8::MAX as f64).contains(&value) {
    return Err(SmcError::OutOfRange {
      field: "eq_threshold",
      value,
      min: EqThreshold::MIN as f64,
      max: EqThreshold::MAX as f64,
    });
  }
  EqThreshold::new(value as u8)
}

// ============================================================
// TESTS
// ============================================================
