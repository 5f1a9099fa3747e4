//! Column view of the input bars

use crate::{Result, SmcError, OHLCV};

/// Index-aligned columns one scan reads from
///
/// Only [`Series::from_bars`] builds one, so every column has the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub(crate) open: Vec<f64>,
    pub(crate) high: Vec<f64>,
    pub(crate) low: Vec<f64>,
    pub(crate) close: Vec<f64>,
    /// Bar timestamps, or the bar index when a bar has none
    pub(crate) time: Vec<i64>,
    pub(crate) atr: Vec<f64>,
}

impl Series {
    pub fn from_bars<T: OHLCV>(bars: &[T], atr: &[f64]) -> Result<Self> {
        if atr.len() != bars.len() {
            return Err(SmcError::MismatchedInput {
                field: "atr",
                expected: bars.len(),
                got: atr.len(),
            });
        }

        let len = bars.len();
        let mut series = Series {
            open: Vec::with_capacity(len),
            high: Vec::with_capacity(len),
            low: Vec::with_capacity(len),
            close: Vec::with_capacity(len),
            time: Vec::with_capacity(len),
            atr: atr.to_vec(),
        };

        for (i, bar) in bars.iter().enumerate() {
            series.open.push(bar.open());
            series.high.push(bar.high());
            series.low.push(bar.low());
            series.close.push(bar.close());
            series.time.push(bar.timestamp().unwrap_or(i as i64));
        }

        Ok(series)
    }

    #[inline]
    pub fn open(&self) -> &[f64] {
        &self.open
    }

    #[inline]
    pub fn high(&self) -> &[f64] {
        &self.high
    }

    #[inline]
    pub fn low(&self) -> &[f64] {
        &self.low
    }

    #[inline]
    pub fn close(&self) -> &[f64] {
        &self.close
    }

    #[inline]
    pub fn time(&self) -> &[i64] {
        &self.time
    }

    #[inline]
    pub fn atr(&self) -> &[f64] {
        &self.atr
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.close.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }
}
