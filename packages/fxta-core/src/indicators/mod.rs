//! Indicator kernels.
//!
//! Two contracts live here:
//! - [`StreamingIndicator`]: bar-by-bar state machines with `update_last`
//!   for the still-forming bar (MA, RSI, ATR, MACD, Bollinger)
//! - [`Indicator`]: batch calculation over a [`KlineFrame`] with explicit
//!   lookback/lookforward, implemented by every kernel

pub mod atr;
pub mod boll;
pub mod fractals;
pub mod ichimoku;
pub mod ma;
pub mod macd;
pub mod mama;
pub mod murrey;
pub mod oscillators;
pub mod pivot;
pub mod regression;
pub mod registry;
pub mod rsi;
pub mod stochastic;
pub mod supertrend;
pub mod td;
pub mod zigzag;

pub use atr::{Atr, AtrIndicator};
pub use boll::{Bollinger, BollingerIndicator};
pub use fractals::Fractals;
pub use ichimoku::Ichimoku;
pub use ma::{moving_average, Ma, MaType, MovingAverage};
pub use macd::{Macd, MacdIndicator};
pub use mama::Mama;
pub use murrey::MurreyChannels;
pub use oscillators::{Cci, Momentum, WilliamsR};
pub use pivot::{PivotKind, PivotPoints};
pub use regression::{LinearRegression, RegressionChannel};
pub use registry::{catalog, IndicatorSpec};
pub use rsi::{Rsi, RsiIndicator};
pub use stochastic::Stochastic;
pub use supertrend::SuperTrend;
pub use td::{TdCombo, TdSequential, TdSetup};
pub use zigzag::ZigZag;

use std::fmt;

use tracing::debug;

use crate::error::{IndicatorError, Result};
use crate::kline::{Kline, KlineFrame};

/// Bar-by-bar indicator.
pub trait StreamingIndicator {
    /// Appends a closed bar.
    fn add(&mut self, kline: &Kline);

    /// Replaces the newest bar. The result equals adding `kline` in its place.
    fn update_last(&mut self, kline: &Kline);

    /// Value at `index` (-1 newest, 0 oldest kept). NaN when unavailable.
    fn get_value(&self, index: i32) -> f64;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Batch indicator over a bar series.
pub trait Indicator: Send + Sync + fmt::Debug {
    /// Display name including parameters, e.g. `SMA(14)`.
    fn name(&self) -> String;

    /// Bars before the first defined output.
    fn lookback(&self) -> usize;

    /// Bars after an output bar that its value depends on.
    fn lookforward(&self) -> usize {
        0
    }

    /// Names of the output series in the order `calculate` returns them.
    fn output_names(&self) -> &'static [&'static str];

    /// Whether a value depends on all earlier bars (counters, swing detection,
    /// sessions) rather than on `lookback` bars only.
    fn uses_full_history(&self) -> bool {
        false
    }

    /// Computes all outputs for every bar of `frame`.
    fn calculate(&self, frame: &KlineFrame) -> IndicatorOutput;

    /// Outputs for bars `from..=to` only.
    fn calculate_range(&self, frame: &KlineFrame, from: usize, to: usize) -> Result<IndicatorOutput> {
        let len = frame.len();
        if from > to || to >= len {
            return Err(IndicatorError::InvalidRange { from, to, len });
        }
        let lookback = self.lookback();
        let lookforward = self.lookforward();
        if from < lookback || to + lookforward >= len {
            return Err(IndicatorError::InsufficientData {
                needed: (to - from + 1) + lookback + lookforward,
                available: len,
            });
        }

        debug!(indicator = %self.name(), from, to, bars = len, "calculate range");

        let count = to - from + 1;
        if self.uses_full_history() {
            return Ok(self.calculate(frame).slice(from, from + count));
        }
        let sub = frame.slice(from - lookback, to + lookforward + 1);
        Ok(self.calculate(&sub).slice(lookback, lookback + count))
    }
}

/// Named output series of one calculation, all of the input's length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorOutput {
    series: Vec<(&'static str, Vec<f64>)>,
}

impl IndicatorOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(name: &'static str, values: Vec<f64>) -> Self {
        Self::new().with(name, values)
    }

    pub fn with(mut self, name: &'static str, values: Vec<f64>) -> Self {
        self.series.push((name, values));
        self
    }

    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.series
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_slice())
    }

    /// First output series.
    pub fn primary(&self) -> &[f64] {
        self.series.first().map(|(_, v)| v.as_slice()).unwrap_or(&[])
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.series.iter().map(|(n, _)| *n)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &[f64])> {
        self.series.iter().map(|(n, v)| (*n, v.as_slice()))
    }

    /// Number of bars per series.
    pub fn len(&self) -> usize {
        self.series.first().map(|(_, v)| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    /// Bars `start..end` of every series.
    pub fn slice(&self, start: usize, end: usize) -> Self {
        Self {
            series: self
                .series
                .iter()
                .map(|(n, v)| {
                    let end = end.min(v.len());
                    (*n, v[start.min(end)..end].to_vec())
                })
                .collect(),
        }
    }
}

pub(crate) fn nan_series(len: usize) -> Vec<f64> {
    vec![f64::NAN; len]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kline::tests::frame_from_closes;

    #[test]
    fn test_output_accessors() {
        let out = IndicatorOutput::new()
            .with("a", vec![1.0, 2.0, 3.0])
            .with("b", vec![4.0, 5.0, 6.0]);

        assert_eq!(out.len(), 3);
        assert_eq!(out.series_count(), 2);
        assert_eq!(out.primary(), &[1.0, 2.0, 3.0]);
        assert_eq!(out.get("b"), Some(&[4.0, 5.0, 6.0][..]));
        assert!(out.get("c").is_none());
        assert_eq!(out.names().collect::<Vec<_>>(), vec!["a", "b"]);

        let tail = out.slice(1, 3);
        assert_eq!(tail.get("a"), Some(&[2.0, 3.0][..]));
    }

    #[test]
    fn test_range_matches_full_for_windowed_indicator() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        let frame = frame_from_closes(&closes);
        let sma = Ma::new(5, MaType::Sma, Default::default()).unwrap();

        let full = sma.calculate(&frame);
        let part = sma.calculate_range(&frame, 10, 20).unwrap();

        assert_eq!(part.len(), 11);
        for (i, v) in part.primary().iter().enumerate() {
            assert!((v - full.primary()[10 + i]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_range_errors() {
        let frame = frame_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let sma = Ma::new(3, MaType::Sma, Default::default()).unwrap();

        assert!(matches!(
            sma.calculate_range(&frame, 3, 2),
            Err(IndicatorError::InvalidRange { .. })
        ));
        assert!(matches!(
            sma.calculate_range(&frame, 0, 5),
            Err(IndicatorError::InvalidRange { .. })
        ));
        assert!(matches!(
            sma.calculate_range(&frame, 1, 4),
            Err(IndicatorError::InsufficientData { .. })
        ));
        assert!(sma.calculate_range(&frame, 2, 4).is_ok());
    }
}
