//! ZigZag
//!
//! Two passes over the bars:
//! 1. mark candidate lows/highs: a bar whose low (high) is the extreme of
//!    the trailing `depth` window and not a repeat of the previous extreme;
//!    a new extreme clears weaker candidates of the same kind in the last
//!    `backstep` bars
//! 2. walk the candidates keeping the swing alternating, replacing the
//!    current swing point when a more extreme candidate of the same kind
//!    arrives; a reversal must move at least `deviation` price units away
//!    from the current swing point

use tracing::trace;

use super::{nan_series, Indicator, IndicatorOutput};
use crate::error::{ensure_period, IndicatorError, Result};
use crate::kline::KlineFrame;

#[derive(Debug, Clone)]
pub struct ZigZag {
    depth: usize,
    deviation: f64,
    backstep: usize,
}

impl ZigZag {
    pub fn new(depth: usize, deviation: f64, backstep: usize) -> Result<Self> {
        ensure_period("depth", depth)?;
        if !(deviation.is_finite() && deviation >= 0.0) {
            return Err(IndicatorError::invalid(
                "deviation",
                format!("must be a non-negative finite number, got {deviation}"),
            ));
        }
        Ok(Self {
            depth,
            deviation,
            backstep,
        })
    }
}

impl Default for ZigZag {
    fn default() -> Self {
        Self {
            depth: 12,
            deviation: 0.0,
            backstep: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Seek {
    Any,
    Peak,
    Bottom,
}

impl ZigZag {
    /// First pass: candidate extremes per bar.
    fn candidates(&self, values: &[f64], lows: bool) -> Vec<Option<f64>> {
        let len = values.len();
        let mut marks: Vec<Option<f64>> = vec![None; len];
        let mut last: Option<f64> = None;

        for i in self.depth.min(len)..len {
            let window = &values[i + 1 - self.depth..=i];
            let extreme = if lows {
                window.iter().copied().fold(f64::INFINITY, f64::min)
            } else {
                window.iter().copied().fold(f64::NEG_INFINITY, f64::max)
            };

            let accepted = if last == Some(extreme) {
                None
            } else {
                last = Some(extreme);
                for back in 1..=self.backstep.min(i) {
                    let weaker = match marks[i - back] {
                        Some(v) if lows => v > extreme,
                        Some(v) => v < extreme,
                        None => false,
                    };
                    if weaker {
                        marks[i - back] = None;
                    }
                }
                Some(extreme)
            };

            marks[i] = accepted.filter(|&v| values[i] == v);
        }
        marks
    }
}

impl Indicator for ZigZag {
    fn name(&self) -> String {
        format!("ZIGZAG({},{},{})", self.depth, self.deviation, self.backstep)
    }

    fn lookback(&self) -> usize {
        self.depth
    }

    fn output_names(&self) -> &'static [&'static str] {
        &["zigzag"]
    }

    fn uses_full_history(&self) -> bool {
        true
    }

    fn calculate(&self, frame: &KlineFrame) -> IndicatorOutput {
        let len = frame.len();
        let lows = self.candidates(&frame.low, true);
        let highs = self.candidates(&frame.high, false);
        let mut zigzag = nan_series(len);

        let mut seek = Seek::Any;
        let (mut last_low, mut last_low_pos) = (f64::NAN, 0);
        let (mut last_high, mut last_high_pos) = (f64::NAN, 0);

        for i in self.depth.min(len)..len {
            match seek {
                Seek::Any => {
                    if let Some(low) = lows[i] {
                        (last_low, last_low_pos) = (low, i);
                        zigzag[i] = low;
                        seek = Seek::Peak;
                    }
                    if let Some(high) = highs[i] {
                        (last_high, last_high_pos) = (high, i);
                        zigzag[i] = high;
                        seek = Seek::Bottom;
                    }
                }
                Seek::Peak => match (lows[i], highs[i]) {
                    (Some(low), None) if low < last_low => {
                        zigzag[last_low_pos] = f64::NAN;
                        (last_low, last_low_pos) = (low, i);
                        zigzag[i] = low;
                    }
                    (None, Some(high)) if high - last_low >= self.deviation => {
                        trace!(bar = last_low_pos, price = last_low, "swing low");
                        (last_high, last_high_pos) = (high, i);
                        zigzag[i] = high;
                        seek = Seek::Bottom;
                    }
                    _ => {}
                },
                Seek::Bottom => match (lows[i], highs[i]) {
                    (None, Some(high)) if high > last_high => {
                        zigzag[last_high_pos] = f64::NAN;
                        (last_high, last_high_pos) = (high, i);
                        zigzag[i] = high;
                    }
                    (Some(low), None) if last_high - low >= self.deviation => {
                        trace!(bar = last_high_pos, price = last_high, "swing high");
                        (last_low, last_low_pos) = (low, i);
                        zigzag[i] = low;
                        seek = Seek::Peak;
                    }
                    _ => {}
                },
            }
        }

        IndicatorOutput::single("zigzag", zigzag)
    }
}
