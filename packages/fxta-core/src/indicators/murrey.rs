//! Murrey Math channels
//!
//! Over a trailing window the high/low range is snapped onto a power-of-two
//! "octave" of a price-magnitude fractal, then split into eighths. Thirteen
//! lines are produced, from -2/8 below the frame to +2/8 above it.

use super::{nan_series, Indicator, IndicatorOutput};
use crate::error::{ensure_period, Result};
use crate::kline::KlineFrame;

const LINES: usize = 13;

const NAMES: [&str; LINES] = [
    "-2/8", "-1/8", "0/8", "1/8", "2/8", "3/8", "4/8", "5/8", "6/8", "7/8", "8/8", "+1/8", "+2/8",
];

#[derive(Debug, Clone)]
pub struct MurreyChannels {
    period: usize,
}

impl MurreyChannels {
    pub fn new(period: usize) -> Result<Self> {
        ensure_period("period", period)?;
        Ok(Self { period })
    }
}

impl Default for MurreyChannels {
    fn default() -> Self {
        Self { period: 64 }
    }
}

/// Fractal scale for a price magnitude.
fn fractal(high: f64) -> f64 {
    match high {
        h if h > 25_000.0 => 100_000.0,
        h if h > 2_500.0 => 10_000.0,
        h if h > 250.0 => 1_000.0,
        h if h > 25.0 => 100.0,
        h if h > 6.25 => 12.5,
        h if h > 3.125 => 6.25,
        h if h > 1.5625 => 3.125,
        h if h > 0.390625 => 1.5625,
        _ => 0.1953125,
    }
}

/// The 13 Murrey lines for a window with lowest low `low` and highest high
/// `high`, from -2/8 upwards. None for an empty or non-finite range.
pub fn murrey_lines(low: f64, high: f64) -> Option<[f64; LINES]> {
    let range = high - low;
    if !(range.is_finite() && range > 0.0) {
        return None;
    }

    let fractal = fractal(high);
    let sum = ((fractal / range).ln() / 2f64.ln()).floor();
    let octave = fractal * 0.5f64.powf(sum);
    let mn = (low / octave).floor() * octave;
    let mx = if mn + octave > high { mn + octave } else { mn + 2.0 * octave };
    let span = mx - mn;

    // pick the sub-frame of the octave that contains the range
    let x2 = if low >= 3.0 / 16.0 * span + mn && high <= 9.0 / 16.0 * span + mn {
        mn + span / 2.0
    } else {
        0.0
    };
    let x1 = if low >= mn - span / 8.0 && high <= 5.0 / 8.0 * span + mn && x2 == 0.0 {
        mn + span / 2.0
    } else {
        0.0
    };
    let x4 = if low >= mn + 7.0 * span / 16.0 && high <= 13.0 / 16.0 * span + mn {
        mn + 3.0 * span / 4.0
    } else {
        0.0
    };
    let x5 = if low >= mn + 3.0 * span / 8.0 && high <= 9.0 / 8.0 * span + mn && x4 == 0.0 {
        mx
    } else {
        0.0
    };
    let x3 = if low >= mn + span / 8.0
        && high <= 7.0 / 8.0 * span + mn
        && x1 == 0.0
        && x2 == 0.0
        && x4 == 0.0
        && x5 == 0.0
    {
        mn + 3.0 * span / 4.0
    } else {
        0.0
    };
    let x6 = if x1 + x2 + x3 + x4 + x5 == 0.0 { mx } else { 0.0 };
    let final_high = x1 + x2 + x3 + x4 + x5 + x6;

    let y1 = if x1 > 0.0 { mn } else { 0.0 };
    let y2 = if x2 > 0.0 { mn + span / 4.0 } else { 0.0 };
    let y3 = if x3 > 0.0 { mn + span / 4.0 } else { 0.0 };
    let y4 = if x4 > 0.0 { mn + span / 2.0 } else { 0.0 };
    let y5 = if x5 > 0.0 { mn + span / 2.0 } else { 0.0 };
    let y6 = if final_high > 0.0 && y1 + y2 + y3 + y4 + y5 == 0.0 { mn } else { 0.0 };
    let final_low = y1 + y2 + y3 + y4 + y5 + y6;

    let step = (final_high - final_low) / 8.0;
    let mut lines = [0.0; LINES];
    for (k, line) in lines.iter_mut().enumerate() {
        *line = final_low + (k as f64 - 2.0) * step;
    }
    Some(lines)
}

impl Indicator for MurreyChannels {
    fn name(&self) -> String {
        format!("MURREY({})", self.period)
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn output_names(&self) -> &'static [&'static str] {
        &NAMES
    }

    fn calculate(&self, frame: &KlineFrame) -> IndicatorOutput {
        let len = frame.len();
        let mut columns: Vec<Vec<f64>> = (0..LINES).map(|_| nan_series(len)).collect();

        for end in self.lookback()..len {
            let start = end + 1 - self.period;
            let high = frame.high[start..=end].iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let low = frame.low[start..=end].iter().copied().fold(f64::INFINITY, f64::min);
            if let Some(lines) = murrey_lines(low, high) {
                for (column, value) in columns.iter_mut().zip(lines) {
                    column[end] = value;
                }
            }
        }

        NAMES
            .iter()
            .zip(columns)
            .fold(IndicatorOutput::new(), |out, (name, column)| out.with(name, column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kline::Kline;
    use approx::assert_relative_eq;

    #[test]
    fn test_fractal_table() {
        assert_eq!(fractal(1.35), 1.5625);
        assert_eq!(fractal(120.0), 100.0);
        assert_eq!(fractal(20.0), 12.5);
        assert_eq!(fractal(0.3), 0.1953125);
        assert_eq!(fractal(60_000.0), 100_000.0);
    }

    #[test]
    fn test_eurusd_like_range() {
        // fractal 1.5625, range 0.02 -> octave 1.5625 / 64
        let lines = murrey_lines(1.10, 1.12).unwrap();
        let octave = 1.5625_f64 / 64.0;
        let mn = (1.10 / octave).floor() * octave;

        // no sub-frame contains the range, the whole octave is used
        assert_relative_eq!(lines[2], mn, epsilon = 1e-12);
        assert_relative_eq!(lines[10], mn + octave, epsilon = 1e-12);
        assert!(lines[2] <= 1.10 && lines[10] >= 1.12);

        for w in lines.windows(2) {
            assert_relative_eq!(w[1] - w[0], octave / 8.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_frame_brackets_range() {
        for (low, high) in [(95.0, 105.0), (1.2, 1.3), (1500.0, 1720.0), (30_000.0, 31_000.0)] {
            let lines = murrey_lines(low, high).unwrap();
            assert!(lines[0] <= low, "{low}..{high}: -2/8 {} above low", lines[0]);
            assert!(lines[12] >= high, "{low}..{high}: +2/8 {} below high", lines[12]);
        }
    }

    #[test]
    fn test_flat_window_is_nan() {
        assert!(murrey_lines(1.0, 1.0).is_none());
        let frame: KlineFrame = (0..5).map(|i| Kline::new(i, 1.0, 1.0, 1.0, 1.0, 0.0)).collect();
        let out = MurreyChannels::new(3).unwrap().calculate(&frame);
        assert!(out.get("4/8").unwrap().iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_indicator_outputs() {
        let frame: KlineFrame = (0..10)
            .map(|i| {
                let c = 100.0 + i as f64;
                Kline::new(i, c, c + 2.0, c - 2.0, c, 0.0)
            })
            .collect();
        let mm = MurreyChannels::new(4).unwrap();
        let out = mm.calculate(&frame);

        assert_eq!(out.series_count(), 13);
        assert_eq!(out.names().next(), Some("-2/8"));
        let zero = out.get("0/8").unwrap();
        assert!(zero[2].is_nan());
        assert!(zero[3].is_finite());
    }
}
