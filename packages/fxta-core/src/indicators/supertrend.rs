//! SuperTrend
//!
//! Basic bands are `hl2 ± multiplier * ATR`. The final upper band only moves
//! down (and the lower band only up) unless the previous close broke
//! through it. The trend flips when the close crosses the active band.

use super::atr::atr;
use super::{Indicator, IndicatorOutput};
use crate::error::{ensure_period, ensure_positive, Result};
use crate::kline::KlineFrame;

#[derive(Debug, Clone)]
pub struct SuperTrend {
    period: usize,
    multiplier: f64,
}

impl SuperTrend {
    pub fn new(period: usize, multiplier: f64) -> Result<Self> {
        ensure_period("period", period)?;
        ensure_positive("multiplier", multiplier)?;
        Ok(Self { period, multiplier })
    }
}

impl Indicator for SuperTrend {
    fn name(&self) -> String {
        format!("SUPERTREND({},{})", self.period, self.multiplier)
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn output_names(&self) -> &'static [&'static str] {
        &["supertrend", "direction", "upper", "lower"]
    }

    fn uses_full_history(&self) -> bool {
        true
    }

    fn calculate(&self, frame: &KlineFrame) -> IndicatorOutput {
        let len = frame.len();
        let atr = atr(frame, self.period);
        let mut line = vec![f64::NAN; len];
        let mut direction = vec![f64::NAN; len];
        let mut upper = vec![f64::NAN; len];
        let mut lower = vec![f64::NAN; len];

        let mut uptrend = true;
        for i in self.period.min(len)..len {
            let hl2 = (frame.high[i] + frame.low[i]) / 2.0;
            let basic_upper = hl2 + self.multiplier * atr[i];
            let basic_lower = hl2 - self.multiplier * atr[i];

            if i == self.period {
                upper[i] = basic_upper;
                lower[i] = basic_lower;
                uptrend = frame.close[i] >= hl2;
            } else {
                let prev_close = frame.close[i - 1];
                upper[i] = if basic_upper < upper[i - 1] || prev_close > upper[i - 1] {
                    basic_upper
                } else {
                    upper[i - 1]
                };
                lower[i] = if basic_lower > lower[i - 1] || prev_close < lower[i - 1] {
                    basic_lower
                } else {
                    lower[i - 1]
                };

                if uptrend && frame.close[i] < lower[i] {
                    uptrend = false;
                } else if !uptrend && frame.close[i] > upper[i] {
                    uptrend = true;
                }
            }

            line[i] = if uptrend { lower[i] } else { upper[i] };
            direction[i] = if uptrend { 1.0 } else { -1.0 };
        }

        IndicatorOutput::new()
            .with("supertrend", line)
            .with("direction", direction)
            .with("upper", upper)
            .with("lower", lower)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kline::tests::frame_from_closes;

    #[test]
    fn test_trend_follows_price() {
        let mut closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        closes.extend((0..30).map(|i| 130.0 - i as f64 * 2.0));
        let frame = frame_from_closes(&closes);
        let out = SuperTrend::new(5, 2.0).unwrap().calculate(&frame);

        let dir = out.get("direction").unwrap();
        let line = out.get("supertrend").unwrap();
        assert!(dir[4].is_nan());
        assert_eq!(dir[29], 1.0);
        assert!(line[29] < closes[29]);
        assert_eq!(dir[59], -1.0);
        assert!(line[59] > closes[59]);
    }

    #[test]
    fn test_bands_ratchet() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64 * 0.5).collect();
        let out = SuperTrend::new(7, 3.0).unwrap().calculate(&frame_from_closes(&closes));
        let lower = out.get("lower").unwrap();
        // in a steady uptrend the lower band never decreases
        for i in 8..40 {
            assert!(lower[i] >= lower[i - 1]);
        }
    }

    #[test]
    fn test_invalid_params() {
        assert!(SuperTrend::new(0, 3.0).is_err());
        assert!(SuperTrend::new(10, 0.0).is_err());
    }
}
