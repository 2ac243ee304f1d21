//! ATR (Average True Range)
//!
//! True Range = max(high - low, |high - prev_close|, |low - prev_close|)
//! ATR = Wilder smoothing of TR, seeded with the mean of the first `period` TRs.

use super::{Indicator, IndicatorOutput, StreamingIndicator};
use crate::common::RingBuffer;
use crate::error::{ensure_period, Result};
use crate::kline::{Kline, KlineFrame};

#[inline]
pub fn true_range(high: f64, low: f64, prev_close: f64) -> f64 {
    let hl = high - low;
    let hc = (high - prev_close).abs();
    let lc = (low - prev_close).abs();
    hl.max(hc).max(lc)
}

#[derive(Debug, Clone, Copy)]
struct AtrState {
    count: usize,
    prev_close: f64,
    tr_sum: f64,
    atr: f64,
}

impl AtrState {
    const EMPTY: AtrState = AtrState {
        count: 0,
        prev_close: f64::NAN,
        tr_sum: 0.0,
        atr: f64::NAN,
    };

    fn step(mut self, high: f64, low: f64, close: f64, period: usize) -> Self {
        self.count += 1;
        if self.count > 1 {
            let tr = true_range(high, low, self.prev_close);
            let n = period as f64;
            if self.count <= period + 1 {
                self.tr_sum += tr;
                if self.count == period + 1 {
                    self.atr = self.tr_sum / n;
                }
            } else {
                self.atr = (self.atr * (n - 1.0) + tr) / n;
            }
        }
        self.prev_close = close;
        self
    }
}

/// Streaming ATR.
#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    state: AtrState,
    before_last: AtrState,
    result: RingBuffer,
}

impl Atr {
    /// - period: smoothing length (usually 14)
    /// - max_history: how many results `get_value` can reach back
    pub fn new(period: usize, max_history: usize) -> Result<Self> {
        ensure_period("period", period)?;
        Ok(Self {
            period,
            state: AtrState::EMPTY,
            before_last: AtrState::EMPTY,
            result: RingBuffer::new(max_history),
        })
    }

    pub fn add_kline(&mut self, high: f64, low: f64, close: f64) -> f64 {
        self.before_last = self.state;
        self.state = self.before_last.step(high, low, close, self.period);
        self.result.push(self.state.atr);
        self.state.atr
    }

    pub fn update_last_kline(&mut self, high: f64, low: f64, close: f64) -> f64 {
        if self.state.count == 0 {
            return f64::NAN;
        }
        self.state = self.before_last.step(high, low, close, self.period);
        self.result.update_last(self.state.atr);
        self.state.atr
    }
}

impl StreamingIndicator for Atr {
    fn add(&mut self, kline: &Kline) {
        self.add_kline(kline.high, kline.low, kline.close);
    }

    fn update_last(&mut self, kline: &Kline) {
        self.update_last_kline(kline.high, kline.low, kline.close);
    }

    fn get_value(&self, index: i32) -> f64 {
        self.result.get(index)
    }

    fn len(&self) -> usize {
        self.result.len()
    }
}

/// Batch ATR over the frame's high/low/close.
pub fn atr(frame: &KlineFrame, period: usize) -> Vec<f64> {
    let Ok(mut a) = Atr::new(period, 1) else {
        return vec![f64::NAN; frame.len()];
    };
    (0..frame.len())
        .map(|i| a.add_kline(frame.high[i], frame.low[i], frame.close[i]))
        .collect()
}

#[derive(Debug, Clone)]
pub struct AtrIndicator {
    period: usize,
}

impl AtrIndicator {
    pub fn new(period: usize) -> Result<Self> {
        ensure_period("period", period)?;
        Ok(Self { period })
    }
}

impl Indicator for AtrIndicator {
    fn name(&self) -> String {
        format!("ATR({})", self.period)
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn output_names(&self) -> &'static [&'static str] {
        &["atr"]
    }

    fn calculate(&self, frame: &KlineFrame) -> IndicatorOutput {
        IndicatorOutput::single("atr", atr(frame, self.period))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn frame(rows: &[(f64, f64, f64)]) -> KlineFrame {
        rows.iter()
            .enumerate()
            .map(|(i, &(h, l, c))| Kline::new(i as i64, c, h, l, c, 1.0))
            .collect()
    }

    #[test]
    fn test_true_range_uses_gap() {
        assert_eq!(true_range(105.0, 100.0, 102.0), 5.0);
        assert_eq!(true_range(105.0, 103.0, 98.0), 7.0);
        assert_eq!(true_range(99.0, 95.0, 101.0), 6.0);
    }

    #[test]
    fn test_atr_seed_and_smoothing() {
        let f = frame(&[
            (102.0, 98.0, 100.0),
            (103.0, 99.0, 101.0),  // TR 4
            (105.0, 100.0, 104.0), // TR 5
            (106.0, 102.0, 103.0), // TR 4
            (104.0, 100.0, 101.0), // TR 4
        ]);
        let out = atr(&f, 3);

        assert!(out[..3].iter().all(|v| v.is_nan()));
        assert_relative_eq!(out[3], 13.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(out[4], (13.0 / 3.0 * 2.0 + 4.0) / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_atr_follows_volatility() {
        let calm: Vec<_> = (0..20).map(|i| (100.5 + i as f64 * 0.1, 99.5, 100.0)).collect();
        let wild: Vec<_> = (0..20).map(|i| (105.0 + i as f64 * 0.1, 95.0, 100.0)).collect();
        let a = atr(&frame(&calm), 5);
        let b = atr(&frame(&wild), 5);
        assert!(b[19] > a[19]);
    }

    #[test]
    fn test_update_last_rolls_back() {
        let mut live = Atr::new(2, 10).unwrap();
        let mut fresh = Atr::new(2, 10).unwrap();
        for (h, l, c) in [(10.0, 9.0, 9.5), (11.0, 9.5, 10.5), (12.0, 10.0, 11.0)] {
            live.add_kline(h, l, c);
            fresh.add_kline(h, l, c);
        }
        live.add_kline(20.0, 5.0, 6.0);
        live.update_last_kline(11.5, 10.5, 11.0);
        fresh.add_kline(11.5, 10.5, 11.0);

        assert_relative_eq!(live.get_value(-1), fresh.get_value(-1), epsilon = 1e-12);
    }
}
