//! MACD (Moving Average Convergence/Divergence)
//!
//! MACD = EMA(fast) - EMA(slow)
//! Signal = EMA(MACD, signal_period)
//! Histogram = MACD - Signal

use super::ma::{MaType, MovingAverage};
use super::{Indicator, IndicatorOutput, StreamingIndicator};
use crate::common::RingBuffer;
use crate::error::{ensure_period, IndicatorError, Result};
use crate::kline::{AppliedPrice, Kline, KlineFrame};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdResult {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

impl MacdResult {
    const NAN: MacdResult = MacdResult {
        macd: f64::NAN,
        signal: f64::NAN,
        histogram: f64::NAN,
    };
}

fn validate(fast: usize, slow: usize, signal: usize) -> Result<()> {
    ensure_period("fast_period", fast)?;
    ensure_period("slow_period", slow)?;
    ensure_period("signal_period", signal)?;
    if fast >= slow {
        return Err(IndicatorError::invalid(
            "fast_period",
            format!("must be less than slow_period ({fast} >= {slow})"),
        ));
    }
    Ok(())
}

/// Streaming MACD.
#[derive(Debug, Clone)]
pub struct Macd {
    fast: MovingAverage,
    slow: MovingAverage,
    signal: MovingAverage,
    result_macd: RingBuffer,
    result_signal: RingBuffer,
    result_histogram: RingBuffer,
}

impl Macd {
    /// - fast_period: usually 12
    /// - slow_period: usually 26
    /// - signal_period: usually 9
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize, max_history: usize) -> Result<Self> {
        validate(fast_period, slow_period, signal_period)?;
        Ok(Self {
            fast: MovingAverage::new(fast_period, MaType::Ema, 1)?,
            slow: MovingAverage::new(slow_period, MaType::Ema, 1)?,
            signal: MovingAverage::new(signal_period, MaType::Ema, 1)?,
            result_macd: RingBuffer::new(max_history),
            result_signal: RingBuffer::new(max_history),
            result_histogram: RingBuffer::new(max_history),
        })
    }

    pub fn default_params(max_history: usize) -> Result<Self> {
        Self::new(12, 26, 9, max_history)
    }

    pub fn add_value(&mut self, price: f64) -> MacdResult {
        let macd = self.fast.add_value(price) - self.slow.add_value(price);
        let result = if macd.is_nan() {
            MacdResult::NAN
        } else {
            let signal = self.signal.add_value(macd);
            MacdResult {
                macd,
                signal,
                histogram: macd - signal,
            }
        };

        self.result_macd.push(result.macd);
        self.result_signal.push(result.signal);
        self.result_histogram.push(result.histogram);
        result
    }

    pub fn update_last_value(&mut self, price: f64) -> MacdResult {
        if self.result_macd.is_empty() {
            return MacdResult::NAN;
        }
        let macd = self.fast.update_last_value(price) - self.slow.update_last_value(price);
        let result = if macd.is_nan() {
            MacdResult::NAN
        } else {
            let signal = self.signal.update_last_value(macd);
            MacdResult {
                macd,
                signal,
                histogram: macd - signal,
            }
        };

        self.result_macd.update_last(result.macd);
        self.result_signal.update_last(result.signal);
        self.result_histogram.update_last(result.histogram);
        result
    }

    pub fn get_macd(&self, index: i32) -> MacdResult {
        MacdResult {
            macd: self.result_macd.get(index),
            signal: self.result_signal.get(index),
            histogram: self.result_histogram.get(index),
        }
    }
}

impl StreamingIndicator for Macd {
    fn add(&mut self, kline: &Kline) {
        self.add_value(kline.close);
    }

    fn update_last(&mut self, kline: &Kline) {
        self.update_last_value(kline.close);
    }

    fn get_value(&self, index: i32) -> f64 {
        self.result_macd.get(index)
    }

    fn len(&self) -> usize {
        self.result_macd.len()
    }
}

#[derive(Debug, Clone)]
pub struct MacdIndicator {
    fast: usize,
    slow: usize,
    signal: usize,
    price: AppliedPrice,
}

impl MacdIndicator {
    pub fn new(fast: usize, slow: usize, signal: usize, price: AppliedPrice) -> Result<Self> {
        validate(fast, slow, signal)?;
        Ok(Self {
            fast,
            slow,
            signal,
            price,
        })
    }
}

impl Indicator for MacdIndicator {
    fn name(&self) -> String {
        format!("MACD({},{},{})", self.fast, self.slow, self.signal)
    }

    fn lookback(&self) -> usize {
        self.slow + self.signal - 2
    }

    fn output_names(&self) -> &'static [&'static str] {
        &["macd", "signal", "histogram"]
    }

    fn calculate(&self, frame: &KlineFrame) -> IndicatorOutput {
        let len = frame.len();
        let mut macd = vec![f64::NAN; len];
        let mut signal = vec![f64::NAN; len];
        let mut histogram = vec![f64::NAN; len];

        if let Ok(mut m) = Macd::new(self.fast, self.slow, self.signal, 1) {
            let lookback = self.lookback();
            for (i, price) in frame.price(self.price).into_iter().enumerate() {
                let r = m.add_value(price);
                // all three lines start together
                if i >= lookback {
                    macd[i] = r.macd;
                    signal[i] = r.signal;
                    histogram[i] = r.histogram;
                }
            }
        }

        IndicatorOutput::new()
            .with("macd", macd)
            .with("signal", signal)
            .with("histogram", histogram)
    }
}
