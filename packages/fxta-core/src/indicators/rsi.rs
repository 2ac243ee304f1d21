//! Relative Strength Index (Wilder)
//!
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//!
//! The averages are seeded with the plain mean of the first `period`
//! changes, then smoothed as `(prev * (n - 1) + x) / n`.

use super::{Indicator, IndicatorOutput, StreamingIndicator};
use crate::common::RingBuffer;
use crate::error::{ensure_period, Result};
use crate::kline::{AppliedPrice, Kline, KlineFrame};

#[derive(Debug, Clone, Copy)]
struct RsiState {
    count: usize,
    prev_price: f64,
    gain_sum: f64,
    loss_sum: f64,
    avg_gain: f64,
    avg_loss: f64,
}

impl RsiState {
    const EMPTY: RsiState = RsiState {
        count: 0,
        prev_price: f64::NAN,
        gain_sum: 0.0,
        loss_sum: 0.0,
        avg_gain: f64::NAN,
        avg_loss: f64::NAN,
    };

    fn step(mut self, price: f64, period: usize) -> Self {
        self.count += 1;
        if self.count == 1 {
            self.prev_price = price;
            return self;
        }

        let change = price - self.prev_price;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        let n = period as f64;

        if self.count <= period + 1 {
            self.gain_sum += gain;
            self.loss_sum += loss;
            if self.count == period + 1 {
                self.avg_gain = self.gain_sum / n;
                self.avg_loss = self.loss_sum / n;
            }
        } else {
            self.avg_gain = (self.avg_gain * (n - 1.0) + gain) / n;
            self.avg_loss = (self.avg_loss * (n - 1.0) + loss) / n;
        }
        self.prev_price = price;
        self
    }

    fn rsi(&self, period: usize) -> f64 {
        if self.count <= period {
            return f64::NAN;
        }
        if self.avg_loss == 0.0 {
            return if self.avg_gain == 0.0 { 50.0 } else { 100.0 };
        }
        let rs = self.avg_gain / self.avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    }
}

/// Streaming RSI.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    state: RsiState,
    before_last: RsiState,
    result: RingBuffer,
}

impl Rsi {
    pub fn new(period: usize, max_history: usize) -> Result<Self> {
        ensure_period("period", period)?;
        Ok(Self {
            period,
            state: RsiState::EMPTY,
            before_last: RsiState::EMPTY,
            result: RingBuffer::new(max_history),
        })
    }

    pub fn add_value(&mut self, price: f64) -> f64 {
        self.before_last = self.state;
        self.state = self.before_last.step(price, self.period);
        let value = self.state.rsi(self.period);
        self.result.push(value);
        value
    }

    pub fn update_last_value(&mut self, price: f64) -> f64 {
        if self.state.count == 0 {
            return f64::NAN;
        }
        self.state = self.before_last.step(price, self.period);
        let value = self.state.rsi(self.period);
        self.result.update_last(value);
        value
    }
}

impl StreamingIndicator for Rsi {
    fn add(&mut self, kline: &Kline) {
        self.add_value(kline.close);
    }

    fn update_last(&mut self, kline: &Kline) {
        self.update_last_value(kline.close);
    }

    fn get_value(&self, index: i32) -> f64 {
        self.result.get(index)
    }

    fn len(&self) -> usize {
        self.result.len()
    }
}

/// Batch RSI of `values`.
pub fn rsi(values: &[f64], period: usize) -> Vec<f64> {
    match Rsi::new(period, 1) {
        Ok(mut r) => values.iter().map(|&v| r.add_value(v)).collect(),
        Err(_) => vec![f64::NAN; values.len()],
    }
}

#[derive(Debug, Clone)]
pub struct RsiIndicator {
    period: usize,
    price: AppliedPrice,
}

impl RsiIndicator {
    pub fn new(period: usize, price: AppliedPrice) -> Result<Self> {
        ensure_period("period", period)?;
        Ok(Self { period, price })
    }
}

impl Indicator for RsiIndicator {
    fn name(&self) -> String {
        format!("RSI({})", self.period)
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn output_names(&self) -> &'static [&'static str] {
        &["rsi"]
    }

    fn calculate(&self, frame: &KlineFrame) -> IndicatorOutput {
        IndicatorOutput::single("rsi", rsi(&frame.price(self.price), self.period))
    }
}
