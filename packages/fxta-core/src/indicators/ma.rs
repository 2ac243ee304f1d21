//! Moving averages: SMA, EMA, SMMA, LWMA.
//!
//! EMA and SMMA are seeded with the SMA of their first `period` inputs, so
//! every type has lookback `period - 1`.

use serde::{Deserialize, Serialize};

use super::{Indicator, IndicatorOutput, StreamingIndicator};
use crate::common::RingBuffer;
use crate::error::{ensure_period, Result};
use crate::kline::{AppliedPrice, Kline, KlineFrame};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaType {
    /// Simple
    #[default]
    Sma,
    /// Exponential, alpha = 2 / (n + 1)
    Ema,
    /// Smoothed (Wilder), alpha = 1 / n
    Smma,
    /// Linear weighted, weights 1..n with the newest heaviest
    Lwma,
}

impl MaType {
    pub fn label(&self) -> &'static str {
        match self {
            MaType::Sma => "SMA",
            MaType::Ema => "EMA",
            MaType::Smma => "SMMA",
            MaType::Lwma => "LWMA",
        }
    }
}

/// Streaming moving average.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    ma_type: MaType,
    period: usize,
    window: RingBuffer,
    result: RingBuffer,
    count: usize,
    value: f64,
    // value as of the previous bar, so the newest bar can be recomputed
    prev_value: f64,
}

impl MovingAverage {
    /// - period: window length (> 0)
    /// - max_history: how many results `get_value` can reach back
    pub fn new(period: usize, ma_type: MaType, max_history: usize) -> Result<Self> {
        ensure_period("period", period)?;
        Ok(Self {
            ma_type,
            period,
            window: RingBuffer::new(period),
            result: RingBuffer::new(max_history),
            count: 0,
            value: f64::NAN,
            prev_value: f64::NAN,
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn ma_type(&self) -> MaType {
        self.ma_type
    }

    /// Current value, NaN until `period` inputs were seen.
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn add_value(&mut self, x: f64) -> f64 {
        self.window.push(x);
        self.count += 1;
        self.prev_value = self.value;
        self.value = self.compute(x);
        self.result.push(self.value);
        self.value
    }

    pub fn update_last_value(&mut self, x: f64) -> f64 {
        if self.count == 0 {
            return f64::NAN;
        }
        self.window.update_last(x);
        self.value = self.compute(x);
        self.result.update_last(self.value);
        self.value
    }

    fn compute(&self, x: f64) -> f64 {
        if self.count < self.period {
            return f64::NAN;
        }
        let n = self.period as f64;
        let seeding = self.count == self.period;
        match self.ma_type {
            MaType::Sma => self.window.mean(),
            MaType::Lwma => {
                let weighted: f64 = self
                    .window
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (i + 1) as f64 * v)
                    .sum();
                weighted / (n * (n + 1.0) / 2.0)
            }
            MaType::Ema if seeding => self.window.mean(),
            MaType::Ema => {
                let alpha = 2.0 / (n + 1.0);
                self.prev_value + alpha * (x - self.prev_value)
            }
            MaType::Smma if seeding => self.window.mean(),
            MaType::Smma => (self.prev_value * (n - 1.0) + x) / n,
        }
    }
}

impl StreamingIndicator for MovingAverage {
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

/// Batch moving average of `values`.
///
/// Leading NaNs are skipped so derived series (MACD line, %K) can be
/// smoothed directly; the average starts at the first defined input.
pub fn moving_average(values: &[f64], period: usize, ma_type: MaType) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    let Some(start) = values.iter().position(|v| !v.is_nan()) else {
        return out;
    };
    let Ok(mut ma) = MovingAverage::new(period, ma_type, 1) else {
        return out;
    };
    for (slot, &v) in out[start..].iter_mut().zip(&values[start..]) {
        *slot = ma.add_value(v);
    }
    out
}

/// Moving average of an applied price.
#[derive(Debug, Clone)]
pub struct Ma {
    period: usize,
    ma_type: MaType,
    price: AppliedPrice,
}

impl Ma {
    pub fn new(period: usize, ma_type: MaType, price: AppliedPrice) -> Result<Self> {
        ensure_period("period", period)?;
        Ok(Self {
            period,
            ma_type,
            price,
        })
    }
}

impl Indicator for Ma {
    fn name(&self) -> String {
        format!("{}({})", self.ma_type.label(), self.period)
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn output_names(&self) -> &'static [&'static str] {
        &["ma"]
    }

    fn calculate(&self, frame: &KlineFrame) -> IndicatorOutput {
        let prices = frame.price(self.price);
        IndicatorOutput::single("ma", moving_average(&prices, self.period, self.ma_type))
    }
}
