//! Bollinger bands
//!
//! middle = SMA(n), bands = middle ± k * population stddev over the same window.
//! The deviation is maintained incrementally with Welford's method.

use super::ma::{MaType, MovingAverage};
use super::{Indicator, IndicatorOutput, StreamingIndicator};
use crate::common::RingBuffer;
use crate::error::{ensure_period, ensure_positive, Result};
use crate::kline::{AppliedPrice, Kline, KlineFrame};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollResult {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BollResult {
    const NAN: BollResult = BollResult {
        upper: f64::NAN,
        middle: f64::NAN,
        lower: f64::NAN,
    };
}

/// Streaming Bollinger bands.
#[derive(Debug, Clone)]
pub struct Bollinger {
    ma: MovingAverage,
    values: RingBuffer,
    deviations: f64,
    period: usize,

    // Welford state over `values`
    mean: f64,
    m2: f64,
    count: usize,

    result_upper: RingBuffer,
    result_middle: RingBuffer,
    result_lower: RingBuffer,
}

impl Bollinger {
    /// - period: usually 20
    /// - deviations: band width in standard deviations, usually 2
    pub fn new(period: usize, deviations: f64, max_history: usize) -> Result<Self> {
        ensure_period("period", period)?;
        ensure_positive("deviations", deviations)?;
        Ok(Self {
            ma: MovingAverage::new(period, MaType::Sma, 1)?,
            values: RingBuffer::new(period),
            deviations,
            period,
            mean: 0.0,
            m2: 0.0,
            count: 0,
            result_upper: RingBuffer::new(max_history),
            result_middle: RingBuffer::new(max_history),
            result_lower: RingBuffer::new(max_history),
        })
    }

    fn welford_add(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
    }

    fn welford_remove(&mut self, x: f64) {
        if self.count <= 1 {
            self.mean = 0.0;
            self.m2 = 0.0;
            self.count = 0;
            return;
        }
        let delta = x - self.mean;
        self.mean = (self.mean * self.count as f64 - x) / (self.count - 1) as f64;
        self.m2 -= delta * (x - self.mean);
        self.count -= 1;

        // float drift
        if self.m2 < 0.0 {
            self.m2 = 0.0;
        }
    }

    fn std_dev(&self) -> f64 {
        if self.count == 0 {
            return f64::NAN;
        }
        (self.m2 / self.count as f64).sqrt()
    }

    fn bands(&self, middle: f64) -> BollResult {
        if self.values.len() < self.period {
            return BollResult::NAN;
        }
        let width = self.deviations * self.std_dev();
        BollResult {
            upper: middle + width,
            middle,
            lower: middle - width,
        }
    }

    pub fn add_value(&mut self, x: f64) -> BollResult {
        let middle = self.ma.add_value(x);
        if self.values.is_full() {
            let oldest = self.values.first();
            self.welford_remove(oldest);
        }
        self.welford_add(x);
        self.values.push(x);

        let result = self.bands(middle);
        self.result_upper.push(result.upper);
        self.result_middle.push(result.middle);
        self.result_lower.push(result.lower);
        result
    }

    pub fn update_last_value(&mut self, x: f64) -> BollResult {
        if self.values.is_empty() {
            return BollResult::NAN;
        }
        let old_last = self.values.last();
        self.welford_remove(old_last);
        self.welford_add(x);
        self.values.update_last(x);
        let middle = self.ma.update_last_value(x);

        let result = self.bands(middle);
        self.result_upper.update_last(result.upper);
        self.result_middle.update_last(result.middle);
        self.result_lower.update_last(result.lower);
        result
    }

    pub fn get_bands(&self, index: i32) -> BollResult {
        BollResult {
            upper: self.result_upper.get(index),
            middle: self.result_middle.get(index),
            lower: self.result_lower.get(index),
        }
    }
}

impl StreamingIndicator for Bollinger {
    fn add(&mut self, kline: &Kline) {
        self.add_value(kline.close);
    }

    fn update_last(&mut self, kline: &Kline) {
        self.update_last_value(kline.close);
    }

    fn get_value(&self, index: i32) -> f64 {
        self.result_middle.get(index)
    }

    fn len(&self) -> usize {
        self.result_middle.len()
    }
}

#[derive(Debug, Clone)]
pub struct BollingerIndicator {
    period: usize,
    deviations: f64,
    price: AppliedPrice,
}

impl BollingerIndicator {
    pub fn new(period: usize, deviations: f64, price: AppliedPrice) -> Result<Self> {
        ensure_period("period", period)?;
        ensure_positive("deviations", deviations)?;
        Ok(Self {
            period,
            deviations,
            price,
        })
    }
}

impl Indicator for BollingerIndicator {
    fn name(&self) -> String {
        format!("BBANDS({},{})", self.period, self.deviations)
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn output_names(&self) -> &'static [&'static str] {
        &["upper", "middle", "lower"]
    }

    fn calculate(&self, frame: &KlineFrame) -> IndicatorOutput {
        let len = frame.len();
        let mut upper = Vec::with_capacity(len);
        let mut middle = Vec::with_capacity(len);
        let mut lower = Vec::with_capacity(len);

        if let Ok(mut b) = Bollinger::new(self.period, self.deviations, 1) {
            for x in frame.price(self.price) {
                let r = b.add_value(x);
                upper.push(r.upper);
                middle.push(r.middle);
                lower.push(r.lower);
            }
        }

        IndicatorOutput::new()
            .with("upper", upper)
            .with("middle", middle)
            .with("lower", lower)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bands_around_mean() {
        let mut boll = Bollinger::new(3, 2.0, 100).unwrap();
        boll.add_value(100.0);
        boll.add_value(102.0);
        let r = boll.add_value(101.0);

        assert_relative_eq!(r.middle, 101.0, epsilon = 1e-12);
        let std = (2.0f64 / 3.0).sqrt();
        assert_relative_eq!(r.upper, 101.0 + 2.0 * std, epsilon = 1e-9);
        assert_relative_eq!(r.lower, 101.0 - 2.0 * std, epsilon = 1e-9);
    }

    #[test]
    fn test_sliding_window() {
        let mut boll = Bollinger::new(3, 2.0, 100).unwrap();
        for v in [100.0, 102.0, 101.0, 103.0] {
            boll.add_value(v);
        }
        assert_relative_eq!(boll.get_bands(-1).middle, 102.0, epsilon = 1e-12);
    }

    #[test]
    fn test_welford_matches_direct_stddev() {
        let values = [10.0, 20.0, 30.0, 40.0, 50.0, 35.0, 12.0, 44.0];
        let mut boll = Bollinger::new(5, 2.0, 100).unwrap();
        for v in values {
            boll.add_value(v);
        }

        let window = &values[3..];
        let mean = window.iter().sum::<f64>() / 5.0;
        let var = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / 5.0;
        let r = boll.get_bands(-1);
        assert_relative_eq!((r.upper - r.middle) / 2.0, var.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn test_update_last() {
        let mut live = Bollinger::new(3, 2.0, 10).unwrap();
        let mut fresh = Bollinger::new(3, 2.0, 10).unwrap();
        for v in [1.0, 5.0, 3.0] {
            live.add_value(v);
            fresh.add_value(v);
        }
        live.add_value(100.0);
        let a = live.update_last_value(4.0);
        let b = fresh.add_value(4.0);
        assert_relative_eq!(a.upper, b.upper, epsilon = 1e-9);
        assert_relative_eq!(a.lower, b.lower, epsilon = 1e-9);
    }

    #[test]
    fn test_warmup_nan() {
        let mut boll = Bollinger::new(3, 2.0, 10).unwrap();
        assert!(boll.add_value(1.0).upper.is_nan());
        assert!(boll.add_value(2.0).middle.is_nan());
        assert!(!boll.add_value(3.0).lower.is_nan());
    }
}
