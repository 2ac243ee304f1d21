//! Window oscillators: CCI, Williams %R, Momentum.

use super::{nan_series, Indicator, IndicatorOutput};
use crate::common::window::{highest, lowest};
use crate::error::{ensure_period, Result};
use crate::kline::{AppliedPrice, KlineFrame};

/// Commodity Channel Index over the typical price.
#[derive(Debug, Clone)]
pub struct Cci {
    period: usize,
}

impl Cci {
    pub fn new(period: usize) -> Result<Self> {
        ensure_period("period", period)?;
        Ok(Self { period })
    }
}

impl Indicator for Cci {
    fn name(&self) -> String {
        format!("CCI({})", self.period)
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn output_names(&self) -> &'static [&'static str] {
        &["cci"]
    }

    fn calculate(&self, frame: &KlineFrame) -> IndicatorOutput {
        let typical = frame.price(AppliedPrice::Typical);
        let mut cci = nan_series(typical.len());
        let n = self.period as f64;

        for end in self.lookback()..typical.len() {
            let window = &typical[end + 1 - self.period..=end];
            let sma = window.iter().sum::<f64>() / n;
            let mad = window.iter().map(|t| (t - sma).abs()).sum::<f64>() / n;
            cci[end] = if mad > 0.0 {
                (typical[end] - sma) / (0.015 * mad)
            } else {
                0.0
            };
        }

        IndicatorOutput::single("cci", cci)
    }
}

/// Williams %R in [-100, 0].
#[derive(Debug, Clone)]
pub struct WilliamsR {
    period: usize,
}

impl WilliamsR {
    pub fn new(period: usize) -> Result<Self> {
        ensure_period("period", period)?;
        Ok(Self { period })
    }
}

impl Indicator for WilliamsR {
    fn name(&self) -> String {
        format!("WILLR({})", self.period)
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn output_names(&self) -> &'static [&'static str] {
        &["wr"]
    }

    fn calculate(&self, frame: &KlineFrame) -> IndicatorOutput {
        let hh = highest(&frame.high, self.period);
        let ll = lowest(&frame.low, self.period);
        let wr = (0..frame.len())
            .map(|i| {
                let range = hh[i] - ll[i];
                if range.is_nan() {
                    f64::NAN
                } else if range > 0.0 {
                    -100.0 * (hh[i] - frame.close[i]) / range
                } else {
                    -50.0
                }
            })
            .collect();
        IndicatorOutput::single("wr", wr)
    }
}

/// Price difference against `period` bars ago.
#[derive(Debug, Clone)]
pub struct Momentum {
    period: usize,
    price: AppliedPrice,
}

impl Momentum {
    pub fn new(period: usize, price: AppliedPrice) -> Result<Self> {
        ensure_period("period", period)?;
        Ok(Self { period, price })
    }
}

impl Indicator for Momentum {
    fn name(&self) -> String {
        format!("MOM({})", self.period)
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn output_names(&self) -> &'static [&'static str] {
        &["momentum"]
    }

    fn calculate(&self, frame: &KlineFrame) -> IndicatorOutput {
        let prices = frame.price(self.price);
        let mut momentum = nan_series(prices.len());
        for i in self.period..prices.len() {
            momentum[i] = prices[i] - prices[i - self.period];
        }
        IndicatorOutput::single("momentum", momentum)
    }
}
