//! Ichimoku Kinko Hyo
//!
//! - tenkan: midpoint of HH/LL over `tenkan` bars
//! - kijun: midpoint over `kijun` bars
//! - senkou A: (tenkan + kijun) / 2, plotted `displacement` bars ahead
//! - senkou B: midpoint over `senkou_b` bars, plotted `displacement` bars ahead
//! - chikou: close plotted `displacement` bars back
//!
//! In array form "plotted ahead" means `senkou_a[i]` is computed from bar
//! `i - displacement`; chikou at bar `i` is the close of `i + displacement`
//! and is NaN on the last `displacement` bars.

use super::{nan_series, Indicator, IndicatorOutput};
use crate::common::window::midpoint;
use crate::error::{ensure_period, IndicatorError, Result};
use crate::kline::KlineFrame;

#[derive(Debug, Clone)]
pub struct Ichimoku {
    tenkan: usize,
    kijun: usize,
    senkou_b: usize,
    displacement: usize,
}

impl Ichimoku {
    pub fn new(tenkan: usize, kijun: usize, senkou_b: usize, displacement: usize) -> Result<Self> {
        ensure_period("tenkan", tenkan)?;
        ensure_period("kijun", kijun)?;
        ensure_period("senkou_b", senkou_b)?;
        if senkou_b < tenkan.max(kijun) {
            return Err(IndicatorError::invalid(
                "senkou_b",
                format!("must be at least tenkan and kijun, got {senkou_b}"),
            ));
        }
        Ok(Self {
            tenkan,
            kijun,
            senkou_b,
            displacement,
        })
    }
}

impl Default for Ichimoku {
    fn default() -> Self {
        Self {
            tenkan: 9,
            kijun: 26,
            senkou_b: 52,
            displacement: 26,
        }
    }
}

fn shift_forward(values: &[f64], by: usize) -> Vec<f64> {
    let mut out = nan_series(values.len());
    if by < values.len() {
        out[by..].copy_from_slice(&values[..values.len() - by]);
    }
    out
}

impl Indicator for Ichimoku {
    fn name(&self) -> String {
        format!(
            "ICHIMOKU({},{},{},{})",
            self.tenkan, self.kijun, self.senkou_b, self.displacement
        )
    }

    fn lookback(&self) -> usize {
        self.senkou_b - 1 + self.displacement
    }

    fn output_names(&self) -> &'static [&'static str] {
        &["senkou_b", "senkou_a", "tenkan", "kijun", "chikou"]
    }

    fn calculate(&self, frame: &KlineFrame) -> IndicatorOutput {
        let len = frame.len();
        let tenkan = midpoint(&frame.high, &frame.low, self.tenkan);
        let kijun = midpoint(&frame.high, &frame.low, self.kijun);
        let base_a: Vec<f64> = tenkan.iter().zip(&kijun).map(|(t, k)| (t + k) / 2.0).collect();
        let base_b = midpoint(&frame.high, &frame.low, self.senkou_b);

        let mut chikou = nan_series(len);
        if self.displacement < len {
            chikou[..len - self.displacement].copy_from_slice(&frame.close[self.displacement..]);
        }

        // the slowest line first, it defines the lookback
        IndicatorOutput::new()
            .with("senkou_b", shift_forward(&base_b, self.displacement))
            .with("senkou_a", shift_forward(&base_a, self.displacement))
            .with("tenkan", tenkan)
            .with("kijun", kijun)
            .with("chikou", chikou)
    }
}
