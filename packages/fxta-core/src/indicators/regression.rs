//! Least-squares regression indicators.
//!
//! - [`LinearRegression`]: rolling straight-line fit, end-point value and slope
//! - [`RegressionChannel`]: one polynomial fit over the newest `period` bars
//!   with bands at a multiple of the standard error

use tracing::warn;

use super::{nan_series, Indicator, IndicatorOutput};
use crate::common::PolyFit;
use crate::error::{ensure_positive, IndicatorError, Result};
use crate::kline::{AppliedPrice, KlineFrame};

fn ensure_window(period: usize) -> Result<()> {
    if period < 2 {
        return Err(IndicatorError::invalid("period", "must be at least 2"));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct LinearRegression {
    period: usize,
    price: AppliedPrice,
}

impl LinearRegression {
    pub fn new(period: usize, price: AppliedPrice) -> Result<Self> {
        ensure_window(period)?;
        Ok(Self { period, price })
    }
}

/// End-point value and slope of the least-squares line over each trailing
/// window of `period` values (x = 0 oldest .. period-1 newest).
pub fn linear_regression(values: &[f64], period: usize) -> (Vec<f64>, Vec<f64>) {
    let len = values.len();
    let mut value = nan_series(len);
    let mut slope = nan_series(len);
    if period < 2 || len < period {
        return (value, slope);
    }

    let n = period as f64;
    let sum_x = n * (n - 1.0) / 2.0;
    let sum_xx = (n - 1.0) * n * (2.0 * n - 1.0) / 6.0;
    let denominator = n * sum_xx - sum_x * sum_x;

    for end in period - 1..len {
        let window = &values[end + 1 - period..=end];
        let (sum_y, sum_xy) = window
            .iter()
            .enumerate()
            .fold((0.0, 0.0), |(sy, sxy), (x, &y)| (sy + y, sxy + x as f64 * y));
        let b = (n * sum_xy - sum_x * sum_y) / denominator;
        let a = (sum_y - b * sum_x) / n;
        slope[end] = b;
        value[end] = a + b * (n - 1.0);
    }
    (value, slope)
}

impl Indicator for LinearRegression {
    fn name(&self) -> String {
        format!("LINREG({})", self.period)
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn output_names(&self) -> &'static [&'static str] {
        &["value", "slope"]
    }

    fn calculate(&self, frame: &KlineFrame) -> IndicatorOutput {
        let (value, slope) = linear_regression(&frame.price(self.price), self.period);
        IndicatorOutput::new().with("value", value).with("slope", slope)
    }
}

#[derive(Debug, Clone)]
pub struct RegressionChannel {
    period: usize,
    degree: usize,
    deviations: f64,
    price: AppliedPrice,
}

impl RegressionChannel {
    /// `deviations == 0` draws the bands at the largest absolute residual.
    pub fn new(period: usize, degree: usize, deviations: f64, price: AppliedPrice) -> Result<Self> {
        ensure_window(period)?;
        if degree == 0 || degree >= period {
            return Err(IndicatorError::invalid(
                "degree",
                format!("must be in 1..{period}, got {degree}"),
            ));
        }
        if deviations != 0.0 {
            ensure_positive("deviations", deviations)?;
        }
        Ok(Self {
            period,
            degree,
            deviations,
            price,
        })
    }
}

impl Indicator for RegressionChannel {
    fn name(&self) -> String {
        format!("REGCHANNEL({},{},{})", self.period, self.degree, self.deviations)
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn output_names(&self) -> &'static [&'static str] {
        &["middle", "upper", "lower"]
    }

    /// The channel is anchored to the newest bar of the frame.
    fn uses_full_history(&self) -> bool {
        true
    }

    fn calculate(&self, frame: &KlineFrame) -> IndicatorOutput {
        let len = frame.len();
        let mut middle = nan_series(len);
        let mut upper = nan_series(len);
        let mut lower = nan_series(len);

        if len >= self.period {
            let start = len - self.period;
            let prices = frame.price(self.price);
            match PolyFit::fit(&prices[start..], self.degree) {
                Ok(fit) => {
                    let width = if self.deviations == 0.0 {
                        fit.max_deviation()
                    } else {
                        self.deviations * fit.std_error()
                    };
                    for x in 0..self.period {
                        let mid = fit.value_at(x as f64);
                        middle[start + x] = mid;
                        upper[start + x] = mid + width;
                        lower[start + x] = mid - width;
                    }
                }
                Err(err) => warn!(indicator = %self.name(), %err, "regression channel skipped"),
            }
        }

        IndicatorOutput::new()
            .with("middle", middle)
            .with("upper", upper)
            .with("lower", lower)
    }
}
