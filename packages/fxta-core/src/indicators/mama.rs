//! MESA Adaptive Moving Average (Ehlers)
//!
//! A Hilbert transform of the smoothed price yields in-phase and quadrature
//! components; the homodyne discriminator turns them into the dominant cycle
//! period, and the rate of change of the phase sets the EMA factor:
//!
//! ```text
//! alpha = clamp(fast_limit / delta_phase, slow_limit, fast_limit)
//! MAMA  = alpha * price + (1 - alpha) * MAMA[1]
//! FAMA  = alpha/2 * MAMA + (1 - alpha/2) * FAMA[1]
//! ```

use super::{Indicator, IndicatorOutput};
use crate::error::{ensure_positive, IndicatorError, Result};
use crate::kline::{AppliedPrice, KlineFrame};

/// Bars the recurrence needs before its output settles.
const WARMUP: usize = 32;

#[derive(Debug, Clone)]
pub struct Mama {
    fast_limit: f64,
    slow_limit: f64,
    price: AppliedPrice,
}

impl Mama {
    pub fn new(fast_limit: f64, slow_limit: f64, price: AppliedPrice) -> Result<Self> {
        ensure_positive("fast_limit", fast_limit)?;
        ensure_positive("slow_limit", slow_limit)?;
        if fast_limit > 1.0 || slow_limit > fast_limit {
            return Err(IndicatorError::invalid(
                "slow_limit",
                format!("need 0 < slow_limit <= fast_limit <= 1, got {slow_limit} / {fast_limit}"),
            ));
        }
        Ok(Self {
            fast_limit,
            slow_limit,
            price,
        })
    }
}

impl Default for Mama {
    fn default() -> Self {
        Self {
            fast_limit: 0.5,
            slow_limit: 0.05,
            price: AppliedPrice::Median,
        }
    }
}

/// Ehlers' 7-tap Hilbert FIR on `v` at bar `i` (requires `i >= 6`).
#[inline]
fn hilbert(v: &[f64], i: usize, gain: f64) -> f64 {
    (0.0962 * v[i] + 0.5769 * v[i - 2] - 0.5769 * v[i - 4] - 0.0962 * v[i - 6]) * gain
}

/// Raw MAMA/FAMA recurrence over `prices`, no warm-up masking.
pub fn mesa_adaptive(prices: &[f64], fast_limit: f64, slow_limit: f64) -> (Vec<f64>, Vec<f64>) {
    let n = prices.len();
    let mut smooth = vec![0.0; n];
    let mut detrender = vec![0.0; n];
    let mut i1 = vec![0.0; n];
    let mut q1 = vec![0.0; n];
    let mut mama = vec![0.0; n];
    let mut fama = vec![0.0; n];

    let (mut i2_prev, mut q2_prev) = (0.0, 0.0);
    let (mut re_prev, mut im_prev) = (0.0, 0.0);
    let mut period_prev: f64 = 0.0;
    let mut phase_prev: f64 = 0.0;

    for i in 0..n {
        let p = prices[i];
        if i < 6 {
            if i >= 3 {
                smooth[i] = (4.0 * p + 3.0 * prices[i - 1] + 2.0 * prices[i - 2] + prices[i - 3]) / 10.0;
            }
            mama[i] = p;
            fama[i] = p;
            continue;
        }

        smooth[i] = (4.0 * p + 3.0 * prices[i - 1] + 2.0 * prices[i - 2] + prices[i - 3]) / 10.0;
        let gain = 0.075 * period_prev + 0.54;
        detrender[i] = hilbert(&smooth, i, gain);

        // in-phase and quadrature
        q1[i] = hilbert(&detrender, i, gain);
        i1[i] = detrender[i - 3];

        // advance the phase of I1 and Q1 by 90 degrees
        let ji = hilbert(&i1, i, gain);
        let jq = hilbert(&q1, i, gain);

        let i2 = 0.2 * (i1[i] - jq) + 0.8 * i2_prev;
        let q2 = 0.2 * (q1[i] + ji) + 0.8 * q2_prev;

        // homodyne discriminator
        let re = 0.2 * (i2 * i2_prev + q2 * q2_prev) + 0.8 * re_prev;
        let im = 0.2 * (i2 * q2_prev - q2 * i2_prev) + 0.8 * im_prev;
        i2_prev = i2;
        q2_prev = q2;
        re_prev = re;
        im_prev = im;

        let mut period = period_prev;
        if im != 0.0 && re != 0.0 {
            period = 360.0 / (im / re).atan().to_degrees();
        }
        period = period.min(1.5 * period_prev).max(0.67 * period_prev).clamp(6.0, 50.0);
        period = 0.2 * period + 0.8 * period_prev;
        period_prev = period;

        let phase = if i1[i] != 0.0 {
            (q1[i] / i1[i]).atan().to_degrees()
        } else {
            phase_prev
        };
        let delta_phase = (phase_prev - phase).max(1.0);
        phase_prev = phase;

        let alpha = (fast_limit / delta_phase).clamp(slow_limit, fast_limit);
        mama[i] = alpha * p + (1.0 - alpha) * mama[i - 1];
        fama[i] = 0.5 * alpha * mama[i] + (1.0 - 0.5 * alpha) * fama[i - 1];
    }

    (mama, fama)
}

impl Indicator for Mama {
    fn name(&self) -> String {
        format!("MAMA({},{})", self.fast_limit, self.slow_limit)
    }

    fn lookback(&self) -> usize {
        WARMUP
    }

    fn output_names(&self) -> &'static [&'static str] {
        &["mama", "fama"]
    }

    fn uses_full_history(&self) -> bool {
        true
    }

    fn calculate(&self, frame: &KlineFrame) -> IndicatorOutput {
        let prices = frame.price(self.price);
        let (mut mama, mut fama) = mesa_adaptive(&prices, self.fast_limit, self.slow_limit);
        let warm = WARMUP.min(mama.len());
        mama[..warm].fill(f64::NAN);
        fama[..warm].fill(f64::NAN);
        IndicatorOutput::new().with("mama", mama).with("fama", fama)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kline::tests::frame_from_closes;
    use approx::assert_relative_eq;

    #[test]
    fn test_constant_price_is_fixed_point() {
        let (mama, fama) = mesa_adaptive(&[42.0; 80], 0.5, 0.05);
        assert_relative_eq!(mama[79], 42.0, epsilon = 1e-9);
        assert_relative_eq!(fama[79], 42.0, epsilon = 1e-9);
    }

    #[test]
    fn test_lags_an_uptrend() {
        let prices: Vec<f64> = (0..120).map(|i| 100.0 + i as f64).collect();
        let (mama, fama) = mesa_adaptive(&prices, 0.5, 0.05);
        for i in 40..120 {
            assert!(mama[i] < prices[i]);
            assert!(fama[i] < mama[i]);
        }
    }

    #[test]
    fn test_bounded_on_cycle() {
        let prices: Vec<f64> = (0..200)
            .map(|i| 100.0 + (i as f64 * std::f64::consts::TAU / 20.0).sin() * 5.0)
            .collect();
        let (mama, _) = mesa_adaptive(&prices, 0.5, 0.05);
        assert!(mama.iter().all(|v| v.is_finite() && *v >= 94.9 && *v <= 105.1));
    }

    #[test]
    fn test_warmup_masked() {
        let closes: Vec<f64> = (0..50).map(|i| 10.0 + i as f64 * 0.1).collect();
        let out = Mama::default().calculate(&frame_from_closes(&closes));
        let mama = out.get("mama").unwrap();
        assert!(mama[31].is_nan());
        assert!(mama[32].is_finite());
    }

    #[test]
    fn test_limits_validated() {
        assert!(Mama::new(0.5, 0.05, AppliedPrice::Close).is_ok());
        assert!(Mama::new(0.05, 0.5, AppliedPrice::Close).is_err());
        assert!(Mama::new(1.5, 0.05, AppliedPrice::Close).is_err());
        assert!(Mama::new(0.5, 0.0, AppliedPrice::Close).is_err());
    }
}
