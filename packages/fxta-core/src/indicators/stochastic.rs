//! Stochastic oscillator
//!
//! raw %K = 100 * (C - LL(k)) / (HH(k) - LL(k))
//! slow %K = MA(raw %K, slow_k), %D = MA(slow %K, slow_d)

use super::ma::{moving_average, MaType};
use super::{Indicator, IndicatorOutput};
use crate::common::window::{highest, lowest};
use crate::error::{ensure_period, Result};
use crate::kline::KlineFrame;

#[derive(Debug, Clone)]
pub struct Stochastic {
    fast_k: usize,
    slow_k: usize,
    slow_k_ma: MaType,
    slow_d: usize,
    slow_d_ma: MaType,
}

impl Stochastic {
    pub fn new(fast_k: usize, slow_k: usize, slow_k_ma: MaType, slow_d: usize, slow_d_ma: MaType) -> Result<Self> {
        ensure_period("fast_k", fast_k)?;
        ensure_period("slow_k", slow_k)?;
        ensure_period("slow_d", slow_d)?;
        Ok(Self {
            fast_k,
            slow_k,
            slow_k_ma,
            slow_d,
            slow_d_ma,
        })
    }
}

/// Unsmoothed %K. A flat window (HH == LL) reads 50.
pub fn raw_k(frame: &KlineFrame, period: usize) -> Vec<f64> {
    let hh = highest(&frame.high, period);
    let ll = lowest(&frame.low, period);
    (0..frame.len())
        .map(|i| {
            let range = hh[i] - ll[i];
            if range.is_nan() {
                f64::NAN
            } else if range == 0.0 {
                50.0
            } else {
                100.0 * (frame.close[i] - ll[i]) / range
            }
        })
        .collect()
}

impl Indicator for Stochastic {
    fn name(&self) -> String {
        format!("STOCH({},{},{})", self.fast_k, self.slow_k, self.slow_d)
    }

    fn lookback(&self) -> usize {
        (self.fast_k - 1) + (self.slow_k - 1) + (self.slow_d - 1)
    }

    fn output_names(&self) -> &'static [&'static str] {
        &["k", "d"]
    }

    fn calculate(&self, frame: &KlineFrame) -> IndicatorOutput {
        let raw = raw_k(frame, self.fast_k);
        let mut k = moving_average(&raw, self.slow_k, self.slow_k_ma);
        let d = moving_average(&k, self.slow_d, self.slow_d_ma);

        // %K is reported from the bar %D starts
        let lookback = self.lookback().min(k.len());
        k[..lookback].fill(f64::NAN);

        IndicatorOutput::new().with("k", k).with("d", d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kline::Kline;
    use approx::assert_relative_eq;

    fn frame(rows: &[(f64, f64, f64)]) -> KlineFrame {
        rows.iter()
            .enumerate()
            .map(|(i, &(h, l, c))| Kline::new(i as i64, c, h, l, c, 1.0))
            .collect()
    }

    #[test]
    fn test_raw_k() {
        let f = frame(&[(10.0, 8.0, 9.0), (12.0, 9.0, 11.0), (11.0, 7.0, 10.0)]);
        let k = raw_k(&f, 3);
        assert!(k[1].is_nan());
        // HH 12, LL 7 -> (10 - 7) / 5
        assert_relative_eq!(k[2], 60.0, epsilon = 1e-12);
    }

    #[test]
    fn test_flat_reads_fifty() {
        let f = frame(&[(5.0, 5.0, 5.0); 4]);
        assert_eq!(raw_k(&f, 2)[3], 50.0);
    }

    #[test]
    fn test_smoothing_and_lookback() {
        let rows: Vec<_> = (0..30)
            .map(|i| {
                let c = 50.0 + (i as f64 / 3.0).sin() * 10.0;
                (c + 1.0, c - 1.0, c)
            })
            .collect();
        let f = frame(&rows);
        let stoch = Stochastic::new(5, 3, MaType::Sma, 3, MaType::Sma).unwrap();
        let out = stoch.calculate(&f);

        let k = out.get("k").unwrap();
        let d = out.get("d").unwrap();
        assert_eq!(stoch.lookback(), 8);
        assert!(k[7].is_nan() && d[7].is_nan());
        assert!(!k[8].is_nan() && !d[8].is_nan());

        let raw = raw_k(&f, 5);
        let slow = (raw[10] + raw[11] + raw[12]) / 3.0;
        assert_relative_eq!(k[12], slow, epsilon = 1e-9);
        assert_relative_eq!(d[12], (k[10] + k[11] + k[12]) / 3.0, epsilon = 1e-9);
        assert!(k.iter().filter(|v| !v.is_nan()).all(|v| (0.0..=100.0).contains(v)));
    }
}
