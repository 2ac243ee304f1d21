//! Bill Williams fractals.
//!
//! An up fractal is a bar whose high is strictly greater than the highs of
//! `bars` bars on each side; a down fractal mirrors it on lows. The value
//! is only known `bars` bars later, hence the lookforward.

use tracing::trace;

use super::{nan_series, Indicator, IndicatorOutput};
use crate::error::{ensure_period, Result};
use crate::kline::KlineFrame;

#[derive(Debug, Clone)]
pub struct Fractals {
    bars: usize,
}

impl Fractals {
    pub fn new(bars: usize) -> Result<Self> {
        ensure_period("bars", bars)?;
        Ok(Self { bars })
    }
}

impl Default for Fractals {
    fn default() -> Self {
        Self { bars: 2 }
    }
}

impl Indicator for Fractals {
    fn name(&self) -> String {
        format!("FRACTALS({})", self.bars)
    }

    fn lookback(&self) -> usize {
        self.bars
    }

    fn lookforward(&self) -> usize {
        self.bars
    }

    fn output_names(&self) -> &'static [&'static str] {
        &["up", "down"]
    }

    fn calculate(&self, frame: &KlineFrame) -> IndicatorOutput {
        let len = frame.len();
        let mut up = nan_series(len);
        let mut down = nan_series(len);
        let n = self.bars;

        for i in n..len.saturating_sub(n) {
            let neighbours = (i - n..i).chain(i + 1..=i + n);
            if neighbours.clone().all(|j| frame.high[i] > frame.high[j]) {
                trace!(bar = i, price = frame.high[i], "up fractal");
                up[i] = frame.high[i];
            }
            if neighbours.clone().all(|j| frame.low[i] < frame.low[j]) {
                trace!(bar = i, price = frame.low[i], "down fractal");
                down[i] = frame.low[i];
            }
        }

        IndicatorOutput::new().with("up", up).with("down", down)
    }
}
