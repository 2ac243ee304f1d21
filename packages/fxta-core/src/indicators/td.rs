//! Tom DeMark counters: Setup, Sequential and Combo
//!
//! A setup counts consecutive closes below (buy) or above (sell) the close
//! four bars earlier; nine in a row completes it. A completed setup arms a
//! countdown that runs to thirteen qualifying bars, or until a completed
//! setup in the opposite direction cancels it.
//!
//! Outputs are signed: sell counts positive, buy counts negative. Countdown
//! series carry the count on the bar that qualified and 0 elsewhere.

use tracing::trace;

use super::{Indicator, IndicatorOutput};
use crate::kline::KlineFrame;

const LOOKBACK: usize = 4;
const SETUP_BARS: i32 = 9;
const COUNTDOWN_BARS: i32 = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Buy,
    Sell,
}

impl Side {
    fn signed(self, count: i32) -> i32 {
        match self {
            Side::Buy => -count,
            Side::Sell => count,
        }
    }
}

fn completed(count: i32) -> Option<Side> {
    match count {
        SETUP_BARS => Some(Side::Sell),
        c if c == -SETUP_BARS => Some(Side::Buy),
        _ => None,
    }
}

/// Signed setup count per bar (0 on the first four bars).
pub fn setup_counts(close: &[f64]) -> Vec<i32> {
    let mut counts = vec![0; close.len()];
    let (mut buy, mut sell) = (0, 0);
    for i in LOOKBACK..close.len() {
        let (c, reference) = (close[i], close[i - LOOKBACK]);
        if c < reference {
            buy = if buy == SETUP_BARS { 1 } else { buy + 1 };
            sell = 0;
        } else if c > reference {
            sell = if sell == SETUP_BARS { 1 } else { sell + 1 };
            buy = 0;
        } else {
            buy = 0;
            sell = 0;
        }
        counts[i] = sell - buy;
    }
    counts
}

/// Bar 8 or 9 of a setup exceeds the extremes of bars 6 and 7.
fn perfected(frame: &KlineFrame, i: usize, side: Side) -> bool {
    match side {
        Side::Buy => {
            let reference = frame.low[i - 3].min(frame.low[i - 2]);
            frame.low[i] <= reference || frame.low[i - 1] <= reference
        }
        Side::Sell => {
            let reference = frame.high[i - 3].max(frame.high[i - 2]);
            frame.high[i] >= reference || frame.high[i - 1] >= reference
        }
    }
}

/// Signed Sequential countdown per bar.
pub fn sequential_countdown(frame: &KlineFrame) -> Vec<i32> {
    let setup = setup_counts(&frame.close);
    let mut out = vec![0; frame.len()];
    let mut active: Option<(Side, i32)> = None;

    for i in LOOKBACK..frame.len() {
        if let Some(side) = completed(setup[i]) {
            if !matches!(active, Some((s, _)) if s == side) {
                trace!(bar = i, ?side, "sequential countdown armed");
                active = Some((side, 0));
            }
        }
        if let Some((side, count)) = active {
            let qualifies = match side {
                Side::Buy => frame.close[i] <= frame.low[i - 2],
                Side::Sell => frame.close[i] >= frame.high[i - 2],
            };
            if qualifies {
                let count = count + 1;
                out[i] = side.signed(count);
                active = (count < COUNTDOWN_BARS).then_some((side, count));
            }
        }
    }
    out
}

#[derive(Debug, Clone, Copy)]
struct Combo {
    side: Side,
    count: i32,
    last_close: Option<f64>,
}

impl Combo {
    fn step(&mut self, frame: &KlineFrame, j: usize, out: &mut [i32]) {
        let (close, low, high) = (&frame.close, &frame.low, &frame.high);
        let qualifies = match self.side {
            Side::Buy => {
                close[j] <= low[j - 2]
                    && low[j] < low[j - 1]
                    && close[j] < close[j - 1]
                    && self.last_close.map_or(true, |last| close[j] < last)
            }
            Side::Sell => {
                close[j] >= high[j - 2]
                    && high[j] > high[j - 1]
                    && close[j] > close[j - 1]
                    && self.last_close.map_or(true, |last| close[j] > last)
            }
        };
        if qualifies {
            self.count += 1;
            self.last_close = Some(close[j]);
            out[j] = self.side.signed(self.count);
        }
    }
}

/// Signed Combo countdown per bar. Counting starts at bar 1 of the
/// completed setup, so values are written back over the setup bars that
/// no earlier countdown has already counted.
pub fn combo_countdown(frame: &KlineFrame) -> Vec<i32> {
    let setup = setup_counts(&frame.close);
    let mut out = vec![0; frame.len()];
    let mut active: Option<Combo> = None;
    // first bar not yet seen by any countdown
    let mut free_from = 0;

    for i in LOOKBACK..frame.len() {
        if let Some(side) = completed(setup[i]) {
            if !matches!(active, Some(c) if c.side == side) {
                trace!(bar = i, ?side, "combo countdown armed");
                let mut combo = Combo {
                    side,
                    count: 0,
                    last_close: None,
                };
                for j in (i + 1 - SETUP_BARS as usize).max(free_from)..i {
                    combo.step(frame, j, &mut out);
                }
                active = Some(combo);
            }
        }
        if let Some(mut combo) = active {
            combo.step(frame, i, &mut out);
            free_from = i + 1;
            active = (combo.count < COUNTDOWN_BARS).then_some(combo);
        }
    }
    out
}

fn to_series(counts: &[i32]) -> Vec<f64> {
    counts
        .iter()
        .enumerate()
        .map(|(i, &c)| if i < LOOKBACK { f64::NAN } else { c as f64 })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct TdSetup;

impl Indicator for TdSetup {
    fn name(&self) -> String {
        "TD_SETUP".to_string()
    }

    fn lookback(&self) -> usize {
        LOOKBACK
    }

    fn output_names(&self) -> &'static [&'static str] {
        &["setup", "perfected"]
    }

    fn uses_full_history(&self) -> bool {
        true
    }

    fn calculate(&self, frame: &KlineFrame) -> IndicatorOutput {
        let counts = setup_counts(&frame.close);
        let perfect = counts
            .iter()
            .enumerate()
            .map(|(i, &c)| match completed(c) {
                _ if i < LOOKBACK => f64::NAN,
                Some(side) if perfected(frame, i, side) => 1.0,
                _ => 0.0,
            })
            .collect();
        IndicatorOutput::new()
            .with("setup", to_series(&counts))
            .with("perfected", perfect)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TdSequential;

impl Indicator for TdSequential {
    fn name(&self) -> String {
        "TD_SEQUENTIAL".to_string()
    }

    fn lookback(&self) -> usize {
        LOOKBACK
    }

    fn output_names(&self) -> &'static [&'static str] {
        &["countdown", "setup"]
    }

    fn uses_full_history(&self) -> bool {
        true
    }

    fn calculate(&self, frame: &KlineFrame) -> IndicatorOutput {
        IndicatorOutput::new()
            .with("countdown", to_series(&sequential_countdown(frame)))
            .with("setup", to_series(&setup_counts(&frame.close)))
    }
}

#[derive(Debug, Clone, Default)]
pub struct TdCombo;

impl Indicator for TdCombo {
    fn name(&self) -> String {
        "TD_COMBO".to_string()
    }

    fn lookback(&self) -> usize {
        LOOKBACK
    }

    fn output_names(&self) -> &'static [&'static str] {
        &["countdown", "setup"]
    }

    fn uses_full_history(&self) -> bool {
        true
    }

    fn calculate(&self, frame: &KlineFrame) -> IndicatorOutput {
        IndicatorOutput::new()
            .with("countdown", to_series(&combo_countdown(frame)))
            .with("setup", to_series(&setup_counts(&frame.close)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kline::tests::frame_from_closes;

    fn falling(n: usize) -> KlineFrame {
        frame_from_closes(&(0..n).map(|i| 100.0 - i as f64).collect::<Vec<_>>())
    }

    #[test]
    fn test_setup_counts_and_restarts() {
        let out = TdSetup.calculate(&falling(20));
        let setup = out.get("setup").unwrap();
        assert!(setup[3].is_nan());
        assert_eq!(setup[4], -1.0);
        assert_eq!(setup[12], -9.0);
        assert_eq!(setup[13], -1.0);

        let perfected = out.get("perfected").unwrap();
        assert_eq!(perfected[11], 0.0);
        assert_eq!(perfected[12], 1.0);
    }

    #[test]
    fn test_equal_close_resets() {
        let mut closes: Vec<f64> = (0..8).map(|i| 50.0 + i as f64).collect();
        closes.push(closes[4]);
        assert_eq!(setup_counts(&closes)[7], 4);
        assert_eq!(setup_counts(&closes)[8], 0);
    }

    #[test]
    fn test_sequential_runs_to_thirteen() {
        let countdown = sequential_countdown(&falling(26));
        assert_eq!(countdown[11], 0);
        assert_eq!(countdown[12], -1);
        assert_eq!(countdown[24], -13);
        assert_eq!(countdown[25], 0);
    }

    #[test]
    fn test_opposite_setup_cancels_countdown() {
        let closes: Vec<f64> = (0..30)
            .map(|i| {
                if i <= 12 {
                    100.0 + i as f64
                } else {
                    112.0 - 2.0 * (i - 12) as f64
                }
            })
            .collect();
        let frame = frame_from_closes(&closes);
        assert_eq!(setup_counts(&frame.close)[22], -9);

        let countdown = sequential_countdown(&frame);
        assert_eq!(countdown[12], 1);
        assert_eq!(countdown[22], -1);
        assert!(countdown[22..].iter().all(|&c| c <= 0));
    }

    #[test]
    fn test_combo_counts_from_setup_start() {
        let out = TdCombo.calculate(&falling(20));
        let countdown = out.get("countdown").unwrap();
        assert_eq!(countdown[4], -1.0);
        assert_eq!(countdown[12], -9.0);
        assert_eq!(countdown[16], -13.0);
        assert_eq!(countdown[17], 0.0);
        assert_eq!(countdown[19], 0.0);
    }

    #[test]
    fn test_combo_rearm_keeps_finished_countdown() {
        let short = combo_countdown(&falling(20));
        let long = combo_countdown(&falling(30));

        // first countdown: setup bars 4..=12, thirteenth count on bar 16
        assert_eq!(long[..17], short[..17]);
        assert_eq!(long[16], -13);
        // second setup (bars 13..=21) only counts bars after bar 16
        assert_eq!(long[17], -1);
        assert_eq!(long[21], -5);
        assert_eq!(long[29], -13);
    }

    #[test]
    fn test_sell_setup_perfected() {
        let rising: Vec<f64> = (0..13).map(|i| 100.0 + i as f64).collect();
        let out = TdSetup.calculate(&frame_from_closes(&rising));
        assert_eq!(out.get("setup").unwrap()[12], 9.0);
        assert_eq!(out.get("perfected").unwrap()[12], 1.0);

        // bars 8 and 9 of the setup stay below the highs of bars 6 and 7
        let mut flat_top = rising.clone();
        flat_top[11] = 109.5;
        flat_top[12] = 109.8;
        let frame = frame_from_closes(&flat_top);
        let out = TdSetup.calculate(&frame);
        assert_eq!(out.get("setup").unwrap()[12], 9.0);
        assert_eq!(out.get("perfected").unwrap()[12], 0.0);
    }
}
