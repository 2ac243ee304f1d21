//! Session pivot points.
//!
//! Bars are grouped into sessions by [`Period::bucket_start`]; every bar of
//! a session gets the levels computed from the previous session's
//! open/high/low/close. The first session has no levels.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{nan_series, Indicator, IndicatorOutput};
use crate::kline::KlineFrame;
use crate::period::Period;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PivotKind {
    #[default]
    Classic,
    Fibonacci,
    Camarilla,
    Woodie,
    DeMark,
}

const NAMES: [&str; 7] = ["pivot", "r1", "r2", "r3", "s1", "s2", "s3"];

#[derive(Debug, Clone, Copy)]
struct Session {
    bucket: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

impl PivotKind {
    /// Levels in [`NAMES`] order from one session's OHLC.
    fn levels(self, s: &Session) -> [f64; 7] {
        let (o, h, l, c) = (s.open, s.high, s.low, s.close);
        let range = h - l;
        match self {
            PivotKind::Classic => {
                let p = (h + l + c) / 3.0;
                [p, 2.0 * p - l, p + range, h + 2.0 * (p - l), 2.0 * p - h, p - range, l - 2.0 * (h - p)]
            }
            PivotKind::Fibonacci => {
                let p = (h + l + c) / 3.0;
                [
                    p,
                    p + 0.382 * range,
                    p + 0.618 * range,
                    p + range,
                    p - 0.382 * range,
                    p - 0.618 * range,
                    p - range,
                ]
            }
            PivotKind::Camarilla => {
                let p = (h + l + c) / 3.0;
                let step = range * 1.1;
                [
                    p,
                    c + step / 12.0,
                    c + step / 6.0,
                    c + step / 4.0,
                    c - step / 12.0,
                    c - step / 6.0,
                    c - step / 4.0,
                ]
            }
            PivotKind::Woodie => {
                let p = (h + l + 2.0 * c) / 4.0;
                [p, 2.0 * p - l, p + range, h + 2.0 * (p - l), 2.0 * p - h, p - range, l - 2.0 * (h - p)]
            }
            PivotKind::DeMark => {
                let x = if c < o {
                    h + 2.0 * l + c
                } else if c > o {
                    2.0 * h + l + c
                } else {
                    h + l + 2.0 * c
                };
                let nan = f64::NAN;
                [x / 4.0, x / 2.0 - l, nan, nan, x / 2.0 - h, nan, nan]
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct PivotPoints {
    kind: PivotKind,
    session: Period,
}

impl PivotPoints {
    pub fn new(kind: PivotKind, session: Period) -> Self {
        Self { kind, session }
    }
}

impl Default for PivotPoints {
    fn default() -> Self {
        Self::new(PivotKind::Classic, Period::DAY)
    }
}

impl Indicator for PivotPoints {
    fn name(&self) -> String {
        format!("PIVOT({:?},{})", self.kind, self.session)
    }

    fn lookback(&self) -> usize {
        0
    }

    fn output_names(&self) -> &'static [&'static str] {
        &NAMES
    }

    fn uses_full_history(&self) -> bool {
        true
    }

    fn calculate(&self, frame: &KlineFrame) -> IndicatorOutput {
        let len = frame.len();
        let mut columns: Vec<Vec<f64>> = (0..NAMES.len()).map(|_| nan_series(len)).collect();

        let mut current: Option<Session> = None;
        let mut levels: Option<[f64; 7]> = None;

        for i in 0..len {
            let bucket = self.session.bucket_start(frame.timestamp[i]);
            match current {
                Some(ref mut s) if s.bucket == bucket => {
                    s.high = s.high.max(frame.high[i]);
                    s.low = s.low.min(frame.low[i]);
                    s.close = frame.close[i];
                }
                prev => {
                    if let Some(prev) = prev {
                        trace!(session = prev.bucket, high = prev.high, low = prev.low, "session closed");
                        levels = Some(self.kind.levels(&prev));
                    }
                    current = Some(Session {
                        bucket,
                        open: frame.open[i],
                        high: frame.high[i],
                        low: frame.low[i],
                        close: frame.close[i],
                    });
                }
            }

            if let Some(values) = levels {
                for (column, value) in columns.iter_mut().zip(values) {
                    column[i] = value;
                }
            }
        }

        NAMES
            .iter()
            .zip(columns)
            .fold(IndicatorOutput::new(), |out, (name, column)| out.with(name, column))
    }
}
