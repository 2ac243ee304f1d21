//! Per-bar profit and loss of a set of positions.
//!
//! A position is open on bar `i` when `open_time <= timestamp[i]` and it
//! has not been closed by then; it is marked to the bar's close. From its
//! close bar onward it contributes its realized result instead. Values are
//! in quote currency: price difference times amount.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ensure_positive, IndicatorError, Result};
use crate::kline::KlineFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    fn sign(self) -> f64 {
        match self {
            PositionSide::Long => 1.0,
            PositionSide::Short => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub side: PositionSide,
    pub amount: f64,
    pub open_time: i64,
    pub open_price: f64,
    #[serde(default)]
    pub close_time: Option<i64>,
    #[serde(default)]
    pub close_price: Option<f64>,
}

impl Position {
    pub fn open(side: PositionSide, amount: f64, open_time: i64, open_price: f64) -> Self {
        Self {
            side,
            amount,
            open_time,
            open_price,
            close_time: None,
            close_price: None,
        }
    }

    pub fn closed(mut self, close_time: i64, close_price: f64) -> Self {
        self.close_time = Some(close_time);
        self.close_price = Some(close_price);
        self
    }

    /// Result of the position if closed at `price`.
    pub fn profit_at(&self, price: f64) -> f64 {
        (price - self.open_price) * self.amount * self.side.sign()
    }

    fn validate(&self) -> Result<()> {
        ensure_positive("amount", self.amount)?;
        ensure_positive("open_price", self.open_price)?;
        match (self.close_time, self.close_price) {
            (None, None) => Ok(()),
            (Some(close_time), Some(price)) => {
                ensure_positive("close_price", price)?;
                if close_time < self.open_time {
                    return Err(IndicatorError::invalid(
                        "close_time",
                        format!("{close_time} is before open_time {}", self.open_time),
                    ));
                }
                Ok(())
            }
            _ => Err(IndicatorError::invalid(
                "close_price",
                "close_time and close_price must be set together",
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PnlSeries {
    pub realized: Vec<f64>,
    pub unrealized: Vec<f64>,
    pub total: Vec<f64>,
}

impl PnlSeries {
    pub fn len(&self) -> usize {
        self.total.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total.is_empty()
    }
}

pub fn profit_loss(frame: &KlineFrame, positions: &[Position]) -> Result<PnlSeries> {
    for position in positions {
        position.validate()?;
    }

    let len = frame.len();
    let mut realized = vec![0.0; len];
    let mut unrealized = vec![0.0; len];

    for position in positions {
        for i in 0..len {
            let ts = frame.timestamp[i];
            if ts < position.open_time {
                continue;
            }
            match (position.close_time, position.close_price) {
                (Some(close_time), Some(close_price)) if ts >= close_time => {
                    realized[i] += position.profit_at(close_price);
                }
                _ => unrealized[i] += position.profit_at(frame.close[i]),
            }
        }
    }

    let total = realized.iter().zip(&unrealized).map(|(r, u)| r + u).collect();
    debug!(bars = len, positions = positions.len(), "profit/loss calculated");
    Ok(PnlSeries {
        realized,
        unrealized,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kline::tests::frame_from_closes;
    use approx::assert_relative_eq;

    #[test]
    fn test_long_and_short() {
        // bars every minute, closes 100..=105
        let frame = frame_from_closes(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0]);
        let positions = [
            Position::open(PositionSide::Long, 2.0, 60_000, 101.0).closed(180_000, 103.5),
            Position::open(PositionSide::Short, 1.0, 120_000, 102.0),
        ];
        let pnl = profit_loss(&frame, &positions).unwrap();

        assert_eq!(pnl.total[0], 0.0);
        // long marked at 102 on bar 2, short flat
        assert_relative_eq!(pnl.unrealized[2], 2.0, epsilon = 1e-12);
        // long realized from bar 3: (103.5 - 101) * 2
        assert_relative_eq!(pnl.realized[3], 5.0, epsilon = 1e-12);
        assert_relative_eq!(pnl.unrealized[3], -1.0, epsilon = 1e-12);
        assert_relative_eq!(pnl.total[5], 5.0 - 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_positions() {
        let frame = frame_from_closes(&[1.0, 2.0]);
        let mut half_closed = Position::open(PositionSide::Long, 1.0, 0, 1.0);
        half_closed.close_time = Some(60_000);
        assert!(profit_loss(&frame, &[half_closed]).is_err());

        let backwards = Position::open(PositionSide::Long, 1.0, 60_000, 1.0).closed(0, 2.0);
        assert!(profit_loss(&frame, &[backwards]).is_err());

        let empty = Position::open(PositionSide::Short, 0.0, 0, 1.0);
        assert!(profit_loss(&frame, &[empty]).is_err());
    }

    #[test]
    fn test_position_json() {
        let json = r#"{"side": "short", "amount": 1000, "open_time": 0, "open_price": 1.25}"#;
        let position: Position = serde_json::from_str(json).unwrap();
        assert_eq!(position.side, PositionSide::Short);
        assert!(position.close_time.is_none());
        assert_relative_eq!(position.profit_at(1.24), 10.0, epsilon = 1e-9);
    }
}
