//! Tick data: aggregation into bid/ask bars and tick-derived series.
//!
//! Tick timestamps are milliseconds and must be non-decreasing. A bar's
//! timestamp is the start of its bucket, so a bar covers
//! `[timestamp, timestamp + period)`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ensure_positive, IndicatorError, Result};
use crate::kline::{Kline, KlineFrame};
use crate::period::Period;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub timestamp: i64,
    pub ask: f64,
    pub bid: f64,
    #[serde(default)]
    pub ask_volume: f64,
    #[serde(default)]
    pub bid_volume: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TickSide {
    Ask,
    #[default]
    Bid,
}

impl Tick {
    pub fn new(timestamp: i64, ask: f64, bid: f64, ask_volume: f64, bid_volume: f64) -> Self {
        Self {
            timestamp,
            ask,
            bid,
            ask_volume,
            bid_volume,
        }
    }

    pub fn price(&self, side: TickSide) -> f64 {
        match side {
            TickSide::Ask => self.ask,
            TickSide::Bid => self.bid,
        }
    }

    pub fn volume(&self, side: TickSide) -> f64 {
        match side {
            TickSide::Ask => self.ask_volume,
            TickSide::Bid => self.bid_volume,
        }
    }
}

/// Builds ask and bid bars of one period from a tick stream.
#[derive(Debug)]
pub struct TickAggregator {
    period: Period,
    ask: KlineFrame,
    bid: KlineFrame,
    bucket: Option<i64>,
    last_timestamp: Option<i64>,
}

impl TickAggregator {
    pub fn new(period: Period) -> Self {
        Self {
            period,
            ask: KlineFrame::new(),
            bid: KlineFrame::new(),
            bucket: None,
            last_timestamp: None,
        }
    }

    /// Aggregates a whole tick series.
    pub fn from_ticks(period: Period, ticks: &[Tick]) -> Result<Self> {
        let mut aggregator = Self::new(period);
        for tick in ticks {
            aggregator.push(tick)?;
        }
        debug!(ticks = ticks.len(), bars = aggregator.len(), %period, "ticks aggregated");
        Ok(aggregator)
    }

    /// Adds a tick to the newest bar, or opens a bar when the tick starts
    /// a new bucket.
    pub fn push(&mut self, tick: &Tick) -> Result<()> {
        if let Some(previous) = self.last_timestamp {
            if tick.timestamp < previous {
                return Err(IndicatorError::UnorderedTicks {
                    timestamp: tick.timestamp,
                    previous,
                });
            }
        }
        self.last_timestamp = Some(tick.timestamp);

        let bucket = self.period.bucket_start(tick.timestamp);
        let same_bucket = self.bucket == Some(bucket);
        for (side, frame) in [(TickSide::Ask, &mut self.ask), (TickSide::Bid, &mut self.bid)] {
            let price = tick.price(side);
            match frame.last() {
                Some(mut bar) if same_bucket => {
                    bar.high = bar.high.max(price);
                    bar.low = bar.low.min(price);
                    bar.close = price;
                    bar.volume += tick.volume(side);
                    frame.update_last(&bar);
                }
                _ => frame.push(&Kline::new(bucket, price, price, price, price, tick.volume(side))),
            }
        }
        self.bucket = Some(bucket);
        Ok(())
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn ask(&self) -> &KlineFrame {
        &self.ask
    }

    pub fn bid(&self) -> &KlineFrame {
        &self.bid
    }

    pub fn len(&self) -> usize {
        self.bid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bid.is_empty()
    }

    /// `(ask, bid)` frames.
    pub fn into_frames(self) -> (KlineFrame, KlineFrame) {
        (self.ask, self.bid)
    }
}

fn check_aligned(ask: &KlineFrame, bid: &KlineFrame) -> Result<()> {
    if ask.len() != bid.len() {
        return Err(IndicatorError::LengthMismatch {
            left: ask.len(),
            right: bid.len(),
        });
    }
    match ask.timestamp.iter().zip(&bid.timestamp).position(|(a, b)| a != b) {
        Some(index) => Err(IndicatorError::TimestampMismatch {
            index,
            left: ask.timestamp[index],
            right: bid.timestamp[index],
        }),
        None => Ok(()),
    }
}

/// Bars halfway between the ask and bid bars, field by field.
pub fn middle_prices(ask: &KlineFrame, bid: &KlineFrame) -> Result<KlineFrame> {
    check_aligned(ask, bid)?;
    Ok(ask
        .iter()
        .zip(bid.iter())
        .map(|(a, b)| {
            Kline::new(
                a.timestamp,
                (a.open + b.open) / 2.0,
                (a.high + b.high) / 2.0,
                (a.low + b.low) / 2.0,
                (a.close + b.close) / 2.0,
                (a.volume + b.volume) / 2.0,
            )
        })
        .collect())
}

/// Closing spread of every bar in pips.
pub fn spread(ask: &KlineFrame, bid: &KlineFrame, pip: f64) -> Result<Vec<f64>> {
    ensure_positive("pip", pip)?;
    check_aligned(ask, bid)?;
    Ok(ask.close.iter().zip(&bid.close).map(|(a, b)| (a - b) / pip).collect())
}

/// Volume-weighted average tick price of each bar of `frame`.
///
/// Bar `i` covers `[timestamp[i], timestamp[i] + period)`. Bars without
/// tick volume are NaN.
pub fn tick_vwap(frame: &KlineFrame, period: Period, ticks: &[Tick], side: TickSide) -> Result<Vec<f64>> {
    if let Some(i) = ticks.windows(2).position(|w| w[1].timestamp < w[0].timestamp) {
        return Err(IndicatorError::UnorderedTicks {
            timestamp: ticks[i + 1].timestamp,
            previous: ticks[i].timestamp,
        });
    }

    let vwap = frame
        .timestamp
        .iter()
        .map(|&start| {
            let end = start + period.as_ms();
            let from = ticks.partition_point(|t| t.timestamp < start);
            let to = ticks.partition_point(|t| t.timestamp < end);
            let (notional, volume) = ticks[from..to.max(from)]
                .iter()
                .fold((0.0, 0.0), |(n, v), t| {
                    let vol = t.volume(side);
                    (n + t.price(side) * vol, v + vol)
                });
            if volume > 0.0 {
                notional / volume
            } else {
                f64::NAN
            }
        })
        .collect();
    Ok(vwap)
}
