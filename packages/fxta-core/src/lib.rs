//! fxta-core: technical-analysis indicator kernels.
//!
//! Every kernel is a pure function of a bar series: given a [`KlineFrame`]
//! it produces output series of the same length, with `NaN` on the bars an
//! indicator cannot yet compute (its lookback).

pub mod common;
pub mod error;
pub mod indicators;
pub mod kline;
pub mod period;
pub mod pnl;
pub mod ticks;

pub use common::RingBuffer;
pub use error::{IndicatorError, Result};
pub use indicators::{Indicator, IndicatorOutput, IndicatorSpec, MaType, StreamingIndicator};
pub use kline::{AppliedPrice, Kline, KlineFrame};
pub use period::Period;
pub use pnl::{profit_loss, PnlSeries, Position, PositionSide};
pub use ticks::{middle_prices, spread, tick_vwap, Tick, TickAggregator, TickSide};
