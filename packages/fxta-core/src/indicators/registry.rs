//! Declarative indicator specs.
//!
//! An [`IndicatorSpec`] is the serializable description of one indicator,
//! e.g. `{"kind": "ema", "period": 21}`. Missing parameters take the usual
//! defaults; [`IndicatorSpec::build`] validates them.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    AtrIndicator, BollingerIndicator, Cci, Fractals, Ichimoku, Indicator, LinearRegression, Ma,
    MacdIndicator, MaType, Mama, Momentum, MurreyChannels, PivotKind, PivotPoints,
    RegressionChannel, RsiIndicator, Stochastic, SuperTrend, TdCombo, TdSequential, TdSetup,
    WilliamsR, ZigZag,
};
use crate::error::Result;
use crate::kline::AppliedPrice;
use crate::period::Period;

mod defaults {
    use crate::period::Period;

    pub fn period() -> usize {
        14
    }
    pub fn ma_period() -> usize {
        20
    }
    pub fn fast() -> usize {
        12
    }
    pub fn slow() -> usize {
        26
    }
    pub fn signal() -> usize {
        9
    }
    pub fn deviations() -> f64 {
        2.0
    }
    pub fn fast_k() -> usize {
        5
    }
    pub fn slow_k() -> usize {
        3
    }
    pub fn supertrend_period() -> usize {
        10
    }
    pub fn multiplier() -> f64 {
        3.0
    }
    pub fn tenkan() -> usize {
        9
    }
    pub fn kijun() -> usize {
        26
    }
    pub fn senkou_b() -> usize {
        52
    }
    pub fn fast_limit() -> f64 {
        0.5
    }
    pub fn slow_limit() -> f64 {
        0.05
    }
    pub fn median() -> crate::kline::AppliedPrice {
        crate::kline::AppliedPrice::Median
    }
    pub fn murrey_period() -> usize {
        64
    }
    pub fn depth() -> usize {
        12
    }
    pub fn backstep() -> usize {
        3
    }
    pub fn channel_period() -> usize {
        100
    }
    pub fn degree() -> usize {
        1
    }
    pub fn session() -> Period {
        Period::DAY
    }
    pub fn momentum_period() -> usize {
        10
    }
    pub fn bars() -> usize {
        2
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndicatorSpec {
    Sma {
        #[serde(default = "defaults::ma_period")]
        period: usize,
        #[serde(default)]
        price: AppliedPrice,
    },
    Ema {
        #[serde(default = "defaults::ma_period")]
        period: usize,
        #[serde(default)]
        price: AppliedPrice,
    },
    Smma {
        #[serde(default = "defaults::ma_period")]
        period: usize,
        #[serde(default)]
        price: AppliedPrice,
    },
    Lwma {
        #[serde(default = "defaults::ma_period")]
        period: usize,
        #[serde(default)]
        price: AppliedPrice,
    },
    Rsi {
        #[serde(default = "defaults::period")]
        period: usize,
        #[serde(default)]
        price: AppliedPrice,
    },
    Atr {
        #[serde(default = "defaults::period")]
        period: usize,
    },
    Macd {
        #[serde(default = "defaults::fast")]
        fast: usize,
        #[serde(default = "defaults::slow")]
        slow: usize,
        #[serde(default = "defaults::signal")]
        signal: usize,
        #[serde(default)]
        price: AppliedPrice,
    },
    #[serde(rename = "bbands")]
    Bollinger {
        #[serde(default = "defaults::ma_period")]
        period: usize,
        #[serde(default = "defaults::deviations")]
        deviations: f64,
        #[serde(default)]
        price: AppliedPrice,
    },
    Stochastic {
        #[serde(default = "defaults::fast_k")]
        fast_k: usize,
        #[serde(default = "defaults::slow_k")]
        slow_k: usize,
        #[serde(default)]
        slow_k_ma: MaType,
        #[serde(default = "defaults::slow_k")]
        slow_d: usize,
        #[serde(default)]
        slow_d_ma: MaType,
    },
    #[serde(rename = "supertrend")]
    SuperTrend {
        #[serde(default = "defaults::supertrend_period")]
        period: usize,
        #[serde(default = "defaults::multiplier")]
        multiplier: f64,
    },
    Ichimoku {
        #[serde(default = "defaults::tenkan")]
        tenkan: usize,
        #[serde(default = "defaults::kijun")]
        kijun: usize,
        #[serde(default = "defaults::senkou_b")]
        senkou_b: usize,
        #[serde(default = "defaults::kijun")]
        displacement: usize,
    },
    Mama {
        #[serde(default = "defaults::fast_limit")]
        fast_limit: f64,
        #[serde(default = "defaults::slow_limit")]
        slow_limit: f64,
        #[serde(default = "defaults::median")]
        price: AppliedPrice,
    },
    Murrey {
        #[serde(default = "defaults::murrey_period")]
        period: usize,
    },
    TdSetup,
    TdSequential,
    TdCombo,
    #[serde(rename = "zigzag")]
    ZigZag {
        #[serde(default = "defaults::depth")]
        depth: usize,
        #[serde(default)]
        deviation: f64,
        #[serde(default = "defaults::backstep")]
        backstep: usize,
    },
    #[serde(rename = "linreg")]
    LinearRegression {
        #[serde(default = "defaults::period")]
        period: usize,
        #[serde(default)]
        price: AppliedPrice,
    },
    RegressionChannel {
        #[serde(default = "defaults::channel_period")]
        period: usize,
        #[serde(default = "defaults::degree")]
        degree: usize,
        #[serde(default = "defaults::deviations")]
        deviations: f64,
        #[serde(default)]
        price: AppliedPrice,
    },
    Pivot {
        #[serde(default)]
        method: PivotKind,
        #[serde(default = "defaults::session")]
        session: Period,
    },
    Cci {
        #[serde(default = "defaults::period")]
        period: usize,
    },
    #[serde(rename = "willr")]
    WilliamsR {
        #[serde(default = "defaults::period")]
        period: usize,
    },
    Momentum {
        #[serde(default = "defaults::momentum_period")]
        period: usize,
        #[serde(default)]
        price: AppliedPrice,
    },
    Fractals {
        #[serde(default = "defaults::bars")]
        bars: usize,
    },
}

impl IndicatorSpec {
    /// Validates the parameters and instantiates the indicator.
    pub fn build(&self) -> Result<Box<dyn Indicator>> {
        let indicator: Box<dyn Indicator> = match *self {
            IndicatorSpec::Sma { period, price } => Box::new(Ma::new(period, MaType::Sma, price)?),
            IndicatorSpec::Ema { period, price } => Box::new(Ma::new(period, MaType::Ema, price)?),
            IndicatorSpec::Smma { period, price } => Box::new(Ma::new(period, MaType::Smma, price)?),
            IndicatorSpec::Lwma { period, price } => Box::new(Ma::new(period, MaType::Lwma, price)?),
            IndicatorSpec::Rsi { period, price } => Box::new(RsiIndicator::new(period, price)?),
            IndicatorSpec::Atr { period } => Box::new(AtrIndicator::new(period)?),
            IndicatorSpec::Macd {
                fast,
                slow,
                signal,
                price,
            } => Box::new(MacdIndicator::new(fast, slow, signal, price)?),
            IndicatorSpec::Bollinger {
                period,
                deviations,
                price,
            } => Box::new(BollingerIndicator::new(period, deviations, price)?),
            IndicatorSpec::Stochastic {
                fast_k,
                slow_k,
                slow_k_ma,
                slow_d,
                slow_d_ma,
            } => Box::new(Stochastic::new(fast_k, slow_k, slow_k_ma, slow_d, slow_d_ma)?),
            IndicatorSpec::SuperTrend { period, multiplier } => Box::new(SuperTrend::new(period, multiplier)?),
            IndicatorSpec::Ichimoku {
                tenkan,
                kijun,
                senkou_b,
                displacement,
            } => Box::new(Ichimoku::new(tenkan, kijun, senkou_b, displacement)?),
            IndicatorSpec::Mama {
                fast_limit,
                slow_limit,
                price,
            } => Box::new(Mama::new(fast_limit, slow_limit, price)?),
            IndicatorSpec::Murrey { period } => Box::new(MurreyChannels::new(period)?),
            IndicatorSpec::TdSetup => Box::new(TdSetup),
            IndicatorSpec::TdSequential => Box::new(TdSequential),
            IndicatorSpec::TdCombo => Box::new(TdCombo),
            IndicatorSpec::ZigZag {
                depth,
                deviation,
                backstep,
            } => Box::new(ZigZag::new(depth, deviation, backstep)?),
            IndicatorSpec::LinearRegression { period, price } => Box::new(LinearRegression::new(period, price)?),
            IndicatorSpec::RegressionChannel {
                period,
                degree,
                deviations,
                price,
            } => Box::new(RegressionChannel::new(period, degree, deviations, price)?),
            IndicatorSpec::Pivot { method, session } => Box::new(PivotPoints::new(method, session)),
            IndicatorSpec::Cci { period } => Box::new(Cci::new(period)?),
            IndicatorSpec::WilliamsR { period } => Box::new(WilliamsR::new(period)?),
            IndicatorSpec::Momentum { period, price } => Box::new(Momentum::new(period, price)?),
            IndicatorSpec::Fractals { bars } => Box::new(Fractals::new(bars)?),
        };
        debug!(indicator = %indicator.name(), "indicator built");
        Ok(indicator)
    }
}

/// Every indicator kind with its default parameters.
pub fn catalog() -> Vec<IndicatorSpec> {
    let price = AppliedPrice::default();
    vec![
        IndicatorSpec::Sma {
            period: defaults::ma_period(),
            price,
        },
        IndicatorSpec::Ema {
            period: defaults::ma_period(),
            price,
        },
        IndicatorSpec::Smma {
            period: defaults::ma_period(),
            price,
        },
        IndicatorSpec::Lwma {
            period: defaults::ma_period(),
            price,
        },
        IndicatorSpec::Rsi {
            period: defaults::period(),
            price,
        },
        IndicatorSpec::Atr {
            period: defaults::period(),
        },
        IndicatorSpec::Macd {
            fast: defaults::fast(),
            slow: defaults::slow(),
            signal: defaults::signal(),
            price,
        },
        IndicatorSpec::Bollinger {
            period: defaults::ma_period(),
            deviations: defaults::deviations(),
            price,
        },
        IndicatorSpec::Stochastic {
            fast_k: defaults::fast_k(),
            slow_k: defaults::slow_k(),
            slow_k_ma: MaType::Sma,
            slow_d: defaults::slow_k(),
            slow_d_ma: MaType::Sma,
        },
        IndicatorSpec::SuperTrend {
            period: defaults::supertrend_period(),
            multiplier: defaults::multiplier(),
        },
        IndicatorSpec::Ichimoku {
            tenkan: defaults::tenkan(),
            kijun: defaults::kijun(),
            senkou_b: defaults::senkou_b(),
            displacement: defaults::kijun(),
        },
        IndicatorSpec::Mama {
            fast_limit: defaults::fast_limit(),
            slow_limit: defaults::slow_limit(),
            price: defaults::median(),
        },
        IndicatorSpec::Murrey {
            period: defaults::murrey_period(),
        },
        IndicatorSpec::TdSetup,
        IndicatorSpec::TdSequential,
        IndicatorSpec::TdCombo,
        IndicatorSpec::ZigZag {
            depth: defaults::depth(),
            deviation: 0.0,
            backstep: defaults::backstep(),
        },
        IndicatorSpec::LinearRegression {
            period: defaults::period(),
            price,
        },
        IndicatorSpec::RegressionChannel {
            period: defaults::channel_period(),
            degree: defaults::degree(),
            deviations: defaults::deviations(),
            price,
        },
        IndicatorSpec::Pivot {
            method: PivotKind::Classic,
            session: defaults::session(),
        },
        IndicatorSpec::Cci {
            period: defaults::period(),
        },
        IndicatorSpec::WilliamsR {
            period: defaults::period(),
        },
        IndicatorSpec::Momentum {
            period: defaults::momentum_period(),
            price,
        },
        IndicatorSpec::Fractals {
            bars: defaults::bars(),
        },
    ]
}
