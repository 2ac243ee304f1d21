//! Contract checks run against every kind in the catalog.

use fxta_core::indicators::catalog;
use fxta_core::{IndicatorError, IndicatorSpec, Kline, KlineFrame};

const BARS: usize = 400;

/// Hourly bars with a trend, two cycles and some wick noise.
fn sample_frame() -> KlineFrame {
    let mut price: f64 = 1.2500;
    (0..BARS)
        .map(|i| {
            let t = i as f64;
            let open = price;
            let close = open + (t * 0.11).sin() * 0.0012 + (t * 0.023).cos() * 0.0005 + 0.00002;
            let wick = 0.0003 + ((t * 1.7).sin().abs()) * 0.0004;
            price = close;
            Kline::new(
                i as i64 * 3_600_000,
                open,
                open.max(close) + wick,
                open.min(close) - wick,
                close,
                1_000.0 + (i % 37) as f64 * 10.0,
            )
        })
        .collect()
}

fn kind(spec: &IndicatorSpec) -> String {
    let value = serde_json::to_value(spec).unwrap();
    value["kind"].as_str().unwrap().to_string()
}

fn is_sparse(kind: &str) -> bool {
    matches!(kind, "zigzag" | "fractals" | "pivot" | "regression_channel")
}

fn is_window_exact(kind: &str) -> bool {
    matches!(
        kind,
        "sma" | "lwma" | "bbands" | "stochastic" | "cci" | "willr" | "momentum" | "linreg" | "murrey" | "ichimoku"
            | "fractals"
    )
}

#[test]
fn outputs_cover_every_bar() {
    let frame = sample_frame();
    for spec in catalog() {
        let indicator = spec.build().unwrap();
        let out = indicator.calculate(&frame);

        assert_eq!(out.series_count(), indicator.output_names().len(), "{}", indicator.name());
        assert_eq!(out.names().collect::<Vec<_>>(), indicator.output_names(), "{}", indicator.name());
        for (name, series) in out.iter() {
            assert_eq!(series.len(), BARS, "{} {name}", indicator.name());
        }
    }
}

#[test]
fn nothing_before_lookback() {
    let frame = sample_frame();
    for spec in catalog() {
        let indicator = spec.build().unwrap();
        let lookback = indicator.lookback();
        assert!(lookback < BARS);

        let out = indicator.calculate(&frame);
        assert!(
            out.primary()[..lookback].iter().all(|v| v.is_nan()),
            "{} defined before bar {lookback}",
            indicator.name()
        );

        if !is_sparse(&kind(&spec)) {
            assert!(
                out.primary()[lookback].is_finite(),
                "{} undefined at its lookback {lookback}",
                indicator.name()
            );
        }
    }
}

#[test]
fn range_matches_full_calculation() {
    let frame = sample_frame();
    for spec in catalog() {
        let indicator = spec.build().unwrap();
        let kind = kind(&spec);
        if !(indicator.uses_full_history() || is_window_exact(&kind)) {
            continue;
        }

        let from = indicator.lookback() + 7;
        let to = BARS - 1 - indicator.lookforward() - 3;
        let full = indicator.calculate(&frame);
        let part = indicator.calculate_range(&frame, from, to).unwrap();
        assert_eq!(part.len(), to - from + 1, "{}", indicator.name());

        for (i, (a, b)) in part.primary().iter().zip(&full.primary()[from..=to]).enumerate() {
            let same = (a.is_nan() && b.is_nan()) || (a - b).abs() < 1e-9;
            assert!(same, "{} bar {}: {a} vs {b}", indicator.name(), from + i);
        }
    }
}

#[test]
fn recursive_range_is_seeded_in_window() {
    let frame = sample_frame();
    for kind in ["ema", "smma", "rsi", "atr", "macd"] {
        let spec: IndicatorSpec = serde_json::from_str(&format!(r#"{{"kind": "{kind}"}}"#)).unwrap();
        let indicator = spec.build().unwrap();
        let from = indicator.lookback();
        let part = indicator.calculate_range(&frame, from, from + 50).unwrap();
        assert_eq!(part.len(), 51);
        assert!(part.primary().iter().all(|v| v.is_finite()), "{kind}");
    }
}

#[test]
fn range_errors() {
    let frame = sample_frame();
    let indicator = IndicatorSpec::Fractals { bars: 2 }.build().unwrap();

    assert!(matches!(
        indicator.calculate_range(&frame, 1, 10),
        Err(IndicatorError::InsufficientData { .. })
    ));
    assert!(matches!(
        indicator.calculate_range(&frame, 10, BARS - 2),
        Err(IndicatorError::InsufficientData { .. })
    ));
    assert!(matches!(
        indicator.calculate_range(&frame, 10, BARS),
        Err(IndicatorError::InvalidRange { .. })
    ));
}

#[test]
fn short_input_never_panics() {
    let frame = sample_frame().slice(0, 3);
    for spec in catalog() {
        let out = spec.build().unwrap().calculate(&frame);
        assert_eq!(out.len(), 3);
    }
    let empty = KlineFrame::new();
    for spec in catalog() {
        assert!(spec.build().unwrap().calculate(&empty).is_empty());
    }
}
