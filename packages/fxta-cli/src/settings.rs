use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use fxta_core::ticks::TickSide;
use fxta_core::{IndicatorSpec, Period};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputSettings {
    #[serde(default)]
    pub format: OutputFormat,
    /// Decimal places in CSV output.
    #[serde(default = "default_precision")]
    pub precision: usize,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            precision: default_precision(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TickSettings {
    #[serde(default = "default_tick_period")]
    pub period: Period,
    #[serde(default = "default_pip")]
    pub pip: f64,
    #[serde(default)]
    pub side: TickSide,
}

impl Default for TickSettings {
    fn default() -> Self {
        Self {
            period: default_tick_period(),
            pip: default_pip(),
            side: TickSide::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default = "default_indicators")]
    pub indicators: Vec<IndicatorSpec>,
    #[serde(default)]
    pub ticks: TickSettings,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_precision() -> usize {
    6
}

fn default_tick_period() -> Period {
    Period::MINUTE
}

fn default_pip() -> f64 {
    0.0001
}

fn default_indicators() -> Vec<IndicatorSpec> {
    vec![
        IndicatorSpec::Sma {
            period: 20,
            price: Default::default(),
        },
        IndicatorSpec::Rsi {
            period: 14,
            price: Default::default(),
        },
    ]
}

impl Settings {
    /// Optional config file (format by extension), then `FXTA_*` variables,
    /// e.g. `FXTA_LOG_LEVEL=debug` or `FXTA_OUTPUT__FORMAT=json`.
    pub fn new(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path));
        }
        builder
            .add_source(
                Environment::with_prefix("FXTA")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }
}
