//! `fxta`: run indicators over bar files, aggregate ticks, mark positions.

mod io;
mod logging;
mod settings;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fxta_core::ticks::TickSide;
use fxta_core::{middle_prices, profit_loss, spread, tick_vwap, IndicatorSpec, Period, Position, Tick, TickAggregator};
use serde_json::json;
use tracing::info;

use crate::io::{read_bars, read_records, Table};
use crate::settings::{OutputFormat, Settings};

#[derive(Debug, Parser)]
#[command(name = "fxta", version, about = "Forex technical analysis indicators")]
struct Cli {
    /// Config file (toml, json or yaml); FXTA_* variables override it.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format, overriding the configured one.
    #[arg(short, long, global = true, value_enum)]
    format: Option<OutputFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print every indicator kind with its default parameters.
    List,
    /// Calculate indicators over a bar file.
    Compute {
        /// Bars as CSV or JSON.
        #[arg(short, long)]
        bars: PathBuf,
        /// Indicator as JSON, e.g. '{"kind":"ema","period":50}'. Repeatable;
        /// replaces the configured list.
        #[arg(short, long = "indicator", value_parser = parse_spec)]
        indicators: Vec<IndicatorSpec>,
        /// First bar to output.
        #[arg(long, requires = "to")]
        from: Option<usize>,
        /// Last bar to output.
        #[arg(long, requires = "from")]
        to: Option<usize>,
    },
    /// Aggregate ticks into middle-price bars with spread and VWAP.
    Ticks {
        #[arg(short, long)]
        ticks: PathBuf,
        #[arg(short, long)]
        period: Option<Period>,
        #[arg(long)]
        pip: Option<f64>,
        /// Side used for the VWAP column: ask or bid.
        #[arg(long, value_parser = parse_side)]
        side: Option<TickSide>,
    },
    /// Per-bar realized and unrealized profit of a set of positions.
    Pnl {
        #[arg(short, long)]
        bars: PathBuf,
        #[arg(short, long)]
        positions: PathBuf,
        #[arg(long, requires = "to")]
        from: Option<usize>,
        #[arg(long, requires = "from")]
        to: Option<usize>,
    },
}

fn parse_spec(s: &str) -> Result<IndicatorSpec, String> {
    serde_json::from_str(s).map_err(|e| format!("invalid indicator {s}: {e}"))
}

fn parse_side(s: &str) -> Result<TickSide, String> {
    serde_json::from_value(json!(s.to_ascii_lowercase())).map_err(|_| format!("unknown side {s}, expected ask or bid"))
}

fn main() {
    // configuration errors happen before logging is set up
    if let Err(e) = run() {
        eprintln!("{}", error_message(&e));
        std::process::exit(1);
    }
}

/// The single line printed on failure, with the whole context chain.
fn error_message(e: &anyhow::Error) -> String {
    format!("error: {e:#}")
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::new(cli.config.as_deref()).context("loading configuration")?;
    logging::init_logging(&settings.log_level);

    let format = cli.format.unwrap_or(settings.output.format);
    let table = match cli.command {
        Command::List => return list(),
        Command::Compute {
            bars,
            indicators,
            from,
            to,
        } => {
            let specs = if indicators.is_empty() {
                settings.indicators.clone()
            } else {
                indicators
            };
            let range = from.zip(to);
            compute(&bars, &specs, range)?
        }
        Command::Ticks {
            ticks,
            period,
            pip,
            side,
        } => tick_bars(
            &ticks,
            period.unwrap_or(settings.ticks.period),
            pip.unwrap_or(settings.ticks.pip),
            side.unwrap_or(settings.ticks.side),
        )?,
        Command::Pnl {
            bars,
            positions,
            from,
            to,
        } => {
            let table = pnl(&bars, &positions)?;
            match from.zip(to) {
                Some((from, to)) => table.rows(from, to)?,
                None => table,
            }
        }
    };

    info!(rows = table.len(), columns = table.columns().len(), "writing output");
    let stdout = std::io::stdout();
    table.write(stdout.lock(), format, settings.output.precision)
}

fn list() -> Result<()> {
    let mut entries = Vec::new();
    for spec in fxta_core::indicators::catalog() {
        let indicator = spec.build()?;
        entries.push(json!({
            "spec": spec,
            "name": indicator.name(),
            "lookback": indicator.lookback(),
            "lookforward": indicator.lookforward(),
            "outputs": indicator.output_names(),
        }));
    }
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

/// Column per output, named `<indicator>` for single-output indicators
/// and `<indicator>.<output>` otherwise.
fn compute(bars: &Path, specs: &[IndicatorSpec], range: Option<(usize, usize)>) -> Result<Table> {
    let frame = read_bars(bars)?;
    info!(bars = frame.len(), indicators = specs.len(), "computing");

    let mut table = match range {
        Some((from, to)) => {
            anyhow::ensure!(from <= to && to < frame.len(), "bar range {from}..={to} outside 0..{}", frame.len());
            Table::new(frame.timestamp[from..=to].to_vec())
        }
        None => Table::new(frame.timestamp.clone()),
    };

    for spec in specs {
        let indicator = spec.build().with_context(|| format!("building {spec:?}"))?;
        let name = indicator.name();
        let output = match range {
            Some((from, to)) => indicator
                .calculate_range(&frame, from, to)
                .with_context(|| format!("{name} over bars {from}..={to}"))?,
            None => indicator.calculate(&frame),
        };
        let single = output.series_count() == 1;
        for (series, values) in output.iter() {
            let column = if single { name.clone() } else { format!("{name}.{series}") };
            table.push(column, values.to_vec())?;
        }
    }
    Ok(table)
}

fn tick_bars(path: &Path, period: Period, pip: f64, side: TickSide) -> Result<Table> {
    let ticks: Vec<Tick> = read_records(path)?;
    let aggregator = TickAggregator::from_ticks(period, &ticks).with_context(|| format!("aggregating {}", path.display()))?;
    let (ask, bid) = aggregator.into_frames();
    let mid = middle_prices(&ask, &bid)?;

    let mut table = Table::new(mid.timestamp.clone());
    table.push("open", mid.open.clone())?;
    table.push("high", mid.high.clone())?;
    table.push("low", mid.low.clone())?;
    table.push("close", mid.close.clone())?;
    table.push("spread", spread(&ask, &bid, pip)?)?;
    table.push("vwap", tick_vwap(&mid, period, &ticks, side)?)?;
    Ok(table)
}

fn pnl(bars: &Path, positions: &Path) -> Result<Table> {
    let frame = read_bars(bars)?;
    let positions: Vec<Position> = read_records(positions)?;
    let pnl = profit_loss(&frame, &positions)?;

    let mut table = Table::new(frame.timestamp.clone());
    table.push("realized", pnl.realized)?;
    table.push("unrealized", pnl.unrealized)?;
    table.push("total", pnl.total)?;
    Ok(table)
}
