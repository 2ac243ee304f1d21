//! Reading bars, ticks and positions; writing result tables.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use fxta_core::KlineFrame;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::settings::OutputFormat;

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Reads a CSV file with a header row, or a JSON array when the file ends in `.json`.
pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if is_json(path) {
        let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        return serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let mut records = Vec::new();
    for (line, row) in reader.deserialize().enumerate() {
        let record = row.with_context(|| format!("{} record {}", path.display(), line + 1))?;
        records.push(record);
    }
    Ok(records)
}

/// Bars from CSV (`timestamp,open,high,low,close,volume`) or JSON; JSON
/// prices may be numeric strings. Every price and volume must be a finite
/// number.
pub fn read_bars(path: &Path) -> Result<KlineFrame> {
    let frame = if is_json(path) {
        let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        KlineFrame::from_json_flexible(&text).with_context(|| format!("parsing {}", path.display()))?
    } else {
        KlineFrame::from_klines(&read_records(path)?)
    };

    if let Some(i) = frame.timestamp.windows(2).position(|w| w[1] <= w[0]) {
        bail!(
            "{}: bar timestamps must increase ({} follows {})",
            path.display(),
            frame.timestamp[i + 1],
            frame.timestamp[i]
        );
    }

    for (field, values) in [
        ("open", &frame.open),
        ("high", &frame.high),
        ("low", &frame.low),
        ("close", &frame.close),
        ("volume", &frame.volume),
    ] {
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            bail!(
                "{}: bar {i} (timestamp {}) has a non-numeric {field}",
                path.display(),
                frame.timestamp[i]
            );
        }
    }
    Ok(frame)
}

/// Columns of equal length keyed by bar timestamp.
#[derive(Debug, Default)]
pub struct Table {
    columns: Vec<String>,
    timestamps: Vec<i64>,
    values: Vec<Vec<f64>>,
}

impl Table {
    pub fn new(timestamps: Vec<i64>) -> Self {
        Self {
            timestamps,
            ..Default::default()
        }
    }

    pub fn push(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        if values.len() != self.timestamps.len() {
            bail!(
                "column {name} has {} values for {} bars",
                values.len(),
                self.timestamps.len()
            );
        }
        self.columns.push(name);
        self.values.push(values);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Keeps rows `from..=to`.
    pub fn rows(mut self, from: usize, to: usize) -> Result<Self> {
        if from > to || to >= self.len() {
            bail!("row range {from}..={to} outside 0..{}", self.len());
        }
        self.timestamps = self.timestamps[from..=to].to_vec();
        for column in &mut self.values {
            *column = column[from..=to].to_vec();
        }
        Ok(self)
    }

    pub fn write<W: Write>(&self, out: W, format: OutputFormat, precision: usize) -> Result<()> {
        match format {
            OutputFormat::Csv => self.write_csv(out, precision),
            OutputFormat::Json => self.write_json(out),
        }
    }

    /// NaN is written as an empty field.
    fn write_csv<W: Write>(&self, out: W, precision: usize) -> Result<()> {
        let mut writer = csv::Writer::from_writer(out);
        let mut header = vec!["timestamp".to_string()];
        header.extend(self.columns.iter().cloned());
        writer.write_record(&header)?;

        for (row, ts) in self.timestamps.iter().enumerate() {
            let mut record = Vec::with_capacity(self.columns.len() + 1);
            record.push(ts.to_string());
            for column in &self.values {
                let v = column[row];
                record.push(if v.is_finite() {
                    format!("{v:.precision$}")
                } else {
                    String::new()
                });
            }
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// One object per row; NaN is written as null.
    fn write_json<W: Write>(&self, mut out: W) -> Result<()> {
        let rows: Vec<Value> = self
            .timestamps
            .iter()
            .enumerate()
            .map(|(row, ts)| {
                let mut object = Map::new();
                object.insert("timestamp".to_string(), Value::from(*ts));
                for (name, column) in self.columns.iter().zip(&self.values) {
                    // from_f64 rejects non-finite values
                    let value = serde_json::Number::from_f64(column[row]).map_or(Value::Null, Value::Number);
                    object.insert(name.clone(), value);
                }
                Value::Object(object)
            })
            .collect();
        serde_json::to_writer_pretty(&mut out, &rows)?;
        writeln!(out)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxta_core::{Position, PositionSide, Tick};

    fn temp_file(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("fxta-io-{}-{name}", std::process::id()));
        fs::write(&path, contents).unwrap();
        path
    }

    fn table() -> Table {
        let mut table = Table::new(vec![0, 60_000, 120_000]);
        table.push("sma", vec![f64::NAN, 1.5, 2.25]).unwrap();
        table.push("rsi", vec![f64::NAN, f64::NAN, 70.0]).unwrap();
        table
    }

    #[test]
    fn test_read_bars_csv_and_json() {
        let csv = temp_file(
            "bars.csv",
            "timestamp,open,high,low,close,volume\n0,1.1,1.2,1.0,1.15,10\n60000,1.15,1.25,1.1,1.2,12\n",
        );
        let frame = read_bars(&csv).unwrap();
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.close, vec![1.15, 1.2]);

        let json = temp_file(
            "bars.json",
            r#"[{"timestamp": 0, "open": "1.1", "high": "1.2", "low": 1.0, "close": 1.15, "volume": 10}]"#,
        );
        let frame = read_bars(&json).unwrap();
        assert_eq!(frame.open, vec![1.1]);

        fs::remove_file(csv).ok();
        fs::remove_file(json).ok();
    }

    #[test]
    fn test_unordered_bars_rejected() {
        let csv = temp_file(
            "unordered.csv",
            "timestamp,open,high,low,close,volume\n60000,1,1,1,1,0\n0,1,1,1,1,0\n",
        );
        assert!(read_bars(&csv).is_err());
        fs::remove_file(csv).ok();
    }

    #[test]
    fn test_non_numeric_prices_rejected() {
        let json = temp_file(
            "bad-price.json",
            r#"[{"timestamp": 0, "open": 1.1, "high": 1.2, "low": 1.0, "close": 1.15},
                {"timestamp": 60000, "open": "1.15", "high": "n/a", "low": 1.1, "close": 1.2}]"#,
        );
        let err = read_bars(&json).unwrap_err().to_string();
        assert!(err.contains("bar 1"), "{err}");
        assert!(err.contains("high"), "{err}");

        let csv = temp_file(
            "nan-close.csv",
            "timestamp,open,high,low,close,volume\n0,1.1,1.2,1.0,NaN,10\n",
        );
        assert!(read_bars(&csv).is_err());

        fs::remove_file(json).ok();
        fs::remove_file(csv).ok();
    }

    #[test]
    fn test_read_ticks_and_positions() {
        let ticks = temp_file("ticks.csv", "timestamp,ask,bid\n0,1.1002,1.1000\n500,1.1003,1.1001\n");
        let ticks: Vec<Tick> = read_records(&ticks).unwrap();
        assert_eq!(ticks.len(), 2);
        assert_eq!(ticks[1].ask_volume, 0.0);

        let positions = temp_file(
            "positions.csv",
            "side,amount,open_time,open_price,close_time,close_price\n\
             long,1000,0,1.1,60000,1.2\n\
             short,500,60000,1.2,,\n",
        );
        let positions: Vec<Position> = read_records(&positions).unwrap();
        assert_eq!(positions[0].close_time, Some(60_000));
        assert_eq!(positions[1].side, PositionSide::Short);
        assert!(positions[1].close_price.is_none());
    }

    #[test]
    fn test_write_csv() {
        let mut out = Vec::new();
        table().write(&mut out, OutputFormat::Csv, 2).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "timestamp,sma,rsi\n0,,\n60000,1.50,\n120000,2.25,70.00\n");
    }

    #[test]
    fn test_write_json() {
        let mut out = Vec::new();
        table().rows(1, 2).unwrap().write(&mut out, OutputFormat::Json, 6).unwrap();
        let rows: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["timestamp"], 60_000);
        assert_eq!(rows[0]["sma"], 1.5);
        assert!(rows[0]["rsi"].is_null());
        assert_eq!(rows[1]["rsi"], 70.0);
    }

    #[test]
    fn test_table_checks() {
        let mut table = table();
        assert!(table.push("short", vec![1.0]).is_err());
        assert!(table.rows(2, 3).is_err());
    }
}
