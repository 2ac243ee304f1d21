//! Bar data.
//!
//! - `Kline`: one OHLCV bar (AoS), the unit of streaming updates
//! - `KlineFrame`: column storage (SoA), the input of batch calculation

use serde::{Deserialize, Serialize};

/// One OHLCV bar. `timestamp` is the bar open time in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kline {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Kline {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    pub fn price(&self, applied: AppliedPrice) -> f64 {
        applied.extract(self.open, self.high, self.low, self.close, self.volume)
    }
}

/// Which price of a bar feeds a single-input indicator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppliedPrice {
    Open,
    High,
    Low,
    #[default]
    Close,
    Volume,
    /// (H + L) / 2
    Median,
    /// (H + L + C) / 3
    Typical,
    /// (H + L + 2C) / 4
    Weighted,
    /// (O + H + L + C) / 4
    Average,
}

impl AppliedPrice {
    #[inline]
    fn extract(self, open: f64, high: f64, low: f64, close: f64, volume: f64) -> f64 {
        match self {
            AppliedPrice::Open => open,
            AppliedPrice::High => high,
            AppliedPrice::Low => low,
            AppliedPrice::Close => close,
            AppliedPrice::Volume => volume,
            AppliedPrice::Median => (high + low) / 2.0,
            AppliedPrice::Typical => (high + low + close) / 3.0,
            AppliedPrice::Weighted => (high + low + 2.0 * close) / 4.0,
            AppliedPrice::Average => (open + high + low + close) / 4.0,
        }
    }
}

/// Column-oriented bar series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KlineFrame {
    pub timestamp: Vec<i64>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub volume: Vec<f64>,
}

impl KlineFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            timestamp: Vec::with_capacity(capacity),
            open: Vec::with_capacity(capacity),
            high: Vec::with_capacity(capacity),
            low: Vec::with_capacity(capacity),
            close: Vec::with_capacity(capacity),
            volume: Vec::with_capacity(capacity),
        }
    }

    pub fn from_klines(klines: &[Kline]) -> Self {
        let mut frame = Self::with_capacity(klines.len());
        for kline in klines {
            frame.push(kline);
        }
        frame
    }

    pub fn push(&mut self, kline: &Kline) {
        self.timestamp.push(kline.timestamp);
        self.open.push(kline.open);
        self.high.push(kline.high);
        self.low.push(kline.low);
        self.close.push(kline.close);
        self.volume.push(kline.volume);
    }

    /// Replaces the last bar. Does nothing on an empty frame.
    pub fn update_last(&mut self, kline: &Kline) {
        let Some(i) = self.len().checked_sub(1) else {
            return;
        };
        self.timestamp[i] = kline.timestamp;
        self.open[i] = kline.open;
        self.high[i] = kline.high;
        self.low[i] = kline.low;
        self.close[i] = kline.close;
        self.volume[i] = kline.volume;
    }

    pub fn get(&self, index: usize) -> Option<Kline> {
        if index >= self.len() {
            return None;
        }
        Some(Kline {
            timestamp: self.timestamp[index],
            open: self.open[index],
            high: self.high[index],
            low: self.low[index],
            close: self.close[index],
            volume: self.volume[index],
        })
    }

    pub fn last(&self) -> Option<Kline> {
        self.len().checked_sub(1).and_then(|i| self.get(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = Kline> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// Copy of bars `start..end` (clamped to the frame).
    pub fn slice(&self, start: usize, end: usize) -> Self {
        let end = end.min(self.len());
        let start = start.min(end);
        Self {
            timestamp: self.timestamp[start..end].to_vec(),
            open: self.open[start..end].to_vec(),
            high: self.high[start..end].to_vec(),
            low: self.low[start..end].to_vec(),
            close: self.close[start..end].to_vec(),
            volume: self.volume[start..end].to_vec(),
        }
    }

    /// The selected price of every bar.
    pub fn price(&self, applied: AppliedPrice) -> Vec<f64> {
        match applied {
            AppliedPrice::Open => self.open.clone(),
            AppliedPrice::High => self.high.clone(),
            AppliedPrice::Low => self.low.clone(),
            AppliedPrice::Close => self.close.clone(),
            AppliedPrice::Volume => self.volume.clone(),
            _ => (0..self.len())
                .map(|i| {
                    applied.extract(
                        self.open[i],
                        self.high[i],
                        self.low[i],
                        self.close[i],
                        self.volume[i],
                    )
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.timestamp.clear();
        self.open.clear();
        self.high.clear();
        self.low.clear();
        self.close.clear();
        self.volume.clear();
    }

    /// Imports a JSON array of klines.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let klines: Vec<Kline> = serde_json::from_str(json)?;
        Ok(Self::from_klines(&klines))
    }

    /// Imports a JSON array where prices may be numbers or numeric strings,
    /// as exchange APIs commonly return them. Unparseable prices become NaN.
    pub fn from_json_flexible(json: &str) -> Result<Self, serde_json::Error> {
        #[derive(Deserialize)]
        struct KlineIn {
            timestamp: i64,
            open: serde_json::Value,
            high: serde_json::Value,
            low: serde_json::Value,
            close: serde_json::Value,
            #[serde(default)]
            volume: serde_json::Value,
        }

        fn to_f64(v: &serde_json::Value) -> f64 {
            match v {
                serde_json::Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
                serde_json::Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
                serde_json::Value::Null => 0.0,
                _ => f64::NAN,
            }
        }

        let rows: Vec<KlineIn> = serde_json::from_str(json)?;
        let mut frame = Self::with_capacity(rows.len());
        for k in &rows {
            frame.push(&Kline {
                timestamp: k.timestamp,
                open: to_f64(&k.open),
                high: to_f64(&k.high),
                low: to_f64(&k.low),
                close: to_f64(&k.close),
                volume: to_f64(&k.volume),
            });
        }
        Ok(frame)
    }
}

impl FromIterator<Kline> for KlineFrame {
    fn from_iter<I: IntoIterator<Item = Kline>>(iter: I) -> Self {
        let mut frame = Self::new();
        for kline in iter {
            frame.push(&kline);
        }
        frame
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Bars with close = given price, high/low one unit away, volume 100.
    pub(crate) fn frame_from_closes(closes: &[f64]) -> KlineFrame {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Kline::new(i as i64 * 60_000, c, c + 1.0, c - 1.0, c, 100.0))
            .collect()
    }

    #[test]
    fn test_push_and_get() {
        let mut frame = KlineFrame::new();
        frame.push(&Kline::new(1_700_000_000_000, 100.0, 103.0, 99.0, 102.0, 1000.0));
        frame.push(&Kline::new(1_700_000_060_000, 102.0, 106.0, 101.0, 105.0, 1200.0));

        assert_eq!(frame.len(), 2);
        assert_eq!(frame.last().unwrap().close, 105.0);
        assert!(frame.get(2).is_none());
    }

    #[test]
    fn test_update_last() {
        let mut frame = frame_from_closes(&[1.0, 2.0]);
        frame.update_last(&Kline::new(60_000, 2.0, 9.0, 1.0, 8.0, 5.0));
        assert_eq!(frame.close, vec![1.0, 8.0]);
        assert_eq!(frame.high[1], 9.0);

        let mut empty = KlineFrame::new();
        empty.update_last(&Kline::new(0, 1.0, 1.0, 1.0, 1.0, 1.0));
        assert!(empty.is_empty());
    }

    #[test]
    fn test_applied_price() {
        let k = Kline::new(0, 1.0, 4.0, 2.0, 3.0, 10.0);
        assert_eq!(k.price(AppliedPrice::Median), 3.0);
        assert_eq!(k.price(AppliedPrice::Typical), 3.0);
        assert_eq!(k.price(AppliedPrice::Weighted), 3.0);
        assert_eq!(k.price(AppliedPrice::Average), 2.5);

        let frame = KlineFrame::from_klines(&[k, k]);
        assert_eq!(frame.price(AppliedPrice::Average), vec![2.5, 2.5]);
        assert_eq!(frame.price(AppliedPrice::Volume), vec![10.0, 10.0]);
    }

    #[test]
    fn test_slice_clamps() {
        let frame = frame_from_closes(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(frame.slice(1, 3).close, vec![2.0, 3.0]);
        assert_eq!(frame.slice(2, 10).close, vec![3.0, 4.0]);
        assert!(frame.slice(5, 10).is_empty());
    }

    #[test]
    fn test_json_import() {
        let json = r#"[
            {"timestamp": 1700000000000, "open": 100, "high": 103, "low": 99, "close": 102, "volume": 1000},
            {"timestamp": 1700000060000, "open": "102.5", "high": "106", "low": "101", "close": "105.5", "volume": "1200"}
        ]"#;

        let frame = KlineFrame::from_json_flexible(json).unwrap();
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.close[1], 105.5);

        assert!(KlineFrame::from_json(json).is_err());
        let strict = KlineFrame::from_json(r#"[{"timestamp": 0, "open": 1, "high": 2, "low": 0.5, "close": 1.5}]"#).unwrap();
        assert_eq!(strict.volume, vec![0.0]);
    }
}
