use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IndicatorError;

/// A positive bar/session length in milliseconds, written as "15m", "4h", "1d".
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    ms: i64,
}

impl fmt::Debug for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Period({}ms)", self.ms)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const UNITS: [(i64, &str); 5] = [
            (604_800_000, "w"),
            (86_400_000, "d"),
            (3_600_000, "h"),
            (60_000, "m"),
            (1_000, "s"),
        ];
        for (unit_ms, suffix) in UNITS {
            if self.ms % unit_ms == 0 {
                return write!(f, "{}{}", self.ms / unit_ms, suffix);
            }
        }
        write!(f, "{}ms", self.ms)
    }
}

impl Period {
    pub const MINUTE: Period = Period { ms: 60_000 };
    pub const HOUR: Period = Period { ms: 3_600_000 };
    pub const DAY: Period = Period { ms: 86_400_000 };

    pub fn from_ms(ms: i64) -> Option<Self> {
        (ms > 0).then_some(Self { ms })
    }

    pub fn as_ms(&self) -> i64 {
        self.ms
    }

    pub fn parse(s: &str) -> Result<Self, IndicatorError> {
        let err = |reason| IndicatorError::InvalidPeriod {
            input: s.to_string(),
            reason,
        };

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(err("empty period"));
        }
        let digits_end = trimmed
            .char_indices()
            .find(|(_, ch)| !ch.is_ascii_digit())
            .map(|(i, _)| i)
            .unwrap_or(trimmed.len());
        if digits_end == 0 {
            return Err(err("missing number"));
        }
        let n: i64 = trimmed[..digits_end]
            .parse()
            .map_err(|_| err("invalid number"))?;
        if n <= 0 {
            return Err(err("period must be > 0"));
        }
        let unit_ms = match trimmed[digits_end..].trim().to_ascii_lowercase().as_str() {
            "ms" => 1,
            "s" => 1_000,
            "m" => 60_000,
            "h" => 3_600_000,
            "d" => 86_400_000,
            "w" => 604_800_000,
            _ => return Err(err("unsupported unit (use ms/s/m/h/d/w)")),
        };
        n.checked_mul(unit_ms)
            .map(|ms| Self { ms })
            .ok_or_else(|| err("period overflows i64 milliseconds"))
    }

    /// Start of the bucket containing `ts_ms` (floor, also for negative timestamps).
    #[inline]
    pub fn bucket_start(&self, ts_ms: i64) -> i64 {
        ts_ms.div_euclid(self.ms) * self.ms
    }
}

impl FromStr for Period {
    type Err = IndicatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Period {
    type Error = IndicatorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Period> for String {
    fn from(p: Period) -> Self {
        p.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::Period;

    #[test]
    fn parse_periods() {
        assert_eq!(Period::parse("15m").unwrap().as_ms(), 15 * 60_000);
        assert_eq!(Period::parse("4h").unwrap().as_ms(), 4 * 3_600_000);
        assert_eq!(Period::parse("1d").unwrap().as_ms(), 86_400_000);
        assert_eq!(Period::parse("500ms").unwrap().as_ms(), 500);
        assert_eq!(Period::parse(" 1W ").unwrap().as_ms(), 604_800_000);
    }

    #[test]
    fn parse_errors() {
        assert!(Period::parse("").is_err());
        assert!(Period::parse("m").is_err());
        assert!(Period::parse("0m").is_err());
        assert!(Period::parse("5y").is_err());
    }

    #[test]
    fn display_round_trips() {
        for s in ["15m", "4h", "1d", "1w", "500ms", "90s"] {
            assert_eq!(Period::parse(s).unwrap().to_string(), s);
        }
    }

    #[test]
    fn bucket_start() {
        let p = Period::parse("15m").unwrap();
        assert_eq!(p.bucket_start(0), 0);
        assert_eq!(p.bucket_start(1), 0);
        assert_eq!(p.bucket_start(15 * 60_000), 15 * 60_000);
        assert_eq!(p.bucket_start(15 * 60_000 + 1), 15 * 60_000);
        assert_eq!(p.bucket_start(-1), -15 * 60_000);
    }

    #[test]
    fn serde_as_string() {
        let p: Period = serde_json::from_str("\"4h\"").unwrap();
        assert_eq!(p.as_ms(), 4 * Period::HOUR.as_ms());
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"4h\"");
    }
}
