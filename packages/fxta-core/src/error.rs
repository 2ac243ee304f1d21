//! Error types shared by every kernel.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndicatorError>;

#[derive(Debug, Error)]
pub enum IndicatorError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("insufficient data: need {needed} bars, got {available}")]
    InsufficientData { needed: usize, available: usize },

    #[error("invalid range {from}..={to} for {len} bars")]
    InvalidRange { from: usize, to: usize, len: usize },

    #[error("series length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("timestamp mismatch at bar {index}: {left} vs {right}")]
    TimestampMismatch { index: usize, left: i64, right: i64 },

    #[error("tick at {timestamp} is older than the previous tick at {previous}")]
    UnorderedTicks { timestamp: i64, previous: i64 },

    #[error("invalid period `{input}`: {reason}")]
    InvalidPeriod { input: String, reason: &'static str },

    #[error("least-squares system is singular (degree {degree}, {points} points)")]
    SingularMatrix { degree: usize, points: usize },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl IndicatorError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        IndicatorError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Rejects zero periods, the most common parameter mistake.
pub(crate) fn ensure_period(name: &'static str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(IndicatorError::invalid(name, "must be greater than 0"));
    }
    Ok(())
}

pub(crate) fn ensure_positive(name: &'static str, value: f64) -> Result<()> {
    if !(value.is_finite() && value > 0.0) {
        return Err(IndicatorError::invalid(
            name,
            format!("must be a positive finite number, got {value}"),
        ));
    }
    Ok(())
}
