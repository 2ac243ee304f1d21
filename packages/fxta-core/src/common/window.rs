//! Trailing-window extremes over plain slices.
//!
//! Output has the input's length; the first `period - 1` entries are NaN.

/// Highest value of each trailing window of `period` values.
pub fn highest(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |w| w.iter().copied().fold(f64::NEG_INFINITY, f64::max))
}

/// Lowest value of each trailing window of `period` values.
pub fn lowest(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |w| w.iter().copied().fold(f64::INFINITY, f64::min))
}

/// Midpoint of the trailing highest high and lowest low (Donchian middle).
pub fn midpoint(high: &[f64], low: &[f64], period: usize) -> Vec<f64> {
    highest(high, period)
        .into_iter()
        .zip(lowest(low, period))
        .map(|(h, l)| (h + l) / 2.0)
        .collect()
}

/// Absolute index of the highest value in `values[end + 1 - period ..= end]`.
/// Ties resolve to the most recent bar.
pub fn highest_index(values: &[f64], end: usize, period: usize) -> usize {
    let start = (end + 1).saturating_sub(period);
    let mut best = end;
    for i in (start..=end).rev() {
        if values[i] > values[best] {
            best = i;
        }
    }
    best
}

/// Absolute index of the lowest value in `values[end + 1 - period ..= end]`.
/// Ties resolve to the most recent bar.
pub fn lowest_index(values: &[f64], end: usize, period: usize) -> usize {
    let start = (end + 1).saturating_sub(period);
    let mut best = end;
    for i in (start..=end).rev() {
        if values[i] < values[best] {
            best = i;
        }
    }
    best
}

fn rolling(values: &[f64], period: usize, f: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }
    for end in (period - 1)..values.len() {
        out[end] = f(&values[end + 1 - period..=end]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highest_lowest() {
        let v = [1.0, 3.0, 2.0, 5.0, 4.0];
        let hh = highest(&v, 3);
        let ll = lowest(&v, 3);

        assert!(hh[0].is_nan() && hh[1].is_nan());
        assert_eq!(&hh[2..], &[3.0, 5.0, 5.0]);
        assert_eq!(&ll[2..], &[1.0, 2.0, 2.0]);
    }

    #[test]
    fn test_short_input() {
        assert!(highest(&[1.0, 2.0], 3).iter().all(|v| v.is_nan()));
        assert!(lowest(&[], 3).is_empty());
    }

    #[test]
    fn test_extreme_index_prefers_recent() {
        let v = [5.0, 1.0, 5.0, 1.0];
        assert_eq!(highest_index(&v, 3, 4), 2);
        assert_eq!(lowest_index(&v, 3, 4), 3);
        assert_eq!(highest_index(&v, 1, 10), 0);
    }

    #[test]
    fn test_midpoint() {
        let high = [10.0, 12.0, 11.0];
        let low = [8.0, 9.0, 7.0];
        let mid = midpoint(&high, &low, 2);
        assert!(mid[0].is_nan());
        assert_eq!(mid[1], 10.0);
        assert_eq!(mid[2], 9.5);
    }
}
