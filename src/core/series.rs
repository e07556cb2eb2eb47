//! Timestamped, named-column tables for power readings and resampled data.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Utc};

/// Column label for global active power (kW).
pub const ACTIVE_POWER: &str = "active_power";
/// Column label for global reactive power (kW).
pub const REACTIVE_POWER: &str = "reactive_power";
/// Column label for the derived power factor.
pub const POWER_FACTOR: &str = "power_factor";
/// Column labels for the three sub-meter circuits (Wh).
pub const SUB_METERS: [&str; 3] = ["sub_metering_1", "sub_metering_2", "sub_metering_3"];

/// A single timestamped observation from the household meter.
///
/// Missing numeric fields are represented as `f64::NAN`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    pub active_power: f64,
    pub reactive_power: f64,
    pub sub_metering_1: f64,
    pub sub_metering_2: f64,
    pub sub_metering_3: f64,
}

impl Reading {
    /// Value of the raw field with the given label.
    pub fn field(&self, label: &str) -> Result<f64> {
        match label {
            ACTIVE_POWER => Ok(self.active_power),
            REACTIVE_POWER => Ok(self.reactive_power),
            "sub_metering_1" => Ok(self.sub_metering_1),
            "sub_metering_2" => Ok(self.sub_metering_2),
            "sub_metering_3" => Ok(self.sub_metering_3),
            other => Err(ForecastError::UnknownColumn(other.to_string())),
        }
    }
}

/// Power factor: active power over apparent power.
///
/// Undefined (NaN) when the apparent power is zero, i.e. both inputs are zero.
pub fn power_factor(active: f64, reactive: f64) -> f64 {
    let apparent = (active * active + reactive * reactive).sqrt();
    if apparent == 0.0 {
        f64::NAN
    } else {
        active / apparent
    }
}

/// A chronological table of equal-length `f64` columns addressed by label.
///
/// Timestamps are strictly increasing; missing values are NaN.
#[derive(Debug, Clone)]
pub struct Series {
    timestamps: Vec<DateTime<Utc>>,
    labels: Vec<String>,
    /// Column-major: columns[c][observation].
    columns: Vec<Vec<f64>>,
}

impl Series {
    /// Create a series, validating timestamp order and column lengths.
    pub fn new(
        timestamps: Vec<DateTime<Utc>>,
        labels: Vec<String>,
        columns: Vec<Vec<f64>>,
    ) -> Result<Self> {
        for pair in timestamps.windows(2) {
            if pair[1] <= pair[0] {
                return Err(ForecastError::TimestampError(
                    "timestamps must be strictly increasing".to_string(),
                ));
            }
        }
        if labels.len() != columns.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: labels.len(),
                got: columns.len(),
            });
        }
        for column in &columns {
            if column.len() != timestamps.len() {
                return Err(ForecastError::DimensionMismatch {
                    expected: timestamps.len(),
                    got: column.len(),
                });
            }
        }
        Ok(Self {
            timestamps,
            labels,
            columns,
        })
    }

    /// Shorthand for a one-column series.
    pub fn univariate(
        timestamps: Vec<DateTime<Utc>>,
        label: &str,
        values: Vec<f64>,
    ) -> Result<Self> {
        Self::new(timestamps, vec![label.to_string()], vec![values])
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Whether the series has no observations.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Bucket/observation timestamps.
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Column labels in storage order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Values of the column with the given label.
    pub fn column(&self, label: &str) -> Result<&[f64]> {
        self.column_index(label)
            .map(|i| self.columns[i].as_slice())
            .ok_or_else(|| ForecastError::UnknownColumn(label.to_string()))
    }

    fn column_index(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// One observation across all columns, in label order.
    pub fn row(&self, index: usize) -> Result<Vec<f64>> {
        if index >= self.len() {
            return Err(ForecastError::IndexOutOfBounds {
                index,
                size: self.len(),
            });
        }
        Ok(self.columns.iter().map(|c| c[index]).collect())
    }

    /// Append a derived column. Its length must match the timestamps.
    pub fn push_column(&mut self, label: &str, values: Vec<f64>) -> Result<()> {
        if values.len() != self.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.len(),
                got: values.len(),
            });
        }
        if self.column_index(label).is_some() {
            return Err(ForecastError::InvalidParameter(format!(
                "column {label} already exists"
            )));
        }
        self.labels.push(label.to_string());
        self.columns.push(values);
        Ok(())
    }

    /// Recompute (or add) the power-factor column from the raw aggregated
    /// active/reactive columns. The ratio is always derived after
    /// aggregation; it is never itself averaged.
    pub fn derive_power_factor(&mut self) -> Result<()> {
        let derived: Vec<f64> = {
            let active = self.column(ACTIVE_POWER)?;
            let reactive = self.column(REACTIVE_POWER)?;
            active
                .iter()
                .zip(reactive.iter())
                .map(|(&a, &r)| power_factor(a, r))
                .collect()
        };
        match self.column_index(POWER_FACTOR) {
            Some(i) => self.columns[i] = derived,
            None => self.push_column(POWER_FACTOR, derived)?,
        }
        Ok(())
    }

    /// Extract observations `start..end`.
    pub fn slice(&self, start: usize, end: usize) -> Result<Series> {
        if start > end {
            return Err(ForecastError::InvalidParameter(
                "start must be <= end".to_string(),
            ));
        }
        if end > self.len() {
            return Err(ForecastError::IndexOutOfBounds {
                index: end,
                size: self.len(),
            });
        }
        Ok(Series {
            timestamps: self.timestamps[start..end].to_vec(),
            labels: self.labels.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| c[start..end].to_vec())
                .collect(),
        })
    }

    /// Observations with `from <= timestamp <= until` (inclusive range).
    pub fn date_range(&self, from: DateTime<Utc>, until: DateTime<Utc>) -> Series {
        let start = self.timestamps.partition_point(|&t| t < from);
        let end = self.timestamps.partition_point(|&t| t <= until);
        // start <= end always holds for from <= until; an empty window yields
        // an empty series rather than an error.
        let end = end.max(start);
        self.slice(start, end).expect("indices are in bounds")
    }

    /// Linearly interpolate interior NaN runs of one column along the time
    /// axis. Leading and trailing gaps are left undefined: interpolation
    /// never extrapolates past the first or last defined value.
    pub fn interpolate_column(&mut self, label: &str) -> Result<()> {
        let index = self
            .column_index(label)
            .ok_or_else(|| ForecastError::UnknownColumn(label.to_string()))?;
        interpolate_in_place(&mut self.columns[index]);
        Ok(())
    }

    /// Drop leading and trailing observations where any column is NaN.
    ///
    /// Interior gaps are expected to have been interpolated already; rows at
    /// the series boundary cannot be and are removed before feature building.
    pub fn trim_undefined_edges(&self) -> Series {
        let defined = |i: usize| self.columns.iter().all(|c| !c[i].is_nan());
        let start = (0..self.len()).find(|&i| defined(i));
        let end = (0..self.len()).rev().find(|&i| defined(i));
        match (start, end) {
            (Some(s), Some(e)) if s <= e => self.slice(s, e + 1).expect("indices are in bounds"),
            _ => self.slice(0, 0).expect("empty slice"),
        }
    }

    /// Arithmetic mean of a column, ignoring NaN. `None` when the column has
    /// no defined values: an average over an empty set is undefined, never a
    /// division by zero.
    pub fn column_mean(&self, label: &str) -> Result<Option<f64>> {
        let values = self.column(label)?;
        Ok(nan_mean(values))
    }

    /// Sum of a column, ignoring NaN. An empty column sums to zero.
    pub fn column_sum(&self, label: &str) -> Result<f64> {
        let values = self.column(label)?;
        Ok(values.iter().filter(|v| !v.is_nan()).sum())
    }
}

/// Mean ignoring NaN; `None` when no values are defined.
pub(crate) fn nan_mean(values: &[f64]) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for &v in values {
        if !v.is_nan() {
            sum += v;
            count += 1;
        }
    }
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Linear interpolation of interior NaN runs. Runs touching either boundary
/// are left as NaN.
fn interpolate_in_place(values: &mut [f64]) {
    let n = values.len();
    let mut i = 0;
    while i < n {
        if !values[i].is_nan() {
            i += 1;
            continue;
        }
        let run_start = i;
        while i < n && values[i].is_nan() {
            i += 1;
        }
        let run_end = i; // exclusive
        let left = if run_start > 0 {
            Some(values[run_start - 1])
        } else {
            None
        };
        let right = if run_end < n {
            Some(values[run_end])
        } else {
            None
        };
        if let (Some(l), Some(r)) = (left, right) {
            let segments = (run_end - run_start + 1) as f64;
            for (step, slot) in (run_start..run_end).enumerate() {
                let t = (step + 1) as f64 / segments;
                values[slot] = l + t * (r - l);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone};

    fn hourly_timestamps(n: usize) -> Vec<DateTime<Utc>> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| base + Duration::hours(i as i64)).collect()
    }

    #[test]
    fn series_validates_timestamp_order() {
        let mut timestamps = hourly_timestamps(3);
        timestamps.swap(1, 2);
        let result = Series::univariate(timestamps, ACTIVE_POWER, vec![1.0, 2.0, 3.0]);
        assert!(matches!(result, Err(ForecastError::TimestampError(_))));

        // Duplicates are rejected too.
        let t = hourly_timestamps(2);
        let timestamps = vec![t[0], t[1], t[1]];
        let result = Series::univariate(timestamps, ACTIVE_POWER, vec![1.0, 2.0, 3.0]);
        assert!(matches!(result, Err(ForecastError::TimestampError(_))));
    }

    #[test]
    fn series_validates_column_lengths() {
        let result = Series::univariate(hourly_timestamps(3), ACTIVE_POWER, vec![1.0, 2.0]);
        assert!(matches!(
            result,
            Err(ForecastError::DimensionMismatch { expected: 3, got: 2 })
        ));
    }

    #[test]
    fn series_column_and_row_access() {
        let series = Series::new(
            hourly_timestamps(3),
            vec![ACTIVE_POWER.to_string(), REACTIVE_POWER.to_string()],
            vec![vec![1.0, 2.0, 3.0], vec![0.1, 0.2, 0.3]],
        )
        .unwrap();

        assert_eq!(series.column(ACTIVE_POWER).unwrap(), &[1.0, 2.0, 3.0]);
        assert_eq!(series.row(1).unwrap(), vec![2.0, 0.2]);
        assert!(matches!(
            series.column("voltage"),
            Err(ForecastError::UnknownColumn(_))
        ));
        assert!(series.row(3).is_err());
    }

    #[test]
    fn power_factor_matches_three_four_five_triangle() {
        assert_relative_eq!(power_factor(3.0, 4.0), 0.6, epsilon = 1e-12);
    }

    #[test]
    fn power_factor_is_undefined_for_zero_apparent_power() {
        assert!(power_factor(0.0, 0.0).is_nan());
    }

    #[test]
    fn derive_power_factor_recomputes_from_raw_columns() {
        let mut series = Series::new(
            hourly_timestamps(2),
            vec![ACTIVE_POWER.to_string(), REACTIVE_POWER.to_string()],
            vec![vec![3.0, 0.0], vec![4.0, 0.0]],
        )
        .unwrap();
        series.derive_power_factor().unwrap();

        let pf = series.column(POWER_FACTOR).unwrap();
        assert_relative_eq!(pf[0], 0.6, epsilon = 1e-12);
        assert!(pf[1].is_nan());

        // Deriving again overwrites rather than duplicating the column.
        series.derive_power_factor().unwrap();
        assert_eq!(series.labels().len(), 3);
    }

    #[test]
    fn interpolation_fills_interior_gaps_only() {
        let mut series = Series::univariate(
            hourly_timestamps(6),
            POWER_FACTOR,
            vec![f64::NAN, 1.0, f64::NAN, f64::NAN, 4.0, f64::NAN],
        )
        .unwrap();
        series.interpolate_column(POWER_FACTOR).unwrap();

        let values = series.column(POWER_FACTOR).unwrap();
        assert!(values[0].is_nan(), "leading gap must not be extrapolated");
        assert_relative_eq!(values[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(values[2], 2.0, epsilon = 1e-12);
        assert_relative_eq!(values[3], 3.0, epsilon = 1e-12);
        assert_relative_eq!(values[4], 4.0, epsilon = 1e-12);
        assert!(values[5].is_nan(), "trailing gap must not be extrapolated");
    }

    #[test]
    fn trim_undefined_edges_drops_boundary_rows() {
        let series = Series::univariate(
            hourly_timestamps(5),
            ACTIVE_POWER,
            vec![f64::NAN, 1.0, 2.0, 3.0, f64::NAN],
        )
        .unwrap();
        let trimmed = series.trim_undefined_edges();

        assert_eq!(trimmed.len(), 3);
        assert_eq!(trimmed.column(ACTIVE_POWER).unwrap(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn trim_undefined_edges_of_fully_undefined_series_is_empty() {
        let series =
            Series::univariate(hourly_timestamps(2), ACTIVE_POWER, vec![f64::NAN, f64::NAN])
                .unwrap();
        assert!(series.trim_undefined_edges().is_empty());
    }

    #[test]
    fn date_range_is_inclusive_and_tolerates_empty_windows() {
        let timestamps = hourly_timestamps(5);
        let series =
            Series::univariate(timestamps.clone(), ACTIVE_POWER, vec![1.0, 2.0, 3.0, 4.0, 5.0])
                .unwrap();

        let window = series.date_range(timestamps[1], timestamps[3]);
        assert_eq!(window.column(ACTIVE_POWER).unwrap(), &[2.0, 3.0, 4.0]);

        let far_future = timestamps[4] + Duration::days(100);
        let empty = series.date_range(far_future, far_future + Duration::days(7));
        assert!(empty.is_empty());
        assert_eq!(empty.column_sum(ACTIVE_POWER).unwrap(), 0.0);
    }

    #[test]
    fn column_mean_is_undefined_over_empty_sets() {
        let series = Series::univariate(hourly_timestamps(2), ACTIVE_POWER, vec![f64::NAN, f64::NAN])
            .unwrap();
        assert_eq!(series.column_mean(ACTIVE_POWER).unwrap(), None);

        let series =
            Series::univariate(hourly_timestamps(3), ACTIVE_POWER, vec![1.0, f64::NAN, 3.0])
                .unwrap();
        assert_relative_eq!(
            series.column_mean(ACTIVE_POWER).unwrap().unwrap(),
            2.0,
            epsilon = 1e-12
        );
    }
}
