//! Lag and calendar feature construction for regression models.

use crate::core::Series;
use crate::error::{ForecastError, Result};
use chrono::{DateTime, Datelike, Timelike, Utc};

/// A calendar feature: a pure, deterministic function of the timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarField {
    /// Hour of day, 0–23.
    Hour,
    /// Day of week, 0 (Monday) – 6 (Sunday).
    Weekday,
    /// Day of month, 1–31.
    DayOfMonth,
    /// Month, 1–12.
    Month,
}

impl CalendarField {
    /// Field name as it appears in the feature schema.
    pub fn name(self) -> &'static str {
        match self {
            CalendarField::Hour => "hour",
            CalendarField::Weekday => "weekday",
            CalendarField::DayOfMonth => "day_of_month",
            CalendarField::Month => "month",
        }
    }

    /// Evaluate the field at a timestamp.
    pub fn compute(self, timestamp: DateTime<Utc>) -> f64 {
        match self {
            CalendarField::Hour => f64::from(timestamp.hour()),
            CalendarField::Weekday => f64::from(timestamp.weekday().num_days_from_monday()),
            CalendarField::DayOfMonth => f64::from(timestamp.day()),
            CalendarField::Month => f64::from(timestamp.month()),
        }
    }
}

/// Explicit, ordered description of a feature vector: lag offsets first
/// (ascending), then calendar fields.
///
/// The schema is carried by every trained model and validated before every
/// prediction, so training-time construction and forecast-time
/// reconstruction can never silently drift apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    lag_offsets: Vec<usize>,
    calendar: Vec<CalendarField>,
}

impl FeatureSchema {
    /// Create a schema. Lag offsets must be positive and strictly increasing.
    pub fn new(lag_offsets: Vec<usize>, calendar: Vec<CalendarField>) -> Result<Self> {
        if lag_offsets.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "at least one lag offset is required".to_string(),
            ));
        }
        if lag_offsets[0] == 0 {
            return Err(ForecastError::InvalidParameter(
                "lag offsets must be positive".to_string(),
            ));
        }
        for pair in lag_offsets.windows(2) {
            if pair[1] <= pair[0] {
                return Err(ForecastError::InvalidParameter(
                    "lag offsets must be strictly increasing".to_string(),
                ));
            }
        }
        Ok(Self {
            lag_offsets,
            calendar,
        })
    }

    /// Lag offsets in ascending order.
    pub fn lag_offsets(&self) -> &[usize] {
        &self.lag_offsets
    }

    /// Calendar fields in schema order.
    pub fn calendar(&self) -> &[CalendarField] {
        &self.calendar
    }

    /// The largest lag offset; rows earlier than this are undefinable.
    pub fn max_lag(&self) -> usize {
        *self.lag_offsets.last().expect("schema has at least one lag")
    }

    /// Total feature-vector width.
    pub fn width(&self) -> usize {
        self.lag_offsets.len() + self.calendar.len()
    }

    /// Ordered field names: `lag_k` for each offset, then calendar names.
    pub fn field_names(&self) -> Vec<String> {
        self.lag_offsets
            .iter()
            .map(|k| format!("lag_{k}"))
            .chain(self.calendar.iter().map(|c| c.name().to_string()))
            .collect()
    }

    /// Comma-separated field list, used in schema-mismatch errors.
    pub fn describe(&self) -> String {
        self.field_names().join(", ")
    }

    /// Calendar feature values at a timestamp, in schema order.
    pub fn calendar_values(&self, timestamp: DateTime<Utc>) -> Vec<f64> {
        self.calendar.iter().map(|c| c.compute(timestamp)).collect()
    }

    /// Write the calendar portion of a feature vector in place.
    pub(crate) fn write_calendar(&self, timestamp: DateTime<Utc>, row: &mut [f64]) {
        let base = self.lag_offsets.len();
        for (i, field) in self.calendar.iter().enumerate() {
            row[base + i] = field.compute(timestamp);
        }
    }
}

/// Chronological feature rows aligned with one or more target columns.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    schema: FeatureSchema,
    timestamps: Vec<DateTime<Utc>>,
    /// Row-major feature vectors, schema order.
    rows: Vec<Vec<f64>>,
    target_labels: Vec<String>,
    /// Column-major target values, aligned with `rows`.
    targets: Vec<Vec<f64>>,
}

impl FeatureTable {
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Result<&[f64]> {
        self.rows
            .get(index)
            .map(|r| r.as_slice())
            .ok_or(ForecastError::IndexOutOfBounds {
                index,
                size: self.rows.len(),
            })
    }

    pub fn target_labels(&self) -> &[String] {
        &self.target_labels
    }

    /// Target values for one label.
    pub fn target(&self, label: &str) -> Result<&[f64]> {
        self.target_labels
            .iter()
            .position(|l| l == label)
            .map(|i| self.targets[i].as_slice())
            .ok_or_else(|| ForecastError::UnknownColumn(label.to_string()))
    }

    /// The most recent feature row and its timestamp; the initial state for
    /// a recursive rollout.
    pub fn last_row(&self) -> Option<(DateTime<Utc>, &[f64])> {
        let last = self.rows.len().checked_sub(1)?;
        Some((self.timestamps[last], self.rows[last].as_slice()))
    }

    /// Rows `start..end` as a new table (chronological order preserved).
    pub fn slice(&self, start: usize, end: usize) -> Result<FeatureTable> {
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
        Ok(FeatureTable {
            schema: self.schema.clone(),
            timestamps: self.timestamps[start..end].to_vec(),
            rows: self.rows[start..end].to_vec(),
            target_labels: self.target_labels.clone(),
            targets: self
                .targets
                .iter()
                .map(|t| t[start..end].to_vec())
                .collect(),
        })
    }
}

/// Build a feature table from a regularly spaced series.
///
/// Lag features come from the first target's own history: the lag for offset
/// `k` at row `i` is the series value `k` cadence steps earlier. Rows whose
/// largest lag would fall before the series start are dropped entirely:
/// partial feature vectors are never trained or predicted on. Rows with NaN
/// in any feature or target are dropped as well.
pub fn build_features(
    series: &Series,
    schema: &FeatureSchema,
    targets: &[&str],
) -> Result<FeatureTable> {
    if targets.is_empty() {
        return Err(ForecastError::InvalidParameter(
            "at least one target column is required".to_string(),
        ));
    }
    let lag_source = series.column(targets[0])?;
    let target_columns: Vec<&[f64]> = targets
        .iter()
        .map(|t| series.column(t))
        .collect::<Result<_>>()?;

    let max_lag = schema.max_lag();
    let mut timestamps = Vec::new();
    let mut rows = Vec::new();
    let mut target_values: Vec<Vec<f64>> = vec![Vec::new(); targets.len()];

    for i in max_lag..series.len() {
        let timestamp = series.timestamps()[i];
        let mut row = Vec::with_capacity(schema.width());
        for &k in schema.lag_offsets() {
            row.push(lag_source[i - k]);
        }
        row.extend(schema.calendar_values(timestamp));

        let row_defined = row.iter().all(|v| !v.is_nan());
        let targets_defined = target_columns.iter().all(|c| !c[i].is_nan());
        if !row_defined || !targets_defined {
            continue;
        }

        timestamps.push(timestamp);
        rows.push(row);
        for (t, column) in target_columns.iter().enumerate() {
            target_values[t].push(column[i]);
        }
    }

    Ok(FeatureTable {
        schema: schema.clone(),
        timestamps,
        rows,
        target_labels: targets.iter().map(|t| t.to_string()).collect(),
        targets: target_values,
    })
}
