//! Resampling of raw meter readings onto a fixed cadence.

use crate::core::{Reading, Series};
use crate::error::{ForecastError, Result};
use chrono::{DateTime, Duration, DurationRound, Utc};

/// Fixed bucket width of a resampled series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    Hourly,
    Daily,
}

impl Cadence {
    /// Bucket width.
    pub fn step(self) -> Duration {
        match self {
            Cadence::Hourly => Duration::hours(1),
            Cadence::Daily => Duration::days(1),
        }
    }

    /// Floor a timestamp to the start of its bucket.
    pub fn bucket_start(self, timestamp: DateTime<Utc>) -> Result<DateTime<Utc>> {
        timestamp
            .duration_trunc(self.step())
            .map_err(|e| ForecastError::TimestampError(e.to_string()))
    }
}

/// Per-field aggregation rule. Instantaneous quantities (power) average;
/// cumulative quantities (sub-meter energy) sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Mean,
    Sum,
}

/// A raw field to carry into the resampled series, with its aggregation rule.
#[derive(Debug, Clone)]
pub struct FieldAggregate {
    pub label: String,
    pub aggregate: Aggregate,
}

impl FieldAggregate {
    pub fn mean(label: &str) -> Self {
        Self {
            label: label.to_string(),
            aggregate: Aggregate::Mean,
        }
    }

    pub fn sum(label: &str) -> Self {
        Self {
            label: label.to_string(),
            aggregate: Aggregate::Sum,
        }
    }
}

/// Resample readings into a regularly spaced series at the given cadence.
///
/// Readings are sorted by timestamp first. Buckets between the first and the
/// last observed bucket with no readings (or no defined readings) come out as
/// NaN so the spacing stays strictly regular; interior gaps can then be
/// interpolated and boundary gaps trimmed. Ratio fields are not aggregatable
/// here by construction; derive them from the aggregated raw columns
/// afterwards (see [`Series::derive_power_factor`]).
pub fn resample(readings: &[Reading], cadence: Cadence, fields: &[FieldAggregate]) -> Result<Series> {
    if readings.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    if fields.is_empty() {
        return Err(ForecastError::InvalidParameter(
            "at least one field must be aggregated".to_string(),
        ));
    }

    let mut sorted: Vec<&Reading> = readings.iter().collect();
    sorted.sort_by_key(|r| r.timestamp);

    let first = cadence.bucket_start(sorted[0].timestamp)?;
    let last = cadence.bucket_start(sorted[sorted.len() - 1].timestamp)?;
    let step = cadence.step();
    let step_seconds = step.num_seconds();
    let n_buckets = ((last - first).num_seconds() / step_seconds) as usize + 1;

    let timestamps: Vec<DateTime<Utc>> = (0..n_buckets)
        .map(|i| first + step * i as i32)
        .collect();

    // Accumulate per bucket: (sum of defined values, defined count).
    let mut sums = vec![vec![0.0_f64; n_buckets]; fields.len()];
    let mut counts = vec![vec![0_usize; n_buckets]; fields.len()];

    for reading in &sorted {
        let bucket = ((cadence.bucket_start(reading.timestamp)? - first).num_seconds()
            / step_seconds) as usize;
        for (f, field) in fields.iter().enumerate() {
            let value = reading.field(&field.label)?;
            if !value.is_nan() {
                sums[f][bucket] += value;
                counts[f][bucket] += 1;
            }
        }
    }

    let columns: Vec<Vec<f64>> = fields
        .iter()
        .enumerate()
        .map(|(f, field)| {
            (0..n_buckets)
                .map(|b| {
                    if counts[f][b] == 0 {
                        f64::NAN
                    } else {
                        match field.aggregate {
                            Aggregate::Mean => sums[f][b] / counts[f][b] as f64,
                            Aggregate::Sum => sums[f][b],
                        }
                    }
                })
                .collect()
        })
        .collect();

    let labels = fields.iter().map(|f| f.label.clone()).collect();
    Series::new(timestamps, labels, columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ACTIVE_POWER, REACTIVE_POWER};
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn reading(ts: DateTime<Utc>, active: f64, sub1: f64) -> Reading {
        Reading {
            timestamp: ts,
            active_power: active,
            reactive_power: active / 10.0,
            sub_metering_1: sub1,
            sub_metering_2: 0.0,
            sub_metering_3: 0.0,
        }
    }

    fn minute(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, h, m, 0).unwrap()
    }

    #[test]
    fn hourly_mean_aggregates_within_buckets() {
        let readings = vec![
            reading(minute(0, 0), 1.0, 10.0),
            reading(minute(0, 30), 3.0, 20.0),
            reading(minute(1, 15), 5.0, 30.0),
        ];
        let series = resample(
            &readings,
            Cadence::Hourly,
            &[FieldAggregate::mean(ACTIVE_POWER)],
        )
        .unwrap();

        assert_eq!(series.len(), 2);
        let values = series.column(ACTIVE_POWER).unwrap();
        assert_relative_eq!(values[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(values[1], 5.0, epsilon = 1e-12);
        assert_eq!(series.timestamps()[0], minute(0, 0));
        assert_eq!(series.timestamps()[1], minute(1, 0));
    }

    #[test]
    fn sum_aggregation_totals_energy_fields() {
        let readings = vec![
            reading(minute(0, 0), 1.0, 10.0),
            reading(minute(0, 30), 3.0, 20.0),
        ];
        let series = resample(
            &readings,
            Cadence::Hourly,
            &[FieldAggregate::sum("sub_metering_1")],
        )
        .unwrap();
        assert_relative_eq!(series.column("sub_metering_1").unwrap()[0], 30.0, epsilon = 1e-12);
    }

    #[test]
    fn aggregation_rule_is_per_field_not_global() {
        let readings = vec![
            reading(minute(0, 0), 2.0, 10.0),
            reading(minute(0, 30), 4.0, 20.0),
        ];
        let series = resample(
            &readings,
            Cadence::Hourly,
            &[
                FieldAggregate::mean(ACTIVE_POWER),
                FieldAggregate::sum("sub_metering_1"),
            ],
        )
        .unwrap();
        assert_relative_eq!(series.column(ACTIVE_POWER).unwrap()[0], 3.0, epsilon = 1e-12);
        assert_relative_eq!(series.column("sub_metering_1").unwrap()[0], 30.0, epsilon = 1e-12);
    }

    #[test]
    fn empty_buckets_between_observations_become_nan() {
        let readings = vec![
            reading(minute(0, 0), 1.0, 0.0),
            reading(minute(3, 0), 4.0, 0.0),
        ];
        let series = resample(
            &readings,
            Cadence::Hourly,
            &[FieldAggregate::mean(ACTIVE_POWER)],
        )
        .unwrap();

        assert_eq!(series.len(), 4);
        let values = series.column(ACTIVE_POWER).unwrap();
        assert!(values[1].is_nan());
        assert!(values[2].is_nan());
    }

    #[test]
    fn nan_readings_are_ignored_in_aggregation() {
        let readings = vec![
            reading(minute(0, 0), f64::NAN, 0.0),
            reading(minute(0, 30), 6.0, 0.0),
        ];
        let series = resample(
            &readings,
            Cadence::Hourly,
            &[FieldAggregate::mean(ACTIVE_POWER)],
        )
        .unwrap();
        assert_relative_eq!(series.column(ACTIVE_POWER).unwrap()[0], 6.0, epsilon = 1e-12);
    }

    #[test]
    fn unsorted_input_is_sorted_before_bucketing() {
        let readings = vec![
            reading(minute(2, 0), 3.0, 0.0),
            reading(minute(0, 0), 1.0, 0.0),
        ];
        let series = resample(
            &readings,
            Cadence::Hourly,
            &[FieldAggregate::mean(ACTIVE_POWER)],
        )
        .unwrap();
        assert_eq!(series.len(), 3);
        assert_relative_eq!(series.column(ACTIVE_POWER).unwrap()[0], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn daily_cadence_floors_to_midnight() {
        let readings = vec![
            reading(Utc.with_ymd_and_hms(2024, 3, 5, 13, 45, 0).unwrap(), 2.0, 0.0),
            reading(Utc.with_ymd_and_hms(2024, 3, 6, 1, 0, 0).unwrap(), 4.0, 0.0),
        ];
        let series = resample(
            &readings,
            Cadence::Daily,
            &[FieldAggregate::mean(ACTIVE_POWER)],
        )
        .unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(
            series.timestamps()[0],
            Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn power_factor_is_recomputed_after_aggregation_not_averaged() {
        // Two readings whose individual power factors average to a different
        // number than the factor of the averaged raw signals.
        let readings = vec![
            Reading {
                timestamp: minute(0, 0),
                active_power: 3.0,
                reactive_power: 4.0,
                sub_metering_1: 0.0,
                sub_metering_2: 0.0,
                sub_metering_3: 0.0,
            },
            Reading {
                timestamp: minute(0, 30),
                active_power: 5.0,
                reactive_power: 0.0,
                sub_metering_1: 0.0,
                sub_metering_2: 0.0,
                sub_metering_3: 0.0,
            },
        ];
        let mut series = resample(
            &readings,
            Cadence::Hourly,
            &[
                FieldAggregate::mean(ACTIVE_POWER),
                FieldAggregate::mean(REACTIVE_POWER),
            ],
        )
        .unwrap();
        series.derive_power_factor().unwrap();

        // Aggregated raw signals: active 4.0, reactive 2.0.
        let expected = 4.0 / (16.0_f64 + 4.0).sqrt();
        let got = series.column(crate::core::POWER_FACTOR).unwrap()[0];
        assert_relative_eq!(got, expected, epsilon = 1e-12);

        // The per-reading factors average to (0.6 + 1.0) / 2 = 0.8.
        assert!((got - 0.8).abs() > 1e-3);
    }

    #[test]
    fn resample_rejects_empty_input() {
        let result = resample(&[], Cadence::Hourly, &[FieldAggregate::mean(ACTIVE_POWER)]);
        assert!(matches!(result, Err(ForecastError::EmptyData)));
    }
}
