//! Read layer over a loaded series: weekly comparisons and daily sub-meter
//! totals, served from an immutable snapshot.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::core::{Series, SUB_METERS};
use crate::error::Result;

/// Immutable view of a loaded series. Never mutated after construction;
/// refreshes build a new snapshot and swap the shared reference.
#[derive(Debug)]
pub struct Snapshot {
    series: Series,
}

impl Snapshot {
    pub fn new(series: Series) -> Self {
        Self { series }
    }

    pub fn series(&self) -> &Series {
        &self.series
    }
}

/// Per-field totals for a week against the week before it.
///
/// `difference` carries one entry per field, keyed `<field>_diff`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekComparison {
    pub this_week: BTreeMap<String, f64>,
    pub last_week: BTreeMap<String, f64>,
    pub difference: BTreeMap<String, f64>,
}

/// Sub-meter totals for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyEnergy {
    pub date: NaiveDate,
    pub sub_metering_1: f64,
    pub sub_metering_2: f64,
    pub sub_metering_3: f64,
}

/// Serves read queries against the current snapshot. Concurrent readers each
/// take an `Arc` to the snapshot; `refresh` swaps the reference atomically so
/// in-flight reads keep the view they started with.
#[derive(Debug)]
pub struct QueryService {
    snapshot: RwLock<Arc<Snapshot>>,
}

impl QueryService {
    pub fn new(series: Series) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(Snapshot::new(series))),
        }
    }

    /// The current snapshot. Holding the returned `Arc` keeps that view
    /// alive across any concurrent refresh.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the snapshot. Existing readers are unaffected.
    pub fn refresh(&self, series: Series) {
        let next = Arc::new(Snapshot::new(series));
        let mut guard = self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = next;
        info!("query snapshot refreshed");
    }

    /// Per-field totals over the 7-day window starting at `start`, the
    /// immediately preceding 7-day window, and their differences. Windows
    /// with no overlapping data aggregate to zero rather than failing.
    pub fn compare_weeks(&self, start: NaiveDate) -> Result<WeekComparison> {
        let snapshot = self.snapshot();
        let week_start = day_start(start);
        let this_week = week_totals(snapshot.series(), week_start)?;
        let last_week = week_totals(snapshot.series(), week_start - Duration::days(7))?;

        let difference = this_week
            .iter()
            .map(|(label, total)| {
                let previous = last_week.get(label).copied().unwrap_or(0.0);
                (format!("{label}_diff"), total - previous)
            })
            .collect();

        Ok(WeekComparison {
            this_week,
            last_week,
            difference,
        })
    }

    /// Per-day sub-meter totals for the 7-day window starting at `start`.
    /// Days without data report zero for every sub-meter.
    pub fn energy_performance(&self, start: NaiveDate) -> Result<Vec<DailyEnergy>> {
        let snapshot = self.snapshot();
        let mut days = Vec::with_capacity(7);

        for offset in 0..7 {
            let date = start + Duration::days(offset);
            let from = day_start(date);
            let window = snapshot
                .series()
                .date_range(from, from + Duration::days(1) - Duration::seconds(1));

            days.push(DailyEnergy {
                date,
                sub_metering_1: window.column_sum(SUB_METERS[0]).unwrap_or(0.0),
                sub_metering_2: window.column_sum(SUB_METERS[1]).unwrap_or(0.0),
                sub_metering_3: window.column_sum(SUB_METERS[2]).unwrap_or(0.0),
            });
        }

        Ok(days)
    }
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Sum every column of the series over `[from, from + 7 days)`.
fn week_totals(series: &Series, from: DateTime<Utc>) -> Result<BTreeMap<String, f64>> {
    let window = series.date_range(from, from + Duration::days(7) - Duration::seconds(1));
    let mut totals = BTreeMap::new();
    for label in series.labels() {
        totals.insert(label.clone(), window.column_sum(label)?);
    }
    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ACTIVE_POWER;
    use chrono::TimeZone;

    /// Daily series over 2024-01-01..=2024-01-14 with active power 1.0 the
    /// first week and 3.0 the second, plus constant sub-meter readings.
    fn two_week_series() -> Series {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let timestamps: Vec<_> = (0..14).map(|i| base + Duration::days(i)).collect();
        let active: Vec<f64> = (0..14).map(|i| if i < 7 { 1.0 } else { 3.0 }).collect();
        Series::new(
            timestamps,
            vec![
                ACTIVE_POWER.to_string(),
                SUB_METERS[0].to_string(),
                SUB_METERS[1].to_string(),
                SUB_METERS[2].to_string(),
            ],
            vec![active, vec![2.0; 14], vec![0.5; 14], vec![1.5; 14]],
        )
        .unwrap()
    }

    #[test]
    fn compare_weeks_totals_and_differences() {
        let service = QueryService::new(two_week_series());
        let start = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();

        let comparison = service.compare_weeks(start).unwrap();
        assert_eq!(comparison.this_week[ACTIVE_POWER], 21.0);
        assert_eq!(comparison.last_week[ACTIVE_POWER], 7.0);
        assert_eq!(comparison.difference["active_power_diff"], 14.0);
        assert_eq!(comparison.difference["sub_metering_1_diff"], 0.0);
    }

    #[test]
    fn compare_weeks_over_an_empty_range_is_all_zero() {
        let service = QueryService::new(two_week_series());
        let start = NaiveDate::from_ymd_opt(2030, 6, 1).unwrap();

        let comparison = service.compare_weeks(start).unwrap();
        for totals in [&comparison.this_week, &comparison.last_week] {
            assert!(totals.values().all(|v| *v == 0.0));
        }
        assert!(comparison.difference.values().all(|v| *v == 0.0));
    }

    #[test]
    fn energy_performance_reports_seven_days() {
        let service = QueryService::new(two_week_series());
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let days = service.energy_performance(start).unwrap();
        assert_eq!(days.len(), 7);
        for (i, day) in days.iter().enumerate() {
            assert_eq!(day.date, start + Duration::days(i as i64));
            assert_eq!(day.sub_metering_1, 2.0);
            assert_eq!(day.sub_metering_2, 0.5);
            assert_eq!(day.sub_metering_3, 1.5);
        }
    }

    #[test]
    fn energy_performance_fills_missing_days_with_zero() {
        let service = QueryService::new(two_week_series());
        let start = NaiveDate::from_ymd_opt(2024, 1, 12).unwrap();

        let days = service.energy_performance(start).unwrap();
        // Data ends on 2024-01-14; the last four days are empty.
        assert_eq!(days[2].sub_metering_1, 2.0);
        for day in &days[3..] {
            assert_eq!(day.sub_metering_1, 0.0);
            assert_eq!(day.sub_metering_3, 0.0);
        }
    }

    #[test]
    fn refresh_swaps_the_snapshot_without_touching_live_readers() {
        let service = QueryService::new(two_week_series());
        let before = service.snapshot();

        let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let replacement =
            Series::univariate(vec![base], ACTIVE_POWER, vec![9.0]).unwrap();
        service.refresh(replacement);

        let after = service.snapshot();
        assert!(!Arc::ptr_eq(&before, &after));
        // The retained snapshot still serves the old view.
        assert_eq!(before.series().len(), 14);
        assert_eq!(after.series().len(), 1);
    }

    #[test]
    fn week_comparison_serializes_with_suffixed_difference_keys() {
        let service = QueryService::new(two_week_series());
        let start = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        let comparison = service.compare_weeks(start).unwrap();

        let json = serde_json::to_value(&comparison).unwrap();
        assert!(json["this_week"].get(ACTIVE_POWER).is_some());
        assert!(json["difference"].get("active_power_diff").is_some());
    }
}
