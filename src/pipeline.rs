//! End-to-end forecasting pipelines: raw readings in, forecasts and
//! summaries out.
//!
//! Each pipeline owns its resampling cadence, feature schema and model
//! parameters. Defaults reproduce the production configuration; tests shrink
//! the forests through the config structs.

use chrono::Duration;
use tracing::{debug, info};

use crate::core::{
    ForecastPoint, ForecastTable, Reading, Series, ACTIVE_POWER, POWER_FACTOR, REACTIVE_POWER,
    SUB_METERS,
};
use crate::error::{ForecastError, Result};
use crate::features::{build_features, CalendarField, FeatureSchema};
use crate::models::{Holt, RandomForest};
use crate::report::{summarize_forecast, ForecastSummary, HourlyProfile, WeekdayProfile};
use crate::resample::{resample, Cadence, FieldAggregate};
use crate::rollout::{roll_forward, RolloutConfig};
use crate::training::{evaluate, split_train_test, train};

/// Hourly active-power forecast: hour/day/weekday/month calendar features
/// plus a full day of lags, depth-limited forest.
#[derive(Debug, Clone)]
pub struct HourlyPowerConfig {
    pub test_fraction: f64,
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
    pub horizon: usize,
}

impl Default for HourlyPowerConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.1,
            n_trees: 300,
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 2,
            seed: 42,
            horizon: 24,
        }
    }
}

/// Output of the hourly pipeline: hold-out accuracy, the rolled-out
/// forecast, and its peak/low summary (the low is the recommended hour).
#[derive(Debug)]
pub struct HourlyPowerReport {
    pub mae: f64,
    pub forecast: ForecastTable,
    pub summary: ForecastSummary,
}

pub fn hourly_power(readings: &[Reading], config: &HourlyPowerConfig) -> Result<HourlyPowerReport> {
    let series = resample(
        readings,
        Cadence::Hourly,
        &[FieldAggregate::mean(ACTIVE_POWER)],
    )?;
    let schema = FeatureSchema::new(
        (1..=24).collect(),
        vec![
            CalendarField::Hour,
            CalendarField::DayOfMonth,
            CalendarField::Weekday,
            CalendarField::Month,
        ],
    )?;
    let table = build_features(&series, &schema, &[ACTIVE_POWER])?;
    let (train_set, test_set) = split_train_test(&table, config.test_fraction)?;

    let forest = RandomForest::new(config.n_trees)
        .with_max_depth(config.max_depth)
        .with_min_samples_split(config.min_samples_split)
        .with_min_samples_leaf(config.min_samples_leaf)
        .with_seed(config.seed);
    let model = train(Box::new(forest), &train_set, ACTIVE_POWER)?;
    let mae = evaluate(&model, &test_set)?;
    info!(mae, rows = table.len(), "hourly power model evaluated");

    let forecast = roll_forward(
        &[&model],
        &table,
        &RolloutConfig {
            horizon: config.horizon,
            cadence: Cadence::Hourly,
            derive_power_factor: false,
        },
    )?;
    let summary = summarize_forecast(&forecast, ACTIVE_POWER)?;

    Ok(HourlyPowerReport {
        mae,
        forecast,
        summary,
    })
}

/// Daily mean active-power forecast with a week of lags and a historical
/// weekday consumption profile.
#[derive(Debug, Clone)]
pub struct DailyPowerConfig {
    pub test_fraction: f64,
    pub n_trees: usize,
    pub seed: u64,
    pub horizon: usize,
}

impl Default for DailyPowerConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            n_trees: 300,
            seed: 42,
            horizon: 7,
        }
    }
}

#[derive(Debug)]
pub struct DailyPowerReport {
    pub mae: f64,
    pub forecast: ForecastTable,
    pub summary: ForecastSummary,
    /// Historical average consumption per weekday, Monday first.
    pub weekday_profile: WeekdayProfile,
}

pub fn daily_power(readings: &[Reading], config: &DailyPowerConfig) -> Result<DailyPowerReport> {
    let series = resample(
        readings,
        Cadence::Daily,
        &[FieldAggregate::mean(ACTIVE_POWER)],
    )?;
    let schema = FeatureSchema::new(
        (1..=7).collect(),
        vec![CalendarField::Weekday, CalendarField::Month],
    )?;
    let table = build_features(&series, &schema, &[ACTIVE_POWER])?;
    let (train_set, test_set) = split_train_test(&table, config.test_fraction)?;

    let forest = RandomForest::new(config.n_trees).with_seed(config.seed);
    let model = train(Box::new(forest), &train_set, ACTIVE_POWER)?;
    let mae = evaluate(&model, &test_set)?;
    info!(mae, rows = table.len(), "daily power model evaluated");

    let forecast = roll_forward(
        &[&model],
        &table,
        &RolloutConfig {
            horizon: config.horizon,
            cadence: Cadence::Daily,
            derive_power_factor: false,
        },
    )?;
    let summary = summarize_forecast(&forecast, ACTIVE_POWER)?;
    let weekday_profile = WeekdayProfile::from_daily(&series, ACTIVE_POWER)?;

    Ok(DailyPowerReport {
        mae,
        forecast,
        summary,
        weekday_profile,
    })
}

/// Joint active/reactive forecast with a derived power factor per step.
#[derive(Debug, Clone)]
pub struct EfficiencyConfig {
    pub n_trees: usize,
    pub seed: u64,
    pub horizon: usize,
}

impl Default for EfficiencyConfig {
    fn default() -> Self {
        Self {
            n_trees: 200,
            seed: 42,
            horizon: 24,
        }
    }
}

#[derive(Debug)]
pub struct EfficiencyReport {
    /// Hourly history with the recomputed and interpolated power factor.
    pub history: Series,
    /// 24-hour joint forecast; each point carries active power, reactive
    /// power and a derived power factor (`None` where undefined).
    pub forecast: ForecastTable,
}

/// Forecast active and reactive power jointly and derive the power factor at
/// every step.
///
/// The historical power factor is recomputed from the hourly aggregates
/// (never averaged from per-minute ratios), interior gaps are interpolated
/// and undefined edges are trimmed. Both models are fitted on the full
/// feature table: the output of this pipeline is the forward forecast, not a
/// hold-out score.
pub fn efficiency(readings: &[Reading], config: &EfficiencyConfig) -> Result<EfficiencyReport> {
    let mut series = resample(
        readings,
        Cadence::Hourly,
        &[
            FieldAggregate::mean(ACTIVE_POWER),
            FieldAggregate::mean(REACTIVE_POWER),
        ],
    )?;
    series.derive_power_factor()?;
    series.interpolate_column(POWER_FACTOR)?;
    let series = series.trim_undefined_edges();

    let schema = FeatureSchema::new(
        vec![1, 2, 24, 48],
        vec![CalendarField::Hour, CalendarField::Weekday],
    )?;
    let table = build_features(&series, &schema, &[ACTIVE_POWER, REACTIVE_POWER])?;

    let active = train(
        Box::new(RandomForest::new(config.n_trees).with_seed(config.seed)),
        &table,
        ACTIVE_POWER,
    )?;
    let reactive = train(
        Box::new(RandomForest::new(config.n_trees).with_seed(config.seed)),
        &table,
        REACTIVE_POWER,
    )?;
    debug!(rows = table.len(), "efficiency models fitted");

    let forecast = roll_forward(
        &[&active, &reactive],
        &table,
        &RolloutConfig {
            horizon: config.horizon,
            cadence: Cadence::Hourly,
            derive_power_factor: true,
        },
    )?;

    Ok(EfficiencyReport {
        history: series,
        forecast,
    })
}

/// Per-circuit Holt forecast plus usage profiles.
#[derive(Debug, Clone)]
pub struct SubMeterConfig {
    pub horizon: usize,
}

impl Default for SubMeterConfig {
    fn default() -> Self {
        Self { horizon: 7 }
    }
}

/// One sub-meter's outlook: a daily trend forecast with its peak/low days,
/// the average hour-of-day usage profile, and the weekday profile.
#[derive(Debug)]
pub struct SubMeterOutlook {
    pub label: String,
    pub forecast: ForecastTable,
    pub forecast_summary: ForecastSummary,
    pub hourly_profile: HourlyProfile,
    pub weekday_profile: WeekdayProfile,
}

/// Forecast each sub-meter's daily energy with Holt's linear trend and
/// profile its historical usage by hour of day and by weekday.
pub fn submeter_outlook(
    readings: &[Reading],
    config: &SubMeterConfig,
) -> Result<Vec<SubMeterOutlook>> {
    let sum_fields: Vec<FieldAggregate> = SUB_METERS
        .iter()
        .map(|label| FieldAggregate::sum(label))
        .collect();
    let daily = resample(readings, Cadence::Daily, &sum_fields)?;
    let hourly = resample(readings, Cadence::Hourly, &sum_fields)?;

    let last_day = *daily
        .timestamps()
        .last()
        .ok_or(ForecastError::EmptyData)?;

    let mut outlooks = Vec::with_capacity(SUB_METERS.len());
    for label in SUB_METERS {
        // Days with no readings total zero energy, they are not gaps.
        let totals: Vec<f64> = daily
            .column(label)?
            .iter()
            .map(|v| if v.is_nan() { 0.0 } else { *v })
            .collect();

        let mut model = Holt::new();
        model.fit(&totals)?;
        let values = model.forecast(config.horizon)?;
        debug!(label, horizon = config.horizon, "sub-meter trend fitted");

        let mut forecast = ForecastTable::new(vec![label.to_string()]);
        for (i, value) in values.into_iter().enumerate() {
            forecast.push(ForecastPoint {
                timestamp: last_day + Duration::days(i as i64 + 1),
                values: vec![value],
                power_factor: None,
            })?;
        }
        let forecast_summary = summarize_forecast(&forecast, label)?;

        outlooks.push(SubMeterOutlook {
            label: label.to_string(),
            forecast,
            forecast_summary,
            hourly_profile: HourlyProfile::from_hourly(&hourly, label)?,
            weekday_profile: WeekdayProfile::from_daily(&daily, label)?,
        });
    }

    Ok(outlooks)
}
