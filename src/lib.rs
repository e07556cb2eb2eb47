//! Household electricity consumption forecasting.
//!
//! The crate turns a history of per-minute meter readings into short-term
//! forecasts. Raw readings are resampled to a fixed cadence, expanded into
//! lag and calendar features, fitted with a seeded random forest (or Holt's
//! linear trend for the sub-meter circuits), then rolled forward recursively:
//! each prediction feeds back into the lag window while the clock advances
//! and calendar features are recomputed.
//!
//! # Quick start
//!
//! ```no_run
//! use wattcast::loader::load_readings_csv;
//! use wattcast::pipeline::{hourly_power, HourlyPowerConfig};
//!
//! # fn main() -> wattcast::Result<()> {
//! let readings = load_readings_csv("household_power_consumption.csv")?;
//! let report = hourly_power(&readings, &HourlyPowerConfig::default())?;
//! println!(
//!     "MAE {:.3}, cheapest hour at {}",
//!     report.mae, report.summary.low.timestamp
//! );
//! # Ok(())
//! # }
//! ```
//!
//! The four pipelines in [`pipeline`] cover hourly and daily active power,
//! the joint active/reactive forecast with a derived power factor, and the
//! per-circuit sub-meter outlook. [`query`] serves weekly comparison and
//! daily energy queries over an immutable snapshot of the loaded data.

pub mod core;
pub mod error;
pub mod features;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod query;
pub mod report;
pub mod resample;
pub mod rollout;
pub mod training;
pub mod utils;

pub use crate::core::{ForecastPoint, ForecastTable, Reading, Series};
pub use crate::error::{ForecastError, Result};
pub use crate::features::{build_features, CalendarField, FeatureSchema, FeatureTable};
pub use crate::models::{BoxedRegressor, Holt, RandomForest, Regressor, TrainedModel};
pub use crate::resample::{resample, Cadence, FieldAggregate};
pub use crate::rollout::{roll_forward, RolloutConfig};
