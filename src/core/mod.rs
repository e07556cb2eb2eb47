//! Core data structures: reading tables, resampled series, forecast output.

mod forecast;
mod series;

pub use forecast::{ForecastPoint, ForecastTable};
pub use series::{
    power_factor, Reading, Series, ACTIVE_POWER, POWER_FACTOR, REACTIVE_POWER, SUB_METERS,
};
