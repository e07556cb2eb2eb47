//! Shared numeric helpers.

mod metrics;

pub use metrics::{mean_absolute_error, root_mean_squared_error};
