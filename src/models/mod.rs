//! Forecasting models: the [`Regressor`] capability, the random forest that
//! implements it, and Holt's linear trend smoother for univariate series.

mod forest;
mod holt;
mod traits;
mod tree;

pub use forest::RandomForest;
pub use holt::Holt;
pub use traits::{BoxedRegressor, Regressor, TrainedModel};
