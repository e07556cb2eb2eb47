//! Regressor trait and the schema-bound trained model wrapper.

use crate::error::{ForecastError, Result};
use crate::features::FeatureSchema;

/// Common interface for supervised regression models.
///
/// The recursive forecaster consumes regression only through this trait, so
/// the tree ensemble can be swapped for a deterministic stub in tests. The
/// trait is object-safe and usable as `BoxedRegressor`.
pub trait Regressor {
    /// Fit the model to row-major feature vectors and their target values.
    fn fit(&mut self, rows: &[Vec<f64>], target: &[f64]) -> Result<()>;

    /// Predict the target for one feature vector.
    fn predict(&self, row: &[f64]) -> Result<f64>;

    /// Model name for diagnostics.
    fn name(&self) -> &str;
}

/// Type alias for boxed regressor trait objects.
///
/// Fitted regressors are read-only during prediction and safely shareable
/// across concurrent readers.
pub type BoxedRegressor = Box<dyn Regressor + Send + Sync>;

/// A fitted regressor bound to exactly one target signal and one feature
/// schema.
///
/// Owned by the trainer that created it; consumed read-only afterwards.
/// Every prediction validates the caller's schema against the training
/// schema. A mismatch is a fatal contract violation, never a silent
/// positional misalignment.
pub struct TrainedModel {
    regressor: BoxedRegressor,
    schema: FeatureSchema,
    target: String,
}

impl TrainedModel {
    pub(crate) fn new(regressor: BoxedRegressor, schema: FeatureSchema, target: String) -> Self {
        Self {
            regressor,
            schema,
            target,
        }
    }

    /// The target signal this model predicts.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The feature schema this model was trained with.
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Name of the underlying regressor.
    pub fn regressor_name(&self) -> &str {
        self.regressor.name()
    }

    /// Predict the target for one feature vector, after validating that the
    /// caller's schema matches the training schema.
    pub fn predict(&self, schema: &FeatureSchema, row: &[f64]) -> Result<f64> {
        if schema != &self.schema {
            return Err(ForecastError::SchemaMismatch {
                expected: self.schema.describe(),
                got: schema.describe(),
            });
        }
        if row.len() != self.schema.width() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.schema.width(),
                got: row.len(),
            });
        }
        self.regressor.predict(row)
    }
}

impl std::fmt::Debug for TrainedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrainedModel")
            .field("target", &self.target)
            .field("regressor", &self.regressor.name())
            .field("schema", &self.schema.describe())
            .finish()
    }
}
