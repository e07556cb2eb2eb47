//! Chronological splitting, model fitting and hold-out evaluation.

use tracing::debug;

use crate::error::{ForecastError, Result};
use crate::features::FeatureTable;
use crate::models::{BoxedRegressor, TrainedModel};
use crate::utils::mean_absolute_error;

/// Split a feature table into a training prefix and a test suffix.
///
/// The cut is chronological, never shuffled: the test set is the most recent
/// `ceil(len * test_fraction)` rows and the training set is everything before
/// it, so no test row precedes a training row.
pub fn split_train_test(
    table: &FeatureTable,
    test_fraction: f64,
) -> Result<(FeatureTable, FeatureTable)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(ForecastError::InvalidParameter(format!(
            "test fraction must lie in (0, 1), got {test_fraction}"
        )));
    }
    if table.is_empty() {
        return Err(ForecastError::EmptyData);
    }

    let len = table.len();
    let test_len = (len as f64 * test_fraction).ceil() as usize;
    let split = len - test_len;
    if split == 0 {
        return Err(ForecastError::InsufficientData {
            needed: test_len + 1,
            got: len,
        });
    }

    let train = table.slice(0, split)?;
    let test = table.slice(split, len)?;
    Ok((train, test))
}

/// Fit a regressor on every row of the table and bind the result to the
/// table's schema and the named target.
pub fn train(
    mut regressor: BoxedRegressor,
    table: &FeatureTable,
    target: &str,
) -> Result<TrainedModel> {
    if table.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    let min_rows = table.schema().max_lag();
    if table.len() < min_rows {
        return Err(ForecastError::InsufficientData {
            needed: min_rows,
            got: table.len(),
        });
    }
    let target_values = table.target(target)?;

    debug!(
        target_column = target,
        rows = table.len(),
        regressor = regressor.name(),
        "fitting model"
    );
    regressor.fit(table.rows(), target_values)?;

    Ok(TrainedModel::new(
        regressor,
        table.schema().clone(),
        target.to_string(),
    ))
}

/// Mean absolute error of a trained model over a hold-out table.
pub fn evaluate(model: &TrainedModel, table: &FeatureTable) -> Result<f64> {
    if table.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    let actual = table.target(model.target())?;
    let predicted: Vec<f64> = table
        .rows()
        .iter()
        .map(|row| model.predict(table.schema(), row))
        .collect::<Result<_>>()?;
    mean_absolute_error(actual, &predicted)
}
