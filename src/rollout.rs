//! Recursive multi-step forecasting.
//!
//! The forecaster keeps a single feature vector as state. Each step predicts
//! with every model, feeds the primary prediction back into the lag window,
//! advances the clock one cadence unit and recomputes the calendar fields
//! from the new timestamp. Models never see a timestamp they were trained on
//! again, and calendar values are always recomputed rather than incremented,
//! so hour/day/month wraparound needs no special casing.

use tracing::debug;

use crate::core::{power_factor, ForecastPoint, ForecastTable};
use crate::error::{ForecastError, Result};
use crate::features::FeatureTable;
use crate::models::TrainedModel;
use crate::resample::Cadence;

/// Rollout parameters.
#[derive(Debug, Clone, Copy)]
pub struct RolloutConfig {
    /// Number of steps to forecast. The output always has exactly this many
    /// points.
    pub horizon: usize,
    /// Spacing between consecutive forecast points.
    pub cadence: Cadence,
    /// Derive a power factor from the first two predicted values at each
    /// step. Requires at least two models (active then reactive power).
    pub derive_power_factor: bool,
}

/// Roll every model forward `horizon` steps from the end of the feature
/// table.
///
/// The first model drives the lag window; its target is the primary signal.
/// All models must share the table's schema. Undefined power-factor steps
/// yield `None` rather than poisoning later steps, and negative predictions
/// are passed through unclipped.
pub fn roll_forward(
    models: &[&TrainedModel],
    table: &FeatureTable,
    config: &RolloutConfig,
) -> Result<ForecastTable> {
    if models.is_empty() {
        return Err(ForecastError::InvalidParameter(
            "rollout needs at least one model".to_string(),
        ));
    }
    if config.derive_power_factor && models.len() < 2 {
        return Err(ForecastError::InvalidParameter(
            "power-factor derivation needs an active and a reactive model".to_string(),
        ));
    }
    let schema = table.schema();
    for model in models {
        if model.schema() != schema {
            return Err(ForecastError::SchemaMismatch {
                expected: schema.describe(),
                got: model.schema().describe(),
            });
        }
    }
    let (mut timestamp, last_row) = table.last_row().ok_or(ForecastError::EmptyData)?;

    let targets: Vec<String> = models.iter().map(|m| m.target().to_string()).collect();
    let mut output = ForecastTable::new(targets);
    let mut state = last_row.to_vec();
    let n_lags = schema.lag_offsets().len();

    debug!(
        horizon = config.horizon,
        models = models.len(),
        from = %timestamp,
        "starting recursive rollout"
    );

    for _ in 0..config.horizon {
        let values: Vec<f64> = models
            .iter()
            .map(|model| model.predict(schema, &state))
            .collect::<Result<_>>()?;

        let pf = if config.derive_power_factor {
            let derived = power_factor(values[0], values[1]);
            derived.is_finite().then_some(derived)
        } else {
            None
        };

        // Shift the lag window toward larger offsets: each lag takes the
        // value of the next-smaller offset and the smallest takes the fresh
        // primary prediction.
        for j in (1..n_lags).rev() {
            state[j] = state[j - 1];
        }
        state[0] = values[0];

        timestamp += config.cadence.step();
        schema.write_calendar(timestamp, &mut state);

        output.push(ForecastPoint {
            timestamp,
            values,
            power_factor: pf,
        })?;
    }

    Ok(output)
}
