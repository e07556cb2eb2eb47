//! Forecast output structures.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Utc};

/// One forecast step: the predicted value per target signal, plus the derived
/// power factor when the pipeline computes one.
///
/// Points are immutable once appended to a [`ForecastTable`]. The power
/// factor is `None` when it is undefined for this step (both raw predictions
/// zero); forward rollout has no future context to interpolate with, so the
/// gap is carried through rather than filled.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPoint {
    pub timestamp: DateTime<Utc>,
    /// Predicted values in target-label order.
    pub values: Vec<f64>,
    pub power_factor: Option<f64>,
}

/// An ordered sequence of forecast points, one per horizon step.
#[derive(Debug, Clone)]
pub struct ForecastTable {
    targets: Vec<String>,
    points: Vec<ForecastPoint>,
}

impl ForecastTable {
    /// Create an empty table for the given target signals.
    pub fn new(targets: Vec<String>) -> Self {
        Self {
            targets,
            points: Vec::new(),
        }
    }

    /// Target labels, matching the order of every point's `values`.
    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// Append one step. The value count must match the target count.
    pub fn push(&mut self, point: ForecastPoint) -> Result<()> {
        if point.values.len() != self.targets.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.targets.len(),
                got: point.values.len(),
            });
        }
        self.points.push(point);
        Ok(())
    }

    /// Number of forecast steps.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether any steps have been emitted.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All points in chronological order.
    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    /// Predicted values of one target across all steps.
    pub fn series(&self, target: &str) -> Result<Vec<f64>> {
        let index = self
            .targets
            .iter()
            .position(|t| t == target)
            .ok_or_else(|| ForecastError::UnknownColumn(target.to_string()))?;
        Ok(self.points.iter().map(|p| p.values[index]).collect())
    }

    /// Values of the primary (first) target across all steps.
    pub fn primary(&self) -> Vec<f64> {
        self.points
            .iter()
            .map(|p| p.values.first().copied().unwrap_or(f64::NAN))
            .collect()
    }

    /// Step timestamps.
    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.points.iter().map(|p| p.timestamp).collect()
    }
}
