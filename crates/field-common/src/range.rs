//! Sequence-wide color normalization.

use serde::{Deserialize, Serialize};

use crate::{FieldError, FieldResult, MeasurementPoint};

/// The single `(min, max)` pair used to map values to colors for a whole
/// request: every frame and the legend share it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationRange {
    min: f64,
    max: f64,
}

impl NormalizationRange {
    pub fn new(min: f64, max: f64) -> FieldResult<Self> {
        if !min.is_finite() || !max.is_finite() {
            return Err(FieldError::invalid(
                "global_min/global_max",
                "bounds must be finite",
            ));
        }
        if min > max {
            return Err(FieldError::invalid(
                "global_min/global_max",
                format!("min {} is greater than max {}", min, max),
            ));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Clamp a value into `[min, max]`. NaN passes through.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Position of `value` on the color scale, clamped to `[0, 1]`.
    ///
    /// A zero-width range maps everything to 0. NaN stays NaN so callers can
    /// treat it as "no data".
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.span();
        if span <= 0.0 {
            return if value.is_nan() { f64::NAN } else { 0.0 };
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }

    /// `count` evenly spaced tick values rounded to two decimals.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        crate::grid::linspace(self.min, self.max, count)
            .into_iter()
            .map(|v| (v * 100.0).round() / 100.0)
            .collect()
    }
}

/// Where the normalization bounds come from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RangeSource {
    /// Caller supplied both bounds.
    Explicit { min: f64, max: f64 },
    /// Bounds are the min/max over the full dataset.
    Computed,
}

impl RangeSource {
    /// Explicit only when both bounds are present.
    pub fn from_options(min: Option<f64>, max: Option<f64>) -> Self {
        match (min, max) {
            (Some(min), Some(max)) => RangeSource::Explicit { min, max },
            _ => RangeSource::Computed,
        }
    }

    /// Resolve to a concrete range, once per request.
    pub fn resolve(&self, points: &[MeasurementPoint]) -> FieldResult<NormalizationRange> {
        match *self {
            RangeSource::Explicit { min, max } => NormalizationRange::new(min, max),
            RangeSource::Computed => {
                let (min, max) = points
                    .iter()
                    .map(|p| p.value)
                    .filter(|v| v.is_finite())
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                        (lo.min(v), hi.max(v))
                    });
                if min > max {
                    return Err(FieldError::EmptyInput);
                }
                NormalizationRange::new(min, max)
            }
        }
    }
}
