//! Dense scalar fields over a grid.

use crate::{FieldError, FieldResult, SampleTime};

/// A `resolution × resolution` row-major array of estimates, north row first.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialField {
    pub time: SampleTime,
    resolution: usize,
    values: Vec<f32>,
}

impl SpatialField {
    pub fn new(time: SampleTime, resolution: usize, values: Vec<f32>) -> FieldResult<Self> {
        if values.len() != resolution * resolution {
            return Err(FieldError::Internal(format!(
                "field for {} has {} values, expected {}",
                time,
                values.len(),
                resolution * resolution
            )));
        }
        Ok(Self {
            time,
            resolution,
            values,
        })
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn get(&self, col: usize, row: usize) -> f32 {
        self.values[row * self.resolution + col]
    }

    /// Min and max over finite values, if any.
    pub fn value_range(&self) -> Option<(f32, f32)> {
        let (lo, hi) = self
            .values
            .iter()
            .filter(|v| v.is_finite())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        (lo <= hi).then_some((lo, hi))
    }
}
