//! Per-slice spatial interpolation strategies.

use field_common::{FieldError, FieldResult, Grid, NormalizationRange, SpatialField, TimeSlice};
use tracing::{debug, warn};

use crate::idw::{idw_grid, IdwKernel};
use crate::rbf::RbfInterpolator;
use crate::smoothing::gaussian_filter;

/// Settings for the inverse-distance strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdwParams {
    pub kernel: IdwKernel,
    /// Post-smoothing standard deviation in grid cells.
    pub sigma: f64,
    /// Output is clamped into this range.
    pub range: NormalizationRange,
}

/// How a slice of scattered samples becomes a dense field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpatialStrategy {
    /// Global cubic RBF, exact at the samples, unclamped. Slices with more
    /// than `max_points` samples are refused.
    RadialBasis { max_points: usize },
    /// Aggregated IDW with Gaussian post-smoothing and clamping.
    InverseDistance(IdwParams),
}

/// Interpolate one time slice over `grid`.
pub fn interpolate_slice(
    slice: &TimeSlice,
    grid: &Grid,
    strategy: &SpatialStrategy,
) -> FieldResult<SpatialField> {
    let values = match strategy {
        SpatialStrategy::RadialBasis { max_points } => radial_basis(slice, grid, *max_points)?,
        SpatialStrategy::InverseDistance(params) => inverse_distance(slice, grid, params)?,
    };
    SpatialField::new(slice.time.clone(), grid.resolution(), values)
}

fn radial_basis(slice: &TimeSlice, grid: &Grid, max_points: usize) -> FieldResult<Vec<f32>> {
    if slice.len() > max_points {
        return Err(FieldError::ResourceLimit {
            limit: "max_rbf_points",
            requested: slice.len(),
            allowed: max_points,
        });
    }

    let rbf = RbfInterpolator::fit(&slice.samples()).map_err(|e| match e {
        FieldError::InsufficientPoints {
            found, required, ..
        } => FieldError::InsufficientPoints {
            time: slice.time.to_string(),
            found,
            required,
        },
        FieldError::SingularSystem(msg) => {
            FieldError::SingularSystem(format!("slice {}: {}", slice.time, msg))
        }
        other => other,
    })?;
    Ok(rbf.evaluate_grid(grid))
}

fn inverse_distance(slice: &TimeSlice, grid: &Grid, params: &IdwParams) -> FieldResult<Vec<f32>> {
    let aggregates = slice.aggregate();
    if aggregates.is_empty() {
        return Err(FieldError::InsufficientPoints {
            time: slice.time.to_string(),
            found: 0,
            required: 1,
        });
    }

    let resolution = grid.resolution();
    let raw = idw_grid(grid, &aggregates, &params.kernel, &params.range);
    let smoothed = gaussian_filter(&raw, resolution, resolution, params.sigma);

    let range = params.range;
    let outside = smoothed
        .iter()
        .filter(|&&v| v < range.min() || v > range.max())
        .count();
    if outside > 0 {
        warn!(
            time = %slice.time,
            cells = outside,
            min = range.min(),
            max = range.max(),
            "Smoothed density left the normalization range; clamping"
        );
    }

    debug!(
        time = %slice.time,
        samples = slice.len(),
        unique_locations = aggregates.len(),
        "Interpolated slice with IDW"
    );

    Ok(smoothed.into_iter().map(|v| range.clamp(v) as f32).collect())
}

/// Build the ordered field sequence for the animation path.
///
/// Slices that are too small or whose RBF system is singular are dropped
/// with a warning. Any other failure, including a slice above
/// `max_rbf_points`, aborts. The caller decides whether enough fields remain.
pub fn build_sequence(
    slices: &[TimeSlice],
    grid: &Grid,
    max_rbf_points: usize,
) -> FieldResult<Vec<SpatialField>> {
    let strategy = SpatialStrategy::RadialBasis {
        max_points: max_rbf_points,
    };
    let mut fields = Vec::with_capacity(slices.len());

    for slice in slices {
        match interpolate_slice(slice, grid, &strategy) {
            Ok(field) => {
                debug!(time = %slice.time, points = slice.len(), "Interpolated slice with RBF");
                fields.push(field);
            }
            Err(e @ (FieldError::InsufficientPoints { .. } | FieldError::SingularSystem(_))) => {
                warn!(time = %slice.time, points = slice.len(), error = %e, "Skipping time slice");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(fields)
}
