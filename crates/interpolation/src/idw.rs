//! Inverse-distance-weighted estimation.

use field_common::{Grid, NormalizationRange, PointAggregate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Distance substituted for an exact zero so a coincident sample carries
/// overwhelming but finite weight.
pub const DISTANCE_FLOOR: f64 = 1e-12;

/// Smallest accepted kernel bandwidth in kilometres.
pub const MIN_BANDWIDTH_KM: f64 = 0.05;

/// Approximate length of one degree of latitude.
pub const KM_PER_DEGREE: f64 = 111.0;

/// Weighting kernel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IdwKernel {
    /// `w = 1 / d^power`
    InversePower { power: f64 },
    /// `w = exp(-d² / 2h²)` with `h` the bandwidth converted to degrees.
    Gaussian { bandwidth_km: f64 },
}

impl Default for IdwKernel {
    fn default() -> Self {
        IdwKernel::InversePower { power: 2.0 }
    }
}

impl IdwKernel {
    /// Gaussian kernel, with the bandwidth floored at [`MIN_BANDWIDTH_KM`].
    pub fn gaussian(bandwidth_km: f64) -> Self {
        IdwKernel::Gaussian {
            bandwidth_km: bandwidth_km.max(MIN_BANDWIDTH_KM),
        }
    }

    fn weight(&self, distance: f64, floor: f64) -> f64 {
        match *self {
            IdwKernel::InversePower { power } => {
                let d = if distance == 0.0 { floor } else { distance };
                1.0 / d.powf(power)
            }
            IdwKernel::Gaussian { bandwidth_km } => {
                let h = bandwidth_km.max(MIN_BANDWIDTH_KM) / KM_PER_DEGREE;
                (-(distance * distance) / (2.0 * h * h)).exp()
            }
        }
    }
}

/// Weighted estimate at `(lon, lat)`.
///
/// When every weight underflows (a narrow Gaussian far from all samples)
/// the nearest sample's value is returned instead of `NaN`.
pub fn idw_estimate(
    samples: &[PointAggregate],
    lon: f64,
    lat: f64,
    kernel: &IdwKernel,
    floor: f64,
) -> f64 {
    let mut weighted = 0.0;
    let mut total = 0.0;
    let mut nearest = (f64::INFINITY, f64::NAN);

    for sample in samples {
        let distance = (sample.longitude - lon).hypot(sample.latitude - lat);
        if distance < nearest.0 {
            nearest = (distance, sample.value);
        }
        let w = kernel.weight(distance, floor);
        weighted += w * sample.value;
        total += w;
    }

    if total > 0.0 && total.is_finite() {
        weighted / total
    } else {
        nearest.1
    }
}

/// Estimate every grid cell from `samples`, row-major, north row first.
///
/// Sample values are clipped into `range` before weighting.
pub fn idw_grid(
    grid: &Grid,
    samples: &[PointAggregate],
    kernel: &IdwKernel,
    range: &NormalizationRange,
) -> Vec<f64> {
    let clipped: Vec<PointAggregate> = samples
        .iter()
        .map(|s| PointAggregate {
            value: range.clamp(s.value),
            ..*s
        })
        .collect();

    let resolution = grid.resolution();
    let mut values = vec![0.0f64; grid.len()];

    values
        .par_chunks_mut(resolution)
        .zip(grid.lats().par_iter())
        .for_each(|(row, &lat)| {
            for (cell, &lon) in row.iter_mut().zip(grid.lons()) {
                *cell = idw_estimate(&clipped, lon, lat, kernel, DISTANCE_FLOOR);
            }
        });

    values
}
