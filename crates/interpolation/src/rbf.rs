//! Cubic radial basis function interpolation.
//!
//! The interpolant is
//!
//! ```text
//! s(x) = Σ w_i · |x − x_i|³ + c₀ + c₁·lon + c₂·lat
//! ```
//!
//! with the side conditions `Σ w_i = Σ w_i·lon_i = Σ w_i·lat_i = 0`. The
//! linear tail makes the system solvable for the conditionally positive
//! definite cubic kernel whenever the samples are distinct and not all
//! collinear.

use field_common::{FieldError, FieldResult, Grid};
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

/// Fewest samples a slice needs for a cubic fit.
pub const MIN_RBF_POINTS: usize = 4;

/// Default cap on samples per fit. The dense system grows as the square.
pub const DEFAULT_MAX_RBF_POINTS: usize = 5_000;

/// A fitted cubic RBF surface.
#[derive(Debug, Clone)]
pub struct RbfInterpolator {
    /// Sample coordinates in normalized space.
    centers: Vec<(f64, f64)>,
    weights: Vec<f64>,
    poly: [f64; 3],
    origin: (f64, f64),
    scale: f64,
}

impl RbfInterpolator {
    /// Fit the surface through `(lon, lat, value)` samples.
    ///
    /// Too few samples yield `InsufficientPoints` with an `unknown` time;
    /// callers holding a slice fill it in.
    pub fn fit(samples: &[(f64, f64, f64)]) -> FieldResult<Self> {
        if samples.len() < MIN_RBF_POINTS {
            return Err(FieldError::InsufficientPoints {
                time: "unknown".to_string(),
                found: samples.len(),
                required: MIN_RBF_POINTS,
            });
        }

        // Centre and scale coordinates. The interpolant is invariant under
        // this affine map; only the conditioning of the system changes.
        let n = samples.len();
        let origin = (
            samples.iter().map(|s| s.0).sum::<f64>() / n as f64,
            samples.iter().map(|s| s.1).sum::<f64>() / n as f64,
        );
        let scale = samples
            .iter()
            .map(|s| (s.0 - origin.0).abs().max((s.1 - origin.1).abs()))
            .fold(0.0_f64, f64::max);
        if scale == 0.0 || !scale.is_finite() {
            return Err(FieldError::SingularSystem(
                "all samples share one coordinate".to_string(),
            ));
        }

        let centers: Vec<(f64, f64)> = samples
            .iter()
            .map(|s| ((s.0 - origin.0) / scale, (s.1 - origin.1) / scale))
            .collect();

        let size = n + 3;
        let mut matrix = DMatrix::<f64>::zeros(size, size);
        let mut rhs = DVector::<f64>::zeros(size);

        for (i, &(xi, yi)) in centers.iter().enumerate() {
            for (j, &(xj, yj)) in centers.iter().enumerate().skip(i + 1) {
                let phi = kernel((xi - xj).hypot(yi - yj));
                matrix[(i, j)] = phi;
                matrix[(j, i)] = phi;
            }
            matrix[(i, n)] = 1.0;
            matrix[(i, n + 1)] = xi;
            matrix[(i, n + 2)] = yi;
            matrix[(n, i)] = 1.0;
            matrix[(n + 1, i)] = xi;
            matrix[(n + 2, i)] = yi;
            rhs[i] = samples[i].2;
        }

        let solution = matrix.lu().solve(&rhs).ok_or_else(|| {
            FieldError::SingularSystem(format!(
                "{} samples are duplicated or collinear",
                n
            ))
        })?;
        if solution.iter().any(|v| !v.is_finite()) {
            return Err(FieldError::SingularSystem(format!(
                "{} samples produced a non-finite solution",
                n
            )));
        }

        Ok(Self {
            centers,
            weights: solution.rows(0, n).iter().copied().collect(),
            poly: [solution[n], solution[n + 1], solution[n + 2]],
            origin,
            scale,
        })
    }

    /// Evaluate the surface at `(lon, lat)`.
    pub fn evaluate(&self, lon: f64, lat: f64) -> f64 {
        let x = (lon - self.origin.0) / self.scale;
        let y = (lat - self.origin.1) / self.scale;

        let radial: f64 = self
            .centers
            .iter()
            .zip(&self.weights)
            .map(|(&(cx, cy), w)| w * kernel((x - cx).hypot(y - cy)))
            .sum();

        radial + self.poly[0] + self.poly[1] * x + self.poly[2] * y
    }

    /// Evaluate at every grid coordinate, row-major, north row first.
    ///
    /// Values are left unclamped; overshoot outside the sample hull is
    /// handled by the colour normalization at render time.
    pub fn evaluate_grid(&self, grid: &Grid) -> Vec<f32> {
        let resolution = grid.resolution();
        let mut values = vec![0.0f32; grid.len()];

        values
            .par_chunks_mut(resolution)
            .zip(grid.lats().par_iter())
            .for_each(|(row, &lat)| {
                for (cell, &lon) in row.iter_mut().zip(grid.lons()) {
                    *cell = self.evaluate(lon, lat) as f32;
                }
            });

        values
    }
}

#[inline]
fn kernel(r: f64) -> f64 {
    r * r * r
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Vec<(f64, f64, f64)> {
        vec![
            (85.1, 19.1, 3.0),
            (85.9, 19.2, 7.5),
            (85.8, 19.9, -1.0),
            (85.2, 19.8, 4.25),
            (85.5, 19.4, 10.0),
        ]
    }

    #[test]
    fn test_reproduces_samples() {
        let rbf = RbfInterpolator::fit(&samples()).unwrap();
        for (lon, lat, value) in samples() {
            assert!((rbf.evaluate(lon, lat) - value).abs() < 1e-9);
        }
    }

    #[test]
    fn test_linear_data_is_reproduced_everywhere() {
        let data: Vec<_> = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0), (0.3, 0.6)]
            .iter()
            .map(|&(x, y)| (x, y, 2.0 + 3.0 * x - y))
            .collect();
        let rbf = RbfInterpolator::fit(&data).unwrap();
        assert!((rbf.evaluate(0.5, 0.5) - 3.0).abs() < 1e-9);
        assert!((rbf.evaluate(0.25, 0.9) - 1.85).abs() < 1e-9);
    }

    #[test]
    fn test_too_few_samples() {
        let result = RbfInterpolator::fit(&samples()[..3]);
        assert!(matches!(
            result,
            Err(FieldError::InsufficientPoints {
                found: 3,
                required: 4,
                ..
            })
        ));
    }

    #[test]
    fn test_collinear_samples_are_singular() {
        let data = vec![
            (0.0, 0.0, 1.0),
            (1.0, 1.0, 2.0),
            (2.0, 2.0, 3.0),
            (3.0, 3.0, 5.0),
        ];
        assert!(matches!(
            RbfInterpolator::fit(&data),
            Err(FieldError::SingularSystem(_))
        ));
    }

    #[test]
    fn test_duplicate_samples_are_singular() {
        let data = vec![
            (0.0, 0.0, 1.0),
            (1.0, 0.0, 2.0),
            (0.0, 1.0, 3.0),
            (0.0, 1.0, 4.0),
        ];
        assert!(matches!(
            RbfInterpolator::fit(&data),
            Err(FieldError::SingularSystem(_))
        ));
    }
}
