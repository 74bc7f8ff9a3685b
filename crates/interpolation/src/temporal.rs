//! Cubic interpolation of field sequences along the time axis.
//!
//! Control fields sit on uniform knots `0..N`. Each grid cell is fitted
//! independently with a cubic spline:
//!
//! - `N >= 4`: not-a-knot spline
//! - `N == 3`: the interpolating parabola
//! - `N == 2`: straight line
//!
//! The knot second derivatives are solved once in [`TemporalInterpolator::new`];
//! frames are then evaluated lazily, so only one output frame needs to be
//! alive at a time.

use chrono::Duration;
use field_common::grid::linspace;
use field_common::{FieldError, FieldResult, SampleTime, SpatialField};
use rayon::prelude::*;
use tracing::debug;

/// Produces `(N − 1) × frames_per_transition` evenly spaced frames spanning
/// the first to the last control field.
#[derive(Debug)]
pub struct TemporalInterpolator {
    controls: Vec<SpatialField>,
    /// Knot second derivatives, one buffer per control field.
    curvature: Vec<Vec<f64>>,
    positions: Vec<f64>,
}

impl TemporalInterpolator {
    pub fn new(controls: Vec<SpatialField>, frames_per_transition: usize) -> FieldResult<Self> {
        if controls.len() < 2 {
            return Err(FieldError::InsufficientFrames {
                found: controls.len(),
            });
        }
        if frames_per_transition == 0 {
            return Err(FieldError::invalid(
                "frames_per_transition",
                "must be a positive integer",
            ));
        }

        let resolution = controls[0].resolution();
        if let Some(bad) = controls.iter().find(|f| f.resolution() != resolution) {
            return Err(FieldError::Internal(format!(
                "field {} has resolution {}, expected {}",
                bad.time,
                bad.resolution(),
                resolution
            )));
        }
        if let Some(pair) = controls.windows(2).find(|w| w[0].time >= w[1].time) {
            return Err(FieldError::invalid(
                "timestamps",
                format!(
                    "fields must be strictly increasing in time ({} then {})",
                    pair[0].time, pair[1].time
                ),
            ));
        }

        let n = controls.len();
        let total_frames = (n - 1) * frames_per_transition;
        let curvature = knot_curvature(&controls);
        let positions = linspace(0.0, (n - 1) as f64, total_frames);

        debug!(
            controls = n,
            frames_per_transition,
            total_frames,
            "Prepared temporal interpolation"
        );

        Ok(Self {
            controls,
            curvature,
            positions,
        })
    }

    /// Number of output frames.
    pub fn frame_count(&self) -> usize {
        self.positions.len()
    }

    /// Evaluate output frame `index`.
    pub fn frame(&self, index: usize) -> FieldResult<SpatialField> {
        let position = *self.positions.get(index).ok_or_else(|| {
            FieldError::Internal(format!(
                "frame {} out of range ({} frames)",
                index,
                self.positions.len()
            ))
        })?;

        let last = self.controls.len() - 2;
        let k = (position.floor() as usize).min(last);
        let u = position - k as f64;
        let v = 1.0 - u;

        let a = v;
        let b = u;
        let c = (v * v * v - v) / 6.0;
        let d = (u * u * u - u) / 6.0;

        let y0 = self.controls[k].values();
        let y1 = self.controls[k + 1].values();
        let m0 = &self.curvature[k];
        let m1 = &self.curvature[k + 1];

        let values: Vec<f32> = (0..y0.len())
            .into_par_iter()
            .map(|i| {
                (a * y0[i] as f64 + b * y1[i] as f64 + c * m0[i] + d * m1[i]) as f32
            })
            .collect();

        let time = blend_time(&self.controls[k].time, &self.controls[k + 1].time, u);
        SpatialField::new(time, self.controls[0].resolution(), values)
    }

    /// Iterate frames in order, computing each on demand.
    pub fn frames(&self) -> impl Iterator<Item = FieldResult<SpatialField>> + '_ {
        (0..self.frame_count()).map(move |i| self.frame(i))
    }
}

/// Second derivatives at every knot for every cell.
fn knot_curvature(controls: &[SpatialField]) -> Vec<Vec<f64>> {
    let n = controls.len();
    let cells = controls[0].values().len();
    let mut m = vec![vec![0.0f64; cells]; n];

    if n == 2 {
        return m;
    }

    // d_i = 6 (y_{i-1} - 2 y_i + y_{i+1}) for interior knots
    let second_difference = |i: usize, cell: usize| {
        6.0 * (controls[i - 1].values()[cell] as f64 - 2.0 * controls[i].values()[cell] as f64
            + controls[i + 1].values()[cell] as f64)
    };

    if n == 3 {
        for cell in 0..cells {
            let curvature = second_difference(1, cell) / 6.0;
            for knot in m.iter_mut() {
                knot[cell] = curvature;
            }
        }
        return m;
    }

    // Not-a-knot folded into the interior system: first and last rows become
    // [6, 0, ...] and [..., 0, 6], middle rows [1, 4, 1]. The matrix is the
    // same for every cell, so the forward sweep factors are computed once.
    let unknowns = n - 2;
    let sub = |row: usize| if row == 0 || row == unknowns - 1 { 0.0 } else { 1.0 };
    let diag = |row: usize| if row == 0 || row == unknowns - 1 { 6.0 } else { 4.0 };
    let sup = sub;

    let mut c_prime = vec![0.0f64; unknowns];
    let mut denom = vec![0.0f64; unknowns];
    for row in 0..unknowns {
        denom[row] = if row == 0 {
            diag(0)
        } else {
            diag(row) - sub(row) * c_prime[row - 1]
        };
        c_prime[row] = sup(row) / denom[row];
    }

    let mut rhs = vec![0.0f64; unknowns];
    for cell in 0..cells {
        for row in 0..unknowns {
            let d = second_difference(row + 1, cell);
            rhs[row] = if row == 0 {
                d / denom[0]
            } else {
                (d - sub(row) * rhs[row - 1]) / denom[row]
            };
        }
        for row in (0..unknowns - 1).rev() {
            rhs[row] -= c_prime[row] * rhs[row + 1];
        }

        for row in 0..unknowns {
            m[row + 1][cell] = rhs[row];
        }
        m[0][cell] = 2.0 * m[1][cell] - m[2][cell];
        m[n - 1][cell] = 2.0 * m[n - 2][cell] - m[n - 3][cell];
    }

    m
}

/// Timestamp for a frame a fraction `u` of the way from `from` to `to`.
///
/// Interpolates the instant when both ends have one; otherwise the frame
/// keeps the earlier label.
fn blend_time(from: &SampleTime, to: &SampleTime, u: f64) -> SampleTime {
    if u <= 0.0 {
        return from.clone();
    }
    if u >= 1.0 {
        return to.clone();
    }
    match (from.instant(), to.instant()) {
        (Some(a), Some(b)) => {
            let span_ms = (b - a).num_milliseconds() as f64;
            SampleTime::from_instant(a + Duration::milliseconds((span_ms * u).round() as i64))
        }
        _ => from.clone(),
    }
}
