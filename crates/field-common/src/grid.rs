//! Regular lon/lat sample grids.

use crate::{BoundingBox, FieldError, FieldResult};
use serde::{Deserialize, Serialize};

/// A square `resolution × resolution` lattice spanning a bounding box.
///
/// Coordinates are evenly spaced and include both bounds. Rows run from the
/// northern edge (`max_y`) to the southern edge, columns west to east, so a
/// row-major value buffer is already in image order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    bbox: BoundingBox,
    resolution: usize,
    lons: Vec<f64>,
    lats: Vec<f64>,
}

impl Grid {
    /// Build the grid for `bbox` with `resolution` samples per axis.
    pub fn build(bbox: BoundingBox, resolution: usize) -> FieldResult<Self> {
        if resolution < 2 {
            return Err(FieldError::invalid(
                "resolution",
                format!("must be at least 2, got {}", resolution),
            ));
        }
        if !bbox.is_valid() {
            return Err(FieldError::invalid(
                "bounds",
                format!("degenerate bounding box {:?}", bbox.to_tuple()),
            ));
        }

        let lons = linspace(bbox.min_x, bbox.max_x, resolution);
        let lats = linspace(bbox.max_y, bbox.min_y, resolution);

        Ok(Self {
            bbox,
            resolution,
            lons,
            lats,
        })
    }

    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    /// Samples per axis.
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Total number of grid points.
    pub fn len(&self) -> usize {
        self.resolution * self.resolution
    }

    pub fn is_empty(&self) -> bool {
        self.resolution == 0
    }

    /// Longitudes of each column, west to east.
    pub fn lons(&self) -> &[f64] {
        &self.lons
    }

    /// Latitudes of each row, north to south.
    pub fn lats(&self) -> &[f64] {
        &self.lats
    }

    /// Coordinate `(lon, lat)` of column `col`, row `row`.
    pub fn coord(&self, col: usize, row: usize) -> (f64, f64) {
        (self.lons[col], self.lats[row])
    }
}

/// `n` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            let mut values: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            // Pin the last sample so rounding never leaves the closed interval
            values[n - 1] = end;
            values
        }
    }
}
