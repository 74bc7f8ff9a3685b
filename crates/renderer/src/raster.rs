//! Field-to-pixel colourisation and RGBA raster buffers.

use field_common::{FieldError, FieldResult, NormalizationRange, SpatialField};
use rayon::prelude::*;
use tiny_skia::Pixmap;

use crate::palette::{Color, Palette};
use crate::png;

/// Straight-alpha RGBA8 image, row-major, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Raster {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> FieldResult<Self> {
        if data.len() != width as usize * height as usize * 4 {
            return Err(FieldError::Render(format!(
                "raster {}x{} needs {} bytes, got {}",
                width,
                height,
                width as usize * height as usize * 4,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Copy out of a premultiplied surface, demultiplying each pixel.
    pub fn from_pixmap(pixmap: &Pixmap) -> Self {
        let data = pixmap
            .pixels()
            .iter()
            .flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect();
        Self {
            width: pixmap.width(),
            height: pixmap.height(),
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// RGBA at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    pub fn to_png(&self) -> FieldResult<Vec<u8>> {
        png::encode_auto(&self.data, self.width as usize, self.height as usize)
    }
}

/// Bilinear sample at fractional `(col, row)`, clamped to the field edges.
pub fn sample_bilinear(field: &SpatialField, col: f64, row: f64) -> f32 {
    let n = field.resolution();
    let max = (n - 1) as f64;
    let x = col.clamp(0.0, max);
    let y = row.clamp(0.0, max);

    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = (x0 + 1).min(n - 1);
    let y1 = (y0 + 1).min(n - 1);
    let xf = (x - x0 as f64) as f32;
    let yf = (y - y0 as f64) as f32;

    let v00 = field.get(x0, y0);
    let v10 = field.get(x1, y0);
    let v01 = field.get(x0, y1);
    let v11 = field.get(x1, y1);

    let top = v00 * (1.0 - xf) + v10 * xf;
    let bottom = v01 * (1.0 - xf) + v11 * xf;
    top * (1.0 - yf) + bottom * yf
}

/// Paint `field` over the whole of `pixmap`.
///
/// The field is assumed to span the pixmap exactly; each pixel centre is
/// mapped to a fractional grid position and sampled bilinearly. Colours are
/// opaque, so premultiplied and straight values coincide; non-finite values
/// are left transparent.
pub fn colorize_into(
    pixmap: &mut Pixmap,
    field: &SpatialField,
    range: &NormalizationRange,
    palette: &Palette,
) {
    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let steps = (field.resolution() - 1) as f64;

    pixmap
        .data_mut()
        .par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(py, row)| {
            let grid_row = (py as f64 + 0.5) / height as f64 * steps;
            for (px, pixel) in row.chunks_exact_mut(4).enumerate() {
                let grid_col = (px as f64 + 0.5) / width as f64 * steps;
                let value = sample_bilinear(field, grid_col, grid_row) as f64;
                let color = if value.is_finite() {
                    palette.color_for(value, range)
                } else {
                    Color::transparent()
                };
                pixel.copy_from_slice(&color.to_array());
            }
        });
}
