//! Geographic polygons to pixel-space paths and clip masks.

use field_common::{BoundingBox, FieldError, FieldResult};
use geo::{LineString, MultiPolygon};
use tiny_skia::{FillRule, Mask, Path, PathBuilder, Transform};

/// Maps lon/lat onto a `width × height` image covering `bbox`, north up.
#[derive(Debug, Clone, Copy)]
pub struct GeoTransform {
    bbox: BoundingBox,
    width: u32,
    height: u32,
}

impl GeoTransform {
    pub fn new(bbox: BoundingBox, width: u32, height: u32) -> Self {
        Self {
            bbox,
            width,
            height,
        }
    }

    pub fn to_pixel(&self, lon: f64, lat: f64) -> (f32, f32) {
        let x = (lon - self.bbox.min_x) / self.bbox.width() * self.width as f64;
        let y = (self.bbox.max_y - lat) / self.bbox.height() * self.height as f64;
        (x as f32, y as f32)
    }
}

/// One path holding every exterior and interior ring.
///
/// Filled with [`FillRule::EvenOdd`] the holes come out empty. Returns
/// `None` for an empty shape.
pub fn multipolygon_path(shape: &MultiPolygon<f64>, transform: &GeoTransform) -> Option<Path> {
    let mut pb = PathBuilder::new();
    for polygon in &shape.0 {
        add_ring(&mut pb, polygon.exterior(), transform);
        for hole in polygon.interiors() {
            add_ring(&mut pb, hole, transform);
        }
    }
    pb.finish()
}

fn add_ring(pb: &mut PathBuilder, ring: &LineString<f64>, transform: &GeoTransform) {
    let mut coords = ring.coords();
    let Some(first) = coords.next() else {
        return;
    };
    let (x, y) = transform.to_pixel(first.x, first.y);
    pb.move_to(x, y);
    for c in coords {
        let (x, y) = transform.to_pixel(c.x, c.y);
        pb.line_to(x, y);
    }
    pb.close();
}

/// Anti-aliased coverage mask of `shape`.
///
/// An empty shape yields an all-zero mask, which hides everything drawn
/// through it.
pub fn build_mask(shape: &MultiPolygon<f64>, transform: &GeoTransform) -> FieldResult<Mask> {
    let mut mask = Mask::new(transform.width, transform.height).ok_or_else(|| {
        FieldError::Render(format!(
            "cannot allocate {}x{} clip mask",
            transform.width, transform.height
        ))
    })?;
    if let Some(path) = multipolygon_path(shape, transform) {
        mask.fill_path(&path, FillRule::EvenOdd, true, Transform::identity());
    }
    Ok(mask)
}
