//! Boundary geometry for clipping rendered fields.
//!
//! The boundary is a (multi)polygon, possibly with holes, loaded once from a
//! GeoJSON file and shared read-only by every request. Boolean operations
//! against an auxiliary rectangle carve it into styling zones.

mod geojson;
mod provider;

pub use geojson::parse_geojson;
pub use provider::BoundaryProvider;

use field_common::{BoundingBox, FieldError, FieldResult};
use geo::{BooleanOps, BoundingRect, Contains, Coord, MultiPolygon, Point, Rect};
use std::path::Path;
use tracing::info;

/// The valid spatial domain.
#[derive(Debug, Clone)]
pub struct Boundary {
    shape: MultiPolygon<f64>,
    bounds: BoundingBox,
}

/// A boundary split against an auxiliary rectangle.
#[derive(Debug, Clone)]
pub struct BoundaryZones {
    /// boundary ∩ rectangle
    pub inside: MultiPolygon<f64>,
    /// boundary − rectangle
    pub remainder: MultiPolygon<f64>,
}

impl Boundary {
    /// Wrap an already-built shape. Empty shapes are rejected.
    pub fn from_shape(shape: MultiPolygon<f64>) -> FieldResult<Self> {
        let rect = shape
            .bounding_rect()
            .ok_or_else(|| FieldError::GeometryLoad("boundary has no polygons".to_string()))?;
        let bounds = BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y);
        if !bounds.is_valid() {
            return Err(FieldError::GeometryLoad(format!(
                "boundary has degenerate extent {:?}",
                bounds.to_tuple()
            )));
        }
        Ok(Self { shape, bounds })
    }

    /// Load from a GeoJSON file.
    pub fn load(path: impl AsRef<Path>) -> FieldResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            FieldError::GeometryLoad(format!("cannot read {}: {}", path.display(), e))
        })?;
        let boundary = Self::from_geojson_str(&content)?;

        info!(
            path = %path.display(),
            polygons = boundary.shape.0.len(),
            holes = boundary.shape.0.iter().map(|p| p.interiors().len()).sum::<usize>(),
            bounds = ?boundary.bounds.to_tuple(),
            "Loaded boundary geometry"
        );
        Ok(boundary)
    }

    pub fn from_geojson_str(content: &str) -> FieldResult<Self> {
        Self::from_shape(parse_geojson(content)?)
    }

    pub fn shape(&self) -> &MultiPolygon<f64> {
        &self.shape
    }

    /// `(min_lon, min_lat, max_lon, max_lat)` extent.
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// boundary ∩ rect; may be empty or multi-part.
    pub fn intersect(&self, rect: &BoundingBox) -> MultiPolygon<f64> {
        self.shape.intersection(&to_rect(rect).to_polygon())
    }

    /// boundary − rect; may split into several disjoint pieces.
    pub fn difference(&self, rect: &BoundingBox) -> MultiPolygon<f64> {
        self.shape.difference(&to_rect(rect).to_polygon())
    }

    pub fn zones(&self, rect: &BoundingBox) -> BoundaryZones {
        BoundaryZones {
            inside: self.intersect(rect),
            remainder: self.difference(rect),
        }
    }

    /// Point-in-boundary test (holes excluded).
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.shape.contains(&Point::new(lon, lat))
    }
}

fn to_rect(bbox: &BoundingBox) -> Rect<f64> {
    Rect::new(
        Coord {
            x: bbox.min_x,
            y: bbox.min_y,
        },
        Coord {
            x: bbox.max_x,
            y: bbox.max_y,
        },
    )
}
