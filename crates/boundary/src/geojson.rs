//! Minimal GeoJSON reader for polygonal boundaries.
//!
//! Accepts a FeatureCollection (the first feature is used), a single Feature,
//! or a bare Polygon / MultiPolygon geometry.

use field_common::{FieldError, FieldResult};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::Value;

type Ring = Vec<Vec<f64>>;

/// Parse GeoJSON text into a multipolygon.
pub fn parse_geojson(content: &str) -> FieldResult<MultiPolygon<f64>> {
    let doc: Value = serde_json::from_str(content)
        .map_err(|e| FieldError::GeometryLoad(format!("invalid JSON: {}", e)))?;
    document_to_shape(&doc)
}

fn document_to_shape(doc: &Value) -> FieldResult<MultiPolygon<f64>> {
    match type_of(doc)? {
        "FeatureCollection" => {
            let first = doc
                .get("features")
                .and_then(Value::as_array)
                .and_then(|features| features.first())
                .ok_or_else(|| load_error("FeatureCollection has no features"))?;
            document_to_shape(first)
        }
        "Feature" => {
            let geometry = doc
                .get("geometry")
                .filter(|g| !g.is_null())
                .ok_or_else(|| load_error("Feature has no geometry"))?;
            geometry_to_shape(geometry)
        }
        _ => geometry_to_shape(doc),
    }
}

fn geometry_to_shape(geometry: &Value) -> FieldResult<MultiPolygon<f64>> {
    let kind = type_of(geometry)?;
    let coordinates = geometry
        .get("coordinates")
        .cloned()
        .ok_or_else(|| load_error(format!("{} has no coordinates", kind)))?;

    match kind {
        "Polygon" => {
            let rings: Vec<Ring> = serde_json::from_value(coordinates)
                .map_err(|e| load_error(format!("malformed Polygon: {}", e)))?;
            Ok(MultiPolygon::new(vec![build_polygon(rings)?]))
        }
        "MultiPolygon" => {
            let polygons: Vec<Vec<Ring>> = serde_json::from_value(coordinates)
                .map_err(|e| load_error(format!("malformed MultiPolygon: {}", e)))?;
            if polygons.is_empty() {
                return Err(load_error("MultiPolygon is empty"));
            }
            let polygons = polygons
                .into_iter()
                .map(build_polygon)
                .collect::<FieldResult<Vec<_>>>()?;
            Ok(MultiPolygon::new(polygons))
        }
        other => Err(load_error(format!(
            "unsupported geometry type '{}', expected Polygon or MultiPolygon",
            other
        ))),
    }
}

fn build_polygon(rings: Vec<Ring>) -> FieldResult<Polygon<f64>> {
    let mut rings = rings.into_iter();
    let exterior = rings
        .next()
        .ok_or_else(|| load_error("polygon has no exterior ring"))?;
    let exterior = build_ring(exterior)?;
    let interiors = rings.map(build_ring).collect::<FieldResult<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn build_ring(positions: Ring) -> FieldResult<LineString<f64>> {
    if positions.len() < 4 {
        return Err(load_error(format!(
            "ring has {} positions, at least 4 are required",
            positions.len()
        )));
    }
    let coords = positions
        .into_iter()
        .map(|p| match p.as_slice() {
            [x, y, ..] if x.is_finite() && y.is_finite() => Ok(Coord { x: *x, y: *y }),
            _ => Err(load_error("position must hold two finite numbers")),
        })
        .collect::<FieldResult<Vec<_>>>()?;
    Ok(LineString::new(coords))
}

fn type_of(value: &Value) -> FieldResult<&str> {
    value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| load_error("GeoJSON object has no 'type'"))
}

fn load_error(msg: impl Into<String>) -> FieldError {
    FieldError::GeometryLoad(msg.into())
}
