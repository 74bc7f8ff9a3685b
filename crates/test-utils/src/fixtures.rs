//! Boundary fixtures.
//!
//! The main fixture is a one-degree square "lagoon" with a square island hole
//! in the middle, sized like the coastal lagoons this pipeline renders.

use std::io::Write;
use tempfile::NamedTempFile;

/// Extent of [`LAGOON_GEOJSON`] as `(min_lon, min_lat, max_lon, max_lat)`.
pub const LAGOON_BOUNDS: (f64, f64, f64, f64) = (85.0, 19.0, 86.0, 20.0);

/// Band across the north of the lagoon used as the excluded zone.
pub const NORTH_BAND: (f64, f64, f64, f64) = (84.9, 19.8, 86.1, 20.1);

/// Square lagoon with an island, wrapped in a FeatureCollection.
pub const LAGOON_GEOJSON: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "properties": {"name": "test lagoon"},
      "geometry": {
        "type": "Polygon",
        "coordinates": [
          [[85.0, 19.0], [86.0, 19.0], [86.0, 20.0], [85.0, 20.0], [85.0, 19.0]],
          [[85.4, 19.4], [85.6, 19.4], [85.6, 19.6], [85.4, 19.6], [85.4, 19.4]]
        ]
      }
    }
  ]
}"#;

/// Two disjoint basins side by side.
pub const TWIN_BASINS_GEOJSON: &str = r#"{
  "type": "MultiPolygon",
  "coordinates": [
    [[[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0], [0.0, 0.0]]],
    [[[6.0, 0.0], [10.0, 0.0], [10.0, 4.0], [6.0, 4.0], [6.0, 0.0]]]
  ]
}"#;

/// Write GeoJSON to a temporary file that lives as long as the handle.
pub fn write_boundary_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp boundary file");
    file.write_all(content.as_bytes())
        .expect("write temp boundary file");
    file.flush().expect("flush temp boundary file");
    file
}
