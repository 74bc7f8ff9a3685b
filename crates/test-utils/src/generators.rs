//! Measurement generators for creating predictable point sets.
//!
//! Points are laid out inside [`crate::LAGOON_BOUNDS`] and away from the
//! island hole so every generated sample is inside the boundary.

use field_common::MeasurementPoint;

/// Five well-spread points (four corners of a quadrilateral plus its center)
/// at one timestamp.
///
/// # Example
///
/// ```
/// use test_utils::quadrilateral_points;
///
/// let points = quadrilateral_points("2024-01-01", [1.0, 2.0, 3.0, 4.0, 5.0]);
/// assert_eq!(points.len(), 5);
/// ```
pub fn quadrilateral_points(timestamp: &str, values: [f64; 5]) -> Vec<MeasurementPoint> {
    let coords = [
        (19.15, 85.15),
        (19.2, 85.85),
        (19.85, 85.8),
        (19.8, 85.2),
        (19.3, 85.3),
    ];
    coords
        .iter()
        .zip(values)
        .map(|(&(lat, lon), value)| MeasurementPoint::new(lat, lon, timestamp, value))
        .collect()
}

/// `count` points on a ring around the lagoon center with values
/// `base + i`.
///
/// Points on a circle are pairwise distinct and never collinear, which keeps
/// radial-basis systems well conditioned.
pub fn ring_points(timestamp: &str, count: usize, base: f64) -> Vec<MeasurementPoint> {
    (0..count)
        .map(|i| {
            let angle = i as f64 / count as f64 * std::f64::consts::TAU;
            let lat = 19.5 + 0.35 * angle.sin();
            let lon = 85.5 + 0.35 * angle.cos();
            MeasurementPoint::new(lat, lon, timestamp, base + i as f64)
        })
        .collect()
}

/// A multi-slice series: slice `i` has `counts[i]` ring points at
/// `timestamps[i]`, with values offset by `10 * i`.
pub fn time_series(timestamps: &[&str], counts: &[usize]) -> Vec<MeasurementPoint> {
    timestamps
        .iter()
        .zip(counts)
        .enumerate()
        .flat_map(|(i, (ts, &count))| ring_points(ts, count, 10.0 * i as f64))
        .collect()
}
