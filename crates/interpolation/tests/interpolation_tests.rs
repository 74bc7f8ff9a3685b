//! Integration tests for spatial and temporal interpolation.

use field_common::{group_by_time, BoundingBox, Grid, NormalizationRange};
use interpolation::{
    build_sequence, interpolate_slice, IdwKernel, IdwParams, RbfInterpolator, SpatialStrategy,
    TemporalInterpolator, DEFAULT_MAX_RBF_POINTS,
};
use test_utils::{quadrilateral_points, ring_points, time_series, LAGOON_BOUNDS};

fn lagoon_grid(resolution: usize) -> Grid {
    let (a, b, c, d) = LAGOON_BOUNDS;
    Grid::build(BoundingBox::new(a, b, c, d), resolution).unwrap()
}

// ============================================================================
// Spatial
// ============================================================================

#[test]
fn test_rbf_exact_at_samples() {
    let points = ring_points("2024-05-01", 9, 2.0);
    let slices = group_by_time(&points);
    let rbf = RbfInterpolator::fit(&slices[0].samples()).unwrap();
    for p in &points {
        assert!((rbf.evaluate(p.longitude, p.latitude) - p.value).abs() < 1e-8);
    }
}

#[test]
fn test_rbf_grid_hits_sample_on_lattice() {
    // Samples placed exactly on grid nodes are reproduced in the field
    let grid = lagoon_grid(11);
    let nodes = [(1, 1, 4.0), (9, 2, -3.0), (8, 9, 7.0), (2, 8, 1.5), (5, 5, 0.0)];
    let points: Vec<_> = nodes
        .iter()
        .map(|&(col, row, v)| {
            let (lon, lat) = grid.coord(col, row);
            field_common::MeasurementPoint::new(lat, lon, "t", v)
        })
        .collect();
    let slice = &group_by_time(&points)[0];
    let strategy = SpatialStrategy::RadialBasis {
        max_points: DEFAULT_MAX_RBF_POINTS,
    };
    let field = interpolate_slice(slice, &grid, &strategy).unwrap();
    for &(col, row, v) in &nodes {
        assert!((field.get(col, row) as f64 - v).abs() < 1e-4);
    }
}

#[test]
fn test_idw_quadrilateral_within_range() {
    let points = quadrilateral_points("2024-05-01", [1.0, 4.0, 2.0, 8.0, 5.0]);
    let slice = &group_by_time(&points)[0];
    let range = NormalizationRange::new(1.0, 8.0).unwrap();
    let params = IdwParams {
        kernel: IdwKernel::gaussian(0.05),
        sigma: 4.5,
        range,
    };
    let field =
        interpolate_slice(slice, &lagoon_grid(40), &SpatialStrategy::InverseDistance(params))
            .unwrap();
    assert!(field
        .values()
        .iter()
        .all(|&v| v >= 1.0 && v <= 8.0 && v.is_finite()));
}

#[test]
fn test_sparse_slice_is_dropped_from_sequence() {
    let points = time_series(
        &["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04", "2024-01-05"],
        &[5, 4, 3, 6, 4],
    );
    let slices = group_by_time(&points);
    assert_eq!(slices.len(), 5);

    let fields = build_sequence(&slices, &lagoon_grid(12), DEFAULT_MAX_RBF_POINTS).unwrap();
    assert_eq!(fields.len(), 4);
    assert!(fields.iter().all(|f| f.time.label() != "2024-01-03"));
}

// ============================================================================
// Temporal
// ============================================================================

#[test]
fn test_frame_count_for_sequences() {
    let grid = lagoon_grid(8);
    for n in 2..=5 {
        let labels: Vec<String> = (1..=n).map(|d| format!("2024-02-{:02}", d)).collect();
        let refs: Vec<&str> = labels.iter().map(String::as_str).collect();
        let counts = vec![5; n];
        let slices = group_by_time(&time_series(&refs, &counts));
        let fields = build_sequence(&slices, &grid, DEFAULT_MAX_RBF_POINTS).unwrap();

        let first = fields[0].clone();
        let last = fields[n - 1].clone();
        let interp = TemporalInterpolator::new(fields, 6).unwrap();
        assert_eq!(interp.frame_count(), (n - 1) * 6);

        let frames: Vec<_> = interp.frames().collect::<Result<_, _>>().unwrap();
        assert_eq!(frames.len(), (n - 1) * 6);
        assert_eq!(frames[0].values(), first.values());
        assert_eq!(frames[frames.len() - 1].values(), last.values());
    }
}

#[test]
fn test_empty_sequence_is_insufficient() {
    let err = TemporalInterpolator::new(Vec::new(), 5).unwrap_err();
    assert!(matches!(
        err,
        field_common::FieldError::InsufficientFrames { found: 0 }
    ));
}
