//! End-to-end tests for heatmap, animation and legend generation.

use boundary::Boundary;
use field_common::{BoundingBox, FieldError, MeasurementPoint, RangeSource};
use image::codecs::gif::GifDecoder;
use image::AnimationDecoder;
use pipeline::{
    generate_animation, generate_heatmap, generate_legend, AnimationRequest, FieldPipeline,
    HeatmapRequest, LegendRequest, PipelineConfig,
};
use std::io::Cursor;
use test_utils::{
    quadrilateral_points, ring_points, time_series, write_boundary_file, LAGOON_GEOJSON,
    NORTH_BAND,
};

// ============================================================================
// Helper functions
// ============================================================================

fn lagoon() -> Boundary {
    Boundary::from_geojson_str(LAGOON_GEOJSON).unwrap()
}

/// Small grids and frames so the whole suite stays fast.
fn small_config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.heatmap.resolution = 40;
    config.heatmap.frame_width = 80;
    config.heatmap.smoothing_sigma = 1.5;
    config.heatmap.excluded_zone = None;
    config.animation.resolution = 30;
    config.animation.frame_width = 60;
    config.animation.channel_depth = 2;
    config
}

fn count_gif_frames(bytes: &[u8]) -> usize {
    let decoder = GifDecoder::new(Cursor::new(bytes)).unwrap();
    decoder.into_frames().count()
}

// ============================================================================
// Heatmap
// ============================================================================

#[test]
fn test_heatmap_single_timestamp() {
    let points = quadrilateral_points("2024-03-01 12:00:00", [1.0, 2.0, 3.0, 4.0, 5.0]);
    let request = HeatmapRequest {
        timestamps: vec!["2024-03-01 12:00:00".to_string()],
        bandwidth_km: Some(0.05),
        ..HeatmapRequest::default()
    };

    let output = generate_heatmap(&points, &lagoon(), &small_config(), &request).unwrap();

    assert_eq!(output.images.len(), 1);
    let image = &output.images[0];
    assert_eq!(image.label, "2024-03-01 12:00:00");
    assert_eq!(output.range.min(), 1.0);
    assert_eq!(output.range.max(), 5.0);

    let (lo, hi) = image.value_range.unwrap();
    assert!(lo as f64 >= output.range.min() - 1e-6);
    assert!(hi as f64 <= output.range.max() + 1e-6);

    let decoded = image::load_from_memory(&image.png).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (80, 80));
}

#[test]
fn test_heatmap_renders_every_requested_timestamp() {
    let mut points = quadrilateral_points("2024-03-01", [1.0, 2.0, 3.0, 4.0, 5.0]);
    points.extend(quadrilateral_points("2024-03-02", [5.0, 4.0, 3.0, 2.0, 1.0]));
    points.extend(quadrilateral_points("2024-03-03", [2.0, 2.0, 2.0, 2.0, 2.0]));

    let request = HeatmapRequest {
        timestamps: vec!["2024-03-03".to_string(), "2024-03-01".to_string()],
        ..HeatmapRequest::default()
    };
    let output = generate_heatmap(&points, &lagoon(), &small_config(), &request).unwrap();

    let labels: Vec<&str> = output.images.iter().map(|i| i.label.as_str()).collect();
    assert_eq!(labels, vec!["2024-03-03", "2024-03-01"]);
}

#[test]
fn test_heatmap_without_timestamps_renders_all() {
    let mut points = quadrilateral_points("a", [1.0; 5]);
    points.extend(quadrilateral_points("b", [2.0; 5]));

    let output = generate_heatmap(
        &points,
        &lagoon(),
        &small_config(),
        &HeatmapRequest::default(),
    )
    .unwrap();
    assert_eq!(output.images.len(), 2);
}

#[test]
fn test_heatmap_skips_missing_timestamp() {
    let points = quadrilateral_points("2024-03-01", [1.0, 2.0, 3.0, 4.0, 5.0]);
    let request = HeatmapRequest {
        timestamps: vec!["2024-03-01".to_string(), "1999-01-01".to_string()],
        ..HeatmapRequest::default()
    };
    let output = generate_heatmap(&points, &lagoon(), &small_config(), &request).unwrap();
    assert_eq!(output.images.len(), 1);

    let only_missing = HeatmapRequest {
        timestamps: vec!["1999-01-01".to_string()],
        ..HeatmapRequest::default()
    };
    let err = generate_heatmap(&points, &lagoon(), &small_config(), &only_missing).unwrap_err();
    assert!(matches!(err, FieldError::EmptyInput));
}

#[test]
fn test_heatmap_excluded_zone_is_flat_colour() {
    let mut config = small_config();
    let (min_x, min_y, max_x, max_y) = NORTH_BAND;
    config.heatmap.excluded_zone = Some(BoundingBox::new(min_x, min_y, max_x, max_y));

    let points = quadrilateral_points("t", [1.0, 2.0, 3.0, 4.0, 5.0]);
    let output = generate_heatmap(&points, &lagoon(), &config, &HeatmapRequest::default()).unwrap();
    let decoded = image::load_from_memory(&output.images[0].png)
        .unwrap()
        .to_rgba8();

    // Top rows are inside the band, the center is the island hole
    assert_eq!(decoded.get_pixel(40, 4).0, [0, 100, 0, 255]);
    assert_eq!(decoded.get_pixel(40, 40).0[3], 0);
    assert_eq!(decoded.get_pixel(40, 70).0[3], 255);
}

#[test]
fn test_heatmap_explicit_range_is_echoed() {
    let points = quadrilateral_points("t", [1.0, 2.0, 3.0, 4.0, 5.0]);
    let request = HeatmapRequest {
        range: Some(RangeSource::Explicit { min: 0.0, max: 10.0 }),
        ..HeatmapRequest::default()
    };
    let output = generate_heatmap(&points, &lagoon(), &small_config(), &request).unwrap();
    assert_eq!(output.range.min(), 0.0);
    assert_eq!(output.range.max(), 10.0);
}

#[test]
fn test_heatmap_empty_input() {
    let err = generate_heatmap(&[], &lagoon(), &small_config(), &HeatmapRequest::default())
        .unwrap_err();
    assert!(matches!(err, FieldError::EmptyInput));
}

// ============================================================================
// Animation
// ============================================================================

#[test]
fn test_animation_two_slices() {
    let mut points = ring_points("2024-01-01", 4, 0.0);
    points.extend(ring_points("2024-01-02", 4, 5.0));

    let artifact = generate_animation(
        &points,
        &lagoon(),
        &small_config(),
        &AnimationRequest::new(10, 10),
    )
    .unwrap();

    assert_eq!(artifact.mime_type, "image/gif");
    assert_eq!(artifact.frame_count, 10);
    assert_eq!((artifact.width, artifact.height), (60, 60));
    assert_eq!(count_gif_frames(&artifact.bytes), 10);
}

#[test]
fn test_animation_merges_equivalent_timestamps() {
    let mut points = ring_points("2024-01-01", 5, 0.0);
    points.extend(ring_points("2024-01-01 00:00:00", 5, 0.5));
    points.extend(ring_points("2024-01-02", 5, 5.0));

    let artifact = generate_animation(
        &points,
        &lagoon(),
        &small_config(),
        &AnimationRequest::new(10, 10),
    )
    .unwrap();

    assert_eq!(artifact.frame_count, 10);
    assert_eq!(count_gif_frames(&artifact.bytes), 10);
}

#[test]
fn test_animation_drops_sparse_slice() {
    let points = time_series(&["t0", "t1", "t2", "t3", "t4"], &[6, 6, 3, 6, 6]);

    let artifact = generate_animation(
        &points,
        &lagoon(),
        &small_config(),
        &AnimationRequest::new(12, 4),
    )
    .unwrap();

    assert_eq!(artifact.frame_count, 3 * 4);
    assert_eq!(count_gif_frames(&artifact.bytes), 12);
}

#[test]
fn test_animation_empty_input() {
    let err = generate_animation(
        &[],
        &lagoon(),
        &small_config(),
        &AnimationRequest::new(10, 10),
    )
    .unwrap_err();
    assert!(matches!(err, FieldError::EmptyInput));
}

#[test]
fn test_animation_single_timestamp() {
    let points = ring_points("only", 8, 0.0);
    let err = generate_animation(
        &points,
        &lagoon(),
        &small_config(),
        &AnimationRequest::new(10, 10),
    )
    .unwrap_err();
    assert!(matches!(err, FieldError::InsufficientFrames { found: 1 }));
}

#[test]
fn test_animation_all_slices_too_sparse() {
    let points = time_series(&["a", "b", "c"], &[3, 8, 2]);
    let err = generate_animation(
        &points,
        &lagoon(),
        &small_config(),
        &AnimationRequest::new(10, 10),
    )
    .unwrap_err();
    assert!(matches!(err, FieldError::InsufficientFrames { found: 1 }));
}

#[test]
fn test_animation_frame_cell_cap() {
    let mut config = small_config();
    config.limits.max_frame_cells = 1_000;
    let points = time_series(&["a", "b"], &[5, 5]);

    let err = generate_animation(&points, &lagoon(), &config, &AnimationRequest::new(10, 10))
        .unwrap_err();
    match err {
        FieldError::ResourceLimit {
            limit, requested, ..
        } => {
            assert_eq!(limit, "max_frame_cells");
            assert_eq!(requested, 10 * 30 * 30);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_animation_rbf_point_cap() {
    let mut config = small_config();
    config.limits.max_rbf_points = 6;
    let points = time_series(&["a", "b"], &[5, 8]);

    let err = generate_animation(&points, &lagoon(), &config, &AnimationRequest::new(10, 10))
        .unwrap_err();
    match err {
        FieldError::ResourceLimit {
            limit,
            requested,
            allowed,
        } => {
            assert_eq!(limit, "max_rbf_points");
            assert_eq!((requested, allowed), (8, 6));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_animation_single_frame_is_encoding_error() {
    let points = time_series(&["a", "b"], &[5, 5]);
    let err = generate_animation(
        &points,
        &lagoon(),
        &small_config(),
        &AnimationRequest::new(10, 1),
    )
    .unwrap_err();
    assert!(matches!(err, FieldError::Encoding(_)));
}

#[test]
fn test_animation_rejects_bad_fps() {
    let points = time_series(&["a", "b"], &[5, 5]);
    let err = generate_animation(
        &points,
        &lagoon(),
        &small_config(),
        &AnimationRequest::new(0, 10),
    )
    .unwrap_err();
    assert_eq!(err.error_code(), "InvalidParameter");
}

// ============================================================================
// Legend and pipeline handle
// ============================================================================

#[test]
fn test_legend_png_dimensions() {
    let config = small_config();
    let request = LegendRequest {
        min: 2.0,
        max: 9.5,
        colormap: Some("Viridis".to_string()),
    };
    let png = generate_legend(&request, &config).unwrap();
    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!(decoded.width(), config.legend.style.width);
    assert_eq!(decoded.height(), config.legend.style.height);
}

#[test]
fn test_pipeline_loads_boundary_from_file() {
    let file = write_boundary_file(LAGOON_GEOJSON);
    let mut config = small_config();
    config.boundary_path = file.path().to_path_buf();

    let pipeline = FieldPipeline::new(config).unwrap();
    pipeline.warm_up().unwrap();

    let points: Vec<MeasurementPoint> = quadrilateral_points("t", [1.0, 2.0, 3.0, 4.0, 5.0]);
    let output = pipeline
        .heatmap(&points, &HeatmapRequest::default())
        .unwrap();
    assert_eq!(output.images.len(), 1);
}

#[test]
fn test_pipeline_missing_boundary() {
    let mut config = small_config();
    config.boundary_path = "/nonexistent/boundary.geojson".into();
    let pipeline = FieldPipeline::new(config).unwrap();

    let err = pipeline.warm_up().unwrap_err();
    assert!(matches!(err, FieldError::GeometryLoad(_)));
}
