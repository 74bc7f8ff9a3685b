//! Tests for the field API routes.
//!
//! Requests go through the full router with `tower::ServiceExt::oneshot`,
//! against a pipeline with an in-memory boundary and small grids.

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use boundary::Boundary;
use field_api::create_router;
use field_api::handlers::heatmap::HeatmapResponse;
use field_api::state::AppState;
use pipeline::{FieldPipeline, PipelineConfig};
use serde_json::{json, Value};
use std::sync::Arc;
use test_utils::{quadrilateral_points, time_series, LAGOON_GEOJSON};
use tower::ServiceExt;

// ============================================================================
// Helper functions
// ============================================================================

fn app() -> Router {
    let mut config = PipelineConfig::default();
    config.heatmap.resolution = 30;
    config.heatmap.frame_width = 60;
    config.heatmap.smoothing_sigma = 1.0;
    config.heatmap.excluded_zone = None;
    config.animation.resolution = 20;
    config.animation.frame_width = 40;

    let boundary = Boundary::from_geojson_str(LAGOON_GEOJSON).unwrap();
    let pipeline = FieldPipeline::with_boundary(config, boundary).unwrap();
    create_router(Arc::new(AppState::with_pipeline(pipeline)))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

// ============================================================================
// Heatmap
// ============================================================================

#[tokio::test]
async fn test_heatmap_returns_base64_png_per_timestamp() {
    let points = quadrilateral_points("2024-05-01", [1.0, 2.0, 3.0, 4.0, 5.0]);
    let body = json!({
        "data": points,
        "timestamps": ["2024-05-01"],
        "bandwidth": 0.05,
    });

    let response = app().oneshot(post_json("/api/heatmap", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed: HeatmapResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(parsed.images.len(), 1);
    assert_eq!(parsed.global_min, 1.0);
    assert_eq!(parsed.global_max, 5.0);

    let png = STANDARD.decode(parsed.images.get("2024-05-01").unwrap()).unwrap();
    assert_eq!(&png[1..4], b"PNG");
}

#[tokio::test]
async fn test_heatmap_images_keep_request_order() {
    let mut points = quadrilateral_points("2024-05-02", [1.0, 2.0, 3.0, 4.0, 5.0]);
    points.extend(quadrilateral_points("2024-05-01", [2.0, 3.0, 4.0, 5.0, 6.0]));
    let body = json!({
        "data": points,
        "timestamps": ["2024-05-02", "2024-05-01"],
    });

    let response = app().oneshot(post_json("/api/heatmap", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = body_bytes(response).await;
    let text = String::from_utf8(bytes.clone()).unwrap();
    let later = text.find("\"2024-05-02\"").unwrap();
    let earlier = text.find("\"2024-05-01\"").unwrap();
    assert!(later < earlier, "keys should follow the request order");

    let parsed: HeatmapResponse = serde_json::from_slice(&bytes).unwrap();
    let labels: Vec<&str> = parsed.images.labels().collect();
    assert_eq!(labels, vec!["2024-05-02", "2024-05-01"]);
}

#[tokio::test]
async fn test_heatmap_accepts_timestamp_columns_alias() {
    let mut points = quadrilateral_points("2024-05-01", [1.0, 2.0, 3.0, 4.0, 5.0]);
    points.extend(quadrilateral_points("2024-05-02", [2.0, 3.0, 4.0, 5.0, 6.0]));

    let body = json!({"data": &points, "timestamp_columns": ["2024-05-02"]});
    let response = app().oneshot(post_json("/api/heatmap", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let parsed: HeatmapResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(parsed.images.labels().collect::<Vec<_>>(), vec!["2024-05-02"]);

    let body = json!({"data": &points, "timestamp": "2024-05-01"});
    let response = app().oneshot(post_json("/api/heatmap", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let parsed: HeatmapResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(parsed.images.labels().collect::<Vec<_>>(), vec!["2024-05-01"]);
}

#[tokio::test]
async fn test_heatmap_empty_data_is_bad_request() {
    let body = json!({"data": [], "timestamps": ["2024-05-01"]});
    let response = app().oneshot(post_json("/api/heatmap", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(error["code"], "EmptyInput");
}

#[tokio::test]
async fn test_heatmap_malformed_json() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/heatmap")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"data\": [}"))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(error["code"], "BadRequest");
}

// ============================================================================
// Animation
// ============================================================================

#[tokio::test]
async fn test_animate_returns_gif() {
    let points = time_series(&["2024-01-01", "2024-01-02"], &[4, 4]);
    let body = json!({"data": points, "fps": 8, "frames_per_transition": 5});

    let response = app().oneshot(post_json("/api/animate", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/gif");
    assert_eq!(response.headers()["x-frame-count"], "5");

    let bytes = body_bytes(response).await;
    assert_eq!(&bytes[..6], b"GIF89a");
}

#[tokio::test]
async fn test_animate_single_timestamp_is_unprocessable() {
    let points = time_series(&["only"], &[6]);
    let body = json!({"data": points, "fps": 8, "frames_per_transition": 5});

    let response = app().oneshot(post_json("/api/animate", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let error: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(error["code"], "InsufficientFrames");
}

// ============================================================================
// Legend, health and metrics
// ============================================================================

#[tokio::test]
async fn test_legend_png() {
    let request = Request::builder()
        .uri("/legend.png?min=0.5&max=12&colormap=plasma")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");

    let bytes = body_bytes(response).await;
    assert_eq!(&bytes[1..4], b"PNG");
}

#[tokio::test]
async fn test_legend_inverted_range() {
    let request = Request::builder()
        .uri("/legend.png?min=5&max=1")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health() {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let health: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(health["status"], "ok");
}

#[tokio::test]
async fn test_metrics_without_recorder_is_empty() {
    let request = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_bytes(response).await.is_empty());
}
