//! POST /api/animate

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::{header, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use field_common::{MeasurementPoint, RangeSource};
use pipeline::AnimationRequest;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{field::Empty, info, instrument};

use super::run_blocking;
use crate::error::ApiError;
use crate::state::AppState;

const FRAME_COUNT_HEADER: HeaderName = HeaderName::from_static("x-frame-count");

fn default_fps() -> u32 {
    10
}

fn default_frames_per_transition() -> usize {
    20
}

#[derive(Debug, Deserialize)]
pub struct AnimateBody {
    pub data: Vec<MeasurementPoint>,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_frames_per_transition")]
    pub frames_per_transition: usize,
    pub global_min: Option<f64>,
    pub global_max: Option<f64>,
    pub colormap: Option<String>,
}

#[instrument(skip_all, fields(points = Empty, fps = Empty, frames_per_transition = Empty))]
pub async fn animate_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<axum::Json<AnimateBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let axum::Json(body) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    metrics::counter!("field_requests_total", "endpoint" => "animate").increment(1);

    let span = tracing::Span::current();
    span.record("points", body.data.len());
    span.record("fps", body.fps);
    span.record("frames_per_transition", body.frames_per_transition);

    let request = AnimationRequest {
        range: Some(RangeSource::from_options(body.global_min, body.global_max)),
        colormap: body.colormap,
        ..AnimationRequest::new(body.fps, body.frames_per_transition)
    };
    let points = body.data;

    let start = Instant::now();
    let artifact = run_blocking(&state, move |s| s.pipeline.animate(&points, &request)).await?;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    metrics::histogram!("field_render_duration_ms", "endpoint" => "animate").record(elapsed_ms);
    metrics::counter!("field_frames_rendered_total").increment(artifact.frame_count as u64);

    info!(
        frames = artifact.frame_count,
        bytes = artifact.bytes.len(),
        elapsed_ms,
        "Animation request complete"
    );

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(artifact.mime_type)),
            (FRAME_COUNT_HEADER, HeaderValue::from(artifact.frame_count)),
        ],
        Bytes::from(artifact.bytes),
    )
        .into_response())
}
