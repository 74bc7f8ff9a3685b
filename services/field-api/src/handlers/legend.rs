//! GET /legend.png

use axum::{
    extract::{rejection::QueryRejection, Extension, Query},
    http::header,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use pipeline::LegendRequest;
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;

use super::run_blocking;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct LegendQuery {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub colormap: Option<String>,
}

impl From<LegendQuery> for LegendRequest {
    fn from(query: LegendQuery) -> Self {
        let defaults = LegendRequest::default();
        LegendRequest {
            min: query.min.unwrap_or(defaults.min),
            max: query.max.unwrap_or(defaults.max),
            colormap: query.colormap,
        }
    }
}

#[instrument(skip(state))]
pub async fn legend_handler(
    Extension(state): Extension<Arc<AppState>>,
    query: Result<Query<LegendQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    metrics::counter!("field_requests_total", "endpoint" => "legend").increment(1);

    let request = LegendRequest::from(query);
    let png = run_blocking(&state, move |s| s.pipeline.legend(&request)).await?;

    Ok(([(header::CONTENT_TYPE, "image/png")], Bytes::from(png)).into_response())
}
