//! POST /api/heatmap

use axum::{
    extract::{rejection::JsonRejection, Extension},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use field_common::{MeasurementPoint, RangeSource};
use pipeline::HeatmapRequest;
use serde::de::{MapAccess, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{field::Empty, info, instrument};

use super::run_blocking;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct HeatmapBody {
    pub data: Vec<MeasurementPoint>,
    #[serde(
        default,
        alias = "timestamp_columns",
        alias = "timestamp",
        deserialize_with = "one_or_many"
    )]
    pub timestamps: Vec<String>,
    pub global_min: Option<f64>,
    pub global_max: Option<f64>,
    pub bandwidth: Option<f64>,
    pub colormap: Option<String>,
}

/// Accept `"2024-05-01"` as well as `["2024-05-01", ...]`.
fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(label) => vec![label],
        OneOrMany::Many(labels) => labels,
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HeatmapResponse {
    /// Base64 PNG per timestamp label, in request order.
    pub images: OrderedImages,
    pub global_min: f64,
    pub global_max: f64,
}

/// Label → base64 PNG pairs, serialized as a JSON object whose keys keep
/// their insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderedImages(pub Vec<(String, String)>);

impl OrderedImages {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, image)| image.as_str())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(label, _)| label.as_str())
    }
}

impl Serialize for OrderedImages {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(label, image)| (label, image)))
    }
}

impl<'de> Deserialize<'de> for OrderedImages {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ImagesVisitor;

        impl<'de> Visitor<'de> for ImagesVisitor {
            type Value = OrderedImages;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of timestamp labels to base64 images")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, String>()? {
                    entries.push(entry);
                }
                Ok(OrderedImages(entries))
            }
        }

        deserializer.deserialize_map(ImagesVisitor)
    }
}

#[instrument(skip_all, fields(points = Empty, timestamps = Empty))]
pub async fn heatmap_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<HeatmapBody>, JsonRejection>,
) -> Result<Json<HeatmapResponse>, ApiError> {
    let Json(body) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    metrics::counter!("field_requests_total", "endpoint" => "heatmap").increment(1);

    let span = tracing::Span::current();
    span.record("points", body.data.len());
    span.record("timestamps", body.timestamps.len());

    let request = HeatmapRequest {
        timestamps: body.timestamps,
        range: Some(RangeSource::from_options(body.global_min, body.global_max)),
        bandwidth_km: body.bandwidth,
        colormap: body.colormap,
    };
    let points = body.data;

    let start = Instant::now();
    let output = run_blocking(&state, move |s| s.pipeline.heatmap(&points, &request)).await?;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    metrics::histogram!("field_render_duration_ms", "endpoint" => "heatmap").record(elapsed_ms);

    let images = OrderedImages(
        output
            .images
            .iter()
            .map(|image| (image.label.clone(), STANDARD.encode(&image.png)))
            .collect(),
    );
    info!(images = images.len(), elapsed_ms, "Heatmap request complete");

    Ok(Json(HeatmapResponse {
        images,
        global_min: output.range.min(),
        global_max: output.range.max(),
    }))
}
