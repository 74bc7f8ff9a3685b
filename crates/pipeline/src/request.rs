//! Request parameters and produced artifacts.

use field_common::{
    FieldError, FieldResult, MeasurementPoint, NormalizationRange, RangeSource, SampleTime,
};

use crate::config::LimitsConfig;

/// Parameters for a density heatmap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeatmapRequest {
    /// Timestamp labels to render; empty renders every timestamp present.
    pub timestamps: Vec<String>,
    pub range: Option<RangeSource>,
    pub bandwidth_km: Option<f64>,
    pub colormap: Option<String>,
}

impl HeatmapRequest {
    pub fn validate(&self) -> FieldResult<()> {
        if let Some(bandwidth) = self.bandwidth_km {
            if !bandwidth.is_finite() || bandwidth < 0.0 {
                return Err(FieldError::invalid(
                    "bandwidth",
                    format!("must be a non-negative number, got {}", bandwidth),
                ));
            }
        }
        Ok(())
    }
}

/// Parameters for an animated sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationRequest {
    pub fps: u32,
    pub frames_per_transition: usize,
    pub range: Option<RangeSource>,
    pub colormap: Option<String>,
}

impl AnimationRequest {
    pub fn new(fps: u32, frames_per_transition: usize) -> Self {
        Self {
            fps,
            frames_per_transition,
            range: None,
            colormap: None,
        }
    }

    pub fn validate(&self, limits: &LimitsConfig) -> FieldResult<()> {
        if self.fps == 0 || self.fps > limits.max_fps {
            return Err(FieldError::invalid(
                "fps",
                format!("must be within 1..={}, got {}", limits.max_fps, self.fps),
            ));
        }
        if self.frames_per_transition == 0
            || self.frames_per_transition > limits.max_frames_per_transition
        {
            return Err(FieldError::invalid(
                "frames_per_transition",
                format!(
                    "must be within 1..={}, got {}",
                    limits.max_frames_per_transition, self.frames_per_transition
                ),
            ));
        }
        Ok(())
    }
}

/// Parameters for a standalone legend.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendRequest {
    pub min: f64,
    pub max: f64,
    pub colormap: Option<String>,
}

impl Default for LegendRequest {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 1.0,
            colormap: None,
        }
    }
}

/// One encoded heatmap image.
#[derive(Debug, Clone)]
pub struct HeatmapImage {
    /// Label as requested by the caller (or as found in the data).
    pub label: String,
    pub time: SampleTime,
    pub png: Vec<u8>,
    /// Min and max of the rendered field.
    pub value_range: Option<(f32, f32)>,
}

/// All heatmap images of a request and their shared scale.
#[derive(Debug, Clone)]
pub struct HeatmapOutput {
    pub images: Vec<HeatmapImage>,
    pub range: NormalizationRange,
}

/// An encoded animation.
#[derive(Debug, Clone)]
pub struct AnimationArtifact {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub frame_count: usize,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub range: NormalizationRange,
}

/// Reject empty input, malformed points and oversized requests.
pub(crate) fn check_points(points: &[MeasurementPoint], limits: &LimitsConfig) -> FieldResult<()> {
    if points.is_empty() {
        return Err(FieldError::EmptyInput);
    }
    if points.len() > limits.max_points {
        return Err(FieldError::ResourceLimit {
            limit: "max_points",
            requested: points.len(),
            allowed: limits.max_points,
        });
    }
    points.iter().try_for_each(MeasurementPoint::validate)
}

/// Resolve the normalization once for the whole request.
pub(crate) fn resolve_range(
    range: Option<RangeSource>,
    points: &[MeasurementPoint],
) -> FieldResult<NormalizationRange> {
    range.unwrap_or(RangeSource::Computed).resolve(points)
}
