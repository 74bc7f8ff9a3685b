//! Animated sequences across time slices.

use boundary::Boundary;
use field_common::{
    group_by_time, FieldError, FieldResult, Grid, MeasurementPoint, NormalizationRange,
};
use interpolation::{build_sequence, TemporalInterpolator};
use renderer::{ClipGeometry, FrameRenderer, Palette};
use std::time::Instant;
use tracing::info;

use crate::config::PipelineConfig;
use crate::request::{check_points, resolve_range, AnimationArtifact, AnimationRequest};
use crate::sink::{FrameSink, GifSink};
use crate::stream::stream_frames;

/// Build a looping GIF of the measurements interpolated through time.
pub fn generate_animation(
    points: &[MeasurementPoint],
    boundary: &Boundary,
    config: &PipelineConfig,
    request: &AnimationRequest,
) -> FieldResult<AnimationArtifact> {
    let settings = &config.animation;
    let palette = Palette::by_name(request.colormap.as_deref().unwrap_or(&settings.colormap))?;
    let (renderer, interpolator, range) = prepare(points, boundary, config, request, palette)?;

    let (width, height) = renderer.size();
    let mut sink = GifSink::new(width, height, request.fps)?;
    let mime_type = sink.mime_type();

    let start = Instant::now();
    let written = stream_frames(
        &interpolator,
        &renderer,
        &range,
        &mut sink,
        settings.channel_depth,
    )?;
    if written < 2 {
        return Err(FieldError::encoding(format!(
            "only {} frames were produced, at least 2 are required",
            written
        )));
    }
    let bytes = sink.finish()?;

    info!(
        frames = written,
        width,
        height,
        fps = request.fps,
        bytes = bytes.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Encoded animation"
    );

    Ok(AnimationArtifact {
        bytes,
        mime_type,
        frame_count: written,
        width,
        height,
        fps: request.fps,
        range,
    })
}

/// Everything up to the first rendered frame: validation, per-slice RBF
/// fields, the frame budget and the renderer.
fn prepare(
    points: &[MeasurementPoint],
    boundary: &Boundary,
    config: &PipelineConfig,
    request: &AnimationRequest,
    palette: Palette,
) -> FieldResult<(FrameRenderer, TemporalInterpolator, NormalizationRange)> {
    let settings = &config.animation;
    request.validate(&config.limits)?;
    check_points(points, &config.limits)?;
    let range = resolve_range(request.range, points)?;

    let slices = group_by_time(points);
    if slices.len() < 2 {
        return Err(FieldError::InsufficientFrames {
            found: slices.len(),
        });
    }

    let grid = Grid::build(boundary.bounds(), settings.resolution)?;
    let fields = build_sequence(&slices, &grid, config.limits.max_rbf_points)?;
    info!(
        slices = slices.len(),
        usable = fields.len(),
        resolution = settings.resolution,
        min = range.min(),
        max = range.max(),
        "Built field sequence"
    );
    if fields.len() < 2 {
        return Err(FieldError::InsufficientFrames {
            found: fields.len(),
        });
    }

    let total_frames = (fields.len() - 1) * request.frames_per_transition;
    let cells = total_frames.saturating_mul(grid.len());
    if cells > config.limits.max_frame_cells {
        return Err(FieldError::ResourceLimit {
            limit: "max_frame_cells",
            requested: cells,
            allowed: config.limits.max_frame_cells,
        });
    }
    if total_frames < 2 {
        return Err(FieldError::encoding(format!(
            "{} frame(s) requested, an animation needs at least 2",
            total_frames
        )));
    }

    let interpolator = TemporalInterpolator::new(fields, request.frames_per_transition)?;

    let mut clip = ClipGeometry::simple(boundary.bounds(), boundary.shape().clone());
    if settings.outline.is_some() {
        clip.outline = Some(boundary.shape().clone());
    }
    let renderer = FrameRenderer::new(&clip, settings.frame_style(palette))?;

    Ok((renderer, interpolator, range))
}
