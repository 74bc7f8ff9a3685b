//! Single-frame density heatmaps.

use boundary::Boundary;
use field_common::{
    group_by_time, FieldError, FieldResult, Grid, MeasurementPoint, SampleTime, TimeSlice,
};
use interpolation::{interpolate_slice, IdwParams, SpatialStrategy};
use renderer::{ClipGeometry, FrameRenderer, Palette};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::request::{check_points, resolve_range, HeatmapImage, HeatmapOutput, HeatmapRequest};

/// Render one heatmap per requested timestamp, all on the same scale.
pub fn generate_heatmap(
    points: &[MeasurementPoint],
    boundary: &Boundary,
    config: &PipelineConfig,
    request: &HeatmapRequest,
) -> FieldResult<HeatmapOutput> {
    let settings = &config.heatmap;
    request.validate()?;
    check_points(points, &config.limits)?;
    let range = resolve_range(request.range, points)?;
    let palette = Palette::by_name(request.colormap.as_deref().unwrap_or(&settings.colormap))?;

    let slices = group_by_time(points);
    let selected = select_slices(&slices, &request.timestamps);
    if selected.is_empty() {
        return Err(FieldError::EmptyInput);
    }

    let bounds = boundary.bounds();
    let grid = Grid::build(bounds, settings.resolution)?;
    let clip = match &settings.excluded_zone {
        Some(zone) => {
            let zones = boundary.zones(zone);
            ClipGeometry {
                bounds,
                data: zones.remainder,
                underlay: Some(zones.inside),
                outline: None,
            }
        }
        None => ClipGeometry::simple(bounds, boundary.shape().clone()),
    };
    let renderer = FrameRenderer::new(&clip, settings.frame_style(palette))?;

    let strategy = SpatialStrategy::InverseDistance(IdwParams {
        kernel: settings.kernel_for(request.bandwidth_km),
        sigma: settings.smoothing_sigma,
        range,
    });

    let start = Instant::now();
    let mut images = Vec::with_capacity(selected.len());
    for (label, slice) in selected {
        let field = interpolate_slice(slice, &grid, &strategy)?;
        let value_range = field.value_range();
        let frame = renderer.render(&field, &range)?;
        let png = frame.to_png()?;
        debug!(
            time = %slice.time,
            points = slice.len(),
            bytes = png.len(),
            "Rendered heatmap"
        );
        images.push(HeatmapImage {
            label,
            time: slice.time.clone(),
            png,
            value_range,
        });
    }

    info!(
        images = images.len(),
        resolution = settings.resolution,
        min = range.min(),
        max = range.max(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Generated heatmaps"
    );

    Ok(HeatmapOutput { images, range })
}

/// Pair each requested label with its slice, keeping request order.
///
/// Labels are compared by instant when both sides parse, so `2024-01-01`
/// finds the slice labelled `2024-01-01 00:00:00`. No labels selects every
/// slice in time order.
fn select_slices<'a>(slices: &'a [TimeSlice], requested: &[String]) -> Vec<(String, &'a TimeSlice)> {
    if requested.is_empty() {
        return slices
            .iter()
            .map(|slice| (slice.time.label().to_string(), slice))
            .collect();
    }

    let mut selected: Vec<(String, &TimeSlice)> = Vec::with_capacity(requested.len());
    for label in requested {
        if selected.iter().any(|(seen, _)| seen == label) {
            continue;
        }
        let wanted = SampleTime::parse(label.as_str());
        match slices.iter().find(|slice| slice.time == wanted) {
            Some(slice) => selected.push((label.clone(), slice)),
            None => warn!(timestamp = %label, "No measurements for requested timestamp"),
        }
    }
    selected
}
