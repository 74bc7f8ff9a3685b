//! Standalone legend images.

use field_common::{FieldResult, NormalizationRange};
use renderer::{render_legend, Palette};
use tracing::debug;

use crate::config::PipelineConfig;
use crate::request::LegendRequest;

/// Encode the colour bar for `request` as PNG.
pub fn generate_legend(request: &LegendRequest, config: &PipelineConfig) -> FieldResult<Vec<u8>> {
    let range = NormalizationRange::new(request.min, request.max)?;
    let palette = Palette::by_name(
        request
            .colormap
            .as_deref()
            .unwrap_or(&config.legend.colormap),
    )?;

    let png = render_legend(&range, &palette, &config.legend.style)?.to_png()?;
    debug!(
        min = range.min(),
        max = range.max(),
        colormap = palette.name(),
        bytes = png.len(),
        "Rendered legend"
    );
    Ok(png)
}
