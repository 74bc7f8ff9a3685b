//! Masked frame rendering.
//!
//! A frame is composed bottom-up on a transparent surface:
//!
//! 1. optional underlay zone filled with a flat colour
//! 2. the colourised field, drawn through the data clip mask
//! 3. optional outline stroke of the boundary
//!
//! Masks and paths depend only on the geometry and the output size, so a
//! [`FrameRenderer`] builds them once and renders any number of fields.

use field_common::{BoundingBox, FieldError, FieldResult, NormalizationRange, SampleTime, SpatialField};
use geo::MultiPolygon;
use serde::{Deserialize, Serialize};
use tiny_skia::{FillRule, LineJoin, Mask, Paint, Path, PixmapPaint, Stroke, Transform};
use tracing::debug;

use crate::clip::{build_mask, multipolygon_path, GeoTransform};
use crate::palette::{Color, Palette};
use crate::raster::{colorize_into, Raster};
use crate::surface::with_surface;

/// Boundary stroke drawn above the data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlineStyle {
    pub color: Color,
    pub width: f32,
}

/// Presentation settings shared by every frame of a request.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameStyle {
    pub palette: Palette,
    /// Output width in pixels; height follows the bounding-box aspect ratio.
    pub width: u32,
    pub underlay_color: Color,
    pub outline: Option<OutlineStyle>,
}

impl FrameStyle {
    pub fn new(palette: Palette, width: u32) -> Self {
        Self {
            palette,
            width,
            underlay_color: Color::hex(0x006400),
            outline: None,
        }
    }

    /// Pixel size for a bounding box, at least 1×1.
    pub fn frame_size(&self, bbox: &BoundingBox) -> (u32, u32) {
        let width = self.width.max(1);
        let height = (width as f64 / bbox.aspect_ratio()).round().max(1.0) as u32;
        (width, height)
    }
}

/// Geometry controlling where each layer is visible.
#[derive(Debug, Clone)]
pub struct ClipGeometry {
    /// Image extent; the field is assumed to span it exactly.
    pub bounds: BoundingBox,
    /// Data is only visible inside this shape.
    pub data: MultiPolygon<f64>,
    /// Flat-filled zone under the data layer.
    pub underlay: Option<MultiPolygon<f64>>,
    /// Shape whose rings are stroked when an outline style is set.
    pub outline: Option<MultiPolygon<f64>>,
}

impl ClipGeometry {
    /// Data clipped to `shape`, nothing else.
    pub fn simple(bounds: BoundingBox, shape: MultiPolygon<f64>) -> Self {
        Self {
            bounds,
            data: shape,
            underlay: None,
            outline: None,
        }
    }
}

/// One rendered image, tagged with the time it depicts.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFrame {
    pub time: SampleTime,
    pub raster: Raster,
}

impl RenderedFrame {
    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    pub fn to_png(&self) -> FieldResult<Vec<u8>> {
        self.raster.to_png()
    }
}

/// Renders fields against fixed geometry and style.
pub struct FrameRenderer {
    style: FrameStyle,
    width: u32,
    height: u32,
    data_mask: Mask,
    underlay: Option<Path>,
    outline: Option<Path>,
}

impl FrameRenderer {
    pub fn new(clip: &ClipGeometry, style: FrameStyle) -> FieldResult<Self> {
        if !clip.bounds.is_valid() {
            return Err(FieldError::invalid(
                "bounds",
                format!("degenerate frame extent {:?}", clip.bounds.to_tuple()),
            ));
        }
        let (width, height) = style.frame_size(&clip.bounds);
        let transform = GeoTransform::new(clip.bounds, width, height);

        let data_mask = build_mask(&clip.data, &transform)?;
        let underlay = clip
            .underlay
            .as_ref()
            .and_then(|shape| multipolygon_path(shape, &transform));
        let outline = match style.outline {
            Some(_) => clip
                .outline
                .as_ref()
                .and_then(|shape| multipolygon_path(shape, &transform)),
            None => None,
        };

        debug!(
            width,
            height,
            palette = style.palette.name(),
            underlay = underlay.is_some(),
            outline = outline.is_some(),
            "Prepared frame renderer"
        );

        Ok(Self {
            style,
            width,
            height,
            data_mask,
            underlay,
            outline,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn style(&self) -> &FrameStyle {
        &self.style
    }

    /// Render one field. Pixels outside every zone stay fully transparent.
    pub fn render(
        &self,
        field: &SpatialField,
        range: &NormalizationRange,
    ) -> FieldResult<RenderedFrame> {
        let raster = with_surface(self.width, self.height, |canvas| {
            if let Some(path) = &self.underlay {
                let paint = solid_paint(self.style.underlay_color);
                canvas.fill_path(path, &paint, FillRule::EvenOdd, Transform::identity(), None);
            }

            with_surface(self.width, self.height, |layer| {
                colorize_into(layer, field, range, &self.style.palette);
                canvas.draw_pixmap(
                    0,
                    0,
                    layer.as_ref(),
                    &PixmapPaint::default(),
                    Transform::identity(),
                    Some(&self.data_mask),
                );
                Ok(())
            })?;

            if let (Some(path), Some(outline)) = (&self.outline, self.style.outline) {
                let paint = solid_paint(outline.color);
                let stroke = Stroke {
                    width: outline.width,
                    line_join: LineJoin::Round,
                    ..Stroke::default()
                };
                canvas.stroke_path(path, &paint, &stroke, Transform::identity(), None);
            }

            Ok(Raster::from_pixmap(canvas))
        })?;

        Ok(RenderedFrame {
            time: field.time.clone(),
            raster,
        })
    }
}

fn solid_paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

/// Render a single field without keeping a renderer around.
pub fn render_frame(
    field: &SpatialField,
    range: &NormalizationRange,
    clip: &ClipGeometry,
    style: FrameStyle,
) -> FieldResult<RenderedFrame> {
    FrameRenderer::new(clip, style)?.render(field, range)
}
