//! Vertical colour-bar legends.
//!
//! Labels use a small stroked seven-segment font, so no font files are
//! needed at runtime.

use field_common::{FieldError, FieldResult, NormalizationRange};
use serde::{Deserialize, Serialize};
use tiny_skia::{LineCap, LineJoin, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

use crate::palette::{Color, Palette};
use crate::raster::Raster;
use crate::surface::with_surface;

/// Legend layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendStyle {
    pub width: u32,
    pub height: u32,
    pub bar_width: f32,
    pub margin: f32,
    pub ticks: usize,
    pub font_size: f32,
    pub text_color: Color,
}

impl Default for LegendStyle {
    fn default() -> Self {
        Self {
            width: 110,
            height: 360,
            bar_width: 24.0,
            margin: 14.0,
            ticks: 7,
            font_size: 11.0,
            text_color: Color::hex(0x202020),
        }
    }
}

/// Tick labels as printed on the legend.
pub fn tick_labels(range: &NormalizationRange, ticks: usize) -> Vec<String> {
    range.ticks(ticks).iter().map(|v| format!("{:.2}", v)).collect()
}

/// Draw the legend for `range` on a transparent background.
///
/// The bar runs from the range minimum at the bottom to the maximum at the
/// top, with `style.ticks` evenly spaced labelled ticks.
pub fn render_legend(
    range: &NormalizationRange,
    palette: &Palette,
    style: &LegendStyle,
) -> FieldResult<Raster> {
    let top = style.margin;
    let bottom = style.height as f32 - style.margin;
    if bottom - top < 2.0 || style.bar_width <= 0.0 || style.width as f32 <= style.bar_width {
        return Err(FieldError::invalid(
            "legend",
            format!(
                "{}x{} is too small for a {} px bar with {} px margins",
                style.width, style.height, style.bar_width, style.margin
            ),
        ));
    }

    with_surface(style.width, style.height, |pixmap| {
        let left = style.margin;
        let bar_height = bottom - top;

        // One-pixel bands from top (max) to bottom (min)
        let rows = bar_height.ceil() as usize;
        for i in 0..rows {
            let t = 1.0 - (i as f64 + 0.5) / rows as f64;
            let color = palette.color_at(t);
            let mut paint = Paint::default();
            paint.set_color_rgba8(color.r, color.g, color.b, color.a);
            if let Some(rect) = Rect::from_xywh(left, top + i as f32, style.bar_width, 1.0) {
                pixmap.fill_rect(rect, &paint, Transform::identity(), None);
            }
        }

        let mut text_paint = Paint::default();
        let c = style.text_color;
        text_paint.set_color_rgba8(c.r, c.g, c.b, c.a);
        text_paint.anti_alias = true;

        // Frame around the bar
        let mut pb = PathBuilder::new();
        pb.push_rect(Rect::from_xywh(left, top, style.bar_width, bar_height).ok_or_else(
            || FieldError::Render("legend bar has no area".to_string()),
        )?);
        if let Some(path) = pb.finish() {
            let stroke = Stroke {
                width: 1.0,
                ..Stroke::default()
            };
            pixmap.stroke_path(&path, &text_paint, &stroke, Transform::identity(), None);
        }

        let ticks = range.ticks(style.ticks);
        let labels = tick_labels(range, style.ticks);
        let tick_x = left + style.bar_width;
        for (value, label) in ticks.iter().zip(&labels) {
            let y = bottom - range.normalize(*value) as f32 * bar_height;

            let mut pb = PathBuilder::new();
            pb.move_to(tick_x, y);
            pb.line_to(tick_x + 4.0, y);
            if let Some(path) = pb.finish() {
                let stroke = Stroke {
                    width: 1.0,
                    ..Stroke::default()
                };
                pixmap.stroke_path(&path, &text_paint, &stroke, Transform::identity(), None);
            }

            draw_text(pixmap, tick_x + 7.0, y, label, style.font_size, &text_paint);
        }

        Ok(Raster::from_pixmap(pixmap))
    })
}

/// Left-aligned text centred vertically on `y`.
fn draw_text(pixmap: &mut Pixmap, x: f32, y: f32, text: &str, font_size: f32, paint: &Paint) {
    let char_width = font_size * 0.55;
    let spacing = font_size * 0.2;
    for (i, ch) in text.chars().enumerate() {
        let cx = x + i as f32 * (char_width + spacing) + char_width / 2.0;
        draw_glyph(pixmap, cx, y, ch, char_width, font_size, paint);
    }
}

/// Seven-segment glyph centred on `(x, y)`.
fn draw_glyph(
    pixmap: &mut Pixmap,
    x: f32,
    y: f32,
    ch: char,
    width: f32,
    height: f32,
    paint: &Paint,
) {
    let w = width / 2.0;
    let h = height / 2.0;

    // Segment endpoints
    let top = ((-w, -h), (w, -h));
    let upper_right = ((w, -h), (w, 0.0));
    let lower_right = ((w, 0.0), (w, h));
    let bottom = ((-w, h), (w, h));
    let lower_left = ((-w, 0.0), (-w, h));
    let upper_left = ((-w, -h), (-w, 0.0));
    let middle = ((-w, 0.0), (w, 0.0));

    let segments: Vec<((f32, f32), (f32, f32))> = match ch {
        '0' => vec![top, upper_right, lower_right, bottom, lower_left, upper_left],
        '1' => vec![upper_right, lower_right],
        '2' => vec![top, upper_right, middle, lower_left, bottom],
        '3' => vec![top, upper_right, middle, lower_right, bottom],
        '4' => vec![upper_left, middle, upper_right, lower_right],
        '5' => vec![top, upper_left, middle, lower_right, bottom],
        '6' => vec![top, upper_left, middle, lower_right, bottom, lower_left],
        '7' => vec![top, upper_right, lower_right],
        '8' => vec![top, upper_right, lower_right, bottom, lower_left, upper_left, middle],
        '9' => vec![top, upper_right, lower_right, bottom, upper_left, middle],
        '-' => vec![middle],
        '.' => vec![((0.0, h * 0.8), (0.0, h))],
        'e' | 'E' => vec![top, upper_left, middle, lower_left, bottom],
        '+' => vec![middle, ((0.0, -h * 0.5), (0.0, h * 0.5))],
        _ => Vec::new(),
    };

    let stroke = Stroke {
        width: (width * 0.18).max(1.0),
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };

    for ((x1, y1), (x2, y2)) in segments {
        let mut pb = PathBuilder::new();
        pb.move_to(x + x1, y + y1);
        pb.line_to(x + x2, y + y2);
        if let Some(path) = pb.finish() {
            pixmap.stroke_path(&path, paint, &stroke, Transform::identity(), None);
        }
    }
}
