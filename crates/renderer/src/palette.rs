//! Named colour palettes and value-to-colour mapping.

use field_common::{FieldError, FieldResult, NormalizationRange};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Color value in straight (non-premultiplied) RGBA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque colour from a `0xRRGGBB` literal.
    pub const fn hex(rgb: u32) -> Self {
        Self::new((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8, 255)
    }

    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            6 => Some(Self::new(channel(0)?, channel(2)?, channel(4)?, 255)),
            8 => Some(Self::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value).ok_or_else(|| format!("invalid colour '{}'", value))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Linear blend of two colours, `t` clamped to `[0, 1]`.
pub fn interpolate_color(from: Color, to: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
    Color::new(
        lerp(from.r, to.r),
        lerp(from.g, to.g),
        lerp(from.b, to.b),
        lerp(from.a, to.a),
    )
}

const VIRIDIS: &[Color] = &[
    Color::hex(0x440154),
    Color::hex(0x472c7a),
    Color::hex(0x3b518b),
    Color::hex(0x2c718e),
    Color::hex(0x21908d),
    Color::hex(0x27ad81),
    Color::hex(0x5cc863),
    Color::hex(0xaadc32),
    Color::hex(0xfde725),
];

const TURBO: &[Color] = &[
    Color::hex(0x30123b),
    Color::hex(0x4145ab),
    Color::hex(0x4675ed),
    Color::hex(0x39a2fc),
    Color::hex(0x1bcfd4),
    Color::hex(0x24eca6),
    Color::hex(0x61fc6c),
    Color::hex(0xa4fc3b),
    Color::hex(0xd1e834),
    Color::hex(0xf3c63a),
    Color::hex(0xfe9b2d),
    Color::hex(0xf36315),
    Color::hex(0xd93806),
    Color::hex(0xb11901),
    Color::hex(0x7a0403),
];

const PLASMA: &[Color] = &[
    Color::hex(0x0d0887),
    Color::hex(0x46039f),
    Color::hex(0x7201a8),
    Color::hex(0x9c179e),
    Color::hex(0xbd3786),
    Color::hex(0xd8576b),
    Color::hex(0xed7953),
    Color::hex(0xfb9f3a),
    Color::hex(0xfdca26),
    Color::hex(0xf0f921),
];

const INFERNO: &[Color] = &[
    Color::hex(0x000004),
    Color::hex(0x1b0c41),
    Color::hex(0x4a0c6b),
    Color::hex(0x781c6d),
    Color::hex(0xa52c60),
    Color::hex(0xcf4446),
    Color::hex(0xed6925),
    Color::hex(0xfb9b06),
    Color::hex(0xf7d13d),
    Color::hex(0xfcffa4),
];

const COOLWARM: &[Color] = &[
    Color::hex(0x3b4cc0),
    Color::hex(0x6788ee),
    Color::hex(0x9abbff),
    Color::hex(0xc9d7f0),
    Color::hex(0xedd1c2),
    Color::hex(0xf7a889),
    Color::hex(0xe26952),
    Color::hex(0xb40426),
];

const GREYS: &[Color] = &[Color::hex(0xffffff), Color::hex(0x000000)];

const PALETTES: &[(&str, &[Color])] = &[
    ("viridis", VIRIDIS),
    ("turbo", TURBO),
    ("plasma", PLASMA),
    ("inferno", INFERNO),
    ("coolwarm", COOLWARM),
    ("greys", GREYS),
];

/// A continuous colour ramp built from evenly spaced stops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    name: &'static str,
    stops: &'static [Color],
}

impl Palette {
    /// Look up a palette by case-insensitive name.
    pub fn by_name(name: &str) -> FieldResult<Self> {
        let wanted = name.trim().to_ascii_lowercase();
        PALETTES
            .iter()
            .find(|(n, _)| *n == wanted)
            .map(|&(name, stops)| Palette { name, stops })
            .ok_or_else(|| {
                FieldError::invalid(
                    "colormap",
                    format!("unknown colormap '{}', expected one of {:?}", name, Self::names()),
                )
            })
    }

    pub fn names() -> Vec<&'static str> {
        PALETTES.iter().map(|(n, _)| *n).collect()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Colour at position `t` along the ramp. `t` is clamped; `NaN` is
    /// transparent.
    pub fn color_at(&self, t: f64) -> Color {
        if t.is_nan() {
            return Color::transparent();
        }
        let t = t.clamp(0.0, 1.0);
        let segments = self.stops.len() - 1;
        let scaled = t * segments as f64;
        let i = (scaled.floor() as usize).min(segments - 1);
        interpolate_color(self.stops[i], self.stops[i + 1], (scaled - i as f64) as f32)
    }

    /// Colour for `value` under the shared normalization.
    pub fn color_for(&self, value: f64, range: &NormalizationRange) -> Color {
        self.color_at(range.normalize(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(Palette::by_name("Viridis").unwrap().name(), "viridis");
        assert!(Palette::by_name("jet").is_err());
    }

    #[test]
    fn test_endpoints_are_first_and_last_stop() {
        let turbo = Palette::by_name("turbo").unwrap();
        assert_eq!(turbo.color_at(0.0), Color::hex(0x30123b));
        assert_eq!(turbo.color_at(1.0), Color::hex(0x7a0403));
    }

    #[test]
    fn test_out_of_range_values_clamp() {
        let viridis = Palette::by_name("viridis").unwrap();
        let range = NormalizationRange::new(0.0, 10.0).unwrap();
        assert_eq!(viridis.color_for(25.0, &range), viridis.color_for(10.0, &range));
        assert_eq!(viridis.color_for(-3.0, &range), viridis.color_for(0.0, &range));
    }

    #[test]
    fn test_nan_is_transparent() {
        let greys = Palette::by_name("greys").unwrap();
        assert_eq!(greys.color_at(f64::NAN).a, 0);
    }

    #[test]
    fn test_hex_round_trip() {
        let c = Color::from_hex("#006400").unwrap();
        assert_eq!(c, Color::new(0, 100, 0, 255));
        assert_eq!(c.to_string(), "#006400");
        assert_eq!(Color::from_hex("#00640080").unwrap().a, 0x80);
        assert!(Color::from_hex("#0064").is_none());
    }

    #[test]
    fn test_color_serializes_as_hex_string() {
        let json = serde_json::to_string(&Color::new(255, 0, 0, 128)).unwrap();
        assert_eq!(json, "\"#ff000080\"");
        let parsed: Color = serde_json::from_str("\"#1f77b4\"").unwrap();
        assert_eq!(parsed, Color::hex(0x1f77b4));
        assert!(serde_json::from_str::<Color>("\"blue\"").is_err());
    }
}
