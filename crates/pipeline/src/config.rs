//! Configuration for heatmap, animation and legend generation.

use field_common::{BoundingBox, FieldError, FieldResult};
use interpolation::{IdwKernel, DEFAULT_MAX_RBF_POINTS};
use renderer::{Color, FrameStyle, LegendStyle, OutlineStyle, Palette};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// GeoJSON file with the boundary polygon.
    pub boundary_path: PathBuf,
    pub heatmap: HeatmapSettings,
    pub animation: AnimationSettings,
    pub legend: LegendSettings,
    pub limits: LimitsConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            boundary_path: PathBuf::from("data/boundary.geojson"),
            heatmap: HeatmapSettings::default(),
            animation: AnimationSettings::default(),
            legend: LegendSettings::default(),
            limits: LimitsConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse from YAML. Missing keys take their defaults.
    pub fn from_yaml(content: &str) -> FieldResult<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| FieldError::invalid("config", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> FieldResult<()> {
        for (name, resolution) in [
            ("heatmap.resolution", self.heatmap.resolution),
            ("animation.resolution", self.animation.resolution),
        ] {
            if resolution < 2 {
                return Err(FieldError::invalid(name, "must be at least 2"));
            }
        }

        for (name, width) in [
            ("heatmap.frame_width", self.heatmap.frame_width),
            ("animation.frame_width", self.animation.frame_width),
        ] {
            if width == 0 || width > self.limits.max_frame_width {
                return Err(FieldError::invalid(
                    name,
                    format!("must be within 1..={}", self.limits.max_frame_width),
                ));
            }
        }

        let sigma = self.heatmap.smoothing_sigma;
        if sigma.is_nan() || sigma < 0.0 {
            return Err(FieldError::invalid(
                "heatmap.smoothing_sigma",
                "must be a non-negative number",
            ));
        }
        let power = self.heatmap.power;
        if power.is_nan() || power <= 0.0 {
            return Err(FieldError::invalid("heatmap.power", "must be positive"));
        }
        if let Some(zone) = &self.heatmap.excluded_zone {
            if !zone.is_valid() {
                return Err(FieldError::invalid(
                    "heatmap.excluded_zone",
                    format!("degenerate rectangle {:?}", zone.to_tuple()),
                ));
            }
        }
        if self.animation.channel_depth == 0 {
            return Err(FieldError::invalid("animation.channel_depth", "must be > 0"));
        }

        Palette::by_name(&self.heatmap.colormap)?;
        Palette::by_name(&self.animation.colormap)?;
        Palette::by_name(&self.legend.colormap)?;

        if self.limits.max_frame_cells == 0 {
            return Err(FieldError::invalid("limits.max_frame_cells", "must be > 0"));
        }
        if self.limits.max_rbf_points == 0 {
            return Err(FieldError::invalid("limits.max_rbf_points", "must be > 0"));
        }
        if self.limits.max_fps == 0 || self.limits.max_frames_per_transition == 0 {
            return Err(FieldError::invalid(
                "limits",
                "max_fps and max_frames_per_transition must be > 0",
            ));
        }

        Ok(())
    }
}

/// How the heatmap weights samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelMode {
    /// `1 / d^power`; a request bandwidth is accepted but not used.
    #[default]
    InversePower,
    /// Gaussian with the request bandwidth (or the configured default).
    Gaussian,
}

/// Single-frame density heatmap settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapSettings {
    pub resolution: usize,
    pub frame_width: u32,
    pub colormap: String,
    pub kernel: KernelMode,
    pub power: f64,
    pub default_bandwidth_km: f64,
    /// Post-smoothing standard deviation in grid cells.
    pub smoothing_sigma: f64,
    /// Rectangle rendered as a flat zone instead of data.
    pub excluded_zone: Option<BoundingBox>,
    pub zone_color: Color,
}

impl Default for HeatmapSettings {
    fn default() -> Self {
        Self {
            resolution: 400,
            frame_width: 900,
            colormap: "turbo".to_string(),
            kernel: KernelMode::InversePower,
            power: 2.0,
            default_bandwidth_km: 0.05,
            smoothing_sigma: 4.5,
            excluded_zone: Some(BoundingBox::new(85.389862, 19.858694, 85.624695, 19.942627)),
            zone_color: Color::hex(0x006400),
        }
    }
}

impl HeatmapSettings {
    /// The weighting kernel for a request.
    pub fn kernel_for(&self, bandwidth_km: Option<f64>) -> IdwKernel {
        match self.kernel {
            KernelMode::InversePower => IdwKernel::InversePower { power: self.power },
            KernelMode::Gaussian => {
                IdwKernel::gaussian(bandwidth_km.unwrap_or(self.default_bandwidth_km))
            }
        }
    }

    pub fn frame_style(&self, palette: Palette) -> FrameStyle {
        FrameStyle {
            underlay_color: self.zone_color,
            ..FrameStyle::new(palette, self.frame_width)
        }
    }
}

/// Animated sequence settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    pub resolution: usize,
    pub frame_width: u32,
    pub colormap: String,
    /// Rendered frames allowed to queue ahead of the encoder.
    pub channel_depth: usize,
    pub outline: Option<OutlineStyle>,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            resolution: 300,
            frame_width: 800,
            colormap: "viridis".to_string(),
            channel_depth: 4,
            outline: None,
        }
    }
}

impl AnimationSettings {
    pub fn frame_style(&self, palette: Palette) -> FrameStyle {
        FrameStyle {
            outline: self.outline,
            ..FrameStyle::new(palette, self.frame_width)
        }
    }
}

/// Legend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendSettings {
    pub colormap: String,
    pub style: LegendStyle,
}

impl Default for LegendSettings {
    fn default() -> Self {
        Self {
            colormap: "turbo".to_string(),
            style: LegendStyle::default(),
        }
    }
}

/// Request size limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Upper bound on `total_frames × resolution²` for one animation.
    pub max_frame_cells: usize,
    pub max_frames_per_transition: usize,
    pub max_fps: u32,
    pub max_frame_width: u32,
    pub max_points: usize,
    /// Largest time slice fitted with the dense RBF solve on the animation path.
    pub max_rbf_points: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_frame_cells: 200_000_000,
            max_frames_per_transition: 240,
            max_fps: 60,
            max_frame_width: 4096,
            max_points: 500_000,
            max_rbf_points: DEFAULT_MAX_RBF_POINTS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        PipelineConfig::default().validate().unwrap();
    }

    #[test]
    fn test_yaml_overrides_and_defaults() {
        let yaml = r##"
boundary_path: /srv/lagoon.geojson
heatmap:
  resolution: 200
  kernel: gaussian
  zone_color: "#ff000080"
animation:
  channel_depth: 2
"##;
        let config = PipelineConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.boundary_path, PathBuf::from("/srv/lagoon.geojson"));
        assert_eq!(config.heatmap.resolution, 200);
        assert_eq!(config.heatmap.frame_width, 900);
        assert_eq!(config.heatmap.zone_color, Color::new(255, 0, 0, 128));
        assert_eq!(config.animation.channel_depth, 2);
        assert_eq!(config.animation.resolution, 300);
        assert_eq!(
            config.heatmap.kernel_for(Some(2.0)),
            IdwKernel::Gaussian { bandwidth_km: 2.0 }
        );
    }

    #[test]
    fn test_rejects_unknown_colormap() {
        let yaml = "animation:\n  colormap: rainbow\n";
        assert!(PipelineConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_rejects_zero_channel_depth() {
        let mut config = PipelineConfig::default();
        config.animation.channel_depth = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rbf_point_cap_from_yaml() {
        let config = PipelineConfig::from_yaml("limits:\n  max_rbf_points: 800\n").unwrap();
        assert_eq!(config.limits.max_rbf_points, 800);
        assert_eq!(
            PipelineConfig::default().limits.max_rbf_points,
            DEFAULT_MAX_RBF_POINTS
        );
        assert!(PipelineConfig::from_yaml("limits:\n  max_rbf_points: 0\n").is_err());
    }

    #[test]
    fn test_default_kernel_ignores_bandwidth() {
        let settings = HeatmapSettings::default();
        assert_eq!(
            settings.kernel_for(Some(0.05)),
            IdwKernel::InversePower { power: 2.0 }
        );
    }
}
