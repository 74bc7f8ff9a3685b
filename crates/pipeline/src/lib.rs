//! Heatmap, animation and legend generation.
//!
//! Ties the boundary, interpolation and rendering crates together:
//!
//! - [`generate_heatmap`]: per-timestamp IDW density images on one shared
//!   scale, with an optional excluded zone drawn as a flat underlay.
//! - [`generate_animation`]: RBF fields per time slice, cubic-spline frames
//!   between them, rendered and encoded through a bounded channel.
//! - [`generate_legend`]: the matching colour bar.
//!
//! [`FieldPipeline`] bundles the configuration with a lazily loaded
//! boundary for long-lived callers such as the HTTP service.

pub mod animation;
pub mod config;
pub mod heatmap;
pub mod legend;
pub mod request;
pub mod sink;
pub mod stream;

pub use animation::generate_animation;
pub use config::{
    AnimationSettings, HeatmapSettings, KernelMode, LegendSettings, LimitsConfig, PipelineConfig,
};
pub use heatmap::generate_heatmap;
pub use legend::generate_legend;
pub use request::{
    AnimationArtifact, AnimationRequest, HeatmapImage, HeatmapOutput, HeatmapRequest,
    LegendRequest,
};
pub use sink::{FrameSink, GifSink};
pub use stream::stream_frames;

use boundary::{Boundary, BoundaryProvider};
use field_common::{FieldResult, MeasurementPoint};

/// Configuration plus the shared boundary.
#[derive(Debug)]
pub struct FieldPipeline {
    config: PipelineConfig,
    boundary: BoundaryProvider,
}

impl FieldPipeline {
    /// Validate `config`; the boundary file is read on first use.
    pub fn new(config: PipelineConfig) -> FieldResult<Self> {
        config.validate()?;
        let boundary = BoundaryProvider::new(config.boundary_path.clone());
        Ok(Self { config, boundary })
    }

    /// Use an already loaded boundary instead of `config.boundary_path`.
    pub fn with_boundary(config: PipelineConfig, boundary: Boundary) -> FieldResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            boundary: BoundaryProvider::preloaded(boundary),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load the boundary now so a bad path fails at startup.
    pub fn warm_up(&self) -> FieldResult<()> {
        self.boundary.get().map(|_| ())
    }

    pub fn heatmap(
        &self,
        points: &[MeasurementPoint],
        request: &HeatmapRequest,
    ) -> FieldResult<HeatmapOutput> {
        let boundary = self.boundary.get()?;
        generate_heatmap(points, &boundary, &self.config, request)
    }

    pub fn animate(
        &self,
        points: &[MeasurementPoint],
        request: &AnimationRequest,
    ) -> FieldResult<AnimationArtifact> {
        let boundary = self.boundary.get()?;
        generate_animation(points, &boundary, &self.config, request)
    }

    pub fn legend(&self, request: &LegendRequest) -> FieldResult<Vec<u8>> {
        generate_legend(request, &self.config)
    }
}
