//! Application state for the field API.

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusHandle;
use pipeline::{FieldPipeline, PipelineConfig};
use std::path::Path;
use tracing::info;

/// Default request body limit; measurement uploads can be large.
pub const DEFAULT_BODY_LIMIT: usize = 32 * 1024 * 1024;

/// Shared application state.
pub struct AppState {
    pub pipeline: FieldPipeline,

    /// Renders `/metrics`; absent when no recorder is installed.
    pub prometheus: Option<PrometheusHandle>,

    /// Maximum accepted request body in bytes.
    pub body_limit: usize,
}

impl AppState {
    /// Build state from a validated configuration, loading the boundary
    /// eagerly so a bad path fails at startup.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let pipeline = FieldPipeline::new(config).context("Invalid pipeline configuration")?;
        pipeline.warm_up().with_context(|| {
            format!(
                "Failed to load boundary from {}",
                pipeline.config().boundary_path.display()
            )
        })?;
        info!(
            boundary = %pipeline.config().boundary_path.display(),
            "Boundary loaded"
        );
        Ok(Self::with_pipeline(pipeline))
    }

    pub fn with_pipeline(pipeline: FieldPipeline) -> Self {
        Self {
            pipeline,
            prometheus: None,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

/// Read the YAML config, or fall back to defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    PipelineConfig::from_yaml(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_config_defaults_without_file() {
        let config = load_config(None).unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_load_config_from_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "heatmap:\n  resolution: 120").unwrap();
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.heatmap.resolution, 120);
    }

    #[test]
    fn test_missing_boundary_fails_startup() {
        let config = PipelineConfig {
            boundary_path: "/nonexistent/boundary.geojson".into(),
            ..PipelineConfig::default()
        };
        let err = AppState::new(config).err().unwrap();
        assert!(err.to_string().contains("Failed to load boundary"));
    }
}
