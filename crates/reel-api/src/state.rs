//! Application state.

use std::sync::Arc;

use reel_pipeline::{Pipeline, PipelineConfig};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    /// Create new application state.
    pub fn new(config: ApiConfig, pipeline_config: PipelineConfig) -> Self {
        Self {
            config,
            pipeline: Arc::new(Pipeline::new(pipeline_config)),
        }
    }
}
