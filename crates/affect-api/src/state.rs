//! Application state.

use std::sync::Arc;

use affect_media::{default_video_decoder, AffectPipeline, MediaResult, OnnxModelLoader};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::{info, warn};

use crate::config::ApiConfig;
use crate::metrics;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub pipeline: Arc<AffectPipeline>,
}

impl AppState {
    /// Create application state with the ONNX model and the build's clip decoder.
    ///
    /// With `preload_model` set, a missing or malformed model fails here.
    pub async fn new(config: ApiConfig) -> MediaResult<Self> {
        let loader = OnnxModelLoader::new(&config.model_path, config.inference_threads);
        let pipeline = AffectPipeline::new(default_video_decoder(), Arc::new(loader));
        let state = Self::with_pipeline(config, pipeline);

        if state.config.preload_model {
            info!("Preloading model");
            state.pipeline.gateway().ensure_ready().await?;
        }

        Ok(state)
    }

    /// Create state around an existing pipeline.
    pub fn with_pipeline(config: ApiConfig, pipeline: AffectPipeline) -> Self {
        Self {
            config,
            pipeline: Arc::new(pipeline),
        }
    }
}

/// Install the metrics recorder (when enabled), then build the state.
///
/// The recorder goes first so that a model preload is counted.
pub async fn bootstrap(config: ApiConfig) -> (Option<PrometheusHandle>, MediaResult<AppState>) {
    let metrics_handle = if config.metrics_enabled {
        match metrics::init_metrics() {
            Ok(handle) => {
                info!("Prometheus metrics enabled at /metrics");
                Some(handle)
            }
            Err(e) => {
                warn!("Failed to install metrics recorder: {}", e);
                None
            }
        }
    } else {
        None
    };

    (metrics_handle, AppState::new(config).await)
}
