//! Response bodies of the prediction endpoints.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::prediction::AffectPrediction;

/// Which input path produced a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ModelType {
    /// Sampled frames from an uploaded clip.
    #[serde(rename = "original")]
    Original,
    /// A single still replicated across the temporal axis. No real
    /// temporal signal reaches the model on this path.
    #[serde(rename = "real-time")]
    RealTime,
}

impl ModelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::Original => "original",
            ModelType::RealTime => "real-time",
        }
    }
}

/// Static metadata describing the deployed model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModelInfo {
    pub total_params: u64,
    pub model_size_mb: f64,
    pub architecture: String,
}

impl Default for ModelInfo {
    fn default() -> Self {
        Self {
            total_params: 51_608_529,
            model_size_mb: 196.87,
            architecture: "CNN + LSTM + Dense layers".to_string(),
        }
    }
}

/// Response of `POST /predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoPredictionResponse {
    #[serde(flatten)]
    pub prediction: AffectPrediction,
    pub frames_processed: usize,
    pub model_type: ModelType,
    pub model_info: ModelInfo,
}

impl VideoPredictionResponse {
    pub fn new(prediction: AffectPrediction, frames_processed: usize) -> Self {
        Self {
            prediction,
            frames_processed,
            model_type: ModelType::Original,
            model_info: ModelInfo::default(),
        }
    }
}

/// Response of `POST /predict_frame`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FramePredictionResponse {
    #[serde(flatten)]
    pub prediction: AffectPrediction,
    pub model_type: ModelType,
}

impl FramePredictionResponse {
    pub fn new(prediction: AffectPrediction) -> Self {
        Self {
            prediction,
            model_type: ModelType::RealTime,
        }
    }
}
