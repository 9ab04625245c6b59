//! Shared data models for the affect inference service.
//!
//! This crate provides Serde-serializable types for:
//! - The four classification tasks and their decoded predictions
//! - Model provenance (`original` clip model vs `real-time` single frame)
//! - Response bodies of the prediction endpoints

pub mod prediction;
pub mod response;
pub mod task;

pub use prediction::{AffectPrediction, TaskPrediction};
pub use response::{FramePredictionResponse, ModelInfo, ModelType, VideoPredictionResponse};
pub use task::AffectTask;
