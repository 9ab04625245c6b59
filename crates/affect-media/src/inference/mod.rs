//! Model execution and output decoding.
//!
//! The model itself is opaque: anything implementing [`AffectModel`] maps a
//! [`FrameBatch`] to five head outputs. [`InferenceGateway`] owns the model
//! and loads it at most once; [`decode_outputs`] turns raw heads into an
//! [`affect_models::AffectPrediction`].

pub mod decoder;
pub mod gateway;
pub mod onnx;

use std::sync::Arc;

use crate::error::MediaResult;
use crate::frame::FrameBatch;

pub use decoder::decode_outputs;
pub use gateway::InferenceGateway;
pub use onnx::{OnnxAffectModel, OnnxModelLoader, DEFAULT_MODEL_PATH};

/// Number of model output heads: four classifiers then the attention regressor.
pub const NUM_HEADS: usize = 5;

/// Position of the attention regressor among the heads.
pub const ATTENTION_HEAD: usize = NUM_HEADS - 1;

/// Raw model outputs in head order
/// (boredom, engagement, confusion, frustration, attention).
///
/// Each classifier head holds one probability vector for the single batch
/// item; the attention head holds one scalar.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadOutputs {
    pub heads: [Vec<f32>; NUM_HEADS],
}

impl HeadOutputs {
    pub fn new(heads: [Vec<f32>; NUM_HEADS]) -> Self {
        Self { heads }
    }
}

/// A loaded affect model.
pub trait AffectModel: Send + Sync {
    /// One forward pass over a batch of size 1.
    fn predict(&self, batch: &FrameBatch) -> MediaResult<HeadOutputs>;
}

/// Produces the model on first use.
pub trait ModelLoader: Send + Sync {
    fn load(&self) -> MediaResult<Arc<dyn AffectModel>>;

    /// Human-readable location of the artifact, for logs.
    fn describe(&self) -> String;
}
