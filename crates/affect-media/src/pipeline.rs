//! End-to-end prediction service.
//!
//! Constructed once at startup and shared by every request handler:
//! upload bytes -> frame batch -> forward pass -> decoded prediction.

use std::sync::Arc;
use std::time::Instant;

use affect_models::AffectPrediction;
use tracing::{debug, info};

use crate::clip::{assemble_clip, ClipAssembler, VideoDecoder};
use crate::decode::decode_image;
use crate::error::{MediaError, MediaResult};
use crate::expand::expand_single_frame;
use crate::frame::FrameBatch;
use crate::inference::{decode_outputs, InferenceGateway, ModelLoader};

/// Shared prediction pipeline.
pub struct AffectPipeline {
    decoder: Arc<dyn VideoDecoder>,
    assembler: ClipAssembler,
    gateway: InferenceGateway,
}

impl AffectPipeline {
    pub fn new(decoder: Arc<dyn VideoDecoder>, loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            decoder,
            assembler: ClipAssembler::default(),
            gateway: InferenceGateway::new(loader),
        }
    }

    pub fn gateway(&self) -> &InferenceGateway {
        &self.gateway
    }

    /// Predict from an uploaded clip (`extension` without the dot).
    pub async fn predict_clip(
        &self,
        bytes: Vec<u8>,
        extension: &str,
    ) -> MediaResult<AffectPrediction> {
        let start = Instant::now();
        let decoder = Arc::clone(&self.decoder);
        let assembler = self.assembler;
        let extension = extension.to_string();
        let size = bytes.len();

        let batch = tokio::task::spawn_blocking(move || {
            assemble_clip(decoder.as_ref(), &assembler, &bytes, &extension)
        })
        .await
        .map_err(|e| MediaError::internal(format!("Clip decode task failed: {e}")))??;

        debug!(
            bytes = size,
            decode_ms = start.elapsed().as_millis() as u64,
            "Clip assembled"
        );

        let prediction = self.run(batch).await?;
        info!(
            total_ms = start.elapsed().as_millis() as u64,
            attention_score = prediction.attention_score,
            "Clip prediction complete"
        );
        Ok(prediction)
    }

    /// Predict from a single still image.
    pub async fn predict_image(&self, bytes: Vec<u8>) -> MediaResult<AffectPrediction> {
        let start = Instant::now();

        let batch = tokio::task::spawn_blocking(move || {
            let frame = decode_image(&bytes)?;
            expand_single_frame(&frame)
        })
        .await
        .map_err(|e| MediaError::internal(format!("Image decode task failed: {e}")))??;

        let prediction = self.run(batch).await?;
        debug!(
            total_ms = start.elapsed().as_millis() as u64,
            "Frame prediction complete"
        );
        Ok(prediction)
    }

    async fn run(&self, batch: FrameBatch) -> MediaResult<AffectPrediction> {
        let outputs = self.gateway.infer(batch).await?;
        Ok(decode_outputs(outputs))
    }
}
