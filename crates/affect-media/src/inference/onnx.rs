//! ONNX Runtime backend for the affect model.
//!
//! Input: `[1, NUM_FRAMES, 224, 224, 3]` f32, channels last.
//! Outputs, in session order: boredom, engagement, confusion, frustration
//! (each `[1, C]`), attention (`[1, 1]`).

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use tracing::debug;

use super::{AffectModel, HeadOutputs, ModelLoader, NUM_HEADS};
use crate::error::{MediaError, MediaResult};
use crate::frame::FrameBatch;

/// Model artifact location relative to the working directory.
pub const DEFAULT_MODEL_PATH: &str = "saved_models/1/model.onnx";

/// Loads [`OnnxAffectModel`] from a fixed path.
#[derive(Debug, Clone)]
pub struct OnnxModelLoader {
    path: PathBuf,
    threads: usize,
}

impl OnnxModelLoader {
    /// `threads` pins both intra-op and inter-op parallelism.
    pub fn new(path: impl Into<PathBuf>, threads: usize) -> Self {
        Self {
            path: path.into(),
            threads: threads.max(1),
        }
    }
}

impl ModelLoader for OnnxModelLoader {
    fn load(&self) -> MediaResult<Arc<dyn AffectModel>> {
        Ok(Arc::new(OnnxAffectModel::load(&self.path, self.threads)?))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// ONNX Runtime session wrapper.
pub struct OnnxAffectModel {
    session: Mutex<Session>,
    output_names: Vec<String>,
}

impl OnnxAffectModel {
    pub fn load(model_path: &Path, threads: usize) -> MediaResult<Self> {
        let fail = |reason: String| MediaError::model_load_failure(model_path, reason);

        if !model_path.exists() {
            return Err(fail("model file not found".to_string()));
        }

        let model_bytes =
            std::fs::read(model_path).map_err(|e| fail(format!("read model file: {e}")))?;

        let session = Session::builder()
            .map_err(|e| fail(format!("ORT session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| fail(format!("ORT opt level: {e}")))?
            .with_intra_threads(threads)
            .map_err(|e| fail(format!("ORT intra threads: {e}")))?
            .with_inter_threads(threads)
            .map_err(|e| fail(format!("ORT inter threads: {e}")))?
            .commit_from_memory(model_bytes.as_slice())
            .map_err(|e| fail(format!("ORT load model: {e}")))?;

        let output_names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        if output_names.len() != NUM_HEADS {
            return Err(fail(format!(
                "expected {} output heads, model has {}",
                NUM_HEADS,
                output_names.len()
            )));
        }

        debug!(
            inputs = session.inputs.len(),
            outputs = ?output_names,
            threads,
            "ORT session ready"
        );

        Ok(Self {
            session: Mutex::new(session),
            output_names,
        })
    }
}

impl AffectModel for OnnxAffectModel {
    fn predict(&self, batch: &FrameBatch) -> MediaResult<HeadOutputs> {
        let shape = batch.shape().to_vec();
        let data = batch.to_vec().into_boxed_slice();
        let tensor = Tensor::from_array((shape, data))
            .map_err(|e| MediaError::inference(format!("ORT tensor: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| MediaError::inference("ORT session poisoned"))?;

        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| MediaError::inference(format!("ORT run failed: {e}")))?;

        let mut heads: [Vec<f32>; NUM_HEADS] = Default::default();
        for (head, name) in heads.iter_mut().zip(&self.output_names) {
            let value = outputs
                .get(name.as_str())
                .ok_or_else(|| MediaError::inference(format!("ORT output {name} missing")))?;
            let (_, data) = value
                .try_extract_tensor::<f32>()
                .map_err(|e| MediaError::inference(format!("ORT extract {name}: {e}")))?;
            *head = data.to_vec();
        }

        Ok(HeadOutputs::new(heads))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_artifact_is_load_failure() {
        let loader = OnnxModelLoader::new("does/not/exist/model.onnx", 1);
        match loader.load() {
            Err(MediaError::ModelLoadFailure { path, reason }) => {
                assert_eq!(path, PathBuf::from("does/not/exist/model.onnx"));
                assert!(reason.contains("not found"));
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("load should fail"),
        }
    }

    #[test]
    fn test_malformed_artifact_is_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        std::fs::write(&path, b"not an onnx graph").unwrap();

        let result = OnnxModelLoader::new(&path, 1).load();
        assert!(matches!(result, Err(MediaError::ModelLoadFailure { .. })));
    }

    #[test]
    fn test_threads_are_at_least_one() {
        let loader = OnnxModelLoader::new(DEFAULT_MODEL_PATH, 0);
        assert_eq!(loader.threads, 1);
        assert_eq!(loader.describe(), DEFAULT_MODEL_PATH);
    }
}
