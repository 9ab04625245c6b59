//! Lazily loaded, process-wide model handle.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use tokio::sync::OnceCell;
use tracing::{error, info};

use super::{AffectModel, HeadOutputs, ModelLoader};
use crate::error::{MediaError, MediaResult};
use crate::frame::FrameBatch;

/// Owns the model and runs forward passes.
///
/// The model is loaded on the first call to [`ensure_ready`](Self::ensure_ready)
/// and never reloaded. Concurrent first calls share one load. A failed load
/// leaves the gateway empty, so every later request reports the same
/// `ModelLoadFailure` until the artifact is fixed.
pub struct InferenceGateway {
    loader: Arc<dyn ModelLoader>,
    model: OnceCell<Arc<dyn AffectModel>>,
}

impl InferenceGateway {
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            loader,
            model: OnceCell::new(),
        }
    }

    /// Load the model if it is not loaded yet.
    pub async fn ensure_ready(&self) -> MediaResult<Arc<dyn AffectModel>> {
        let loader = Arc::clone(&self.loader);
        let model = self
            .model
            .get_or_try_init(|| async move {
                let description = loader.describe();
                let start = Instant::now();
                info!(model = %description, "Loading affect model");

                let result = tokio::task::spawn_blocking(move || loader.load())
                    .await
                    .map_err(|e| MediaError::internal(format!("Model load task failed: {e}")))?;

                match result {
                    Ok(model) => {
                        counter!("affect_model_loads_total", "outcome" => "success").increment(1);
                        info!(
                            model = %description,
                            duration_ms = start.elapsed().as_millis() as u64,
                            "Affect model loaded"
                        );
                        Ok(model)
                    }
                    Err(e) => {
                        counter!("affect_model_loads_total", "outcome" => "failure").increment(1);
                        error!(model = %description, error = %e, "Failed to load affect model");
                        Err(e)
                    }
                }
            })
            .await?;

        Ok(Arc::clone(model))
    }

    /// Whether the model has been loaded.
    pub fn is_ready(&self) -> bool {
        self.model.initialized()
    }

    /// Run one forward pass, loading the model first if needed.
    pub async fn infer(&self, batch: FrameBatch) -> MediaResult<HeadOutputs> {
        let model = self.ensure_ready().await?;
        let start = Instant::now();

        let outputs = tokio::task::spawn_blocking(move || model.predict(&batch))
            .await
            .map_err(|e| MediaError::internal(format!("Inference task failed: {e}")))??;

        histogram!("affect_inference_duration_seconds").record(start.elapsed().as_secs_f64());
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{NormalizedFrame, NUM_FRAMES};
    use ndarray::Array3;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FixedModel;

    impl AffectModel for FixedModel {
        fn predict(&self, batch: &FrameBatch) -> MediaResult<HeadOutputs> {
            assert_eq!(batch.num_frames(), NUM_FRAMES);
            Ok(HeadOutputs::new([
                vec![0.1, 0.9],
                vec![0.8, 0.2],
                vec![0.5, 0.5],
                vec![0.3, 0.7],
                vec![0.25],
            ]))
        }
    }

    /// Counts loads; fails until `fail_first` loads have been attempted.
    struct CountingLoader {
        loads: AtomicUsize,
        fail_first: usize,
    }

    impl CountingLoader {
        fn new(fail_first: usize) -> Arc<Self> {
            Arc::new(Self {
                loads: AtomicUsize::new(0),
                fail_first,
            })
        }
    }

    impl ModelLoader for CountingLoader {
        fn load(&self) -> MediaResult<Arc<dyn AffectModel>> {
            let n = self.loads.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            if n < self.fail_first {
                return Err(MediaError::model_load_failure("missing.onnx", "not found"));
            }
            Ok(Arc::new(FixedModel))
        }

        fn describe(&self) -> String {
            "counting".to_string()
        }
    }

    fn zero_batch() -> FrameBatch {
        let frame = NormalizedFrame::from_array(Array3::zeros((224, 224, 3))).unwrap();
        FrameBatch::from_frames(&vec![frame; NUM_FRAMES]).unwrap()
    }

    #[tokio::test]
    async fn test_loads_once() {
        let loader = CountingLoader::new(0);
        let gateway = InferenceGateway::new(loader.clone());

        assert!(!gateway.is_ready());
        gateway.ensure_ready().await.unwrap();
        gateway.ensure_ready().await.unwrap();
        assert!(gateway.is_ready());
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_cold_start_loads_once() {
        let loader = CountingLoader::new(0);
        let gateway = Arc::new(InferenceGateway::new(loader.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gateway = Arc::clone(&gateway);
                tokio::spawn(async move { gateway.ensure_ready().await.map(|_| ()) })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_load_failure_is_reported_on_every_request() {
        let loader = CountingLoader::new(usize::MAX);
        let gateway = InferenceGateway::new(loader.clone());

        for _ in 0..3 {
            let err = gateway.infer(zero_batch()).await.unwrap_err();
            assert!(matches!(err, MediaError::ModelLoadFailure { .. }));
        }
        assert!(!gateway.is_ready());
        assert_eq!(loader.loads.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_recovers_once_artifact_appears() {
        let loader = CountingLoader::new(1);
        let gateway = InferenceGateway::new(loader.clone());

        assert!(gateway.ensure_ready().await.is_err());
        assert!(gateway.ensure_ready().await.is_ok());
        assert!(gateway.is_ready());
    }

    #[tokio::test]
    async fn test_infer_returns_model_outputs() {
        let gateway = InferenceGateway::new(CountingLoader::new(0));
        let outputs = gateway.infer(zero_batch()).await.unwrap();
        assert_eq!(outputs.heads[0], vec![0.1, 0.9]);
        assert_eq!(outputs.heads[4], vec![0.25]);
    }
}
