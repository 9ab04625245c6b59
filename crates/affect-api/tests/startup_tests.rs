//! Startup integration tests.

use std::path::PathBuf;

use affect_api::{bootstrap, ApiConfig};
use affect_media::MediaError;

#[tokio::test]
async fn test_preload_failure_is_recorded() {
    let config = ApiConfig {
        model_path: PathBuf::from("does/not/exist/model.onnx"),
        preload_model: true,
        metrics_enabled: true,
        ..ApiConfig::default()
    };

    let (handle, state) = bootstrap(config).await;

    assert!(matches!(state, Err(MediaError::ModelLoadFailure { .. })));
    let rendered = handle.expect("metrics recorder installed").render();
    assert!(
        rendered.contains(r#"affect_model_loads_total{outcome="failure"} 1"#),
        "preload not recorded:\n{rendered}"
    );
}
