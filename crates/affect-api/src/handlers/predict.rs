//! Prediction handlers.

use affect_media::NUM_FRAMES;
use affect_models::{FramePredictionResponse, ModelType, VideoPredictionResponse};
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Multipart field carrying the upload.
const FILE_FIELD: &str = "file";

/// Accepted clip extensions (lowercase, without the dot).
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi"];

/// Map an upload filename to its clip extension, case-insensitively.
pub fn video_extension(filename: Option<&str>) -> ApiResult<&'static str> {
    let name = filename.unwrap_or_default().to_lowercase();
    VIDEO_EXTENSIONS
        .iter()
        .copied()
        .find(|ext| {
            name.strip_suffix(ext)
                .is_some_and(|stem| stem.ends_with('.'))
        })
        .ok_or_else(|| ApiError::InvalidFileType(filename.unwrap_or_default().to_string()))
}

/// Find the `file` field, validate its filename with `check`, then read it.
///
/// The body is not read when `check` fails.
async fn read_upload<T, F>(multipart: &mut Multipart, check: F) -> ApiResult<(T, Vec<u8>)>
where
    F: Fn(Option<&str>) -> ApiResult<T>,
{
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let checked = check(field.file_name())?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {e}")))?;

        return Ok((checked, bytes.to_vec()));
    }

    Err(ApiError::bad_request("Missing multipart field 'file'"))
}

/// POST /predict - predict from an uploaded MP4/AVI clip.
pub async fn predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<VideoPredictionResponse>> {
    let mut multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let (extension, bytes) = read_upload(&mut multipart, video_extension).await?;

    info!(extension, bytes = bytes.len(), "Clip upload received");

    let prediction = state.pipeline.predict_clip(bytes, extension).await?;
    metrics::record_prediction(ModelType::Original);

    Ok(Json(VideoPredictionResponse::new(prediction, NUM_FRAMES)))
}

/// POST /predict_frame - predict from a single still image.
pub async fn predict_frame(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<FramePredictionResponse>> {
    let mut multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let ((), bytes) = read_upload(&mut multipart, |_| Ok(())).await?;

    info!(bytes = bytes.len(), "Frame upload received");

    let prediction = state.pipeline.predict_image(bytes).await?;
    metrics::record_prediction(ModelType::RealTime);

    Ok(Json(FramePredictionResponse::new(prediction)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_extensions() {
        assert_eq!(video_extension(Some("lecture.mp4")).unwrap(), "mp4");
        assert_eq!(video_extension(Some("LECTURE.MP4")).unwrap(), "mp4");
        assert_eq!(video_extension(Some("clip.Avi")).unwrap(), "avi");
        assert_eq!(video_extension(Some("a.b.mp4")).unwrap(), "mp4");
    }

    #[test]
    fn test_rejected_extensions() {
        for name in ["clip.mov", "clip.mp4.txt", "mp4", "clipmp4", ""] {
            let err = video_extension(Some(name)).unwrap_err();
            assert!(matches!(err, ApiError::InvalidFileType(_)), "{name} accepted");
        }
        assert!(video_extension(None).is_err());
    }
}
