//! Frame normalization for model input.
//!
//! Steps, in order:
//! 1. BGR -> RGB
//! 2. Resize to 224x224 (bilinear, deterministic)
//! 3. Scale `u8` to `f32` in `[0.0, 1.0]`

use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array3;

use crate::error::{MediaError, MediaResult};
use crate::frame::{Frame, NormalizedFrame, CHANNELS, FRAME_HEIGHT, FRAME_WIDTH};

/// Interpolation used when resizing to the model resolution.
const RESIZE_FILTER: FilterType = FilterType::Triangle;

/// Convert a BGR frame of any size into a [`NormalizedFrame`].
///
/// The input is not modified.
pub fn preprocess_frame(frame: &Frame) -> MediaResult<NormalizedFrame> {
    let mut rgb = frame.as_bgr().to_vec();
    for px in rgb.chunks_exact_mut(CHANNELS) {
        px.swap(0, 2);
    }

    let image = RgbImage::from_raw(frame.width(), frame.height(), rgb)
        .ok_or_else(|| MediaError::internal("RGB buffer does not match frame dimensions"))?;

    let resized = if image.dimensions() == (FRAME_WIDTH, FRAME_HEIGHT) {
        image
    } else {
        imageops::resize(&image, FRAME_WIDTH, FRAME_HEIGHT, RESIZE_FILTER)
    };

    let values: Vec<f32> = resized
        .into_raw()
        .into_iter()
        .map(|v| v as f32 / 255.0)
        .collect();

    let data = Array3::from_shape_vec(
        (FRAME_HEIGHT as usize, FRAME_WIDTH as usize, CHANNELS),
        values,
    )
    .map_err(|e| MediaError::internal(format!("Normalized frame shape: {e}")))?;

    NormalizedFrame::from_array(data)
}
