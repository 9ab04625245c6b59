//! Frame types flowing through the pipeline.
//!
//! - [`Frame`]: one decoded picture, interleaved BGR bytes at source resolution
//! - [`NormalizedFrame`]: 224x224 RGB `f32` in `[0.0, 1.0]`, HWC layout
//! - [`FrameBatch`]: exactly [`NUM_FRAMES`] normalized frames with a leading
//!   batch axis of size 1, i.e. `[1, NUM_FRAMES, 224, 224, 3]`

use image::RgbImage;
use ndarray::{Array3, Array5, ArrayView3, Axis};

use crate::error::{MediaError, MediaResult};

/// Temporal sample count required by the model input.
pub const NUM_FRAMES: usize = 10;

/// Model input width in pixels.
pub const FRAME_WIDTH: u32 = 224;

/// Model input height in pixels.
pub const FRAME_HEIGHT: u32 = 224;

/// Channels per pixel.
pub const CHANNELS: usize = 3;

/// A decoded frame in BGR channel order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    /// Wrap an interleaved BGR buffer.
    pub fn from_bgr(width: u32, height: u32, data: Vec<u8>) -> MediaResult<Self> {
        if width == 0 || height == 0 {
            return Err(MediaError::internal(format!(
                "Frame has zero dimension: {}x{}",
                width, height
            )));
        }
        let expected = width as usize * height as usize * CHANNELS;
        if data.len() != expected {
            return Err(MediaError::internal(format!(
                "BGR buffer length {} does not match {}x{}x{}",
                data.len(),
                width,
                height,
                CHANNELS
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build a BGR frame from an RGB image.
    pub fn from_rgb_image(image: &RgbImage) -> MediaResult<Self> {
        let (width, height) = image.dimensions();
        let mut data = image.as_raw().clone();
        for px in data.chunks_exact_mut(CHANNELS) {
            px.swap(0, 2);
        }
        Self::from_bgr(width, height, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw interleaved BGR bytes.
    pub fn as_bgr(&self) -> &[u8] {
        &self.data
    }
}

/// A preprocessed frame ready for the model.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedFrame {
    data: Array3<f32>,
}

impl NormalizedFrame {
    /// Wrap an HWC array. The shape must be `[224, 224, 3]`.
    pub fn from_array(data: Array3<f32>) -> MediaResult<Self> {
        let expected = [FRAME_HEIGHT as usize, FRAME_WIDTH as usize, CHANNELS];
        if data.shape() != expected {
            return Err(MediaError::internal(format!(
                "Normalized frame has shape {:?}, expected {:?}",
                data.shape(),
                expected
            )));
        }
        Ok(Self { data })
    }

    pub fn view(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }
}

/// Model input: exactly [`NUM_FRAMES`] frames under a batch axis of size 1.
#[derive(Debug, Clone)]
pub struct FrameBatch {
    tensor: Array5<f32>,
}

impl FrameBatch {
    /// Stack normalized frames into a batch.
    ///
    /// Fails unless exactly [`NUM_FRAMES`] frames are given.
    pub fn from_frames(frames: &[NormalizedFrame]) -> MediaResult<Self> {
        if frames.len() != NUM_FRAMES {
            return Err(MediaError::internal(format!(
                "Frame batch needs {} frames, got {}",
                NUM_FRAMES,
                frames.len()
            )));
        }

        let views: Vec<_> = frames.iter().map(NormalizedFrame::view).collect();
        let stacked = ndarray::stack(Axis(0), &views)
            .map_err(|e| MediaError::internal(format!("Stack frames: {e}")))?;

        Ok(Self {
            tensor: stacked.insert_axis(Axis(0)),
        })
    }

    /// Tensor shape, `[1, NUM_FRAMES, 224, 224, 3]`.
    pub fn shape(&self) -> [usize; 5] {
        let s = self.tensor.shape();
        [s[0], s[1], s[2], s[3], s[4]]
    }

    /// Number of frames along the temporal axis.
    pub fn num_frames(&self) -> usize {
        self.tensor.len_of(Axis(1))
    }

    /// View of one frame along the temporal axis.
    pub fn frame(&self, index: usize) -> ArrayView3<'_, f32> {
        self.tensor.index_axis(Axis(0), 0).index_axis_move(Axis(0), index)
    }

    /// Row-major copy of the tensor data.
    pub fn to_vec(&self) -> Vec<f32> {
        self.tensor.iter().copied().collect()
    }
}
