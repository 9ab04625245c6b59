//! OpenCV-backed clip decoding.
//!
//! `VideoCapture` only opens files, so uploaded bytes are written to a
//! named temporary file that lives exactly as long as the clip. Dropping
//! [`OpenCvClip`] releases the capture and then deletes the file, on
//! success and on every error path.

use std::io::Write;
use std::path::Path;

use opencv::core::{Mat, CV_8UC3};
use opencv::prelude::{MatTraitConst, MatTraitConstManual, VideoCaptureTrait, VideoCaptureTraitConst};
use opencv::videoio::{VideoCapture, CAP_ANY, CAP_PROP_FRAME_COUNT, CAP_PROP_POS_FRAMES};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::clip::{ClipSource, VideoDecoder};
use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;

/// Decodes uploads with OpenCV's `videoio` backend.
pub struct OpenCvVideoDecoder;

impl VideoDecoder for OpenCvVideoDecoder {
    fn open(&self, bytes: &[u8], extension: &str) -> MediaResult<Box<dyn ClipSource>> {
        Ok(Box::new(OpenCvClip::from_bytes(bytes, extension)?))
    }
}

/// An opened capture plus the temporary file it reads from.
pub struct OpenCvClip {
    capture: VideoCapture,
    frame_count: usize,
    // Dropped after `capture` is released.
    _file: NamedTempFile,
}

impl OpenCvClip {
    pub fn from_bytes(bytes: &[u8], extension: &str) -> MediaResult<Self> {
        Self::from_bytes_in(bytes, extension, &std::env::temp_dir())
    }

    fn from_bytes_in(bytes: &[u8], extension: &str, dir: &Path) -> MediaResult<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("affect-clip-")
            .suffix(&format!(".{}", extension))
            .tempfile_in(dir)?;
        file.write_all(bytes)?;
        file.flush()?;

        let path = file
            .path()
            .to_str()
            .ok_or_else(|| MediaError::internal("Temporary clip path is not UTF-8"))?
            .to_string();

        let capture = VideoCapture::from_file(&path, CAP_ANY)
            .map_err(|e| MediaError::invalid_video(format!("Failed to open video: {}", e)))?;

        if !capture.is_opened().unwrap_or(false) {
            debug!(path = %path, "VideoCapture could not open upload");
            return Err(MediaError::EmptyClip);
        }

        let reported = capture.get(CAP_PROP_FRAME_COUNT).unwrap_or(0.0);
        let frame_count = if reported.is_finite() && reported > 0.0 {
            reported as usize
        } else {
            0
        };

        debug!(frame_count, bytes = bytes.len(), "Opened clip");

        Ok(Self {
            capture,
            frame_count,
            _file: file,
        })
    }
}

impl ClipSource for OpenCvClip {
    fn frame_count(&self) -> usize {
        self.frame_count
    }

    fn read_at(&mut self, index: usize) -> Option<Frame> {
        if let Err(e) = self.capture.set(CAP_PROP_POS_FRAMES, index as f64) {
            warn!(index, "Failed to seek: {}", e);
        }

        let mut mat = Mat::default();
        match self.capture.read(&mut mat) {
            Ok(true) if !mat.empty() => match mat_to_frame(&mat) {
                Ok(frame) => Some(frame),
                Err(e) => {
                    warn!(index, "Failed to convert frame: {}", e);
                    None
                }
            },
            Ok(_) => {
                debug!(index, "Empty frame");
                None
            }
            Err(e) => {
                warn!(index, "Failed to read frame: {}", e);
                None
            }
        }
    }
}

impl Drop for OpenCvClip {
    fn drop(&mut self) {
        if let Err(e) = self.capture.release() {
            warn!("Failed to release VideoCapture: {}", e);
        }
    }
}

/// Copy an 8-bit 3-channel BGR `Mat` into a [`Frame`].
fn mat_to_frame(mat: &Mat) -> MediaResult<Frame> {
    if mat.typ() != CV_8UC3 {
        return Err(MediaError::invalid_video(format!(
            "Unexpected frame type {}",
            mat.typ()
        )));
    }

    let continuous;
    let mat = if mat.is_continuous() {
        mat
    } else {
        continuous = mat
            .try_clone()
            .map_err(|e| MediaError::internal(format!("Mat clone: {e}")))?;
        &continuous
    };

    let data = mat
        .data_typed::<opencv::core::Vec3b>()
        .map_err(|e| MediaError::internal(format!("Mat data: {e}")))?;
    let bytes: Vec<u8> = data.iter().flat_map(|px| px.0).collect();

    Frame::from_bgr(mat.cols() as u32, mat.rows() as u32, bytes)
}
