//! Upload decoding: still images and the default clip decoder.

use std::sync::Arc;

use tracing::debug;

use crate::clip::VideoDecoder;
use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;

/// Decode an encoded still image (JPEG, PNG, BMP, ...) into a BGR frame.
pub fn decode_image(bytes: &[u8]) -> MediaResult<Frame> {
    if bytes.is_empty() {
        return Err(MediaError::invalid_image("empty upload"));
    }

    let image = image::load_from_memory(bytes)
        .map_err(|e| MediaError::invalid_image(e.to_string()))?
        .to_rgb8();

    debug!(width = image.width(), height = image.height(), "Decoded image");

    Frame::from_rgb_image(&image)
}

/// Clip decoder used when OpenCV is not compiled in.
#[cfg(not(feature = "opencv"))]
pub struct UnsupportedVideoDecoder;

#[cfg(not(feature = "opencv"))]
impl VideoDecoder for UnsupportedVideoDecoder {
    fn open(
        &self,
        _bytes: &[u8],
        extension: &str,
    ) -> MediaResult<Box<dyn crate::clip::ClipSource>> {
        Err(MediaError::UnsupportedFormat(format!(
            "video decoding for .{extension} requires the opencv feature"
        )))
    }
}

/// The clip decoder for this build.
pub fn default_video_decoder() -> Arc<dyn VideoDecoder> {
    #[cfg(feature = "opencv")]
    {
        Arc::new(crate::opencv_clip::OpenCvVideoDecoder)
    }
    #[cfg(not(feature = "opencv"))]
    {
        Arc::new(UnsupportedVideoDecoder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageOutputFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn encode_png(image: &RgbImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, ImageOutputFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_decode_png_to_bgr() {
        let image = RgbImage::from_pixel(6, 3, Rgb([200, 100, 50]));
        let frame = decode_image(&encode_png(&image)).unwrap();

        assert_eq!((frame.width(), frame.height()), (6, 3));
        assert_eq!(&frame.as_bgr()[..3], &[50, 100, 200]);
    }

    #[test]
    fn test_garbage_is_invalid_image() {
        let err = decode_image(b"definitely not an image").unwrap_err();
        assert!(matches!(err, MediaError::InvalidImage(_)));
    }

    #[test]
    fn test_empty_is_invalid_image() {
        assert!(matches!(decode_image(&[]), Err(MediaError::InvalidImage(_))));
    }
}
