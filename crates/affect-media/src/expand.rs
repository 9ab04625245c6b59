//! Single-image batches for the real-time path.

use crate::error::MediaResult;
use crate::frame::{Frame, FrameBatch, NUM_FRAMES};
use crate::preprocess::preprocess_frame;

/// Normalize `frame` once and repeat it [`NUM_FRAMES`] times.
///
/// There is no temporal signal in the result; predictions built from it are
/// reported as `real-time` rather than `original`.
pub fn expand_single_frame(frame: &Frame) -> MediaResult<FrameBatch> {
    let normalized = preprocess_frame(frame)?;
    let frames = vec![normalized; NUM_FRAMES];
    FrameBatch::from_frames(&frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expanded_frames_are_identical() {
        let data: Vec<u8> = (0..(123 * 77 * 3)).map(|i| (i * 31 % 256) as u8).collect();
        let frame = Frame::from_bgr(123, 77, data).unwrap();
        let batch = expand_single_frame(&frame).unwrap();

        assert_eq!(batch.shape(), [1, NUM_FRAMES, 224, 224, 3]);
        let first = batch.frame(0).to_owned();
        for i in 1..NUM_FRAMES {
            assert_eq!(batch.frame(i), first.view(), "frame {i} differs");
        }
    }
}
