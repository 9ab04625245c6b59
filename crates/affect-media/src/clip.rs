//! Clip sources and fixed-length batch assembly.
//!
//! A [`ClipSource`] is a seekable sequence of decoded frames. The
//! [`ClipAssembler`] samples it with a [`FrameSampler`], normalizes every
//! read, and always produces exactly [`NUM_FRAMES`] frames:
//!
//! - A failed read after at least one success repeats the most recent good
//!   frame (carry-forward).
//! - A failed read before any success aborts with `FrameReadFailure`.
//! - A short result is padded with the last frame.

use metrics::counter;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};
use crate::frame::{Frame, FrameBatch, NormalizedFrame, NUM_FRAMES};
use crate::preprocess::preprocess_frame;
use crate::sampler::FrameSampler;

/// A decoded clip with random access by frame index.
pub trait ClipSource: Send {
    /// Total number of frames reported by the container.
    fn frame_count(&self) -> usize;

    /// Seek to `index` and decode one frame.
    ///
    /// Returns `None` when the frame cannot be decoded.
    fn read_at(&mut self, index: usize) -> Option<Frame>;
}

/// Opens uploaded bytes as a [`ClipSource`].
///
/// Any temporary resource backing the clip is owned by the returned value
/// and released when it is dropped.
pub trait VideoDecoder: Send + Sync {
    fn open(&self, bytes: &[u8], extension: &str) -> MediaResult<Box<dyn ClipSource>>;
}

/// Builds a [`FrameBatch`] from a clip.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClipAssembler {
    sampler: FrameSampler,
}

impl ClipAssembler {
    pub fn new(sampler: FrameSampler) -> Self {
        Self { sampler }
    }

    /// Sample, read and normalize frames from `clip`.
    pub fn assemble(&self, clip: &mut dyn ClipSource) -> MediaResult<FrameBatch> {
        let total_frames = clip.frame_count();
        let indices = self.sampler.indices(total_frames)?;

        debug!(total_frames, ?indices, "Sampling clip");

        let mut frames: Vec<NormalizedFrame> = Vec::with_capacity(NUM_FRAMES);
        let mut substituted = 0usize;

        for &index in &indices {
            match clip.read_at(index) {
                Some(frame) => frames.push(preprocess_frame(&frame)?),
                None => {
                    let last = frames
                        .last()
                        .cloned()
                        .ok_or(MediaError::FrameReadFailure { index })?;
                    warn!(index, "Frame read failed, repeating previous frame");
                    substituted += 1;
                    frames.push(last);
                }
            }
        }

        if substituted > 0 {
            counter!("affect_frames_substituted_total").increment(substituted as u64);
        }

        pad_to_length(&mut frames, NUM_FRAMES);
        frames.truncate(NUM_FRAMES);

        FrameBatch::from_frames(&frames)
    }
}

/// Repeat the last frame until `frames.len() == len`. No-op when empty.
fn pad_to_length(frames: &mut Vec<NormalizedFrame>, len: usize) {
    while frames.len() < len {
        match frames.last() {
            Some(last) => {
                let last = last.clone();
                frames.push(last);
            }
            None => break,
        }
    }
}

/// Decode and assemble a clip in one step.
///
/// The clip, and whatever backs it, is dropped before this returns.
pub fn assemble_clip(
    decoder: &dyn VideoDecoder,
    assembler: &ClipAssembler,
    bytes: &[u8],
    extension: &str,
) -> MediaResult<FrameBatch> {
    let mut clip = decoder.open(bytes, extension)?;
    assembler.assemble(clip.as_mut())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// In-memory clip where each slot is either a frame or a decode failure.
    pub(crate) struct SyntheticClip {
        pub frames: Vec<Option<Frame>>,
        pub reads: Vec<usize>,
        pub reported_count: Option<usize>,
    }

    impl SyntheticClip {
        pub fn new(frames: Vec<Option<Frame>>) -> Self {
            Self {
                frames,
                reads: Vec::new(),
                reported_count: None,
            }
        }
    }

    impl ClipSource for SyntheticClip {
        fn frame_count(&self) -> usize {
            self.reported_count.unwrap_or(self.frames.len())
        }

        fn read_at(&mut self, index: usize) -> Option<Frame> {
            self.reads.push(index);
            self.frames.get(index).cloned().flatten()
        }
    }

    /// Solid-color 4x4 BGR frame whose blue channel encodes `tag`.
    pub(crate) fn tagged_frame(tag: u8) -> Frame {
        let data = [tag, 0, 0].iter().copied().cycle().take(4 * 4 * 3).collect();
        Frame::from_bgr(4, 4, data).unwrap()
    }

    /// Recover the tag from a normalized frame (blue is channel 2 after RGB swap).
    fn tag_of(batch: &FrameBatch, i: usize) -> u8 {
        (batch.frame(i)[[0, 0, 2]] * 255.0).round() as u8
    }

    #[test]
    fn test_all_frames_readable() {
        let mut clip = SyntheticClip::new((0..10).map(|i| Some(tagged_frame(i * 10))).collect());
        let batch = ClipAssembler::default().assemble(&mut clip).unwrap();

        assert_eq!(batch.num_frames(), NUM_FRAMES);
        assert_eq!(clip.reads, (0..10).collect::<Vec<_>>());
        for i in 0..10 {
            assert_eq!(tag_of(&batch, i), i as u8 * 10);
        }
    }

    #[test]
    fn test_carry_forward_after_index_three() {
        let frames = (0..10)
            .map(|i| if i <= 3 { Some(tagged_frame(i * 20 + 1)) } else { None })
            .collect();
        let mut clip = SyntheticClip::new(frames);
        let batch = ClipAssembler::default().assemble(&mut clip).unwrap();

        assert_eq!(batch.num_frames(), NUM_FRAMES);
        assert_eq!(tag_of(&batch, 3), 61);
        for i in 4..10 {
            assert_eq!(tag_of(&batch, i), 61, "frame {i} should repeat index 3");
        }
    }

    #[test]
    fn test_mid_clip_gap_uses_most_recent_frame() {
        let mut frames: Vec<_> = (0..10).map(|i| Some(tagged_frame(i * 10 + 5))).collect();
        frames[5] = None;
        frames[6] = None;
        let mut clip = SyntheticClip::new(frames);
        let batch = ClipAssembler::default().assemble(&mut clip).unwrap();

        assert_eq!(tag_of(&batch, 5), 45);
        assert_eq!(tag_of(&batch, 6), 45);
        assert_eq!(tag_of(&batch, 7), 75);
    }

    #[test]
    fn test_first_frame_failure_is_fatal() {
        let mut frames: Vec<_> = (0..10).map(|i| Some(tagged_frame(i))).collect();
        frames[0] = None;
        let mut clip = SyntheticClip::new(frames);
        let err = ClipAssembler::default().assemble(&mut clip).unwrap_err();

        assert!(matches!(err, MediaError::FrameReadFailure { index: 0 }));
        assert_eq!(clip.reads, vec![0]);
    }

    #[test]
    fn test_empty_clip() {
        let mut clip = SyntheticClip::new(Vec::new());
        let err = ClipAssembler::default().assemble(&mut clip).unwrap_err();
        assert!(matches!(err, MediaError::EmptyClip));
        assert!(clip.reads.is_empty());
    }

    #[test]
    fn test_short_clip_repeats_indices() {
        let mut clip = SyntheticClip::new((0..3).map(|i| Some(tagged_frame(i * 50))).collect());
        let batch = ClipAssembler::default().assemble(&mut clip).unwrap();

        assert_eq!(batch.num_frames(), NUM_FRAMES);
        assert_eq!(clip.reads.len(), NUM_FRAMES);
        assert_eq!(tag_of(&batch, 0), 0);
        assert_eq!(tag_of(&batch, 9), 100);
    }

    #[test]
    fn test_overreported_length_carries_forward() {
        // Container claims 40 frames but only the first 12 decode.
        let mut clip = SyntheticClip::new((0..12).map(|i| Some(tagged_frame(i * 3 + 1))).collect());
        clip.reported_count = Some(40);
        let batch = ClipAssembler::default().assemble(&mut clip).unwrap();

        assert_eq!(batch.num_frames(), NUM_FRAMES);
        // Sampled indices: 0, 4, 9, 13, ... ; index 9 is the last readable one.
        assert_eq!(tag_of(&batch, 2), 28);
        assert_eq!(tag_of(&batch, 9), 28);
    }

    #[test]
    fn test_small_sampler_is_padded() {
        let mut clip = SyntheticClip::new((0..5).map(|i| Some(tagged_frame(i + 1))).collect());
        let batch = ClipAssembler::new(FrameSampler::new(3)).assemble(&mut clip).unwrap();

        assert_eq!(batch.num_frames(), NUM_FRAMES);
        assert_eq!(tag_of(&batch, 2), 5);
        assert_eq!(tag_of(&batch, 9), 5);
    }

    #[test]
    fn test_large_sampler_is_truncated() {
        let mut clip = SyntheticClip::new((0..30).map(|i| Some(tagged_frame(i))).collect());
        let batch = ClipAssembler::new(FrameSampler::new(15)).assemble(&mut clip).unwrap();
        assert_eq!(batch.num_frames(), NUM_FRAMES);
    }

    struct SyntheticDecoder;

    impl VideoDecoder for SyntheticDecoder {
        fn open(&self, bytes: &[u8], _extension: &str) -> MediaResult<Box<dyn ClipSource>> {
            let frames = bytes.iter().map(|&b| Some(tagged_frame(b))).collect();
            Ok(Box::new(SyntheticClip::new(frames)))
        }
    }

    /// Clip that records when it is dropped.
    struct TrackedClip {
        inner: SyntheticClip,
        released: Arc<AtomicBool>,
    }

    impl ClipSource for TrackedClip {
        fn frame_count(&self) -> usize {
            self.inner.frame_count()
        }

        fn read_at(&mut self, index: usize) -> Option<Frame> {
            self.inner.read_at(index)
        }
    }

    impl Drop for TrackedClip {
        fn drop(&mut self) {
            self.released.store(true, Ordering::SeqCst);
        }
    }

    struct TrackedDecoder {
        frames: Vec<Option<Frame>>,
        released: Arc<AtomicBool>,
    }

    impl VideoDecoder for TrackedDecoder {
        fn open(&self, _bytes: &[u8], _extension: &str) -> MediaResult<Box<dyn ClipSource>> {
            Ok(Box::new(TrackedClip {
                inner: SyntheticClip::new(self.frames.clone()),
                released: Arc::clone(&self.released),
            }))
        }
    }

    fn assemble_tracked(frames: Vec<Option<Frame>>) -> (MediaResult<FrameBatch>, bool) {
        let released = Arc::new(AtomicBool::new(false));
        let decoder = TrackedDecoder {
            frames,
            released: Arc::clone(&released),
        };
        let result = assemble_clip(&decoder, &ClipAssembler::default(), &[], "mp4");
        (result, released.load(Ordering::SeqCst))
    }

    #[test]
    fn test_clip_released_on_success() {
        let (result, released) =
            assemble_tracked((0..10).map(|i| Some(tagged_frame(i))).collect());
        assert!(result.is_ok());
        assert!(released);
    }

    #[test]
    fn test_clip_released_on_empty_clip() {
        let (result, released) = assemble_tracked(Vec::new());
        assert!(matches!(result, Err(MediaError::EmptyClip)));
        assert!(released);
    }

    #[test]
    fn test_clip_released_on_first_frame_failure() {
        let mut frames: Vec<_> = (0..10).map(|i| Some(tagged_frame(i))).collect();
        frames[0] = None;
        let (result, released) = assemble_tracked(frames);
        assert!(matches!(result, Err(MediaError::FrameReadFailure { index: 0 })));
        assert!(released);
    }

    #[test]
    fn test_assemble_clip_through_decoder() {
        let bytes: Vec<u8> = (0..10).map(|i| i * 7).collect();
        let batch =
            assemble_clip(&SyntheticDecoder, &ClipAssembler::default(), &bytes, "mp4").unwrap();
        assert_eq!(tag_of(&batch, 9), 63);
    }
}
