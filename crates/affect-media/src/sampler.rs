//! Temporal frame sampling.

use crate::error::{MediaError, MediaResult};
use crate::frame::NUM_FRAMES;

/// Picks which frame indices of a clip to feed to the model.
#[derive(Debug, Clone, Copy)]
pub struct FrameSampler {
    count: usize,
}

impl Default for FrameSampler {
    fn default() -> Self {
        Self::new(NUM_FRAMES)
    }
}

impl FrameSampler {
    pub fn new(count: usize) -> Self {
        Self { count }
    }

    /// Evenly spaced indices over `[0, total_frames - 1]`, rounded to the
    /// nearest frame.
    ///
    /// Clips shorter than the sample count yield repeated indices.
    pub fn indices(&self, total_frames: usize) -> MediaResult<Vec<usize>> {
        if total_frames == 0 {
            return Err(MediaError::EmptyClip);
        }

        let last = (total_frames - 1) as f64;
        let steps = self.count.saturating_sub(1).max(1) as f64;

        Ok((0..self.count)
            .map(|i| {
                let position = last * i as f64 / steps;
                (position.round() as usize).min(total_frames - 1)
            })
            .collect())
    }
}
