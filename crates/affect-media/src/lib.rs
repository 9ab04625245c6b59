//! Frame pipeline and model execution for affect prediction.
//!
//! This crate provides:
//! - Temporal sampling of clips into a fixed number of frames
//! - Frame normalization to the model's 224x224 RGB input
//! - Failure-tolerant clip assembly (carry-forward on bad reads)
//! - Single-image batches for the real-time path
//! - A lazily loaded ONNX Runtime model and head decoding
//! - OpenCV clip decoding (feature `opencv`)

pub mod clip;
pub mod decode;
pub mod error;
pub mod expand;
pub mod frame;
pub mod inference;
#[cfg(feature = "opencv")]
pub mod opencv_clip;
pub mod pipeline;
pub mod preprocess;
pub mod sampler;

pub use clip::{assemble_clip, ClipAssembler, ClipSource, VideoDecoder};
pub use decode::{decode_image, default_video_decoder};
pub use error::{MediaError, MediaResult};
pub use expand::expand_single_frame;
pub use frame::{Frame, FrameBatch, NormalizedFrame, FRAME_HEIGHT, FRAME_WIDTH, NUM_FRAMES};
pub use inference::{
    decode_outputs, AffectModel, HeadOutputs, InferenceGateway, ModelLoader, OnnxModelLoader,
    DEFAULT_MODEL_PATH, NUM_HEADS,
};
#[cfg(feature = "opencv")]
pub use opencv_clip::{OpenCvClip, OpenCvVideoDecoder};
pub use pipeline::AffectPipeline;
pub use preprocess::preprocess_frame;
pub use sampler::FrameSampler;
