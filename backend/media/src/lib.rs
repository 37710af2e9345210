//! Media staging and decoding for the analysis pipeline.
//!
//! Holds the per-request temporary store, the `MediaDecoder` seam over
//! ffmpeg, and the frame sampler / audio extractor built on top of it.

pub mod audio;
pub mod decoder;
pub mod mime_detect;
pub mod sampler;
pub mod store;

pub use audio::AudioExtractor;
pub use decoder::{DecoderError, FfmpegDecoder, MediaDecoder};
pub use mime_detect::{detect_mime_type, image_data_mime, is_audio, is_image, is_video, original_kind};
pub use sampler::{sample_count, timestamps, FrameSampler, SampledFrames, MIN_TIMESTAMP_SECS};
pub use store::{cleanup, unique_file_name, MediaStore, RequestWorkspace};
