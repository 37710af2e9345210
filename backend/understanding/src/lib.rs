//! Media understanding for framewise.
//!
//! Speech transcription, frame description, report composition, and the
//! pipeline that ties them to the media layer.

pub mod pipeline;
pub mod providers;
pub mod report;
pub mod transcription;
pub mod vision;

pub use pipeline::AnalysisPipeline;
pub use providers::{MockProvider, OpenAiProvider};
pub use report::{
    ReportComposer, audio_report_prompt, frame_timeline, image_report, video_report_prompt,
};
pub use transcription::{AssemblyAiClient, Transcriber};
pub use vision::{VisionAnalyzer, vision_instruction};
