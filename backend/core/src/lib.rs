pub mod error;
pub mod history;
pub mod message;
pub mod traits;
pub mod types;

pub use error::FramewiseError;
pub use history::{ConversationHistory, SharedHistory, DEFAULT_HISTORY_LIMIT};
pub use message::{ChatMessage, ChatRole, ContentPart, ConversationTurn, ImageUrl, MessageContent};
pub use traits::{ChatProvider, ChatRequest, ChatResponse};
pub use types::{
    AnalysisReport, Chapter, FrameSample, Highlight, MediaAsset, MediaKind, SentimentSegment,
    SpeakerSegment, TimeRange, TranscriptResult,
};
