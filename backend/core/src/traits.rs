use anyhow::Result;
use async_trait::async_trait;

use crate::message::ChatMessage;

/// Trait for remote chat-completion backends (text and multimodal).
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Provider name (e.g., "openai").
    fn name(&self) -> &str;

    /// Send a completion request and return the reply.
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse>;
}

/// Request to a chat provider. The model is chosen by the provider.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

/// Response from a chat provider.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    pub tokens_used: u64,
    pub latency_ms: u64,
}
