use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use framewise_core::{ChatProvider, ChatRequest, ChatResponse};

/// A chat provider that replays canned replies and records every request.
///
/// Replies are consumed in order; once exhausted the fallback reply is used.
pub struct MockProvider {
    name: String,
    replies: Mutex<VecDeque<Result<String, String>>>,
    fallback: String,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            replies: Mutex::new(VecDeque::new()),
            fallback: "Mock response".to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.push(Ok(response.into()));
        self
    }

    /// Queue a failure; `complete` returns it as an error message.
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.push(Err(message.into()));
        self
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn push(&self, reply: Result<String, String>) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        let next = self
            .replies
            .lock()
            .ok()
            .and_then(|mut r| r.pop_front())
            .unwrap_or_else(|| Ok(self.fallback.clone()));

        match next {
            Ok(content) => Ok(ChatResponse {
                content,
                provider: self.name.clone(),
                model: "mock".to_string(),
                tokens_used: 0,
                latency_ms: 0,
            }),
            Err(message) => anyhow::bail!(message),
        }
    }
}
