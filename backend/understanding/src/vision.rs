//! Vision understanding: describe one or more stills with a vision LLM.
//!
//! Images are inlined as base64 `data:` URLs in a single multimodal user
//! message that follows the session history. Only the assistant's answer is
//! remembered; the image payload never enters the history.

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD};
use tracing::{debug, info};

use framewise_core::{
    ChatMessage, ChatProvider, ChatRequest, ContentPart, ConversationTurn, FramewiseError,
    MediaAsset, SharedHistory,
};
use framewise_media::image_data_mime;

pub const VISION_TEMPERATURE: f32 = 0.2;

/// Returned instead of an empty model answer.
pub const VISION_FALLBACK: &str = "لم أتمكن من تحليل الصور.";

const BASE_INSTRUCTION: &str = "حلّل الصور التالية بدقة وقدّم تقريرًا **تفصيليًا** بالعربية يتضمن:
- العناصر/الكائنات الرئيسية مع تقدير أهميتها وسياقها.
- نصوص/أختام/أرقام/عناوين (OCR مبسّط) إن وُجدت، واذكر معناها.
- إشارات بصرية: شعارات، رموز، عملات، مستندات، جداول.
- تغيّرات المشهد/الإضاءة إن وُجدت، وما قد تعنيه.
- أي مخاطر/ملاحظات امتثال (عرض بيانات حساسة، أرقام هويات… إن ظهرت).
اكتب بعناوين فرعية واضحة ونقاط مرتبة. تجنّب الإطالة غير المفيدة.";

/// Base instruction plus the caller's extra direction, if any.
pub fn vision_instruction(extra_prompt: &str) -> String {
    let extra = extra_prompt.trim();
    if extra.is_empty() {
        BASE_INSTRUCTION.to_string()
    } else {
        format!("{BASE_INSTRUCTION}\n\n\nتوجيه إضافي من المستخدم:\n{extra}")
    }
}

#[derive(Clone)]
pub struct VisionAnalyzer {
    provider: Arc<dyn ChatProvider>,
}

impl VisionAnalyzer {
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self { provider }
    }

    /// Describe `images` in order. A remote failure is fatal to the request.
    pub async fn describe(
        &self,
        images: &[MediaAsset],
        extra_prompt: &str,
        history: &SharedHistory,
    ) -> Result<String, FramewiseError> {
        let mut parts = Vec::with_capacity(images.len() + 1);
        parts.push(ContentPart::text(vision_instruction(extra_prompt)));
        for image in images {
            let bytes = tokio::fs::read(image.path()).await?;
            let mime = image_data_mime(image.path());
            debug!(path = %image.path().display(), mime, bytes = bytes.len(), "Inlining image");
            parts.push(ContentPart::image_data(mime, &STANDARD.encode(&bytes)));
        }

        let mut messages = history.lock().await.to_messages();
        messages.push(ChatMessage::user_parts(parts));

        info!(provider = self.provider.name(), images = images.len(), "Describing images");
        let reply = self
            .provider
            .complete(&ChatRequest {
                messages,
                temperature: VISION_TEMPERATURE,
            })
            .await
            .map_err(FramewiseError::remote)?;

        let text = match reply.content.trim() {
            "" => VISION_FALLBACK.to_string(),
            trimmed => trimmed.to_string(),
        };
        history.lock().await.push(ConversationTurn::assistant(text.clone()));
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockProvider;
    use framewise_core::{ChatRole, ConversationHistory, MediaKind, MessageContent};

    fn frame(dir: &tempfile::TempDir, name: &str) -> MediaAsset {
        let path = dir.path().join(name);
        std::fs::write(&path, b"\xff\xd8\xff").unwrap();
        MediaAsset::new(path, MediaKind::ExtractedFrame)
    }

    #[test]
    fn extra_prompt_is_appended() {
        assert_eq!(vision_instruction("   "), BASE_INSTRUCTION);
        let with_extra = vision_instruction("ركّز على الشعارات");
        assert!(with_extra.starts_with(BASE_INSTRUCTION));
        assert!(with_extra.ends_with("توجيه إضافي من المستخدم:\nركّز على الشعارات"));
    }

    #[tokio::test]
    async fn sends_images_in_order_after_history() {
        let dir = tempfile::tempdir().unwrap();
        let images = vec![frame(&dir, "frame1.jpg"), frame(&dir, "frame2.png")];
        let provider = Arc::new(MockProvider::new("mock").with_response("  وصف  "));
        let history = ConversationHistory::shared(24);
        history.lock().await.push(ConversationTurn::user("مرحبا"));

        let analyzer = VisionAnalyzer::new(provider.clone());
        let text = analyzer.describe(&images, "", &history).await.unwrap();
        assert_eq!(text, "وصف");

        let requests = provider.requests();
        let request = &requests[0];
        assert_eq!(request.temperature, VISION_TEMPERATURE);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, ChatRole::User);
        let MessageContent::Parts(parts) = &request.messages[1].content else {
            panic!("expected multimodal content");
        };
        assert_eq!(parts.len(), 3);
        let urls: Vec<&str> = parts
            .iter()
            .filter_map(|p| match p {
                ContentPart::ImageUrl { image_url } => Some(image_url.url.as_str()),
                _ => None,
            })
            .collect();
        assert!(urls[0].starts_with("data:image/jpeg;base64,"));
        assert!(urls[1].starts_with("data:image/png;base64,"));

        let history = history.lock().await;
        assert_eq!(history.len(), 2);
        let last = history.turns().last().unwrap();
        assert_eq!(last.role, ChatRole::Assistant);
        assert_eq!(last.content, "وصف");
    }

    #[tokio::test]
    async fn empty_reply_uses_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(MockProvider::new("mock").with_response("   "));
        let history = ConversationHistory::shared(24);
        let text = VisionAnalyzer::new(provider)
            .describe(&[frame(&dir, "a.jpg")], "", &history)
            .await
            .unwrap();
        assert_eq!(text, VISION_FALLBACK);
    }

    #[tokio::test]
    async fn remote_failure_is_fatal_and_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(MockProvider::new("mock").with_failure("429 Rate limit reached"));
        let history = ConversationHistory::shared(24);
        let err = VisionAnalyzer::new(provider)
            .describe(&[frame(&dir, "a.jpg")], "", &history)
            .await
            .unwrap_err();
        assert!(matches!(&err, FramewiseError::RemoteAnalysis(m) if m == "429 Rate limit reached"));
        assert!(history.lock().await.is_empty());
    }
}
