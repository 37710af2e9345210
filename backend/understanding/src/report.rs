//! Report composition.
//!
//! Builds the Arabic report prompts from the visual description, the frame
//! timeline and the transcript, and runs them (and free chat) against the
//! session history.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::info;

use framewise_core::{
    ChatMessage, ChatProvider, ChatRequest, ConversationTurn, FrameSample, FramewiseError,
    SharedHistory,
};

pub const REPORT_TEMPERATURE: f32 = 0.25;
pub const CHAT_TEMPERATURE: f32 = 0.4;

/// Prefix of the image endpoint's response text.
pub const IMAGE_REPORT_PREFIX: &str = "🔎 تحليل تفصيلي للصورة:\n\n";

/// Stands in for the transcript when the video had no usable audio.
pub const NO_AUDIO_MARKER: &str = "(لا يوجد صوت/تم تخطيه)";

/// One line per frame: `- فريم #<i> عند ~<t> ثانية`, 1-based, one decimal.
pub fn frame_timeline(frames: &[FrameSample]) -> String {
    let mut out = String::new();
    for (i, frame) in frames.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = write!(out, "- فريم #{} عند ~{:.1} ثانية", i + 1, frame.timestamp_secs);
    }
    out
}

pub fn video_report_prompt(frames: &[FrameSample], vision: &str, transcript: &str) -> String {
    let transcript = match transcript.trim() {
        "" => NO_AUDIO_MARKER,
        t => t,
    };
    format!(
        "لديك تحليل بصري من لقطات موزّعة زمنيًا + نص صوتي (إن وُجد). اكتب **تقريرًا تفصيليًا** بالعربية بتقسيمات واضحة:

1) ملخص تنفيذي (2–4 جُمل).
2) تفاصيل المشاهد بالترتيب الزمني: اذكر التوقيت التقريبي لكل فقرة بالاعتماد على الفريمات:
{timeline}

اشرح العناصر الظاهرة، النصوص/الأختام، الشعارات، الأشخاص/الأغراض، وحركة الكاميرا إن وجدت.
3) نصوص مقروءة من الشاشة (إن وُجدت) بشكل نقاط منظمة.
4) تحليل الصوت (إن وُجد): الموضوعات، المتحدثون، النقاط الأساسية، مشاعر عامة، أرقام/تواريخ مهمّة.
5) مؤشرات مهمة/مخاطر/امتثال (إن وجدت).
6) أسئلة متابعة مقترحة.
7) توصيات عملية موجّهة.

المادة البصرية (مختصر التحليل):
{vision}

النص الصوتي المستخرج (قد يكون فارغًا):
{transcript}",
        timeline = frame_timeline(frames),
    )
}

pub fn audio_report_prompt(transcript: &str) -> String {
    format!(
        "لدينا نص صوتي مُفرّغ. أعد **تحليلًا تفصيليًا** بالعربية يتضمن:
- ملخص تنفيذي مركز.
- النقاط الرئيسية مرتبة.
- تقسيم موضوعي/زمني موجز.
- المتحدثون (إن وُجدوا) وأبرز مساهماتهم.
- المشاعر العامة وأي لحظات لافتة (سلبية/إيجابية).
- أرقام/تواريخ/توصيات عملية.
- أسئلة متابعة مقترحة.

النص:
{transcript}"
    )
}

/// Response text for a single uploaded image.
pub fn image_report(vision: &str) -> String {
    format!("{IMAGE_REPORT_PREFIX}{vision}")
}

#[derive(Clone)]
pub struct ReportComposer {
    provider: Arc<dyn ChatProvider>,
}

impl ReportComposer {
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self { provider }
    }

    /// Send `prompt` after the session history and remember the reply.
    ///
    /// The prompt itself is not stored; only the assistant's report is.
    pub async fn compose(
        &self,
        prompt: &str,
        history: &SharedHistory,
    ) -> Result<String, FramewiseError> {
        let mut messages = history.lock().await.to_messages();
        messages.push(ChatMessage::user_text(prompt));
        let report = self.ask(messages, REPORT_TEMPERATURE).await?;
        history.lock().await.push(ConversationTurn::assistant(report.clone()));
        Ok(report)
    }

    /// Free-form chat: the user turn and the reply both enter the history.
    pub async fn chat(
        &self,
        message: &str,
        history: &SharedHistory,
    ) -> Result<String, FramewiseError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(FramewiseError::Input("الرسالة فارغة".into()));
        }
        let messages = {
            let mut history = history.lock().await;
            history.push(ConversationTurn::user(message));
            history.to_messages()
        };
        let reply = self.ask(messages, CHAT_TEMPERATURE).await?;
        history.lock().await.push(ConversationTurn::assistant(reply.clone()));
        Ok(reply)
    }

    async fn ask(
        &self,
        messages: Vec<ChatMessage>,
        temperature: f32,
    ) -> Result<String, FramewiseError> {
        let reply = self
            .provider
            .complete(&ChatRequest {
                messages,
                temperature,
            })
            .await
            .map_err(FramewiseError::remote)?;
        info!(
            provider = %reply.provider,
            model = %reply.model,
            tokens = reply.tokens_used,
            latency_ms = reply.latency_ms,
            "Completion received"
        );
        Ok(reply.content.trim().to_string())
    }
}
