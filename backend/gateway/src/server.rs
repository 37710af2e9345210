//! Main HTTP Gateway Server.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

use framewise_config::FramewiseConfig;
use framewise_media::{FfmpegDecoder, MediaStore};
use framewise_understanding::{AnalysisPipeline, AssemblyAiClient, OpenAiProvider, Transcriber};

use crate::control_ui;
use crate::handlers;
use crate::health_api;
use crate::session_registry::SessionRegistry;

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub pipeline: Arc<AnalysisPipeline>,
    pub sessions: SessionRegistry,
    pub has_openai: bool,
    pub static_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl GatewayState {
    pub async fn from_config(config: &FramewiseConfig) -> Result<Self> {
        Ok(Self {
            pipeline: Arc::new(build_pipeline(config).await?),
            sessions: SessionRegistry::new(
                config.history_max_turns(),
                config.max_sessions(),
                config.session_idle(),
            ),
            has_openai: config.openai_api_key().is_some(),
            static_dir: config.static_dir(),
            max_upload_bytes: config.max_upload_bytes(),
        })
    }
}

/// Wire the production collaborators: ffmpeg, OpenAI, and AssemblyAI when a
/// key is configured.
pub async fn build_pipeline(config: &FramewiseConfig) -> Result<AnalysisPipeline> {
    let store = MediaStore::open(config.work_dir())
        .await
        .with_context(|| format!("Failed to open work dir {}", config.work_dir().display()))?;

    let decoder = FfmpegDecoder::new(config.ffmpeg_path(), config.ffprobe_path())
        .with_timeout(config.decoder_timeout());

    let provider = OpenAiProvider::new(config.openai_api_key().unwrap_or_default())
        .with_base_url(config.openai_base_url())
        .with_model(config.openai_model())
        .with_timeout(config.openai_timeout())?;
    info!(
        model = provider.model(),
        work_dir = %store.root().display(),
        transcription = config.assemblyai_api_key().is_some(),
        "Analysis pipeline configured"
    );

    let transcriber = config.assemblyai_api_key().map(|key| {
        Arc::new(
            AssemblyAiClient::new(key)
                .with_base_url(config.assemblyai_base_url())
                .with_polling(config.poll_interval(), config.max_poll_attempts()),
        ) as Arc<dyn Transcriber>
    });

    Ok(AnalysisPipeline::new(
        store,
        Arc::new(decoder),
        Arc::new(provider),
        transcriber,
    ))
}

pub fn build_router(state: GatewayState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderName::from_static(crate::session_registry::SESSION_HEADER),
        ]);

    Router::new()
        .route("/health", get(health_api::get_health))
        .route("/chat", post(handlers::chat))
        .route("/upload-image", post(handlers::upload_image))
        .route("/upload-video", post(handlers::upload_video))
        .route("/upload-audio", post(handlers::upload_audio))
        .fallback_service(control_ui::static_files(&state.static_dir))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind `config.listen_addr()` and serve until Ctrl-C.
#[instrument(skip(config))]
pub async fn start_server(config: &FramewiseConfig) -> Result<()> {
    let state = GatewayState::from_config(config).await?;
    let app = build_router(state);

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("✅ framewise listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{MISSING_AUDIO, MISSING_IMAGE, MISSING_VIDEO};
    use crate::session_registry::SESSION_HEADER;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use framewise_core::{FramewiseError, MediaAsset, SpeakerSegment, TranscriptResult};
    use framewise_media::{DecoderError, MediaDecoder};
    use framewise_understanding::MockProvider;
    use serde_json::Value;
    use std::path::Path;
    use tower::ServiceExt;

    const BOUNDARY: &str = "framewise-test-boundary";

    /// Decoder for a 4-second clip without an audio stream.
    struct SilentClip;

    #[async_trait]
    impl MediaDecoder for SilentClip {
        async fn probe_duration(&self, _video: &Path) -> Result<f64, DecoderError> {
            Ok(4.0)
        }

        async fn extract_frame_at(&self, _v: &Path, _t: f64, output: &Path) -> Result<(), DecoderError> {
            tokio::fs::write(output, b"\xff\xd8").await?;
            Ok(())
        }

        async fn extract_audio_track(&self, _v: &Path, _o: &Path) -> Result<(), DecoderError> {
            Err(DecoderError::ExecutionFailed {
                exit_code: Some(1),
                stderr: "Output file #0 does not contain any stream".into(),
            })
        }
    }

    struct NeverCalled;

    #[async_trait]
    impl Transcriber for NeverCalled {
        async fn transcribe(&self, _audio: &MediaAsset) -> Result<TranscriptResult, FramewiseError> {
            panic!("silent clip must not reach transcription");
        }
    }

    /// Transcribes any audio file into the same short transcript.
    struct FixedTranscript;

    #[async_trait]
    impl Transcriber for FixedTranscript {
        async fn transcribe(&self, audio: &MediaAsset) -> Result<TranscriptResult, FramewiseError> {
            assert!(audio.path.exists());
            Ok(TranscriptResult {
                text: "مرحبا بالجميع".into(),
                speakers: vec![SpeakerSegment {
                    speaker: Some("A".into()),
                    text: "مرحبا بالجميع".into(),
                    start_ms: 0,
                    end_ms: 1200,
                }],
                ..Default::default()
            })
        }
    }

    async fn app(root: &tempfile::TempDir, provider: MockProvider) -> Router {
        app_with(root, provider, Arc::new(NeverCalled)).await
    }

    async fn app_with(
        root: &tempfile::TempDir,
        provider: MockProvider,
        transcriber: Arc<dyn Transcriber>,
    ) -> Router {
        let store = MediaStore::open(root.path().join("work")).await.unwrap();
        let pipeline = AnalysisPipeline::new(
            store,
            Arc::new(SilentClip),
            Arc::new(provider),
            Some(transcriber),
        );
        let static_dir = root.path().join("client");
        std::fs::create_dir_all(&static_dir).unwrap();
        std::fs::write(static_dir.join("index.html"), "<html>framewise</html>").unwrap();

        build_router(GatewayState {
            pipeline: Arc::new(pipeline),
            sessions: SessionRegistry::new(24, 100, std::time::Duration::from_secs(3600)),
            has_openai: true,
            static_dir,
            max_upload_bytes: 1024 * 1024,
        })
    }

    fn multipart(parts: &[(&str, Option<&str>, &[u8])]) -> Body {
        let mut body = Vec::new();
        for (name, file_name, data) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match file_name {
                Some(f) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                ),
            }
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        Body::from(body)
    }

    fn upload(uri: &str, body: Body) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(body)
            .unwrap()
    }

    fn chat(message: &str, session: &str) -> Request<Body> {
        Request::post("/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .header(SESSION_HEADER, session)
            .body(Body::from(serde_json::json!({ "message": message }).to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_configured_services() {
        let root = tempfile::tempdir().unwrap();
        let response = app(&root, MockProvider::new("mock"))
            .await
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["ok"], true);
        assert_eq!(json["hasOpenAI"], true);
        assert_eq!(json["hasAssemblyAI"], true);
    }

    #[tokio::test]
    async fn root_serves_client() {
        let root = tempfile::tempdir().unwrap();
        let response = app(&root, MockProvider::new("mock"))
            .await
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"<html>framewise</html>");
    }

    #[tokio::test]
    async fn image_upload_without_file_is_400() {
        let root = tempfile::tempdir().unwrap();
        let body = multipart(&[("prompt", None, "ركّز على النص".as_bytes())]);
        let response = app(&root, MockProvider::new("mock"))
            .await
            .oneshot(upload("/upload-image", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["ok"], false);
        assert_eq!(json["error"], MISSING_IMAGE);
    }

    #[tokio::test]
    async fn non_multipart_video_request_is_400() {
        let root = tempfile::tempdir().unwrap();
        let request = Request::post("/upload-video")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let response = app(&root, MockProvider::new("mock")).await.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], MISSING_VIDEO);
    }

    #[tokio::test]
    async fn silent_video_succeeds_with_null_audio() {
        let root = tempfile::tempdir().unwrap();
        let provider = MockProvider::new("mock")
            .with_response("وصف بصري")
            .with_response("التقرير النهائي");
        let body = multipart(&[
            ("video", Some("clip.mp4"), b"not really a video"),
            ("prompt", None, b""),
        ]);
        let response = app(&root, provider)
            .await
            .oneshot(upload("/upload-video", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["ok"], true);
        assert_eq!(json["response"], "التقرير النهائي");
        assert_eq!(json["extra"]["transcript"], "");
        assert!(json["extra"]["audio"].is_null());
        assert_eq!(json["extra"]["duration"], 4.0);
        assert_eq!(json["extra"]["frames_meta"].as_array().unwrap().len(), 1);

        let leftovers = std::fs::read_dir(root.path().join("work")).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn remote_failure_is_500_with_message() {
        let root = tempfile::tempdir().unwrap();
        let provider = MockProvider::new("mock").with_failure("401 Incorrect API key provided");
        let body = multipart(&[("image", Some("shot.png"), b"\x89PNG")]);
        let response = app(&root, provider)
            .await
            .oneshot(upload("/upload-image", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["ok"], false);
        assert_eq!(json["error"], "401 Incorrect API key provided");
    }

    #[tokio::test]
    async fn chat_history_is_per_session() {
        let root = tempfile::tempdir().unwrap();
        let provider = Arc::new(MockProvider::new("mock"));
        let store = MediaStore::open(root.path().join("work")).await.unwrap();
        let pipeline = AnalysisPipeline::new(store, Arc::new(SilentClip), provider.clone(), None);
        let sessions = SessionRegistry::new(24, 100, std::time::Duration::from_secs(3600));
        let router = build_router(GatewayState {
            pipeline: Arc::new(pipeline),
            sessions: sessions.clone(),
            has_openai: true,
            static_dir: root.path().to_path_buf(),
            max_upload_bytes: 1024,
        });

        let first = router.clone().oneshot(chat("hello", "alice")).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(body_json(first).await["response"], "Mock response");
        router.clone().oneshot(chat("hi", "bob")).await.unwrap();

        assert_eq!(sessions.history("alice").lock().await.len(), 2);
        assert_eq!(sessions.history("bob").lock().await.len(), 2);
        assert_eq!(provider.requests()[1].messages.len(), 1);
    }

    #[tokio::test]
    async fn empty_chat_message_is_400() {
        let root = tempfile::tempdir().unwrap();
        let response = app(&root, MockProvider::new("mock"))
            .await
            .oneshot(chat("   ", "s"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn chat_accepts_form_bodies() {
        let root = tempfile::tempdir().unwrap();
        let provider = MockProvider::new("mock")
            .with_response("from multipart")
            .with_response("from urlencoded");
        let router = app(&root, provider).await;

        let body = multipart(&[("message", None, "مرحبا".as_bytes())]);
        let response = router.clone().oneshot(upload("/chat", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["response"], "from multipart");

        let request = Request::post("/chat")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("message=hello+there"))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["response"], "from urlencoded");
    }

    #[tokio::test]
    async fn screen_recording_webm_is_analysed_as_video() {
        let root = tempfile::tempdir().unwrap();
        let provider = MockProvider::new("mock")
            .with_response("لقطة شاشة لمحرر نصوص")
            .with_response("تقرير التسجيل");
        let body = multipart(&[("video", Some("screen-1718000000000.webm"), b"\x1aE\xdf\xa3webm")]);
        let response = app(&root, provider)
            .await
            .oneshot(upload("/upload-video", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["response"], "تقرير التسجيل");
        assert!(json["extra"]["audio"].is_null());
        assert_eq!(json["extra"]["frames_meta"].as_array().unwrap().len(), 1);
        assert_eq!(std::fs::read_dir(root.path().join("work")).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn audio_upload_without_file_is_400() {
        let root = tempfile::tempdir().unwrap();
        let body = multipart(&[("audio", Some(""), b"")]);
        let response = app(&root, MockProvider::new("mock"))
            .await
            .oneshot(upload("/upload-audio", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["ok"], false);
        assert_eq!(json["error"], MISSING_AUDIO);
    }

    #[tokio::test]
    async fn audio_upload_returns_transcript_detail() {
        let root = tempfile::tempdir().unwrap();
        let provider = MockProvider::new("mock").with_response("ملخص المحادثة");
        let body = multipart(&[("audio", Some("meeting.mp3"), b"ID3audio")]);
        let response = app_with(&root, provider, Arc::new(FixedTranscript))
            .await
            .oneshot(upload("/upload-audio", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["ok"], true);
        assert_eq!(json["response"], "ملخص المحادثة");
        assert_eq!(json["extra"]["transcript"], "مرحبا بالجميع");
        assert_eq!(json["extra"]["audio"]["text"], "مرحبا بالجميع");
        assert_eq!(json["extra"]["audio"]["speakers"][0]["speaker"], "A");
        assert_eq!(json["extra"]["frames"].as_array().unwrap().len(), 0);
        assert_eq!(std::fs::read_dir(root.path().join("work")).unwrap().count(), 0);
    }
}
