//! Chat and upload endpoints.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::{HeaderMap, header};
use axum::{Form, Json};
use serde::Deserialize;
use tracing::info;

use framewise_core::MediaKind;

use crate::attachments::{Upload, read_text_field, read_upload};
use crate::error::{ApiError, ApiResult};
use crate::response::AnalysisResponse;
use crate::server::GatewayState;
use crate::session_registry::session_id;

pub const MISSING_IMAGE: &str = "لم يتم رفع الصورة";
pub const MISSING_VIDEO: &str = "لم يتم رفع الفيديو";
pub const MISSING_AUDIO: &str = "لم يتم رفع الملف الصوتي";

#[derive(Debug, Deserialize)]
pub struct ChatBody {
    #[serde(default)]
    pub message: String,
}

/// `POST /chat` with a `message` field, sent as JSON, urlencoded or
/// multipart form.
pub async fn chat(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    request: Request,
) -> ApiResult<Json<AnalysisResponse>> {
    let message = chat_message(&headers, request).await?;
    let session = session_id(&headers);
    let history = state.sessions.history(&session);
    info!(session_id = %session, chars = message.chars().count(), "Chat message");
    let report = state.pipeline.chat(&message, &history).await?;
    Ok(Json(AnalysisResponse::chat(report)))
}

async fn chat_message(headers: &HeaderMap, request: Request) -> ApiResult<String> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        read_text_field(multipart, "message").await
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        let Form(body) = Form::<ChatBody>::from_request(request, &())
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        Ok(body.message)
    } else {
        let Json(body) = Json::<ChatBody>::from_request(request, &())
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        Ok(body.message)
    }
}

/// `POST /upload-image` with multipart `image` (+ optional `prompt`).
pub async fn upload_image(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<AnalysisResponse>> {
    let history = state.sessions.history(&session_id(&headers));
    let ws = state.pipeline.workspace()?;
    let upload = receive(multipart, &ws, "image", MediaKind::OriginalImage, MISSING_IMAGE).await?;
    let Some(image) = upload.file else {
        return Err(ApiError::bad_request(MISSING_IMAGE));
    };
    let report = state
        .pipeline
        .analyze_image(ws, image, &upload.prompt, &history)
        .await?;
    Ok(Json(AnalysisResponse::media(report)))
}

/// `POST /upload-video` with multipart `video` (+ optional `prompt`).
pub async fn upload_video(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<AnalysisResponse>> {
    let history = state.sessions.history(&session_id(&headers));
    let ws = state.pipeline.workspace()?;
    let upload = receive(multipart, &ws, "video", MediaKind::OriginalVideo, MISSING_VIDEO).await?;
    let Some(video) = upload.file else {
        return Err(ApiError::bad_request(MISSING_VIDEO));
    };
    let report = state
        .pipeline
        .analyze_video(ws, video, &upload.prompt, &history)
        .await?;
    Ok(Json(AnalysisResponse::media(report)))
}

/// `POST /upload-audio` with multipart `audio`.
pub async fn upload_audio(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<AnalysisResponse>> {
    let history = state.sessions.history(&session_id(&headers));
    let ws = state.pipeline.workspace()?;
    let upload = receive(multipart, &ws, "audio", MediaKind::OriginalAudio, MISSING_AUDIO).await?;
    let Some(audio) = upload.file else {
        return Err(ApiError::bad_request(MISSING_AUDIO));
    };
    let report = state.pipeline.analyze_audio(ws, audio, &history).await?;
    Ok(Json(AnalysisResponse::media(report)))
}

/// A request that is not multipart at all is treated as carrying no file.
async fn receive(
    multipart: Result<Multipart, MultipartRejection>,
    ws: &framewise_media::RequestWorkspace,
    field: &str,
    kind: MediaKind,
    missing: &str,
) -> ApiResult<Upload> {
    match multipart {
        Ok(multipart) => read_upload(multipart, ws, field, kind).await,
        Err(_) => Err(ApiError::bad_request(missing)),
    }
}
