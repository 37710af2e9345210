//! Multipart upload intake.
//!
//! Streams the named file field straight into the request workspace and
//! collects the optional `prompt` text field. Field order does not matter.

use axum::extract::Multipart;
use tracing::debug;

use framewise_core::{MediaAsset, MediaKind};
use framewise_media::RequestWorkspace;

use crate::error::ApiError;

pub const PROMPT_FIELD: &str = "prompt";

#[derive(Debug, Default)]
pub struct Upload {
    pub file: Option<MediaAsset>,
    pub prompt: String,
}

/// Read every field of `multipart`, saving the first non-empty `file_field`.
pub async fn read_upload(
    mut multipart: Multipart,
    ws: &RequestWorkspace,
    file_field: &str,
    kind: MediaKind,
) -> Result<Upload, ApiError> {
    let mut upload = Upload::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == PROMPT_FIELD {
            upload.prompt = field
                .text()
                .await
                .map_err(|e| ApiError::bad_request(e.to_string()))?;
        } else if name == file_field && upload.file.is_none() {
            let file_name = field.file_name().map(str::to_owned);
            if file_name.as_deref().is_none_or(str::is_empty) {
                continue;
            }
            let asset = ws.save(field, file_name.as_deref(), kind).await?;
            let size = tokio::fs::metadata(asset.path()).await.map(|m| m.len()).unwrap_or(0);
            if size == 0 {
                debug!(field = %name, "Ignoring empty file part");
                continue;
            }
            upload.file = Some(asset);
        } else {
            debug!(field = %name, "Ignoring unexpected multipart field");
        }
    }

    Ok(upload)
}

/// Value of the first text field called `name`; empty when it is absent.
pub async fn read_text_field(mut multipart: Multipart, name: &str) -> Result<String, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?
    {
        if field.name() == Some(name) {
            return field
                .text()
                .await
                .map_err(|e| ApiError::bad_request(e.to_string()));
        }
    }
    Ok(String::new())
}
