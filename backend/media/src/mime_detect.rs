//! Extension-based MIME detection for the media the service accepts.
//!
//! Labels inline image payloads and routes CLI input to the right pipeline.
//! Uploads through the HTTP surface are routed by their form field instead.

use std::path::Path;

use framewise_core::MediaKind;

const UNKNOWN: &str = "application/octet-stream";

/// Lower-case extension → MIME type. Only media kinds we can analyse.
const KNOWN_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("bmp", "image/bmp"),
    ("heic", "image/heic"),
    ("mp3", "audio/mpeg"),
    ("ogg", "audio/ogg"),
    ("oga", "audio/ogg"),
    ("wav", "audio/wav"),
    ("flac", "audio/flac"),
    ("m4a", "audio/mp4"),
    ("opus", "audio/opus"),
    ("aac", "audio/aac"),
    ("mp4", "video/mp4"),
    ("m4v", "video/mp4"),
    ("webm", "video/webm"),
    ("mkv", "video/x-matroska"),
    ("mov", "video/quicktime"),
    ("avi", "video/x-msvideo"),
    ("3gp", "video/3gpp"),
];

pub fn detect_mime_type(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return UNKNOWN;
    };
    KNOWN_TYPES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        .map(|(_, mime)| *mime)
        .unwrap_or(UNKNOWN)
}

pub fn is_image(mime: &str) -> bool {
    mime.starts_with("image/")
}

pub fn is_audio(mime: &str) -> bool {
    mime.starts_with("audio/")
}

pub fn is_video(mime: &str) -> bool {
    mime.starts_with("video/")
}

/// Kind of original an upload with this MIME type represents.
pub fn original_kind(mime: &str) -> Option<MediaKind> {
    if is_video(mime) {
        Some(MediaKind::OriginalVideo)
    } else if is_image(mime) {
        Some(MediaKind::OriginalImage)
    } else if is_audio(mime) {
        Some(MediaKind::OriginalAudio)
    } else {
        None
    }
}

/// MIME type to declare in an inline `data:` URL for an image file.
///
/// Anything we cannot identify is sent as JPEG, which is what the frame
/// extractor produces.
pub fn image_data_mime(path: &Path) -> &'static str {
    let mime = detect_mime_type(path);
    if is_image(mime) { mime } else { "image/jpeg" }
}
