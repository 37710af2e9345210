//! Temporary media storage.
//!
//! Every request works inside its own `RequestWorkspace`, a directory under
//! the store root that is deleted when the workspace is closed or dropped.
//! Nothing outside that directory is ever touched, so concurrent requests
//! cannot clobber each other's frames.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use chrono::Utc;
use futures::{Stream, StreamExt};
use tempfile::TempDir;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use framewise_core::{FramewiseError, MediaAsset, MediaKind};

/// Root directory holding per-request workspaces.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    /// Create the root directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, FramewiseError> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        debug!(root = %root.display(), "Media store ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Allocate an isolated directory for one request.
    pub fn workspace(&self) -> Result<RequestWorkspace, FramewiseError> {
        let id = Uuid::new_v4().simple().to_string();
        let dir = tempfile::Builder::new()
            .prefix(&format!("req-{id}-"))
            .tempdir_in(&self.root)?;
        debug!(request_id = %id, dir = %dir.path().display(), "Allocated request workspace");
        Ok(RequestWorkspace { id, dir })
    }
}

/// Scoped working directory for one request; removed on drop.
#[derive(Debug)]
pub struct RequestWorkspace {
    id: String,
    dir: TempDir,
}

impl RequestWorkspace {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Persist an upload stream under a collision-resistant name.
    pub async fn save<S, E>(
        &self,
        stream: S,
        original_name: Option<&str>,
        kind: MediaKind,
    ) -> Result<MediaAsset, FramewiseError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
    {
        let path = self.path().join(unique_file_name(original_name));
        let mut file = fs::File::create(&path).await?;
        let mut stream = std::pin::pin!(stream);
        let mut written = 0usize;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| FramewiseError::Input(format!("upload interrupted: {e}")))?;
            written += chunk.len();
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        info!(
            request_id = %self.id,
            path = %path.display(),
            bytes = written,
            kind = ?kind,
            "Stored upload"
        );
        Ok(MediaAsset::new(path, kind))
    }

    /// Persist an in-memory buffer (CLI input, tests).
    pub async fn save_bytes(
        &self,
        data: impl Into<Bytes>,
        original_name: Option<&str>,
        kind: MediaKind,
    ) -> Result<MediaAsset, FramewiseError> {
        let chunk: Result<Bytes, std::convert::Infallible> = Ok(data.into());
        self.save(futures::stream::iter([chunk]), original_name, kind).await
    }

    /// Output location of the `index`-th sampled frame (1-based).
    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.path().join(format!("frame{index}.jpg"))
    }

    /// Output location of the extracted audio track.
    pub fn audio_path(&self) -> PathBuf {
        self.path()
            .join(format!("{}-audio.mp3", Utc::now().timestamp_millis()))
    }

    /// Delete the workspace now. Failures are logged and swallowed.
    pub async fn close(self) {
        let path = self.dir.path().to_path_buf();
        match fs::remove_dir_all(&path).await {
            Ok(()) => debug!(request_id = %self.id, "Removed request workspace"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(request_id = %self.id, path = %path.display(), error = %e, "Failed to remove request workspace"),
        }
        // TempDir's own drop retries the removal and ignores the result.
    }
}

/// Delete each asset, ignoring individual failures.
pub async fn cleanup(assets: &[MediaAsset]) {
    for asset in assets {
        if let Err(e) = fs::remove_file(&asset.path).await {
            debug!(path = %asset.path.display(), error = %e, "Ignoring cleanup failure");
        }
    }
}

/// `<millis>-<random>` plus the original extension, if any.
pub fn unique_file_name(original_name: Option<&str>) -> String {
    let ext = original_name
        .and_then(|n| Path::new(n).extension())
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default();
    let suffix = &Uuid::new_v4().simple().to_string()[..8];
    format!("{}-{suffix}{ext}", Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn unique_names_keep_extension() {
        let name = unique_file_name(Some("holiday clip.MP4"));
        assert!(name.ends_with(".mp4"));
        assert!(!name.contains(' '));
        assert!(!unique_file_name(None).contains('.'));
        assert!(!unique_file_name(Some("../../etc/passwd")).contains('/'));
    }

    #[test]
    fn unique_names_do_not_collide() {
        let names: HashSet<_> = (0..500).map(|_| unique_file_name(Some("a.jpg"))).collect();
        assert_eq!(names.len(), 500);
    }

    #[tokio::test]
    async fn workspace_is_removed_on_close() {
        let root = tempfile::tempdir().unwrap();
        let store = MediaStore::open(root.path()).await.unwrap();
        let ws = store.workspace().unwrap();
        let asset = ws
            .save_bytes(b"fake video".to_vec(), Some("x.mp4"), MediaKind::OriginalVideo)
            .await
            .unwrap();
        assert!(asset.path.exists());
        assert!(asset.path.starts_with(ws.path()));

        let dir = ws.path().to_path_buf();
        ws.close().await;
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn workspace_is_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let store = MediaStore::open(root.path()).await.unwrap();
        let dir = {
            let ws = store.workspace().unwrap();
            std::fs::write(ws.frame_path(1), b"jpeg").unwrap();
            ws.path().to_path_buf()
        };
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn workspaces_are_isolated() {
        let root = tempfile::tempdir().unwrap();
        let store = MediaStore::open(root.path()).await.unwrap();
        let a = store.workspace().unwrap();
        let b = store.workspace().unwrap();
        assert_ne!(a.path(), b.path());
        assert_ne!(a.frame_path(1), b.frame_path(1));
    }

    #[tokio::test]
    async fn cleanup_survives_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("present.jpg");
        std::fs::write(&present, b"x").unwrap();
        let assets = vec![
            MediaAsset::new(dir.path().join("already-gone.jpg"), MediaKind::ExtractedFrame),
            MediaAsset::new(&present, MediaKind::ExtractedFrame),
        ];
        cleanup(&assets).await;
        assert!(!present.exists());
    }

    #[tokio::test]
    async fn interrupted_upload_is_input_error() {
        let root = tempfile::tempdir().unwrap();
        let store = MediaStore::open(root.path()).await.unwrap();
        let ws = store.workspace().unwrap();
        let chunks: Vec<Result<Bytes, String>> =
            vec![Ok(Bytes::from_static(b"part")), Err("connection reset".to_string())];
        let err = ws
            .save(futures::stream::iter(chunks), Some("a.mp4"), MediaKind::OriginalVideo)
            .await
            .unwrap_err();
        assert!(err.is_client_error());
    }
}
