//! Upload validation and storage.

use std::path::{Path, PathBuf};

use crate::error::ValidationError;
use crate::storage::ArtifactStore;

/// Accepted content types. The short `video/avi` style names are what most
/// browsers send; the registered names are what `mime_guess` reports.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "video/mp4",
    "video/avi",
    "video/mov",
    "video/mkv",
    "video/webm",
    "video/x-msvideo",
    "video/quicktime",
    "video/x-matroska",
];

pub const ALLOWED_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "webm"];

const GENERIC_CONTENT_TYPES: &[&str] = &["application/octet-stream", "binary/octet-stream"];

/// A video as received from a client.
#[derive(Debug, Clone)]
pub struct VideoUpload {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl VideoUpload {
    pub fn new(filename: Option<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename,
            content_type,
            bytes,
        }
    }

    /// Name used when storing the file.
    pub fn display_name(&self) -> &str {
        self.filename.as_deref().unwrap_or("video")
    }
}

fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

fn extension_allowed(filename: &str) -> bool {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => true,
        _ => mime_guess::from_path(filename)
            .iter()
            .any(|m| ALLOWED_CONTENT_TYPES.contains(&m.essence_str())),
    }
}

/// Checks an upload before anything is written.
///
/// A missing or generic content type falls back to the file extension.
pub fn validate(upload: &VideoUpload) -> Result<(), ValidationError> {
    if upload.bytes.is_empty() {
        return Err(ValidationError::EmptyPayload);
    }

    let declared = upload
        .content_type
        .as_deref()
        .map(essence)
        .filter(|ct| !ct.is_empty());

    match declared {
        Some(ct) if ALLOWED_CONTENT_TYPES.contains(&ct.as_str()) => Ok(()),
        Some(ct) if !GENERIC_CONTENT_TYPES.contains(&ct.as_str()) => {
            Err(ValidationError::UnsupportedType(ct))
        }
        declared => match upload.filename.as_deref() {
            Some(name) if extension_allowed(name) => Ok(()),
            Some(name) => Err(ValidationError::UnsupportedType(
                declared.unwrap_or_else(|| name.to_string()),
            )),
            None => Err(ValidationError::UnsupportedType(
                declared.unwrap_or_else(|| "unknown".to_string()),
            )),
        },
    }
}

/// Validates and stores uploads.
#[derive(Debug, Clone)]
pub struct VideoIngestor {
    artifacts: ArtifactStore,
}

impl VideoIngestor {
    pub fn new(artifacts: ArtifactStore) -> Self {
        Self { artifacts }
    }

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    /// Validates `upload` and writes it to the upload directory.
    pub async fn accept(&self, upload: &VideoUpload) -> crate::Result<PathBuf> {
        validate(upload)?;
        let path = self
            .artifacts
            .save_upload(upload.display_name(), &upload.bytes)
            .await?;
        tracing::info!(
            size = upload.bytes.len(),
            filename = %crate::sanitize::redact_path(&path),
            "Stored uploaded video"
        );
        Ok(path)
    }

    /// Removes a stored upload that never made it into a job.
    pub async fn discard(&self, path: &Path) {
        crate::storage::remove_artifact(path).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn upload(name: Option<&str>, ct: Option<&str>, bytes: &[u8]) -> VideoUpload {
        VideoUpload::new(
            name.map(str::to_string),
            ct.map(str::to_string),
            bytes.to_vec(),
        )
    }

    #[test]
    fn test_accepts_listed_types() {
        for ct in ["video/mp4", "video/webm", "video/quicktime", "VIDEO/MP4; codecs=avc1"] {
            assert_eq!(validate(&upload(Some("a.bin"), Some(ct), b"x")), Ok(()), "{}", ct);
        }
    }

    #[test]
    fn test_rejects_empty_payload() {
        assert_eq!(
            validate(&upload(Some("a.mp4"), Some("video/mp4"), b"")),
            Err(ValidationError::EmptyPayload)
        );
    }

    #[test]
    fn test_rejects_other_types() {
        assert_eq!(
            validate(&upload(Some("a.mp4"), Some("image/png"), b"x")),
            Err(ValidationError::UnsupportedType("image/png".to_string()))
        );
    }

    #[test]
    fn test_generic_type_falls_back_to_extension() {
        assert_eq!(
            validate(&upload(Some("clase.MKV"), Some("application/octet-stream"), b"x")),
            Ok(())
        );
        assert!(validate(&upload(Some("notes.txt"), Some("application/octet-stream"), b"x")).is_err());
    }

    #[test]
    fn test_missing_type_uses_extension() {
        assert_eq!(validate(&upload(Some("talk.avi"), None, b"x")), Ok(()));
        assert!(matches!(
            validate(&upload(Some("talk.exe"), None, b"x")),
            Err(ValidationError::UnsupportedType(_))
        ));
        assert!(validate(&upload(None, None, b"x")).is_err());
    }

    #[tokio::test]
    async fn test_accept_stores_valid_upload() {
        let dir = TempDir::new().unwrap();
        let ingestor = VideoIngestor::new(ArtifactStore::new(
            dir.path().join("uploads"),
            dir.path().join("temp"),
        ));

        let path = ingestor
            .accept(&upload(Some("talk.mp4"), Some("video/mp4"), b"frames"))
            .await
            .unwrap();
        assert!(path.exists());

        ingestor.discard(&path).await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_accept_rejects_before_writing() {
        let dir = TempDir::new().unwrap();
        let ingestor = VideoIngestor::new(ArtifactStore::new(
            dir.path().join("uploads"),
            dir.path().join("temp"),
        ));

        let err = ingestor
            .accept(&upload(Some("a.gif"), Some("image/gif"), b"x"))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::VidscribeError::Validation(_)));
        assert!(!dir.path().join("uploads").exists());
    }
}
