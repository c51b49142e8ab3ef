use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::io::AsyncWriteExt;

use crate::error::StorageError;

const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Keeps the file name safe for any filesystem: ASCII alphanumerics, dot,
/// dash and underscore survive, everything else becomes `_`.
fn safe_file_name(original: &str) -> String {
    let name = Path::new(original)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = cleaned.trim_matches('.');
    if trimmed.is_empty() {
        "video".to_string()
    } else {
        trimmed.to_string()
    }
}

fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(pos) if pos > 0 => (&name[..pos], Some(&name[pos..])),
        _ => (name, None),
    }
}

/// On-disk home of uploaded videos and extracted audio.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    upload_dir: PathBuf,
    temp_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(upload_dir: P, temp_dir: Q) -> Self {
        Self {
            upload_dir: upload_dir.as_ref().to_path_buf(),
            temp_dir: temp_dir.as_ref().to_path_buf(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Creates both directories if needed.
    pub async fn ensure_directories(&self) -> Result<(), StorageError> {
        for dir in [&self.upload_dir, &self.temp_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| StorageError::CreateDirectory {
                    path: dir.clone(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Writes an uploaded video under a name no other upload uses.
    ///
    /// Names look like `<millis>_<original>`; collisions get a `_N` suffix.
    /// The file is created with `create_new`, so two concurrent uploads can
    /// never share a path.
    pub async fn save_upload(
        &self,
        original_name: &str,
        content: &[u8],
    ) -> Result<PathBuf, StorageError> {
        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|e| StorageError::CreateDirectory {
                path: self.upload_dir.clone(),
                source: e,
            })?;

        let file_name = format!(
            "{}_{}",
            Utc::now().timestamp_millis(),
            safe_file_name(original_name)
        );
        let (base, ext) = split_extension(&file_name);

        for counter in 1..=MAX_NAME_ATTEMPTS {
            let candidate = if counter == 1 {
                file_name.clone()
            } else {
                format!("{}_{}{}", base, counter, ext.unwrap_or(""))
            };
            let path = self.upload_dir.join(&candidate);

            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(mut file) => {
                    let written = async {
                        file.write_all(content).await?;
                        file.flush().await
                    }
                    .await;

                    if let Err(e) = written {
                        drop(file);
                        let _ = tokio::fs::remove_file(&path).await;
                        return Err(StorageError::WriteFile { path, source: e });
                    }

                    log::debug!("Stored upload at {}", path.display());
                    return Ok(path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(StorageError::WriteFile { path, source: e }),
            }
        }

        Err(StorageError::FileExists(self.upload_dir.join(file_name)))
    }
}

/// Deletes an artifact, ignoring files that are already gone.
///
/// Returns true when a file was removed. Other failures are logged and
/// swallowed so cleanup never changes a job's outcome.
pub async fn remove_artifact(path: &Path) -> bool {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            log::debug!("Removed artifact {}", path.display());
            true
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => {
            let err = StorageError::RemoveFile {
                path: path.to_path_buf(),
                source: e,
            };
            log::warn!("{}", err);
            false
        }
    }
}
