use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::FfmpegConfig;
use crate::pipeline::{AudioExtractor, ExtractionError};
use crate::sanitize;
use crate::storage::remove_artifact;

const STDERR_TAIL_CHARS: usize = 500;

/// Extracts a mono audio track with the `ffmpeg` binary.
#[derive(Debug, Clone)]
pub struct FfmpegExtractor {
    config: FfmpegConfig,
    output_dir: PathBuf,
}

impl FfmpegExtractor {
    pub fn new(config: FfmpegConfig, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            output_dir: output_dir.into(),
        }
    }

    /// Output path for `video`: `<output_dir>/<stem>_<random>.<format>`.
    pub fn output_path_for(&self, video: &Path) -> PathBuf {
        let stem = video
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("audio");
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        self.output_dir.join(format!(
            "{}_{}.{}",
            stem,
            &suffix[..8],
            self.config.format
        ))
    }

    /// Arguments passed to ffmpeg, in order.
    pub fn command_args(&self, video: &Path, audio: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-i".to_string(),
            video.to_string_lossy().into_owned(),
            "-vn".to_string(),
            "-acodec".to_string(),
            self.config.codec.clone(),
            "-ac".to_string(),
            self.config.channels.to_string(),
            "-ar".to_string(),
            self.config.sample_rate.to_string(),
            "-f".to_string(),
            self.config.format.clone(),
            audio.to_string_lossy().into_owned(),
        ]
    }
}

#[async_trait]
impl AudioExtractor for FfmpegExtractor {
    async fn extract(&self, video: &Path) -> Result<PathBuf, ExtractionError> {
        if !tokio::fs::try_exists(video).await.unwrap_or(false) {
            return Err(ExtractionError::InputMissing(video.to_path_buf()));
        }

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| ExtractionError::OutputDirectory {
                path: self.output_dir.clone(),
                source: e,
            })?;

        let audio = self.output_path_for(video);
        debug!(
            binary = %self.config.binary,
            output = %sanitize::redact_path(&audio),
            "Running ffmpeg"
        );

        let output = Command::new(&self.config.binary)
            .args(self.command_args(video, &audio))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ExtractionError::Spawn {
                binary: self.config.binary.clone(),
                source: e,
            })?;

        if !output.status.success() {
            remove_artifact(&audio).await;
            return Err(ExtractionError::Failed {
                status: output.status.to_string(),
                stderr: sanitize::tail(&String::from_utf8_lossy(&output.stderr), STDERR_TAIL_CHARS),
            });
        }

        info!(output = %sanitize::redact_path(&audio), "Audio extracted");
        Ok(audio)
    }
}
