//! Scriptable stand-ins for the pipeline capabilities.
//!
//! Each fake can be held on a [`Gate`] so a test can observe the job while
//! the stage is in flight, and can be told to fail.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use vidscribe::pipeline::{
    AudioExtractor, ExtractionError, GenerationError, TextGenerator, TranscriptionError,
    Transcriber,
};

/// One-shot permits handed from the test to a running stage.
pub struct Gate {
    tx: mpsc::UnboundedSender<()>,
    rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<()>>,
}

impl Gate {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: tokio::sync::Mutex::new(rx),
        }
    }

    /// Lets one waiting (or future) stage invocation through.
    pub fn open(&self) {
        let _ = self.tx.send(());
    }

    async fn wait(&self) {
        self.rx.lock().await.recv().await;
    }
}

async fn pass(gate: &Option<Gate>) {
    if let Some(gate) = gate {
        gate.wait().await;
    }
}

/// Writes `<audio_dir>/<stem>.mp3`.
pub struct FakeExtractor {
    pub audio_dir: PathBuf,
    pub gate: Option<Gate>,
    pub failure: Option<String>,
}

#[async_trait]
impl AudioExtractor for FakeExtractor {
    async fn extract(&self, video: &Path) -> Result<PathBuf, ExtractionError> {
        pass(&self.gate).await;

        if !video.exists() {
            return Err(ExtractionError::InputMissing(video.to_path_buf()));
        }
        if let Some(stderr) = &self.failure {
            return Err(ExtractionError::Failed {
                status: "exit status: 1".to_string(),
                stderr: stderr.clone(),
            });
        }

        let stem = video
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("audio");
        let audio = self.audio_dir.join(format!("{}.mp3", stem));
        std::fs::create_dir_all(&self.audio_dir).map_err(|e| ExtractionError::OutputDirectory {
            path: self.audio_dir.clone(),
            source: e,
        })?;
        std::fs::write(&audio, b"ID3").map_err(|e| ExtractionError::OutputDirectory {
            path: audio.clone(),
            source: e,
        })?;
        Ok(audio)
    }
}

/// Returns a fixed transcript and notes what was left in the upload
/// directory when transcription started.
pub struct FakeTranscriber {
    pub upload_dir: PathBuf,
    pub gate: Option<Gate>,
    pub failure: Option<u16>,
    pub uploads_at_start: Mutex<Vec<usize>>,
}

pub const TRANSCRIPT: &str = "Hola a todos, hoy vamos a hablar de Rust.";

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, audio: &Path) -> Result<String, TranscriptionError> {
        let uploads = std::fs::read_dir(&self.upload_dir)
            .map(|entries| entries.count())
            .unwrap_or(0);
        if let Ok(mut seen) = self.uploads_at_start.lock() {
            seen.push(uploads);
        }

        pass(&self.gate).await;

        if !audio.exists() {
            return Err(TranscriptionError::ReadAudio {
                path: audio.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
        if let Some(status) = self.failure {
            return Err(TranscriptionError::Api {
                status,
                body: "rate limited".to_string(),
            });
        }
        Ok(TRANSCRIPT.to_string())
    }
}

/// Wraps the transcript in a small markdown report.
pub struct FakeGenerator {
    pub gate: Option<Gate>,
    pub failure: bool,
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, transcript: &str) -> Result<String, GenerationError> {
        pass(&self.gate).await;

        if self.failure {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(format!("# Informe\n\n> {}", transcript))
    }
}
