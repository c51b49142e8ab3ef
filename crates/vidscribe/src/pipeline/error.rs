use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Video file not found: {0}")]
    InputMissing(PathBuf),

    #[error("Failed to start {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Audio extraction failed ({status}): {stderr}")]
    Failed { status: String, stderr: String },

    #[error("Failed to prepare output directory '{path}': {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum TranscriptionError {
    #[error("Failed to read audio file '{path}': {source}")]
    ReadAudio {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Transcription request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Transcription API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Transcription returned no text")]
    EmptyTranscript,
}

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Generation request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Generation API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Generation returned no content")]
    EmptyResponse,
}

/// A failed pipeline stage. Converted into the job's terminal error state.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Audio extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Transcription failed: {0}")]
    Transcription(#[from] TranscriptionError),

    #[error("Response generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("Processing aborted unexpectedly: {0}")]
    Panicked(String),
}

impl PipelineError {
    /// Builds a [`PipelineError::Panicked`] from a caught panic payload.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "panic with non-string payload".to_string()
        };
        PipelineError::Panicked(message)
    }
}
