//! External capabilities the pipeline depends on.
//!
//! The orchestrator only knows these traits; production adapters live in
//! [`crate::engine`], tests plug in fakes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use super::error::{ExtractionError, GenerationError, TranscriptionError};

/// Turns a stored video into an audio artifact.
#[async_trait]
pub trait AudioExtractor: Send + Sync {
    /// Returns the path of the produced audio file. On failure no partial
    /// output is left behind.
    async fn extract(&self, video: &Path) -> Result<PathBuf, ExtractionError>;
}

/// Speech to text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &Path) -> Result<String, TranscriptionError>;
}

/// Produces the analysis text for a transcript.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, transcript: &str) -> Result<String, GenerationError>;
}

/// The set of capabilities one orchestrator runs with.
#[derive(Clone)]
pub struct Capabilities {
    pub extractor: Arc<dyn AudioExtractor>,
    pub transcriber: Arc<dyn Transcriber>,
    pub generator: Arc<dyn TextGenerator>,
}

impl Capabilities {
    pub fn new(
        extractor: Arc<dyn AudioExtractor>,
        transcriber: Arc<dyn Transcriber>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            extractor,
            transcriber,
            generator,
        }
    }
}
