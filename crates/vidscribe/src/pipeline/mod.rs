//! Background processing of submitted videos.

pub mod capability;
pub mod error;
pub mod runner;
pub mod stage;

pub use capability::{AudioExtractor, Capabilities, TextGenerator, Transcriber};
pub use error::{ExtractionError, GenerationError, PipelineError, TranscriptionError};
pub use runner::Orchestrator;
pub use stage::Stage;
