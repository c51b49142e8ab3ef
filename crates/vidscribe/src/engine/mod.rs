//! Production implementations of the pipeline capabilities.

pub mod ffmpeg;
pub mod openai;

pub use ffmpeg::FfmpegExtractor;
pub use openai::{OpenAiClient, OpenAiGenerator, OpenAiTranscriber};
