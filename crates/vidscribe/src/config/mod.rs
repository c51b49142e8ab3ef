pub mod loader;
pub mod schema;

pub use loader::{load_config, load_config_from_str, resolve_prompt, validate_config};
pub use schema::{
    Config, FfmpegConfig, GenerationConfig, OpenAiConfig, ServerConfig, TranscriptionConfig,
};
