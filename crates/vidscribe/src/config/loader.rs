use std::path::Path;

use crate::config::schema::{Config, GenerationConfig, CONFIG_VERSION};
use crate::error::ConfigError;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config = load_config_from_str(&content)?;
    tracing::debug!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != CONFIG_VERSION {
        return Err(invalid(format!(
            "Unsupported config version: {}",
            config.version
        )));
    }

    for (name, path) in [
        ("database_path", &config.database_path),
        ("upload_directory", &config.upload_directory),
        ("temp_directory", &config.temp_directory),
    ] {
        if path.as_os_str().is_empty() {
            return Err(invalid(format!("{} must not be empty", name)));
        }
    }

    if config.server.max_upload_mb == 0 {
        return Err(invalid("server.max_upload_mb must be greater than 0"));
    }

    if config.ffmpeg.binary.trim().is_empty() {
        return Err(invalid("ffmpeg.binary must not be empty"));
    }
    if config.ffmpeg.channels == 0 {
        return Err(invalid("ffmpeg.channels must be at least 1"));
    }
    if config.ffmpeg.sample_rate == 0 {
        return Err(invalid("ffmpeg.sample_rate must be greater than 0"));
    }

    if !config.openai.base_url.starts_with("http://")
        && !config.openai.base_url.starts_with("https://")
    {
        return Err(invalid(format!(
            "openai.base_url must be an http(s) URL, got '{}'",
            config.openai.base_url
        )));
    }
    if config.openai.timeout_secs == 0 {
        return Err(invalid("openai.timeout_secs must be greater than 0"));
    }

    if config.transcription.model.trim().is_empty() {
        return Err(invalid("transcription.model must not be empty"));
    }

    let generation = &config.generation;
    if generation.model.trim().is_empty() {
        return Err(invalid("generation.model must not be empty"));
    }
    if generation.max_tokens == 0 {
        return Err(invalid("generation.max_tokens must be greater than 0"));
    }
    if !(0.0..=2.0).contains(&generation.temperature) {
        return Err(invalid(format!(
            "generation.temperature must be between 0 and 2, got {}",
            generation.temperature
        )));
    }
    if generation.prompt_file.is_none() && generation.prompt.trim().is_empty() {
        return Err(invalid("generation.prompt must not be empty"));
    }

    Ok(())
}

/// Returns the generation prompt, reading `prompt_file` when set.
pub fn resolve_prompt(generation: &GenerationConfig) -> Result<String, ConfigError> {
    let Some(path) = &generation.prompt_file else {
        return Ok(generation.prompt.clone());
    };

    let prompt = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadPrompt {
        path: path.clone(),
        source: e,
    })?;

    if prompt.trim().is_empty() {
        return Err(invalid(format!(
            "prompt file '{}' is empty",
            path.display()
        )));
    }

    Ok(prompt)
}
