use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const CONFIG_VERSION: &str = "1.0";

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "Eres un asistente útil que analiza transcripciones de audio según las instrucciones del usuario.";

pub const DEFAULT_PROMPT: &str = "Analiza la siguiente transcripción y genera un informe \
estructurado en formato markdown con los temas tratados, los puntos clave y las conclusiones.";

fn vidscribe_home() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".vidscribe"))
        .unwrap_or_else(|| PathBuf::from(".vidscribe"))
}

fn default_version() -> String {
    CONFIG_VERSION.to_string()
}

fn default_database_path() -> PathBuf {
    crate::db::default_database_path().unwrap_or_else(|| PathBuf::from("data/jobs.db"))
}

fn default_upload_directory() -> PathBuf {
    vidscribe_home().join("uploads")
}

fn default_temp_directory() -> PathBuf {
    std::env::temp_dir().join("vidscribe")
}

fn default_retention_hours() -> u64 {
    24
}

fn default_sweep_interval_minutes() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    #[serde(default = "default_upload_directory")]
    pub upload_directory: PathBuf,
    #[serde(default = "default_temp_directory")]
    pub temp_directory: PathBuf,
    /// Jobs older than this are swept. 0 keeps jobs forever.
    #[serde(default = "default_retention_hours")]
    pub retention_hours: u64,
    /// 0 disables the periodic sweep; the startup sweep still runs.
    #[serde(default = "default_sweep_interval_minutes")]
    pub sweep_interval_minutes: u64,
    #[serde(default = "default_true")]
    pub reset_progress_on_failure: bool,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ffmpeg: FfmpegConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub transcription: TranscriptionConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            database_path: default_database_path(),
            upload_directory: default_upload_directory(),
            temp_directory: default_temp_directory(),
            retention_hours: default_retention_hours(),
            sweep_interval_minutes: default_sweep_interval_minutes(),
            reset_progress_on_failure: true,
            server: ServerConfig::default(),
            ffmpeg: FfmpegConfig::default(),
            openai: OpenAiConfig::default(),
            transcription: TranscriptionConfig::default(),
            generation: GenerationConfig::default(),
        }
    }
}

impl Config {
    /// Overrides paths from `DATABASE_PATH`, `UPLOAD_DIR` and `TEMP_DIR`.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    pub(crate) fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(path) = value("DATABASE_PATH") {
            self.database_path = PathBuf::from(path);
        }
        if let Some(path) = value("UPLOAD_DIR") {
            self.upload_directory = PathBuf::from(path);
        }
        if let Some(path) = value("TEMP_DIR") {
            self.temp_directory = PathBuf::from(path);
        }
    }

    pub fn retention(&self) -> Option<chrono::Duration> {
        match self.retention_hours {
            0 => None,
            hours => i64::try_from(hours).ok().map(chrono::Duration::hours),
        }
    }

    pub fn sweep_interval(&self) -> Option<std::time::Duration> {
        match self.sweep_interval_minutes {
            0 => None,
            minutes => Some(std::time::Duration::from_secs(minutes.saturating_mul(60))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: u64,
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_max_upload_mb() -> u64 {
    500
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_mb: default_max_upload_mb(),
        }
    }
}

impl ServerConfig {
    pub fn max_upload_bytes(&self) -> usize {
        usize::try_from(self.max_upload_mb.saturating_mul(1024 * 1024)).unwrap_or(usize::MAX)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FfmpegConfig {
    #[serde(default = "default_ffmpeg_binary")]
    pub binary: String,
    #[serde(default = "default_codec")]
    pub codec: String,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_channels")]
    pub channels: u8,
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_ffmpeg_binary() -> String {
    "ffmpeg".to_string()
}

fn default_codec() -> String {
    "libmp3lame".to_string()
}

fn default_sample_rate() -> u32 {
    16_000
}

fn default_channels() -> u8 {
    1
}

fn default_format() -> String {
    "mp3".to_string()
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            binary: default_ffmpeg_binary(),
            codec: default_codec(),
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            format: default_format(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Direct key; prefer `api_key_file` or `api_key_env` outside local testing.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_key_file: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> Option<String> {
    Some("OPENAI_API_KEY".to_string())
}

fn default_timeout_secs() -> u64 {
    600
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            api_key_file: None,
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    #[serde(default = "default_transcription_model")]
    pub model: String,
    /// ISO-639-1 code; `None` lets the service detect it.
    #[serde(default = "default_language")]
    pub language: Option<String>,
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

fn default_language() -> Option<String> {
    Some("es".to_string())
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            model: default_transcription_model(),
            language: default_language(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default = "default_prompt")]
    pub prompt: String,
    /// Replaces `prompt` with the contents of this file.
    #[serde(default)]
    pub prompt_file: Option<PathBuf>,
}

fn default_generation_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    3000
}

fn default_temperature() -> f32 {
    0.7
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_prompt() -> String {
    DEFAULT_PROMPT.to_string()
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_generation_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            system_prompt: default_system_prompt(),
            prompt: default_prompt(),
            prompt_file: None,
        }
    }
}
