//! OpenAI-compatible HTTP adapters for transcription and text generation.
//!
//! `base_url` may point at any server speaking the same API
//! (`/audio/transcriptions` and `/chat/completions`).

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{GenerationConfig, OpenAiConfig, TranscriptionConfig};
use crate::pipeline::{GenerationError, TextGenerator, TranscriptionError, Transcriber};
use crate::sanitize;

const ERROR_BODY_CHARS: usize = 500;

/// Authenticated HTTP client shared by both adapters.
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl OpenAiClient {
    pub fn new(config: &OpenAiConfig, api_key: SecretString) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .post(self.endpoint(path))
            .bearer_auth(self.api_key.expose_secret())
    }
}

/// Reads an error response body, bounded for job error strings.
async fn error_body(response: reqwest::Response) -> String {
    let body = response.text().await.unwrap_or_default();
    sanitize::head(&body, ERROR_BODY_CHARS)
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

/// Speech to text through `/audio/transcriptions`.
pub struct OpenAiTranscriber {
    client: OpenAiClient,
    config: TranscriptionConfig,
}

impl OpenAiTranscriber {
    pub fn new(client: OpenAiClient, config: TranscriptionConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl Transcriber for OpenAiTranscriber {
    async fn transcribe(&self, audio: &Path) -> Result<String, TranscriptionError> {
        let data = tokio::fs::read(audio)
            .await
            .map_err(|e| TranscriptionError::ReadAudio {
                path: audio.to_path_buf(),
                source: e,
            })?;

        let file_name = audio
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.mp3")
            .to_string();
        let mime = mime_guess::from_path(audio)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        debug!(bytes = data.len(), model = %self.config.model, "Uploading audio for transcription");

        let part = Part::bytes(data).file_name(file_name).mime_str(&mime)?;
        let mut form = Form::new()
            .part("file", part)
            .text("model", self.config.model.clone());
        if let Some(language) = &self.config.language {
            form = form.text("language", language.clone());
        }

        let response = self
            .client
            .post("audio/transcriptions")
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranscriptionError::Api {
                status: status.as_u16(),
                body: error_body(response).await,
            });
        }

        let body: TranscriptionResponse = response.json().await?;
        let text = body.text.trim().to_string();
        if text.is_empty() {
            return Err(TranscriptionError::EmptyTranscript);
        }

        info!(chars = text.len(), "Transcription completed");
        Ok(text)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Report generation through `/chat/completions`.
pub struct OpenAiGenerator {
    client: OpenAiClient,
    config: GenerationConfig,
    prompt: String,
}

impl OpenAiGenerator {
    /// `prompt` is the resolved instruction text (inline or from file).
    pub fn new(client: OpenAiClient, config: GenerationConfig, prompt: String) -> Self {
        Self {
            client,
            config,
            prompt,
        }
    }

    fn messages(&self, transcript: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage {
                role: "system".to_string(),
                content: self.config.system_prompt.clone(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: user_message(&self.prompt, transcript),
            },
        ]
    }
}

fn user_message(prompt: &str, transcript: &str) -> String {
    format!(
        "Prompt del usuario: {}\n\nTexto transcrito del audio: {}\n\n\
         Responde según las instrucciones del prompt utilizando el texto transcrito.",
        prompt.trim(),
        transcript
    )
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, transcript: &str) -> Result<String, GenerationError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: self.messages(transcript),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        debug!(model = %self.config.model, "Requesting chat completion");

        let response = self
            .client
            .post("chat/completions")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body: error_body(response).await,
            });
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(GenerationError::EmptyResponse)?;

        info!(chars = content.len(), "Response generated");
        Ok(content)
    }
}
