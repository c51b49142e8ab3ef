//! Caller-facing operations: submit a video, poll a job.

pub mod status;

use std::sync::Arc;

use serde::Serialize;

use crate::config::{resolve_prompt, Config};
use crate::engine::{FfmpegExtractor, OpenAiClient, OpenAiGenerator, OpenAiTranscriber};
use crate::error::{Result, ValidationError};
use crate::ingest::{VideoIngestor, VideoUpload};
use crate::job::{Job, JobCounts, JobId, JobStore, TransitionPolicy};
use crate::pipeline::{Capabilities, Orchestrator};
use crate::secrets;
use crate::storage::ArtifactStore;

pub use status::StatusQueryService;

/// Handed back as soon as a job is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReceipt {
    pub job_id: JobId,
}

/// Submission and polling over one job store.
#[derive(Clone)]
pub struct JobService {
    ingestor: VideoIngestor,
    orchestrator: Orchestrator,
    status: StatusQueryService,
}

impl JobService {
    pub fn new(
        store: JobStore,
        policy: TransitionPolicy,
        artifacts: ArtifactStore,
        capabilities: Capabilities,
    ) -> Self {
        Self {
            ingestor: VideoIngestor::new(artifacts),
            orchestrator: Orchestrator::new(store.clone(), policy, capabilities),
            status: StatusQueryService::new(store),
        }
    }

    /// Builds the production service: ffmpeg extraction plus the OpenAI
    /// adapters, over an already opened store.
    pub async fn from_config(config: &Config, store: JobStore) -> Result<Self> {
        let artifacts = ArtifactStore::new(&config.upload_directory, &config.temp_directory);
        artifacts.ensure_directories().await?;

        let api_key = secrets::resolve_secret(
            config.openai.api_key.as_deref(),
            config.openai.api_key_file.as_deref(),
            config.openai.api_key_env.as_deref(),
        )?;
        let client = OpenAiClient::new(&config.openai, api_key)?;
        let prompt = resolve_prompt(&config.generation)?;

        let capabilities = Capabilities::new(
            Arc::new(FfmpegExtractor::new(
                config.ffmpeg.clone(),
                &config.temp_directory,
            )),
            Arc::new(OpenAiTranscriber::new(
                client.clone(),
                config.transcription.clone(),
            )),
            Arc::new(OpenAiGenerator::new(
                client,
                config.generation.clone(),
                prompt,
            )),
        );

        Ok(Self::new(
            store,
            TransitionPolicy::new(config.reset_progress_on_failure),
            artifacts,
            capabilities,
        ))
    }

    /// Validates and stores the upload, creates the job and starts the
    /// pipeline in the background.
    ///
    /// Validation failures create no job. If the job row cannot be written
    /// the stored video is removed again.
    pub async fn submit(&self, upload: Option<VideoUpload>) -> Result<SubmitReceipt> {
        let upload = upload.ok_or(ValidationError::MissingPayload)?;
        let video = self.ingestor.accept(&upload).await?;

        match self.orchestrator.submit(video.clone()) {
            Ok(job_id) => Ok(SubmitReceipt { job_id }),
            Err(e) => {
                tracing::error!(error = %e, "Failed to create job for stored upload");
                self.ingestor.discard(&video).await;
                Err(e.into())
            }
        }
    }

    pub fn poll(&self, job_id: &JobId) -> Result<Option<Job>> {
        Ok(self.status.get_status(job_id)?)
    }

    pub fn counts(&self) -> Result<JobCounts> {
        Ok(self.orchestrator.store().counts()?)
    }

    pub fn status(&self) -> &StatusQueryService {
        &self.status
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn store(&self) -> &JobStore {
        self.orchestrator.store()
    }
}
