use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument, Span};

use crate::db::DatabaseError;
use crate::job::{JobId, JobResult, JobStore, TransitionError, TransitionPolicy};
use crate::sanitize;
use crate::storage::remove_artifact;

use super::capability::Capabilities;
use super::error::PipelineError;
use super::stage::Stage;

struct Inner {
    store: JobStore,
    policy: TransitionPolicy,
    capabilities: Capabilities,
}

/// Drives jobs through extract, transcribe and generate.
///
/// Each submitted job runs on its own tokio task. Outcomes are only
/// observable through the job store. Cloning is cheap.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Orchestrator {
    pub fn new(store: JobStore, policy: TransitionPolicy, capabilities: Capabilities) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                policy,
                capabilities,
            }),
        }
    }

    pub fn store(&self) -> &JobStore {
        &self.inner.store
    }

    /// Creates a job for an already stored video and starts it in the
    /// background. Returns as soon as the job row exists.
    pub fn submit(&self, video: PathBuf) -> Result<JobId, DatabaseError> {
        let (job_id, _handle) = self.submit_with_handle(video)?;
        Ok(job_id)
    }

    /// Like [`Orchestrator::submit`] but hands back the task handle.
    pub fn submit_with_handle(
        &self,
        video: PathBuf,
    ) -> Result<(JobId, JoinHandle<()>), DatabaseError> {
        let job_id = self.inner.store.create_job()?;
        info!(job_id = %job_id, video = %sanitize::redact_path(&video), "Job submitted");

        let this = self.clone();
        let task_id = job_id.clone();
        let handle = tokio::spawn(async move {
            this.run(&task_id, &video).await;
        });

        Ok((job_id, handle))
    }

    /// Runs every stage for `job_id`. Never fails: the outcome is written to
    /// the job record and artifacts are cleaned up either way. A panicking
    /// capability counts as a failed stage.
    pub async fn run(&self, job_id: &JobId, video: &Path) {
        let span = info_span!("pipeline",
            job_id = %job_id,
            filename = %sanitize::redact_path(video),
        );

        async {
            let mut audio: Option<PathBuf> = None;

            let outcome = AssertUnwindSafe(self.execute(job_id, video, &mut audio))
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| Err(PipelineError::from_panic(payload)));

            match outcome {
                Ok(result) => {
                    let written = self
                        .record(job_id, move |policy, store, id| {
                            policy.complete(store, id, result)
                        })
                        .await;
                    match written {
                        Ok(_) => info!("Job completed"),
                        Err(e) => error!(error = %e, "Failed to record job completion"),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Job failed");
                    let message = e.to_string();
                    let written = self
                        .record(job_id, move |policy, store, id| {
                            policy.fail(store, id, &message)
                        })
                        .await;
                    if let Err(db_err) = written {
                        error!(error = %db_err, "Failed to record job failure");
                    }
                    remove_artifact(video).await;
                }
            }

            if let Some(audio) = audio {
                remove_artifact(&audio).await;
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        job_id: &JobId,
        video: &Path,
        audio: &mut Option<PathBuf>,
    ) -> Result<JobResult, PipelineError> {
        let caps = &self.inner.capabilities;

        self.checkpoint(job_id, Stage::ExtractAudio).await;
        let extracted = caps
            .extractor
            .extract(video)
            .instrument(info_span!("extract_audio"))
            .await?;
        *audio = Some(extracted.clone());
        remove_artifact(video).await;

        self.checkpoint(job_id, Stage::Transcribe).await;
        let transcription = caps
            .transcriber
            .transcribe(&extracted)
            .instrument(info_span!("transcribe"))
            .await?;
        debug!(chars = transcription.len(), "Transcription ready");

        self.checkpoint(job_id, Stage::Generate).await;
        let generated_response = caps
            .generator
            .generate(&transcription)
            .instrument(info_span!("generate_response"))
            .await?;
        debug!(chars = generated_response.len(), "Response ready");

        Ok(JobResult {
            transcription,
            generated_response,
        })
    }

    /// Records the start of a stage. A failed write is logged; the stage
    /// still runs.
    async fn checkpoint(&self, job_id: &JobId, stage: Stage) {
        debug!(stage = %stage, progress = stage.progress(), "Entering stage");
        let written = self
            .record(job_id, move |policy, store, id| {
                policy.advance(store, id, stage.step(), stage.progress(), stage.message())
            })
            .await;
        if let Err(e) = written {
            error!(stage = %stage, error = %e, "Failed to record stage progress");
        }
    }

    /// Runs a policy write on the blocking pool, so waiting on the database
    /// lock never parks a runtime worker.
    async fn record<F>(&self, job_id: &JobId, write: F) -> Result<usize, TransitionError>
    where
        F: FnOnce(&TransitionPolicy, &JobStore, &JobId) -> Result<usize, TransitionError>
            + Send
            + 'static,
    {
        let store = self.inner.store.clone();
        let policy = self.inner.policy;
        let job_id = job_id.clone();
        let span = Span::current();

        tokio::task::spawn_blocking(move || span.in_scope(|| write(&policy, &store, &job_id)))
            .await
            .unwrap_or_else(|e| Err(TransitionError::Task(e.to_string())))
    }
}
