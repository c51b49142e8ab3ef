//! Status transition policy.
//!
//! Every mutation of a job record goes through [`TransitionPolicy`], which
//! turns a [`JobUpdate`] into a normalized [`JobPatch`] and writes it through
//! the [`JobStore`]. Patches are guarded on `status = processing`, so a job
//! that reached completed or error never changes again.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db::job_repo::JobPatch;
use crate::db::DatabaseError;

use super::model::{JobId, JobResult, JobStatus, JobStep};
use super::store::JobStore;

pub const COMPLETED_MESSAGE: &str = "Processing completed successfully";
pub const FAILED_MESSAGE: &str = "Processing failed";
const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Error, Debug)]
pub enum TransitionError {
    #[error("Invalid transition: {0}")]
    Invalid(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// The blocking task running the write did not finish.
    #[error("Store write task failed: {0}")]
    Task(String),
}

/// Partial update of a job. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub step: Option<JobStep>,
    pub progress: Option<u8>,
    pub message: Option<String>,
    pub error: Option<String>,
    pub result: Option<JobResult>,
}

impl JobUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the job to a pipeline stage.
    pub fn stage(step: JobStep, progress: u8, message: impl Into<String>) -> Self {
        Self::new().step(step).progress(progress).message(message)
    }

    pub fn status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn step(mut self, step: JobStep) -> Self {
        self.step = Some(step);
        self
    }

    pub fn progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn result(mut self, result: JobResult) -> Self {
        self.result = Some(result);
        self
    }
}

/// Applies the job state machine rules to partial updates.
#[derive(Debug, Clone, Copy)]
pub struct TransitionPolicy {
    reset_progress_on_failure: bool,
}

impl Default for TransitionPolicy {
    fn default() -> Self {
        Self {
            reset_progress_on_failure: true,
        }
    }
}

impl TransitionPolicy {
    pub fn new(reset_progress_on_failure: bool) -> Self {
        Self {
            reset_progress_on_failure,
        }
    }

    pub fn resets_progress_on_failure(&self) -> bool {
        self.reset_progress_on_failure
    }

    /// Builds the column set for `update`, stamped with `now`.
    ///
    /// - a result forces completed/completed/100
    /// - an error forces status=error (and progress=0 unless disabled);
    ///   it wins over a result supplied in the same update
    /// - status=completed needs a result, status=error needs an error
    pub fn normalize(
        &self,
        update: JobUpdate,
        now: DateTime<Utc>,
    ) -> Result<JobPatch, TransitionError> {
        if let Some(progress) = update.progress {
            if progress > 100 {
                return Err(TransitionError::Invalid(format!(
                    "progress {} is out of range 0-100",
                    progress
                )));
            }
        }

        let mut patch = JobPatch {
            status: update.status.map(|s| s.as_str().to_string()),
            step: update.step.map(|s| s.as_str().to_string()),
            progress: update.progress.map(i64::from),
            message: update.message,
            updated_at: now.timestamp_millis(),
            expected_status: Some(JobStatus::Processing.as_str().to_string()),
            ..Default::default()
        };

        match (update.error, update.result) {
            (Some(error), result) => {
                if result.is_some() {
                    tracing::warn!("Update carries both an error and a result, keeping the error");
                }
                let error = if error.trim().is_empty() {
                    UNKNOWN_ERROR.to_string()
                } else {
                    error
                };
                patch.status = Some(JobStatus::Error.as_str().to_string());
                patch.error = Some(error);
                if self.reset_progress_on_failure {
                    patch.progress = Some(0);
                }
            }
            (None, Some(result)) => {
                patch.status = Some(JobStatus::Completed.as_str().to_string());
                patch.step = Some(JobStep::Completed.as_str().to_string());
                patch.progress = Some(100);
                patch.result_transcription = Some(result.transcription);
                patch.result_generated_response = Some(result.generated_response);
            }
            (None, None) => match update.status {
                Some(JobStatus::Completed) => {
                    return Err(TransitionError::Invalid(
                        "completed status requires a result".to_string(),
                    ))
                }
                Some(JobStatus::Error) => {
                    return Err(TransitionError::Invalid(
                        "error status requires an error message".to_string(),
                    ))
                }
                _ => {}
            },
        }

        Ok(patch)
    }

    /// Normalizes and writes `update`. Returns the affected row count.
    pub fn apply(
        &self,
        store: &JobStore,
        job_id: &JobId,
        update: JobUpdate,
    ) -> Result<usize, TransitionError> {
        let patch = self.normalize(update, Utc::now())?;
        let affected = store.apply_update(job_id, &patch)?;

        if affected > 0 {
            tracing::debug!(
                job_id = %job_id,
                step = patch.step.as_deref().unwrap_or("unchanged"),
                progress = ?patch.progress,
                "Updated job"
            );
        } else {
            tracing::warn!(
                job_id = %job_id,
                "Job not found for update or already finished"
            );
        }

        Ok(affected)
    }

    /// Moves a job to `step` with the given progress checkpoint.
    pub fn advance(
        &self,
        store: &JobStore,
        job_id: &JobId,
        step: JobStep,
        progress: u8,
        message: &str,
    ) -> Result<usize, TransitionError> {
        self.apply(store, job_id, JobUpdate::stage(step, progress, message))
    }

    /// Marks a job completed with its result.
    pub fn complete(
        &self,
        store: &JobStore,
        job_id: &JobId,
        result: JobResult,
    ) -> Result<usize, TransitionError> {
        tracing::info!(job_id = %job_id, "Completing job");
        self.apply(
            store,
            job_id,
            JobUpdate::new().message(COMPLETED_MESSAGE).result(result),
        )
    }

    /// Marks a job failed.
    pub fn fail(
        &self,
        store: &JobStore,
        job_id: &JobId,
        error: &str,
    ) -> Result<usize, TransitionError> {
        tracing::info!(job_id = %job_id, error, "Failing job");
        self.apply(
            store,
            job_id,
            JobUpdate::new().message(FAILED_MESSAGE).error(error),
        )
    }
}
