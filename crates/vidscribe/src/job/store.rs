//! Durable job store backed by rusqlite.
//!
//! Pure persistence: the store never decides which transitions are legal.
//! That belongs to [`crate::job::transition::TransitionPolicy`].

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::job_repo::{self, JobPatch, JobRow};
use crate::db::{Database, DatabaseError};

use super::model::{Job, JobId, JobResult, JobStatus, JobStep};

/// Message stored on a freshly created job.
pub const INITIAL_MESSAGE: &str = "Processing video file...";

fn parse_status(s: &str, job_id: &str) -> JobStatus {
    JobStatus::parse(s).unwrap_or_else(|| {
        log::warn!(
            "Unknown job status '{}' for job {}, defaulting to processing",
            s,
            job_id
        );
        JobStatus::Processing
    })
}

fn parse_step(s: &str, job_id: &str) -> JobStep {
    JobStep::parse(s).unwrap_or_else(|| {
        log::warn!(
            "Unknown job step '{}' for job {}, defaulting to uploading",
            s,
            job_id
        );
        JobStep::Uploading
    })
}

fn from_millis(millis: i64, job_id: &str) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or_else(|| {
        log::warn!("Invalid timestamp {} for job {}", millis, job_id);
        Utc::now()
    })
}

impl Job {
    /// Builds a snapshot from a database row.
    ///
    /// A result exists only when both result columns are present.
    pub fn from_row(row: JobRow) -> Self {
        let status = parse_status(&row.status, &row.job_id);
        let step = parse_step(&row.step, &row.job_id);
        let created_at = from_millis(row.created_at, &row.job_id);
        let updated_at = from_millis(row.updated_at, &row.job_id);

        let result = match (row.result_transcription, row.result_generated_response) {
            (Some(transcription), Some(generated_response)) => Some(JobResult {
                transcription,
                generated_response,
            }),
            _ => None,
        };

        Self {
            job_id: JobId::from(row.job_id),
            status,
            step,
            progress: row.progress.clamp(0, 100) as u8,
            message: row.message,
            result,
            error: row.error,
            created_at,
            updated_at,
        }
    }
}

/// Per-status job totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobCounts {
    pub processing: u64,
    pub completed: u64,
    pub error: u64,
}

/// Keyed store of job records. Cloning is cheap.
#[derive(Clone)]
pub struct JobStore {
    db: Database,
}

impl JobStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Opens the SQLite file at `path`, running migrations.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        Ok(Self::new(Database::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    /// Inserts a new job at processing/uploading/0 and returns its id.
    pub fn create_job(&self) -> Result<JobId, DatabaseError> {
        let job_id = JobId::generate();
        let now = Utc::now().timestamp_millis();

        let row = JobRow {
            job_id: job_id.to_string(),
            status: JobStatus::Processing.as_str().to_string(),
            step: JobStep::Uploading.as_str().to_string(),
            progress: 0,
            message: INITIAL_MESSAGE.to_string(),
            result_transcription: None,
            result_generated_response: None,
            error: None,
            created_at: now,
            updated_at: now,
        };
        job_repo::insert(&self.db, &row)?;

        tracing::debug!(job_id = %job_id, "Created job");
        Ok(job_id)
    }

    /// Writes a patch. Returns the affected row count; 0 means the job does
    /// not exist (or no longer matches the patch's status guard).
    pub fn apply_update(&self, job_id: &JobId, patch: &JobPatch) -> Result<usize, DatabaseError> {
        job_repo::apply_patch(&self.db, job_id.as_str(), patch)
    }

    pub fn get_by_id(&self, job_id: &JobId) -> Result<Option<Job>, DatabaseError> {
        Ok(job_repo::find_by_id(&self.db, job_id.as_str())?.map(Job::from_row))
    }

    /// Deletes every job created before `cutoff`, whatever its status.
    pub fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, DatabaseError> {
        job_repo::delete_created_before(&self.db, cutoff.timestamp_millis())
    }

    pub fn counts(&self) -> Result<JobCounts, DatabaseError> {
        Ok(JobCounts {
            processing: job_repo::count_by_status(&self.db, JobStatus::Processing.as_str())?,
            completed: job_repo::count_by_status(&self.db, JobStatus::Completed.as_str())?,
            error: job_repo::count_by_status(&self.db, JobStatus::Error.as_str())?,
        })
    }

    /// Gives access to the underlying handle.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Closes the underlying connection once no other store clone holds it.
    pub fn close(self) -> Result<(), DatabaseError> {
        self.db.close()
    }
}
