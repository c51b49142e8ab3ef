//! Job repository: raw row operations for the `jobs` table.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// A raw job row from the database.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRow {
    pub job_id: String,
    pub status: String,
    pub step: String,
    pub progress: i64,
    pub message: String,
    pub result_transcription: Option<String>,
    pub result_generated_response: Option<String>,
    pub error: Option<String>,
    /// Unix milliseconds.
    pub created_at: i64,
    /// Unix milliseconds.
    pub updated_at: i64,
}

impl JobRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            job_id: row.get("job_id")?,
            status: row.get("status")?,
            step: row.get("step")?,
            progress: row.get("progress")?,
            message: row.get("message")?,
            result_transcription: row.get("result_transcription")?,
            result_generated_response: row.get("result_generated_response")?,
            error: row.get("error")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Column set for a partial update.
///
/// Only columns that are `Some` are written; `updated_at` is always written.
/// When `expected_status` is set the update only applies to a row currently
/// in that status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobPatch {
    pub status: Option<String>,
    pub step: Option<String>,
    pub progress: Option<i64>,
    pub message: Option<String>,
    pub error: Option<String>,
    pub result_transcription: Option<String>,
    pub result_generated_response: Option<String>,
    pub updated_at: i64,
    pub expected_status: Option<String>,
}

impl JobPatch {
    /// Names of the columns this patch writes, in statement order.
    pub fn columns(&self) -> Vec<&'static str> {
        let mut columns = Vec::new();
        if self.status.is_some() {
            columns.push("status");
        }
        if self.step.is_some() {
            columns.push("step");
        }
        if self.progress.is_some() {
            columns.push("progress");
        }
        if self.message.is_some() {
            columns.push("message");
        }
        if self.error.is_some() {
            columns.push("error");
        }
        if self.result_transcription.is_some() {
            columns.push("result_transcription");
        }
        if self.result_generated_response.is_some() {
            columns.push("result_generated_response");
        }
        columns.push("updated_at");
        columns
    }
}

/// Inserts a new job row.
pub fn insert(db: &Database, job: &JobRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO jobs (job_id, status, step, progress, message, result_transcription,
             result_generated_response, error, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                job.job_id,
                job.status,
                job.step,
                job.progress,
                job.message,
                job.result_transcription,
                job.result_generated_response,
                job.error,
                job.created_at,
                job.updated_at,
            ],
        )?;
        Ok(())
    })
}

/// Applies a partial update to one job. Returns the number of rows affected,
/// which is 0 for an unknown id or a failed status guard.
pub fn apply_patch(db: &Database, job_id: &str, patch: &JobPatch) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let mut assignments = Vec::new();
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(ref status) = patch.status {
            assignments.push(format!("status = ?{}", param_values.len() + 1));
            param_values.push(Box::new(status.clone()));
        }
        if let Some(ref step) = patch.step {
            assignments.push(format!("step = ?{}", param_values.len() + 1));
            param_values.push(Box::new(step.clone()));
        }
        if let Some(progress) = patch.progress {
            assignments.push(format!("progress = ?{}", param_values.len() + 1));
            param_values.push(Box::new(progress));
        }
        if let Some(ref message) = patch.message {
            assignments.push(format!("message = ?{}", param_values.len() + 1));
            param_values.push(Box::new(message.clone()));
        }
        if let Some(ref error) = patch.error {
            assignments.push(format!("error = ?{}", param_values.len() + 1));
            param_values.push(Box::new(error.clone()));
        }
        if let Some(ref transcription) = patch.result_transcription {
            assignments.push(format!("result_transcription = ?{}", param_values.len() + 1));
            param_values.push(Box::new(transcription.clone()));
        }
        if let Some(ref response) = patch.result_generated_response {
            assignments.push(format!(
                "result_generated_response = ?{}",
                param_values.len() + 1
            ));
            param_values.push(Box::new(response.clone()));
        }
        assignments.push(format!("updated_at = ?{}", param_values.len() + 1));
        param_values.push(Box::new(patch.updated_at));

        let mut conditions = Vec::new();
        conditions.push(format!("job_id = ?{}", param_values.len() + 1));
        param_values.push(Box::new(job_id.to_string()));
        if let Some(ref expected) = patch.expected_status {
            conditions.push(format!("status = ?{}", param_values.len() + 1));
            param_values.push(Box::new(expected.clone()));
        }

        let sql = format!(
            "UPDATE jobs SET {} WHERE {}",
            assignments.join(", "),
            conditions.join(" AND ")
        );
        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let affected = conn.execute(&sql, params_ref.as_slice())?;
        Ok(affected)
    })
}

/// Finds a job by its ID.
pub fn find_by_id(db: &Database, job_id: &str) -> Result<Option<JobRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM jobs WHERE job_id = ?1")?;
        let mut rows = stmt.query_map(params![job_id], JobRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Deletes every job created strictly before `cutoff_millis`.
pub fn delete_created_before(db: &Database, cutoff_millis: i64) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let deleted = conn.execute(
            "DELETE FROM jobs WHERE created_at < ?1",
            params![cutoff_millis],
        )?;
        Ok(deleted)
    })
}

/// Counts jobs with the given status.
pub fn count_by_status(db: &Database, status: &str) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM jobs WHERE status = ?1",
            params![status],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}
