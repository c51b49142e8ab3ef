//! Job domain types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque job identifier, e.g. `job_1735689600000_3f9a1c2e`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Generates a fresh identifier from the current time and a random suffix.
    pub fn generate() -> Self {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self(format!(
            "job_{}_{}",
            Utc::now().timestamp_millis(),
            &suffix[..8]
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Coarse outcome of a job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "processing" => Some(JobStatus::Processing),
            "completed" => Some(JobStatus::Completed),
            "error" => Some(JobStatus::Error),
            _ => None,
        }
    }

    /// Completed and error are sinks.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fine-grained pipeline position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStep {
    Uploading,
    ExtractingAudio,
    Transcribing,
    GeneratingResponse,
    Completed,
}

impl JobStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStep::Uploading => "uploading",
            JobStep::ExtractingAudio => "extracting_audio",
            JobStep::Transcribing => "transcribing",
            JobStep::GeneratingResponse => "generating_response",
            JobStep::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "uploading" => Some(JobStep::Uploading),
            "extracting_audio" => Some(JobStep::ExtractingAudio),
            "transcribing" => Some(JobStep::Transcribing),
            "generating_response" => Some(JobStep::GeneratingResponse),
            "completed" => Some(JobStep::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for JobStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of a successful job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    pub transcription: String,
    pub generated_response: String,
}

/// Snapshot of a job record as served to pollers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub job_id: JobId,
    pub status: JobStatus,
    pub step: JobStep,
    /// 0 to 100.
    pub progress: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Returns true once the job reached completed or error.
    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_format() {
        let id = JobId::generate();
        let parts: Vec<&str> = id.as_str().split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "job");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 8);
    }

    #[test]
    fn test_job_ids_are_unique() {
        let a = JobId::generate();
        let b = JobId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_status_round_trip_names() {
        for status in [JobStatus::Processing, JobStatus::Completed, JobStatus::Error] {
            assert_eq!(JobStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(JobStatus::parse("failed"), None);
    }

    #[test]
    fn test_step_names_match_wire_format() {
        assert_eq!(JobStep::ExtractingAudio.as_str(), "extracting_audio");
        assert_eq!(JobStep::GeneratingResponse.as_str(), "generating_response");
        assert_eq!(
            serde_json::to_string(&JobStep::GeneratingResponse).unwrap(),
            "\"generating_response\""
        );
        assert_eq!(JobStep::parse("queued"), None);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Error.is_terminal());
    }

    #[test]
    fn test_snapshot_json_shape() {
        let now = Utc::now();
        let job = Job {
            job_id: JobId::from("job_1_abcdef12"),
            status: JobStatus::Completed,
            step: JobStep::Completed,
            progress: 100,
            message: "done".to_string(),
            result: Some(JobResult {
                transcription: "hola".to_string(),
                generated_response: "informe".to_string(),
            }),
            error: None,
            created_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["jobId"], "job_1_abcdef12");
        assert_eq!(value["status"], "completed");
        assert_eq!(value["result"]["generatedResponse"], "informe");
        assert!(value.get("error").is_none());
        assert!(value.get("createdAt").is_some());
    }
}
