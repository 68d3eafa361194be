//! Job/Batch data model.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// Job lifecycle status. Transitions are monotonic: Pending -> Processing ->
/// {Completed, Failed}; there are no back-transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// One execution of one processor over one (or, for combining processors, a grouped
/// set of) uploaded files.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    pub processor_id: String,
    pub original_filename: String,
    pub status: JobStatus,
    /// `[0, 100]`, rounded to one decimal for external display.
    pub progress: f64,
    pub message: String,
    pub result_path: Option<PathBuf>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn new(id: String, processor_id: String, original_filename: String) -> Self {
        Self {
            id,
            processor_id,
            original_filename,
            status: JobStatus::Pending,
            progress: 0.0,
            message: "Queued".to_string(),
            result_path: None,
            error: None,
            created_at: Utc::now(),
        }
    }

    /// Lowercase extension including leading dot, derived from `result_path`. Empty if unset.
    pub fn result_extension(&self) -> String {
        self.result_path
            .as_ref()
            .and_then(|p| p.extension())
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            id: self.id.clone(),
            processor_id: self.processor_id.clone(),
            original_filename: self.original_filename.clone(),
            status: self.status,
            progress: round1(self.progress),
            message: self.message.clone(),
            result_extension: self.result_extension(),
            error: self.error.clone(),
            created_at: self.created_at,
        }
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Wire representation of a Job.
#[derive(Debug, Clone, Serialize)]
pub struct JobSnapshot {
    pub id: String,
    pub processor_id: String,
    pub original_filename: String,
    pub status: JobStatus,
    pub progress: f64,
    pub message: String,
    pub result_extension: String,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A submission-time grouping of independent Jobs sharing a processor id.
#[derive(Debug, Clone)]
pub struct Batch {
    pub id: String,
    pub processor_id: String,
    pub job_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Batch {
    pub fn snapshot(&self) -> BatchSnapshot {
        BatchSnapshot {
            id: self.id.clone(),
            job_ids: self.job_ids.clone(),
            processor_id: self.processor_id.clone(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSnapshot {
    pub id: String,
    pub job_ids: Vec<String>,
    pub processor_id: String,
    pub created_at: DateTime<Utc>,
}

/// SSE progress payload: `{progress, message, status}` during processing, or the
/// terminal event carrying the same shape once `status` is terminal.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    pub progress: f64,
    pub message: String,
    pub status: JobStatus,
}

impl From<&Job> for ProgressEvent {
    fn from(job: &Job) -> Self {
        Self { progress: round1(job.progress), message: job.message.clone(), status: job.status }
    }
}
