//! File and job records held by the state store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Position of a file in the per-document lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FileStage {
    Raw,
    Uploaded,
    Processing,
    OcrComplete,
    Indexed,
    Failed,
    Missing,
    Deleted,
}

impl FileStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStage::Raw => "raw",
            FileStage::Uploaded => "uploaded",
            FileStage::Processing => "processing",
            FileStage::OcrComplete => "ocr_complete",
            FileStage::Indexed => "indexed",
            FileStage::Failed => "failed",
            FileStage::Missing => "missing",
            FileStage::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for FileStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileRecord {
    pub name: String,
    pub stage: FileStage,
    /// Last error; only present while `stage` is `failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl FileRecord {
    pub fn new(name: &str, stage: FileStage) -> Self {
        Self {
            name: name.to_string(),
            stage,
            error: None,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Completed and failed jobs never change status again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One batch-processing run over a frozen set of files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobRecord {
    pub id: String,
    pub status: JobStatus,
    pub processed_count: usize,
    pub total_count: usize,
    /// Aggregated error summary; only present once the job has failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    pub fn queued(id: &str, total_count: usize) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            status: JobStatus::Queued,
            processed_count: 0,
            total_count,
            error: None,
            created_at: now,
            updated_at: now,
            finished_at: None,
        }
    }

    /// `"<processed>/<total> files"`
    pub fn progress(&self) -> String {
        format!("{}/{} files", self.processed_count, self.total_count)
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    /// Merges a partial update, keeping the record's invariants:
    /// terminal statuses stick, counts never go backwards and
    /// `processed_count <= total_count`.
    pub(crate) fn apply(&mut self, update: &JobUpdate) {
        let now = Utc::now();

        if let Some(status) = update.status {
            if self.status.is_terminal() && status != self.status {
                log::warn!(
                    "Ignoring status change {} -> {} for finished job {}",
                    self.status,
                    status,
                    self.id
                );
            } else {
                self.status = status;
                if status.is_terminal() && self.finished_at.is_none() {
                    self.finished_at = Some(now);
                }
            }
        }

        if let Some(total) = update.total_count {
            self.total_count = total;
        }

        if let Some(processed) = update.processed_count {
            if processed < self.processed_count {
                log::warn!(
                    "Ignoring processed count {} below {} for job {}",
                    processed,
                    self.processed_count,
                    self.id
                );
            } else {
                self.processed_count = processed;
            }
        }

        if self.processed_count > self.total_count {
            self.total_count = self.processed_count;
        }

        // Only a failed job carries an error
        if self.status != JobStatus::Failed {
            self.error = None;
        } else if let Some(error) = &update.error {
            self.error = Some(error.clone());
        }

        self.updated_at = now;
    }
}

/// Partial job update; unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub processed_count: Option<usize>,
    pub total_count: Option<usize>,
    pub error: Option<String>,
}

impl JobUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn processed(mut self, processed_count: usize) -> Self {
        self.processed_count = Some(processed_count);
        self
    }

    pub fn total(mut self, total_count: usize) -> Self {
        self.total_count = Some(total_count);
        self
    }

    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}
