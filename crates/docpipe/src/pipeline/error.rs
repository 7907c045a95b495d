use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Extraction(#[from] crate::error::ProcessError),

    #[error(transparent)]
    Ingestion(#[from] crate::error::IngestError),
}

/// One file's failure within a batch job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub filename: String,
    pub message: String,
}

impl FileFailure {
    pub fn new(filename: &str, message: impl Into<String>) -> Self {
        Self {
            filename: filename.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FileFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.filename, self.message)
    }
}

/// First `limit` failures as `"<file>: <message>"`, joined by `"; "`.
pub fn summarize_failures(failures: &[FileFailure], limit: usize) -> Option<String> {
    if failures.is_empty() {
        return None;
    }

    Some(
        failures
            .iter()
            .take(limit)
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; "),
    )
}
