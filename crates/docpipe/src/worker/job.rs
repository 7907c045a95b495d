use std::path::PathBuf;

/// One file handed to the extraction pool.
#[derive(Debug, Clone)]
pub struct ExtractionJob {
    pub id: String,
    pub source_path: PathBuf,
}

impl ExtractionJob {
    pub fn new(source_path: PathBuf) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source_path,
        }
    }

    pub fn filename(&self) -> String {
        self.source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source_path.display().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    /// Text extracted and written to the artifact.
    Written { chars: usize },
    /// Artifact already present; nothing was extracted.
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ExtractionResult {
    pub job_id: String,
    pub source_path: PathBuf,
    pub outcome: ExtractionOutcome,
}

impl ExtractionResult {
    pub fn new(job: &ExtractionJob, outcome: ExtractionOutcome) -> Self {
        Self {
            job_id: job.id.clone(),
            source_path: job.source_path.clone(),
            outcome,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, ExtractionOutcome::Failed(_))
    }
}

/// Tally of a preprocessing run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreprocessReport {
    pub written: usize,
    pub skipped: usize,
    pub failed: Vec<(String, String)>,
}

impl PreprocessReport {
    pub fn record(&mut self, result: &ExtractionResult) {
        match &result.outcome {
            ExtractionOutcome::Written { .. } => self.written += 1,
            ExtractionOutcome::Skipped => self.skipped += 1,
            ExtractionOutcome::Failed(message) => {
                let name = result
                    .source_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.failed.push((name, message.clone()));
            }
        }
    }

    pub fn total(&self) -> usize {
        self.written + self.skipped + self.failed.len()
    }
}
