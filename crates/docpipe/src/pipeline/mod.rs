pub mod config;
pub mod error;
pub mod runner;

pub use config::PipelineConfig;
pub use error::{summarize_failures, FileFailure, PipelineError};
pub use runner::{JobSummary, Pipeline, JOB_PANIC_MESSAGE};
