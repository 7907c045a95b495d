use std::path::PathBuf;

use crate::config::{Concurrency, Config};

/// The slice of [`Config`] the orchestrator needs, resolved once per service.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub data_directory: PathBuf,
    pub output_directory: PathBuf,
    pub concurrency: Concurrency,
    pub worker_count: usize,
    pub error_summary_limit: usize,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            data_directory: config.data_dir(),
            output_directory: config.output_dir(),
            concurrency: config.pipeline.concurrency,
            worker_count: config.pipeline.worker_count.max(1),
            error_summary_limit: config.pipeline.error_summary_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_default_config() {
        let config = PipelineConfig::from_config(&Config::default());
        assert_eq!(config.data_directory, PathBuf::from("pipeline/data"));
        assert_eq!(config.output_directory, PathBuf::from("pipeline/output"));
        assert_eq!(config.concurrency, Concurrency::Sequential);
        assert_eq!(config.error_summary_limit, 5);
        assert!(config.worker_count >= 1);
    }

    #[test]
    fn test_parallel_bounded_by_worker_count() {
        let config = crate::config::load_config_from_str(
            r#"{ "pipeline": { "concurrency": "parallel", "worker_count": 4 } }"#,
        )
        .unwrap();
        let config = PipelineConfig::from_config(&config);
        assert_eq!(config.concurrency, Concurrency::Parallel);
        assert_eq!(config.worker_count, 4);
    }
}
