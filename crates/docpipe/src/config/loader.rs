use std::path::{Path, PathBuf};

use crate::config::schema::{Config, CONFIG_VERSION};
use crate::error::ConfigError;

pub const ENV_DATA_DIR: &str = "DOCPIPE_DATA_DIR";
pub const ENV_OUTPUT_DIR: &str = "DOCPIPE_OUTPUT_DIR";
pub const ENV_INGEST_URL: &str = "DOCPIPE_INGEST_URL";
pub const ENV_RETRIEVAL_URL: &str = "DOCPIPE_RETRIEVAL_URL";

/// Largest `top_k` a retrieval request may ask for.
pub const MAX_TOP_K: usize = 50;

/// `<platform config dir>/docpipe/config.json`, if the platform has one.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("docpipe").join("config.json"))
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Applies `DOCPIPE_*` environment overrides on top of a loaded config.
pub fn apply_env_overrides(config: Config) -> Result<Config, ConfigError> {
    apply_overrides_from(config, |key| std::env::var(key).ok())
}

fn apply_overrides_from<F>(mut config: Config, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(dir) = non_empty(ENV_DATA_DIR) {
        config.data_directory = dir;
    }
    if let Some(dir) = non_empty(ENV_OUTPUT_DIR) {
        config.output_directory = dir;
    }
    if let Some(url) = non_empty(ENV_INGEST_URL) {
        config.ingestion.endpoint = Some(url);
    }
    if let Some(url) = non_empty(ENV_RETRIEVAL_URL) {
        config.retrieval.endpoint = Some(url);
    }

    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != CONFIG_VERSION {
        return Err(invalid(format!(
            "Unsupported config version: {}",
            config.version
        )));
    }

    if config.data_directory.trim().is_empty() {
        return Err(invalid("data_directory must not be empty"));
    }
    if config.output_directory.trim().is_empty() {
        return Err(invalid("output_directory must not be empty"));
    }

    let threshold = config.extraction.digital_confidence_threshold;
    if !(0.0..=1.0).contains(&threshold) {
        return Err(invalid(format!(
            "digital_confidence_threshold must be within [0, 1], got {}",
            threshold
        )));
    }

    if config.extraction.ocr.dpi == 0 {
        return Err(invalid("ocr.dpi must be greater than 0"));
    }

    if config.pipeline.worker_count == 0 {
        return Err(invalid("pipeline.worker_count must be greater than 0"));
    }

    if config.pipeline.error_summary_limit == 0 {
        return Err(invalid("pipeline.error_summary_limit must be greater than 0"));
    }

    let top_k = config.retrieval.default_top_k;
    if top_k == 0 || top_k > MAX_TOP_K {
        return Err(invalid(format!(
            "retrieval.default_top_k must be within 1..={}, got {}",
            MAX_TOP_K, top_k
        )));
    }

    Ok(())
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}
