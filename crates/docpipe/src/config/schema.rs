use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const CONFIG_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: String,
    /// Directory holding raw uploaded documents.
    #[serde(default = "default_data_directory")]
    pub data_directory: String,
    /// Directory holding one extracted `.txt` artifact per document.
    #[serde(default = "default_output_directory")]
    pub output_directory: String,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub pipeline: PipelineSettings,
    #[serde(default)]
    pub ingestion: IngestionConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

impl Config {
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_directory)
    }

    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.output_directory)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            data_directory: default_data_directory(),
            output_directory: default_output_directory(),
            extraction: ExtractionConfig::default(),
            pipeline: PipelineSettings::default(),
            ingestion: IngestionConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

fn default_version() -> String {
    CONFIG_VERSION.to_string()
}

fn default_data_directory() -> String {
    "pipeline/data".to_string()
}

fn default_output_directory() -> String {
    "pipeline/output".to_string()
}

/// Tuning for the digital-vs-scanned decision and the OCR fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// A page counts as digital when its stripped embedded text is longer than this.
    #[serde(default = "default_min_chars_per_page")]
    pub min_chars_per_page: usize,
    /// Embedded text is trusted when the digital page ratio is strictly above this.
    #[serde(default = "default_confidence_threshold")]
    pub digital_confidence_threshold: f64,
    #[serde(default)]
    pub ocr: OcrConfig,
}

fn default_min_chars_per_page() -> usize {
    50
}

fn default_confidence_threshold() -> f64 {
    0.85
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_chars_per_page: default_min_chars_per_page(),
            digital_confidence_threshold: default_confidence_threshold(),
            ocr: OcrConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    /// Tesseract page segmentation mode (6 = assume a single uniform block of text).
    #[serde(default = "default_psm")]
    pub page_segmentation_mode: u32,
}

fn default_languages() -> Vec<String> {
    vec!["eng".to_string()]
}

fn default_dpi() -> u32 {
    300
}

fn default_psm() -> u32 {
    6
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            languages: default_languages(),
            dpi: default_dpi(),
            page_segmentation_mode: default_psm(),
        }
    }
}

/// How the orchestrator walks the files of one job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Concurrency {
    /// One file at a time, in sorted order.
    #[default]
    Sequential,
    /// Up to `worker_count` files in flight.
    Parallel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    #[serde(default)]
    pub concurrency: Concurrency,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    /// Number of per-file errors kept in a failed job's summary.
    #[serde(default = "default_error_summary_limit")]
    pub error_summary_limit: usize,
}

fn default_worker_count() -> usize {
    num_cpus::get()
}

fn default_error_summary_limit() -> usize {
    5
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            concurrency: Concurrency::default(),
            worker_count: default_worker_count(),
            error_summary_limit: default_error_summary_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// HTTP endpoint of the knowledge-graph builder. `None` disables ingestion.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_ingest_timeout")]
    pub timeout_secs: u64,
}

fn default_ingest_timeout() -> u64 {
    120
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: default_ingest_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,
}

fn default_top_k() -> usize {
    5
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            default_top_k: default_top_k(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_heuristic_constants() {
        let config = Config::default();
        assert_eq!(config.extraction.min_chars_per_page, 50);
        assert!((config.extraction.digital_confidence_threshold - 0.85).abs() < f64::EPSILON);
        assert_eq!(config.extraction.ocr.dpi, 300);
        assert_eq!(config.pipeline.concurrency, Concurrency::Sequential);
        assert_eq!(config.pipeline.error_summary_limit, 5);
    }

    #[test]
    fn test_concurrency_serde_lowercase() {
        let parsed: Concurrency = serde_json::from_str("\"parallel\"").unwrap();
        assert_eq!(parsed, Concurrency::Parallel);
        assert_eq!(
            serde_json::to_string(&Concurrency::Sequential).unwrap(),
            "\"sequential\""
        );
    }
}
