//! Hand-off of extracted text to the downstream knowledge-graph builder.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::IngestionConfig;
use crate::error::IngestError;

/// What the ingestion backend reported for one document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestOutcome {
    pub filename: String,
    #[serde(default)]
    pub result: serde_json::Value,
}

/// External ingestion step. Errors are per-file failures for the caller.
#[async_trait]
pub trait Ingestor: Send + Sync {
    async fn ingest(&self, text: &str, filename: &str) -> Result<IngestOutcome, IngestError>;
}

#[derive(Serialize)]
struct IngestRequest<'a> {
    text: &'a str,
    filename: &'a str,
}

/// POSTs `{"text", "filename"}` as JSON to a configured endpoint.
pub struct HttpIngestor {
    client: Client,
    endpoint: String,
}

impl HttpIngestor {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, IngestError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    /// `None` when no endpoint is configured.
    pub fn from_config(config: &IngestionConfig) -> Result<Option<Self>, IngestError> {
        config
            .endpoint
            .as_deref()
            .map(|endpoint| Self::new(endpoint, Duration::from_secs(config.timeout_secs)))
            .transpose()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Ingestor for HttpIngestor {
    async fn ingest(&self, text: &str, filename: &str) -> Result<IngestOutcome, IngestError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&IngestRequest { text, filename })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(IngestError::Rejected {
                filename: filename.to_string(),
                status,
                body,
            });
        }

        let result: serde_json::Value = response.json().await.unwrap_or(serde_json::Value::Null);
        Ok(IngestOutcome {
            filename: filename.to_string(),
            result,
        })
    }
}

/// Accepts everything; used when extraction runs without a graph backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopIngestor;

#[async_trait]
impl Ingestor for NoopIngestor {
    async fn ingest(&self, text: &str, filename: &str) -> Result<IngestOutcome, IngestError> {
        log::debug!("Skipping ingestion of {} ({} chars)", filename, text.len());
        Ok(IngestOutcome {
            filename: filename.to_string(),
            result: serde_json::Value::Null,
        })
    }
}
