//! Question answering over the ingested corpus, delegated to an external backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::RetrievalConfig;
use crate::error::RetrievalError;

const RETRIEVAL_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<serde_json::Value>,
}

#[async_trait]
pub trait Retriever: Send + Sync {
    async fn ask(&self, query: &str, top_k: usize) -> Result<Answer, RetrievalError>;
}

#[derive(Serialize)]
struct AskRequest<'a> {
    query: &'a str,
    top_k: usize,
}

pub struct HttpRetriever {
    client: Client,
    endpoint: String,
}

impl HttpRetriever {
    pub fn new(endpoint: &str) -> Result<Self, RetrievalError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(RETRIEVAL_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn from_config(config: &RetrievalConfig) -> Result<Option<Self>, RetrievalError> {
        config.endpoint.as_deref().map(Self::new).transpose()
    }
}

#[async_trait]
impl Retriever for HttpRetriever {
    async fn ask(&self, query: &str, top_k: usize) -> Result<Answer, RetrievalError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&AskRequest { query, top_k })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Rejected { status, body });
        }

        Ok(response.json().await?)
    }
}
