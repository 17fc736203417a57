//! HTTP embedding provider for OpenAI-compatible endpoints.
//!
//! Sends `{ model, input, encoding_format: "float" }` with a bearer token to the
//! configured URL and reads vectors from `data[*].embedding`.

use std::sync::OnceLock;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::EmbeddingProvider;
use crate::config::EmbeddingConfig;

/// Failure talking to the embedding endpoint.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("embedding API returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("embedding API returned {got} vectors for {expected} inputs")]
    CountMismatch { expected: usize, got: usize },
    #[error("embedding API returned an empty vector")]
    EmptyVector,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: EmbedInput<'a>,
    encoding_format: &'static str,
}

#[derive(Serialize)]
#[serde(untagged)]
enum EmbedInput<'a> {
    One(&'a str),
    Many(&'a [&'a str]),
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

/// Embedding provider backed by a remote HTTP API.
pub struct RemoteEmbeddingProvider {
    endpoint: String,
    model: String,
    api_key: String,
    timeout: Duration,
    /// Built on first request, which always runs on a blocking thread.
    client: OnceLock<reqwest::blocking::Client>,
}

impl RemoteEmbeddingProvider {
    pub fn new(config: &EmbeddingConfig) -> Self {
        Self {
            endpoint: config.provider.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            client: OnceLock::new(),
        }
    }

    /// Shared HTTP client. A blocking client must not be constructed on an
    /// async executor thread, so creation is deferred to the first request.
    fn client(&self) -> Result<&reqwest::blocking::Client, EmbeddingError> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;
        Ok(self.client.get_or_init(|| client))
    }

    /// One blocking POST. Must run off the async executor (see `spawn_blocking`).
    fn request(&self, input: EmbedInput<'_>, expected: usize) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let client = self.client()?;

        let body = EmbedRequest {
            model: &self.model,
            input,
            encoding_format: "float",
        };

        let response = client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            tracing::warn!(%status, endpoint = %self.endpoint, "embedding request rejected");
            return Err(EmbeddingError::Status { status, body });
        }

        let parsed: EmbedResponse = response.json()?;
        collect_vectors(parsed, expected)
    }
}

impl EmbeddingProvider for RemoteEmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.request(EmbedInput::One(text), 1)?;
        Ok(vectors.remove(0))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        Ok(self.request(EmbedInput::Many(texts), texts.len())?)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Order vectors by their `index` and check there is one non-empty vector per input.
fn collect_vectors(response: EmbedResponse, expected: usize) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let mut data = response.data;
    if data.len() != expected {
        return Err(EmbeddingError::CountMismatch {
            expected,
            got: data.len(),
        });
    }
    data.sort_by_key(|d| d.index);
    if data.iter().any(|d| d.embedding.is_empty()) {
        return Err(EmbeddingError::EmptyVector);
    }
    Ok(data.into_iter().map(|d| d.embedding).collect())
}
