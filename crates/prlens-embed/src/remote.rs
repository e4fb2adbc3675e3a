//! Client for an Ollama-compatible `/api/embeddings` endpoint.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use prlens_core::{Error, Result};

#[derive(Clone, Debug)]
pub struct RemoteEmbedder {
    client: Client,
    endpoint: String,
    model: String,
}

impl RemoteEmbedder {
    /// Builds a client for `base_url` (e.g. `http://localhost:11434`).
    ///
    /// Every request is bounded by `timeout`.
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        if model.trim().is_empty() {
            return Err(Error::InvalidConfig("missing embedding model name".to_string()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| Error::Remote(format!("failed to build HTTP client: {e}")))?;
        let endpoint = format!("{}/api/embeddings", base_url.trim().trim_end_matches('/'));
        Ok(Self { client, endpoint, model: model.to_string() })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Request one embedding. The vector is returned exactly as the server sent it.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest { model: &self.model, prompt: text };
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Remote(format!("request to {} failed: {e}", self.endpoint)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(Error::Remote(format!("{} returned {status}: {body}", self.endpoint)));
        }

        let parsed: EmbeddingResponse = resp
            .json()
            .await
            .map_err(|e| Error::Remote(format!("malformed embedding response: {e}")))?;
        if parsed.embedding.is_empty() {
            return Err(Error::Remote("embedding response contained an empty vector".to_string()));
        }
        Ok(parsed.embedding)
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_path_is_appended_once() {
        let remote = RemoteEmbedder::new("http://localhost:11434/", "m", Duration::from_secs(1))
            .expect("client");
        assert_eq!(remote.endpoint(), "http://localhost:11434/api/embeddings");
        assert_eq!(remote.model(), "m");
    }

    #[test]
    fn blank_model_is_rejected() {
        let err = RemoteEmbedder::new("http://localhost:11434", "  ", Duration::from_secs(1))
            .expect_err("blank model");
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
