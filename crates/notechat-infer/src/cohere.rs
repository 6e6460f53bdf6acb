//! Cohere embedding client (`POST /v1/embed`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::embedder::{EmbedMode, EmbedderBackend};
use notechat_core::{CohereSettings, Error, Result};

#[derive(Serialize)]
struct EmbedRequest<'a> {
    texts: &'a [String],
    model: &'a str,
    input_type: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// An [`EmbedderBackend`] backed by the Cohere embed API.
pub struct CohereEmbedder {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl CohereEmbedder {
    /// Build a client whose every request is bounded by `timeout`.
    pub fn new(settings: &CohereSettings, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            model: settings.embed_model.clone(),
        })
    }

    /// Embed a single probe text and report the vector dimension.
    pub async fn check_connection(&self) -> Result<usize> {
        let vectors = self
            .embed(&["connectivity check".to_string()], EmbedMode::Query)
            .await?;
        let dim = vectors.first().map(Vec::len).unwrap_or(0);
        if dim == 0 {
            return Err(Error::EmbeddingService("service returned no embedding".into()));
        }
        info!("Embedding service reachable ({} dims with {})", dim, self.model);
        Ok(dim)
    }
}

#[async_trait]
impl EmbedderBackend for CohereEmbedder {
    async fn embed(&self, texts: &[String], mode: EmbedMode) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/v1/embed", self.base_url);
        debug!("Embedding {} texts as {} with {}", texts.len(), mode.input_type(), self.model);

        let body = EmbedRequest {
            texts,
            model: &self.model,
            input_type: mode.input_type(),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("Embedding request failed: {}", e);
                Error::EmbeddingService(format!("Request failed: {}", e))
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::EmbeddingService(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            error!("Embedding API error {}", status);
            return Err(Error::EmbeddingService(api_error(status, &text)));
        }

        parse_embed_response(&text)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Pull the vectors out of an embed response body.
pub fn parse_embed_response(body: &str) -> Result<Vec<Vec<f32>>> {
    serde_json::from_str::<EmbedResponse>(body)
        .map(|r| r.embeddings)
        .map_err(|e| Error::EmbeddingService(format!("Invalid response: {}", e)))
}

/// Describe a non-success response, preferring the service's own message.
pub(crate) fn api_error(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.to_string());
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            format!("API error {} (check COHERE_API_KEY): {}", status, detail)
        }
        StatusCode::TOO_MANY_REQUESTS => format!("API error {} (rate limited): {}", status, detail),
        _ => format!("API error {}: {}", status, detail),
    }
}
