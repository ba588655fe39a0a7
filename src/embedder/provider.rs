//! HTTP-backed embedding provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::embedder::{Embedder, EmbeddingVector};
use crate::error::{CoreError, Result};

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

/// Calls a configured HTTP embedding endpoint. Deterministic for a fixed
/// `(model, version, text)` from the provider's perspective, per spec.md §4.D.
pub struct ProviderEmbedder {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    dim: u32,
    version: u32,
}

impl ProviderEmbedder {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        dim: u32,
        version: u32,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| CoreError::EmbeddingFailure(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
            model: model.into(),
            dim,
            version,
        })
    }
}

#[async_trait]
impl Embedder for ProviderEmbedder {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector> {
        let mut request = self.client.post(&self.endpoint).json(&EmbedRequest {
            model: &self.model,
            input: text,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let response = response
            .error_for_status()
            .map_err(|err| CoreError::EmbeddingFailure(err.to_string()))?;
        let body: EmbedResponse = response.json().await?;

        if body.embedding.len() as u32 != self.dim {
            return Err(CoreError::EmbeddingFailure(format!(
                "provider returned {} dimensions, expected {}",
                body.embedding.len(),
                self.dim
            )));
        }

        Ok(EmbeddingVector {
            vector: body.embedding,
            model: self.model.clone(),
            dim: self.dim,
            version: self.version,
        })
    }
}
