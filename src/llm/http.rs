//! Shared HTTP plumbing for the Claude-style and OpenAI-style adaptors,
//! grounded on `the_agency::llm::providers::base::HttpProviderClient`'s
//! timeout-wrapped `post_json` helper.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CoreError, Result};

pub struct HttpLlmClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpLlmClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| CoreError::LlmFailure(err.to_string()))?;
        Ok(Self { client, timeout })
    }

    pub async fn post_json<T: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        url: &str,
        body: &T,
        headers: &[(String, String)],
    ) -> Result<R> {
        let mut request = self.client.post(url).json(body);
        for (key, value) in headers {
            request = request.header(key.as_str(), value.as_str());
        }

        let response = tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| CoreError::Timeout)?
            .map_err(|err| CoreError::LlmFailure(err.to_string()))?;

        let response = response
            .error_for_status()
            .map_err(|err| CoreError::LlmFailure(err.to_string()))?;

        response
            .json::<R>()
            .await
            .map_err(|err| CoreError::LlmFailure(err.to_string()))
    }
}
