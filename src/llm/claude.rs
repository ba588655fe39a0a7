//! "Claude-style" messages-API adaptor, grounded on
//! `the_agency::llm::providers::anthropic::AnthropicProvider`'s request/
//! response shapes.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::http::HttpLlmClient;
use super::{parse_reply, user_message, LlmClient, RawAnswer, SYSTEM_INSTRUCTION};

#[derive(Serialize)]
struct ClaudeMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ClaudeRequest {
    model: String,
    messages: Vec<ClaudeMessage>,
    max_tokens: u32,
    system: String,
    temperature: f32,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContentBlock>,
}

#[derive(Deserialize)]
struct ClaudeContentBlock {
    text: String,
}

pub struct ClaudeStyleClient {
    http: HttpLlmClient,
    endpoint: String,
    api_key: String,
    model: String,
    max_output_tokens: u32,
    temperature: f32,
}

impl ClaudeStyleClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        max_output_tokens: u32,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            http: HttpLlmClient::new(timeout)?,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            max_output_tokens,
            temperature,
        })
    }
}

#[async_trait]
impl LlmClient for ClaudeStyleClient {
    async fn extract_answer(&self, query: &str, chunk_text: &str) -> Result<RawAnswer> {
        let request = ClaudeRequest {
            model: self.model.clone(),
            messages: vec![ClaudeMessage {
                role: "user",
                content: user_message(query, chunk_text),
            }],
            max_tokens: self.max_output_tokens,
            system: SYSTEM_INSTRUCTION.to_string(),
            temperature: self.temperature,
        };

        let headers = [
            ("x-api-key".to_string(), self.api_key.clone()),
            ("anthropic-version".to_string(), "2023-06-01".to_string()),
        ];

        let response: ClaudeResponse = self
            .http
            .post_json(&self.endpoint, &request, &headers)
            .await?;

        let raw_text = response
            .content
            .first()
            .map(|block| block.text.as_str())
            .unwrap_or("");

        Ok(parse_reply(raw_text))
    }
}
