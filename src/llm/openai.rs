//! "OpenAI-style" chat-completions adaptor, using the same system/user
//! message contract as [`super::claude::ClaudeStyleClient`] but OpenAI's
//! wire format.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::http::HttpLlmClient;
use super::{parse_reply, user_message, LlmClient, RawAnswer, SYSTEM_INSTRUCTION};

#[derive(Serialize)]
struct OpenAiMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiReplyMessage,
}

#[derive(Deserialize)]
struct OpenAiReplyMessage {
    content: String,
}

pub struct OpenAiStyleClient {
    http: HttpLlmClient,
    endpoint: String,
    api_key: String,
    model: String,
    max_output_tokens: u32,
    temperature: f32,
}

impl OpenAiStyleClient {
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
impl LlmClient for OpenAiStyleClient {
    async fn extract_answer(&self, query: &str, chunk_text: &str) -> Result<RawAnswer> {
        let request = OpenAiRequest {
            model: self.model.clone(),
            messages: vec![
                OpenAiMessage {
                    role: "system",
                    content: SYSTEM_INSTRUCTION.to_string(),
                },
                OpenAiMessage {
                    role: "user",
                    content: user_message(query, chunk_text),
                },
            ],
            max_tokens: self.max_output_tokens,
            temperature: self.temperature,
        };

        let headers = [(
            "Authorization".to_string(),
            format!("Bearer {}", self.api_key),
        )];

        let response: OpenAiResponse = self
            .http
            .post_json(&self.endpoint, &request, &headers)
            .await?;

        let raw_text = response
            .choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .unwrap_or("");

        Ok(parse_reply(raw_text))
    }
}
