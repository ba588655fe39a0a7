//! Pluggable LLM adaptors for the Answer Extractor (spec.md §4.G).
//!
//! The extractor depends on a single capability, `extract_answer`; concrete
//! providers implement the trait and nothing upstream needs to know which
//! one is wired in, mirroring `the_agency::llm::provider::LlmProvider`'s
//! "one trait, many HTTP backends" shape.

pub mod claude;
pub mod http;
pub mod openai;

pub use claude::ClaudeStyleClient;
pub use openai::OpenAiStyleClient;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;

pub const SYSTEM_INSTRUCTION: &str = "Extract only what is present in the provided text chunk. \
Do not use outside knowledge. Respond as a strict JSON object with keys: \
answer (string, possibly empty), confidence (float in [0,1]), has_answer (bool), \
reasoning (string).";

pub fn user_message(query: &str, chunk_text: &str) -> String {
    format!("Query: {query}\n\nText Chunk:\n{chunk_text}\n\nExtract the answer from this chunk:")
}

/// Raw JSON shape the LLM is asked to return.
///
/// `is_parse_failure` is never part of the wire format (`#[serde(skip)]`):
/// it distinguishes "the model replied but the reply wasn't parseable JSON"
/// from a legitimate `has_answer: false` result, so [`QaSearch`](crate::qa::QaSearch)
/// can tell a genuine no-answer outcome apart from every candidate's reply
/// failing to parse, per spec.md §7.
#[derive(Debug, Deserialize)]
pub struct RawAnswer {
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub has_answer: bool,
    #[serde(default)]
    pub reasoning: String,
    #[serde(skip)]
    pub is_parse_failure: bool,
}

impl RawAnswer {
    /// A reply the model produced but that didn't parse as the expected JSON shape.
    pub fn parse_failure() -> Self {
        Self {
            answer: String::new(),
            confidence: 0.0,
            has_answer: false,
            reasoning: "parse failure".to_string(),
            is_parse_failure: true,
        }
    }

    /// A well-formed reply reporting that the chunk has no answer. Distinct
    /// from [`Self::parse_failure`]: this is the normal "no answer here"
    /// result spec.md §7 says must never be treated as an exception.
    pub fn no_answer() -> Self {
        Self {
            answer: String::new(),
            confidence: 0.0,
            has_answer: false,
            reasoning: String::new(),
            is_parse_failure: false,
        }
    }

    pub fn clamp_confidence(mut self) -> Self {
        self.confidence = self.confidence.clamp(0.0, 1.0);
        self
    }
}

/// The capability the Answer Extractor depends on. Providers implement this
/// and nothing else; adding a provider means adding an adaptor, not
/// touching the extractor (spec.md §9 "Pluggable LLM").
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn extract_answer(&self, query: &str, chunk_text: &str) -> Result<RawAnswer>;
}

/// Parses a model's raw text reply, falling back to a parse-failure answer
/// rather than propagating the error, per spec.md §4.G post-processing.
pub fn parse_reply(raw_text: &str) -> RawAnswer {
    match serde_json::from_str::<RawAnswer>(raw_text) {
        Ok(answer) => answer.clamp_confidence(),
        Err(_) => RawAnswer::parse_failure(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_reply() {
        let reply = r#"{"answer":"Paris","confidence":0.9,"has_answer":true,"reasoning":"stated directly"}"#;
        let parsed = parse_reply(reply);
        assert_eq!(parsed.answer, "Paris");
        assert!(parsed.has_answer);
        assert!(!parsed.is_parse_failure);
    }

    #[test]
    fn malformed_reply_falls_back_to_parse_failure() {
        let parsed = parse_reply("not json");
        assert_eq!(parsed.reasoning, "parse failure");
        assert_eq!(parsed.confidence, 0.0);
        assert!(!parsed.has_answer);
        assert!(parsed.is_parse_failure);
    }

    #[test]
    fn well_formed_no_answer_reply_is_not_a_parse_failure() {
        let reply = r#"{"answer":"","confidence":0.0,"has_answer":false,"reasoning":"not mentioned"}"#;
        let parsed = parse_reply(reply);
        assert!(!parsed.has_answer);
        assert!(!parsed.is_parse_failure);
    }

    #[test]
    fn out_of_range_confidence_is_clamped() {
        let reply = r#"{"answer":"x","confidence":1.7,"has_answer":true,"reasoning":"r"}"#;
        let parsed = parse_reply(reply);
        assert_eq!(parsed.confidence, 1.0);
    }
}
