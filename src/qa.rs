//! `QaSearch`: the outer call that turns a query into ranked, confidence-
//! scored answers by running the Answer Extractor over every fused
//! candidate from the [`HybridRetriever`], per spec.md §4.G "Ranking".

use std::sync::Arc;

use crate::error::{CoreError, Result};
use crate::ids::UserId;
use crate::llm::LlmClient;
use crate::model::{AnswerResult, ChunkSpan};
use crate::retriever::{Candidate, HybridRetriever};

const CONFIDENCE_FLOOR: f32 = 0.1;

pub struct QaSearch {
    retriever: HybridRetriever,
    llm: Arc<dyn LlmClient>,
}

impl QaSearch {
    pub fn new(retriever: HybridRetriever, llm: Arc<dyn LlmClient>) -> Self {
        Self { retriever, llm }
    }

    pub async fn ask(
        &self,
        user_id: UserId,
        query_text: &str,
        query_vector: &[f32],
        k: usize,
    ) -> Result<Vec<AnswerResult>> {
        let candidates = self
            .retriever
            .retrieve(user_id, query_text, query_vector, k)
            .await?;

        let mut answers = Vec::with_capacity(candidates.len());
        let mut failures = 0usize;

        for candidate in &candidates {
            match self.llm.extract_answer(query_text, &candidate.chunk_text).await {
                Ok(raw) if raw.is_parse_failure => failures += 1,
                Ok(raw) => {
                    if raw.has_answer && raw.confidence > CONFIDENCE_FLOOR {
                        answers.push(to_answer_result(candidate, raw.answer, raw.confidence));
                    }
                }
                Err(_) => failures += 1,
            }
        }

        // Per spec.md §7: a `has_answer: false` reply is a normal result and
        // never counts as a failure here; only network errors and unparseable
        // replies do. The call errors only when every candidate failed.
        if !candidates.is_empty() && failures == candidates.len() {
            return Err(CoreError::LlmFailure(
                "every candidate failed answer extraction".to_string(),
            ));
        }

        answers.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        answers.truncate(k);
        Ok(answers)
    }
}

fn to_answer_result(candidate: &Candidate, answer: String, confidence: f32) -> AnswerResult {
    let (page_num, start_time_s, end_time_s, speaker) = match &candidate.chunk_span {
        ChunkSpan::Document { page, .. } => (*page, None, None, None),
        ChunkSpan::Audio {
            start_time_s,
            end_time_s,
            speaker_id,
        } => (None, Some(*start_time_s), Some(*end_time_s), speaker_id.clone()),
        ChunkSpan::Web { .. } => (None, None, None, None),
    };

    AnswerResult {
        answer,
        confidence,
        has_answer: true,
        chunk_id: candidate.chunk_id,
        source_chunk: candidate.chunk_text.clone(),
        source_title: candidate.title.clone(),
        content_type: candidate.content_type,
        page_num,
        start_time_s,
        end_time_s,
        speaker,
    }
    .clamp_confidence()
}
