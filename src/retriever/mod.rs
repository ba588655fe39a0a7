//! Hybrid retrieval: two-channel candidate generation (vector + lexical)
//! followed by a multi-factor fusion score, per spec.md §4.F.
//!
//! Grounded on `wg-ragsmith::stores::Backend::search_similar` for the
//! single-channel shape; the fusion weighting and dual-channel boost have
//! no teacher analogue and are implemented directly from the spec tables.

use std::collections::HashMap;
use std::sync::Arc;

use unicode_segmentation::UnicodeSegmentation;

use crate::error::Result;
use crate::ids::{ChunkId, ContentItemId, UserId};
use crate::model::{ChunkSpan, ContentType};
use crate::store::Store;

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "is",
    "are", "was", "were", "be", "been", "have", "has", "had", "will", "would", "could", "should",
    "this", "that", "these", "those", "it", "its", "i", "you", "he", "she", "we", "they", "them",
    "their",
];

/// One fused candidate, ready for the Answer Extractor.
#[derive(Clone, Debug)]
pub struct Candidate {
    pub chunk_id: ChunkId,
    pub content_item_id: ContentItemId,
    pub chunk_text: String,
    pub chunk_span: ChunkSpan,
    pub title: String,
    pub content_type: ContentType,
    pub score: f32,
    /// The channel's raw relevance signal (`1 - cosine distance` or lexical
    /// rank) before fusion weighting, kept as the tie-break below `score`
    /// in the final ordering per spec.md §5 "Ordering guarantees".
    pub base: f32,
}

pub struct HybridRetriever {
    store: Arc<dyn Store>,
    embedding_model: String,
}

impl HybridRetriever {
    pub fn new(store: Arc<dyn Store>, embedding_model: impl Into<String>) -> Self {
        Self {
            store,
            embedding_model: embedding_model.into(),
        }
    }

    pub async fn retrieve(
        &self,
        user_id: UserId,
        query_text: &str,
        query_vector: &[f32],
        k: usize,
    ) -> Result<Vec<Candidate>> {
        let k_cand = 3 * k.max(1);

        let vector_hits = self
            .store
            .vector_search(user_id, query_vector, &self.embedding_model, k_cand)
            .await?;
        let lexical_hits = self.store.fulltext_search(user_id, query_text, k_cand).await?;

        let vector_ids: std::collections::HashSet<ChunkId> =
            vector_hits.iter().map(|hit| hit.chunk_id).collect();
        let lexical_ids: std::collections::HashSet<ChunkId> =
            lexical_hits.iter().map(|hit| hit.chunk_id).collect();

        let mut fused: HashMap<ChunkId, Candidate> = HashMap::new();

        for hit in vector_hits {
            let base = 1.0 - hit.distance;
            let score = advanced_relevance_score(base, hit.content_type, &hit.chunk_text);
            fused.insert(
                hit.chunk_id,
                Candidate {
                    chunk_id: hit.chunk_id,
                    content_item_id: hit.content_item_id,
                    chunk_text: hit.chunk_text,
                    chunk_span: hit.chunk_span,
                    title: hit.title,
                    content_type: hit.content_type,
                    score,
                    base,
                },
            );
        }

        for hit in lexical_hits {
            let base = hit.rank;
            let score = advanced_relevance_score(base, hit.content_type, &hit.chunk_text);
            match fused.get_mut(&hit.chunk_id) {
                // Present in both channels: keep the higher base score, the
                // dual-channel boost below is applied once at the end.
                Some(existing) => {
                    if score > existing.score {
                        existing.score = score;
                        existing.base = base;
                    }
                }
                None => {
                    fused.insert(
                        hit.chunk_id,
                        Candidate {
                            chunk_id: hit.chunk_id,
                            content_item_id: hit.content_item_id,
                            chunk_text: hit.chunk_text,
                            chunk_span: hit.chunk_span,
                            title: hit.title,
                            content_type: hit.content_type,
                            score,
                            base,
                        },
                    );
                }
            }
        }

        for (chunk_id, candidate) in fused.iter_mut() {
            if vector_ids.contains(chunk_id) && lexical_ids.contains(chunk_id) {
                candidate.score *= 1.2;
            }
        }

        let mut ranked: Vec<Candidate> = fused.into_values().collect();
        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.base.partial_cmp(&a.base).unwrap_or(std::cmp::Ordering::Equal))
                .then_with(|| a.chunk_id.to_string().cmp(&b.chunk_id.to_string()))
        });
        ranked.truncate(k_cand);
        Ok(ranked)
    }
}

fn advanced_relevance_score(base: f32, content_type: ContentType, chunk_text: &str) -> f32 {
    base * w_type(content_type)
        * w_density(chunk_text.len())
        * w_context(chunk_text)
        * w_authority(content_type)
        * w_temporal(content_type)
}

fn w_type(ct: ContentType) -> f32 {
    match ct {
        ContentType::Document => 1.0,
        ContentType::Email => 0.9,
        ContentType::Webpage => 0.8,
        ContentType::Audio => 0.7,
        ContentType::Video => 0.6,
        ContentType::Image => 0.5,
    }
}

fn w_density(len_chars: usize) -> f32 {
    if len_chars < 100 {
        0.5
    } else if len_chars < 300 {
        0.7
    } else if len_chars < 500 {
        0.9
    } else {
        1.0
    }
}

fn w_context(text: &str) -> f32 {
    let words: Vec<&str> = text.unicode_words().collect();
    if words.is_empty() {
        return 0.7;
    }
    let meaningful = words
        .iter()
        .filter(|word| {
            let trimmed = word.trim_matches(|c: char| !c.is_alphanumeric());
            trimmed.chars().count() > 2 && !STOPWORDS.contains(&trimmed.to_lowercase().as_str())
        })
        .count();
    0.7 + 0.3 * (meaningful as f32 / words.len() as f32)
}

fn w_authority(ct: ContentType) -> f32 {
    match ct {
        ContentType::Document => 1.0,
        ContentType::Email => 0.9,
        ContentType::Audio => 0.8,
        ContentType::Webpage => 0.7,
        ContentType::Video | ContentType::Image => 0.8,
    }
}

fn w_temporal(ct: ContentType) -> f32 {
    match ct {
        ContentType::Document => 1.0,
        ContentType::Email => 0.95,
        ContentType::Webpage => 0.9,
        ContentType::Audio | ContentType::Video => 0.85,
        ContentType::Image => 0.95,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn w_type_matches_table() {
        assert_eq!(w_type(ContentType::Document), 1.0);
        assert_eq!(w_type(ContentType::Email), 0.9);
        assert_eq!(w_type(ContentType::Webpage), 0.8);
        assert_eq!(w_type(ContentType::Audio), 0.7);
        assert_eq!(w_type(ContentType::Video), 0.6);
        assert_eq!(w_type(ContentType::Image), 0.5);
    }

    #[test]
    fn w_density_buckets() {
        assert_eq!(w_density(50), 0.5);
        assert_eq!(w_density(200), 0.7);
        assert_eq!(w_density(450), 0.9);
        assert_eq!(w_density(5000), 1.0);
    }

    #[test]
    fn w_context_all_stopwords_floors_at_0_7() {
        let score = w_context("the a an and or but");
        assert!((score - 0.7).abs() < 1e-6);
    }

    #[test]
    fn w_context_all_meaningful_reaches_1_0() {
        let score = w_context("quarterly revenue forecast budget ceiling");
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn fusion_is_idempotent_on_a_fixed_list() {
        let mut candidates = vec![
            Candidate {
                chunk_id: ChunkId::new(),
                content_item_id: ContentItemId::new(),
                chunk_text: "alpha".into(),
                chunk_span: ChunkSpan::Document {
                    page: Some(1),
                    start_char: 0,
                    end_char: 5,
                },
                title: "a".into(),
                content_type: ContentType::Document,
                score: 0.9,
                base: 0.9,
            },
            Candidate {
                chunk_id: ChunkId::new(),
                content_item_id: ContentItemId::new(),
                chunk_text: "beta".into(),
                chunk_span: ChunkSpan::Document {
                    page: Some(1),
                    start_char: 0,
                    end_char: 4,
                },
                title: "b".into(),
                content_type: ContentType::Document,
                score: 0.4,
                base: 0.4,
            },
        ];

        let sort = |c: &mut Vec<Candidate>| {
            c.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap()
                    .then_with(|| b.base.partial_cmp(&a.base).unwrap())
                    .then_with(|| a.chunk_id.to_string().cmp(&b.chunk_id.to_string()))
            });
        };

        sort(&mut candidates);
        let first_pass: Vec<ChunkId> = candidates.iter().map(|c| c.chunk_id).collect();
        sort(&mut candidates);
        let second_pass: Vec<ChunkId> = candidates.iter().map(|c| c.chunk_id).collect();
        assert_eq!(first_pass, second_pass);
    }

    proptest! {
        /// spec.md §8 invariant 7: fusion ordering is idempotent for any
        /// score distribution, not just the fixed list above.
        #[test]
        fn fusion_ordering_is_idempotent_for_any_scores(
            scores in prop::collection::vec(0.0f32..1.0f32, 1..20)
        ) {
            let mut candidates: Vec<Candidate> = scores
                .iter()
                .map(|&score| Candidate {
                    chunk_id: ChunkId::new(),
                    content_item_id: ContentItemId::new(),
                    chunk_text: String::new(),
                    chunk_span: ChunkSpan::Document {
                        page: None,
                        start_char: 0,
                        end_char: 0,
                    },
                    title: String::new(),
                    content_type: ContentType::Document,
                    score,
                    base: score,
                })
                .collect();

            let sort = |c: &mut Vec<Candidate>| {
                c.sort_by(|a, b| {
                    b.score
                        .partial_cmp(&a.score)
                        .unwrap()
                        .then_with(|| b.base.partial_cmp(&a.base).unwrap())
                        .then_with(|| a.chunk_id.to_string().cmp(&b.chunk_id.to_string()))
                });
            };

            sort(&mut candidates);
            let first_pass: Vec<ChunkId> = candidates.iter().map(|c| c.chunk_id).collect();
            sort(&mut candidates);
            let second_pass: Vec<ChunkId> = candidates.iter().map(|c| c.chunk_id).collect();
            prop_assert_eq!(first_pass, second_pass);
        }
    }
}
