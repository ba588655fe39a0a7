//! Token counting and slicing compatible with the embedding/LLM providers.
//!
//! Per spec.md §4.B, the chunker must tolerate either a real BPE vocabulary
//! or a word-count fallback, so both live behind the same [`Tokenizer`] trait.

mod tiktoken_impl;
mod word_count;

pub use tiktoken_impl::Cl100kTokenizer;
pub use word_count::WordCountTokenizer;

/// Token counting and slicing, abstracted over the concrete vocabulary.
pub trait Tokenizer: Send + Sync {
    /// Number of tokens `text` encodes to.
    fn count(&self, text: &str) -> usize {
        self.encode(text).len()
    }

    /// Encode `text` into provider-compatible token ids.
    fn encode(&self, text: &str) -> Vec<u32>;

    /// Decode token ids back into text. Lossy for fallback tokenizers; check
    /// [`Self::is_lossless`] before relying on `decode` output as literal
    /// chunk text.
    fn decode(&self, tokens: &[u32]) -> String;

    /// Whether `decode` reconstructs the exact source text. Fallback
    /// tokenizers that cannot (e.g. [`crate::tokenizer::WordCountTokenizer`])
    /// override this to `false`; callers producing persisted chunk text
    /// (the chunker's oversize-sentence windowing) must bypass `decode` and
    /// reconstruct from the source text directly when this is `false`.
    fn is_lossless(&self) -> bool {
        true
    }

    /// Truncate `text` to at most `n` tokens, preserving the prefix.
    fn truncate(&self, text: &str, n: usize) -> String {
        let tokens = self.encode(text);
        if tokens.len() <= n {
            text.to_string()
        } else {
            self.decode(&tokens[..n])
        }
    }
}
