//! Word-count fallback used when no BPE vocabulary is available.
//!
//! "Tokens" here are whitespace-delimited word indices rather than subword
//! ids, and `decode` has no vocabulary to map ids back to words; it emits
//! placeholder text and reports `is_lossless() == false` so callers that
//! need real text (the chunker's oversize-sentence windowing) reconstruct
//! from the source directly instead. `count`/`truncate` bounds still hold.

use super::Tokenizer;

#[derive(Default)]
pub struct WordCountTokenizer;

impl WordCountTokenizer {
    pub fn new() -> Self {
        Self
    }

    fn words(text: &str) -> Vec<&str> {
        text.split_whitespace().collect()
    }
}

impl Tokenizer for WordCountTokenizer {
    fn encode(&self, text: &str) -> Vec<u32> {
        (0..Self::words(text).len() as u32).collect()
    }

    fn decode(&self, tokens: &[u32]) -> String {
        // Without a real vocabulary we can't map ids back to words; this
        // placeholder exists purely to keep counting/truncation semantics
        // alive. `is_lossless() == false` tells callers never to persist
        // this output as literal chunk text.
        tokens.iter().map(|_| "_").collect::<Vec<_>>().join(" ")
    }

    fn is_lossless(&self) -> bool {
        false
    }

    fn truncate(&self, text: &str, n: usize) -> String {
        let words = Self::words(text);
        if words.len() <= n {
            text.to_string()
        } else {
            words[..n].join(" ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_whitespace_separated_words() {
        let tok = WordCountTokenizer::new();
        assert_eq!(tok.count("Paris is the capital of France."), 6);
    }

    #[test]
    fn truncate_preserves_prefix_words() {
        let tok = WordCountTokenizer::new();
        assert_eq!(tok.truncate("one two three four", 2), "one two");
    }
}
