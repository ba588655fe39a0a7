//! `cl100k_base` tokenizer, the vocabulary spec.md §4.B names as the
//! reference implementation's BPE scheme.

use tiktoken_rs::CoreBPE;

use super::Tokenizer;

pub struct Cl100kTokenizer {
    bpe: CoreBPE,
}

impl Cl100kTokenizer {
    pub fn new() -> Result<Self, anyhow::Error> {
        Ok(Self {
            bpe: tiktoken_rs::cl100k_base()?,
        })
    }
}

impl Tokenizer for Cl100kTokenizer {
    fn encode(&self, text: &str) -> Vec<u32> {
        self.bpe
            .encode_ordinary(text)
            .into_iter()
            .map(|id| id as u32)
            .collect()
    }

    fn decode(&self, tokens: &[u32]) -> String {
        let ids: Vec<usize> = tokens.iter().map(|&id| id as usize).collect();
        self.bpe.decode(ids).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_ascii_text() {
        let tok = Cl100kTokenizer::new().unwrap();
        let text = "Paris is the capital of France.";
        let tokens = tok.encode(text);
        assert!(!tokens.is_empty());
        assert_eq!(tok.count(text), tokens.len());
        assert_eq!(tok.decode(&tokens), text);
    }

    #[test]
    fn truncate_shortens_to_n_tokens() {
        let tok = Cl100kTokenizer::new().unwrap();
        let text = "one two three four five six seven eight nine ten";
        let truncated = tok.truncate(text, 3);
        assert!(tok.count(&truncated) <= 3);
    }
}
