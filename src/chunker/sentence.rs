//! Sentence boundary detection: `.`/`!`/`?` followed by whitespace-or-end,
//! with the terminator kept attached to the preceding sentence.
//!
//! The `regex` crate has no lookaround support, so boundary detection is a
//! manual scan rather than a single pattern match.

#[derive(Clone, Debug, PartialEq)]
pub struct Sentence {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Split `text` into sentences, discarding fragments at or below
/// `min_fragment_chars` (treated as abbreviation noise per spec.md §4.C).
pub fn split_sentences(text: &str, min_fragment_chars: usize) -> Vec<Sentence> {
    let chars: Vec<char> = text.chars().collect();
    let n = chars.len();
    let mut sentences = Vec::new();
    let mut seg_start = 0usize;
    let mut i = 0usize;

    while i < n {
        let c = chars[i];
        if c == '.' || c == '!' || c == '?' {
            let at_boundary = i + 1 >= n || chars[i + 1].is_whitespace();
            if at_boundary {
                push_trimmed(&chars, seg_start, i + 1, min_fragment_chars, &mut sentences);
                seg_start = i + 1;
            }
        }
        i += 1;
    }
    if seg_start < n {
        push_trimmed(&chars, seg_start, n, min_fragment_chars, &mut sentences);
    }

    sentences
}

fn push_trimmed(
    chars: &[char],
    start: usize,
    end: usize,
    min_fragment_chars: usize,
    out: &mut Vec<Sentence>,
) {
    // Trim surrounding whitespace without losing absolute offsets.
    let mut s = start;
    while s < end && chars[s].is_whitespace() {
        s += 1;
    }
    let mut e = end;
    while e > s && chars[e - 1].is_whitespace() {
        e -= 1;
    }
    if e <= s {
        return;
    }
    if e - s <= min_fragment_chars {
        return;
    }
    out.push(Sentence {
        text: chars[s..e].iter().collect(),
        start: s,
        end: e,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_terminators_followed_by_whitespace() {
        let sentences = split_sentences("Paris is nice. It is sunny! Is it warm?", 0);
        let texts: Vec<_> = sentences.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Paris is nice.", "It is sunny!", "Is it warm?"]);
    }

    #[test]
    fn does_not_split_on_mid_token_period() {
        // "3.14" has no whitespace after the period, so it is not a boundary.
        let sentences = split_sentences("Pi is about 3.14 in value.", 0);
        assert_eq!(sentences.len(), 1);
    }

    #[test]
    fn drops_fragments_at_or_below_threshold() {
        let sentences = split_sentences("Dr. Smith arrived today.", 10);
        assert!(sentences.iter().all(|s| s.text != "Dr."));
    }

    #[test]
    fn offsets_index_into_original_text() {
        let text = "Hello there. Goodbye now.";
        let sentences = split_sentences(text, 0);
        for s in &sentences {
            let slice: String = text.chars().skip(s.start).take(s.end - s.start).collect();
            assert_eq!(slice, s.text);
        }
    }
}
