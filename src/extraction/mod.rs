//! Bytes + filename -> UTF-8 plain text (spec.md §4.A).

mod docx;
mod epub;
mod html;
mod pdf;

pub use html::extract_html;

use crate::error::{CoreError, Result};

/// Text produced by the extractor, trimmed but with internal paragraph
/// structure (blank-line separators between pages/sections) preserved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
}

/// Dispatches on the lowercased filename extension, per spec.md §4.A.
pub fn extract(bytes: &[u8], filename: &str) -> Result<ExtractedText> {
    let extension = filename
        .rsplit('.')
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();

    let raw = match extension.as_str() {
        "txt" => decode_lossy(bytes),
        "pdf" => pdf::extract(bytes)?,
        "epub" => epub::extract(bytes)?,
        "docx" => docx::extract(bytes)?,
        "html" | "htm" => html::extract_html(&decode_lossy(bytes)),
        _ => decode_lossy(bytes),
    };

    let trimmed = raw.trim().to_string();
    if trimmed.is_empty() {
        return Err(CoreError::EmptyContent);
    }

    Ok(ExtractedText { text: trimmed })
}

fn decode_lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn txt_identity_decodes_with_invalid_byte_replacement() {
        let bytes = b"Paris is the capital of France.";
        let out = extract(bytes, "note.txt").unwrap();
        assert_eq!(out.text, "Paris is the capital of France.");
    }

    #[test]
    fn unknown_extension_falls_back_to_utf8() {
        let bytes = b"plain content";
        let out = extract(bytes, "note.xyz").unwrap();
        assert_eq!(out.text, "plain content");
    }

    #[test]
    fn empty_extraction_fails_with_empty_content() {
        let err = extract(b"   \n\t  ", "note.txt").unwrap_err();
        assert_eq!(err.machine_tag(), "EmptyContent");
    }
}
