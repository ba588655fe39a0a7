//! PDF text extraction via `lopdf`.
//!
//! `lopdf` gives low-level document/page access rather than a one-shot
//! "extract all text" API, the same layering `oxidize-pdf-core`'s own
//! `text/extraction.rs` builds on top of its content-stream parser.

use lopdf::Document;

use crate::error::{CoreError, Result};

pub fn extract(bytes: &[u8]) -> Result<String> {
    let mut document = Document::load_mem(bytes)
        .map_err(|err| CoreError::InvalidInput(format!("malformed PDF: {err}")))?;

    if document.is_encrypted() {
        // Attempt empty-password decryption once, per spec.md §4.A.
        if document.decrypt("").is_err() {
            return Err(CoreError::Encrypted);
        }
    }

    let pages = document.get_pages();
    let mut page_numbers: Vec<u32> = pages.keys().copied().collect();
    page_numbers.sort_unstable();

    let mut sections = Vec::with_capacity(page_numbers.len());
    for page_number in page_numbers {
        // Unextractable pages are skipped silently, per spec.md §4.A.
        if let Ok(text) = document.extract_text(&[page_number]) {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                sections.push(trimmed.to_string());
            }
        }
    }

    Ok(sections.join("\n\n"))
}
