//! EPUB text extraction: treat the container as a ZIP archive and run each
//! XHTML/HTML entry through the HTML extractor, per spec.md §4.A.

use std::io::{Cursor, Read};

use zip::ZipArchive;

use super::html::extract_html;
use crate::error::{CoreError, Result};

pub fn extract(bytes: &[u8]) -> Result<String> {
    let cursor = Cursor::new(bytes);
    let mut archive = ZipArchive::new(cursor)
        .map_err(|err| CoreError::InvalidInput(format!("malformed EPUB: {err}")))?;

    let mut sections = Vec::new();
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|err| CoreError::InvalidInput(format!("malformed EPUB entry: {err}")))?;
        let name = entry.name().to_ascii_lowercase();
        if !(name.ends_with(".xhtml") || name.ends_with(".html") || name.ends_with(".htm")) {
            continue;
        }

        let mut contents = String::new();
        if entry.read_to_string(&mut contents).is_err() {
            continue;
        }

        let text = extract_html(&contents);
        if !text.is_empty() {
            sections.push(text);
        }
    }

    Ok(sections.join("\n\n"))
}
