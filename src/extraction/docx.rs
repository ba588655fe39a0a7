//! DOCX text extraction: a DOCX file is itself a ZIP of XML parts, so this
//! reuses the same `zip` dependency the EPUB extractor uses and pulls the
//! main document body out of `word/document.xml` with `quick-xml`.

use std::io::Read;

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use crate::error::{CoreError, Result};

pub fn extract(bytes: &[u8]) -> Result<String> {
    let cursor = std::io::Cursor::new(bytes);
    let mut archive = ZipArchive::new(cursor)
        .map_err(|err| CoreError::InvalidInput(format!("malformed DOCX: {err}")))?;

    let mut document_xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|_| CoreError::InvalidInput("DOCX missing word/document.xml".to_string()))?
        .read_to_string(&mut document_xml)
        .map_err(|err| CoreError::InvalidInput(format!("malformed DOCX body: {err}")))?;

    Ok(body_text(&document_xml))
}

/// Walk the document body, emitting each text run and a newline per
/// paragraph (`w:p`) boundary.
fn body_text(xml: &str) -> String {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut out = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(tag)) => {
                if local_name(tag.name().as_ref()) == "t" {
                    in_text_run = true;
                }
            }
            Ok(Event::Text(text)) => {
                if in_text_run {
                    if let Ok(unescaped) = text.unescape() {
                        out.push_str(&unescaped);
                    }
                }
            }
            Ok(Event::End(tag)) => {
                let name = local_name(tag.name().as_ref());
                if name == "t" {
                    in_text_run = false;
                } else if name == "p" {
                    out.push('\n');
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
    }

    out.trim().to_string()
}

/// Strip a namespace prefix (`w:t` -> `t`) since we only care about the
/// local element name.
fn local_name(qualified: &[u8]) -> &str {
    let s = std::str::from_utf8(qualified).unwrap_or("");
    s.rsplit(':').next().unwrap_or(s)
}
