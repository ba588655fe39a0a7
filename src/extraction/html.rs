//! HTML text extraction, using `scraper` the way `wg-ragsmith` already
//! depends on it for its own ingestion path.

use scraper::{Html, Node};

const BLOCK_TAGS: &[&str] = &[
    "div", "p", "h1", "h2", "h3", "h4", "h5", "h6", "br", "hr", "blockquote", "pre", "ul", "ol",
    "li", "table", "tr", "td", "th", "section", "article", "header", "footer", "main", "aside",
    "nav",
];

/// Emits text nodes in document order, skipping `<script>`/`<style>`
/// contents and inserting a newline at block-level element boundaries, per
/// spec.md §4.A.
pub fn extract_html(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut raw = String::new();
    walk(document.tree.root(), &mut raw);
    collapse_whitespace(&raw)
}

fn walk(node: ego_tree::NodeRef<'_, Node>, out: &mut String) {
    match node.value() {
        Node::Text(text) => out.push_str(text),
        Node::Element(element) => {
            let name = element.name().to_ascii_lowercase();
            if name == "script" || name == "style" {
                return;
            }
            let is_block = BLOCK_TAGS.contains(&name.as_str());
            if is_block {
                out.push('\n');
            }
            for child in node.children() {
                walk(child, out);
            }
            if is_block {
                out.push('\n');
            }
        }
        _ => {
            for child in node.children() {
                walk(child, out);
            }
        }
    }
}

/// Collapse runs of non-newline whitespace to a single space, and runs of
/// blank lines to at most one.
fn collapse_whitespace(raw: &str) -> String {
    let mut spaced = String::with_capacity(raw.len());
    let mut last_was_space = false;
    for c in raw.chars() {
        if c == '\n' {
            spaced.push('\n');
            last_was_space = false;
        } else if c.is_whitespace() {
            if !last_was_space {
                spaced.push(' ');
            }
            last_was_space = true;
        } else {
            spaced.push(c);
            last_was_space = false;
        }
    }

    let lines: Vec<&str> = spaced.lines().map(|l| l.trim()).collect();
    let mut result_lines: Vec<&str> = Vec::with_capacity(lines.len());
    let mut prev_blank = false;
    for line in lines {
        let blank = line.is_empty();
        if blank && prev_blank {
            continue;
        }
        result_lines.push(line);
        prev_blank = blank;
    }

    result_lines.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_script_and_style_content() {
        let html = "<html><body><script>var x = 1;</script><style>.a{}</style><p>Hello</p></body></html>";
        let text = extract_html(html);
        assert_eq!(text, "Hello");
    }

    #[test]
    fn inserts_newline_at_block_boundaries() {
        let html = "<html><body><p>First</p><p>Second</p></body></html>";
        let text = extract_html(html);
        assert_eq!(text, "First\n\nSecond");
    }

    #[test]
    fn collapses_inline_whitespace_runs() {
        let html = "<html><body><p>Hello    world</p></body></html>";
        let text = extract_html(html);
        assert_eq!(text, "Hello world");
    }
}
