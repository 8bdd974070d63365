//! Quotation stripping — removes quoted reply chains from mail bodies.

use regex::Regex;

/// Removes quoted reply chains from plaintext or HTML content.
pub trait QuotationStripper: Send + Sync {
    fn strip_plain(&self, text: &str) -> String;
    fn strip_html(&self, html: &str) -> String;
}

/// Regex-based quotation stripper.
///
/// All patterns are compiled once at startup and the stripper is passed
/// into the pipeline as a dependency.
pub struct RegexQuotationStripper {
    plain_markers: Vec<Regex>,
    blockquote: Regex,
    gmail_quote: Regex,
}

impl RegexQuotationStripper {
    pub fn new() -> Self {
        Self {
            plain_markers: vec![
                // "On Mon, 1 Jan 2024, Alice wrote:"
                Regex::new(r"(?m)^On .{0,200}wrote:[ \t]*$").unwrap(),
                Regex::new(r"(?mi)^-{2,}[ \t]*Original Message[ \t]*-{2,}[ \t]*$").unwrap(),
                Regex::new(r"(?mi)^-{2,}[ \t]*Forwarded message[ \t]*-{2,}[ \t]*$").unwrap(),
            ],
            blockquote: Regex::new(r"(?is)<blockquote.*?</blockquote>").unwrap(),
            gmail_quote: Regex::new(r#"(?is)<div[^>]*class="[^"]*gmail_quote[^"]*".*"#).unwrap(),
        }
    }
}

impl Default for RegexQuotationStripper {
    fn default() -> Self {
        Self::new()
    }
}

impl QuotationStripper for RegexQuotationStripper {
    /// Cut the text at the first reply marker, then drop trailing
    /// `>`-quoted lines.
    fn strip_plain(&self, text: &str) -> String {
        let mut cut = text.len();
        for marker in &self.plain_markers {
            if let Some(m) = marker.find(text) {
                cut = cut.min(m.start());
            }
        }

        let head = &text[..cut];
        let lines: Vec<&str> = head.lines().collect();
        let mut end = lines.len();
        while end > 0 {
            let line = lines[end - 1].trim_start();
            if line.starts_with('>') || line.is_empty() {
                end -= 1;
            } else {
                break;
            }
        }

        lines[..end].join("\n").trim().to_string()
    }

    /// Remove `<blockquote>` elements and trailing gmail quote containers.
    fn strip_html(&self, html: &str) -> String {
        let without_blockquotes = self.blockquote.replace_all(html, "");
        self.gmail_quote
            .replace_all(&without_blockquotes, "")
            .into_owned()
    }
}
