//! HTML to lightweight-markup conversion.

use html2text::render::text_renderer::{RichAnnotation, TaggedLine};
use regex::Regex;

/// Width used when no wrap width is configured. Mail bodies are rendered
/// unwrapped and the destination handles its own line breaking.
const UNWRAPPED_WIDTH: usize = 1 << 20;

/// Rendering options for HTML conversion.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Wrap width; `None` renders without wrapping.
    pub line_wrap: Option<usize>,
    /// Delimiter placed around emphasised spans.
    pub emphasis_marker: char,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            line_wrap: None,
            emphasis_marker: '*',
        }
    }
}

/// Converts an HTML body into lightweight markup text.
pub trait MarkupConverter: Send + Sync {
    fn convert(&self, html: &str, options: &ConvertOptions) -> String;
}

/// Converter backed by the `html2text` rich renderer.
///
/// The rich renderer only annotates `<em>`/`<strong>`, so `<b>` and
/// `<i>` are rewritten to those before rendering. Emphasised spans are
/// wrapped in the configured marker; all other annotations render as
/// plain text.
pub struct Html2TextConverter {
    bold: Regex,
    italic: Regex,
}

impl Html2TextConverter {
    pub fn new() -> Self {
        Self {
            bold: Regex::new(r"(?i)<(/?)b\b([^>]*)>").unwrap(),
            italic: Regex::new(r"(?i)<(/?)i\b([^>]*)>").unwrap(),
        }
    }
}

impl Default for Html2TextConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkupConverter for Html2TextConverter {
    fn convert(&self, html: &str, options: &ConvertOptions) -> String {
        let width = options.line_wrap.unwrap_or(UNWRAPPED_WIDTH);

        let html = self.bold.replace_all(html, "<${1}strong${2}>");
        let html = self.italic.replace_all(&html, "<${1}em${2}>");

        let lines: Vec<TaggedLine<Vec<RichAnnotation>>> =
            html2text::from_read_rich(html.as_bytes(), width);

        let mut out = String::new();
        for line in &lines {
            for piece in line.tagged_strings() {
                let emphasised = piece.tag.iter().any(|annotation| {
                    matches!(
                        annotation,
                        RichAnnotation::Emphasis | RichAnnotation::Strong
                    )
                });
                if emphasised {
                    // The renderer's own decorator bakes `*` into the span
                    // text; strip it so the configured marker is the only one.
                    let text = piece.s.trim_matches('*');
                    if text.trim().is_empty() {
                        out.push_str(text);
                    } else {
                        out.push(options.emphasis_marker);
                        out.push_str(text);
                        out.push(options.emphasis_marker);
                    }
                } else {
                    out.push_str(&piece.s);
                }
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(html: &str) -> String {
        Html2TextConverter::new().convert(html, &ConvertOptions::default())
    }

    #[test]
    fn bold_becomes_emphasis_marker() {
        let out = convert("<p>Hi <b>there</b></p>");
        assert!(out.contains("Hi *there*"), "got: {out:?}");
    }

    #[test]
    fn em_becomes_emphasis_marker() {
        let out = convert("<p>very <em>important</em></p>");
        assert!(out.contains("very *important*"), "got: {out:?}");
    }

    #[test]
    fn strong_is_not_double_wrapped() {
        let out = convert("<p>a <strong>b</strong></p>");
        assert!(out.contains("a *b*"), "got: {out:?}");
        assert!(!out.contains("**"), "got: {out:?}");
    }

    #[test]
    fn italic_tag_becomes_emphasis_marker() {
        let out = convert("<p>x <i>y</i></p>");
        assert!(out.contains("x *y*"), "got: {out:?}");
    }

    #[test]
    fn line_break_tag_is_not_rewritten() {
        let out = convert("<p>one<br>two</p>");
        assert!(out.contains("one"), "got: {out:?}");
        assert!(out.contains("two"), "got: {out:?}");
        assert!(!out.contains("strong"), "got: {out:?}");
    }

    #[test]
    fn long_line_is_not_wrapped() {
        let word = "word ".repeat(100);
        let out = convert(&format!("<p>{word}</p>"));
        let longest = out.lines().map(str::len).max().unwrap_or(0);
        assert!(longest > 400, "line was wrapped: longest {longest}");
    }

    #[test]
    fn custom_emphasis_marker() {
        let options = ConvertOptions {
            emphasis_marker: '_',
            ..ConvertOptions::default()
        };
        let out = Html2TextConverter::new().convert("<p>a <b>b</b></p>", &options);
        assert!(out.contains("a _b_"), "got: {out:?}");
        assert!(!out.contains('*'), "got: {out:?}");
    }

    #[test]
    fn plain_paragraph_text_survives() {
        let out = convert("<p>just text</p>");
        assert!(out.contains("just text"));
    }
}
