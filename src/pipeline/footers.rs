//! Footer filtering — drops signature/boilerplate sections from a body.

use regex::Regex;

/// Removes footer sections introduced by `--` or `__` separator lines.
///
/// The separator regex is compiled once at construction and the filter
/// is handed to the pipeline as a dependency.
pub struct FooterFilter {
    separator: Regex,
    keywords: Vec<String>,
}

impl FooterFilter {
    pub fn new(keywords: Vec<String>) -> Self {
        // A separator is a whole line starting with -- or __, bounded by newlines.
        let separator = Regex::new(r"\n--.*\n|\n__.*\n").unwrap();
        Self { separator, keywords }
    }

    /// Split the body on separator lines and drop footer sections.
    ///
    /// One or two sections means the body had at most a single trailing
    /// footer; the first section is returned as-is. With more sections,
    /// any section containing a configured keyword as a whole line is
    /// discarded and the rest are rejoined.
    pub fn filter(&self, text: &str) -> String {
        let sections: Vec<&str> = self.separator.split(text).collect();

        if sections.len() <= 2 {
            return sections.first().unwrap_or(&"").trim().to_string();
        }

        let useful: Vec<&str> = sections
            .into_iter()
            .filter(|section| {
                !self
                    .keywords
                    .iter()
                    .any(|keyword| section.lines().any(|line| line == keyword))
            })
            .collect();

        useful.join("\n").trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter_with(keywords: &[&str]) -> FooterFilter {
        FooterFilter::new(keywords.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn no_separator_returns_trimmed_input() {
        let f = filter_with(&[]);
        assert_eq!(f.filter("  hello\nworld \n"), "hello\nworld");
    }

    #[test]
    fn single_footer_is_dropped_with_body_kept() {
        let f = filter_with(&[]);
        let text = "body text\n-- \nsignature line";
        assert_eq!(f.filter(text), "body text");
    }

    #[test]
    fn keyword_sections_are_discarded() {
        let f = filter_with(&["unsubscribe"]);
        let text = "body\n--\nkeep me\n--\nplease\nunsubscribe\nhere";
        assert_eq!(f.filter(text), "body\nkeep me");
    }

    #[test]
    fn keyword_must_match_whole_line() {
        let f = filter_with(&["unsubscribe"]);
        let text = "body\n--\nmid\n--\nclick to unsubscribe now";
        // Keyword appears inside a line, not as one — section survives.
        assert_eq!(f.filter(text), "body\nmid\nclick to unsubscribe now");
    }

    #[test]
    fn underscore_separator_recognized() {
        let f = filter_with(&["legal notice"]);
        let text = "body\n____\na\n____\nlegal notice";
        assert_eq!(f.filter(text), "body\na");
    }

    #[test]
    fn never_increases_length() {
        let f = filter_with(&["x"]);
        for text in [
            "plain",
            "a\n--\nb",
            "a\n--\nb\n--\nx\nc",
            "\n--\n\n--\n\n--\n",
            "",
        ] {
            assert!(f.filter(text).len() <= text.len());
        }
    }

    #[test]
    fn empty_input() {
        let f = filter_with(&[]);
        assert_eq!(f.filter(""), "");
    }
}
