//! Message formatting for the destination chat service.

/// Prefix every line of the text with a quote marker.
pub fn quote_each_line(text: &str) -> String {
    text.lines()
        .map(|line| format!("> {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Substitute sender and body into the configured message template.
///
/// The template carries `{sender}` and `{body}` placeholders; the config
/// layer validates that both are present.
pub fn render_template(template: &str, sender: &str, body: &str) -> String {
    template.replace("{sender}", sender).replace("{body}", body)
}
