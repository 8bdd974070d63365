//! Subject extraction and prefix normalization.

use crate::pipeline::types::RawMessage;

/// Topic used when a mail has no subject at all.
pub const NO_TOPIC: &str = "(no topic)";

/// Topic used when the subject could not be decoded.
pub const UNREADABLE_SUBJECT: &str = "(unreadable subject)";

/// Extract the subject from a message, falling back to fixed sentinels.
///
/// The mailbox collaborator decodes RFC 2047 encoded-words before the
/// subject reaches this point; an encoded-word the parser could not
/// decode is left in its raw `=?..?=` form and is mapped to the
/// unreadable sentinel here.
pub fn extract_subject(message: &RawMessage) -> String {
    let raw = message.header("Subject").map(str::trim).unwrap_or("");
    if raw.is_empty() {
        return NO_TOPIC.to_string();
    }
    if raw.starts_with("=?") && raw.ends_with("?=") {
        return UNREADABLE_SUBJECT.to_string();
    }
    raw.to_string()
}

/// Remove unwanted prefixes from the subject, case-insensitively.
///
/// Repeatedly strips the first matching prefix (in configured order) and
/// any whitespace following it, until no prefix matches. Terminates
/// because each removal strictly shortens the subject; the config layer
/// guarantees prefixes are non-empty.
pub fn normalize_subject(subject: &str, prefixes: &[String]) -> String {
    let mut subject = subject.trim();
    loop {
        let Some(rest) = prefixes
            .iter()
            .find_map(|prefix| strip_prefix_ci(subject, prefix))
        else {
            break;
        };
        subject = rest.trim_start();
    }
    subject.to_string()
}

/// ASCII case-insensitive prefix strip.
fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    if text.len() >= prefix.len()
        && text.is_char_boundary(prefix.len())
        && text[..prefix.len()].eq_ignore_ascii_case(prefix)
    {
        Some(&text[prefix.len()..])
    } else {
        None
    }
}
