//! MIME body extraction and body resolution.

use crate::pipeline::markup::{ConvertOptions, MarkupConverter};
use crate::pipeline::quotations::QuotationStripper;
use crate::pipeline::types::{RawMessage, ResolvedBody};

/// Plaintext bodies starting with this marker defer to the HTML part.
const HTML_FALLBACK_MARKER: &str = "__";

/// Decode the first part with the given content type.
///
/// Parts whose content type does not exactly match are ignored. A
/// matching part without a declared charset is skipped and the walk
/// continues — it is never decoded with a default. Decoding failures
/// are tolerated by dropping undecodable byte sequences.
pub fn extract_part(message: &RawMessage, content_type: &str) -> Option<String> {
    for part in message.parts() {
        if part.content_type != content_type {
            continue;
        }
        let Some(charset) = part.charset.as_deref() else {
            continue;
        };
        // An unrecognized charset label is treated like a missing one.
        let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) else {
            continue;
        };
        let (decoded, _, _) = encoding.decode(&part.payload);
        return Some(decoded.replace('\u{FFFD}', ""));
    }
    None
}

/// Resolve the message body to one of the three terminal states.
///
/// Plaintext is preferred. When quotation removal is on, quotations are
/// stripped from whichever part is used. A plaintext body that starts
/// with `__` while an HTML part exists is treated as unusable and the
/// HTML part is converted instead, unwrapped and with `*` emphasis.
pub fn resolve_body(
    message: &RawMessage,
    remove_quotations: bool,
    stripper: &dyn QuotationStripper,
    converter: &dyn MarkupConverter,
) -> ResolvedBody {
    let plaintext = extract_part(message, "text/plain");
    let html = extract_part(message, "text/html");

    if let Some(original) = plaintext.filter(|text| !text.is_empty()) {
        let text = if remove_quotations {
            stripper.strip_plain(&original)
        } else {
            original.clone()
        };
        if !text.is_empty() && !(original.starts_with(HTML_FALLBACK_MARKER) && html.is_some()) {
            return ResolvedBody::Plaintext(text);
        }
    }

    if let Some(mut html) = html {
        if remove_quotations {
            html = stripper.strip_html(&html);
        }
        let markup = converter.convert(&html, &ConvertOptions::default());
        return ResolvedBody::HtmlConverted(markup);
    }

    ResolvedBody::Empty
}
