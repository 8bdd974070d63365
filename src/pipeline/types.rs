//! Shared types for the mirroring pipeline.

// ── Raw message ─────────────────────────────────────────────────────

/// A parsed mail message as supplied by the mailbox collaborator.
///
/// Read-only to the pipeline; created, transformed and discarded within
/// a single `process` call.
#[derive(Debug, Clone)]
pub struct RawMessage {
    /// Mailbox-native message id, used for acknowledgment.
    pub uid: String,
    headers: Vec<(String, String)>,
    parts: Vec<MimePart>,
}

impl RawMessage {
    pub fn new(uid: impl Into<String>, headers: Vec<(String, String)>, parts: Vec<MimePart>) -> Self {
        Self {
            uid: uid.into(),
            headers,
            parts,
        }
    }

    /// Look up the first header with the given name, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All MIME parts, in walk order.
    pub fn parts(&self) -> &[MimePart] {
        &self.parts
    }
}

/// A single MIME part of a message.
#[derive(Debug, Clone)]
pub struct MimePart {
    /// Lowercased `type/subtype`, e.g. `text/plain`.
    pub content_type: String,
    /// Declared character set, if any. Parts without one are never decoded.
    pub charset: Option<String>,
    /// Transfer-decoded payload bytes.
    pub payload: Vec<u8>,
}

impl MimePart {
    pub fn new(
        content_type: impl Into<String>,
        charset: Option<&str>,
        payload: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            content_type: content_type.into(),
            charset: charset.map(str::to_string),
            payload: payload.into(),
        }
    }
}

// ── Body resolution ─────────────────────────────────────────────────

/// Terminal states of body resolution.
///
/// Exactly one of these holds per message: a usable plaintext part, a
/// markup rendering of the HTML part, or nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedBody {
    Plaintext(String),
    HtmlConverted(String),
    Empty,
}

impl ResolvedBody {
    /// The resolved text; empty for `Empty`.
    pub fn into_text(self) -> String {
        match self {
            Self::Plaintext(text) | Self::HtmlConverted(text) => text,
            Self::Empty => String::new(),
        }
    }
}

// ── Outbound ────────────────────────────────────────────────────────

/// A message ready to be posted to the destination chat service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Destination channel (Zulip stream).
    pub channel: String,
    /// Topic within the channel — the normalized subject.
    pub topic: String,
    /// Formatted message content.
    pub content: String,
}

/// Explicit post result reported by the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostOutcome {
    Success,
    Failure { code: String, message: String },
}
