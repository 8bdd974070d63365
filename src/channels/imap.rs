//! IMAP mailbox source — blocking IMAP over TLS, one pass per connection.

use std::collections::VecDeque;
use std::io::{Read as IoRead, Write as IoWrite};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mail_parser::{MessageParser, MimeHeaders, PartType};
use secrecy::ExposeSecret;
use tracing::warn;

use crate::channels::MailboxSource;
use crate::config::ImapConfig;
use crate::error::MailboxError;
use crate::pipeline::types::{MimePart, RawMessage};

/// Async wrapper around a blocking IMAP session.
///
/// The session is moved into `spawn_blocking` for each round trip so the
/// blocking socket I/O never runs on a runtime worker.
pub struct ImapMailbox {
    session: Option<ImapSession>,
}

impl ImapMailbox {
    /// Connect, log in, select the mailbox and search for all messages.
    pub async fn connect(
        config: ImapConfig,
        delete_after_read: bool,
    ) -> Result<Self, MailboxError> {
        let session =
            tokio::task::spawn_blocking(move || ImapSession::connect(&config, delete_after_read))
                .await
                .map_err(join_error)??;
        Ok(Self {
            session: Some(session),
        })
    }

    async fn with_session<T, F>(&mut self, op: F) -> Result<T, MailboxError>
    where
        F: FnOnce(&mut ImapSession) -> Result<T, MailboxError> + Send + 'static,
        T: Send + 'static,
    {
        let mut session = self.session.take().ok_or(MailboxError::Closed)?;
        let (session, result) = tokio::task::spawn_blocking(move || {
            let result = op(&mut session);
            (session, result)
        })
        .await
        .map_err(join_error)?;
        self.session = Some(session);
        result
    }
}

#[async_trait]
impl MailboxSource for ImapMailbox {
    async fn next_message(&mut self) -> Result<Option<RawMessage>, MailboxError> {
        self.with_session(|session| session.next_message()).await
    }

    async fn acknowledge(&mut self, message: &RawMessage) -> Result<(), MailboxError> {
        let uid = message.uid.clone();
        self.with_session(move |session| session.acknowledge(&uid))
            .await
    }

    async fn finish(&mut self) -> Result<(), MailboxError> {
        let result = self.with_session(|session| session.finish()).await;
        self.session = None;
        result
    }
}

fn join_error(e: tokio::task::JoinError) -> MailboxError {
    MailboxError::Protocol(format!("mailbox task failed: {e}"))
}

// ── Blocking session ────────────────────────────────────────────────

/// A blocking IMAP session over rustls.
struct ImapSession {
    tls: rustls::StreamOwned<rustls::ClientConnection, TcpStream>,
    tag_counter: u32,
    pending: VecDeque<String>,
    delete_after_read: bool,
}

impl ImapSession {
    fn connect(config: &ImapConfig, delete_after_read: bool) -> Result<Self, MailboxError> {
        let tcp = TcpStream::connect((&*config.host, config.port)).map_err(|e| {
            MailboxError::Connect {
                host: config.host.clone(),
                reason: e.to_string(),
            }
        })?;
        tcp.set_read_timeout(Some(Duration::from_secs(30)))?;

        let mut root_store = rustls::RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let tls_config = Arc::new(
            rustls::ClientConfig::builder()
                .with_root_certificates(root_store)
                .with_no_client_auth(),
        );
        let server_name: rustls::pki_types::ServerName<'_> =
            rustls::pki_types::ServerName::try_from(config.host.clone())
                .map_err(|e| MailboxError::Tls(e.to_string()))?;
        let conn = rustls::ClientConnection::new(tls_config, server_name)
            .map_err(|e| MailboxError::Tls(e.to_string()))?;
        let tls = rustls::StreamOwned::new(conn, tcp);

        let mut session = Self {
            tls,
            tag_counter: 0,
            pending: VecDeque::new(),
            delete_after_read,
        };

        let _greeting = session.read_line()?;

        let login = session.send_cmd(&format!(
            "LOGIN \"{}\" \"{}\"",
            config.username,
            config.password.expose_secret()
        ))?;
        if !login.last().is_some_and(|l| l.contains("OK")) {
            return Err(MailboxError::Protocol("login failed".into()));
        }

        session.send_cmd(&format!("SELECT \"{}\"", config.mailbox))?;

        // One pass over everything in the mailbox, in ascending id order.
        let search = session.send_cmd("SEARCH ALL")?;
        session.pending = parse_search_ids(&search);

        Ok(session)
    }

    /// Fetch and parse the next message, skipping unparseable ones.
    fn next_message(&mut self) -> Result<Option<RawMessage>, MailboxError> {
        while let Some(id) = self.pending.pop_front() {
            let fetch = self.send_cmd(&format!("FETCH {id} RFC822"))?;
            let raw = fetch_literal(&fetch);

            match build_raw_message(&id, raw.as_bytes()) {
                Some(message) => return Ok(Some(message)),
                None => {
                    warn!(id = %id, "Skipping unparseable mail");
                }
            }
        }
        Ok(None)
    }

    fn acknowledge(&mut self, uid: &str) -> Result<(), MailboxError> {
        if self.delete_after_read {
            self.send_cmd(&format!("STORE {uid} +FLAGS (\\Deleted)"))?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), MailboxError> {
        if self.delete_after_read {
            self.send_cmd("EXPUNGE")?;
        }
        self.send_cmd("CLOSE")?;
        self.send_cmd("LOGOUT")?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, MailboxError> {
        let mut buf = Vec::new();
        loop {
            let mut byte = [0u8; 1];
            match self.tls.read(&mut byte) {
                Ok(0) => return Err(MailboxError::Protocol("connection closed".into())),
                Ok(_) => {
                    buf.push(byte[0]);
                    if buf.ends_with(b"\r\n") {
                        return Ok(String::from_utf8_lossy(&buf).to_string());
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn send_cmd(&mut self, cmd: &str) -> Result<Vec<String>, MailboxError> {
        self.tag_counter += 1;
        let tag = format!("A{}", self.tag_counter);
        let full = format!("{tag} {cmd}\r\n");
        self.tls.write_all(full.as_bytes())?;
        self.tls.flush()?;

        let mut lines = Vec::new();
        loop {
            let line = self.read_line()?;
            let done = line.starts_with(&tag);
            lines.push(line);
            if done {
                return Ok(lines);
            }
        }
    }
}

/// Collect message ids from a SEARCH response, in ascending order.
fn parse_search_ids(lines: &[String]) -> VecDeque<String> {
    let mut ids: Vec<u32> = Vec::new();
    for line in lines {
        if line.starts_with("* SEARCH") {
            ids.extend(
                line.split_whitespace()
                    .skip(2)
                    .filter_map(|id| id.parse::<u32>().ok()),
            );
        }
    }
    ids.sort_unstable();
    ids.into_iter().map(|id| id.to_string()).collect()
}

/// Reassemble the RFC 822 literal from a FETCH response.
///
/// The response is the untagged FETCH line, the literal lines, a closing
/// `)` line, and the tagged status line. Only the literal lines belong
/// to the message.
fn fetch_literal(lines: &[String]) -> String {
    let end = lines
        .iter()
        .rposition(|line| line.trim_end() == ")")
        .unwrap_or_else(|| lines.len().saturating_sub(1));
    lines[..end].iter().skip(1).cloned().collect()
}

// ── Parsing ─────────────────────────────────────────────────────────

/// Build the pipeline's [`RawMessage`] from raw RFC 822 bytes.
fn build_raw_message(uid: &str, raw: &[u8]) -> Option<RawMessage> {
    let parsed = MessageParser::default().parse(raw)?;

    let mut headers = Vec::new();
    if let Some(subject) = parsed.subject() {
        headers.push(("Subject".to_string(), subject.to_string()));
    }
    if let Some(from) = format_sender(&parsed) {
        headers.push(("From".to_string(), from));
    }

    let mut parts = Vec::new();
    collect_parts(&parsed, &mut parts);

    Some(RawMessage::new(uid, headers, parts))
}

/// Format the sender as `Name <address>` where both are present.
fn format_sender(parsed: &mail_parser::Message) -> Option<String> {
    let addr = parsed.from().and_then(|from| from.first())?;
    match (addr.name(), addr.address()) {
        (Some(name), Some(address)) => Some(format!("{name} <{address}>")),
        (None, Some(address)) => Some(address.to_string()),
        (Some(name), None) => Some(name.to_string()),
        (None, None) => None,
    }
}

/// Flatten the MIME tree into pipeline parts, in walk order.
///
/// mail-parser has already charset-decoded text parts, so those carry
/// utf-8 payloads; the charset field preserves the declared-charset
/// presence rule the extractor depends on (absent or undecodable
/// charset means the part is never used).
fn collect_parts(message: &mail_parser::Message, out: &mut Vec<MimePart>) {
    for part in &message.parts {
        let Some(ct) = part.content_type() else {
            continue;
        };
        let content_type = match ct.subtype() {
            Some(subtype) => format!("{}/{}", ct.ctype(), subtype).to_lowercase(),
            None => ct.ctype().to_lowercase(),
        };
        let declared_charset = ct.attribute("charset");

        match &part.body {
            PartType::Text(text) | PartType::Html(text) => {
                let charset = if part.is_encoding_problem {
                    None
                } else {
                    declared_charset.map(|_| "utf-8")
                };
                out.push(MimePart::new(content_type, charset, text.as_bytes()));
            }
            PartType::Binary(bytes) | PartType::InlineBinary(bytes) => {
                out.push(MimePart::new(content_type, declared_charset, bytes.as_ref()));
            }
            PartType::Message(nested) => collect_parts(nested, out),
            PartType::Multipart(_) => {}
        }
    }
}
