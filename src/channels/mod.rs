//! Collaborator interfaces: the IMAP mailbox source and the destination
//! chat service.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::{MailboxError, MirrorError};
use crate::pipeline::types::{OutboundMessage, PostOutcome, RawMessage};

pub mod imap;
pub mod zulip;

pub use imap::ImapMailbox;
pub use zulip::ZulipClient;

/// Source of incoming mail.
///
/// Yields messages one at a time in ascending message-id order. The
/// sequence is finite — one pass per connection — and restartable only
/// by reconnecting.
#[async_trait]
pub trait MailboxSource: Send {
    /// Next message, or `None` once the pass is exhausted.
    async fn next_message(&mut self) -> Result<Option<RawMessage>, MailboxError>;

    /// Post-processing acknowledgment, invoked once per message after the
    /// pipeline completes it (success or failure alike). For IMAP this is
    /// the delete-after-read flag.
    async fn acknowledge(&mut self, message: &RawMessage) -> Result<(), MailboxError>;

    /// Finalize the pass (expunge and log out for IMAP).
    async fn finish(&mut self) -> Result<(), MailboxError>;
}

/// Destination chat service.
#[async_trait]
pub trait Destination: Send + Sync {
    /// All existing topic names in the given channel, materialized as a
    /// set for membership checks.
    async fn list_topics(&self, channel: &str) -> Result<HashSet<String>, MirrorError>;

    /// Post a message, reporting the outcome explicitly.
    async fn post(&self, message: &OutboundMessage) -> Result<PostOutcome, MirrorError>;
}
