//! Pipeline orchestrator — mirrors one mail at a time to the destination.
//!
//! Flow per message:
//! 1. Extract and normalize the subject (sentinels for missing/unreadable)
//! 2. Check existing topics — a match means this is a reply to an already
//!    mirrored thread, so quotations are stripped
//! 3. Resolve the body (plaintext → HTML → empty), strip nulls, filter
//!    footers, substitute the placeholder for empty bodies
//! 4. Quote, render the template, post

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, error, info};

use crate::channels::{Destination, MailboxSource};
use crate::config::MirrorConfig;
use crate::error::MirrorError;
use crate::pipeline::body::resolve_body;
use crate::pipeline::footers::FooterFilter;
use crate::pipeline::format::{quote_each_line, render_template};
use crate::pipeline::markup::MarkupConverter;
use crate::pipeline::quotations::QuotationStripper;
use crate::pipeline::subject::{extract_subject, normalize_subject};
use crate::pipeline::types::{OutboundMessage, PostOutcome, RawMessage};

/// Body used when a mail has no usable content.
pub const EMPTY_BODY_PLACEHOLDER: &str = "(No email body)";

/// Sender used when a mail carries no From header.
const UNKNOWN_SENDER: &str = "(unknown sender)";

/// Per-message orchestrator.
///
/// Holds the configured transforms and the destination; the mailbox
/// stays outside and is driven by [`run_mirror`].
pub struct MessagePipeline {
    destination: Arc<dyn Destination>,
    stripper: Arc<dyn QuotationStripper>,
    converter: Arc<dyn MarkupConverter>,
    footer_filter: FooterFilter,
    subject_prefixes: Vec<String>,
    message_template: String,
    channel: String,
}

impl MessagePipeline {
    pub fn new(
        config: &MirrorConfig,
        destination: Arc<dyn Destination>,
        stripper: Arc<dyn QuotationStripper>,
        converter: Arc<dyn MarkupConverter>,
    ) -> Self {
        Self {
            destination,
            stripper,
            converter,
            footer_filter: FooterFilter::new(config.footer_keywords.clone()),
            subject_prefixes: config.subject_prefixes.clone(),
            message_template: config.message_template.clone(),
            channel: config.zulip.stream.clone(),
        }
    }

    /// Mirror a single mail to the destination.
    pub async fn process(&self, message: &RawMessage) -> Result<(), MirrorError> {
        let subject = extract_subject(message);
        let subject = normalize_subject(&subject, &self.subject_prefixes);

        // A reply to an already mirrored thread: skip all quotations.
        let topics = self.destination.list_topics(&self.channel).await?;
        let remove_quotations = topics.contains(&subject);

        let body = resolve_body(
            message,
            remove_quotations,
            self.stripper.as_ref(),
            self.converter.as_ref(),
        )
        .into_text();
        // The destination rejects null characters.
        let body = body.replace('\0', "");
        let body = self.footer_filter.filter(&body);
        let body = if body.is_empty() {
            EMPTY_BODY_PLACEHOLDER.to_string()
        } else {
            body
        };

        let sender = message.header("From").unwrap_or(UNKNOWN_SENDER);
        let body = quote_each_line(&body);
        let content = render_template(&self.message_template, sender, &body);

        debug!(topic = %subject, "Mirroring mail");
        debug!(body = %content, "Mirrored content");

        let outbound = OutboundMessage {
            channel: self.channel.clone(),
            topic: subject.clone(),
            content,
        };

        match self.destination.post(&outbound).await? {
            PostOutcome::Success => {
                info!(topic = %subject, "Successfully mirrored mail");
                Ok(())
            }
            PostOutcome::Failure { code, message } => {
                Err(MirrorError::PostRejected { code, message })
            }
        }
    }
}

/// Drive the mailbox through one full pass.
///
/// Messages are processed strictly one at a time; a failed message is
/// logged and the run continues. The shutdown flag is checked between
/// messages so an interrupt lets the current message complete cleanly.
pub async fn run_mirror(
    mailbox: &mut dyn MailboxSource,
    pipeline: &MessagePipeline,
    shutdown: &AtomicBool,
) -> crate::error::Result<()> {
    let result = mirror_pass(mailbox, pipeline, shutdown).await;

    // Close and log out even when the pass failed mid-run.
    if let Err(e) = mailbox.finish().await {
        if result.is_ok() {
            return Err(e.into());
        }
        error!("Error while closing mailbox: {e}");
    }

    info!("Exited.");
    result
}

async fn mirror_pass(
    mailbox: &mut dyn MailboxSource,
    pipeline: &MessagePipeline,
    shutdown: &AtomicBool,
) -> crate::error::Result<()> {
    loop {
        if shutdown.load(Ordering::Relaxed) {
            info!("Interrupt received, stopping after current message");
            break;
        }

        let Some(message) = mailbox.next_message().await? else {
            break;
        };

        if let Err(e) = pipeline.process(&message).await {
            error!("Error while processing incoming mail: {e}");
        }

        mailbox.acknowledge(&message).await?;
    }

    Ok(())
}
