use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use mail_mirror::channels::{ImapMailbox, ZulipClient};
use mail_mirror::config::MirrorConfig;
use mail_mirror::pipeline::processor::run_mirror;
use mail_mirror::pipeline::{Html2TextConverter, MessagePipeline, RegexQuotationStripper};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = match MirrorConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    info!(
        imap = %config.imap.host,
        mailbox = %config.imap.mailbox,
        stream = %config.zulip.stream,
        delete_after_read = config.delete_after_read,
        "Starting mail mirror"
    );

    // Collaborators are built once at startup and handed to the pipeline
    // as dependencies.
    let destination = Arc::new(ZulipClient::new(config.zulip.clone()));
    let stripper = Arc::new(RegexQuotationStripper::new());
    let pipeline = MessagePipeline::new(
        &config,
        destination,
        stripper,
        Arc::new(Html2TextConverter::new()),
    );

    // Interrupt ends the run after the current message completes.
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Exiting... (interrupt)");
                shutdown.store(true, Ordering::Relaxed);
            }
        });
    }

    let mut mailbox = ImapMailbox::connect(config.imap.clone(), config.delete_after_read).await?;
    run_mirror(&mut mailbox, &pipeline, &shutdown).await?;

    Ok(())
}
