//! Error types for the mail mirror.

/// Top-level error type for the mirror.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Mailbox error: {0}")]
    Mailbox(#[from] MailboxError),

    #[error("Mirror error: {0}")]
    Mirror(#[from] MirrorError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors from the IMAP mailbox collaborator.
///
/// These are not recovered by the pipeline — a hard mailbox failure
/// terminates the run.
#[derive(Debug, thiserror::Error)]
pub enum MailboxError {
    #[error("Failed to connect to {host}: {reason}")]
    Connect { host: String, reason: String },

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("IMAP protocol error: {0}")]
    Protocol(String),

    #[error("Mailbox session is closed")]
    Closed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced while mirroring a single message.
///
/// Logged per message; never fatal to the run.
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    #[error("Destination rejected message: {code}: {message}")]
    PostRejected { code: String, message: String },

    #[error("Destination request failed: {0}")]
    Transport(String),
}

/// Result type alias for the mirror.
pub type Result<T> = std::result::Result<T, Error>;
