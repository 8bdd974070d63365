//! Mail Mirror — mirrors new IMAP mail into a Zulip stream.

pub mod channels;
pub mod config;
pub mod error;
pub mod pipeline;
