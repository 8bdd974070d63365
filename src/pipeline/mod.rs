//! The text-normalization pipeline: subject stripping, body extraction,
//! footer filtering, formatting, and the per-message orchestrator.

pub mod body;
pub mod footers;
pub mod format;
pub mod markup;
pub mod processor;
pub mod quotations;
pub mod subject;
pub mod types;

pub use footers::FooterFilter;
pub use markup::{ConvertOptions, Html2TextConverter, MarkupConverter};
pub use processor::MessagePipeline;
pub use quotations::{QuotationStripper, RegexQuotationStripper};
pub use types::{MimePart, OutboundMessage, PostOutcome, RawMessage, ResolvedBody};
