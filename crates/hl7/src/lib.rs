//! HL7 v2 wire-format support for the bridge.
//!
//! This crate provides the **boundary layer** for pipe-delimited HL7 v2 text:
//! - delimiter discovery from the self-describing MSH header ([`encoding`])
//! - a positional segment tree with transport tolerance ([`message`])
//! - the field navigator and its addressing notations ([`path`])
//! - tolerant timestamp and date parsing ([`timestamp`])
//!
//! This crate focuses on:
//! - positional addressing (segment, repetition, field, component)
//! - treating absent segments and fields as a normal outcome, not an error
//! - rejecting only text that cannot be decomposed into a header plus segments
//!
//! It knows nothing about patients, visits or FHIR. Extraction of the typed
//! intermediate model lives in `bridge-core`.

pub mod encoding;
pub mod message;
pub mod path;
pub mod timestamp;

// Re-export facades
pub use encoding::Delimiters;
pub use message::{Message, Segment, HEADER_SEGMENT};
pub use path::FieldPath;
pub use timestamp::{parse_date, parse_datetime};

/// Errors returned by the `hl7` boundary crate.
///
/// Every variant except [`Hl7Error::InvalidPath`] means the text could not be
/// decomposed into a minimal header plus segments, which is fatal for that message.
#[derive(Debug, thiserror::Error)]
pub enum Hl7Error {
    #[error("message text is empty")]
    EmptyMessage,

    #[error("no MSH header segment found")]
    MissingHeader,

    #[error("invalid MSH header: {0}")]
    InvalidHeader(String),

    #[error("unsupported encoding characters: {0}")]
    UnsupportedEncoding(String),

    #[error("unsupported HL7 version: {0}")]
    UnsupportedVersion(String),

    #[error("invalid field path: {0}")]
    InvalidPath(String),
}

/// Type alias for Results that can fail with an [`Hl7Error`].
pub type Hl7Result<T> = Result<T, Hl7Error>;
