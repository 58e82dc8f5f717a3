//! Error types for the protocol layer.
//!
//! Only structural failures are errors here. A body that parses but holds
//! nothing (no ADIF records, no status pairs) is a valid, empty value and
//! never reaches this enum.

/// Errors that can occur while decoding remote responses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The body does not have the expected structure at all, e.g. an XML
    /// lookup response that is not well-formed XML.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}
