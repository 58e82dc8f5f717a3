//! Unified error type for qrzlog.

use qrzlog_protocol::{ProtocolError, StatusResult};
use qrzlog_session::SessionError;
use qrzlog_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `qrzlog` crate you deal with this single error type
/// instead of importing errors from each layer. The `#[from]` variants let
/// `?` convert layer errors automatically; the remaining variants are the
/// outcomes that only make sense at the client level.
#[derive(Debug, thiserror::Error)]
pub enum QrzlogError {
    /// A transport-level error (request, timeout, HTTP status).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A response body that could not be decoded at all.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (establish, renewal, credentials).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The lookup service has no public record for this callsign.
    /// A normal negative answer, never retried.
    #[error("{callsign} not found: {reason}")]
    NotFound { callsign: String, reason: String },

    /// The logbook did not accept a new contact. Carries whatever status
    /// fields the service returned.
    #[error("logbook rejected contact ({0})")]
    LogWriteFailed(StatusResult),

    /// The logbook refused a read, typically because the API key lacks
    /// the privilege.
    #[error("logbook refused request ({0})")]
    LogRejected(StatusResult),
}

impl QrzlogError {
    /// Returns `true` for errors that end the whole run rather than a
    /// single action: no identity could be obtained.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Session(SessionError::EstablishFailed(_) | SessionError::MissingCredential(_))
        )
    }
}
