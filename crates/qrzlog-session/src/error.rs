//! Error types for the session layer.

use qrzlog_protocol::ProtocolError;
use qrzlog_transport::TransportError;

/// Errors that can occur while obtaining or using a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The session endpoint answered without a key. Nothing that needs an
    /// identity can proceed; at startup this ends the run.
    #[error("could not establish session: {0}")]
    EstablishFailed(String),

    /// A request still looked expired after the one renewal it is allowed.
    #[error("session expired again after renewal")]
    ExpiredAfterRenewal,

    /// A required credential was not supplied.
    #[error("missing credential: {0} is not set")]
    MissingCredential(&'static str),

    /// The request never got a usable HTTP response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The response body could not be decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
