//! Transport abstraction layer for qrzlog.
//!
//! Provides the [`HttpTransport`] trait: the single capability the protocol
//! layers need from the network, "perform a GET with query parameters and
//! hand back the status code and body text".
//!
//! # Feature Flags
//!
//! - `reqwest` (default): TLS HTTP transport via `reqwest`
//! - `mock`: [`mock::ScriptedTransport`], an in-memory transport that
//!   records requests and answers from a handler, for tests

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "reqwest")]
mod http;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::TransportError;
#[cfg(feature = "reqwest")]
pub use http::ReqwestTransport;

use std::time::Duration;

/// Default user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("qrzlog/", env!("CARGO_PKG_VERSION"));

/// A completed HTTP exchange: where it went, what came back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// The request URL, without query parameters.
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response body decoded as text.
    pub body: String,
}

impl HttpResponse {
    /// Creates a response record.
    pub fn new(url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status,
            body: body.into(),
        }
    }

    /// Returns `true` for any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Converts a non-2xx response into [`TransportError::Status`].
    ///
    /// The remote services report protocol-level failures inside a 200
    /// body, so anything else is a failure of the HTTP layer itself.
    pub fn error_for_status(self) -> Result<Self, TransportError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(TransportError::Status {
                status: self.status,
                url: self.url,
            })
        }
    }
}

/// Settings applied to every request a transport sends.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Per-request timeout. Expiry surfaces as [`TransportError::Timeout`].
    pub timeout: Duration,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Performs GET requests against the remote services.
///
/// Implementations must not keep cookies or any other state between calls;
/// the only state the upper layers rely on is what they pass explicitly in
/// `params` (credentials, session key, API key). Implementations must not
/// retry either: a failure is reported once, as a [`TransportError`].
pub trait HttpTransport: Send + Sync + 'static {
    /// Sends `GET url?params` and returns the status and body text.
    ///
    /// Query parameter names and values are passed through verbatim and
    /// percent-encoded by the implementation.
    async fn get(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<HttpResponse, TransportError>;
}
