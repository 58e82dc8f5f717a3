/// Errors that can occur in the transport layer.
///
/// Every variant is a transport failure in the protocol sense: the layers
/// above never retry on these, they propagate them to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The underlying HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    /// The URL (plus query parameters) could not be built.
    #[error("invalid url {url}: {message}")]
    InvalidUrl { url: String, message: String },

    /// The request could not be sent or no response arrived.
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    /// The request exceeded the configured timeout.
    #[error("request to {url} timed out")]
    Timeout { url: String },

    /// The server answered with a non-success HTTP status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The response body could not be read as text.
    #[error("failed to read response body from {url}: {message}")]
    Body { url: String, message: String },
}

impl TransportError {
    /// Returns the URL the failing request was addressed to, if any.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Client(_) => None,
            Self::InvalidUrl { url, .. }
            | Self::Request { url, .. }
            | Self::Timeout { url }
            | Self::Status { url, .. }
            | Self::Body { url, .. } => Some(url),
        }
    }
}
