//! Client configuration.

use std::time::Duration;

use qrzlog_session::{DEFAULT_SESSION_ENDPOINT, SessionConfig};
use qrzlog_transport::{DEFAULT_USER_AGENT, TransportConfig};
use serde::{Deserialize, Serialize};

/// Default logbook API endpoint.
pub const DEFAULT_LOGBOOK_ENDPOINT: &str = "https://logbook.qrz.com/api";

/// Everything a [`QrzClient`](crate::QrzClient) needs besides credentials.
///
/// Every field has a default, so a partial JSON document such as
/// `{"timeout": {"secs": 10, "nanos": 0}}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Session/lookup endpoint (XML).
    pub session_endpoint: String,

    /// Logbook endpoint (ADIF and status lines).
    pub logbook_endpoint: String,

    /// Per-request timeout.
    pub timeout: Duration,

    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl ClientConfig {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            endpoint: self.session_endpoint.clone(),
        }
    }

    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            timeout: self.timeout,
            user_agent: self.user_agent.clone(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            session_endpoint: DEFAULT_SESSION_ENDPOINT.to_string(),
            logbook_endpoint: DEFAULT_LOGBOOK_ENDPOINT.to_string(),
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}
