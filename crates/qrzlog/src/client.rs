//! `QrzClient` builder and the client that ties the layers together.
//!
//! This is the entry point for talking to the service. It wires
//! transport → session → directory/logbook and shares one transport and one
//! session key between them.

use std::sync::Arc;

use qrzlog_session::{Credentials, SessionKey, SessionManager};
use qrzlog_transport::{HttpTransport, ReqwestTransport};

use crate::{CallsignDirectory, ClientConfig, LogbookClient, QrzlogError};

/// Builder for a [`QrzClient`] over the default HTTP transport.
///
/// # Example
///
/// ```rust,ignore
/// use qrzlog::prelude::*;
///
/// let client = QrzClient::builder()
///     .config(ClientConfig::default())
///     .build(Credentials::from_env()?)?;
/// client.connect().await?;
/// println!("{}", client.directory().lookup("W1AW").await?);
/// ```
#[derive(Debug, Default)]
pub struct QrzClientBuilder {
    config: ClientConfig,
}

impl QrzClientBuilder {
    /// Creates a builder with default endpoints and timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Builds the client. No request is sent yet.
    ///
    /// # Errors
    /// [`QrzlogError::Transport`] if the HTTP client can't be constructed.
    pub fn build(self, credentials: Credentials) -> Result<QrzClient<ReqwestTransport>, QrzlogError> {
        let transport = ReqwestTransport::new(&self.config.transport_config())?;
        Ok(QrzClient::with_transport(
            Arc::new(transport),
            credentials,
            &self.config,
        ))
    }
}

/// Callsign directory and logbook sharing one transport and one session.
pub struct QrzClient<T: HttpTransport> {
    session: Arc<SessionManager<T>>,
    directory: CallsignDirectory<T>,
    logbook: LogbookClient<T>,
}

impl QrzClient<ReqwestTransport> {
    /// Returns a builder over the default HTTP transport.
    pub fn builder() -> QrzClientBuilder {
        QrzClientBuilder::new()
    }
}

impl<T: HttpTransport> QrzClient<T> {
    /// Builds a client over any transport (tests pass a scripted one).
    pub fn with_transport(transport: Arc<T>, credentials: Credentials, config: &ClientConfig) -> Self {
        let logbook = LogbookClient::new(
            Arc::clone(&transport),
            credentials.api_key(),
            config.logbook_endpoint.clone(),
        );
        let session = Arc::new(SessionManager::new(
            transport,
            credentials,
            config.session_config(),
        ));
        let directory = CallsignDirectory::new(Arc::clone(&session));
        Self {
            session,
            directory,
            logbook,
        }
    }

    /// Establishes the session up front.
    ///
    /// Without this the first lookup establishes lazily. Calling it at
    /// startup surfaces bad credentials before any user interaction;
    /// a failure here is [`QrzlogError::is_fatal`].
    pub async fn connect(&self) -> Result<SessionKey, QrzlogError> {
        Ok(self.session.establish().await?)
    }

    pub fn session(&self) -> &SessionManager<T> {
        &self.session
    }

    pub fn directory(&self) -> &CallsignDirectory<T> {
        &self.directory
    }

    pub fn logbook(&self) -> &LogbookClient<T> {
        &self.logbook
    }
}
