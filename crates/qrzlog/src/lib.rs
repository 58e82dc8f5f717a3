//! # qrzlog
//!
//! Callsign lookups and logbook access for the QRZ amateur radio service.
//!
//! qrzlog talks to two endpoints: a session-keyed XML service for callsign
//! metadata, and an API-key logbook service that speaks ADIF. The layers
//! below handle the session lifecycle (establish, detect expiry, renew
//! once) and the wire formats; this crate turns them into three
//! operations a logging program needs: look up, check history, log.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use qrzlog::prelude::*;
//!
//! # async fn run() -> Result<(), QrzlogError> {
//! let client = QrzClient::builder().build(Credentials::from_env()?)?;
//! client.connect().await?;
//!
//! let record = client.directory().lookup("W1AW").await?;
//! println!("{record}");
//!
//! let prior = client.logbook().query_by_callsign("W1AW").await?;
//! println!("worked {} time(s)", prior.len());
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod directory;
mod error;
mod logbook;

pub use client::{QrzClient, QrzClientBuilder};
pub use config::{ClientConfig, DEFAULT_LOGBOOK_ENDPOINT};
pub use directory::{CallsignDirectory, CallsignRecord, QslPreference, elements, license_class_label};
pub use error::QrzlogError;
pub use logbook::{FullLog, LogbookClient, PAGE_SIZE};

/// Re-exports of the layer crates for direct access.
pub use qrzlog_protocol as protocol;
pub use qrzlog_session as session;
pub use qrzlog_transport as transport;

/// Common imports for qrzlog users.
///
/// ```rust
/// use qrzlog::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        CallsignDirectory, CallsignRecord, ClientConfig, FullLog, LogbookClient, PAGE_SIZE,
        QrzClient, QrzClientBuilder, QrzlogError, QslPreference,
    };
    pub use qrzlog_protocol::{AdifCodec, ContactDraft, LogId, Qso, StatusCodec, StatusResult};
    pub use qrzlog_session::{Credentials, SessionManager};
    pub use qrzlog_transport::{HttpTransport, ReqwestTransport};
}
