//! Session management for qrzlog.
//!
//! The callsign lookup service authenticates with a short-lived session
//! key rather than per-request credentials. This crate owns that key:
//!
//! 1. **Credentials**: the immutable username/password/API key bundle
//!    ([`Credentials`])
//! 2. **Establishing**: trading username/password for a key, lazily
//! 3. **Renewal**: noticing an expired key, replacing it, and retrying
//!    the request that noticed, exactly once ([`SessionManager::query`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Client Layer (above)  ← directory lookups go through SessionManager::query
//!     ↕
//! Session Layer (this crate)  ← owns the key and the one-retry protocol
//!     ↕
//! Protocol Layer (below)  ← provides LookupDocument
//! ```

mod credentials;
mod error;
mod manager;
mod session;

pub use credentials::{API_KEY_VAR, Credentials, PASSWORD_VAR, USERNAME_VAR};
pub use error::SessionError;
pub use manager::SessionManager;
pub use session::{
    DEFAULT_SESSION_ENDPOINT, SessionConfig, SessionKey, SessionReply, SessionState, is_expired,
};
