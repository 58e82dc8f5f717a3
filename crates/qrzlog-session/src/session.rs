//! Session types: the key, its lifecycle state, and how a session-keyed
//! response is classified.
//!
//! The remote service never says how long a key lives. Expiry is only
//! ever discovered after the fact, from a response that comes back without
//! a key. Every session-keyed response is therefore sorted into one of
//! three outcomes ([`SessionReply`]) before anyone looks at its data.

use std::fmt;

use qrzlog_protocol::LookupDocument;

/// Default session/lookup endpoint.
pub const DEFAULT_SESSION_ENDPOINT: &str = "https://xmldata.qrz.com/xml/current";

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for the session layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// URL of the session/lookup endpoint.
    pub endpoint: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SESSION_ENDPOINT.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionKey
// ---------------------------------------------------------------------------

/// An opaque session token issued by the lookup service.
///
/// Consumers get their own copy per call (it's a `String` clone), never a
/// reference into the manager, so a renewal can't change a key out from
/// under a request that is already in flight.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionKey(String);

impl SessionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Shows only a short prefix; the full key is a bearer credential.
impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(4).collect();
        write!(f, "SessionKey({prefix}…)")
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Where the manager is in the key lifecycle.
///
/// ```text
///   Unestablished ──(establish)──→ Active ──(keyless reply)──→ Expired
///                                    ↑                            │
///                                    └─────────(renew)────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No key has been requested yet.
    Unestablished,

    /// A key is held and presumed valid.
    Active(SessionKey),

    /// The held key was rejected; the next use must renew it.
    Expired(SessionKey),
}

impl SessionState {
    /// Returns `true` if a key is held and not known to be expired.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }
}

// ---------------------------------------------------------------------------
// SessionReply
// ---------------------------------------------------------------------------

/// Classification of a response to a session-keyed request.
///
/// Transport failures are not a variant here: they surface as
/// `Err(SessionError::Transport)` from the manager and are never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionReply {
    /// The key was accepted; here is the document.
    Data(LookupDocument),

    /// No key and no error: the session has expired and must be renewed.
    Expired,

    /// The service reported an explicit error (e.g. callsign not found).
    /// This is an answer, not an expiry, and is never retried.
    ExplicitError(String),
}

impl SessionReply {
    /// Sorts a parsed response into one of the three outcomes.
    ///
    /// An `Error` element wins over everything else; otherwise a missing
    /// key means expiry.
    pub fn classify(doc: LookupDocument) -> Self {
        if let Some(message) = doc.error() {
            return Self::ExplicitError(message.to_string());
        }
        if is_expired(&doc) {
            return Self::Expired;
        }
        Self::Data(doc)
    }
}

/// Returns `true` if `doc` signals an expired session: no key and no
/// explicit error.
pub fn is_expired(doc: &LookupDocument) -> bool {
    doc.key().is_none() && doc.error().is_none()
}
