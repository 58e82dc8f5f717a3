//! Account credentials.
//!
//! qrzlog never asks for credentials itself; whatever front end drives it
//! (environment, CLI flags, a prompt) produces a [`Credentials`] value and
//! hands it over. The value is immutable for the rest of the run.

use std::fmt;

use crate::SessionError;

/// Environment variable holding the account username.
pub const USERNAME_VAR: &str = "QRZ_USERNAME";
/// Environment variable holding the account password.
pub const PASSWORD_VAR: &str = "QRZ_PASSWORD";
/// Environment variable holding the logbook API key.
pub const API_KEY_VAR: &str = "QRZ_API_KEY";

/// The three secrets the services need.
///
/// `username`/`password` authorize session-keyed lookups; `api_key`
/// authorizes logbook reads and writes. `Debug` redacts the secrets so a
/// stray `{:?}` in a log line can't leak them.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
    api_key: String,
}

impl Credentials {
    /// Bundles the three credentials.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            api_key: api_key.into(),
        }
    }

    /// Reads `QRZ_USERNAME`, `QRZ_PASSWORD` and `QRZ_API_KEY`.
    ///
    /// # Errors
    /// [`SessionError::MissingCredential`] naming the first variable that
    /// is unset or empty.
    pub fn from_env() -> Result<Self, SessionError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds credentials from any name → value lookup.
    ///
    /// `from_env` is this with `std::env::var`; tests pass a closure.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SessionError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or(SessionError::MissingCredential(name))
        };
        Ok(Self {
            username: read(USERNAME_VAR)?,
            password: read(PASSWORD_VAR)?,
            api_key: read(API_KEY_VAR)?,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("api_key", &"<redacted>")
            .finish()
    }
}
