//! The session manager: owns the session key and the renewal protocol.
//!
//! It's responsible for:
//! - Establishing a key from username/password, lazily on first use
//! - Classifying every session-keyed response (data / expired / error)
//! - Renewing an expired key and retrying the request that saw it, once
//!
//! # Concurrency note
//!
//! The key lives behind a `tokio::sync::Mutex` that stays locked for the
//! whole establish round-trip, so renewal is a critical section. A caller
//! that saw a key expire while someone else was already renewing it gets
//! the fresh key instead of triggering a second establish.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use qrzlog_protocol::LookupDocument;
use qrzlog_transport::HttpTransport;
use tokio::sync::Mutex;

use crate::{Credentials, SessionConfig, SessionError, SessionKey, SessionReply, SessionState};

/// Query parameter carrying the session key on lookups.
const SESSION_PARAM: &str = "s";

/// Holds the current session key and applies the one-retry renewal
/// protocol to session-keyed requests.
///
/// ## Lifecycle
///
/// ```text
/// query() ──→ current_key() ──→ send ──→ Data / ExplicitError ──→ done
///                                 │
///                                 ▼ Expired
///                          renew(stale) ──→ send once more ──→ Data / ExplicitError
///                                                │
///                                                ▼ Expired again
///                                       ExpiredAfterRenewal
/// ```
pub struct SessionManager<T: HttpTransport> {
    transport: Arc<T>,
    credentials: Credentials,
    config: SessionConfig,
    state: Mutex<SessionState>,
    renewals: AtomicU64,
}

impl<T: HttpTransport> SessionManager<T> {
    /// Creates a manager in the `Unestablished` state. No request is sent
    /// until a key is first needed.
    pub fn new(transport: Arc<T>, credentials: Credentials, config: SessionConfig) -> Self {
        Self {
            transport,
            credentials,
            config,
            state: Mutex::new(SessionState::Unestablished),
            renewals: AtomicU64::new(0),
        }
    }

    /// The credentials this manager authenticates with.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Snapshot of the current lifecycle state.
    pub async fn state(&self) -> SessionState {
        self.state.lock().await.clone()
    }

    /// How many times an expired key has been successfully replaced.
    pub fn renewals(&self) -> u64 {
        self.renewals.load(Ordering::Relaxed)
    }

    /// Requests a fresh key with username/password and stores it.
    ///
    /// No retry is attempted. A malformed or keyless response is
    /// [`SessionError::EstablishFailed`]; callers at startup treat that as
    /// fatal.
    ///
    /// # Errors
    /// - [`SessionError::EstablishFailed`]: no key in the response
    /// - [`SessionError::Transport`]: the request itself failed
    pub async fn establish(&self) -> Result<SessionKey, SessionError> {
        let mut state = self.state.lock().await;
        self.establish_locked(&mut state).await
    }

    /// Returns the current key, establishing one if none is held or the
    /// held one is known to be expired.
    pub async fn current_key(&self) -> Result<SessionKey, SessionError> {
        let mut state = self.state.lock().await;
        match &*state {
            SessionState::Active(key) => Ok(key.clone()),
            SessionState::Unestablished | SessionState::Expired(_) => {
                self.establish_locked(&mut state).await
            }
        }
    }

    /// Replaces `stale` with a fresh key.
    ///
    /// If the stored key is already different from `stale`, another caller
    /// renewed it in the meantime; that key is returned without a request.
    pub async fn renew(&self, stale: &SessionKey) -> Result<SessionKey, SessionError> {
        let mut state = self.state.lock().await;
        if let SessionState::Active(current) = &*state {
            if current != stale {
                tracing::debug!("session already renewed by another caller");
                return Ok(current.clone());
            }
        }

        *state = SessionState::Expired(stale.clone());
        let key = self.establish_locked(&mut state).await?;
        self.renewals.fetch_add(1, Ordering::Relaxed);
        tracing::info!(renewals = self.renewals(), "session renewed");
        Ok(key)
    }

    /// Sends a session-keyed request (`s=<key>` plus `params`) with the
    /// one-retry renewal protocol applied.
    ///
    /// Returns [`SessionReply::Data`] or [`SessionReply::ExplicitError`];
    /// never `Expired`.
    ///
    /// # Errors
    /// - [`SessionError::ExpiredAfterRenewal`]: the retry expired too
    /// - [`SessionError::EstablishFailed`]: renewal got no key
    /// - [`SessionError::Transport`] / [`SessionError::Protocol`]: the
    ///   request or its body failed; never retried
    pub async fn query(&self, params: &[(&str, &str)]) -> Result<SessionReply, SessionError> {
        let key = self.current_key().await?;
        match self.send(&key, params).await? {
            SessionReply::Expired => {}
            reply => return Ok(reply),
        }

        tracing::info!("session key expired, renewing");
        let key = self.renew(&key).await?;
        match self.send(&key, params).await? {
            SessionReply::Expired => {
                tracing::warn!("session expired again immediately after renewal");
                let mut state = self.state.lock().await;
                if *state == SessionState::Active(key.clone()) {
                    *state = SessionState::Expired(key);
                }
                Err(SessionError::ExpiredAfterRenewal)
            }
            reply => Ok(reply),
        }
    }

    async fn send(
        &self,
        key: &SessionKey,
        params: &[(&str, &str)],
    ) -> Result<SessionReply, SessionError> {
        let mut full: Vec<(&str, &str)> = Vec::with_capacity(params.len() + 1);
        full.push((SESSION_PARAM, key.as_str()));
        full.extend_from_slice(params);

        let response = self
            .transport
            .get(&self.config.endpoint, &full)
            .await?
            .error_for_status()?;
        let doc = LookupDocument::parse(&response.body)?;
        log_service_message(&doc);
        Ok(SessionReply::classify(doc))
    }

    async fn establish_locked(&self, state: &mut SessionState) -> Result<SessionKey, SessionError> {
        let params = [
            ("username", self.credentials.username()),
            ("password", self.credentials.password()),
        ];
        let response = self
            .transport
            .get(&self.config.endpoint, &params)
            .await?
            .error_for_status()?;

        let doc = LookupDocument::parse(&response.body)
            .map_err(|e| SessionError::EstablishFailed(e.to_string()))?;
        log_service_message(&doc);

        match doc.key() {
            Some(key) => {
                let key = SessionKey::new(key);
                *state = SessionState::Active(key.clone());
                tracing::info!(username = self.credentials.username(), "session established");
                Ok(key)
            }
            None => {
                let reason = doc.error().unwrap_or("no session key in response");
                tracing::error!(username = self.credentials.username(), reason, "session establish failed");
                Err(SessionError::EstablishFailed(reason.to_string()))
            }
        }
    }
}

fn log_service_message(doc: &LookupDocument) {
    if let Some(message) = doc.message() {
        tracing::warn!(notice = message, "lookup service notice");
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for `SessionManager`.
    //!
    //! Naming: `test_{function}_{scenario}_{expected}`.
    //!
    //! Every test runs against `ScriptedTransport`, which answers from a
    //! fixed list of bodies and records each request. Asserting on the
    //! recorded requests is how "exactly one renewal, exactly one retry"
    //! is checked.

    use qrzlog_transport::mock::ScriptedTransport;
    use qrzlog_transport::{HttpResponse, TransportError};

    use super::*;

    // -- Helpers ----------------------------------------------------------

    fn key_body(key: &str) -> String {
        format!("<QRZDatabase><Session><Key>{key}</Key></Session></QRZDatabase>")
    }

    fn lookup_body(key: &str, call: &str) -> String {
        format!(
            "<QRZDatabase><Callsign><call>{call}</call></Callsign>\
             <Session><Key>{key}</Key></Session></QRZDatabase>"
        )
    }

    fn expired_body() -> String {
        "<QRZDatabase><Session><GMTime>now</GMTime></Session></QRZDatabase>".to_string()
    }

    fn error_body(message: &str) -> String {
        format!("<QRZDatabase><Session><Error>{message}</Error></Session></QRZDatabase>")
    }

    fn manager(transport: &Arc<ScriptedTransport>) -> SessionManager<ScriptedTransport> {
        SessionManager::new(
            Arc::clone(transport),
            Credentials::new("w1aw", "hunter2", "API-KEY"),
            SessionConfig::default(),
        )
    }

    fn scripted(bodies: Vec<String>) -> Arc<ScriptedTransport> {
        Arc::new(ScriptedTransport::from_bodies(bodies))
    }

    // =====================================================================
    // establish()
    // =====================================================================

    #[tokio::test]
    async fn test_establish_with_key_stores_active_session() {
        let transport = scripted(vec![key_body("k1")]);
        let mgr = manager(&transport);

        let key = mgr.establish().await.expect("should succeed");

        assert_eq!(key.as_str(), "k1");
        assert_eq!(mgr.state().await, SessionState::Active(SessionKey::new("k1")));
        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "https://xmldata.qrz.com/xml/current");
        assert_eq!(requests[0].param("username"), Some("w1aw"));
        assert_eq!(requests[0].param("password"), Some("hunter2"));
    }

    #[tokio::test]
    async fn test_establish_without_key_fails_after_one_request() {
        let transport = scripted(vec![expired_body(), key_body("never")]);
        let mgr = manager(&transport);

        let err = mgr.establish().await.unwrap_err();

        assert!(matches!(err, SessionError::EstablishFailed(_)));
        assert_eq!(transport.request_count(), 1);
        assert_eq!(mgr.state().await, SessionState::Unestablished);
    }

    #[tokio::test]
    async fn test_establish_reports_service_error_text() {
        let transport = scripted(vec![error_body("Username/password incorrect")]);
        let mgr = manager(&transport);

        let err = mgr.establish().await.unwrap_err();
        match err {
            SessionError::EstablishFailed(reason) => {
                assert_eq!(reason, "Username/password incorrect");
            }
            other => panic!("expected EstablishFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_establish_malformed_body_is_establish_failure() {
        let transport = scripted(vec!["<html><body>oops</p></html>".to_string()]);
        let mgr = manager(&transport);
        assert!(matches!(
            mgr.establish().await,
            Err(SessionError::EstablishFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_establish_http_failure_is_transport_error() {
        let transport = Arc::new(ScriptedTransport::from_results(vec![Ok(HttpResponse::new(
            "https://xmldata.qrz.com/xml/current",
            500,
            "",
        ))]));
        let mgr = manager(&transport);
        assert!(matches!(
            mgr.establish().await,
            Err(SessionError::Transport(TransportError::Status { status: 500, .. }))
        ));
    }

    // =====================================================================
    // current_key()
    // =====================================================================

    #[tokio::test]
    async fn test_current_key_establishes_lazily_once() {
        let transport = scripted(vec![key_body("k1")]);
        let mgr = manager(&transport);
        assert_eq!(transport.request_count(), 0);

        let a = mgr.current_key().await.unwrap();
        let b = mgr.current_key().await.unwrap();

        assert_eq!(a, b);
        assert_eq!(transport.request_count(), 1);
    }

    // =====================================================================
    // query()
    // =====================================================================

    #[tokio::test]
    async fn test_query_valid_key_returns_data_without_renewal() {
        let transport = scripted(vec![key_body("k1"), lookup_body("k1", "W1AW")]);
        let mgr = manager(&transport);

        let reply = mgr.query(&[("callsign", "W1AW")]).await.unwrap();

        match reply {
            SessionReply::Data(doc) => assert_eq!(doc.get("call"), Some("W1AW")),
            other => panic!("expected Data, got {other:?}"),
        }
        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].param("s"), Some("k1"));
        assert_eq!(requests[1].param("callsign"), Some("W1AW"));
        assert_eq!(mgr.renewals(), 0);
    }

    #[tokio::test]
    async fn test_query_expired_renews_once_and_retries_once() {
        let transport = scripted(vec![
            key_body("k1"),
            expired_body(),
            key_body("k2"),
            lookup_body("k2", "W1AW"),
        ]);
        let mgr = manager(&transport);

        let reply = mgr.query(&[("callsign", "W1AW")]).await.unwrap();

        assert!(matches!(reply, SessionReply::Data(_)));
        let requests = transport.requests();
        assert_eq!(requests.len(), 4);
        // establish, lookup (expired), re-establish, retried lookup
        assert_eq!(requests[0].param("username"), Some("w1aw"));
        assert_eq!(requests[1].param("s"), Some("k1"));
        assert_eq!(requests[2].param("username"), Some("w1aw"));
        assert_eq!(requests[3].param("s"), Some("k2"));
        assert_eq!(requests[3].param("callsign"), Some("W1AW"));
        assert_eq!(mgr.renewals(), 1);
        assert_eq!(mgr.state().await, SessionState::Active(SessionKey::new("k2")));
    }

    #[tokio::test]
    async fn test_query_expired_twice_does_not_loop() {
        let transport = scripted(vec![
            key_body("k1"),
            expired_body(),
            key_body("k2"),
            expired_body(),
            key_body("k3"),
        ]);
        let mgr = manager(&transport);

        let err = mgr.query(&[("callsign", "W1AW")]).await.unwrap_err();

        assert!(matches!(err, SessionError::ExpiredAfterRenewal));
        assert_eq!(transport.request_count(), 4);
        assert_eq!(mgr.state().await, SessionState::Expired(SessionKey::new("k2")));
    }

    #[tokio::test]
    async fn test_query_after_double_expiry_establishes_fresh_key() {
        let transport = scripted(vec![
            key_body("k1"),
            expired_body(),
            key_body("k2"),
            expired_body(),
            key_body("k3"),
            lookup_body("k3", "K1ABC"),
        ]);
        let mgr = manager(&transport);
        let _ = mgr.query(&[("callsign", "W1AW")]).await;

        let reply = mgr.query(&[("callsign", "K1ABC")]).await.unwrap();

        assert!(matches!(reply, SessionReply::Data(_)));
        assert_eq!(transport.requests()[5].param("s"), Some("k3"));
    }

    #[tokio::test]
    async fn test_query_explicit_error_is_returned_not_renewed() {
        let transport = scripted(vec![key_body("k1"), error_body("Not found: XX1XX")]);
        let mgr = manager(&transport);

        let reply = mgr.query(&[("callsign", "XX1XX")]).await.unwrap();

        assert_eq!(reply, SessionReply::ExplicitError("Not found: XX1XX".into()));
        assert_eq!(transport.request_count(), 2);
        assert_eq!(mgr.renewals(), 0);
    }

    #[tokio::test]
    async fn test_query_renewal_failure_propagates_establish_error() {
        let transport = scripted(vec![key_body("k1"), expired_body(), expired_body()]);
        let mgr = manager(&transport);

        let err = mgr.query(&[("callsign", "W1AW")]).await.unwrap_err();

        assert!(matches!(err, SessionError::EstablishFailed(_)));
        assert_eq!(transport.request_count(), 3);
    }

    #[tokio::test]
    async fn test_query_transport_failure_is_not_retried() {
        let transport = Arc::new(ScriptedTransport::from_results(vec![
            Ok(HttpResponse::new("u", 200, key_body("k1"))),
            Err(TransportError::Timeout { url: "u".into() }),
        ]));
        let mgr = manager(&transport);

        let err = mgr.query(&[("callsign", "W1AW")]).await.unwrap_err();

        assert!(matches!(
            err,
            SessionError::Transport(TransportError::Timeout { .. })
        ));
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_query_malformed_lookup_is_protocol_error() {
        let transport = scripted(vec![key_body("k1"), "gateway timeout".to_string()]);
        let mgr = manager(&transport);

        let err = mgr.query(&[("callsign", "W1AW")]).await.unwrap_err();

        assert!(matches!(err, SessionError::Protocol(_)));
        assert_eq!(transport.request_count(), 2);
    }

    // =====================================================================
    // renew()
    // =====================================================================

    #[tokio::test]
    async fn test_renew_with_stale_key_reuses_newer_key() {
        let transport = scripted(vec![key_body("k1"), key_body("k2")]);
        let mgr = manager(&transport);
        let k1 = mgr.current_key().await.unwrap();

        let first = mgr.renew(&k1).await.unwrap();
        // A second caller that also saw k1 expire must not re-establish.
        let second = mgr.renew(&k1).await.unwrap();

        assert_eq!(first.as_str(), "k2");
        assert_eq!(second.as_str(), "k2");
        assert_eq!(transport.request_count(), 2);
        assert_eq!(mgr.renewals(), 1);
    }
}
