//! A scripted, in-memory [`HttpTransport`] for tests.
//!
//! `ScriptedTransport` never touches the network. Every call is recorded
//! (URL and query parameters) and answered by a handler closure, so tests
//! can assert both what the upper layers *sent* and how many requests they
//! made, which is how the renewal and pagination protocols are verified.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use crate::{HttpResponse, HttpTransport, TransportError};

/// One request as seen by the scripted transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// Base URL, without query string.
    pub url: String,
    /// Query parameters in the order they were passed.
    pub params: Vec<(String, String)>,
}

impl RecordedRequest {
    /// Returns the first value of the named query parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

type Handler =
    Box<dyn Fn(&RecordedRequest) -> Result<HttpResponse, TransportError> + Send + Sync>;

/// Transport that answers requests from a closure and records them.
pub struct ScriptedTransport {
    handler: Handler,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedTransport {
    /// Answers every request by calling `handler`.
    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&RecordedRequest) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answers requests in order from a fixed list of results.
    ///
    /// Once the list is exhausted every further request fails with
    /// [`TransportError::Request`], so an unexpected extra request shows up
    /// as a test failure rather than a hang.
    pub fn from_results(results: Vec<Result<HttpResponse, TransportError>>) -> Self {
        let queue = Mutex::new(VecDeque::from(results));
        Self::with_handler(move |req| {
            lock(&queue).pop_front().unwrap_or_else(|| {
                Err(TransportError::Request {
                    url: req.url.clone(),
                    message: "scripted transport exhausted".into(),
                })
            })
        })
    }

    /// Answers requests in order with `200 OK` and the given bodies.
    pub fn from_bodies<I, S>(bodies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let results = bodies
            .into_iter()
            .map(|body| Ok(HttpResponse::new("scripted", 200, body)))
            .collect();
        Self::from_results(results)
    }

    /// Returns a copy of every request received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    /// Returns how many requests have been received.
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }
}

impl HttpTransport for ScriptedTransport {
    async fn get(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<HttpResponse, TransportError> {
        let request = RecordedRequest {
            url: url.to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        };
        lock(&self.requests).push(request.clone());
        (self.handler)(&request)
    }
}

// A panicking test thread poisons the mutex; the recorded data is still
// valid, so recover it instead of cascading the panic.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
