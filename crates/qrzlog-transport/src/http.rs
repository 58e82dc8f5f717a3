//! HTTP transport implementation using `reqwest`.

use reqwest::{Client, Url};

use crate::{HttpResponse, HttpTransport, TransportConfig, TransportError};

/// A [`HttpTransport`] backed by a pooled `reqwest` client over rustls.
///
/// Cloning is cheap: `reqwest::Client` is an `Arc` around its pool.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Builds a transport with the given timeout and user agent.
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<HttpResponse, TransportError> {
        let full = Url::parse_with_params(url, params).map_err(|e| {
            TransportError::InvalidUrl {
                url: url.to_string(),
                message: e.to_string(),
            }
        })?;

        // Parameter values carry credentials, so only the base URL is logged.
        tracing::debug!(url, "GET");

        let response = self
            .client
            .get(full)
            .send()
            .await
            .map_err(|e| request_error(url, e))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout {
                    url: url.to_string(),
                }
            } else {
                TransportError::Body {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        tracing::trace!(url, status, bytes = body.len(), "response received");
        Ok(HttpResponse::new(url, status, body))
    }
}

fn request_error(url: &str, e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout {
            url: url.to_string(),
        }
    } else {
        TransportError::Request {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}
