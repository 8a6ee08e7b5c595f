//! Narrow HTTP abstraction over the transport library.
//!
//! The rest of the pipeline only ever sees [`HttpResponse`]: the status
//! code, the headers it cares about, and the raw body bytes. Transport
//! details (client construction, timeouts, the HTTPS-then-HTTP fallback)
//! stay in this module.

use crate::error::ArchiveError;
use futures_util::StreamExt;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::warn;

/// A completed HTTP GET, reduced to the fields the pipeline consumes.
#[derive(Debug, Clone)]
pub(crate) struct HttpResponse {
    /// Response status code.
    pub status: StatusCode,
    /// Declared `Content-Type`, if any.
    pub content_type: Option<String>,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

/// HTTP client with bounded connect and read timeouts.
pub(crate) struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Builds a client whose every request carries the given timeout.
    pub fn new(timeout: Duration) -> Result<Self, ArchiveError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Issues a GET and buffers the body.
    ///
    /// The body is streamed chunk-wise into memory; snapshot payloads are
    /// page-sized, so buffering the whole response is fine.
    pub async fn get(&self, request_url: &str) -> Result<HttpResponse, reqwest::Error> {
        let response = self.client.get(request_url).send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let mut body = Vec::new();
        let mut byte_stream = response.bytes_stream();
        while let Some(piece) = byte_stream.next().await {
            let chunk = piece?;
            body.extend_from_slice(&chunk);
        }

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }

    /// Issues a GET with the two-step transport policy: HTTPS first, then
    /// one retry over plain HTTP against the same path when the secure
    /// attempt fails to connect (connection refusal or TLS failure).
    ///
    /// The fallback is bounded and explicit, never recursive. Timeouts and
    /// non-success statuses do not trigger it.
    pub async fn get_with_http_fallback(
        &self,
        request_url: &str,
    ) -> Result<HttpResponse, reqwest::Error> {
        match self.get(request_url).await {
            Ok(response) => Ok(response),
            Err(e) if e.is_connect() => {
                let Some(fallback_url) = downgrade_to_http(request_url) else {
                    return Err(e);
                };
                warn!(
                    "HTTPS connection failed for {}: {}. Retrying over HTTP...",
                    request_url, e
                );
                self.get(&fallback_url).await
            }
            Err(e) => Err(e),
        }
    }
}

/// Rewrites an `https://` URL to `http://`, or `None` when the URL is not
/// HTTPS (nothing to downgrade to).
fn downgrade_to_http(request_url: &str) -> Option<String> {
    request_url
        .strip_prefix("https://")
        .map(|rest| format!("http://{}", rest))
}
