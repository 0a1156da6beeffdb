//! Byte-range-aware origin relay.
//!
//! Fetches an origin URL on behalf of a client and mirrors the response
//! back without buffering: the inbound `Range` header and the origin's
//! status and range headers are forwarded verbatim, and the body streams
//! through in bounded chunks. The forwarder never retries; callers decide
//! whether to fall back to another delivery path.

use std::sync::Arc;

use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::header::{self, HeaderName};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use url::Url;

use crate::config::ProxyConfig;

/// Errors raised while talking to an origin server.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The origin did not answer within the configured timeout.
    #[error("origin timed out: {url}")]
    Timeout {
        /// The origin URL that timed out
        url: String,
    },

    /// Connecting to or reading from the origin failed.
    #[error("origin unreachable: {url}: {reason}")]
    Unreachable {
        /// The origin URL that failed
        url: String,
        /// The underlying transport error
        reason: String,
    },

    /// The shared HTTP client could not be constructed.
    #[error("http client setup failed: {reason}")]
    ClientSetup {
        /// The builder error
        reason: String,
    },
}

impl RelayError {
    fn from_reqwest(url: &Url, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            RelayError::Timeout {
                url: url.to_string(),
            }
        } else {
            RelayError::Unreachable {
                url: url.to_string(),
                reason: error.to_string(),
            }
        }
    }
}

/// Header subset mirrored from the origin to the client.
///
/// Only these four matter for playback and seeking; everything else the
/// origin says is dropped.
#[derive(Debug, Clone, Default)]
pub struct RelayHeaders {
    /// Origin `Content-Type`.
    pub content_type: Option<String>,
    /// Origin `Content-Length`.
    pub content_length: Option<String>,
    /// Origin `Content-Range` (present on 206 responses).
    pub content_range: Option<String>,
    /// Origin `Accept-Ranges`.
    pub accept_ranges: Option<String>,
}

/// One in-flight origin response, ready to be drained.
///
/// Holds the origin connection and its concurrency permit until the body is
/// consumed or dropped; dropping the response (client disconnect) promptly
/// releases both.
#[derive(Debug)]
pub struct OriginResponse {
    status: StatusCode,
    headers: RelayHeaders,
    response: reqwest::Response,
    permit: OwnedSemaphorePermit,
    chunk_size: usize,
}

impl OriginResponse {
    /// Origin status code, forwarded verbatim (200, 206, 4xx, 5xx).
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The mirrored header subset.
    pub fn headers(&self) -> &RelayHeaders {
        &self.headers
    }

    /// Origin-reported content type, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.content_type.as_deref()
    }

    /// Final URL of the origin response, after any redirects.
    ///
    /// Relative playlist references must resolve against this, not against
    /// the URL the fetch started from.
    pub fn url(&self) -> &Url {
        self.response.url()
    }

    /// Reads the whole body as text.
    ///
    /// Only for small documents (playlists); media bodies go through
    /// [`OriginResponse::into_byte_stream`].
    ///
    /// # Errors
    /// - `RelayError::Timeout` / `RelayError::Unreachable` - body read failed
    pub async fn into_text(self) -> Result<String, RelayError> {
        let url = self.response.url().clone();
        self.response
            .text()
            .await
            .map_err(|e| RelayError::from_reqwest(&url, e))
    }

    /// Converts the response into a bounded-chunk byte stream.
    ///
    /// Network reads larger than the configured chunk size are split before
    /// they are yielded, so downstream buffering stays bounded no matter how
    /// large the origin resource is. The concurrency permit rides with the
    /// stream and is released when the stream is dropped.
    pub fn into_byte_stream(self) -> BoxStream<'static, Result<Bytes, RelayError>> {
        let OriginResponse {
            response,
            permit,
            chunk_size,
            ..
        } = self;
        let url = response.url().clone();
        response
            .bytes_stream()
            .flat_map(move |item| {
                let _ = &permit; // origin slot stays held until the stream drops
                let item = item.map_err(|e| RelayError::from_reqwest(&url, e));
                stream::iter(split_chunk(item, chunk_size))
            })
            .boxed()
    }
}

/// Splits one network read into chunks no larger than `limit` bytes.
fn split_chunk(
    item: Result<Bytes, RelayError>,
    limit: usize,
) -> Vec<Result<Bytes, RelayError>> {
    match item {
        Ok(mut bytes) => {
            if bytes.len() <= limit {
                return vec![Ok(bytes)];
            }
            let mut pieces = Vec::with_capacity(bytes.len().div_ceil(limit));
            while bytes.len() > limit {
                pieces.push(Ok(bytes.split_to(limit)));
            }
            if !bytes.is_empty() {
                pieces.push(Ok(bytes));
            }
            pieces
        }
        Err(error) => vec![Err(error)],
    }
}

/// Range-aware relay toward origin servers.
///
/// Owns the shared HTTP client and the outbound concurrency budget. Cloning
/// is cheap; clones share both.
#[derive(Debug, Clone)]
pub struct RangeForwarder {
    http: Client,
    origin_slots: Arc<Semaphore>,
    chunk_size: usize,
}

impl RangeForwarder {
    /// Builds a forwarder from proxy configuration.
    ///
    /// The client applies the configured timeout both to the origin connect
    /// and to each body read, so a stalled origin fails one relay instead of
    /// wedging it.
    ///
    /// # Errors
    /// - `RelayError::ClientSetup` - the HTTP client could not be built
    pub fn new(config: &ProxyConfig) -> Result<Self, RelayError> {
        let http = Client::builder()
            .connect_timeout(config.origin_timeout)
            .read_timeout(config.origin_timeout)
            .build()
            .map_err(|e| RelayError::ClientSetup {
                reason: e.to_string(),
            })?;
        Ok(Self {
            http,
            origin_slots: Arc::new(Semaphore::new(config.max_origin_connections)),
            chunk_size: config.chunk_size,
        })
    }

    /// Issues the origin GET, forwarding the inbound `Range` verbatim.
    ///
    /// Waits for an origin slot, then sends the request with
    /// `Accept-Encoding: identity` so the declared `Content-Length` and
    /// `Content-Range` match the raw bytes relayed. Non-2xx origin statuses
    /// are not errors here; they are mirrored to the caller.
    ///
    /// # Errors
    /// - `RelayError::Timeout` - origin connect or handshake timed out
    /// - `RelayError::Unreachable` - transport failure toward the origin
    pub async fn fetch(
        &self,
        target: &Url,
        range: Option<&str>,
    ) -> Result<OriginResponse, RelayError> {
        let permit = self
            .origin_slots
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| RelayError::Unreachable {
                url: target.to_string(),
                reason: "origin connection budget closed".to_string(),
            })?;

        let mut request = self
            .http
            .get(target.clone())
            .header(header::ACCEPT_ENCODING, "identity");
        if let Some(range) = range {
            request = request.header(header::RANGE, range);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RelayError::from_reqwest(target, e))?;

        let headers = RelayHeaders {
            content_type: header_value(&response, header::CONTENT_TYPE),
            content_length: header_value(&response, header::CONTENT_LENGTH),
            content_range: header_value(&response, header::CONTENT_RANGE),
            accept_ranges: header_value(&response, header::ACCEPT_RANGES),
        };

        Ok(OriginResponse {
            status: response.status(),
            headers,
            response,
            permit,
            chunk_size: self.chunk_size,
        })
    }
}

fn header_value(response: &reqwest::Response, name: HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}
