//! Blocking fetch: suspend the calling thread for the whole round trip.
//!
//! This is the deliberately thread-hungry half of the crate: connect, send,
//! full body buffering, and deserialization all happen before the call
//! returns, and the calling thread does nothing else meanwhile. Do not call
//! it from an async runtime worker; hand it to a dedicated thread or
//! `spawn_blocking`.

use std::io::Read;

use crate::client::Fetcher;
use crate::error::{FetchError, Phase};
use crate::types::{FetchRequest, Tweet};

impl Fetcher {
    /// Fetch the whole tweet list, blocking until it is fully materialized.
    ///
    /// Returns the tweets in the order the remote emitted them. Fails with
    /// [`FetchError::HttpStatus`] outside 2xx, [`FetchError::PayloadTooLarge`]
    /// once the body passes the configured limit, and
    /// [`FetchError::Deserialization`] for malformed bodies. A single failed
    /// attempt is surfaced immediately; there are no retries.
    pub fn fetch_blocking(&self, request: &FetchRequest) -> Result<Vec<Tweet>, FetchError> {
        tracing::info!(url = %request.url(), "starting blocking fetch");

        let headers = request.header_map()?;
        let response = self
            .blocking_client()
            .get(request.url().clone())
            .headers(headers)
            .send()
            .map_err(|e| FetchError::from_transport(e, Phase::Send))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                code: status.as_u16(),
            });
        }

        let limit = self.config().max_body_bytes;
        if let Some(len) = response.content_length() {
            if len > limit as u64 {
                return Err(FetchError::PayloadTooLarge { limit });
            }
        }

        // Cap the read one byte past the limit so oversized chunked bodies
        // are caught without buffering them whole.
        let mut body = Vec::new();
        response
            .take(limit as u64 + 1)
            .read_to_end(&mut body)
            .map_err(body_read_error)?;
        if body.len() > limit {
            return Err(FetchError::PayloadTooLarge { limit });
        }

        let tweets: Vec<Tweet> = serde_json::from_slice(&body)?;
        tracing::info!(count = tweets.len(), "blocking fetch complete");
        Ok(tweets)
    }

    /// Convenience wrapper: blocking fetch of a bare URI with no extra
    /// headers or cookies.
    pub fn fetch_blocking_url(&self, uri: &str) -> Result<Vec<Tweet>, FetchError> {
        self.fetch_blocking(&FetchRequest::get(uri)?)
    }
}

/// The blocking body reader reports failures as `io::Error`, usually with
/// the original `reqwest::Error` boxed inside.
fn body_read_error(err: std::io::Error) -> FetchError {
    let kind = err.kind();
    if kind == std::io::ErrorKind::TimedOut {
        return FetchError::ReadTimeout;
    }
    match err.into_inner() {
        Some(inner) => match inner.downcast::<reqwest::Error>() {
            Ok(transport) => FetchError::from_transport(*transport, Phase::Body),
            Err(other) => FetchError::BodyRead(std::io::Error::other(other)),
        },
        None => FetchError::BodyRead(std::io::Error::from(kind)),
    }
}
