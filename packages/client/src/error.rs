use std::error::Error as StdError;

/// Which phase of the exchange a transport error was observed in.
///
/// reqwest reports one opaque error for the whole send; the caller knows
/// whether it was still sending the request or already draining the body,
/// and that is what separates a write timeout from a read timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    /// Connecting, transmitting the request, or waiting for response headers.
    Send,
    /// Reading the response body.
    Body,
}

/// Errors surfaced by both fetch modes.
///
/// Transport kinds (`ConnectTimeout` through `DnsFailure`) come from the
/// connection layer unchanged; `HttpStatus` and `Deserialization` are raised
/// per fetch. There is no retry anywhere: one failure terminates the one
/// in-flight operation.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("connect timed out")]
    ConnectTimeout,

    #[error("read timed out waiting for response data")]
    ReadTimeout,

    #[error("write timed out transmitting the request")]
    WriteTimeout,

    #[error("connection refused by remote host")]
    ConnectionRefused,

    #[error("DNS resolution failed")]
    DnsFailure,

    #[error("response body exceeded the configured limit of {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("unexpected HTTP status {code}")]
    HttpStatus { code: u16 },

    #[error("response body is not a well-formed tweet list: {0}")]
    Deserialization(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid header {name}: {message}")]
    InvalidHeader { name: String, message: String },

    #[error("invalid configuration: {message}")]
    Config { message: String },

    /// Transport failure outside the taxonomy (TLS, protocol violations).
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// I/O failure reading the response body that carried no richer cause.
    #[error("failed reading response body: {0}")]
    BodyRead(#[source] std::io::Error),
}

impl FetchError {
    /// Classify a reqwest transport error into the fetch taxonomy.
    ///
    /// `phase` disambiguates timeouts: reqwest raises the same timeout error
    /// whether the request write stalled or the response never arrived.
    pub(crate) fn from_transport(err: reqwest::Error, phase: Phase) -> Self {
        if err.is_timeout() {
            if err.is_connect() {
                return FetchError::ConnectTimeout;
            }
            return match phase {
                Phase::Send if err.is_body() => FetchError::WriteTimeout,
                _ => FetchError::ReadTimeout,
            };
        }

        if err.is_connect() {
            if io_kind(&err) == Some(std::io::ErrorKind::ConnectionRefused) {
                return FetchError::ConnectionRefused;
            }
            if looks_like_dns_failure(&err) {
                return FetchError::DnsFailure;
            }
        }

        FetchError::Transport(err)
    }
}

/// Walk the source chain looking for the underlying `std::io::Error` kind.
fn io_kind(err: &reqwest::Error) -> Option<std::io::ErrorKind> {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            return Some(io.kind());
        }
        source = cause.source();
    }
    None
}

/// Resolver failures have no dedicated `io::ErrorKind`; the resolver's error
/// message is the only stable signal reqwest leaves in the chain.
fn looks_like_dns_failure(err: &reqwest::Error) -> bool {
    let mut source: Option<&dyn StdError> = Some(err);
    while let Some(cause) = source {
        let text = cause.to_string().to_ascii_lowercase();
        if text.contains("dns") || text.contains("lookup address") {
            return true;
        }
        source = cause.source();
    }
    false
}
