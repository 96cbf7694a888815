use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, COOKIE};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::FetchError;

/// A single tweet as served by the remote list endpoint.
///
/// Immutable value type; two tweets are equal when their fields are equal.
/// The wire field for the author is `author`, with `username` accepted as a
/// legacy alias.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tweet {
    pub text: String,
    #[serde(alias = "username")]
    pub author: String,
}

impl Tweet {
    pub fn new(text: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            author: author.into(),
        }
    }
}

impl std::fmt::Display for Tweet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.author, self.text)
    }
}

/// A GET request to a tweet list endpoint.
///
/// Caller-supplied headers and cookies pass through to the wire unmodified;
/// an `Accept: application/json` header is added only when the caller set no
/// `Accept` of their own.
///
/// # Example
///
/// ```ignore
/// let request = FetchRequest::get("http://localhost:8080/slow-tweets")?
///     .with_header("X-Trace-Id", "abc123")
///     .with_cookie("session", "s3cret");
/// ```
#[derive(Debug, Clone)]
pub struct FetchRequest {
    url: Url,
    headers: Vec<(String, String)>,
    cookies: Vec<(String, String)>,
}

impl FetchRequest {
    /// Build a GET request for the given URI.
    pub fn get(uri: &str) -> Result<Self, FetchError> {
        Ok(Self {
            url: Url::parse(uri)?,
            headers: Vec::new(),
            cookies: Vec::new(),
        })
    }

    /// Add a header, preserving insertion order on the wire.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add a cookie pair; all pairs are sent in one `Cookie` header.
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.push((name.into(), value.into()));
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Assemble the outgoing header map: caller headers verbatim, cookies
    /// joined into one `Cookie` header, and a default `Accept` when unset.
    pub(crate) fn header_map(&self) -> Result<HeaderMap, FetchError> {
        let mut map = HeaderMap::new();

        for (name, value) in &self.headers {
            let header_name =
                HeaderName::try_from(name.as_str()).map_err(|e| FetchError::InvalidHeader {
                    name: name.clone(),
                    message: e.to_string(),
                })?;
            let header_value =
                HeaderValue::try_from(value.as_str()).map_err(|e| FetchError::InvalidHeader {
                    name: name.clone(),
                    message: e.to_string(),
                })?;
            map.append(header_name, header_value);
        }

        if !self.cookies.is_empty() {
            let joined = self
                .cookies
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("; ");
            let value = HeaderValue::try_from(joined).map_err(|e| FetchError::InvalidHeader {
                name: "Cookie".to_string(),
                message: e.to_string(),
            })?;
            map.append(COOKIE, value);
        }

        if !map.contains_key(ACCEPT) {
            map.insert(ACCEPT, HeaderValue::from_static("application/json"));
        }

        Ok(map)
    }
}
