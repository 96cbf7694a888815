use std::time::Duration;

use crate::error::FetchError;

/// Connection configuration shared by both fetch modes.
///
/// All timeouts must be greater than zero. `max_body_bytes` bounds the
/// buffered body in blocking mode and the unparsed working buffer in
/// streaming mode.
///
/// reqwest exposes no standalone write timer, so `write_timeout` is folded
/// into the total request deadline (`write_timeout + read_timeout`); a
/// timeout raised while the request is still being transmitted is reported
/// as [`FetchError::WriteTimeout`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Bound on establishing the TCP connection.
    pub connect_timeout: Duration,
    /// Bound on each read of response data (headers or body).
    pub read_timeout: Duration,
    /// Bound on transmitting the request.
    pub write_timeout: Duration,
    /// Bound on buffered response-body bytes.
    pub max_body_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(10),
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

impl FetchConfig {
    /// Validate the configuration, returning it unchanged when sound.
    pub fn validated(self) -> Result<Self, FetchError> {
        if self.connect_timeout.is_zero() {
            return Err(FetchError::Config {
                message: "connect_timeout must be greater than zero".to_string(),
            });
        }
        if self.read_timeout.is_zero() {
            return Err(FetchError::Config {
                message: "read_timeout must be greater than zero".to_string(),
            });
        }
        if self.write_timeout.is_zero() {
            return Err(FetchError::Config {
                message: "write_timeout must be greater than zero".to_string(),
            });
        }
        if self.max_body_bytes == 0 {
            return Err(FetchError::Config {
                message: "max_body_bytes must be greater than zero".to_string(),
            });
        }
        Ok(self)
    }

    /// Total deadline for one request once the connection is up.
    pub(crate) fn request_deadline(&self) -> Duration {
        self.write_timeout + self.read_timeout
    }
}
