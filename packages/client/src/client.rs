use crate::config::FetchConfig;
use crate::error::FetchError;

#[cfg(feature = "blocking")]
use std::sync::Arc;

/// Shared connection layer for both fetch modes.
///
/// One `Fetcher` is built from one [`FetchConfig`]; every request issued
/// through it, blocking or streaming, runs under that configuration's
/// timeouts and body limit. The handle is cheap to clone and safe to share
/// across concurrent fetches without caller-side locking (the underlying
/// reqwest clients synchronize their own connection pools). Dropping the
/// last clone is safe on any thread, including an async worker: teardown of
/// the blocking client is moved off the runtime when one is current.
#[derive(Clone)]
pub struct Fetcher {
    config: FetchConfig,
    #[cfg(feature = "stream")]
    client: reqwest::Client,
    #[cfg(feature = "blocking")]
    blocking: Arc<BlockingHandle>,
}

/// Owns the blocking client so its teardown can be redirected.
///
/// `reqwest::blocking::Client` shuts down an internal runtime when dropped,
/// which panics if it happens on an async worker thread. The last `Fetcher`
/// clone may well be dropped there, so `Drop` hands the client to a plain
/// thread whenever a tokio runtime is current.
#[cfg(feature = "blocking")]
struct BlockingHandle {
    client: Option<reqwest::blocking::Client>,
}

#[cfg(feature = "blocking")]
impl Drop for BlockingHandle {
    fn drop(&mut self) {
        if let Some(client) = self.client.take() {
            #[cfg(feature = "stream")]
            if tokio::runtime::Handle::try_current().is_ok() {
                std::thread::spawn(move || drop(client));
                return;
            }
            drop(client);
        }
    }
}

impl Fetcher {
    /// Build a fetcher from the given configuration.
    ///
    /// The configuration is validated up front; both underlying clients are
    /// constructed eagerly so a misconfiguration fails here rather than on
    /// the first request.
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let config = config.validated()?;

        #[cfg(feature = "stream")]
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .timeout(config.request_deadline())
            .build()
            .map_err(FetchError::Transport)?;

        #[cfg(feature = "blocking")]
        let blocking = reqwest::blocking::Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .timeout(config.request_deadline())
            .build()
            .map_err(FetchError::Transport)?;

        Ok(Self {
            config,
            #[cfg(feature = "stream")]
            client,
            #[cfg(feature = "blocking")]
            blocking: Arc::new(BlockingHandle {
                client: Some(blocking),
            }),
        })
    }

    /// Build a fetcher with the default configuration.
    pub fn with_defaults() -> Result<Self, FetchError> {
        Self::new(FetchConfig::default())
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    #[cfg(feature = "stream")]
    pub(crate) fn async_client(&self) -> &reqwest::Client {
        &self.client
    }

    #[cfg(feature = "blocking")]
    pub(crate) fn blocking_client(&self) -> &reqwest::blocking::Client {
        // Emptied only by Drop, never observable through a live handle.
        self.blocking
            .client
            .as_ref()
            .expect("blocking client present until drop")
    }
}
