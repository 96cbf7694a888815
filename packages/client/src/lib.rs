//! # dualfetch-client
//!
//! A dual-mode HTTP fetch client: one logical operation, fetching a list
//! of tweets from a remote endpoint, offered through two execution
//! disciplines that share a single configured connection layer.
//!
//! ## Blocking mode
//!
//! Suspends the calling thread for the entire round trip and returns the
//! fully materialized list:
//!
//! ```ignore
//! use dualfetch_client::{FetchConfig, Fetcher};
//!
//! let fetcher = Fetcher::new(FetchConfig::default())?;
//! let tweets = fetcher.fetch_blocking_url("http://localhost:8080/slow-tweets")?;
//! for tweet in &tweets {
//!     println!("{tweet}");
//! }
//! ```
//!
//! ## Streaming mode
//!
//! Returns a handle immediately; tweets arrive as a lazy asynchronous
//! sequence, one at a time, as the body bytes parse:
//!
//! ```ignore
//! use dualfetch_client::Fetcher;
//! use futures::StreamExt;
//!
//! let fetcher = Fetcher::with_defaults()?;
//! let mut stream = fetcher.fetch_stream_url("http://localhost:8080/slow-tweets")?;
//! while let Some(tweet) = stream.next().await {
//!     println!("{}", tweet?);
//! }
//! ```
//!
//! Both modes honor the same [`FetchConfig`] timeouts and body limit, raise
//! the same error taxonomy ([`FetchError`]), and never retry: one failure
//! ends the one in-flight operation. Blocking failures come back as `Err`;
//! streaming failures arrive as a terminal `Err` item on the sequence.

pub mod config;
pub mod error;
pub mod types;

mod client;

#[cfg(feature = "blocking")]
mod blocking;

#[cfg(feature = "stream")]
mod decode;
#[cfg(feature = "stream")]
mod stream;

pub use client::Fetcher;
pub use config::FetchConfig;
pub use error::FetchError;
pub use types::{FetchRequest, Tweet};

#[cfg(feature = "stream")]
pub use stream::TweetStream;
