//! Streaming fetch: the caller gets its thread back immediately.
//!
//! `fetch_stream` registers the request on the runtime and returns a
//! [`TweetStream`] handle before a single byte has arrived. A spawned task
//! drives the exchange, feeding body chunks through the incremental decoder
//! and handing completed tweets to the consumer over a bounded channel.
//!
//! Failures arrive as a terminal `Err` item on the stream rather than a
//! returned error: after an `Err`, the stream yields nothing more. The
//! consumer can stop early with [`TweetStream::cancel`]; dropping the stream
//! has the same effect. Either way the in-flight exchange is torn down and
//! its connection released.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::client::Fetcher;
use crate::decode::FrameDecoder;
use crate::error::{FetchError, Phase};
use crate::types::{FetchRequest, Tweet};

/// Backpressure bound: when the consumer lags this many tweets behind, the
/// producer stops reading from the socket until the consumer catches up.
/// Buffer-with-bound was chosen over drop-oldest so a slow consumer still
/// sees the exact sequence the blocking mode would have returned.
const CHANNEL_CAPACITY: usize = 16;

impl Fetcher {
    /// Fetch the tweet list as a lazy asynchronous sequence.
    ///
    /// Returns immediately; the request runs on a spawned task. The sequence
    /// is finite and not restartable: collect it once, or cancel it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn fetch_stream(&self, request: FetchRequest) -> TweetStream {
        tracing::info!(url = %request.url(), "starting streaming fetch");

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let client = self.async_client().clone();
        let max_body_bytes = self.config().max_body_bytes;

        let task = tokio::spawn(async move {
            if let Err(err) = produce(client, request, max_body_bytes, &tx).await {
                // Consumer may already be gone; nothing left to notify then.
                let _ = tx.send(Err(err)).await;
            }
        });

        TweetStream {
            rx,
            task,
            terminated: false,
        }
    }

    /// Convenience wrapper: streaming fetch of a bare URI with no extra
    /// headers or cookies.
    pub fn fetch_stream_url(&self, uri: &str) -> Result<TweetStream, FetchError> {
        Ok(self.fetch_stream(FetchRequest::get(uri)?))
    }
}

/// Drive one exchange to completion, sending each tweet as it parses.
async fn produce(
    client: reqwest::Client,
    request: FetchRequest,
    max_body_bytes: usize,
    tx: &mpsc::Sender<Result<Tweet, FetchError>>,
) -> Result<(), FetchError> {
    let headers = request.header_map()?;
    let mut response = client
        .get(request.url().clone())
        .headers(headers)
        .send()
        .await
        .map_err(|e| FetchError::from_transport(e, Phase::Send))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::HttpStatus {
            code: status.as_u16(),
        });
    }

    let mut decoder = FrameDecoder::new(max_body_bytes);
    let mut emitted = 0usize;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| FetchError::from_transport(e, Phase::Body))?
    {
        for tweet in decoder.push(&chunk)? {
            tracing::debug!(%tweet, "tweet arrived");
            emitted += 1;
            if tx.send(Ok(tweet)).await.is_err() {
                // Consumer cancelled; stop reading and let the response drop.
                tracing::debug!("consumer gone, abandoning stream");
                return Ok(());
            }
        }
    }
    decoder.finish()?;

    tracing::info!(count = emitted, "streaming fetch complete");
    Ok(())
}

/// Handle to an in-flight streaming fetch.
///
/// Yields `Ok(Tweet)` in wire order, then ends; any failure is delivered
/// once as `Err` and terminates the sequence.
pub struct TweetStream {
    rx: mpsc::Receiver<Result<Tweet, FetchError>>,
    task: JoinHandle<()>,
    terminated: bool,
}

impl TweetStream {
    /// Stop the fetch: abort the producer task, closing the underlying
    /// network exchange. No further items are delivered.
    pub fn cancel(&mut self) {
        self.terminated = true;
        self.task.abort();
        self.rx.close();
    }
}

impl Stream for TweetStream {
    type Item = Result<Tweet, FetchError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.terminated {
            return Poll::Ready(None);
        }
        match this.rx.poll_recv(cx) {
            Poll::Ready(Some(Err(err))) => {
                // Terminal error: nothing may follow it.
                this.terminated = true;
                this.rx.close();
                Poll::Ready(Some(Err(err)))
            }
            other => other,
        }
    }
}

impl Drop for TweetStream {
    fn drop(&mut self) {
        self.task.abort();
    }
}
