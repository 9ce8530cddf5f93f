//! Live-update push channel.
//!
//! The backend pushes authoritative slot/booking snapshots plus keepalive
//! pings. This module parses raw frames, drops pings, and fans typed
//! [`PushUpdate`]s out to any number of subscribers over a broadcast
//! channel. The connection itself is behind [`PushTransport`]: the core
//! establishes one subscription per process and never reconnects —
//! connection loss is logged, and a caller that wants backoff wraps its own
//! transport.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::broadcast;
use url::Url;

use crate::api::{Booking, SlotMap};

/// Broadcast capacity; lagging subscribers drop the oldest updates, which is
/// safe because every update is a full snapshot.
const CHANNEL_CAPACITY: usize = 32;

/// Errors on the push transport.
#[derive(Debug, Error)]
pub enum PushError {
    /// Underlying HTTP stream failed.
    #[error("push transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Subscription URL was invalid.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// One raw frame from the push channel.
#[derive(Debug, Deserialize)]
pub struct PushFrame {
    /// Full availability snapshot, when slots changed.
    #[serde(default)]
    pub slots: Option<SlotMap>,
    /// Full booking snapshot, when bookings changed.
    #[serde(default)]
    pub bookings: Option<Vec<Booking>>,
    /// Frame kind; `"ping"` marks a keepalive.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl PushFrame {
    /// Whether this frame is a keepalive that must not trigger re-render.
    #[must_use]
    pub fn is_ping(&self) -> bool {
        self.kind.as_deref() == Some("ping")
    }
}

/// Typed update delivered to subscribers.
#[derive(Clone, Debug)]
pub enum PushUpdate {
    /// Authoritative availability snapshot.
    Slots(SlotMap),
    /// Authoritative booking snapshot.
    Bookings(Vec<Booking>),
}

/// Frame source for the push channel.
#[async_trait]
pub trait PushTransport: Send {
    /// Next raw frame, or `None` once the connection is closed.
    async fn next_frame(&mut self) -> Option<Result<String, PushError>>;
}

/// Process-wide push channel: one pump task, many subscribers.
pub struct PushChannel {
    sender: broadcast::Sender<PushUpdate>,
}

impl Default for PushChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl PushChannel {
    /// Create a channel with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Subscribe to typed updates.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PushUpdate> {
        self.sender.subscribe()
    }

    /// Consume a transport until it closes, dispatching each frame.
    ///
    /// Connection loss ends the pump and is logged only; it is never
    /// surfaced to the user and never retried here.
    pub async fn pump<T: PushTransport>(&self, mut transport: T) {
        while let Some(frame) = transport.next_frame().await {
            match frame {
                Ok(raw) => self.dispatch(&raw),
                Err(err) => tracing::warn!("push channel error: {err}"),
            }
        }
        tracing::warn!("push channel closed");
    }

    /// Parse one raw frame and broadcast its updates.
    ///
    /// Pings and unparseable frames are dropped. `slots` and `bookings`
    /// dispatch independently; a frame may carry either, both or neither.
    pub fn dispatch(&self, raw: &str) {
        let frame: PushFrame = match serde_json::from_str(raw) {
            Ok(frame) => frame,
            Err(err) => {
                tracing::warn!("discarding unparseable push frame: {err}");
                return;
            }
        };
        if frame.is_ping() {
            tracing::trace!("push keepalive");
            return;
        }
        if let Some(slots) = frame.slots {
            self.send(PushUpdate::Slots(slots));
        }
        if let Some(bookings) = frame.bookings {
            self.send(PushUpdate::Bookings(bookings));
        }
    }

    fn send(&self, update: PushUpdate) {
        if self.sender.send(update).is_err() {
            tracing::debug!("push update dropped: no subscribers");
        }
    }
}

/// Newline-delimited JSON frames over a streaming HTTP response.
pub struct NdjsonTransport {
    chunks: BoxStream<'static, reqwest::Result<Vec<u8>>>,
    buffer: String,
}

impl NdjsonTransport {
    /// Open the stream at `url` with the given client.
    ///
    /// # Errors
    /// Returns an error if the request fails or the backend refuses the
    /// subscription.
    pub async fn connect(client: &reqwest::Client, url: Url) -> Result<Self, PushError> {
        let response = client.get(url).send().await?.error_for_status()?;
        let chunks = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
            .boxed();
        Ok(Self {
            chunks,
            buffer: String::new(),
        })
    }
}

#[async_trait]
impl PushTransport for NdjsonTransport {
    async fn next_frame(&mut self) -> Option<Result<String, PushError>> {
        loop {
            if let Some(pos) = self.buffer.find('\n') {
                let line = self.buffer[..pos].trim().to_string();
                self.buffer.drain(..=pos);
                if line.is_empty() {
                    continue;
                }
                return Some(Ok(line));
            }
            match self.chunks.next().await {
                Some(Ok(chunk)) => self.buffer.push_str(&String::from_utf8_lossy(&chunk)),
                Some(Err(err)) => return Some(Err(err.into())),
                None => {
                    // Flush a trailing unterminated frame before closing.
                    let line = self.buffer.trim().to_string();
                    self.buffer.clear();
                    if line.is_empty() {
                        return None;
                    }
                    return Some(Ok(line));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_frames_never_dispatch() {
        let channel = PushChannel::new();
        let mut receiver = channel.subscribe();

        channel.dispatch(r#"{"type":"ping"}"#);
        assert!(matches!(
            receiver.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[test]
    fn test_slots_and_bookings_dispatch_independently() {
        let channel = PushChannel::new();
        let mut receiver = channel.subscribe();

        channel.dispatch(r#"{"slots":{"2024-05-10":["09:00"]}}"#);
        assert!(matches!(receiver.try_recv(), Ok(PushUpdate::Slots(_))));

        channel.dispatch(
            r#"{"slots":{},"bookings":[{"id":"b-1","customer_name":"Ana","service":"Haircut","date":"2024-05-10","time":"09:00","status":"pending"}]}"#,
        );
        assert!(matches!(receiver.try_recv(), Ok(PushUpdate::Slots(_))));
        assert!(matches!(receiver.try_recv(), Ok(PushUpdate::Bookings(_))));
    }

    #[test]
    fn test_malformed_frames_are_dropped() {
        let channel = PushChannel::new();
        let mut receiver = channel.subscribe();

        channel.dispatch("not json");
        channel.dispatch("{}");
        assert!(matches!(
            receiver.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }
}
