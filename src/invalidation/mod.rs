//! Distributed tag-clean broadcast over redis pub/sub.
//!
//! Processes sharing one logical cache each keep their own backend and tag
//! index; a `clean_tags` on one process publishes the tag list on a
//! well-known channel and every subscriber (the publisher included —
//! fan-out is not self-excluding) applies the equivalent local clean. The
//! local clean always takes effect before the broadcast is attempted, so
//! local consistency never depends on remote delivery.

use deadpool_redis::{Pool, Runtime};
use futures::StreamExt;
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{CacheError, Result};

#[cfg(test)]
mod codec_test;

const COMP_CHANNEL: &str = "invalidation";

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(300);

/// Tag lists travel as a single comma-joined message.
pub fn encode_tags(tags: &[String]) -> String {
    tags.join(",")
}

/// Splits an inbound message back into a tag list, dropping empty
/// segments a sloppy publisher may have produced.
pub fn decode_tags(message: &str) -> Vec<String> {
    message
        .split(',')
        .filter(|tag| !tag.is_empty())
        .map(|tag| tag.to_string())
        .collect()
}

/// Connection state of a participating process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ChannelState {
    Disconnected = 0,
    Connecting = 1,
    Subscribed = 2,
}

impl ChannelState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => ChannelState::Connecting,
            2 => ChannelState::Subscribed,
            _ => ChannelState::Disconnected,
        }
    }
}

/// Shared observable cell for the listener's state machine.
#[derive(Debug, Clone, Default)]
pub struct ChannelStateCell(Arc<AtomicU8>);

impl ChannelStateCell {
    pub fn get(&self) -> ChannelState {
        ChannelState::from_u8(self.0.load(Ordering::Relaxed))
    }

    fn set(&self, state: ChannelState) {
        self.0.store(state as u8, Ordering::Relaxed);
    }
}

/// Publishing side of the channel.
pub struct InvalidationPublisher {
    pool: Pool,
    channel: String,
}

impl InvalidationPublisher {
    pub fn new(url: &str, channel: &str) -> Result<Self> {
        let pool = deadpool_redis::Config::from_url(url)
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| {
                CacheError::ChannelUnavailable(format!("create invalidation pool: {e}"))
            })?;
        Ok(Self {
            pool,
            channel: channel.to_string(),
        })
    }

    /// Publishes the tag list, resolving once the transport acknowledges
    /// delivery to the fan-out layer (not once subscribers have acted).
    pub async fn publish(&self, tags: &[String]) -> Result<()> {
        if tags.is_empty() {
            return Ok(());
        }
        let mut conn = self.pool.get().await.map_err(|e| {
            CacheError::ChannelUnavailable(format!("get invalidation connection: {e}"))
        })?;
        let message = encode_tags(tags);
        let _receivers: i64 = redis::cmd("PUBLISH")
            .arg(&self.channel)
            .arg(&message)
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::ChannelUnavailable(format!("publish clean-tags: {e}")))?;
        debug!(
            component = COMP_CHANNEL,
            event = "publish",
            channel = %self.channel,
            tags = %message,
            "published clean-tags broadcast"
        );
        Ok(())
    }
}

impl std::fmt::Debug for InvalidationPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvalidationPublisher")
            .field("channel", &self.channel)
            .finish()
    }
}

/// Subscribing side of the channel.
///
/// `start` spawns a background task that walks the
/// `Disconnected -> Connecting -> Subscribed` machine, dropping back to
/// `Disconnected` on transport error and reconnecting with exponential
/// backoff until the cancellation token fires.
pub struct InvalidationListener {
    url: String,
    channel: String,
    state: ChannelStateCell,
}

impl InvalidationListener {
    pub fn new(url: &str, channel: &str) -> Self {
        Self {
            url: url.to_string(),
            channel: channel.to_string(),
            state: ChannelStateCell::default(),
        }
    }

    /// Observable handle for the listener's state machine, valid before
    /// and after `start`.
    pub fn state_cell(&self) -> ChannelStateCell {
        self.state.clone()
    }

    /// Starts the subscription loop. `on_tags` runs for every inbound
    /// message and performs the local equivalent of `clean_tags` without
    /// re-publishing, which keeps self-delivery idempotent.
    pub fn start<F, Fut>(self, token: CancellationToken, on_tags: F) -> ChannelStateCell
    where
        F: Fn(Vec<String>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let state = self.state.clone();
        tokio::task::spawn(async move {
            let mut backoff = INITIAL_BACKOFF;
            loop {
                if token.is_cancelled() {
                    break;
                }
                match self.run(&token, &on_tags).await {
                    Ok(()) => break, // cancelled while subscribed
                    Err(e) => {
                        self.state.set(ChannelState::Disconnected);
                        error!(
                            component = COMP_CHANNEL,
                            event = "subscribe_failed",
                            error = %e,
                            backoff_secs = backoff.as_secs(),
                            "invalidation listener error, reconnecting"
                        );
                        tokio::select! {
                            _ = tokio::time::sleep(backoff) => {}
                            _ = token.cancelled() => break,
                        }
                        backoff = (backoff * 2).min(MAX_BACKOFF);
                    }
                }
            }
            self.state.set(ChannelState::Disconnected);
        });
        state
    }

    async fn run<F, Fut>(&self, token: &CancellationToken, on_tags: &F) -> Result<()>
    where
        F: Fn(Vec<String>) -> Fut + Send + Sync,
        Fut: Future<Output = ()> + Send,
    {
        self.state.set(ChannelState::Connecting);

        // Pub/sub needs a dedicated client; pooled connections multiplex
        // regular commands and cannot enter subscriber mode.
        let client = redis::Client::open(self.url.as_str())
            .map_err(|e| CacheError::ChannelUnavailable(format!("create pub/sub client: {e}")))?;
        let mut pubsub = client
            .get_async_pubsub()
            .await
            .map_err(|e| CacheError::ChannelUnavailable(format!("connect pub/sub: {e}")))?;

        pubsub
            .psubscribe(&self.channel)
            .await
            .map_err(|e| CacheError::ChannelUnavailable(format!("psubscribe: {e}")))?;

        self.state.set(ChannelState::Subscribed);
        info!(
            component = COMP_CHANNEL,
            event = "subscribed",
            channel = %self.channel,
            "listening for clean-tags broadcasts"
        );

        let mut stream = pubsub.on_message();
        loop {
            tokio::select! {
                message = stream.next() => {
                    let Some(message) = message else {
                        return Err(CacheError::ChannelUnavailable(
                            "pub/sub connection closed".to_string(),
                        ));
                    };
                    match message.get_payload::<String>() {
                        Ok(payload) => {
                            let tags = decode_tags(&payload);
                            if tags.is_empty() {
                                continue;
                            }
                            debug!(
                                component = COMP_CHANNEL,
                                event = "received",
                                tags = %payload,
                                "applying remote clean-tags"
                            );
                            on_tags(tags).await;
                        }
                        Err(e) => {
                            warn!(
                                component = COMP_CHANNEL,
                                event = "bad_payload",
                                error = %e,
                                "ignoring undecodable broadcast"
                            );
                        }
                    }
                }
                _ = token.cancelled() => return Ok(()),
            }
        }
    }
}
