//! Broadcast hub fanning new comments out to every live viewer channel.
//!
//! Each viewer owns a bounded `mpsc` queue registered under its viewer id.
//! `publish` does a non-blocking `try_send` into every queue: a full queue
//! misses that event, a closed queue is pruned. Nothing is retried or replayed;
//! a viewer that missed events catches up through the history endpoint.
//!
//! A channel receives every event whose `publish` starts after `subscribe`
//! returned. Events published concurrently with the subscription may or may
//! not arrive.

use std::fmt;
use std::sync::{Arc, Weak};

use comments_common::id::{prefix, prefixed_ulid};
use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::models::comment::Comment;

type ChannelMap = DashMap<String, mpsc::Sender<Arc<Comment>>>;

/// Why a single channel did not receive an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryFailure {
    /// The viewer's queue was full.
    Lagged,
    /// The viewer's receiver is gone.
    Closed,
}

impl fmt::Display for DeliveryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryFailure::Lagged => f.write_str("viewer queue full"),
            DeliveryFailure::Closed => f.write_str("viewer channel closed"),
        }
    }
}

/// Outcome of one `publish` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: usize,
    pub dropped: usize,
    pub pruned: usize,
}

/// The live-channel registry. Store one in `AppState`.
pub struct BroadcastHub {
    channels: Arc<ChannelMap>,
    capacity: usize,
}

impl BroadcastHub {
    /// `capacity` is the per-viewer queue length.
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Arc::new(DashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Register a new viewer channel.
    pub fn subscribe(&self) -> ChannelHandle {
        let viewer_id = prefixed_ulid(prefix::VIEWER);
        let (sender, receiver) = mpsc::channel(self.capacity);
        self.channels.insert(viewer_id.clone(), sender);
        tracing::debug!(%viewer_id, live = self.channels.len(), "viewer subscribed");

        ChannelHandle {
            viewer_id,
            receiver,
            channels: Arc::downgrade(&self.channels),
        }
    }

    /// Remove a viewer channel. Safe to call repeatedly; returns whether the
    /// channel was still registered.
    pub fn unsubscribe(&self, viewer_id: &str) -> bool {
        let removed = self.channels.remove(viewer_id).is_some();
        if removed {
            tracing::debug!(%viewer_id, live = self.channels.len(), "viewer unsubscribed");
        }
        removed
    }

    /// Deliver `comment` to every registered channel without blocking.
    pub fn publish(&self, comment: Arc<Comment>) -> PublishReport {
        let mut report = PublishReport::default();
        let mut closed = Vec::new();

        for entry in self.channels.iter() {
            match entry.value().try_send(comment.clone()) {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    let failure = match err {
                        TrySendError::Full(_) => DeliveryFailure::Lagged,
                        TrySendError::Closed(_) => DeliveryFailure::Closed,
                    };
                    tracing::warn!(
                        viewer_id = %entry.key(),
                        sequence = comment.sequence,
                        %failure,
                        "comment not delivered to viewer"
                    );
                    match failure {
                        DeliveryFailure::Lagged => report.dropped += 1,
                        DeliveryFailure::Closed => closed.push(entry.key().clone()),
                    }
                }
            }
        }

        for viewer_id in closed {
            if self.channels.remove(&viewer_id).is_some() {
                report.pruned += 1;
            }
        }

        report
    }

    /// Number of registered viewer channels.
    pub fn live_channels(&self) -> usize {
        self.channels.len()
    }
}

/// A viewer's end of the hub. Dropping it unsubscribes the channel.
pub struct ChannelHandle {
    viewer_id: String,
    receiver: mpsc::Receiver<Arc<Comment>>,
    channels: Weak<ChannelMap>,
}

impl ChannelHandle {
    pub fn viewer_id(&self) -> &str {
        &self.viewer_id
    }

    /// Wait for the next pushed comment. `None` once the hub dropped this
    /// channel.
    pub async fn recv(&mut self) -> Option<Arc<Comment>> {
        self.receiver.recv().await
    }
}

impl Drop for ChannelHandle {
    fn drop(&mut self) {
        if let Some(channels) = self.channels.upgrade() {
            channels.remove(&self.viewer_id);
        }
    }
}
