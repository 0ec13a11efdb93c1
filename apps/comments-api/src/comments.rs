//! Ingest and history: the only path from a posted comment to the viewers.

use std::sync::Arc;

use crate::db::store::CommentStore;
use crate::error::ApiError;
use crate::gateway::fanout::BroadcastHub;
use crate::models::comment::Comment;

/// Appends comments and publishes them in store order.
pub struct CommentService {
    store: Arc<dyn CommentStore>,
    hub: Arc<BroadcastHub>,
    /// Held from append through publish so two publishes never swap.
    gate: tokio::sync::Mutex<()>,
}

impl CommentService {
    pub fn new(store: Arc<dyn CommentStore>, hub: Arc<BroadcastHub>) -> Self {
        Self {
            store,
            hub,
            gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Store a comment and push it to every live viewer, the poster included.
    ///
    /// A blank body is a validation error: nothing is stored or published.
    pub async fn post(&self, author: &str, body: &str) -> Result<Comment, ApiError> {
        let _gate = self.gate.lock().await;
        let comment = self.store.append(author, body).await?;
        let report = self.hub.publish(Arc::new(comment.clone()));

        tracing::info!(
            sequence = comment.sequence,
            author = %comment.author,
            delivered = report.delivered,
            dropped = report.dropped,
            pruned = report.pruned,
            "comment posted"
        );
        Ok(comment)
    }

    /// Full history, oldest first.
    pub async fn history(&self) -> Result<Vec<Comment>, ApiError> {
        self.store.list_all().await
    }

    /// History after `sequence`, oldest first, at most `limit` records.
    pub async fn history_after(&self, sequence: u64, limit: usize) -> Result<Vec<Comment>, ApiError> {
        self.store.list_after(sequence, limit).await
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
