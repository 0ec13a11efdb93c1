pub mod auth;
pub mod comments;
pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod models;
pub mod routes;

use std::sync::Arc;

use auth::sessions::SessionRegistry;
use comments::CommentService;
use config::Config;
use db::journal::FileCommentStore;
use db::store::{CommentStore, MemoryCommentStore};
use gateway::fanout::BroadcastHub;

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub comments: Arc<CommentService>,
    pub hub: Arc<BroadcastHub>,
    pub sessions: Arc<SessionRegistry>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire up the store named by `config` (journal file or memory), the hub
    /// and the session registry.
    pub async fn from_config(config: Config) -> std::io::Result<Self> {
        let store: Arc<dyn CommentStore> = match &config.journal_path {
            Some(path) => Arc::new(FileCommentStore::open(path, config.max_comment_len).await?),
            None => Arc::new(MemoryCommentStore::new(config.max_comment_len)),
        };
        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: Config, store: Arc<dyn CommentStore>) -> Self {
        let hub = Arc::new(BroadcastHub::new(config.viewer_buffer));
        Self {
            comments: Arc::new(CommentService::new(store, hub.clone())),
            hub,
            sessions: Arc::new(SessionRegistry::new()),
            config: Arc::new(config),
        }
    }
}
