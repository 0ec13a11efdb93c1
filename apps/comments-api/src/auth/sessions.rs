//! Login sessions: an opaque id bound to a display name.

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::error::ApiError;
use crate::models::comment::MAX_USERNAME_LEN;

use super::tokens;

/// A bound session.
#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Shared registry of live sessions.
///
/// Sessions confer no privileges; any session may post under any name.
pub struct SessionRegistry {
    sessions: DashMap<String, SessionEntry>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Bind a fresh session id to `name`. Names are not unique.
    pub fn login(&self, name: &str) -> Result<String, ApiError> {
        let username = name.trim();
        if username.is_empty() {
            return Err(ApiError::invalid_field("username", "Username is required"));
        }
        if username.chars().count() > MAX_USERNAME_LEN {
            return Err(ApiError::invalid_field(
                "username",
                format!("Username must be {MAX_USERNAME_LEN} characters or fewer"),
            ));
        }

        let session_id = tokens::generate_session_id();
        self.sessions.insert(
            session_id.clone(),
            SessionEntry {
                username: username.to_string(),
                created_at: Utc::now(),
            },
        );
        tracing::debug!(%username, live = self.sessions.len(), "session created");
        Ok(session_id)
    }

    /// Discard a session. Returns whether it was bound.
    pub fn logout(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    /// The display name bound to `session_id`, if any.
    pub fn lookup(&self, session_id: &str) -> Option<String> {
        self.sessions.get(session_id).map(|e| e.username.clone())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
