use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A stored comment. Immutable once appended to the log.
///
/// Serialized with the wire names clients use (`username`, `comment`,
/// `timestamp`); the journal uses the same representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Comment {
    /// Position in the log, starting at 1 with no gaps.
    pub sequence: u64,
    #[serde(rename = "username")]
    pub author: String,
    #[serde(rename = "comment")]
    pub body: String,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Longest accepted display name, in characters.
pub const MAX_USERNAME_LEN: usize = 64;
