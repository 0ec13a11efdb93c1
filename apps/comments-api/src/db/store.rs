use async_trait::async_trait;
use comments_common::MonotonicClock;
use parking_lot::RwLock;

use crate::error::{ApiError, FieldError};
use crate::models::comment::{Comment, MAX_USERNAME_LEN};

/// Append-only comment log.
///
/// Appends are serialized by a single writer; reads return a snapshot of the
/// committed records and never wait on an append's I/O.
#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Validate, stamp and store a comment. Returns the stored record.
    async fn append(&self, author: &str, body: &str) -> Result<Comment, ApiError>;
    /// All committed comments, oldest first.
    async fn list_all(&self) -> Result<Vec<Comment>, ApiError>;
    /// Committed comments with `sequence > after`, oldest first, at most `limit`.
    async fn list_after(&self, after: u64, limit: usize) -> Result<Vec<Comment>, ApiError>;
    /// Number of committed comments.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Shared committed log
// ---------------------------------------------------------------------------

/// The committed records plus the stamping state shared by every store.
///
/// `draft` reads the current length to pick the next sequence, so callers
/// must hold their store's writer lock from `draft` through `commit`.
pub(crate) struct CommentLog {
    records: RwLock<Vec<Comment>>,
    clock: MonotonicClock,
    max_body_len: usize,
}

impl CommentLog {
    pub(crate) fn new(max_body_len: usize) -> Self {
        Self::from_records(Vec::new(), max_body_len)
    }

    /// Rebuild from records already known to be contiguous from sequence 1.
    pub(crate) fn from_records(records: Vec<Comment>, max_body_len: usize) -> Self {
        let clock = match records.last() {
            Some(last) => MonotonicClock::resume_from(last.created_at),
            None => MonotonicClock::new(),
        };
        Self {
            records: RwLock::new(records),
            clock,
            max_body_len,
        }
    }

    pub(crate) fn draft(&self, author: &str, body: &str) -> Result<Comment, ApiError> {
        let (author, body) = validate(author, body, self.max_body_len)?;
        let sequence = self.records.read().len() as u64 + 1;
        Ok(Comment {
            sequence,
            author: author.to_string(),
            body: body.to_string(),
            created_at: self.clock.now(),
        })
    }

    pub(crate) fn commit(&self, comment: Comment) {
        let mut records = self.records.write();
        debug_assert_eq!(comment.sequence, records.len() as u64 + 1);
        records.push(comment);
    }

    pub(crate) fn snapshot(&self) -> Vec<Comment> {
        self.records.read().clone()
    }

    pub(crate) fn after(&self, after: u64, limit: usize) -> Vec<Comment> {
        let records = self.records.read();
        let start = usize::try_from(after).unwrap_or(usize::MAX).min(records.len());
        let end = start.saturating_add(limit).min(records.len());
        records[start..end].to_vec()
    }

    pub(crate) fn len(&self) -> usize {
        self.records.read().len()
    }
}

/// Trim and check author and body. Returns the trimmed pair.
pub fn validate<'a>(
    author: &'a str,
    body: &'a str,
    max_body_len: usize,
) -> Result<(&'a str, &'a str), ApiError> {
    let author = author.trim();
    let body = body.trim();
    let mut errors = Vec::new();

    if author.is_empty() {
        errors.push(FieldError {
            field: "username".to_string(),
            message: "Username is required".to_string(),
        });
    } else if author.chars().count() > MAX_USERNAME_LEN {
        errors.push(FieldError {
            field: "username".to_string(),
            message: format!("Username must be {MAX_USERNAME_LEN} characters or fewer"),
        });
    }

    if body.is_empty() {
        errors.push(FieldError {
            field: "comment".to_string(),
            message: "Comment cannot be empty".to_string(),
        });
    } else if body.chars().count() > max_body_len {
        errors.push(FieldError {
            field: "comment".to_string(),
            message: format!("Comment must be {max_body_len} characters or fewer"),
        });
    }

    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }
    Ok((author, body))
}

// ---------------------------------------------------------------------------
// In-memory implementation
// ---------------------------------------------------------------------------

/// Comment store that lives only as long as the process.
pub struct MemoryCommentStore {
    writer: tokio::sync::Mutex<()>,
    log: CommentLog,
}

impl MemoryCommentStore {
    pub fn new(max_body_len: usize) -> Self {
        Self {
            writer: tokio::sync::Mutex::new(()),
            log: CommentLog::new(max_body_len),
        }
    }
}

#[async_trait]
impl CommentStore for MemoryCommentStore {
    async fn append(&self, author: &str, body: &str) -> Result<Comment, ApiError> {
        let _writer = self.writer.lock().await;
        let comment = self.log.draft(author, body)?;
        self.log.commit(comment.clone());
        Ok(comment)
    }

    async fn list_all(&self) -> Result<Vec<Comment>, ApiError> {
        Ok(self.log.snapshot())
    }

    async fn list_after(&self, after: u64, limit: usize) -> Result<Vec<Comment>, ApiError> {
        Ok(self.log.after(after, limit))
    }

    fn len(&self) -> usize {
        self.log.len()
    }
}
