//! JSON-lines journal backing a durable comment store.
//!
//! One comment per line, in sequence order. A record is committed to the
//! in-memory log only after its line has been flushed to disk.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::error::ApiError;
use crate::models::comment::Comment;

use super::store::{CommentLog, CommentStore};

/// Append-only byte sink under the journal.
#[async_trait]
pub(crate) trait JournalFile: Send {
    /// Write one line and make it durable.
    async fn append_line(&mut self, line: &[u8]) -> std::io::Result<()>;
    /// Cut the file back to `len` bytes.
    async fn truncate(&mut self, len: u64) -> std::io::Result<()>;
}

#[async_trait]
impl JournalFile for File {
    async fn append_line(&mut self, line: &[u8]) -> std::io::Result<()> {
        self.write_all(line).await?;
        self.flush().await?;
        self.sync_data().await
    }

    async fn truncate(&mut self, len: u64) -> std::io::Result<()> {
        // Waits for any write still in flight from a dropped append.
        self.set_len(len).await
    }
}

/// Append handle plus the byte length of the journal's committed prefix.
struct JournalWriter {
    file: Box<dyn JournalFile>,
    committed_len: u64,
    /// Set while a line is being written. Still set on the next lock when
    /// that append was dropped before it committed.
    dirty: bool,
}

impl JournalWriter {
    /// Drop any bytes past the committed prefix.
    async fn discard_uncommitted(&mut self) -> std::io::Result<()> {
        if self.dirty {
            tracing::warn!(
                committed_len = self.committed_len,
                "discarding uncommitted journal tail"
            );
            self.file.truncate(self.committed_len).await?;
            self.dirty = false;
        }
        Ok(())
    }
}

/// Comment store that survives restarts by replaying its journal.
pub struct FileCommentStore {
    path: PathBuf,
    writer: tokio::sync::Mutex<JournalWriter>,
    log: CommentLog,
}

impl FileCommentStore {
    /// Open (or create) the journal at `path` and replay it.
    ///
    /// Replay stops at the first line that does not parse or does not carry
    /// the next expected sequence; the file is truncated back to the last
    /// good record so later appends don't land after a torn write.
    pub async fn open(path: impl AsRef<Path>, max_body_len: usize) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(err) => return Err(err),
        };

        let (records, valid_len) = replay(&contents);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        if valid_len < contents.len() as u64 {
            tracing::warn!(
                path = %path.display(),
                kept = records.len(),
                discarded_bytes = contents.len() as u64 - valid_len,
                "journal has a damaged tail, truncating"
            );
            file.set_len(valid_len).await?;
        }

        tracing::info!(path = %path.display(), comments = records.len(), "journal replayed");

        Ok(Self::from_parts(path, Box::new(file), records, valid_len, max_body_len))
    }

    fn from_parts(
        path: PathBuf,
        file: Box<dyn JournalFile>,
        records: Vec<Comment>,
        committed_len: u64,
        max_body_len: usize,
    ) -> Self {
        Self {
            path,
            writer: tokio::sync::Mutex::new(JournalWriter {
                file,
                committed_len,
                dirty: false,
            }),
            log: CommentLog::from_records(records, max_body_len),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse journal contents. Returns the contiguous records and the byte length
/// of the prefix holding them.
fn replay(contents: &str) -> (Vec<Comment>, u64) {
    let mut records: Vec<Comment> = Vec::new();
    let mut valid_len = 0u64;

    for line in contents.split_inclusive('\n') {
        // An unterminated final line is a torn write.
        if !line.ends_with('\n') {
            break;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            valid_len += line.len() as u64;
            continue;
        }
        let comment: Comment = match serde_json::from_str(trimmed) {
            Ok(c) => c,
            Err(err) => {
                tracing::warn!(?err, after = records.len(), "unreadable journal line");
                break;
            }
        };
        if comment.sequence != records.len() as u64 + 1 {
            tracing::warn!(
                expected = records.len() as u64 + 1,
                found = comment.sequence,
                "journal sequence gap"
            );
            break;
        }
        records.push(comment);
        valid_len += line.len() as u64;
    }

    (records, valid_len)
}

#[async_trait]
impl CommentStore for FileCommentStore {
    async fn append(&self, author: &str, body: &str) -> Result<Comment, ApiError> {
        let mut writer = self.writer.lock().await;
        writer.discard_uncommitted().await?;
        let comment = self.log.draft(author, body)?;

        let mut line = serde_json::to_string(&comment)?;
        line.push('\n');

        writer.dirty = true;
        if let Err(err) = writer.file.append_line(line.as_bytes()).await {
            // Roll the file back so a partial line can't precede the next record.
            if let Err(rollback) = writer.discard_uncommitted().await {
                tracing::error!(?rollback, "journal rollback failed");
            }
            return Err(err.into());
        }

        writer.committed_len += line.len() as u64;
        writer.dirty = false;
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
