use std::path::PathBuf;

/// Default heartbeat interval announced to viewers (ms).
pub const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 41_250;
/// Largest accepted heartbeat interval (ms). Larger values are clamped.
pub const MAX_HEARTBEAT_INTERVAL_MS: u64 = 10 * 60 * 1000;

/// Comments API configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Journal file backing the comment log. `None` keeps comments in memory only.
    pub journal_path: Option<PathBuf>,
    /// Per-viewer queue capacity. A viewer whose queue is full misses events.
    pub viewer_buffer: usize,
    /// Maximum comment length in characters (after trimming).
    pub max_comment_len: usize,
    /// Heartbeat interval announced to viewers in READY (ms).
    pub heartbeat_interval_ms: u64,
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            port: parsed_var("PORT").unwrap_or(4000),
            journal_path: std::env::var("COMMENTS_JOURNAL")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            viewer_buffer: parsed_var("VIEWER_BUFFER")
                .filter(|n| *n > 0)
                .unwrap_or(256),
            max_comment_len: parsed_var("MAX_COMMENT_LEN").unwrap_or(4000),
            heartbeat_interval_ms: heartbeat_interval(parsed_var("HEARTBEAT_INTERVAL_MS")),
        }
    }
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Zero or unset falls back to the default; anything above the cap is clamped.
fn heartbeat_interval(raw: Option<u64>) -> u64 {
    raw.filter(|n| *n > 0)
        .map_or(DEFAULT_HEARTBEAT_INTERVAL_MS, |n| n.min(MAX_HEARTBEAT_INTERVAL_MS))
}
