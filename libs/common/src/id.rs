use ulid::Ulid;

/// Generates a new ULID-based ID with the given prefix.
///
/// # Examples
/// ```
/// let id = comments_common::id::prefixed_ulid("vwr");
/// assert!(id.starts_with("vwr_"));
/// ```
pub fn prefixed_ulid(prefix: &str) -> String {
    format!("{}_{}", prefix, Ulid::new())
}

/// Well-known ID prefixes.
pub mod prefix {
    pub const VIEWER: &str = "vwr";
    pub const SESSION: &str = "ses";
}
