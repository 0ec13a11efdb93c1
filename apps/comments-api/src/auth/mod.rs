pub mod sessions;
pub mod tokens;
