//! 永続ストア実装

pub mod sqlite;

pub use sqlite::{DEFAULT_SESSION_TTL, SqliteStore};
