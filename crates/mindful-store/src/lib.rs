//! Mindful Store: SQLite FTS5 + int8 vector index, user profiles.

pub mod embedding;
pub mod profiles;
pub mod schema;
pub mod sqlite;
pub mod types;

pub use profiles::UpsertOutcome;
pub use sqlite::SqliteStore;
pub use types::*;
