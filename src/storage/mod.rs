//! SQLite storage: connection pool, migrations and queries

pub mod db;
pub mod migrations;

// Re-exports for convenience
pub use db::{create_memory_pool, create_pool, get_connection, DbConnection, DbPool, HistoryEntry, NewHistoryEntry};
