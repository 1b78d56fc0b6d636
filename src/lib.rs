//! Kruzhok - Telegram bot that turns photos and videos into round video notes
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging and process helpers
//! - `kruzhok`: sessions, effects, transcoding and the delivery flow
//! - `storage`: SQLite pool, migrations and queries
//! - `telegram`: bot setup, handlers and the Telegram transport
//! - `messages`: user-facing texts

pub mod cli;
pub mod core;
pub mod kruzhok;
pub mod messages;
pub mod storage;
pub mod telegram;

// Re-export commonly used types for convenience
pub use crate::core::{config, AppError, AppResult};
pub use kruzhok::{KruzhokService, SessionManager};
pub use storage::{create_pool, get_connection, DbConnection, DbPool};
