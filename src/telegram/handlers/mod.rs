//! Telegram bot handler tree configuration
//!
//! The same schema is used by the production dispatcher and by tests.

mod callbacks;
mod commands;
mod schema;
mod types;
mod uploads;

pub use schema::schema;
pub use types::{user_profile, HandlerDeps, HandlerError};
pub use uploads::remote_media;
