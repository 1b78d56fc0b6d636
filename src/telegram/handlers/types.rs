//! Handler types and dependencies

use std::sync::Arc;

use teloxide::types::User;

use crate::kruzhok::{KruzhokService, UserProfile};
use crate::storage::db::DbPool;
use crate::telegram::TelegramTransport;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub db_pool: Arc<DbPool>,
    pub service: Arc<KruzhokService>,
    pub transport: Arc<TelegramTransport>,
}

impl HandlerDeps {
    pub fn new(db_pool: Arc<DbPool>, service: Arc<KruzhokService>, transport: Arc<TelegramTransport>) -> Self {
        Self {
            db_pool,
            service,
            transport,
        }
    }
}

/// Pipeline view of a Telegram user. `None` for ids that do not fit in i64.
pub fn user_profile(user: &User) -> Option<UserProfile> {
    Some(UserProfile {
        id: i64::try_from(user.id.0).ok()?,
        username: user.username.clone(),
        first_name: Some(user.first_name.clone()).filter(|n| !n.is_empty()),
    })
}
