//! Persistence of produced kruzhoks

use std::sync::Arc;

use super::effect::Effect;
use super::media::MediaKind;
use super::UserId;
use crate::core::AppResult;
use crate::storage::db::{self, DbPool};

pub use crate::storage::db::HistoryEntry;

/// What gets recorded after a successful delivery
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    pub user_id: UserId,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub file_id: String,
    pub media_kind: MediaKind,
    pub effect: Effect,
    pub file_size: Option<u64>,
}

/// Append-only store of produced kruzhoks
pub trait HistoryStore: Send + Sync {
    fn record(&self, record: &HistoryRecord) -> AppResult<i64>;

    /// Latest entries of a user, newest first
    fn list_recent(&self, user_id: UserId, limit: usize) -> AppResult<Vec<HistoryEntry>>;

    fn count_all(&self, user_id: UserId) -> AppResult<i64>;
}

/// [`HistoryStore`] backed by the `user_history` table
pub struct SqliteHistoryStore {
    pool: Arc<DbPool>,
}

impl SqliteHistoryStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl HistoryStore for SqliteHistoryStore {
    fn record(&self, record: &HistoryRecord) -> AppResult<i64> {
        let conn = db::get_connection(&self.pool)?;
        let entry = db::NewHistoryEntry {
            user_id: record.user_id,
            username: record.username.as_deref(),
            first_name: record.first_name.as_deref(),
            file_id: &record.file_id,
            original_media_type: record.media_kind.as_ref(),
            effect_type: i64::from(record.effect.id()),
            effect_name: record.effect.label(),
            file_size: record.file_size.and_then(|s| i64::try_from(s).ok()),
        };
        Ok(db::save_history_entry(&conn, &entry)?)
    }

    fn list_recent(&self, user_id: UserId, limit: usize) -> AppResult<Vec<HistoryEntry>> {
        let conn = db::get_connection(&self.pool)?;
        Ok(db::get_user_history(&conn, user_id, limit)?)
    }

    fn count_all(&self, user_id: UserId) -> AppResult<i64> {
        let conn = db::get_connection(&self.pool)?;
        Ok(db::count_user_history(&conn, user_id)?)
    }
}
