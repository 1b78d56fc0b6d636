use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Result;

use super::migrations::run_migrations;
use crate::core::{AppError, AppResult};

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Create a new database connection pool
///
/// Opens (or creates) the SQLite file, builds a pool of up to 10 connections
/// and brings the schema up to date.
///
/// # Example
///
/// ```no_run
/// use kruzhok::storage::db;
///
/// let pool = db::create_pool("kruzhok.sqlite")?;
/// # Ok::<(), kruzhok::core::AppError>(())
/// ```
pub fn create_pool(database_path: &str) -> AppResult<DbPool> {
    let manager = SqliteConnectionManager::file(database_path);
    let pool = Pool::builder()
        .max_size(10) // Maximum 10 connections in the pool
        .build(manager)?;
    migrate(&pool)?;
    Ok(pool)
}

/// Single-connection in-memory pool with the schema applied
///
/// Every in-memory connection is its own database, so the pool holds exactly one.
#[doc(hidden)]
pub fn create_memory_pool() -> AppResult<DbPool> {
    let pool = Pool::builder().max_size(1).build(SqliteConnectionManager::memory())?;
    migrate(&pool)?;
    Ok(pool)
}

fn migrate(pool: &DbPool) -> AppResult<()> {
    let mut conn = pool.get()?;
    run_migrations(&mut conn).map_err(|e| AppError::Migration(format!("{:#}", e)))
}

/// Get a connection from the pool
///
/// The connection is returned to the pool when dropped.
pub fn get_connection(pool: &DbPool) -> std::result::Result<DbConnection, r2d2::Error> {
    pool.get()
}

/// One produced kruzhok as stored in `user_history`
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub id: i64,
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    /// Telegram file id of the delivered video note
    pub file_id: String,
    /// "video" or "photo"
    pub original_media_type: String,
    pub effect_type: i64,
    pub effect_name: String,
    pub file_size: Option<i64>,
    pub created_at: String,
}

/// Row to insert into `user_history`
#[derive(Debug, Clone, Copy)]
pub struct NewHistoryEntry<'a> {
    pub user_id: i64,
    pub username: Option<&'a str>,
    pub first_name: Option<&'a str>,
    pub file_id: &'a str,
    pub original_media_type: &'a str,
    pub effect_type: i64,
    pub effect_name: &'a str,
    pub file_size: Option<i64>,
}

/// Saves a history entry and returns its id
pub fn save_history_entry(conn: &DbConnection, entry: &NewHistoryEntry<'_>) -> Result<i64> {
    conn.execute(
        "INSERT INTO user_history
            (user_id, username, first_name, file_id, original_media_type, effect_type, effect_name, file_size)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        &[
            &entry.user_id as &dyn rusqlite::ToSql,
            &entry.username as &dyn rusqlite::ToSql,
            &entry.first_name as &dyn rusqlite::ToSql,
            &entry.file_id as &dyn rusqlite::ToSql,
            &entry.original_media_type as &dyn rusqlite::ToSql,
            &entry.effect_type as &dyn rusqlite::ToSql,
            &entry.effect_name as &dyn rusqlite::ToSql,
            &entry.file_size as &dyn rusqlite::ToSql,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Latest `limit` entries of a user, newest first
pub fn get_user_history(conn: &DbConnection, user_id: i64, limit: usize) -> Result<Vec<HistoryEntry>> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let mut stmt = conn.prepare(
        "SELECT id, user_id, username, first_name, file_id, original_media_type,
                effect_type, effect_name, file_size, created_at
         FROM user_history
         WHERE user_id = ?1
         ORDER BY created_at DESC, id DESC
         LIMIT ?2",
    )?;
    let rows = stmt.query_map(
        &[&user_id as &dyn rusqlite::ToSql, &limit as &dyn rusqlite::ToSql],
        |row| {
            Ok(HistoryEntry {
                id: row.get(0)?,
                user_id: row.get(1)?,
                username: row.get(2)?,
                first_name: row.get(3)?,
                file_id: row.get(4)?,
                original_media_type: row.get(5)?,
                effect_type: row.get(6)?,
                effect_name: row.get(7)?,
                file_size: row.get(8)?,
                created_at: row.get(9)?,
            })
        },
    )?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(row?);
    }
    Ok(entries)
}

/// Total number of kruzhoks a user has made
pub fn count_user_history(conn: &DbConnection, user_id: i64) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM user_history WHERE user_id = ?",
        &[&user_id as &dyn rusqlite::ToSql],
        |row| row.get(0),
    )
}

/// Creates the user's language row, or refreshes the profile fields of an
/// existing one without touching the chosen language.
pub fn upsert_user_language(
    conn: &DbConnection,
    user_id: i64,
    username: Option<&str>,
    first_name: Option<&str>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO user_language (user_id, username, first_name)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(user_id) DO UPDATE SET
            username = excluded.username,
            first_name = excluded.first_name,
            updated_at = strftime('%Y-%m-%d %H:%M:%f', 'now')",
        &[
            &user_id as &dyn rusqlite::ToSql,
            &username as &dyn rusqlite::ToSql,
            &first_name as &dyn rusqlite::ToSql,
        ],
    )?;
    Ok(())
}
