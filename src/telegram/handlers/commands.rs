//! Command handlers: /start, /history, /hide, /lang, /cancel

use teloxide::prelude::*;
use teloxide::types::Message;

use super::types::{user_profile, HandlerDeps, HandlerError};
use crate::core::config::kruzhok::HISTORY_LIMIT;
use crate::messages;
use crate::storage::db;
use crate::storage::get_connection;
use crate::telegram::Bot;

/// Greets the user and makes sure their language row exists
pub(super) async fn handle_start_command(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let from = msg.from.as_ref();
    let first_name = from.map(|u| u.first_name.as_str());

    if let Some(user) = from.and_then(user_profile) {
        match get_connection(&deps.db_pool) {
            Ok(conn) => {
                if let Err(e) =
                    db::upsert_user_language(&conn, user.id, user.username.as_deref(), user.first_name.as_deref())
                {
                    log::error!("Failed to save user {}: {}", user.id, e);
                }
            }
            Err(e) => log::error!("Failed to get DB connection: {}", e),
        }
    }

    bot.send_message(msg.chat.id, messages::welcome(first_name)).await?;
    Ok(())
}

/// Shows how many kruzhoks the user made and the latest ones
pub(super) async fn handle_history_command(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let Some(user) = msg.from.as_ref().and_then(user_profile) else {
        return Ok(());
    };

    let text = match deps.service.history_overview(user.id, HISTORY_LIMIT) {
        Ok((total, entries)) => messages::history(total, &entries),
        Err(e) => {
            log::error!("Failed to load history for user {}: {}", user.id, e);
            messages::ERROR.to_string()
        }
    };
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

/// Drops the pending upload, if any
pub(super) async fn handle_cancel_command(msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let Some(user) = msg.from.as_ref().and_then(user_profile) else {
        return Ok(());
    };
    deps.service.handle_cancel(deps.transport.as_ref(), &user, None).await?;
    Ok(())
}
