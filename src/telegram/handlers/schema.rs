//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{HandlerExt, UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use super::callbacks::{effect_callback_handler, unmatched_callback_handler};
use super::commands::{handle_cancel_command, handle_history_command, handle_start_command};
use super::types::{HandlerDeps, HandlerError};
use super::uploads::{media_upload_handler, unsupported_media_handler};
use crate::messages;
use crate::telegram::bot::Command;
use crate::telegram::Bot;

/// Creates the main dispatcher schema for the Telegram bot.
///
/// Branch order matters: commands first, then uploads, then the greeting for
/// any other text, then keyboard presses. Presses nobody understands are
/// still answered.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    dptree::entry()
        .branch(command_handler(deps.clone()))
        .branch(media_upload_handler(deps.clone()))
        .branch(unsupported_media_handler())
        .branch(text_handler())
        .branch(effect_callback_handler(deps))
        .branch(unmatched_callback_handler())
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                log::info!("🎯 Received command: {:?} from chat {}", cmd, msg.chat.id);

                match cmd {
                    Command::Start => handle_start_command(&bot, &msg, &deps).await?,
                    Command::History => handle_history_command(&bot, &msg, &deps).await?,
                    Command::Hide => {
                        bot.send_message(msg.chat.id, messages::HIDE_INFO).await?;
                    }
                    Command::Lang => {
                        bot.send_message(msg.chat.id, messages::LANG_SELECTION).await?;
                    }
                    Command::Cancel => handle_cancel_command(&msg, &deps).await?,
                }
                Ok(())
            }
        },
    ))
}

/// Any other text gets the greeting; a pending upload stays untouched
fn text_handler() -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().is_some())
        .endpoint(|bot: Bot, msg: Message| async move {
            let first_name = msg.from.as_ref().map(|u| u.first_name.as_str());
            bot.send_message(msg.chat.id, messages::welcome(first_name)).await?;
            Ok(())
        })
}
