//! Effect keyboard presses

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;

use super::types::{user_profile, HandlerDeps, HandlerError};
use crate::kruzhok::{PromptAction, PromptHandle};
use crate::telegram::Bot;

/// Answers callback queries no other branch handled, so the button spinner stops
pub(super) fn unmatched_callback_handler() -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(|bot: Bot, q: CallbackQuery| async move {
        log::debug!("Ignoring callback data {:?} from user {}", q.data, q.from.id);
        bot.answer_callback_query(q.id).await?;
        Ok(())
    })
}

/// Handler for `effect:*` callback queries
pub(super) fn effect_callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query()
        .filter_map(|q: CallbackQuery| q.data.as_deref().and_then(PromptAction::parse))
        .endpoint(move |bot: Bot, q: CallbackQuery, action: PromptAction| {
            let deps = deps.clone();
            async move {
                // Stops the button spinner; failing here must not block processing
                if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
                    log::warn!("Failed to answer callback query: {}", e);
                }

                let Some(user) = user_profile(&q.from) else {
                    return Ok(());
                };
                let prompt = q.message.as_ref().map(|m| PromptHandle {
                    chat_id: m.chat().id.0,
                    message_id: m.id().0,
                });
                let transport = deps.transport.as_ref();

                let result = match action {
                    PromptAction::Effect(effect_id) => {
                        log::info!("🎨 User {} chose effect {}", user.id, effect_id);
                        deps.service
                            .handle_effect(transport, &user, prompt.as_ref(), effect_id)
                            .await
                    }
                    PromptAction::Cancel => deps.service.handle_cancel(transport, &user, prompt.as_ref()).await,
                };

                if let Err(e) = result {
                    deps.service
                        .report_failure(transport, &user, prompt.as_ref(), &e)
                        .await;
                }
                Ok(())
            }
        })
}
