//! Photo and video uploads, and media the bot cannot use

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use super::types::{user_profile, HandlerDeps, HandlerError};
use crate::kruzhok::{MediaKind, RemoteMedia};
use crate::messages;
use crate::telegram::Bot;

/// Photo or video attached to a message. Photos use the largest size.
pub fn remote_media(msg: &Message) -> Option<RemoteMedia> {
    if let Some(video) = msg.video() {
        return Some(RemoteMedia {
            file_id: video.file.id.0.clone(),
            kind: MediaKind::Video,
            duration_hint: Some(f64::from(video.duration.seconds())),
            file_size: Some(u64::from(video.file.size)),
        });
    }

    let photo = msg.photo()?.iter().max_by_key(|p| u64::from(p.width) * u64::from(p.height))?;
    Some(RemoteMedia {
        file_id: photo.file.id.0.clone(),
        kind: MediaKind::Photo,
        duration_hint: None,
        file_size: Some(u64::from(photo.file.size)),
    })
}

/// Handler for photo and video uploads
pub(super) fn media_upload_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter_map(|msg: Message| remote_media(&msg))
        .endpoint(move |msg: Message, media: RemoteMedia| {
            let deps = deps.clone();
            async move {
                let Some(user) = msg.from.as_ref().and_then(user_profile) else {
                    return Ok(());
                };
                log::info!("📥 {} from user {} ({:?} bytes)", media.kind, user.id, media.file_size);

                if let Err(e) = deps.service.handle_upload(deps.transport.as_ref(), &user, &media).await {
                    deps.service
                        .report_failure(deps.transport.as_ref(), &user, None, &e)
                        .await;
                }
                Ok(())
            }
        })
}

/// Documents, audio, voice, stickers and other media get a short refusal
pub(super) fn unsupported_media_handler() -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| {
            msg.document().is_some()
                || msg.audio().is_some()
                || msg.voice().is_some()
                || msg.sticker().is_some()
                || msg.video_note().is_some()
                || msg.animation().is_some()
        })
        .endpoint(|bot: Bot, msg: Message| async move {
            bot.send_message(msg.chat.id, messages::UNSUPPORTED).await?;
            Ok(())
        })
}
