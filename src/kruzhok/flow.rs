//! Upload → effect choice → delivery, independent of the chat platform

use std::sync::Arc;

use strum::IntoEnumIterator;

use super::effect::Effect;
use super::error::ProcessingError;
use super::history::{HistoryEntry, HistoryRecord, HistoryStore};
use super::media::MediaKind;
use super::session::{SessionManager, SessionState};
use super::transcoder::Transcoder;
use super::transport::{ChatTransport, Choice, PromptHandle, RemoteMedia, UserProfile};
use super::UserId;
use crate::core::config::kruzhok::VIDEO_NOTE_SIZE;
use crate::core::AppResult;
use crate::messages;

/// Drives a user's kruzhok from upload to delivered video note
pub struct KruzhokService {
    sessions: Arc<SessionManager>,
    transcoder: Arc<dyn Transcoder>,
    history: Arc<dyn HistoryStore>,
}

impl KruzhokService {
    pub fn new(sessions: Arc<SessionManager>, transcoder: Arc<dyn Transcoder>, history: Arc<dyn HistoryStore>) -> Self {
        Self {
            sessions,
            transcoder,
            history,
        }
    }

    /// Downloads an uploaded photo or video, stores it as the user's pending
    /// session and asks for an effect.
    pub async fn handle_upload(
        &self,
        transport: &dyn ChatTransport,
        user: &UserProfile,
        media: &RemoteMedia,
    ) -> Result<PromptHandle, ProcessingError> {
        let source = transport
            .download_media(media)
            .await
            .map_err(|e| ProcessingError::DownloadFailure(e.to_string()))?;

        let duration_hint = match media.kind {
            MediaKind::Photo => None,
            MediaKind::Video => match media.duration_hint.filter(|d| d.is_finite() && *d > 0.0) {
                Some(duration) => Some(duration),
                None => self.transcoder.probe_duration(source.path()).await,
            },
        };

        let upload_id = self.sessions.begin_session(user.id, source, media.kind, duration_hint).await;

        match transport.send_prompt(user.id, messages::CHOOSE_EFFECT, &effect_choices()).await {
            Ok(prompt) => Ok(prompt),
            Err(e) => {
                // A newer upload may own the slot by now
                self.sessions.discard_upload(user.id, upload_id).await;
                Err(e.into())
            }
        }
    }

    /// Applies the chosen effect to the pending upload and delivers the result.
    ///
    /// The prompt is switched to the processing notice first and removed after
    /// delivery. History is recorded only for delivered clips.
    pub async fn handle_effect(
        &self,
        transport: &dyn ChatTransport,
        user: &UserProfile,
        prompt: Option<&PromptHandle>,
        effect_id: u8,
    ) -> Result<(), ProcessingError> {
        if self.sessions.current_state(user.id).await != SessionState::AwaitingEffect {
            return Err(ProcessingError::NoActiveSession);
        }

        if let Some(prompt) = prompt {
            if let Err(e) = transport.edit_or_replace(prompt, messages::PROCESSING).await {
                log::warn!("Failed to show processing notice to user {}: {}", user.id, e);
            }
        }

        let clip = self.sessions.resolve_effect(user.id, effect_id).await?;
        let clip_size = clip.byte_size().await;
        let (effect, media_kind) = (clip.effect, clip.media_kind);

        let delivered = transport
            .deliver_clip(user.id, clip.path(), clip.delivery_duration(), VIDEO_NOTE_SIZE)
            .await;
        clip.finish().await;
        let delivered = delivered.map_err(|e| ProcessingError::DeliveryFailure(e.to_string()))?;

        log::info!("Delivered {} kruzhok ({}) to user {}", media_kind, effect, user.id);

        if let Some(prompt) = prompt {
            if let Err(e) = transport.delete_message(prompt).await {
                log::warn!("Failed to delete prompt for user {}: {}", user.id, e);
            }
        }

        let record = HistoryRecord {
            user_id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            file_id: delivered.file_id,
            media_kind,
            effect,
            file_size: delivered.file_size.or(clip_size),
        };
        if let Err(e) = self.history.record(&record) {
            log::error!("Failed to save history for user {}: {}", user.id, e);
        }
        Ok(())
    }

    /// Drops the pending upload, if any, and tells the user
    pub async fn handle_cancel(
        &self,
        transport: &dyn ChatTransport,
        user: &UserProfile,
        prompt: Option<&PromptHandle>,
    ) -> Result<(), ProcessingError> {
        let text = if self.sessions.discard_session(user.id).await {
            messages::CANCELLED
        } else {
            messages::NOTHING_TO_CANCEL
        };
        match prompt {
            Some(prompt) => transport.edit_or_replace(prompt, text).await?,
            None => transport.send_text(user.id, text).await?,
        }
        Ok(())
    }

    /// Logs a failed operation and shows the user the matching message
    pub async fn report_failure(
        &self,
        transport: &dyn ChatTransport,
        user: &UserProfile,
        prompt: Option<&PromptHandle>,
        error: &ProcessingError,
    ) {
        let text = match error {
            ProcessingError::NoActiveSession => {
                log::info!("User {} chose an effect without a pending upload", user.id);
                messages::NO_ACTIVE_SESSION
            }
            other => {
                log::error!("Kruzhok for user {} failed: {}", user.id, other);
                messages::ERROR
            }
        };

        let sent = match prompt {
            Some(prompt) => transport.edit_or_replace(prompt, text).await,
            None => transport.send_text(user.id, text).await,
        };
        if let Err(e) = sent {
            log::warn!("Failed to report error to user {}: {}", user.id, e);
        }
    }

    /// Total count and the latest entries, newest first
    pub fn history_overview(&self, user_id: UserId, limit: usize) -> AppResult<(i64, Vec<HistoryEntry>)> {
        let total = self.history.count_all(user_id)?;
        let entries = self.history.list_recent(user_id, limit)?;
        Ok((total, entries))
    }
}

/// Effect buttons, two per row, with a cancel row at the bottom
pub fn effect_choices() -> Vec<Vec<Choice>> {
    let effects: Vec<Choice> = Effect::iter().map(Choice::effect).collect();
    let mut rows: Vec<Vec<Choice>> = effects.chunks(2).map(<[Choice]>::to_vec).collect();
    rows.push(vec![Choice::cancel(messages::CANCEL_BUTTON)]);
    rows
}
