//! Chat transport seam.
//!
//! The pipeline talks to the chat platform only through [`ChatTransport`], so
//! it can be driven by Telegram in production and by an in-memory fake in
//! tests.

use std::path::Path;

use async_trait::async_trait;

use super::effect::Effect;
use super::error::TransportError;
use super::media::MediaKind;
use super::temp::TempMedia;
use super::UserId;

const EFFECT_PREFIX: &str = "effect:";
const CANCEL_SUFFIX: &str = "cancel";

/// Who sent an update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: UserId,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

/// Media attached to an incoming message, not downloaded yet
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteMedia {
    pub file_id: String,
    pub kind: MediaKind,
    /// Duration reported by the platform, videos only
    pub duration_hint: Option<f64>,
    pub file_size: Option<u64>,
}

/// A message the bot sent and may edit or delete later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PromptHandle {
    pub chat_id: i64,
    pub message_id: i32,
}

/// One inline button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    pub data: String,
}

/// A clip accepted by the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredClip {
    pub file_id: String,
    pub file_size: Option<u64>,
}

/// Button press on the effect prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptAction {
    /// Raw effect id, resolved later with fallback to Plain
    Effect(u8),
    Cancel,
}

impl PromptAction {
    pub fn encode(self) -> String {
        match self {
            PromptAction::Effect(id) => format!("{}{}", EFFECT_PREFIX, id),
            PromptAction::Cancel => format!("{}{}", EFFECT_PREFIX, CANCEL_SUFFIX),
        }
    }

    /// Parses callback data produced by [`PromptAction::encode`].
    ///
    /// Numeric ids outside `u8` map to 0, which resolves to the fallback effect.
    pub fn parse(data: &str) -> Option<Self> {
        let rest = data.strip_prefix(EFFECT_PREFIX)?;
        if rest == CANCEL_SUFFIX {
            return Some(PromptAction::Cancel);
        }
        let id = rest.parse::<u64>().ok()?;
        Some(PromptAction::Effect(u8::try_from(id).unwrap_or(0)))
    }
}

impl Choice {
    pub fn effect(effect: Effect) -> Self {
        Self {
            label: format!("{} {}", effect.emoji(), effect.label()),
            data: PromptAction::Effect(effect.id()).encode(),
        }
    }

    pub fn cancel(label: &str) -> Self {
        Self {
            label: label.to_string(),
            data: PromptAction::Cancel.encode(),
        }
    }
}

/// Outbound and download operations used by the pipeline
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Downloads the media into a temporary file owned by the caller
    async fn download_media(&self, media: &RemoteMedia) -> Result<TempMedia, TransportError>;

    /// Sends a message with inline buttons, one `Vec` per row
    async fn send_prompt(&self, user: UserId, text: &str, choices: &[Vec<Choice>]) -> Result<PromptHandle, TransportError>;

    /// Edits the prompt text, or sends a new message if editing is not possible
    async fn edit_or_replace(&self, prompt: &PromptHandle, text: &str) -> Result<(), TransportError>;

    async fn send_text(&self, user: UserId, text: &str) -> Result<(), TransportError>;

    /// Sends the clip as a round video note
    async fn deliver_clip(
        &self,
        user: UserId,
        clip: &Path,
        duration_secs: u32,
        size_px: u32,
    ) -> Result<DeliveredClip, TransportError>;

    async fn delete_message(&self, prompt: &PromptHandle) -> Result<(), TransportError>;
}
