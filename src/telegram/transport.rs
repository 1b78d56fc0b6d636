//! [`ChatTransport`] over the Telegram Bot API

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{FileId, InputFile, MessageId};
use tokio::io::AsyncWriteExt;
use url::Url;

use super::keyboard::inline_keyboard;
use super::Bot;
use crate::core::config;
use crate::kruzhok::{
    ChatTransport, Choice, DeliveredClip, PromptHandle, RemoteMedia, TempMedia, TransportError, UserId,
};

/// Telegram implementation of the pipeline's chat transport
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
    http: reqwest::Client,
    work_dir: PathBuf,
}

impl TelegramTransport {
    pub fn new(bot: Bot, work_dir: impl Into<PathBuf>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(config::network::timeout()).build()?;
        Ok(Self {
            bot,
            http,
            work_dir: work_dir.into(),
        })
    }

    /// Streams a Bot API file into `dest`
    async fn fetch(&self, file_path: &str, dest: &Path) -> Result<(), TransportError> {
        // A local Bot API server reports absolute paths on its own filesystem
        let local = Path::new(file_path);
        if local.is_absolute() && local.exists() {
            tokio::fs::copy(local, dest)
                .await
                .map_err(|e| TransportError::new(format!("copy {}: {}", file_path, e)))?;
            return Ok(());
        }

        let url = build_file_url(&self.bot.api_url(), self.bot.token(), file_path)?;
        let mut resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::new(format!("file request failed: {}", e)))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::new(format!("file download failed with status {}", status)));
        }

        let write_err = |e: std::io::Error| TransportError::new(format!("write {}: {}", dest.display(), e));
        let mut dst = tokio::fs::File::create(dest).await.map_err(write_err)?;
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| TransportError::new(format!("file download interrupted: {}", e)))?
        {
            dst.write_all(&chunk).await.map_err(write_err)?;
        }
        dst.flush().await.map_err(write_err)?;
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn download_media(&self, media: &RemoteMedia) -> Result<TempMedia, TransportError> {
        let file = self
            .bot
            .get_file(FileId(media.file_id.clone()))
            .await
            .map_err(|e| TransportError::new(format!("get_file: {}", e)))?;

        let target = TempMedia::reserve(&self.work_dir, "source", media.kind.source_extension());
        self.fetch(&file.path, target.path()).await?;
        log::info!(
            "Downloaded {} ({} bytes) to {}",
            media.kind,
            file.size,
            target.path().display()
        );
        Ok(target)
    }

    async fn send_prompt(&self, user: UserId, text: &str, choices: &[Vec<Choice>]) -> Result<PromptHandle, TransportError> {
        let msg = self
            .bot
            .send_message(ChatId(user), text)
            .reply_markup(inline_keyboard(choices))
            .await
            .map_err(|e| TransportError::new(format!("send_message: {}", e)))?;
        Ok(PromptHandle {
            chat_id: msg.chat.id.0,
            message_id: msg.id.0,
        })
    }

    async fn edit_or_replace(&self, prompt: &PromptHandle, text: &str) -> Result<(), TransportError> {
        let chat_id = ChatId(prompt.chat_id);
        match self
            .bot
            .edit_message_text(chat_id, MessageId(prompt.message_id), text)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                log::debug!("Editing message {} failed ({}), sending a new one", prompt.message_id, e);
                self.bot
                    .send_message(chat_id, text)
                    .await
                    .map(|_| ())
                    .map_err(|e| TransportError::new(format!("send_message: {}", e)))
            }
        }
    }

    async fn send_text(&self, user: UserId, text: &str) -> Result<(), TransportError> {
        self.bot
            .send_message(ChatId(user), text)
            .await
            .map(|_| ())
            .map_err(|e| TransportError::new(format!("send_message: {}", e)))
    }

    async fn deliver_clip(
        &self,
        user: UserId,
        clip: &Path,
        duration_secs: u32,
        size_px: u32,
    ) -> Result<DeliveredClip, TransportError> {
        let msg = self
            .bot
            .send_video_note(ChatId(user), InputFile::file(clip.to_path_buf()))
            .duration(duration_secs)
            .length(size_px)
            .await
            .map_err(|e| TransportError::new(format!("send_video_note: {}", e)))?;

        let note = msg
            .video_note()
            .ok_or_else(|| TransportError::new("sent message carries no video note"))?;
        Ok(DeliveredClip {
            file_id: note.file.id.0.clone(),
            file_size: Some(u64::from(note.file.size)),
        })
    }

    async fn delete_message(&self, prompt: &PromptHandle) -> Result<(), TransportError> {
        self.bot
            .delete_message(ChatId(prompt.chat_id), MessageId(prompt.message_id))
            .await
            .map(|_| ())
            .map_err(|e| TransportError::new(format!("delete_message: {}", e)))
    }
}

/// `<base>/file/bot<token>/<file_path>`
fn build_file_url(base: &Url, token: &str, file_path: &str) -> Result<Url, TransportError> {
    let mut url = base.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| TransportError::new("Bot API URL cannot be a base URL"))?;
        segments.pop_if_empty();
        segments.push("file");
        segments.push(&format!("bot{}", token));
        for seg in file_path.split('/').filter(|s| !s.is_empty()) {
            segments.push(seg);
        }
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_url_official_api() {
        let base = Url::parse("https://api.telegram.org").unwrap();
        let url = build_file_url(&base, "123:abc", "videos/file_7.mp4").unwrap();
        assert_eq!(url.as_str(), "https://api.telegram.org/file/bot123:abc/videos/file_7.mp4");
    }

    #[test]
    fn test_file_url_with_base_path() {
        let base = Url::parse("http://localhost:8081/").unwrap();
        let url = build_file_url(&base, "t", "photos/file_1.jpg").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8081/file/bott/photos/file_1.jpg");
    }

    #[test]
    fn test_file_url_rejects_cannot_be_base() {
        let base = Url::parse("mailto:bot@example.com").unwrap();
        assert!(build_file_url(&base, "t", "a.jpg").is_err());
    }
}
