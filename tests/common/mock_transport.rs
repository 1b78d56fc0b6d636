//! In-memory chat transport that records what the bot would send

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use kruzhok::kruzhok::{
    ChatTransport, Choice, DeliveredClip, PromptHandle, RemoteMedia, TempMedia, TransportError, UserId,
};

/// One outbound call
#[derive(Debug, Clone, PartialEq)]
pub enum SentEvent {
    Prompt { user: UserId, text: String, buttons: usize },
    Edit { message_id: i32, text: String },
    Text { user: UserId, text: String },
    Clip { user: UserId, duration_secs: u32, size_px: u32, existed: bool },
    Delete { message_id: i32 },
}

pub struct MockTransport {
    dir: PathBuf,
    events: Mutex<Vec<SentEvent>>,
    next_message_id: AtomicI32,
    fail_download: AtomicBool,
    fail_prompt: AtomicBool,
    fail_delivery: AtomicBool,
    delivered_paths: Mutex<Vec<PathBuf>>,
}

impl MockTransport {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            events: Mutex::new(Vec::new()),
            next_message_id: AtomicI32::new(100),
            fail_download: AtomicBool::new(false),
            fail_prompt: AtomicBool::new(false),
            fail_delivery: AtomicBool::new(false),
            delivered_paths: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_download(&self, fail: bool) {
        self.fail_download.store(fail, Ordering::SeqCst);
    }

    pub fn fail_prompt(&self, fail: bool) {
        self.fail_prompt.store(fail, Ordering::SeqCst);
    }

    pub fn fail_delivery(&self, fail: bool) {
        self.fail_delivery.store(fail, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<SentEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn delivered_paths(&self) -> Vec<PathBuf> {
        self.delivered_paths.lock().unwrap().clone()
    }

    fn push(&self, event: SentEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn download_media(&self, media: &RemoteMedia) -> Result<TempMedia, TransportError> {
        if self.fail_download.load(Ordering::SeqCst) {
            return Err(TransportError::new("file is too big"));
        }
        let target = TempMedia::reserve(&self.dir, "source", media.kind.source_extension());
        tokio::fs::write(target.path(), media.file_id.as_bytes())
            .await
            .map_err(|e| TransportError::new(e.to_string()))?;
        Ok(target)
    }

    async fn send_prompt(&self, user: UserId, text: &str, choices: &[Vec<Choice>]) -> Result<PromptHandle, TransportError> {
        if self.fail_prompt.load(Ordering::SeqCst) {
            return Err(TransportError::new("Forbidden: bot was blocked by the user"));
        }
        let message_id = self.next_message_id.fetch_add(1, Ordering::SeqCst);
        self.push(SentEvent::Prompt {
            user,
            text: text.to_string(),
            buttons: choices.iter().map(Vec::len).sum(),
        });
        Ok(PromptHandle {
            chat_id: user,
            message_id,
        })
    }

    async fn edit_or_replace(&self, prompt: &PromptHandle, text: &str) -> Result<(), TransportError> {
        self.push(SentEvent::Edit {
            message_id: prompt.message_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_text(&self, user: UserId, text: &str) -> Result<(), TransportError> {
        self.push(SentEvent::Text {
            user,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn deliver_clip(
        &self,
        user: UserId,
        clip: &Path,
        duration_secs: u32,
        size_px: u32,
    ) -> Result<DeliveredClip, TransportError> {
        self.delivered_paths.lock().unwrap().push(clip.to_path_buf());
        self.push(SentEvent::Clip {
            user,
            duration_secs,
            size_px,
            existed: clip.exists(),
        });
        if self.fail_delivery.load(Ordering::SeqCst) {
            return Err(TransportError::new("Bad Request: VIDEO_NOTE_INVALID"));
        }
        Ok(DeliveredClip {
            file_id: format!("note-{}", user),
            file_size: None,
        })
    }

    async fn delete_message(&self, prompt: &PromptHandle) -> Result<(), TransportError> {
        self.push(SentEvent::Delete {
            message_id: prompt.message_id,
        });
        Ok(())
    }
}
