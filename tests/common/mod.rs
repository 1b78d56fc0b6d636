//! Common test utilities
//!
//! Mock transcoder and chat transport for driving the kruzhok pipeline
//! without ffmpeg or Telegram.

#![allow(dead_code)]

pub mod mock_transcoder;
pub mod mock_transport;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use kruzhok::kruzhok::{
    HistoryStore, KruzhokService, MediaKind, RemoteMedia, SessionManager, SqliteHistoryStore, TempMedia, UserProfile,
};
use kruzhok::storage::create_memory_pool;
use tempfile::TempDir;

pub use mock_transcoder::{MockTranscoder, TranscoderBehavior};
pub use mock_transport::{MockTransport, SentEvent};

/// Everything needed to run the pipeline in a temp directory
pub struct Harness {
    pub dir: TempDir,
    pub transcoder: Arc<MockTranscoder>,
    pub transport: MockTransport,
    pub sessions: Arc<SessionManager>,
    pub history: Arc<SqliteHistoryStore>,
    pub service: KruzhokService,
}

impl Harness {
    pub fn new(behavior: TranscoderBehavior) -> Self {
        Self::with_ttl(behavior, Duration::from_secs(60))
    }

    pub fn with_ttl(behavior: TranscoderBehavior, ttl: Duration) -> Self {
        let dir = TempDir::new().unwrap();
        let transcoder = Arc::new(MockTranscoder::new(behavior));
        let transport = MockTransport::new(dir.path());
        let sessions = Arc::new(SessionManager::new(transcoder.clone(), dir.path(), ttl));
        let history = Arc::new(SqliteHistoryStore::new(Arc::new(create_memory_pool().unwrap())));
        let service = KruzhokService::new(sessions.clone(), transcoder.clone(), history.clone() as Arc<dyn HistoryStore>);
        Self {
            dir,
            transcoder,
            transport,
            sessions,
            history,
            service,
        }
    }

    /// Writes a fake source file owned by the returned handle
    pub fn source(&self, name: &str) -> TempMedia {
        write_source(self.dir.path(), name)
    }

    /// Files currently left in the temp directory
    pub fn leftover_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

pub fn write_source(dir: &Path, name: &str) -> TempMedia {
    let path = dir.join(name);
    std::fs::write(&path, b"source media").unwrap();
    TempMedia::adopt(path)
}

pub fn user(id: i64) -> UserProfile {
    UserProfile {
        id,
        username: Some(format!("user{}", id)),
        first_name: Some("Test".to_string()),
    }
}

pub fn video(duration: Option<f64>) -> RemoteMedia {
    RemoteMedia {
        file_id: "video-file".to_string(),
        kind: MediaKind::Video,
        duration_hint: duration,
        file_size: Some(1_000_000),
    }
}

pub fn photo() -> RemoteMedia {
    RemoteMedia {
        file_id: "photo-file".to_string(),
        kind: MediaKind::Photo,
        duration_hint: None,
        file_size: Some(50_000),
    }
}
