//! Per-user pending media sessions.
//!
//! A user uploads a photo or video, the bot offers effects, and the next effect
//! choice consumes the upload. Each user has at most one slot:
//!
//! ```text
//! Idle --upload--> AwaitingEffect --choice--> Processing --done--> Idle
//!                   |   ^    |
//!                   |   +----+ newer upload replaces the pending one
//!                   +--cancel/expiry--> Idle
//! ```
//!
//! The slot map lock is never held across I/O. A `Processing` slot carries a
//! ticket, and only the run that owns the ticket may clear it, so a transcode
//! finishing late never removes a newer upload.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};

use super::effect::Effect;
use super::error::ProcessingError;
use super::media::MediaKind;
use super::temp::TempMedia;
use super::transcoder::{TranscodeJob, Transcoder};
use super::UserId;

/// An upload waiting for an effect choice
#[derive(Debug)]
pub struct PendingSession {
    /// Identifies this upload among the user's successive uploads
    pub upload_id: u64,
    pub user_id: UserId,
    pub source: TempMedia,
    pub media_kind: MediaKind,
    /// Clip length after the duration policy
    pub requested_duration_secs: f64,
    pub created_at: DateTime<Utc>,
    started: Instant,
}

impl PendingSession {
    pub fn new(
        upload_id: u64,
        user_id: UserId,
        source: TempMedia,
        media_kind: MediaKind,
        duration_hint: Option<f64>,
    ) -> Self {
        Self {
            upload_id,
            user_id,
            source,
            media_kind,
            requested_duration_secs: media_kind.clip_duration(duration_hint),
            created_at: Utc::now(),
            started: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.started.elapsed() >= ttl
    }
}

/// Observable state of a user's slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingEffect,
    Processing,
}

/// Transcoder output ready for delivery.
///
/// Call [`ProcessedClip::finish`] once delivery is over; dropping the clip
/// removes the file as well.
#[derive(Debug)]
pub struct ProcessedClip {
    output: TempMedia,
    pub duration_secs: f64,
    pub effect: Effect,
    pub media_kind: MediaKind,
}

impl ProcessedClip {
    pub fn path(&self) -> &Path {
        self.output.path()
    }

    /// Whole seconds as reported to the chat platform
    pub fn delivery_duration(&self) -> u32 {
        self.duration_secs.ceil().max(1.0) as u32
    }

    pub async fn byte_size(&self) -> Option<u64> {
        self.output.size().await.ok()
    }

    /// Removes the output file
    pub async fn finish(self) {
        let path = self.output.path().to_path_buf();
        if let Err(e) = self.output.remove().await {
            log::warn!("Failed to remove clip {}: {}", path.display(), e);
        }
    }
}

enum Slot {
    Awaiting(PendingSession),
    Processing { ticket: u64 },
}

enum Taken {
    Ready(PendingSession),
    Expired(PendingSession),
    Missing,
}

/// Owns every pending upload and turns effect choices into clips
pub struct SessionManager {
    slots: Mutex<HashMap<UserId, Slot>>,
    transcoder: Arc<dyn Transcoder>,
    work_dir: PathBuf,
    ttl: Duration,
    next_ticket: AtomicU64,
}

impl SessionManager {
    /// `work_dir` receives transcoder output; `ttl` bounds how long an upload waits
    pub fn new(transcoder: Arc<dyn Transcoder>, work_dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            transcoder,
            work_dir: work_dir.into(),
            ttl,
            next_ticket: AtomicU64::new(1),
        }
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<UserId, Slot>> {
        match self.slots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Session map lock was poisoned, recovering...");
                poisoned.into_inner()
            }
        }
    }

    /// Stores a new upload for `user_id` and returns its upload id.
    ///
    /// A pending upload of the same user is superseded and its file deleted.
    /// An upload arriving while a clip is being processed becomes pending once
    /// that run finishes, without disturbing it.
    pub async fn begin_session(
        &self,
        user_id: UserId,
        source: TempMedia,
        media_kind: MediaKind,
        duration_hint: Option<f64>,
    ) -> u64 {
        let upload_id = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let session = PendingSession::new(upload_id, user_id, source, media_kind, duration_hint);
        log::info!(
            "User {} uploaded {} ({:.1}s clip), waiting for effect",
            user_id,
            media_kind,
            session.requested_duration_secs
        );

        let previous = self.slots().insert(user_id, Slot::Awaiting(session));
        if let Some(Slot::Awaiting(old)) = previous {
            release(old, "superseded").await;
        }
        upload_id
    }

    /// Consumes the user's pending upload and transcodes it with the chosen effect.
    ///
    /// Unknown effect ids fall back to [`Effect::Plain`]. The source file is
    /// deleted whatever the outcome; the output file is deleted on failure and
    /// otherwise handed to the caller inside the [`ProcessedClip`].
    pub async fn resolve_effect(&self, user_id: UserId, effect_id: u8) -> Result<ProcessedClip, ProcessingError> {
        let effect = Effect::from_id(effect_id);
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);

        let taken = {
            let mut slots = self.slots();
            match slots.remove(&user_id) {
                Some(Slot::Awaiting(session)) if session.is_expired(self.ttl) => Taken::Expired(session),
                Some(Slot::Awaiting(session)) => {
                    slots.insert(user_id, Slot::Processing { ticket });
                    Taken::Ready(session)
                }
                Some(processing) => {
                    slots.insert(user_id, processing);
                    Taken::Missing
                }
                None => Taken::Missing,
            }
        };

        let session = match taken {
            Taken::Ready(session) => session,
            Taken::Expired(session) => {
                release(session, "expired").await;
                return Err(ProcessingError::NoActiveSession);
            }
            Taken::Missing => return Err(ProcessingError::NoActiveSession),
        };

        // Clears the Processing slot even if this future is dropped mid-transcode
        let _processing = ProcessingGuard {
            manager: self,
            user_id,
            ticket,
        };

        let PendingSession {
            source,
            media_kind,
            requested_duration_secs,
            ..
        } = session;

        let output = TempMedia::reserve(&self.work_dir, "kruzhok", "mp4");
        let job = TranscodeJob {
            input: source.path().to_path_buf(),
            output: output.path().to_path_buf(),
            media_kind,
            duration_secs: requested_duration_secs,
            effect,
        };

        let started = Instant::now();
        let result = self.transcoder.transcode(&job).await;

        let source_path = source.path().to_path_buf();
        if let Err(e) = source.remove().await {
            log::warn!("Failed to remove source {}: {}", source_path.display(), e);
        }

        match result {
            Ok(()) => {
                log::info!(
                    "User {}: {} {} done in {:.1}s",
                    user_id,
                    media_kind,
                    effect,
                    started.elapsed().as_secs_f64()
                );
                Ok(ProcessedClip {
                    output,
                    duration_secs: requested_duration_secs,
                    effect,
                    media_kind,
                })
            }
            Err(e) => {
                log::error!("User {}: transcoding {} with {} failed: {}", user_id, media_kind, effect, e);
                let output_path = output.path().to_path_buf();
                if let Err(err) = output.remove().await {
                    log::warn!("Failed to remove output {}: {}", output_path.display(), err);
                }
                Err(ProcessingError::TranscodeFailure(e))
            }
        }
    }

    /// Drops the user's pending upload. Returns `false` if there was none.
    ///
    /// A clip that is already processing is left alone.
    pub async fn discard_session(&self, user_id: UserId) -> bool {
        match self.take_pending(user_id, |_| true) {
            Some(session) => {
                release(session, "discarded").await;
                true
            }
            None => false,
        }
    }

    /// Drops the user's pending upload only if it is still `upload_id`
    pub async fn discard_upload(&self, user_id: UserId, upload_id: u64) -> bool {
        match self.take_pending(user_id, |session| session.upload_id == upload_id) {
            Some(session) => {
                release(session, "discarded").await;
                true
            }
            None => false,
        }
    }

    /// Snapshot of the slot; an expired upload reads as `Idle`
    pub fn state(&self, user_id: UserId) -> SessionState {
        match self.slots().get(&user_id) {
            Some(Slot::Awaiting(session)) if !session.is_expired(self.ttl) => SessionState::AwaitingEffect,
            Some(Slot::Processing { .. }) => SessionState::Processing,
            _ => SessionState::Idle,
        }
    }

    /// Like [`SessionManager::state`], but an expired upload is removed and its
    /// file deleted on the way
    pub async fn current_state(&self, user_id: UserId) -> SessionState {
        if let Some(session) = self.take_pending(user_id, |session| session.is_expired(self.ttl)) {
            release(session, "expired").await;
        }
        self.state(user_id)
    }

    /// Number of uploads waiting for an effect choice
    pub fn pending_count(&self) -> usize {
        self.slots().values().filter(|slot| matches!(slot, Slot::Awaiting(_))).count()
    }

    /// Removes expired uploads and deletes their files. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let expired: Vec<PendingSession> = {
            let mut slots = self.slots();
            let users: Vec<UserId> = slots
                .iter()
                .filter(|(_, slot)| matches!(slot, Slot::Awaiting(s) if s.is_expired(self.ttl)))
                .map(|(user_id, _)| *user_id)
                .collect();
            users
                .into_iter()
                .filter_map(|user_id| match slots.remove(&user_id) {
                    Some(Slot::Awaiting(session)) => Some(session),
                    _ => None,
                })
                .collect()
        };

        let count = expired.len();
        for session in expired {
            release(session, "expired").await;
        }
        count
    }

    /// Periodically purges expired uploads
    pub fn spawn_cleanup_task(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let purged = self.purge_expired().await;
                if purged > 0 {
                    log::info!("Purged {} expired upload(s), {} pending", purged, self.pending_count());
                }
            }
        })
    }

    fn take_pending(&self, user_id: UserId, matches: impl Fn(&PendingSession) -> bool) -> Option<PendingSession> {
        let mut slots = self.slots();
        match slots.remove(&user_id) {
            Some(Slot::Awaiting(session)) if matches(&session) => Some(session),
            Some(other) => {
                slots.insert(user_id, other);
                None
            }
            None => None,
        }
    }

    fn finish_processing(&self, user_id: UserId, ticket: u64) {
        let mut slots = self.slots();
        if matches!(slots.get(&user_id), Some(Slot::Processing { ticket: t }) if *t == ticket) {
            slots.remove(&user_id);
        }
    }
}

struct ProcessingGuard<'a> {
    manager: &'a SessionManager,
    user_id: UserId,
    ticket: u64,
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.manager.finish_processing(self.user_id, self.ticket);
    }
}

async fn release(session: PendingSession, reason: &str) {
    log::info!("Dropping {} upload of user {}: {}", session.media_kind, session.user_id, reason);
    let path = session.source.path().to_path_buf();
    if let Err(e) = session.source.remove().await {
        log::warn!("Failed to remove source {}: {}", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kruzhok::error::TranscodeError;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct CopyTranscoder;

    #[async_trait]
    impl Transcoder for CopyTranscoder {
        async fn transcode(&self, job: &TranscodeJob) -> Result<(), TranscodeError> {
            tokio::fs::copy(&job.input, &job.output).await?;
            Ok(())
        }
    }

    fn manager(dir: &TempDir, ttl: Duration) -> SessionManager {
        SessionManager::new(Arc::new(CopyTranscoder), dir.path(), ttl)
    }

    fn source(dir: &TempDir, name: &str) -> TempMedia {
        let path = dir.path().join(name);
        std::fs::write(&path, b"media").unwrap();
        TempMedia::adopt(path)
    }

    #[tokio::test]
    async fn test_resolve_without_upload() {
        let dir = TempDir::new().unwrap();
        let sessions = manager(&dir, Duration::from_secs(60));
        let result = sessions.resolve_effect(1, 1).await;
        assert!(matches!(result, Err(ProcessingError::NoActiveSession)));
        assert_eq!(sessions.state(1), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_upload_then_resolve() {
        let dir = TempDir::new().unwrap();
        let sessions = manager(&dir, Duration::from_secs(60));
        let src = source(&dir, "a.mp4");
        let src_path = src.path().to_path_buf();

        sessions.begin_session(1, src, MediaKind::Video, Some(90.0)).await;
        assert_eq!(sessions.state(1), SessionState::AwaitingEffect);
        assert_eq!(sessions.pending_count(), 1);

        let clip = sessions.resolve_effect(1, 3).await.unwrap();
        assert_eq!(clip.duration_secs, 60.0);
        assert_eq!(clip.effect, Effect::Blur);
        assert!(clip.path().exists());
        assert!(!src_path.exists());
        assert_eq!(sessions.state(1), SessionState::Idle);

        let out = clip.path().to_path_buf();
        clip.finish().await;
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_new_upload_supersedes_pending() {
        let dir = TempDir::new().unwrap();
        let sessions = manager(&dir, Duration::from_secs(60));
        let first = source(&dir, "first.mp4");
        let first_path = first.path().to_path_buf();

        sessions.begin_session(1, first, MediaKind::Video, Some(10.0)).await;
        sessions.begin_session(1, source(&dir, "second.jpg"), MediaKind::Photo, None).await;

        assert!(!first_path.exists());
        assert_eq!(sessions.pending_count(), 1);
        let clip = sessions.resolve_effect(1, 1).await.unwrap();
        assert_eq!(clip.media_kind, MediaKind::Photo);
        assert_eq!(clip.duration_secs, 5.0);
    }

    #[tokio::test]
    async fn test_unknown_effect_falls_back_to_plain() {
        let dir = TempDir::new().unwrap();
        let sessions = manager(&dir, Duration::from_secs(60));
        sessions.begin_session(1, source(&dir, "a.mp4"), MediaKind::Video, Some(3.0)).await;
        let clip = sessions.resolve_effect(1, 99).await.unwrap();
        assert_eq!(clip.effect, Effect::Plain);
        assert_eq!(clip.delivery_duration(), 3);
    }

    #[tokio::test]
    async fn test_discard_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let sessions = manager(&dir, Duration::from_secs(60));
        let src = source(&dir, "a.mp4");
        let src_path = src.path().to_path_buf();
        sessions.begin_session(1, src, MediaKind::Video, None).await;

        assert!(sessions.discard_session(1).await);
        assert!(!sessions.discard_session(1).await);
        assert!(!src_path.exists());
        assert_eq!(sessions.state(1), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_expired_upload_is_not_resolved() {
        let dir = TempDir::new().unwrap();
        let sessions = manager(&dir, Duration::from_millis(20));
        let src = source(&dir, "a.mp4");
        let src_path = src.path().to_path_buf();
        sessions.begin_session(1, src, MediaKind::Video, None).await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(sessions.state(1), SessionState::Idle);
        let result = sessions.resolve_effect(1, 1).await;
        assert!(matches!(result, Err(ProcessingError::NoActiveSession)));
        assert!(!src_path.exists());
    }

    #[tokio::test]
    async fn test_expired_upload_is_released_on_access() {
        let dir = TempDir::new().unwrap();
        let sessions = manager(&dir, Duration::from_millis(200));
        let src = source(&dir, "a.mp4");
        let src_path = src.path().to_path_buf();
        sessions.begin_session(1, src, MediaKind::Video, None).await;
        assert_eq!(sessions.current_state(1).await, SessionState::AwaitingEffect);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(sessions.current_state(1).await, SessionState::Idle);
        assert!(!src_path.exists());
        assert_eq!(sessions.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_discard_upload_keeps_newer_upload() {
        let dir = TempDir::new().unwrap();
        let sessions = manager(&dir, Duration::from_secs(60));
        let first = sessions.begin_session(1, source(&dir, "a.mp4"), MediaKind::Video, None).await;
        let second_src = source(&dir, "b.jpg");
        let second_path = second_src.path().to_path_buf();
        let second = sessions.begin_session(1, second_src, MediaKind::Photo, None).await;
        assert_ne!(first, second);

        assert!(!sessions.discard_upload(1, first).await);
        assert_eq!(sessions.state(1), SessionState::AwaitingEffect);
        assert!(second_path.exists());

        assert!(sessions.discard_upload(1, second).await);
        assert!(!second_path.exists());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let dir = TempDir::new().unwrap();
        let sessions = manager(&dir, Duration::from_millis(20));
        sessions.begin_session(1, source(&dir, "a.mp4"), MediaKind::Video, None).await;
        sessions.begin_session(2, source(&dir, "b.jpg"), MediaKind::Photo, None).await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(sessions.purge_expired().await, 2);
        assert_eq!(sessions.pending_count(), 0);
        assert_eq!(sessions.purge_expired().await, 0);
    }

    #[tokio::test]
    async fn test_users_are_independent() {
        let dir = TempDir::new().unwrap();
        let sessions = manager(&dir, Duration::from_secs(60));
        sessions.begin_session(1, source(&dir, "a.mp4"), MediaKind::Video, None).await;
        sessions.begin_session(2, source(&dir, "b.mp4"), MediaKind::Video, None).await;

        sessions.resolve_effect(1, 2).await.unwrap().finish().await;
        assert_eq!(sessions.state(2), SessionState::AwaitingEffect);
    }
}
