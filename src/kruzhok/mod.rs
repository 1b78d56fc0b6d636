//! Kruzhok pipeline: per-user upload sessions, effects, transcoding and the
//! seams to the chat transport and the history store.
//!
//! Nothing in here depends on teloxide. The Telegram layer implements
//! [`transport::ChatTransport`] and drives [`flow::KruzhokService`].

pub mod effect;
pub mod error;
pub mod flow;
pub mod history;
pub mod media;
pub mod session;
pub mod temp;
pub mod transcoder;
pub mod transport;

/// Chat user identifier (Telegram user id)
pub type UserId = i64;

pub use effect::{Effect, EffectParams};
pub use error::{ProcessingError, TranscodeError, TransportError};
pub use flow::KruzhokService;
pub use history::{HistoryEntry, HistoryRecord, HistoryStore, SqliteHistoryStore};
pub use media::MediaKind;
pub use session::{PendingSession, ProcessedClip, SessionManager, SessionState};
pub use temp::TempMedia;
pub use transcoder::{FfmpegTranscoder, TranscodeJob, Transcoder};
pub use transport::{ChatTransport, Choice, DeliveredClip, PromptAction, PromptHandle, RemoteMedia, UserProfile};
