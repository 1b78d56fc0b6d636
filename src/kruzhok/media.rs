//! Media kinds accepted by the bot and the clip duration policy

use strum::{AsRefStr, Display, EnumString};

use crate::core::config::kruzhok::{FALLBACK_DURATION_SECS, MAX_VIDEO_DURATION_SECS, PHOTO_DURATION_SECS};

/// Kind of media a kruzhok is made from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum MediaKind {
    Video,
    Photo,
}

impl MediaKind {
    /// Effective clip length in seconds.
    ///
    /// Photos always give a 5 second clip. Videos use the reported duration
    /// capped at 60 seconds; a missing, non-positive or non-finite duration is
    /// replaced by the 10 second fallback so a failed probe never blocks
    /// processing.
    pub fn clip_duration(self, source_duration: Option<f64>) -> f64 {
        match self {
            MediaKind::Photo => PHOTO_DURATION_SECS,
            MediaKind::Video => source_duration
                .filter(|d| d.is_finite() && *d > 0.0)
                .unwrap_or(FALLBACK_DURATION_SECS)
                .min(MAX_VIDEO_DURATION_SECS),
        }
    }

    /// Extension used for the downloaded source file
    pub fn source_extension(self) -> &'static str {
        match self {
            MediaKind::Video => "mp4",
            MediaKind::Photo => "jpg",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            MediaKind::Video => "🎬",
            MediaKind::Photo => "📷",
        }
    }
}
