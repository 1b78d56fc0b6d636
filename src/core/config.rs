use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Configuration constants for the bot
/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Custom Bot API server URL (local telegram-bot-api), if any
pub static BOT_API_URL: Lazy<Option<String>> = Lazy::new(|| env::var("BOT_API_URL").ok());

/// Database file path
/// Read from DATABASE_PATH environment variable
/// Default: kruzhok.sqlite
pub static DATABASE_PATH: Lazy<String> =
    Lazy::new(|| env::var("DATABASE_PATH").unwrap_or_else(|_| "kruzhok.sqlite".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: kruzhok.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "kruzhok.log".to_string()));

/// Temporary files directory for downloads and transcoder output
/// Read from TEMP_FILES_DIR environment variable, supports tilde (~) expansion
pub static TEMP_FILES_DIR: Lazy<String> =
    Lazy::new(|| env::var("TEMP_FILES_DIR").unwrap_or_else(|_| "/tmp".to_string()));

/// ffmpeg binary path
pub static FFMPEG_BIN: Lazy<String> = Lazy::new(|| env::var("FFMPEG_BIN").unwrap_or_else(|_| "ffmpeg".to_string()));

/// ffprobe binary path
pub static FFPROBE_BIN: Lazy<String> =
    Lazy::new(|| env::var("FFPROBE_BIN").unwrap_or_else(|_| "ffprobe".to_string()));

/// Maximum number of ffmpeg processes running at the same time
pub static MAX_CONCURRENT_TRANSCODES: Lazy<usize> = Lazy::new(|| {
    positive_or(env::var("MAX_CONCURRENT_TRANSCODES").ok(), transcode::DEFAULT_MAX_CONCURRENT)
});

/// Upper bound for a single ffmpeg invocation (seconds)
pub static TRANSCODE_TIMEOUT_SECS: Lazy<u64> =
    Lazy::new(|| positive_or(env::var("TRANSCODE_TIMEOUT_SECS").ok(), transcode::DEFAULT_TIMEOUT_SECS));

/// How long an upload may wait for an effect choice (seconds)
/// Zero would expire every upload at once, so it falls back to the default
pub static SESSION_TTL_SECS: Lazy<u64> =
    Lazy::new(|| positive_or(env::var("SESSION_TTL_SECS").ok(), session::DEFAULT_TTL_SECS));

/// Parses a strictly positive number, otherwise returns `default`
fn positive_or<T>(raw: Option<String>, default: T) -> T
where
    T: FromStr + PartialOrd + Default,
{
    raw.and_then(|v| v.trim().parse::<T>().ok())
        .filter(|v| *v > T::default())
        .unwrap_or(default)
}

/// Resolved temp directory (tilde expanded)
pub fn temp_dir() -> PathBuf {
    PathBuf::from(shellexpand::tilde(TEMP_FILES_DIR.as_str()).to_string())
}

/// Transcode timeout duration
pub fn transcode_timeout() -> Duration {
    Duration::from_secs(*TRANSCODE_TIMEOUT_SECS)
}

/// Session expiry duration
pub fn session_ttl() -> Duration {
    Duration::from_secs(*SESSION_TTL_SECS)
}

/// Kruzhok output constraints
pub mod kruzhok {
    /// Video note diameter in pixels
    pub const VIDEO_NOTE_SIZE: u32 = 480;

    /// Telegram refuses video notes longer than this
    pub const MAX_VIDEO_DURATION_SECS: f64 = 60.0;

    /// Clips made from a still photo always last this long
    pub const PHOTO_DURATION_SECS: f64 = 5.0;

    /// Used when neither Telegram nor ffprobe can tell the source duration
    pub const FALLBACK_DURATION_SECS: f64 = 10.0;

    /// Frame rate for photo-derived clips and the zoom filter
    pub const OUTPUT_FPS: u32 = 25;

    /// Entries shown by /history
    pub const HISTORY_LIMIT: usize = 10;
}

/// Transcoder pool configuration
pub mod transcode {
    pub const DEFAULT_MAX_CONCURRENT: usize = 2;

    pub const DEFAULT_TIMEOUT_SECS: u64 = 180;
}

/// Pending session configuration
pub mod session {
    use super::Duration;

    /// 30 minutes
    pub const DEFAULT_TTL_SECS: u64 = 1800;

    /// Interval of the background expiry sweep (in seconds)
    pub const CLEANUP_INTERVAL_SECS: u64 = 300;

    /// Expiry sweep interval duration
    pub fn cleanup_interval() -> Duration {
        Duration::from_secs(CLEANUP_INTERVAL_SECS)
    }
}

/// Retry configuration
pub mod retry {
    use super::Duration;

    /// Maximum number of retries for dispatcher reconnection
    pub const MAX_DISPATCHER_RETRIES: u32 = 5;

    /// Delay between dispatcher retry attempts (in seconds)
    pub const DISPATCHER_RETRY_DELAY_SECS: u64 = 5;

    /// Dispatcher retry delay duration
    pub fn dispatcher_delay() -> Duration {
        Duration::from_secs(DISPATCHER_RETRY_DELAY_SECS)
    }

    /// Base for exponential backoff calculation
    pub const EXPONENTIAL_BACKOFF_BASE: u64 = 2;
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for HTTP requests (in seconds)
    /// Generous because video uploads and downloads go through the same client
    pub const REQUEST_TIMEOUT_SECS: u64 = 300;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}
