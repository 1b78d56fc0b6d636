use thiserror::Error;

/// Failure of a single transcoder run
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("ffmpeg exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("ffmpeg timed out after {secs}s")]
    TimedOut { secs: u64 },

    #[error("ffmpeg finished but produced no output")]
    MissingOutput,

    #[error("failed to run ffmpeg: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure reported by a chat transport
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Why a kruzhok could not be produced or delivered
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("media download failed: {0}")]
    DownloadFailure(String),

    #[error("no pending media for this user")]
    NoActiveSession,

    #[error("transcode failed: {0}")]
    TranscodeFailure(#[from] TranscodeError),

    #[error("delivery failed: {0}")]
    DeliveryFailure(String),

    #[error("chat request failed: {0}")]
    Transport(#[from] TransportError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProcessingError::from(TranscodeError::TimedOut { secs: 180 });
        assert_eq!(err.to_string(), "transcode failed: ffmpeg timed out after 180s");

        let err = ProcessingError::DownloadFailure("file is too big".to_string());
        assert_eq!(err.to_string(), "media download failed: file is too big");

        let err = ProcessingError::from(TransportError::new("chat not found"));
        assert_eq!(err.to_string(), "chat request failed: chat not found");
    }
}
