//! Transcoding a source photo or video into a square kruzhok clip.
//!
//! [`FfmpegTranscoder`] is the production implementation. Concurrent ffmpeg
//! processes are bounded by a semaphore and every run has a deadline.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::Semaphore;

use super::effect::{filter_chain, Effect};
use super::error::TranscodeError;
use super::media::MediaKind;
use crate::core::config;
use crate::core::process::{run_with_timeout, ProcessError, FFPROBE_TIMEOUT};

/// One transcoder invocation
#[derive(Debug, Clone)]
pub struct TranscodeJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub media_kind: MediaKind,
    /// Already capped clip length in seconds
    pub duration_secs: f64,
    pub effect: Effect,
}

/// Produces kruzhok clips from source media
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Writes the clip described by `job` to `job.output`
    async fn transcode(&self, job: &TranscodeJob) -> Result<(), TranscodeError>;

    /// Duration of a video file in seconds, if it can be determined
    async fn probe_duration(&self, _input: &Path) -> Option<f64> {
        None
    }
}

/// ffmpeg/ffprobe backed transcoder
pub struct FfmpegTranscoder {
    ffmpeg_bin: String,
    ffprobe_bin: String,
    timeout: Duration,
    size: u32,
    fps: u32,
    permits: Semaphore,
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg_bin: impl Into<String>, ffprobe_bin: impl Into<String>, max_concurrent: usize, timeout: Duration) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
            ffprobe_bin: ffprobe_bin.into(),
            timeout,
            size: config::kruzhok::VIDEO_NOTE_SIZE,
            fps: config::kruzhok::OUTPUT_FPS,
            permits: Semaphore::new(max_concurrent.max(1)),
        }
    }

    /// Transcoder configured from the environment
    pub fn from_config() -> Self {
        Self::new(
            config::FFMPEG_BIN.as_str(),
            config::FFPROBE_BIN.as_str(),
            *config::MAX_CONCURRENT_TRANSCODES,
            config::transcode_timeout(),
        )
    }

    /// ffmpeg command line (without the binary) for a job
    pub fn build_args(&self, job: &TranscodeJob) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-hide_banner", "-loglevel", "error", "-y"].iter().map(OsString::from).collect();

        // A still image has to be looped to become a video stream
        if job.media_kind == MediaKind::Photo {
            args.push("-loop".into());
            args.push("1".into());
        }
        args.push("-i".into());
        args.push(job.input.clone().into_os_string());
        args.push("-t".into());
        args.push(format_secs(job.duration_secs).into());
        args.push("-vf".into());
        args.push(filter_chain(job.effect, job.media_kind, self.size, self.fps).into());
        args.push("-c:v".into());
        args.push("libx264".into());

        match job.media_kind {
            MediaKind::Photo => {
                for arg in ["-pix_fmt", "yuv420p", "-r"] {
                    args.push(arg.into());
                }
                args.push(self.fps.to_string().into());
                args.push("-an".into());
            }
            MediaKind::Video => {
                for arg in ["-c:a", "aac", "-b:a", "128k", "-ar", "44100", "-ac", "2"] {
                    args.push(arg.into());
                }
            }
        }

        for arg in ["-preset", "fast", "-crf", "23", "-movflags", "+faststart"] {
            args.push(arg.into());
        }
        args.push(job.output.clone().into_os_string());
        args
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(&self, job: &TranscodeJob) -> Result<(), TranscodeError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| TranscodeError::Io(std::io::Error::other("transcode pool closed")))?;

        log::info!(
            "Transcoding {} ({}, effect {}, {}s) -> {}",
            job.input.display(),
            job.media_kind,
            job.effect,
            format_secs(job.duration_secs),
            job.output.display()
        );

        let mut cmd = Command::new(&self.ffmpeg_bin);
        cmd.args(self.build_args(job));

        let output = run_with_timeout(&mut cmd, self.timeout).await.map_err(|e| match e {
            ProcessError::Io(e) => TranscodeError::Io(e),
            ProcessError::TimedOut(secs) => TranscodeError::TimedOut { secs },
        })?;

        if !output.status.success() {
            return Err(TranscodeError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        match tokio::fs::metadata(&job.output).await {
            Ok(meta) if meta.len() > 0 => Ok(()),
            _ => Err(TranscodeError::MissingOutput),
        }
    }

    async fn probe_duration(&self, input: &Path) -> Option<f64> {
        let mut cmd = Command::new(&self.ffprobe_bin);
        cmd.args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(input);

        let output = match run_with_timeout(&mut cmd, FFPROBE_TIMEOUT).await {
            Ok(output) if output.status.success() => output,
            Ok(output) => {
                log::warn!(
                    "ffprobe failed for {}: {}",
                    input.display(),
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                return None;
            }
            Err(e) => {
                log::warn!("ffprobe failed for {}: {}", input.display(), e);
                return None;
            }
        };

        parse_duration(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parses ffprobe's duration output, rejecting unusable values
fn parse_duration(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|d| d.is_finite() && *d > 0.0)
}

fn format_secs(secs: f64) -> String {
    format!("{:.2}", secs)
}
