//! Scriptable transcoder that records every job

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use kruzhok::kruzhok::{TranscodeError, TranscodeJob, Transcoder};

#[derive(Debug, Clone)]
pub enum TranscoderBehavior {
    /// Writes a small output file
    Succeed,
    /// Exits non-zero with the given stderr
    Fail(String),
    /// Sleeps, then succeeds
    Delay(Duration),
    /// Leaves a partial output behind and reports the deadline as exceeded
    TimeOut { secs: u64 },
}

pub struct MockTranscoder {
    behavior: Mutex<TranscoderBehavior>,
    jobs: Mutex<Vec<TranscodeJob>>,
    probe_result: Mutex<Option<f64>>,
    probes: AtomicUsize,
}

impl MockTranscoder {
    pub fn new(behavior: TranscoderBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            jobs: Mutex::new(Vec::new()),
            probe_result: Mutex::new(None),
            probes: AtomicUsize::new(0),
        }
    }

    pub fn set_behavior(&self, behavior: TranscoderBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn set_probe_result(&self, duration: Option<f64>) {
        *self.probe_result.lock().unwrap() = duration;
    }

    pub fn jobs(&self) -> Vec<TranscodeJob> {
        self.jobs.lock().unwrap().clone()
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    async fn transcode(&self, job: &TranscodeJob) -> Result<(), TranscodeError> {
        self.jobs.lock().unwrap().push(job.clone());
        assert!(job.input.exists(), "source must exist while transcoding");

        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            TranscoderBehavior::Succeed => {}
            TranscoderBehavior::Fail(stderr) => {
                return Err(TranscodeError::Failed {
                    status: "exit status: 1".to_string(),
                    stderr,
                })
            }
            TranscoderBehavior::Delay(delay) => tokio::time::sleep(delay).await,
            TranscoderBehavior::TimeOut { secs } => {
                tokio::fs::write(&job.output, b"partial").await?;
                return Err(TranscodeError::TimedOut { secs });
            }
        }

        tokio::fs::write(&job.output, b"kruzhok clip").await?;
        Ok(())
    }

    async fn probe_duration(&self, _input: &Path) -> Option<f64> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        *self.probe_result.lock().unwrap()
    }
}
