use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::{JobStatus, StateMachine, Transition};
use crate::bigmodel::{AsyncResult, ImageGenerationRequest, VideoGenerationRequest};
use crate::error::MediaGenError;

/// One remote asynchronous generation task.
///
/// Only status reads from the service change it; nothing is derived locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationJob {
    pub id: String,
    pub status: JobStatus,
    pub result_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
    /// Status reads performed so far, failed reads included.
    pub queries: u32,
    /// When the last status read happened.
    pub checked_at: Option<DateTime<Utc>>,
}

impl GenerationJob {
    pub fn new(id: String) -> Self {
        Self {
            id,
            status: JobStatus::Pending,
            result_url: None,
            cover_image_url: None,
            queries: 0,
            checked_at: None,
        }
    }

    /// Apply one status read to the job.
    ///
    /// The result URL is taken from the first video entry, and only when the
    /// read completes the job successfully.
    pub fn apply(&mut self, result: &AsyncResult) -> Transition {
        self.queries += 1;
        self.checked_at = Some(Utc::now());

        let was_terminal = self.status.is_terminal();
        let observed = JobStatus::from_remote(result.task_status.as_deref());
        let transition = StateMachine::next(self, observed);

        if !was_terminal
            && transition == Transition::Complete(JobStatus::Success)
            && let Some(video) = result.video_result.first()
        {
            self.result_url = Some(video.url.clone());
            self.cover_image_url = video.cover_image_url.clone();
        }

        transition
    }

    /// Account for a status read that errored.
    pub fn record_failed_query(&mut self) {
        self.queries += 1;
        self.checked_at = Some(Utc::now());
    }
}

/// Longest poll budget accepted: one week.
pub const MAX_TIMEOUT_SECONDS: u64 = 7 * 24 * 60 * 60;

/// Timing for one poll session. Immutable while the session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Wall-clock budget for the job to reach a terminal status.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Fixed delay between consecutive status reads.
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,

    /// Consecutive transient read errors tolerated before giving up.
    #[serde(default = "default_query_retries")]
    pub query_retries: u32,
}

fn default_timeout_seconds() -> u64 {
    300
}

fn default_interval_seconds() -> u64 {
    5
}

fn default_query_retries() -> u32 {
    2
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            interval_seconds: default_interval_seconds(),
            query_retries: default_query_retries(),
        }
    }
}

impl PollConfig {
    /// Build a validated config with the default query retry allowance.
    pub fn new(timeout_seconds: u64, interval_seconds: u64) -> Result<Self, MediaGenError> {
        let config = Self {
            timeout_seconds,
            interval_seconds,
            query_retries: default_query_retries(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_query_retries(mut self, query_retries: u32) -> Self {
        self.query_retries = query_retries;
        self
    }

    pub fn validate(&self) -> Result<(), MediaGenError> {
        if self.interval_seconds == 0 {
            return Err(MediaGenError::Config(
                "poll interval_seconds must be greater than zero".into(),
            ));
        }
        if self.timeout_seconds > MAX_TIMEOUT_SECONDS {
            return Err(MediaGenError::Config(format!(
                "poll timeout_seconds ({}) must not exceed {MAX_TIMEOUT_SECONDS}",
                self.timeout_seconds
            )));
        }
        if self.timeout_seconds < self.interval_seconds {
            return Err(MediaGenError::Config(format!(
                "poll timeout_seconds ({}) must be at least interval_seconds ({})",
                self.timeout_seconds, self.interval_seconds
            )));
        }
        Ok(())
    }

    /// The poll budget, capped at [`MAX_TIMEOUT_SECONDS`] even for a config
    /// that skipped validation.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.min(MAX_TIMEOUT_SECONDS))
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    /// Upper bound on status reads in one session: floor(timeout / interval).
    pub fn max_queries(&self) -> u32 {
        let n = self.timeout_seconds / self.interval_seconds.max(1);
        u32::try_from(n).unwrap_or(u32::MAX)
    }
}

/// The fixed parameter set sent with every video submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoParams {
    #[serde(default = "default_video_model")]
    pub model: String,
    #[serde(default = "default_quality")]
    pub quality: String,
    /// Resolution as `WIDTHxHEIGHT`.
    #[serde(default = "default_video_size")]
    pub size: String,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_true")]
    pub with_audio: bool,
    #[serde(default)]
    pub watermark_enabled: bool,
}

fn default_video_model() -> String {
    "CogVideoX-Flash".to_string()
}

fn default_quality() -> String {
    "quality".to_string()
}

fn default_video_size() -> String {
    "1920x1080".to_string()
}

fn default_fps() -> u32 {
    30
}

fn default_true() -> bool {
    true
}

impl Default for VideoParams {
    fn default() -> Self {
        Self {
            model: default_video_model(),
            quality: default_quality(),
            size: default_video_size(),
            fps: default_fps(),
            with_audio: true,
            watermark_enabled: false,
        }
    }
}

impl VideoParams {
    pub fn to_request(&self, prompt: &str, request_id: Option<String>) -> VideoGenerationRequest {
        VideoGenerationRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            quality: self.quality.clone(),
            with_audio: self.with_audio,
            size: self.size.clone(),
            fps: self.fps,
            watermark_enabled: self.watermark_enabled,
            request_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageParams {
    #[serde(default = "default_image_model")]
    pub model: String,
    #[serde(default = "default_image_size")]
    pub size: String,
}

fn default_image_model() -> String {
    "Cogview-3-Flash".to_string()
}

fn default_image_size() -> String {
    "1024x1024".to_string()
}

impl Default for ImageParams {
    fn default() -> Self {
        Self {
            model: default_image_model(),
            size: default_image_size(),
        }
    }
}

impl ImageParams {
    pub fn to_request(&self, prompt: &str) -> ImageGenerationRequest {
        ImageGenerationRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            size: self.size.clone(),
        }
    }
}
