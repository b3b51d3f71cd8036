//! Sequential generation of several videos, each saved as `video{i}.mp4`.
//!
//! One prompt failing does not stop the batch; only cancellation does.

use std::fmt;
use std::path::{Path, PathBuf};

use reqwest::Client;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::bigmodel::GenerationService;
use crate::download::download_to;
use crate::error::{MediaGenError, PollError};
use crate::job::{GenerationJob, JobStatus, PollConfig, VideoParams};
use crate::poller::JobPoller;

#[derive(Debug, Clone, Serialize)]
pub struct BatchItem {
    /// 1-based position of the prompt.
    pub index: usize,
    pub prompt: String,
    pub outcome: BatchOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BatchOutcome {
    Saved { url: String, path: PathBuf, bytes: u64 },
    Failed { job_id: String },
    TimedOut { job_id: String },
    Error { message: String },
}

impl fmt::Display for BatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchOutcome::Saved { path, bytes, .. } => {
                write!(f, "saved {} ({bytes} bytes)", path.display())
            }
            BatchOutcome::Failed { job_id } => write!(f, "generation failed (job {job_id})"),
            BatchOutcome::TimedOut { job_id } => write!(f, "timed out (job {job_id})"),
            BatchOutcome::Error { message } => write!(f, "error: {message}"),
        }
    }
}

/// Generate one video per prompt, in order, downloading each success into
/// `out_dir`. Stops early, returning what finished so far, if `cancel` fires.
#[allow(clippy::too_many_arguments)]
pub async fn run_batch<S, F>(
    poller: &JobPoller<S>,
    http: &Client,
    prompts: &[String],
    params: &VideoParams,
    config: &PollConfig,
    out_dir: &Path,
    cancel: &CancellationToken,
    mut on_update: F,
) -> Result<Vec<BatchItem>, MediaGenError>
where
    S: GenerationService,
    F: FnMut(usize, &GenerationJob) + Send,
{
    tokio::fs::create_dir_all(out_dir).await?;
    let mut items = Vec::with_capacity(prompts.len());

    for (offset, prompt) in prompts.iter().enumerate() {
        let index = offset + 1;
        tracing::info!(index, prompt = %prompt, "Generating batch video");

        let result = poller
            .generate(prompt, params, config, cancel, |job| on_update(index, job))
            .await;

        let outcome = match result {
            Ok(job) if job.status == JobStatus::Success => {
                let url = job.result_url.unwrap_or_default();
                let path = out_dir.join(format!("video{index}.mp4"));
                match download_to(http, &url, &path).await {
                    Ok(bytes) => BatchOutcome::Saved { url, path, bytes },
                    Err(e) => {
                        tracing::warn!(index, url = %url, error = %e, "Download failed");
                        BatchOutcome::Error {
                            message: e.to_string(),
                        }
                    }
                }
            }
            Ok(job) => {
                tracing::warn!(index, job_id = %job.id, "Video generation failed, skipping");
                BatchOutcome::Failed { job_id: job.id }
            }
            Err(MediaGenError::Cancelled | MediaGenError::Poll(PollError::Cancelled { .. })) => {
                tracing::info!(index, "Batch cancelled");
                break;
            }
            Err(MediaGenError::Poll(PollError::Timeout { job_id, .. })) => {
                BatchOutcome::TimedOut { job_id }
            }
            Err(e) => {
                tracing::warn!(index, error = %e, "Video generation errored, skipping");
                BatchOutcome::Error {
                    message: e.to_string(),
                }
            }
        };

        items.push(BatchItem {
            index,
            prompt: prompt.clone(),
            outcome,
        });
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedService, running, status, success};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn batch_saves_successes_and_skips_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"mp4-bytes".to_vec()))
            .mount(&server)
            .await;

        let video_url = format!("{}/video.mp4", server.uri());
        let service = ScriptedService::new()
            .then_status(success(&video_url))
            .then_status(status("FAILED"))
            .otherwise(running());
        let poller = JobPoller::new(service);
        let config = PollConfig::new(1, 1).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let prompts = vec!["first".to_string(), "second".into(), "third".into()];

        let items = run_batch(
            &poller,
            &Client::new(),
            &prompts,
            &VideoParams::default(),
            &config,
            dir.path(),
            &CancellationToken::new(),
            |_, _| {},
        )
        .await
        .unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(
            items[0].outcome,
            BatchOutcome::Saved {
                url: video_url,
                path: dir.path().join("video1.mp4"),
                bytes: 9,
            }
        );
        assert_eq!(
            items[1].outcome,
            BatchOutcome::Failed {
                job_id: "task-2".into()
            }
        );
        assert_eq!(
            items[2].outcome,
            BatchOutcome::TimedOut {
                job_id: "task-3".into()
            }
        );
        assert!(dir.path().join("video1.mp4").exists());
        assert!(!dir.path().join("video2.mp4").exists());
        assert_eq!(poller.service().submission_count(), 3);
    }

    #[tokio::test]
    async fn cancelled_batch_stops_submitting() {
        let poller = JobPoller::new(ScriptedService::new().otherwise(running()));
        let config = PollConfig::new(60, 1).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let items = run_batch(
            &poller,
            &Client::new(),
            &["a".to_string(), "b".to_string()],
            &VideoParams::default(),
            &config,
            dir.path(),
            &cancel,
            |_, _| {},
        )
        .await
        .unwrap();

        assert!(items.is_empty());
        assert_eq!(poller.service().submission_count(), 0);
    }

    #[test]
    fn outcome_display() {
        let outcome = BatchOutcome::TimedOut {
            job_id: "task-1".into(),
        };
        assert_eq!(outcome.to_string(), "timed out (job task-1)");
    }
}
