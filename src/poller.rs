use std::time::Duration;

use tokio::time::{Instant, sleep, sleep_until};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::bigmodel::{BigModelError, GenerationService};
use crate::error::{MediaGenError, PollError, SubmissionError};
use crate::job::{GenerationJob, ImageParams, JobStatus, PollConfig, Transition, VideoParams};

/// Submits generation tasks and waits for them to finish.
///
/// The service is injected, so one poller can be shared by every request
/// of the HTTP service and tests can script the remote side.
pub struct JobPoller<S> {
    service: S,
}

impl<S: GenerationService> JobPoller<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Submit a video task and return the job id the service assigned.
    ///
    /// Errors are surfaced as-is and never retried.
    pub async fn submit(&self, prompt: &str, params: &VideoParams) -> Result<String, SubmissionError> {
        let request_id = Uuid::new_v4().to_string();
        let req = params.to_request(prompt, Some(request_id.clone()));

        let response = self.service.submit_video(&req).await.map_err(|e| {
            tracing::error!(request_id = %request_id, error = %e, "Video submission failed");
            SubmissionError::Remote(e)
        })?;

        let job_id = response
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                tracing::error!(request_id = %request_id, "Video submission returned no job id");
                SubmissionError::MissingId
            })?;

        tracing::info!(
            job_id = %job_id,
            request_id = %request_id,
            echoed_request_id = response.request_id.as_deref().unwrap_or("<none>"),
            model = %params.model,
            "Video task submitted",
        );
        Ok(job_id)
    }

    /// Wait for `job_id` to reach a terminal status.
    pub async fn await_completion(
        &self,
        job_id: &str,
        config: &PollConfig,
    ) -> Result<GenerationJob, PollError> {
        self.await_completion_with(job_id, config, &CancellationToken::new(), |_| {})
            .await
    }

    /// Wait for `job_id` to reach a terminal status, stopping early if
    /// `cancel` fires. `on_update` sees the job after every status read.
    ///
    /// Reads happen immediately and then every `interval_seconds`, at most
    /// `floor(timeout / interval)` times. SUCCESS and FAILURE both return the
    /// job; only running out of budget is a [`PollError::Timeout`]. A read
    /// still in flight when the budget runs out is abandoned and counted.
    pub async fn await_completion_with<F>(
        &self,
        job_id: &str,
        config: &PollConfig,
        cancel: &CancellationToken,
        mut on_update: F,
    ) -> Result<GenerationJob, PollError>
    where
        F: FnMut(&GenerationJob) + Send,
    {
        let started = Instant::now();
        let deadline = started + config.timeout();
        let max_queries = config.max_queries();
        let mut job = GenerationJob::new(job_id.to_string());
        let mut consecutive_errors = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Err(cancelled(&job));
            }

            let read = tokio::select! {
                _ = cancel.cancelled() => return Err(cancelled(&job)),
                _ = sleep_until(deadline) => {
                    job.record_failed_query();
                    return Err(timed_out(&job, config));
                }
                read = self.service.retrieve(job_id) => read,
            };

            match read {
                Ok(result) => {
                    consecutive_errors = 0;
                    let transition = job.apply(&result);
                    tracing::debug!(
                        job_id = %job_id,
                        status = %job.status,
                        remote_status = result.task_status.as_deref().unwrap_or("<none>"),
                        query = job.queries,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Job status",
                    );
                    on_update(&job);

                    if let Transition::Complete(status) = transition {
                        return finish(job, status, started.elapsed());
                    }
                }
                Err(e) if is_tolerated(&e, consecutive_errors, config) => {
                    consecutive_errors += 1;
                    job.record_failed_query();
                    tracing::warn!(
                        job_id = %job_id,
                        attempt = consecutive_errors,
                        max = config.query_retries,
                        error = %e,
                        "Status query failed, will retry on next interval",
                    );
                    on_update(&job);
                }
                Err(source) => {
                    tracing::error!(job_id = %job_id, error = %source, "Status query failed");
                    return Err(PollError::Query {
                        job_id: job_id.to_string(),
                        source,
                    });
                }
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(timed_out(&job, config));
            }
            if job.queries >= max_queries {
                // No reads left; the budget still has to run out before it
                // counts as a timeout.
                pause(remaining, cancel, &job).await?;
                return Err(timed_out(&job, config));
            }

            pause(config.interval().min(remaining), cancel, &job).await?;
            if Instant::now() >= deadline {
                return Err(timed_out(&job, config));
            }
        }
    }

    /// Submit `prompt` and wait for the resulting job. Nothing is submitted
    /// once `cancel` has fired.
    pub async fn generate<F>(
        &self,
        prompt: &str,
        params: &VideoParams,
        config: &PollConfig,
        cancel: &CancellationToken,
        on_update: F,
    ) -> Result<GenerationJob, MediaGenError>
    where
        F: FnMut(&GenerationJob) + Send,
    {
        if cancel.is_cancelled() {
            tracing::info!("Cancelled before submission");
            return Err(MediaGenError::Cancelled);
        }
        let job_id = self.submit(prompt, params).await?;
        let job = self
            .await_completion_with(&job_id, config, cancel, on_update)
            .await?;
        Ok(job)
    }

    /// Read the status of `job_id` once, without waiting.
    pub async fn check(&self, job_id: &str) -> Result<GenerationJob, BigModelError> {
        let result = self.service.retrieve(job_id).await?;
        let mut job = GenerationJob::new(job_id.to_string());
        job.apply(&result);
        Ok(job)
    }

    /// Generate an image. Image generation is synchronous on the remote
    /// side, so there is nothing to poll.
    pub async fn generate_image(
        &self,
        prompt: &str,
        params: &ImageParams,
    ) -> Result<String, BigModelError> {
        let response = self.service.generate_image(&params.to_request(prompt)).await?;
        let url = response
            .data
            .into_iter()
            .next()
            .map(|d| d.url)
            .ok_or(BigModelError::MissingField("data[0].url"))?;
        tracing::info!(model = %params.model, url = %url, "Image generated");
        Ok(url)
    }
}

fn is_tolerated(err: &BigModelError, consecutive_errors: u32, config: &PollConfig) -> bool {
    err.is_transient() && consecutive_errors < config.query_retries
}

fn finish(job: GenerationJob, status: JobStatus, elapsed: Duration) -> Result<GenerationJob, PollError> {
    match status {
        JobStatus::Success if job.result_url.is_none() => {
            tracing::error!(job_id = %job.id, "Job succeeded without a result url");
            Err(PollError::MissingResult { job_id: job.id })
        }
        JobStatus::Success => {
            tracing::info!(
                job_id = %job.id,
                url = job.result_url.as_deref().unwrap_or_default(),
                queries = job.queries,
                elapsed_ms = elapsed.as_millis() as u64,
                "Video generation succeeded",
            );
            Ok(job)
        }
        _ => {
            tracing::warn!(
                job_id = %job.id,
                queries = job.queries,
                elapsed_ms = elapsed.as_millis() as u64,
                "Video generation failed",
            );
            Ok(job)
        }
    }
}

async fn pause(
    duration: Duration,
    cancel: &CancellationToken,
    job: &GenerationJob,
) -> Result<(), PollError> {
    tokio::select! {
        _ = cancel.cancelled() => Err(cancelled(job)),
        _ = sleep(duration) => Ok(()),
    }
}

fn cancelled(job: &GenerationJob) -> PollError {
    tracing::info!(job_id = %job.id, queries = job.queries, "Polling cancelled");
    PollError::Cancelled {
        job_id: job.id.clone(),
    }
}

fn timed_out(job: &GenerationJob, config: &PollConfig) -> PollError {
    tracing::warn!(
        job_id = %job.id,
        status = %job.status,
        queries = job.queries,
        timeout_seconds = config.timeout_seconds,
        "Timed out waiting for job",
    );
    PollError::Timeout {
        job_id: job.id.clone(),
        timeout_seconds: config.timeout_seconds,
        queries: job.queries,
    }
}
