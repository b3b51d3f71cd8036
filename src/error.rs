use thiserror::Error;

use crate::bigmodel::BigModelError;

#[derive(Debug, Error)]
pub enum MediaGenError {
    #[error("Config error: {0}")]
    Config(String),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error(transparent)]
    Poll(#[from] PollError),

    #[error("cancelled before submission")]
    Cancelled,

    #[error("BigModel API error: {0}")]
    BigModel(#[from] BigModelError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A video submission that did not produce a job. Never retried.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("submission failed: {0}")]
    Remote(#[source] BigModelError),

    #[error("submission returned no job id")]
    MissingId,
}

/// A poll session that ended without a terminal status.
///
/// A FAILURE status is not an error; it comes back as a job.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("job {job_id} did not finish within {timeout_seconds}s ({queries} status queries)")]
    Timeout {
        job_id: String,
        timeout_seconds: u64,
        queries: u32,
    },

    #[error("status query for job {job_id} failed: {source}")]
    Query {
        job_id: String,
        #[source]
        source: BigModelError,
    },

    #[error("job {job_id} reported SUCCESS without a result url")]
    MissingResult { job_id: String },

    #[error("polling for job {job_id} was cancelled")]
    Cancelled { job_id: String },
}

impl PollError {
    pub fn job_id(&self) -> &str {
        match self {
            PollError::Timeout { job_id, .. }
            | PollError::Query { job_id, .. }
            | PollError::MissingResult { job_id }
            | PollError::Cancelled { job_id } => job_id,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, PollError::Timeout { .. })
    }
}
