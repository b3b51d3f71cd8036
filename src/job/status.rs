use std::fmt;

use serde::{Deserialize, Serialize};

use super::model::GenerationJob;

/// Lifecycle of a remote generation job.
///
/// PENDING → RUNNING → {SUCCESS, FAILURE}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Running,
    Success,
    Failure,
}

impl JobStatus {
    /// Map the service's `task_status` vocabulary onto a status.
    ///
    /// `FAILURE` and `FAILED` are the same outcome. Anything unrecognised,
    /// including a missing status, counts as still pending.
    pub fn from_remote(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("SUCCESS") => JobStatus::Success,
            Some("FAILURE") | Some("FAILED") => JobStatus::Failure,
            Some("PROCESSING") | Some("RUNNING") => JobStatus::Running,
            _ => JobStatus::Pending,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failure)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "PENDING"),
            JobStatus::Running => write!(f, "RUNNING"),
            JobStatus::Success => write!(f, "SUCCESS"),
            JobStatus::Failure => write!(f, "FAILURE"),
        }
    }
}

/// The result of applying one observed status to a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The job is still in flight; poll again.
    Wait(JobStatus),
    /// The job reached a terminal status.
    Complete(JobStatus),
}

/// Applies observed remote statuses to a `GenerationJob`.
pub struct StateMachine;

impl StateMachine {
    /// Move `job` to the status the service reported.
    ///
    /// - A terminal job never changes again.
    /// - A running job does not fall back to pending.
    /// - Every other observation is taken as-is.
    pub fn next(job: &mut GenerationJob, observed: JobStatus) -> Transition {
        let next = match (job.status, observed) {
            (current, _) if current.is_terminal() => current,
            (JobStatus::Running, JobStatus::Pending) => JobStatus::Running,
            (_, observed) => observed,
        };
        job.status = next;

        if next.is_terminal() {
            Transition::Complete(next)
        } else {
            Transition::Wait(next)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_job() -> GenerationJob {
        GenerationJob::new("task-1".into())
    }

    #[test]
    fn remote_vocabulary() {
        assert_eq!(JobStatus::from_remote(Some("SUCCESS")), JobStatus::Success);
        assert_eq!(JobStatus::from_remote(Some("FAILURE")), JobStatus::Failure);
        assert_eq!(JobStatus::from_remote(Some("FAILED")), JobStatus::Failure);
        assert_eq!(JobStatus::from_remote(Some("PROCESSING")), JobStatus::Running);
        assert_eq!(JobStatus::from_remote(Some("RUNNING")), JobStatus::Running);
        assert_eq!(JobStatus::from_remote(Some("QUEUED")), JobStatus::Pending);
        assert_eq!(JobStatus::from_remote(Some("success")), JobStatus::Pending);
        assert_eq!(JobStatus::from_remote(None), JobStatus::Pending);
    }

    #[test]
    fn happy_path_walks_all_states() {
        let mut job = make_job();
        assert_eq!(job.status, JobStatus::Pending);

        let t = StateMachine::next(&mut job, JobStatus::Pending);
        assert_eq!(t, Transition::Wait(JobStatus::Pending));

        let t = StateMachine::next(&mut job, JobStatus::Running);
        assert_eq!(t, Transition::Wait(JobStatus::Running));

        let t = StateMachine::next(&mut job, JobStatus::Success);
        assert_eq!(t, Transition::Complete(JobStatus::Success));
        assert_eq!(job.status, JobStatus::Success);
    }

    #[test]
    fn terminal_status_is_sticky() {
        let mut job = make_job();
        StateMachine::next(&mut job, JobStatus::Failure);

        let t = StateMachine::next(&mut job, JobStatus::Running);
        assert_eq!(t, Transition::Complete(JobStatus::Failure));

        let t = StateMachine::next(&mut job, JobStatus::Success);
        assert_eq!(t, Transition::Complete(JobStatus::Failure));
        assert_eq!(job.status, JobStatus::Failure);
    }

    #[test]
    fn running_does_not_regress_to_pending() {
        let mut job = make_job();
        StateMachine::next(&mut job, JobStatus::Running);

        let t = StateMachine::next(&mut job, JobStatus::Pending);
        assert_eq!(t, Transition::Wait(JobStatus::Running));
        assert_eq!(job.status, JobStatus::Running);
    }

    #[test]
    fn pending_can_complete_directly() {
        let mut job = make_job();
        let t = StateMachine::next(&mut job, JobStatus::Success);
        assert_eq!(t, Transition::Complete(JobStatus::Success));
    }

    #[test]
    fn status_display_and_serde() {
        assert_eq!(JobStatus::Pending.to_string(), "PENDING");
        assert_eq!(JobStatus::Running.to_string(), "RUNNING");
        assert_eq!(JobStatus::Success.to_string(), "SUCCESS");
        assert_eq!(JobStatus::Failure.to_string(), "FAILURE");
        assert_eq!(
            serde_json::to_string(&JobStatus::Success).unwrap(),
            r#""SUCCESS""#
        );
    }
}
