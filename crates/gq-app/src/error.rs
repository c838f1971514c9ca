use gq_core::ResolveError;
use thiserror::Error;

use crate::job::JobId;

/// Errors surfaced synchronously to whoever calls into the scheduler
#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] ResolveError),
    #[error("Job {0} not found")]
    NotFound(JobId),
    #[error("Job {0} is being generated and cannot be removed")]
    Conflict(JobId),
    #[error("Scheduler has been shut down")]
    ShutDown,
}

/// A failed backend call. Recorded on the job, never returned to a submitter.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to reach backend: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Malformed backend response: {0}")]
    MalformedResponse(String),
    #[error("Backend call panicked: {0}")]
    Panicked(String),
    #[error("Interrupted by shutdown")]
    Interrupted,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    InvalidValue {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}
