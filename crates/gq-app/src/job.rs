use std::fmt;

use chrono::{DateTime, Utc};
use gq_core::{compute_fingerprint, Fingerprint, Request};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::artifact::Artifact;

/// Process-unique job identifier, never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    InFlight,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::InFlight)
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Only `Pending -> InFlight -> {Succeeded, Failed}` is allowed
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::InFlight)
                | (Self::InFlight, Self::Succeeded)
                | (Self::InFlight, Self::Failed)
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Waiting...",
            Self::InFlight => "Generating",
            Self::Succeeded => "Complete",
            Self::Failed => "Failed",
        }
    }
}

/// A request frozen at enqueue time plus its processing state.
///
/// The request, fingerprint and resolved seed are fixed at construction;
/// only status, artifact and error move afterwards.
#[derive(Debug, Clone)]
pub struct Job {
    id: JobId,
    request: Request,
    fingerprint: Fingerprint,
    resolved_seed: i64,
    status: JobStatus,
    artifact: Option<Artifact>,
    error: Option<String>,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl Job {
    pub(crate) fn new(request: Request, resolved_seed: i64) -> Self {
        Self {
            id: JobId::new(),
            fingerprint: compute_fingerprint(&request),
            request,
            resolved_seed,
            status: JobStatus::Pending,
            artifact: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn resolved_seed(&self) -> i64 {
        self.resolved_seed
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        self.artifact.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub(crate) fn start(&mut self) -> bool {
        if !self.advance(JobStatus::InFlight) {
            return false;
        }
        self.started_at = Some(Utc::now());
        true
    }

    pub(crate) fn succeed(&mut self, artifact: Artifact) -> bool {
        if !self.advance(JobStatus::Succeeded) {
            return false;
        }
        self.artifact = Some(artifact);
        self.completed_at = Some(Utc::now());
        true
    }

    pub(crate) fn fail(&mut self, error: String) -> bool {
        if !self.advance(JobStatus::Failed) {
            return false;
        }
        self.error = Some(error);
        self.completed_at = Some(Utc::now());
        true
    }

    fn advance(&mut self, next: JobStatus) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        true
    }
}
