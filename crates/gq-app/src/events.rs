//! Queue change notifications for display collaborators.
//!
//! A UI subscribes once and redraws on every [`QueueEvent`] instead of
//! re-deriving the queue on a refresh loop.

use tokio::sync::broadcast;

use crate::job::JobId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueEvent {
    JobQueued(JobId),
    JobStarted(JobId),
    JobSucceeded(JobId),
    JobFailed { job_id: JobId, error: String },
    JobDeleted(JobId),
}

impl QueueEvent {
    pub fn job_id(&self) -> JobId {
        match self {
            Self::JobQueued(id)
            | Self::JobStarted(id)
            | Self::JobSucceeded(id)
            | Self::JobDeleted(id) => *id,
            Self::JobFailed { job_id, .. } => *job_id,
        }
    }
}

const DEFAULT_CAPACITY: usize = 256;

/// Fan-out of [`QueueEvent`]s; slow receivers observe `RecvError::Lagged`
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<QueueEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, event: QueueEvent) {
        // Only fails when nobody is listening.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
