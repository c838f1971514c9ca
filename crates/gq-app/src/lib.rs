pub mod artifact;
pub mod backend;
pub mod config;
pub mod error;
pub mod events;
pub mod job;
pub mod scheduler;

pub use artifact::Artifact;
pub use backend::{Backend, SdWebUiBackend};
pub use config::AppConfig;
pub use error::{BackendError, ConfigError, QueueError};
pub use events::{EventBus, QueueEvent};
pub use job::{Job, JobId, JobStatus};
pub use scheduler::{Enqueued, QueueCounts, Scheduler};
