use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Invalid seed {0:?}: expected -1 or a non-negative base-10 integer")]
    InvalidSeed(String),
    #[error("Unknown quality tier: {0}")]
    UnknownTier(String),
    #[error("Unknown aspect ratio: {0}")]
    UnknownAspectRatio(String),
}

pub type Result<T> = std::result::Result<T, ResolveError>;
