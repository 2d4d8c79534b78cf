use thiserror::Error;

/// Errors from repository operations (used by trait definitions in haggle-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors surfaced by `ChatService` to client-facing layers.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("persistence error: {0}")]
    Persistence(String),
}

impl From<RepositoryError> for ChatError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => ChatError::NotFound("entity".to_string()),
            other => ChatError::Persistence(other.to_string()),
        }
    }
}

/// Errors from a notification sender. Never propagated past the dispatcher.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("push transport error: {0}")]
    Transport(String),

    #[error("push gateway rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },
}
