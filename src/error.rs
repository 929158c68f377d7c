use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("message must not be empty")]
    EmptyMessage,
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("body must not be empty")]
    EmptyBody,
    #[error("unknown toast type '{0}'")]
    InvalidVariant(String),
    #[error("subscription endpoint missing")]
    InvalidSubscription,
    #[error("VAPID keys are not configured")]
    TransportNotConfigured,
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("storage connection unavailable")]
    StoreUnavailable,
    #[error("store task failed: {0}")]
    Blocking(#[from] tokio::task::JoinError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Caller mistakes that left no side effect behind.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::EmptyMessage
                | Error::EmptyTitle
                | Error::EmptyBody
                | Error::InvalidVariant(_)
                | Error::InvalidSubscription
        )
    }
}
