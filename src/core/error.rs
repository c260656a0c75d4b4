use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("user not found")]
    NotFound,

    #[error("user login already used")]
    LoginAlreadyUsed,

    #[error("user email already used")]
    EmailAlreadyUsed,

    #[error("user telegram already used")]
    TelegramAlreadyUsed,

    #[error("lock unavailable: {0}")]
    LockUnavailable(String),

    #[error("transient failure: {0}")]
    Transient(String),

    #[error("codec error: {0}")]
    Codec(String),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

impl ServiceError {
    /// Uniqueness conflicts are surfaced to the caller and never retried
    /// automatically.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::LoginAlreadyUsed | Self::EmailAlreadyUsed | Self::TelegramAlreadyUsed
        )
    }

    /// Retryable failures: storage/transport hiccups and lock contention.
    /// Codec errors are programming mistakes and must surface as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::LockUnavailable(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Codec(err.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for ServiceError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Transient(err.to_string())
    }
}
