use thiserror::Error;

#[derive(Error, Debug)]
pub enum UserStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Row mapping error: {0}")]
    Mapping(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Deadline exceeded")]
    DeadlineExceeded,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl UserStoreError {
    /// True for errors caused by the caller going away or running out of
    /// time, which are not failures of the service itself.
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            UserStoreError::Cancelled | UserStoreError::DeadlineExceeded
        )
    }
}

pub type Result<T> = std::result::Result<T, UserStoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_cancellation() {
        assert!(UserStoreError::Cancelled.is_cancellation());
        assert!(UserStoreError::DeadlineExceeded.is_cancellation());
        assert!(!UserStoreError::Storage("down".to_string()).is_cancellation());
    }
}
