use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    #[error("Stage failed: {0}")]
    StageFailed(String),

    #[error("Commit failed: {0}")]
    CommitFailed(String),

    #[error("Commit not allowed: {repaired} of {total} rows repaired")]
    CommitNotAllowed { repaired: usize, total: usize },

    #[error("Nothing to stage: change log is empty")]
    NothingToStage,

    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Lock error: {0}")]
    LockError(String),
}

impl GridError {
    pub fn dataset_not_found(id: impl Into<String>) -> Self {
        Self::NotFound { kind: "Dataset", id: id.into() }
    }

    pub fn row_not_found(id: impl Into<String>) -> Self {
        Self::NotFound { kind: "Row", id: id.into() }
    }

    pub fn column_not_found(name: impl Into<String>) -> Self {
        Self::NotFound { kind: "Column", id: name.into() }
    }

    /// Backend failures the caller may retry; everything else needs a different request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::FetchFailed(_) | Self::StageFailed(_) | Self::CommitFailed(_) | Self::Timeout(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, GridError>;

impl<T> From<std::sync::PoisonError<T>> for GridError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

impl From<serde_json::Error> for GridError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(GridError::FetchFailed("boom".into()).is_retryable());
        assert!(GridError::Timeout(100).is_retryable());
        assert!(!GridError::NothingToStage.is_retryable());
        assert!(!GridError::CommitNotAllowed { repaired: 1, total: 3 }.is_retryable());
    }

    #[test]
    fn test_not_found_message() {
        let err = GridError::row_not_found("r9");
        assert_eq!(err.to_string(), "Row 'r9' not found");
    }
}
