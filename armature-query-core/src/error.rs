// Error types for Armature Query

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Relation error: {0}")]
    Relation(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Service error: {0}")]
    Service(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl QueryError {
    /// Check if this error reports a missing record
    pub fn is_not_found(&self) -> bool {
        matches!(self, QueryError::NotFound(_))
    }

    /// Check if this error was caused by caller input
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            QueryError::NotFound(_) | QueryError::Validation(_) | QueryError::Relation(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;
