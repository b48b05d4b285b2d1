use thiserror::Error;

#[derive(Debug, Error)]
pub enum DrmError {
    /// Error preparing a statement (includes connection failures)
    #[error("Prepare error: {0}")]
    PrepareError(String),

    /// Error executing a statement
    #[error("Execution error: {0}")]
    ExecutionError(String),

    /// Error with transaction
    #[error("Transaction error: {0}")]
    TransactionError(String),

    /// Relation chain cannot be arranged into a single join path
    #[error("Relation error: {0}")]
    Relation(String),

    /// Error mapping a row value onto an entity field
    #[error("Mapping error: {0}")]
    Mapping(String),

    /// JSON encoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Rusqlite specific errors
    #[cfg(feature = "rusqlite")]
    #[error("Rusqlite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
}

/// Result type for database operations
pub type Result<T> = std::result::Result<T, DrmError>;
