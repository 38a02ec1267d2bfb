//! Error types for MFlix storage.

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A record with the same unique key already exists.
    #[error("duplicate entity: {0}")]
    DuplicateEntity(String),

    /// The target of the operation does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller supplied an invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The database rejected a write. Carries the database's message.
    #[error("dao operation failed: {0}")]
    OperationFailed(String),

    /// Connection, read, or other driver failure.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<bson::ser::Error> for StoreError {
    fn from(e: bson::ser::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<bson::de::Error> for StoreError {
    fn from(e: bson::de::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
