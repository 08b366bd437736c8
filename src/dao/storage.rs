use std::error::Error;
use thiserror::Error;

/// Result alias for score storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by score backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A conditional write kept losing against concurrent writers.
    #[error("conditional write on `{key}` gave up after {attempts} attempts")]
    Contended { key: String, attempts: u32 },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}
