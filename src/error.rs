//! Error types for Paperboy
//!
//! Centralized error handling using thiserror. Each layer keeps its own
//! error enum next to the code that raises it; `PaperboyError` is the
//! umbrella the binary works with.

use thiserror::Error;

pub use crate::agent::InvocationError;
pub use crate::domain::ValidationError;
pub use crate::gateway::GatewayError;
pub use crate::store::StorageError;
pub use crate::sync::SyncError;

/// All error types that can occur in Paperboy
#[derive(Debug, Error)]
pub enum PaperboyError {
    /// Scheduler service call failed
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Agent invocation failed or returned a malformed envelope
    #[error("Invocation error: {0}")]
    Invocation(#[from] InvocationError),

    /// Settings rejected before save
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Local persistence error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Action rejected by the synchronizer
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for Paperboy operations
pub type Result<T> = std::result::Result<T, PaperboyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_error_conversion() {
        let err: PaperboyError = GatewayError::Timeout.into();
        assert!(matches!(err, PaperboyError::Gateway(_)));
        assert_eq!(err.to_string(), "Gateway error: Request timed out");
    }

    #[test]
    fn test_invocation_error_conversion() {
        let err: PaperboyError = InvocationError::Busy.into();
        assert!(matches!(err, PaperboyError::Invocation(InvocationError::Busy)));
        assert!(err.to_string().contains("already in progress"));
    }

    #[test]
    fn test_sync_error_conversion() {
        let err: PaperboyError = SyncError::Busy.into();
        assert!(matches!(err, PaperboyError::Sync(_)));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PaperboyError = io_err.into();
        assert!(matches!(err, PaperboyError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: PaperboyError = json_err.into();
        assert!(matches!(err, PaperboyError::Json(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(SyncError::Busy.into())
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }
}
