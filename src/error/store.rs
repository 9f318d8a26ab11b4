// Roast store error types and constants

use crate::error::ErrorCode;
use crate::store::RoastId;
use log::error;
use std::fmt;

/// Store error code constants
///
/// Error code range: 3001-3005
pub struct StoreErrorCodes {}

impl StoreErrorCodes {
    pub const NOT_FOUND: i32 = 3001;
    pub const IO: i32 = 3002;
    pub const SERIALIZATION: i32 = 3003;
    pub const LOCK_POISONED: i32 = 3004;
    pub const INVALID_RECORD: i32 = 3005;
}

/// Log a store error with structured context
///
/// A failed save is a data-loss event: the finished session is not re-queued.
pub fn log_store_error(err: &StoreError, context: &str) {
    error!(
        "Store error in {}: code={}, component=RoastStore, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Roast persistence errors
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// No roast with this id
    NotFound { id: RoastId },

    /// Filesystem or backend failure
    Io { details: String },

    /// Record could not be encoded or decoded
    Serialization { details: String },

    /// In-memory store mutex was poisoned
    LockPoisoned,

    /// Record violates the session_record schema
    InvalidRecord { reason: String },
}

impl ErrorCode for StoreError {
    fn code(&self) -> i32 {
        match self {
            StoreError::NotFound { .. } => StoreErrorCodes::NOT_FOUND,
            StoreError::Io { .. } => StoreErrorCodes::IO,
            StoreError::Serialization { .. } => StoreErrorCodes::SERIALIZATION,
            StoreError::LockPoisoned => StoreErrorCodes::LOCK_POISONED,
            StoreError::InvalidRecord { .. } => StoreErrorCodes::INVALID_RECORD,
        }
    }

    fn message(&self) -> String {
        match self {
            StoreError::NotFound { id } => format!("Roast {} not found", id),
            StoreError::Io { details } => format!("Store I/O error: {}", details),
            StoreError::Serialization { details } => {
                format!("Failed to encode/decode roast record: {}", details)
            }
            StoreError::LockPoisoned => "Roast store lock poisoned".to_string(),
            StoreError::InvalidRecord { reason } => format!("Invalid roast record: {}", reason),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoreError (code {}): {}", self.code(), self.message())
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io {
            details: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization {
            details: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_codes() {
        assert_eq!(StoreError::NotFound { id: 1 }.code(), StoreErrorCodes::NOT_FOUND);
        assert_eq!(StoreError::LockPoisoned.code(), StoreErrorCodes::LOCK_POISONED);
        assert_eq!(
            StoreError::InvalidRecord {
                reason: "x".to_string()
            }
            .code(),
            StoreErrorCodes::INVALID_RECORD
        );
    }

    #[test]
    fn test_serde_error_conversion() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: StoreError = parse_err.into();
        assert!(matches!(err, StoreError::Serialization { .. }));
    }

    #[test]
    fn test_not_found_message() {
        assert!(StoreError::NotFound { id: 42 }.message().contains("42"));
    }
}
