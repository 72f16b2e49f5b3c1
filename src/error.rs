//! Unified error types for MundoFi Core
//!
//! All errors flow through this module for consistent handling
//! and FFI-safe error reporting.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for all MundoFi operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MundoError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl MundoError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, msg)
    }

    pub fn operation_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::OperationFailed, msg)
    }

    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidTransition, msg)
    }

    pub fn busy(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Busy, msg)
    }

    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Cancelled, msg)
    }

    pub fn network_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::NetworkError, msg)
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, msg)
    }

    pub fn storage_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageError, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, msg)
    }

    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseError, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }

    /// True for errors the user can clear by simply trying the same step again
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::OperationFailed | ErrorCode::NetworkError | ErrorCode::Timeout
        )
    }
}

impl fmt::Display for MundoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for MundoError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Input errors
    InvalidInput,
    InvalidTransition,

    // Flow errors
    OperationFailed,
    Busy,
    Cancelled,

    // Network errors
    NetworkError,
    Timeout,

    // Environment errors
    ConfigError,
    StorageError,
    NotFound,

    // Parse errors
    ParseError,
    JsonError,

    // Internal
    Internal,
}

/// Result type alias for MundoFi operations
pub type MundoResult<T> = Result<T, MundoError>;

// Conversions from common error types

impl From<serde_json::Error> for MundoError {
    fn from(e: serde_json::Error) -> Self {
        MundoError::new(ErrorCode::JsonError, e.to_string())
    }
}

impl From<std::io::Error> for MundoError {
    fn from(e: std::io::Error) -> Self {
        MundoError::new(ErrorCode::StorageError, e.to_string())
    }
}

impl From<url::ParseError> for MundoError {
    fn from(e: url::ParseError) -> Self {
        MundoError::new(ErrorCode::ConfigError, format!("Invalid URL: {}", e))
    }
}

impl From<reqwest::Error> for MundoError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            MundoError::new(ErrorCode::Timeout, "Request timed out")
        } else if e.is_connect() {
            MundoError::new(ErrorCode::NetworkError, "Connection failed")
        } else {
            MundoError::new(ErrorCode::NetworkError, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = MundoError::operation_failed("Failed to send verification email")
            .with_details("provider returned 503");

        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("operation_failed"));
        assert!(json.contains("Failed to send verification email"));
    }

    #[test]
    fn test_display_includes_details() {
        let err = MundoError::invalid_input("bad pin").with_details("5 digits");
        assert_eq!(err.to_string(), "[InvalidInput] bad pin (5 digits)");
    }

    #[test]
    fn test_retryable_codes() {
        assert!(MundoError::operation_failed("x").is_retryable());
        assert!(MundoError::network_error("x").is_retryable());
        assert!(!MundoError::invalid_input("x").is_retryable());
        assert!(!MundoError::cancelled("x").is_retryable());
    }
}
