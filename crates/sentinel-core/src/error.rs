//! Error types for sentinel-core
//!
//! Feed, filter and navigation operations are total and never fail; the
//! errors below cover the fallible edges: transaction sources, replay
//! files, threshold injection and the session command channel.

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Transaction violates a data-model invariant
    InvalidTransaction,
    /// Risk thresholds do not partition 0..=100
    InvalidThresholds,
    /// Transaction source failed
    SourceError,
    /// File not found
    FileNotFound,
    /// Invalid data format
    InvalidFormat,
    /// IO error
    IoError,
    /// Configuration error
    ConfigError,
    /// Session task is gone
    SessionClosed,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::InvalidTransaction => write!(f, "INVALID_TRANSACTION"),
            ErrorCode::InvalidThresholds => write!(f, "INVALID_THRESHOLDS"),
            ErrorCode::SourceError => write!(f, "SOURCE_ERROR"),
            ErrorCode::FileNotFound => write!(f, "FILE_NOT_FOUND"),
            ErrorCode::InvalidFormat => write!(f, "INVALID_FORMAT"),
            ErrorCode::IoError => write!(f, "IO_ERROR"),
            ErrorCode::ConfigError => write!(f, "CONFIG_ERROR"),
            ErrorCode::SessionClosed => write!(f, "SESSION_CLOSED"),
        }
    }
}

/// Detailed error information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Suggestions for resolution
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ErrorDetails {
    /// Create a new error detail
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            details: None,
            suggestions: vec![],
        }
    }

    /// Add detail information
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.details = Some(detail);
        self
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, "\nDetails: {}", details)?;
        }
        if !self.suggestions.is_empty() {
            write!(f, "\nSuggestions:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n  - {}", suggestion)?;
            }
        }
        Ok(())
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Informational
    Info,
    /// Warning - the feed keeps running
    Warning,
    /// Error - operation failed
    Error,
    /// Critical - the session cannot start
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "info"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
            ErrorSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// Main error type for sentinel-core
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid transaction {id}: {reason}")]
    InvalidTransaction { id: String, reason: String },

    #[error("Invalid risk thresholds: medium={medium}, high={high}")]
    InvalidThresholds { medium: u8, high: u8 },

    #[error("Transaction source error: {message}")]
    SourceError { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    #[error("IO error occurred")]
    IoError,

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Feed session is closed")]
    SessionClosed,
}

impl CoreError {
    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::InvalidTransaction { .. } => ErrorCode::InvalidTransaction,
            CoreError::InvalidThresholds { .. } => ErrorCode::InvalidThresholds,
            CoreError::SourceError { .. } => ErrorCode::SourceError,
            CoreError::FileNotFound { .. } => ErrorCode::FileNotFound,
            CoreError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            CoreError::IoError => ErrorCode::IoError,
            CoreError::ConfigError { .. } => ErrorCode::ConfigError,
            CoreError::SessionClosed => ErrorCode::SessionClosed,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::InvalidTransaction { .. } => ErrorSeverity::Warning,
            CoreError::InvalidThresholds { .. } => ErrorSeverity::Critical,
            CoreError::SourceError { .. } => ErrorSeverity::Warning,
            CoreError::FileNotFound { .. } => ErrorSeverity::Error,
            CoreError::InvalidFormat { .. } => ErrorSeverity::Error,
            CoreError::IoError => ErrorSeverity::Error,
            CoreError::ConfigError { .. } => ErrorSeverity::Critical,
            CoreError::SessionClosed => ErrorSeverity::Info,
        }
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            CoreError::InvalidTransaction { id, reason } => {
                details = details.with_detail(serde_json::json!({ "id": id, "reason": reason }));
                details = details.with_suggestion(
                    "Risk scores must be within 0-100 and match the transaction status.".to_string()
                );
            }
            CoreError::InvalidThresholds { .. } => {
                details = details.with_suggestion(
                    "Use 0 < medium_risk_score < high_risk_score <= 100.".to_string()
                );
            }
            CoreError::SourceError { .. } => {
                details = details.with_suggestion(
                    "The feed skips this tick and retries on the next one.".to_string()
                );
            }
            CoreError::FileNotFound { .. } => {
                details = details.with_suggestion(
                    "Check source.path in the configuration file.".to_string()
                );
            }
            CoreError::InvalidFormat { message } => {
                details = details.with_detail(serde_json::json!({ "parse_message": message }));
                details = details.with_suggestion(
                    "Replay files must contain a JSON array of transactions.".to_string()
                );
            }
            _ => {}
        }

        details
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl From<io::Error> for CoreError {
    fn from(_error: io::Error) -> Self {
        CoreError::IoError
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(error: serde_json::Error) -> Self {
        CoreError::InvalidFormat {
            message: error.to_string(),
        }
    }
}

impl From<sentinel_config::ConfigError> for CoreError {
    fn from(error: sentinel_config::ConfigError) -> Self {
        CoreError::ConfigError {
            message: error.to_string(),
        }
    }
}

/// Error context for reporting
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Operation being performed
    pub operation: String,
    /// Additional context data
    pub data: serde_json::Value,
}

impl ErrorContext {
    /// Create a new error context
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            data: serde_json::json!({}),
        }
    }

    /// Add context data
    pub fn with_data(mut self, key: &str, value: serde_json::Value) -> Self {
        self.data[key] = value;
        self
    }
}

/// Error logger trait
pub trait ErrorLogger: Send + Sync {
    /// Log an error
    fn log_error(&self, error: &CoreError, context: &ErrorContext);
    /// Log a warning
    fn log_warning(&self, message: &str, context: &ErrorContext);
}

/// Default error logger using log crate
#[derive(Default)]
pub struct DefaultErrorLogger;

impl ErrorLogger for DefaultErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext) {
        match error.severity() {
            ErrorSeverity::Info | ErrorSeverity::Warning => log::warn!(
                target: "sentinel::error",
                "{} - Operation: {} - Context: {}",
                error.to_details(),
                context.operation,
                context.data
            ),
            ErrorSeverity::Error | ErrorSeverity::Critical => log::error!(
                target: "sentinel::error",
                "{} - Operation: {} - Context: {}",
                error.to_details(),
                context.operation,
                context.data
            ),
        }
    }

    fn log_warning(&self, message: &str, context: &ErrorContext) {
        log::warn!(
            target: "sentinel::error",
            "WARNING: {} - Operation: {}",
            message,
            context.operation
        );
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::InvalidTransaction.to_string(), "INVALID_TRANSACTION");
        assert_eq!(ErrorCode::SourceError.to_string(), "SOURCE_ERROR");
        assert_eq!(ErrorCode::SessionClosed.to_string(), "SESSION_CLOSED");
    }

    #[test]
    fn test_core_error_code_and_severity() {
        let error = CoreError::InvalidThresholds { medium: 70, high: 40 };
        assert_eq!(error.code(), ErrorCode::InvalidThresholds);
        assert_eq!(error.severity(), ErrorSeverity::Critical);

        let error = CoreError::SourceError { message: "timeout".to_string() };
        assert_eq!(error.severity(), ErrorSeverity::Warning);
    }

    #[test]
    fn test_error_details_invalid_transaction() {
        let error = CoreError::InvalidTransaction {
            id: "TXN-9".to_string(),
            reason: "risk score 140 is above 100".to_string(),
        };
        let details = error.to_details();
        assert_eq!(details.code, ErrorCode::InvalidTransaction);
        assert!(details.details.is_some());
        assert!(!details.suggestions.is_empty());
        assert!(details.message.contains("TXN-9"));
    }

    #[test]
    fn test_from_json_error() {
        let err = serde_json::from_str::<Vec<u8>>("{").unwrap_err();
        let error: CoreError = err.into();
        assert_eq!(error.code(), ErrorCode::InvalidFormat);
    }

    #[test]
    fn test_from_config_error() {
        let error: CoreError = sentinel_config::ConfigError::InvalidYaml.into();
        assert_eq!(error.code(), ErrorCode::ConfigError);
    }

    #[test]
    fn test_error_context() {
        let context = ErrorContext::new("ingest")
            .with_data("tick", serde_json::json!(4));
        assert_eq!(context.operation, "ingest");
        assert_eq!(context.data["tick"], 4);
    }
}
