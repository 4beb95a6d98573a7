//! Error types for finledger-core
//!
//! Three failures reach the view layer: validation (nothing was sent),
//! fetch (a load or reload failed) and mutation (create, update or delete
//! was rejected or never arrived). Each carries a code, a severity and a
//! list of suggestions for the notification shown to the user.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::period::Period;
use crate::remote::RemoteError;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Client-side validation failed
    ValidationError,
    /// Loading the period failed
    FetchFailed,
    /// Create, update or delete failed
    MutationFailed,
    /// The remote store rejected the credential
    Unauthorized,
    /// Month outside 1..=12
    InvalidPeriod,
    /// Page size of zero
    InvalidPageSize,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::ValidationError => write!(f, "VALIDATION_ERROR"),
            ErrorCode::FetchFailed => write!(f, "FETCH_FAILED"),
            ErrorCode::MutationFailed => write!(f, "MUTATION_FAILED"),
            ErrorCode::Unauthorized => write!(f, "UNAUTHORIZED"),
            ErrorCode::InvalidPeriod => write!(f, "INVALID_PERIOD"),
            ErrorCode::InvalidPageSize => write!(f, "INVALID_PAGE_SIZE"),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Informational
    Info,
    /// Warning - operation may be affected
    Warning,
    /// Error - operation failed
    Error,
    /// Critical - the controller cannot work
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

/// Which mutation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MutationKind::Create => write!(f, "create"),
            MutationKind::Update => write!(f, "update"),
            MutationKind::Delete => write!(f, "delete"),
        }
    }
}

/// Detailed error information for notifications
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
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            details: None,
            suggestions: vec![],
        }
    }

    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.details = Some(detail);
        self
    }

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

/// Main error type for finledger-core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("Could not load transactions for {period}: {source}")]
    Fetch {
        period: Period,
        #[source]
        source: RemoteError,
    },

    #[error("Could not {operation} transaction: {source}")]
    Mutation {
        operation: MutationKind,
        #[source]
        source: RemoteError,
    },

    #[error("Could not load salary for {period}: {source}")]
    SalaryFetch {
        period: Period,
        #[source]
        source: RemoteError,
    },

    #[error("Could not save salary for {period}: {source}")]
    SalarySave {
        period: Period,
        #[source]
        source: RemoteError,
    },

    #[error("Invalid period: month {month} of {year}")]
    InvalidPeriod { month: u32, year: i32 },

    #[error("Invalid page size: {size}")]
    InvalidPageSize { size: usize },
}

impl LedgerError {
    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            LedgerError::Validation { .. } => ErrorCode::ValidationError,
            LedgerError::Fetch { source, .. }
            | LedgerError::Mutation { source, .. }
            | LedgerError::SalaryFetch { source, .. }
            | LedgerError::SalarySave { source, .. }
                if source.is_unauthorized() =>
            {
                ErrorCode::Unauthorized
            }
            LedgerError::Fetch { .. } | LedgerError::SalaryFetch { .. } => ErrorCode::FetchFailed,
            LedgerError::Mutation { .. } | LedgerError::SalarySave { .. } => ErrorCode::MutationFailed,
            LedgerError::InvalidPeriod { .. } => ErrorCode::InvalidPeriod,
            LedgerError::InvalidPageSize { .. } => ErrorCode::InvalidPageSize,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self.code() {
            ErrorCode::ValidationError => ErrorSeverity::Warning,
            ErrorCode::Unauthorized => ErrorSeverity::Warning,
            ErrorCode::FetchFailed => ErrorSeverity::Error,
            ErrorCode::MutationFailed => ErrorSeverity::Error,
            ErrorCode::InvalidPeriod => ErrorSeverity::Error,
            ErrorCode::InvalidPageSize => ErrorSeverity::Critical,
        }
    }

    /// True when the remote store answered 401
    pub fn is_unauthorized(&self) -> bool {
        self.code() == ErrorCode::Unauthorized
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        if self.is_unauthorized() {
            return details.with_suggestion("Log in again to refresh your session.".to_string());
        }

        match self {
            LedgerError::Validation { field, message } => {
                details = details.with_detail(serde_json::json!({ "field": field }));
                details = details.with_suggestion(message.clone());
            }
            LedgerError::Fetch { period, .. } | LedgerError::SalaryFetch { period, .. } => {
                details = details.with_detail(serde_json::json!({
                    "month": period.month,
                    "year": period.year,
                }));
                details = details.with_suggestion(
                    "Reload the period to try again.".to_string(),
                );
            }
            LedgerError::Mutation { operation, .. } => {
                details = details.with_suggestion(format!(
                    "Nothing was changed locally; retry the {} when the store is reachable.",
                    operation
                ));
            }
            LedgerError::SalarySave { period, .. } => {
                details = details.with_detail(serde_json::json!({
                    "month": period.month,
                    "year": period.year,
                }));
                details = details.with_suggestion(
                    "The previous salary is still in place; save it again to retry.".to_string(),
                );
            }
            _ => {}
        }

        details
    }
}

/// Result type with LedgerError
pub type LedgerResult<T> = Result<T, LedgerError>;

// ==================== Tests ====================
