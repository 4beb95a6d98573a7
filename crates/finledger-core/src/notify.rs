//! User-facing notifications
//!
//! Every mutation outcome and every error is pushed through a [`Notifier`].
//! The view layer decides how to show them (toast, status line, stderr).

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{ErrorSeverity, LedgerError};

/// A single message for the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub severity: ErrorSeverity,
    pub message: String,
    /// What the user can do about it
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: ErrorSeverity::Info,
            message: message.into(),
            suggestions: Vec::new(),
        }
    }

    pub fn from_error(error: &LedgerError) -> Self {
        let details = error.to_details();
        Self {
            severity: error.severity(),
            message: details.message,
            suggestions: details.suggestions,
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        for suggestion in &self.suggestions {
            write!(f, "\n  hint: {}", suggestion)?;
        }
        Ok(())
    }
}

/// Notifier reference type
pub type NotifierRef = Arc<dyn Notifier>;

/// Receives notices from the controller
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);
}

/// Default notifier using log crate
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: &Notice) {
        match notice.severity {
            ErrorSeverity::Info => log::info!(target: "finledger::notice", "{}", notice),
            ErrorSeverity::Warning => log::warn!(target: "finledger::notice", "{}", notice),
            ErrorSeverity::Error | ErrorSeverity::Critical => {
                log::error!(target: "finledger::notice", "{}", notice)
            }
        }
    }
}
