//! Contract with the remote transaction store

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{Salary, SalaryDraft, Transaction, TransactionDraft};
use crate::period::Period;

/// Why a remote call did not succeed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteError {
    #[error("not authenticated")]
    Unauthorized,

    #[error("remote store answered {status}: {message}")]
    Status { status: u16, message: String },

    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("unexpected response: {message}")]
    Decode { message: String },
}

impl RemoteError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, RemoteError::Unauthorized)
    }
}

/// Remote reference type
pub type RemoteRef = Arc<dyn TransactionRemote>;

/// Fetch-style access to the authoritative transaction collection
#[async_trait]
pub trait TransactionRemote: Send + Sync {
    /// All transactions dated within `period`, in any order
    async fn list(&self, period: Period) -> Result<Vec<Transaction>, RemoteError>;

    async fn create(&self, draft: &TransactionDraft) -> Result<Transaction, RemoteError>;

    async fn update(&self, id: i64, draft: &TransactionDraft) -> Result<Transaction, RemoteError>;

    async fn delete(&self, id: i64) -> Result<(), RemoteError>;

    /// Salary recorded for `period`, `None` when the store has none
    async fn salary(&self, period: Period) -> Result<Option<Salary>, RemoteError>;

    /// Create or replace the salary of the draft's month
    async fn set_salary(&self, draft: &SalaryDraft) -> Result<Salary, RemoteError>;
}
