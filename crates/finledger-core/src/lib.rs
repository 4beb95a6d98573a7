//! Transaction ledger controller
//!
//! Keeps a locally cached, sorted and paginated view of one month of a
//! remote transaction collection, and keeps it consistent across create,
//! update and delete by reloading after every change.

pub mod controller;
pub mod error;
pub mod models;
pub mod notify;
pub mod paginate;
pub mod period;
pub mod remote;
pub mod store;
pub mod summary;

#[cfg(test)]
mod testing;

pub use controller::{ControllerOptions, LedgerController, MutationPhase, MutationReport, Reload};
pub use error::{ErrorCode, ErrorDetails, ErrorSeverity, LedgerError, LedgerResult, MutationKind};
pub use models::{Salary, SalaryDraft, Transaction, TransactionDraft, TransactionKind};
pub use notify::{LogNotifier, Notice, Notifier, NotifierRef};
pub use paginate::{PageView, DEFAULT_PAGE_SIZE};
pub use period::{Period, PeriodSelector};
pub use remote::{RemoteError, RemoteRef, TransactionRemote};
pub use store::{LedgerStore, LoadTicket};
pub use summary::PeriodTotals;

pub use chrono::Month;
pub use rust_decimal::Decimal;
