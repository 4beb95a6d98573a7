//! In-memory remote store for controller tests

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::models::{Salary, SalaryDraft, Transaction, TransactionDraft, TransactionKind};
use crate::notify::{Notice, Notifier};
use crate::period::Period;
use crate::remote::{RemoteError, TransactionRemote};

pub fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

/// Undated expense draft
pub fn draft(amount: &str, description: &str) -> TransactionDraft {
    TransactionDraft::new(TransactionKind::Expense, Decimal::from_str(amount).unwrap(), description)
}

#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    List(Period),
    Create(TransactionDraft),
    Update(i64, TransactionDraft),
    Delete(i64),
    Salary(Period),
    SetSalary(SalaryDraft),
}

#[derive(Default)]
struct Inner {
    rows: Vec<Transaction>,
    salaries: Vec<Salary>,
    next_id: i64,
    now: Option<NaiveDateTime>,
    calls: Vec<RemoteCall>,
    list_failure: Option<RemoteError>,
    mutation_failure: Option<RemoteError>,
    gate: Option<Arc<Notify>>,
}

#[derive(Default)]
pub struct FakeRemote {
    inner: Mutex<Inner>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, id: i64, date: NaiveDateTime) {
        self.seed_kind(id, TransactionKind::Expense, "10.00", date);
    }

    pub fn seed_kind(&self, id: i64, kind: TransactionKind, amount: &str, date: NaiveDateTime) {
        let mut inner = self.inner.lock().unwrap();
        inner.rows.push(Transaction {
            id,
            kind,
            amount: Decimal::from_str(amount).unwrap(),
            description: format!("seed {}", id),
            date,
        });
        inner.next_id = inner.next_id.max(id);
    }

    pub fn seed_salary(&self, period: Period, amount: &str) {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.salaries.len() as i64 + 1;
        inner.salaries.push(Salary {
            id,
            amount: Decimal::from_str(amount).unwrap(),
            month: period.month,
            year: period.year,
        });
    }

    /// Timestamp given to drafts without a date
    pub fn set_now(&self, now: NaiveDateTime) {
        self.inner.lock().unwrap().now = Some(now);
    }

    pub fn fail_lists(&self, error: RemoteError) {
        self.inner.lock().unwrap().list_failure = Some(error);
    }

    pub fn fail_mutations(&self, error: RemoteError) {
        self.inner.lock().unwrap().mutation_failure = Some(error);
    }

    pub fn recover(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.list_failure = None;
        inner.mutation_failure = None;
    }

    /// Park the next `list` call until the returned handle is notified
    pub fn hold_next_list(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.inner.lock().unwrap().gate = Some(gate.clone());
        gate
    }

    pub async fn wait_for_calls(&self, count: usize) {
        while self.calls().len() < count {
            tokio::task::yield_now().await;
        }
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Rows held by the store across all periods
    pub fn stored(&self) -> usize {
        self.inner.lock().unwrap().rows.len()
    }

    fn mutation_failure(&self, call: RemoteCall) -> Option<RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(call);
        inner.mutation_failure.clone()
    }

    fn stamp(&self, draft: &TransactionDraft, fallback: NaiveDateTime) -> NaiveDateTime {
        draft
            .date
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap_or(fallback)
    }
}

#[async_trait]
impl TransactionRemote for FakeRemote {
    async fn list(&self, period: Period) -> Result<Vec<Transaction>, RemoteError> {
        let (result, gate) = {
            let mut inner = self.inner.lock().unwrap();
            inner.calls.push(RemoteCall::List(period));
            let result = match inner.list_failure.clone() {
                Some(error) => Err(error),
                None => Ok(inner
                    .rows
                    .iter()
                    .filter(|t| period.contains(&t.date))
                    .cloned()
                    .collect()),
            };
            (result, inner.gate.take())
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        result
    }

    async fn create(&self, draft: &TransactionDraft) -> Result<Transaction, RemoteError> {
        if let Some(error) = self.mutation_failure(RemoteCall::Create(draft.clone())) {
            return Err(error);
        }
        let now = self.inner.lock().unwrap().now.unwrap_or_else(|| at(2025, 10, 15, 12));
        let date = self.stamp(draft, now);
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let record = Transaction {
            id: inner.next_id,
            kind: draft.kind,
            amount: draft.amount,
            description: draft.description.clone(),
            date,
        };
        inner.rows.push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: i64, draft: &TransactionDraft) -> Result<Transaction, RemoteError> {
        if let Some(error) = self.mutation_failure(RemoteCall::Update(id, draft.clone())) {
            return Err(error);
        }
        let mut inner = self.inner.lock().unwrap();
        let row = inner
            .rows
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(RemoteError::Status { status: 404, message: "not found".to_string() })?;
        row.kind = draft.kind;
        row.amount = draft.amount;
        row.description = draft.description.clone();
        if let Some(date) = draft.date.and_then(|d| d.and_hms_opt(12, 0, 0)) {
            row.date = date;
        }
        Ok(row.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), RemoteError> {
        if let Some(error) = self.mutation_failure(RemoteCall::Delete(id)) {
            return Err(error);
        }
        let mut inner = self.inner.lock().unwrap();
        let before = inner.rows.len();
        inner.rows.retain(|t| t.id != id);
        if inner.rows.len() == before {
            return Err(RemoteError::Status { status: 404, message: "not found".to_string() });
        }
        Ok(())
    }

    async fn salary(&self, period: Period) -> Result<Option<Salary>, RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(RemoteCall::Salary(period));
        if let Some(error) = inner.list_failure.clone() {
            return Err(error);
        }
        Ok(inner.salaries.iter().find(|s| s.is_for(period)).cloned())
    }

    async fn set_salary(&self, draft: &SalaryDraft) -> Result<Salary, RemoteError> {
        if let Some(error) = self.mutation_failure(RemoteCall::SetSalary(draft.clone())) {
            return Err(error);
        }
        let mut inner = self.inner.lock().unwrap();
        let next_id = inner.salaries.len() as i64 + 1;
        inner
            .salaries
            .retain(|s| !(s.month == draft.month && s.year == draft.year));
        let salary = Salary {
            id: next_id,
            amount: draft.amount,
            month: draft.month,
            year: draft.year,
        };
        inner.salaries.push(salary.clone());
        Ok(salary)
    }
}

/// Keeps every notice in memory, newest last
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices().pop()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: &Notice) {
        self.notices.lock().unwrap().push(notice.clone());
    }
}
