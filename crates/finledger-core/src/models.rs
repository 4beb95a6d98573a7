//! Core data models for the ledger

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};
use crate::period::Period;

/// Transaction kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money going out
    Expense,
    /// Money coming in
    Income,
}

impl Default for TransactionKind {
    fn default() -> Self {
        TransactionKind::Expense
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "expense" | "expenses" => Ok(TransactionKind::Expense),
            "income" => Ok(TransactionKind::Income),
            _ => Err(format!("Invalid transaction kind: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::Expense => write!(f, "expense"),
            TransactionKind::Income => write!(f, "income"),
        }
    }
}

/// A transaction as held by the remote store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Server-assigned identifier
    pub id: i64,
    /// Expense or income
    pub kind: TransactionKind,
    /// Non-negative amount
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// When the transaction happened
    #[serde(with = "wire_datetime")]
    pub date: NaiveDateTime,
}

impl Transaction {
    /// Amount with the sign implied by the kind
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }

    /// Calendar day of the transaction
    pub fn day(&self) -> NaiveDate {
        self.date.date()
    }
}

/// Create/update payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub kind: TransactionKind,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub description: String,
    /// Left to the remote store (current time) when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl TransactionDraft {
    pub fn new(kind: TransactionKind, amount: Decimal, description: impl Into<String>) -> Self {
        Self {
            kind,
            amount,
            description: description.into(),
            date: None,
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Client-side checks run before anything is sent
    pub fn validate(&self) -> LedgerResult<()> {
        if self.amount <= Decimal::ZERO {
            return Err(LedgerError::Validation {
                field: "amount",
                message: "Amount must be greater than 0".to_string(),
            });
        }

        if self.description.trim().is_empty() {
            return Err(LedgerError::Validation {
                field: "description",
                message: "Description is required".to_string(),
            });
        }

        Ok(())
    }
}

/// Salary recorded for one month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Salary {
    pub id: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub month: u32,
    pub year: i32,
}

impl Salary {
    pub fn is_for(&self, period: Period) -> bool {
        self.month == period.month && self.year == period.year
    }
}

/// Create-or-replace payload for a month's salary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryDraft {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub month: u32,
    pub year: i32,
}

impl SalaryDraft {
    pub fn new(period: Period, amount: Decimal) -> Self {
        Self {
            amount,
            month: period.month,
            year: period.year,
        }
    }

    pub fn validate(&self) -> LedgerResult<()> {
        if self.amount <= Decimal::ZERO {
            return Err(LedgerError::Validation {
                field: "amount",
                message: "Salary must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Timestamp formats accepted from the remote store
mod wire_datetime {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn serialize<S: Serializer>(date: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", raw)))
    }

    pub(super) fn parse(raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(dt);
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M") {
            return Some(dt);
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.naive_utc());
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    }
}
