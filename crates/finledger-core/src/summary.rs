//! Income/expense totals for the viewed period

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Transaction, TransactionKind};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PeriodTotals {
    pub income: Decimal,
    pub expenses: Decimal,
    /// `income - expenses`
    pub balance: Decimal,
    pub count: usize,
    /// Salary recorded for the month, zero when none was set
    pub salary: Decimal,
    /// `balance + salary`
    pub total: Decimal,
}

impl PeriodTotals {
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let mut totals = PeriodTotals::default();
        for tx in transactions {
            match tx.kind {
                TransactionKind::Income => totals.income += tx.amount,
                TransactionKind::Expense => totals.expenses += tx.amount,
            }
            totals.count += 1;
        }
        totals.balance = totals.income - totals.expenses;
        totals.total = totals.balance;
        totals
    }

    pub fn with_salary(mut self, salary: Option<Decimal>) -> Self {
        self.salary = salary.unwrap_or(Decimal::ZERO);
        self.total = self.balance + self.salary;
        self
    }

    /// Month total, salary included, is zero or positive
    pub fn is_surplus(&self) -> bool {
        self.total >= Decimal::ZERO
    }
}
