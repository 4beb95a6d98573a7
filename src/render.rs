//! Plain-text rendering of ledger pages

use finledger_config::CurrencyConfig;
use finledger_core::{Decimal, PageView, PeriodTotals, Transaction, TransactionKind};

const DESCRIPTION_WIDTH: usize = 32;

pub fn money(amount: Decimal, currency: &CurrencyConfig) -> String {
    let places = currency.decimal_places;
    let rounded = amount.round_dp(places);
    currency.format(&format!("{:.*}", places as usize, rounded))
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut short: String = text.chars().take(width.saturating_sub(1)).collect();
    short.push('…');
    short
}

fn row(tx: &Transaction, currency: &CurrencyConfig) -> String {
    let sign = match tx.kind {
        TransactionKind::Income => "+",
        TransactionKind::Expense => "-",
    };
    format!(
        "{:>6}  {}  {:<8}  {:<width$}  {}{}",
        tx.id,
        tx.date.format("%Y-%m-%d %H:%M"),
        tx.kind.to_string(),
        truncate(&tx.description, DESCRIPTION_WIDTH),
        sign,
        money(tx.amount, currency),
        width = DESCRIPTION_WIDTH,
    )
}

/// Page links, current page in brackets
pub fn window(view: &PageView) -> String {
    let mut parts = Vec::new();
    if view.has_previous() {
        parts.push("«".to_string());
    }
    for page in &view.window {
        if *page == view.current_page {
            parts.push(format!("[{}]", page));
        } else {
            parts.push(page.to_string());
        }
    }
    if view.has_next() {
        parts.push("»".to_string());
    }
    parts.join(" ")
}

pub fn totals(totals: &PeriodTotals, currency: &CurrencyConfig) -> String {
    let outcome = if totals.is_surplus() { "surplus" } else { "deficit" };
    format!(
        "Income: {}   Expenses: {}   Balance: {}   ({} transactions)\n\
         Salary: {}   Total: {} ({})",
        money(totals.income, currency),
        money(totals.expenses, currency),
        money(totals.balance, currency),
        totals.count,
        money(totals.salary, currency),
        money(totals.total, currency),
        outcome
    )
}

pub fn page(view: &PageView, currency: &CurrencyConfig) -> String {
    let mut out = format!("{}\n", view.period);
    if view.is_empty() {
        out.push_str("No transactions this month.\n");
    } else {
        out.push_str(&format!(
            "{:>6}  {:<16}  {:<8}  {:<width$}  {}\n",
            "ID",
            "Date",
            "Kind",
            "Description",
            "Amount",
            width = DESCRIPTION_WIDTH
        ));
        for tx in &view.transactions {
            out.push_str(&row(tx, currency));
            out.push('\n');
        }
        out.push_str(&format!(
            "Page {} of {}   {}\n",
            view.current_page,
            view.total_pages,
            window(view)
        ));
    }
    out.push_str(&totals(&view.totals, currency));
    out.push('\n');
    out
}
