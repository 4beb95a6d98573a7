//! Ordering and pagination of the cached transactions
//!
//! The order is newest first: date descending, then id descending, so two
//! transactions on the same instant show the later-created one first. Ids
//! are unique, which makes the order total and page slicing repeatable.

use std::cmp::Ordering;
use std::ops::Range;

use serde::Serialize;

use crate::models::Transaction;
use crate::period::Period;
use crate::summary::PeriodTotals;

/// Transactions per page unless configured otherwise
pub const DEFAULT_PAGE_SIZE: usize = 15;

/// Pages shown on each side of the current one
pub const PAGE_WINDOW_RADIUS: usize = 2;

/// Newest first, ties broken by id descending
pub fn compare(a: &Transaction, b: &Transaction) -> Ordering {
    b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id))
}

pub fn sort_transactions(transactions: &mut [Transaction]) {
    transactions.sort_by(compare);
}

/// `ceil(count / page_size)`; zero items means zero pages
pub fn total_pages(count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    (count + page_size - 1) / page_size
}

/// Index range of `page` (1-based), clipped to `count`
pub fn page_bounds(page: usize, page_size: usize, count: usize) -> Range<usize> {
    let start = page.saturating_sub(1).saturating_mul(page_size).min(count);
    let end = page.saturating_mul(page_size).min(count);
    start..end
}

pub fn page_slice<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    &items[page_bounds(page, page_size, items.len())]
}

/// Clamp a requested page to `[1, max(total, 1)]`
pub fn clamp_page(page: usize, total: usize) -> usize {
    page.clamp(1, total.max(1))
}

/// Page numbers to offer around `current`.
///
/// Centered with radius 2; near either end the window slides so that up to
/// five numbers stay visible.
pub fn page_window(current: usize, total: usize) -> Vec<usize> {
    if total == 0 {
        return Vec::new();
    }
    let span = PAGE_WINDOW_RADIUS * 2 + 1;
    let current = clamp_page(current, total);

    let mut start = current.saturating_sub(PAGE_WINDOW_RADIUS).max(1);
    let end = (start + span - 1).min(total);
    if end + 1 - start < span {
        start = (end + 1).saturating_sub(span).max(1);
    }
    (start..=end).collect()
}

/// Snapshot of one page handed to the view layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageView {
    pub period: Period,
    pub current_page: usize,
    pub total_pages: usize,
    pub total_count: usize,
    pub page_size: usize,
    pub window: Vec<usize>,
    pub transactions: Vec<Transaction>,
    pub totals: PeriodTotals,
}

impl PageView {
    /// Build the view of `page` over an already sorted collection
    pub fn build(period: Period, sorted: &[Transaction], page: usize, page_size: usize) -> Self {
        let total = total_pages(sorted.len(), page_size);
        Self {
            period,
            current_page: page,
            total_pages: total,
            total_count: sorted.len(),
            page_size,
            window: page_window(page, total),
            transactions: page_slice(sorted, page, page_size).to_vec(),
            totals: PeriodTotals::from_transactions(sorted),
        }
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }
}
