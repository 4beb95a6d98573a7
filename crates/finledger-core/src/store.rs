//! In-memory cache of the viewed period's transactions
//!
//! The cache is only ever replaced wholesale by the result of a fetch.
//! Each fetch takes a [`LoadTicket`] carrying a generation number; a result
//! is applied only if its ticket is still the newest one issued, so a slow
//! response for an old request cannot overwrite a fresher one.

use crate::models::Transaction;
use crate::paginate::sort_transactions;
use crate::period::Period;

/// Proof of a fetch in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub generation: u64,
    pub period: Period,
}

#[derive(Debug, Default)]
pub struct LedgerStore {
    /// Period the cached rows belong to, `None` before the first load
    period: Option<Period>,
    transactions: Vec<Transaction>,
    issued: u64,
}

impl LedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket for a fetch of `period`
    pub fn begin_load(&mut self, period: Period) -> LoadTicket {
        self.issued += 1;
        log::debug!("load #{} issued for {}", self.issued, period);
        LoadTicket {
            generation: self.issued,
            period,
        }
    }

    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.generation == self.issued
    }

    /// Replace the cache with `rows` if the ticket is still current
    pub fn apply(&mut self, ticket: LoadTicket, mut rows: Vec<Transaction>) -> bool {
        if !self.is_current(&ticket) {
            log::warn!(
                "dropping stale load #{} for {} (latest is #{})",
                ticket.generation,
                ticket.period,
                self.issued
            );
            return false;
        }
        sort_transactions(&mut rows);
        log::debug!("load #{} applied: {} transactions", ticket.generation, rows.len());
        self.transactions = rows;
        self.period = Some(ticket.period);
        true
    }

    /// Record a failed fetch.
    ///
    /// With a current ticket the cache is emptied, unless `keep_stale` is set
    /// and the cached rows already belong to the ticket's period. Stale
    /// tickets leave everything untouched.
    pub fn fail(&mut self, ticket: LoadTicket, keep_stale: bool) -> bool {
        if !self.is_current(&ticket) {
            log::debug!("ignoring failure of stale load #{}", ticket.generation);
            return false;
        }
        if keep_stale && self.period == Some(ticket.period) {
            log::warn!(
                "load #{} failed, keeping {} cached transactions for {}",
                ticket.generation,
                self.transactions.len(),
                ticket.period
            );
        } else {
            log::warn!("load #{} failed, cache for {} is empty", ticket.generation, ticket.period);
            self.transactions.clear();
            self.period = Some(ticket.period);
        }
        true
    }

    pub fn period(&self) -> Option<Period> {
        self.period
    }

    /// Cached rows in display order
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}
