//! Ledger controller: period selection, reloads and mutations
//!
//! One controller owns one [`LedgerState`]. Several controllers can run side
//! by side against the same or different remotes. The state lives behind a
//! mutex that is never held across an `.await`, so overlapping operations can
//! interleave; the store's generation counter decides which reload wins.
//!
//! Every mutation is confirmed by a full reload of the active period. Nothing
//! is patched into the cache locally.

use chrono::Month;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use finledger_config::Config;

use crate::error::{LedgerError, LedgerResult, MutationKind};
use crate::models::{Salary, SalaryDraft, Transaction, TransactionDraft};
use crate::notify::{LogNotifier, Notice, NotifierRef};
use crate::paginate::{clamp_page, total_pages, PageView, DEFAULT_PAGE_SIZE};
use crate::period::{Period, PeriodSelector};
use crate::remote::{RemoteError, RemoteRef};
use crate::store::LedgerStore;
use crate::summary::PeriodTotals;

/// Tunables read from the `pagination` and `ledger` config sections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    pub page_size: usize,
    /// Apply the create drift rule to updates as well
    pub follow_updates: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            follow_updates: false,
        }
    }
}

impl From<&Config> for ControllerOptions {
    fn from(config: &Config) -> Self {
        Self {
            page_size: config.pagination.page_size,
            follow_updates: config.ledger.follow_updates,
        }
    }
}

/// Where a mutation currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationPhase {
    Idle,
    Validating,
    Submitting,
    Reloading,
}

/// Result of a reload that reached the remote store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reload {
    /// The cache now holds `count` transactions
    Applied { count: usize },
    /// A newer reload was issued meanwhile; this result was dropped
    Superseded,
}

/// Outcome of a create, update or delete that the remote store accepted
#[derive(Debug, Clone, PartialEq)]
pub struct MutationReport {
    pub operation: MutationKind,
    /// Record returned by the store (none for deletes)
    pub record: Option<Transaction>,
    /// Period the view moved to, if the record landed outside the old one
    pub drifted_to: Option<Period>,
    /// The follow-up reload; a failure here does not undo the mutation
    pub reload: LedgerResult<Reload>,
}

/// What to do with the current page once a reload settles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PagePolicy {
    Reset,
    Clamp,
}

/// Everything a ledger view needs to remember
#[derive(Debug)]
pub struct LedgerState {
    selector: PeriodSelector,
    store: LedgerStore,
    current_page: usize,
    phase: MutationPhase,
    /// Last salary seen, possibly for an earlier period
    salary: Option<Salary>,
}

impl LedgerState {
    fn new(period: Period) -> Self {
        Self {
            selector: PeriodSelector::new(period),
            store: LedgerStore::new(),
            current_page: 1,
            phase: MutationPhase::Idle,
            salary: None,
        }
    }

    fn salary_amount(&self) -> Option<Decimal> {
        let period = self.selector.period();
        self.salary.as_ref().filter(|s| s.is_for(period)).map(|s| s.amount)
    }
}

pub struct LedgerController {
    remote: RemoteRef,
    notifier: NotifierRef,
    options: ControllerOptions,
    state: Mutex<LedgerState>,
}

impl LedgerController {
    /// Create a controller viewing `period`. Nothing is fetched until [`load`](Self::load).
    pub fn new(remote: RemoteRef, period: Period, options: ControllerOptions) -> LedgerResult<Self> {
        if options.page_size == 0 {
            return Err(LedgerError::InvalidPageSize { size: 0 });
        }
        Ok(Self {
            remote,
            notifier: Arc::new(LogNotifier),
            options,
            state: Mutex::new(LedgerState::new(period)),
        })
    }

    pub fn with_notifier(mut self, notifier: NotifierRef) -> Self {
        self.notifier = notifier;
        self
    }

    fn state(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_phase(&self, phase: MutationPhase) {
        self.state().phase = phase;
    }

    fn report(&self, error: &LedgerError) {
        self.notifier.notify(&Notice::from_error(error));
    }

    // ==================== Reads ====================

    pub fn period(&self) -> Period {
        self.state().selector.period()
    }

    pub fn current_page(&self) -> usize {
        self.state().current_page
    }

    pub fn page_size(&self) -> usize {
        self.options.page_size
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.state().store.len(), self.options.page_size)
    }

    pub fn phase(&self) -> MutationPhase {
        self.state().phase
    }

    /// The whole cached period in display order
    pub fn transactions(&self) -> Vec<Transaction> {
        self.state().store.transactions().to_vec()
    }

    /// Totals of the cached month, salary included once loaded
    pub fn totals(&self) -> PeriodTotals {
        let state = self.state();
        PeriodTotals::from_transactions(state.store.transactions()).with_salary(state.salary_amount())
    }

    /// Snapshot of the current page
    pub fn page(&self) -> PageView {
        let state = self.state();
        let mut view = PageView::build(
            state.selector.period(),
            state.store.transactions(),
            state.current_page,
            self.options.page_size,
        );
        view.totals = view.totals.with_salary(state.salary_amount());
        view
    }

    /// Salary of the viewed period, if loaded
    pub fn salary(&self) -> Option<Salary> {
        let state = self.state();
        let period = state.selector.period();
        state.salary.clone().filter(|s| s.is_for(period))
    }

    // ==================== Navigation ====================

    /// Jump to `page`, clamped to the available pages. Returns the page shown.
    pub fn go_to_page(&self, page: usize) -> usize {
        let mut state = self.state();
        let total = total_pages(state.store.len(), self.options.page_size);
        state.current_page = clamp_page(page, total);
        state.current_page
    }

    pub fn next_page(&self) -> usize {
        let current = self.current_page();
        self.go_to_page(current + 1)
    }

    pub fn previous_page(&self) -> usize {
        let current = self.current_page();
        self.go_to_page(current.saturating_sub(1))
    }

    // ==================== Loading ====================

    /// Fetch the active period, replacing the cache. On failure the cache is empty.
    pub async fn load(&self) -> LedgerResult<Reload> {
        self.fetch(PagePolicy::Clamp, false).await
    }

    /// Switch to another month of the viewed year and reload from page 1
    pub async fn set_month(&self, month: Month) -> LedgerResult<Reload> {
        {
            let mut state = self.state();
            state.selector.set_month(month);
            state.current_page = 1;
        }
        self.fetch(PagePolicy::Reset, false).await
    }

    /// Switch to any period and reload from page 1
    pub async fn set_period(&self, period: Period) -> LedgerResult<Reload> {
        {
            let mut state = self.state();
            state.selector.set_period(period);
            state.current_page = 1;
        }
        self.fetch(PagePolicy::Reset, false).await
    }

    async fn fetch(&self, policy: PagePolicy, keep_stale: bool) -> LedgerResult<Reload> {
        let ticket = {
            let mut state = self.state();
            let period = state.selector.period();
            state.store.begin_load(period)
        };

        let result = self.remote.list(ticket.period).await;

        let outcome = {
            let mut state = self.state();
            match result {
                Ok(rows) => {
                    let count = rows.len();
                    if state.store.apply(ticket, rows) {
                        Self::settle_page(&mut state, policy, self.options.page_size);
                        Ok(Reload::Applied { count })
                    } else {
                        Ok(Reload::Superseded)
                    }
                }
                Err(source) => {
                    if state.store.fail(ticket, keep_stale) {
                        Self::settle_page(&mut state, policy, self.options.page_size);
                        Err(LedgerError::Fetch {
                            period: ticket.period,
                            source,
                        })
                    } else {
                        Ok(Reload::Superseded)
                    }
                }
            }
        };

        if let Err(ref error) = outcome {
            self.report(error);
        }
        outcome
    }

    fn settle_page(state: &mut LedgerState, policy: PagePolicy, page_size: usize) {
        state.current_page = match policy {
            PagePolicy::Reset => 1,
            PagePolicy::Clamp => clamp_page(state.current_page, total_pages(state.store.len(), page_size)),
        };
    }

    // ==================== Mutations ====================

    /// Create a transaction and reload.
    ///
    /// If the new record is dated in another month of the same year the view
    /// moves to that month. A record in another year does not move the view.
    pub async fn create(&self, draft: TransactionDraft) -> LedgerResult<MutationReport> {
        self.validate(&draft)?;

        self.set_phase(MutationPhase::Submitting);
        let record = match self.remote.create(&draft).await {
            Ok(record) => record,
            Err(source) => return Err(self.abort(MutationKind::Create, source)),
        };
        log::info!("created transaction {} dated {}", record.id, record.date);
        self.notifier.notify(&Notice::info("Transaction saved"));

        let drifted_to = self.follow(&record);
        self.finish(MutationKind::Create, Some(record), drifted_to, PagePolicy::Reset)
            .await
    }

    /// Update a transaction and reload.
    ///
    /// The view stays on the active period even if the new date moves the
    /// record out of it, unless `follow_updates` is enabled.
    pub async fn update(&self, id: i64, draft: TransactionDraft) -> LedgerResult<MutationReport> {
        self.validate(&draft)?;

        self.set_phase(MutationPhase::Submitting);
        let record = match self.remote.update(id, &draft).await {
            Ok(record) => record,
            Err(source) => return Err(self.abort(MutationKind::Update, source)),
        };
        log::info!("updated transaction {}", record.id);
        self.notifier.notify(&Notice::info("Transaction updated"));

        let drifted_to = if self.options.follow_updates {
            self.follow(&record)
        } else {
            None
        };
        let policy = if drifted_to.is_some() {
            PagePolicy::Reset
        } else {
            PagePolicy::Clamp
        };
        self.finish(MutationKind::Update, Some(record), drifted_to, policy)
            .await
    }

    /// Delete a transaction and reload. The caller is expected to have
    /// asked the user for confirmation.
    pub async fn delete(&self, id: i64) -> LedgerResult<MutationReport> {
        self.set_phase(MutationPhase::Submitting);
        if let Err(source) = self.remote.delete(id).await {
            return Err(self.abort(MutationKind::Delete, source));
        }
        log::info!("deleted transaction {}", id);
        self.notifier.notify(&Notice::info("Transaction deleted"));

        self.finish(MutationKind::Delete, None, None, PagePolicy::Clamp)
            .await
    }

    // ==================== Salary ====================

    /// Fetch the salary of the viewed period. A month without one is `Ok(None)`.
    pub async fn load_salary(&self) -> LedgerResult<Option<Salary>> {
        let period = self.period();
        let result = self.remote.salary(period).await;

        let outcome = {
            let mut state = self.state();
            let current = state.selector.period() == period;
            match result {
                Ok(salary) => {
                    if current {
                        state.salary = salary.clone();
                    }
                    Ok(salary)
                }
                Err(source) => {
                    if current {
                        state.salary = None;
                    }
                    Err(LedgerError::SalaryFetch { period, source })
                }
            }
        };

        if let Err(ref error) = outcome {
            self.report(error);
        }
        outcome
    }

    /// Create or replace the salary of the viewed period
    pub async fn set_salary(&self, amount: Decimal) -> LedgerResult<Salary> {
        let period = self.period();
        let draft = SalaryDraft::new(period, amount);
        if let Err(error) = draft.validate() {
            self.report(&error);
            return Err(error);
        }

        match self.remote.set_salary(&draft).await {
            Ok(salary) => {
                log::info!("salary for {} set to {}", period, salary.amount);
                self.state().salary = Some(salary.clone());
                self.notifier.notify(&Notice::info("Salary saved"));
                Ok(salary)
            }
            Err(source) => {
                let error = LedgerError::SalarySave { period, source };
                log::warn!("{}", error);
                self.report(&error);
                Err(error)
            }
        }
    }

    fn validate(&self, draft: &TransactionDraft) -> LedgerResult<()> {
        self.set_phase(MutationPhase::Validating);
        if let Err(error) = draft.validate() {
            self.set_phase(MutationPhase::Idle);
            self.report(&error);
            return Err(error);
        }
        Ok(())
    }

    fn abort(&self, operation: MutationKind, source: RemoteError) -> LedgerError {
        self.set_phase(MutationPhase::Idle);
        let error = LedgerError::Mutation { operation, source };
        log::warn!("{}", error);
        self.report(&error);
        error
    }

    /// Move the view to the record's month when it drifted within the same year
    fn follow(&self, record: &Transaction) -> Option<Period> {
        let mut state = self.state();
        let active = state.selector.period();
        let target = Period::containing(&record.date);
        if target.year == active.year && target.month != active.month {
            log::info!("transaction {} is dated in {}, leaving {}", record.id, target, active);
            state.selector.set_period(target);
            Some(target)
        } else {
            if target.year != active.year {
                log::debug!(
                    "transaction {} is dated in {}, not switching years",
                    record.id,
                    target
                );
            }
            None
        }
    }

    async fn finish(
        &self,
        operation: MutationKind,
        record: Option<Transaction>,
        drifted_to: Option<Period>,
        policy: PagePolicy,
    ) -> LedgerResult<MutationReport> {
        self.set_phase(MutationPhase::Reloading);
        // keep the last good rows only while they still belong to the viewed period
        let reload = self.fetch(policy, drifted_to.is_none()).await;
        self.set_phase(MutationPhase::Idle);
        Ok(MutationReport {
            operation,
            record,
            drifted_to,
            reload,
        })
    }
}

// ==================== Tests ====================
