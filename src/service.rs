// 🧭 Expense Tracker - the entry points a front end calls
//
// Each mutating call is one logical transaction:
//   load whole state (seed the default group if nothing is saved)
//   -> validate -> mutate in memory -> save whole state -> audit event
// A rejected call returns before the save, so the store never sees a partial
// write. Derived views (balances, history) are recomputed from scratch on
// every call; callers re-query after each mutation.

use crate::balance::{BalanceCalculator, BalanceSummary};
use crate::db::{Event, EventKind};
use crate::entities::{Expense, ExpenseId, Group};
use crate::error::LedgerResult;
use crate::history::{History, HistoryAggregator};
use crate::ledger::LedgerState;
use crate::settlement::SettleOutcome;
use crate::split::{compute_splits, preview, ExpenseDraft, SplitPreview};
use crate::store::LedgerStore;
use chrono::Utc;
use tracing::{info, warn};

/// Entry points for front ends, one logical transaction per call.
///
/// The audit event is written after the state is saved. If recording it
/// fails, the mutation stands and the failure is logged at `warn`, so the
/// audit trail can miss an entry that the ledger itself does not.
pub struct ExpenseTracker<S: LedgerStore> {
    store: S,
    viewer: String,
}

impl<S: LedgerStore> ExpenseTracker<S> {
    pub fn new(store: S, viewer: impl Into<String>) -> Self {
        ExpenseTracker {
            store,
            viewer: viewer.into(),
        }
    }

    pub fn viewer(&self) -> &str {
        &self.viewer
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current state; seeds and saves the default group on first use
    pub fn state(&self) -> LedgerResult<LedgerState> {
        if let Some(state) = self.store.load()? {
            return Ok(state);
        }

        let state = LedgerState::seeded(&self.viewer);
        self.store.save(&state)?;
        info!(viewer = %self.viewer, "No saved ledger found, seeded default group");
        Ok(state)
    }

    /// Read whole state, apply `f`, write whole state back.
    /// Nothing is written when `f` fails.
    fn transact<T, F>(&self, f: F) -> LedgerResult<T>
    where
        F: FnOnce(&mut LedgerState) -> LedgerResult<T>,
    {
        let mut state = self.state()?;
        let out = f(&mut state)?;
        self.store.save(&state)?;
        Ok(out)
    }

    fn record(&self, event: Event) {
        if let Err(err) = self.store.record_event(&event) {
            warn!(event_type = %event.kind, error = %err, "Failed to record audit event");
        }
    }

    pub fn group_names(&self) -> LedgerResult<Vec<String>> {
        Ok(self.state()?.group_names())
    }

    pub fn group(&self, name: &str) -> LedgerResult<Group> {
        self.state()?.group(name).cloned()
    }

    /// Create a new group with the viewer as its first member
    pub fn create_group(&self, name: &str) -> LedgerResult<Group> {
        let group = self
            .transact(|state| state.create_group(name, &self.viewer).cloned())
            .map_err(|err| {
                warn!(group = name, error = %err, "Create group rejected");
                err
            })?;

        info!(group = %group.name(), "Group created");
        self.record(Event::new(
            EventKind::GroupCreated,
            group.name(),
            serde_json::json!({ "members": group.members() }),
            &self.viewer,
        ));
        Ok(group)
    }

    pub fn add_member(&self, group: &str, name: &str) -> LedgerResult<String> {
        let member = self
            .transact(|state| state.add_member(group, name))
            .map_err(|err| {
                warn!(group, error = %err, "Add member rejected");
                err
            })?;

        info!(group, member = %member, "Member added");
        self.record(Event::new(
            EventKind::MemberAdded,
            group,
            serde_json::json!({ "member": member }),
            &self.viewer,
        ));
        Ok(member)
    }

    /// Validate the draft through the split engine and append the expense.
    /// Either a fully valid expense is stored, or nothing happens.
    pub fn add_expense(&self, group: &str, draft: &ExpenseDraft) -> LedgerResult<Expense> {
        let expense = self
            .transact(|state| {
                let last = state.last_expense_id();
                let target = state.group_mut(group)?;
                let splits = compute_splits(target.members(), draft)?;

                let now = Utc::now();
                let id = ExpenseId::next(last, now);
                let expense = Expense::new(id, draft.paid_by.clone(), draft.total, splits, now);
                target.append_expense(expense.clone());
                Ok(expense)
            })
            .map_err(|err| {
                warn!(group, payer = %draft.paid_by, mode = %draft.mode, error = %err, "Expense rejected");
                err
            })?;

        info!(
            group,
            expense_id = %expense.id(),
            payer = %expense.paid_by(),
            total = expense.total(),
            debtors = expense.splits().len(),
            "Expense added"
        );
        self.record(Event::new(
            EventKind::ExpenseAdded,
            expense.id().to_string(),
            serde_json::json!({
                "group": group,
                "paid_by": expense.paid_by(),
                "total": expense.total(),
                "mode": draft.mode.as_str(),
                "splits": expense.splits(),
            }),
            &self.viewer,
        ));
        Ok(expense)
    }

    /// Mark one person's obligation on one expense as paid.
    /// Only a real transition is saved and audited.
    pub fn mark_paid(&self, group: &str, expense_id: ExpenseId, person: &str) -> LedgerResult<SettleOutcome> {
        let mut state = self.state()?;
        let outcome = state.set_settled(group, expense_id, person)?;

        if outcome.changed() {
            self.store.save(&state)?;
            self.record(Event::new(
                EventKind::ExpenseSettled,
                expense_id.to_string(),
                serde_json::json!({ "group": group, "person": person }),
                &self.viewer,
            ));
        }

        Ok(outcome)
    }

    pub fn balances(&self, group: &str) -> LedgerResult<BalanceSummary> {
        let state = self.state()?;
        Ok(BalanceCalculator::new(self.viewer.as_str()).summarize(state.group(group)?))
    }

    pub fn history(&self, group: &str) -> LedgerResult<History> {
        let state = self.state()?;
        Ok(HistoryAggregator::new(self.viewer.as_str()).build(state.group(group)?))
    }

    /// Live preview for a draft that may still be incomplete
    pub fn preview(&self, group: &str, draft: &ExpenseDraft) -> LedgerResult<SplitPreview> {
        let state = self.state()?;
        Ok(preview(state.group(group)?.members(), draft))
    }

    /// Wipe persisted state; the next call reseeds the default group
    pub fn reset(&self) -> LedgerResult<()> {
        self.store.clear()?;
        warn!("Ledger state cleared");
        Ok(())
    }
}
