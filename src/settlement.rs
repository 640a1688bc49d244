// ✅ Settlement Tracker - per (expense, person) paid flag
//
// States: Unsettled -> Settled. One transition, irreversible, idempotent.
// The payer's implicit share has no state at all: it is never in splits.
//
// An unknown expense id is not an error. A caller may hold a stale id, and
// ignoring it cannot corrupt the ledger.

use crate::entities::{Expense, ExpenseId, Group};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SettlementState {
    Unsettled,
    Settled,
}

/// Result of a mark-paid request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SettleOutcome {
    /// Unsettled -> Settled
    Settled,
    /// Already settled; nothing changed
    AlreadySettled,
    /// No expense with that id; nothing changed
    ExpenseNotFound,
    /// Person owes nothing on this expense (payer, or omitted from splits)
    NotOwed,
}

impl SettleOutcome {
    /// Whether the ledger was mutated and needs to be persisted
    pub fn changed(&self) -> bool {
        matches!(self, SettleOutcome::Settled)
    }
}

/// State of `person` on `expense`. None when they have no obligation on it.
pub fn settlement_state(expense: &Expense, person: &str) -> Option<SettlementState> {
    if !expense.owes(person) {
        return None;
    }
    if expense.is_settled(person) {
        Some(SettlementState::Settled)
    } else {
        Some(SettlementState::Unsettled)
    }
}

/// Mark `person`'s obligation on expense `id` as paid
pub fn mark_paid(group: &mut Group, id: ExpenseId, person: &str) -> SettleOutcome {
    let group_name = group.name().to_string();

    let Some(expense) = group.expense_mut(id) else {
        debug!(group = %group_name, expense_id = %id, "Mark paid ignored: expense not found");
        return SettleOutcome::ExpenseNotFound;
    };

    match settlement_state(expense, person) {
        None => {
            debug!(group = %group_name, expense_id = %id, person, "Mark paid ignored: nothing owed");
            SettleOutcome::NotOwed
        }
        Some(SettlementState::Settled) => SettleOutcome::AlreadySettled,
        Some(SettlementState::Unsettled) => {
            expense.settle(person);
            info!(group = %group_name, expense_id = %id, person, "Obligation settled");
            SettleOutcome::Settled
        }
    }
}
