// 📜 History Aggregator - outstanding obligations grouped by counterparty
//
// Two views built from the same predicates as the balance calculator:
//   "You owe X"  - grouped by creditor (payer)
//   "X owes you" - grouped by debtor
// Each counterparty expands into its unsettled line items.
//
// HistoryView holds the expand/collapse flags. It is view state only and is
// never stored alongside ledger data.

use crate::entities::{ExpenseId, Group};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

// ============================================================================
// AGGREGATED HISTORY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HistorySide {
    /// Viewer is the debtor
    YouOwe,
    /// Viewer is the creditor
    OwesYou,
}

impl HistorySide {
    pub fn title(&self) -> &'static str {
        match self {
            HistorySide::YouOwe => "You owe",
            HistorySide::OwesYou => "Owes you",
        }
    }
}

/// One unsettled obligation on one expense
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryItem {
    pub expense_id: ExpenseId,
    pub amount: f64,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CounterpartyHistory {
    pub counterparty: String,
    pub total: f64,
    /// Oldest first, in expense log order
    pub items: Vec<HistoryItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct History {
    pub you_owe: Vec<CounterpartyHistory>,
    pub owes_you: Vec<CounterpartyHistory>,
}

impl History {
    pub fn side(&self, side: HistorySide) -> &[CounterpartyHistory] {
        match side {
            HistorySide::YouOwe => &self.you_owe,
            HistorySide::OwesYou => &self.owes_you,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.you_owe.is_empty() && self.owes_you.is_empty()
    }
}

// ============================================================================
// HISTORY AGGREGATOR
// ============================================================================

pub struct HistoryAggregator {
    viewer: String,
}

impl HistoryAggregator {
    pub fn new(viewer: impl Into<String>) -> Self {
        HistoryAggregator {
            viewer: viewer.into(),
        }
    }

    /// Unsettled debts of the viewer, grouped by creditor
    pub fn you_owe_by_creditor(&self, group: &Group) -> Vec<CounterpartyHistory> {
        let mut lines = Vec::new();

        for expense in group.expenses() {
            if expense.paid_by() == self.viewer || expense.is_settled(&self.viewer) {
                continue;
            }
            if let Some(amount) = expense.share_of(&self.viewer) {
                lines.push((
                    expense.paid_by(),
                    HistoryItem {
                        expense_id: expense.id(),
                        amount,
                        date: expense.date(),
                    },
                ));
            }
        }

        group_by_counterparty(group, lines)
    }

    /// Unsettled debts owed to the viewer, grouped by debtor
    pub fn owed_by_debtor(&self, group: &Group) -> Vec<CounterpartyHistory> {
        let mut lines = Vec::new();

        for expense in group.expenses() {
            if expense.paid_by() != self.viewer {
                continue;
            }
            for (person, amount) in expense.outstanding() {
                lines.push((
                    person,
                    HistoryItem {
                        expense_id: expense.id(),
                        amount,
                        date: expense.date(),
                    },
                ));
            }
        }

        group_by_counterparty(group, lines)
    }

    pub fn build(&self, group: &Group) -> History {
        History {
            you_owe: self.you_owe_by_creditor(group),
            owes_you: self.owed_by_debtor(group),
        }
    }
}

/// Bucket line items by counterparty, in group member (display) order
fn group_by_counterparty(group: &Group, lines: Vec<(&str, HistoryItem)>) -> Vec<CounterpartyHistory> {
    let mut grouped: Vec<CounterpartyHistory> = Vec::new();

    for member in group.members() {
        let items: Vec<HistoryItem> = lines
            .iter()
            .filter(|(name, _)| *name == member.as_str())
            .map(|(_, item)| item.clone())
            .collect();

        if items.is_empty() {
            continue;
        }

        grouped.push(CounterpartyHistory {
            counterparty: member.clone(),
            total: items.iter().map(|i| i.amount).sum(),
            items,
        });
    }

    grouped
}

// ============================================================================
// VIEW STATE
// ============================================================================

/// Expand/collapse flags for the history panel, keyed by counterparty.
/// Reset every time the panel is opened.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryView {
    open: bool,
    expanded: HashSet<(HistorySide, String)>,
}

impl HistoryView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or reopen) the panel with every counterparty collapsed
    pub fn open(&mut self) {
        self.open = true;
        self.expanded.clear();
    }

    pub fn close(&mut self) {
        self.open = false;
        self.expanded.clear();
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Flip one counterparty; returns the new expanded state
    pub fn toggle(&mut self, side: HistorySide, counterparty: &str) -> bool {
        let key = (side, counterparty.to_string());
        if self.expanded.remove(&key) {
            false
        } else {
            self.expanded.insert(key);
            true
        }
    }

    pub fn is_expanded(&self, side: HistorySide, counterparty: &str) -> bool {
        self.expanded.contains(&(side, counterparty.to_string()))
    }
}
