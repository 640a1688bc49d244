// ⚖️ Balance Calculator - "you owe" / "you are owed" for one viewer
//
// Always recomputed from the full expense log. Nothing is cached, so any
// mutation (new expense, mark paid) is reflected by simply calling again.
//
//   you_owe      = Σ splits[viewer]   over expenses paid by someone else,
//                                      where viewer is unsettled
//   you_are_owed = Σ splits[person]   over expenses paid by viewer,
//                                      where person is unsettled

use crate::entities::Group;
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-counterparty amounts, keyed by member name
pub type Breakdown = BTreeMap<String, f64>;

// ============================================================================
// BALANCE SUMMARY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceSummary {
    pub viewer: String,
    pub you_owe: f64,
    pub you_are_owed: f64,
    /// creditor -> amount the viewer owes them
    pub you_owe_to: Breakdown,
    /// debtor -> amount they owe the viewer
    pub owed_to_you: Breakdown,
}

impl BalanceSummary {
    /// Positive when the viewer is owed more than they owe
    pub fn net(&self) -> f64 {
        self.you_are_owed - self.you_owe
    }

    pub fn is_settled_up(&self) -> bool {
        self.you_owe_to.is_empty() && self.owed_to_you.is_empty()
    }
}

// ============================================================================
// BALANCE CALCULATOR
// ============================================================================

pub struct BalanceCalculator {
    viewer: String,
}

impl BalanceCalculator {
    pub fn new(viewer: impl Into<String>) -> Self {
        BalanceCalculator {
            viewer: viewer.into(),
        }
    }

    pub fn viewer(&self) -> &str {
        &self.viewer
    }

    /// Total the viewer still owes other payers
    pub fn you_owe(&self, group: &Group) -> f64 {
        self.you_owe_to(group).values().sum()
    }

    /// Total other members still owe the viewer
    pub fn you_are_owed(&self, group: &Group) -> f64 {
        self.owed_to_you(group).values().sum()
    }

    /// Unsettled amounts the viewer owes, grouped by creditor (payer)
    pub fn you_owe_to(&self, group: &Group) -> Breakdown {
        let mut owed = Breakdown::new();

        for expense in group.expenses() {
            if expense.paid_by() == self.viewer || expense.is_settled(&self.viewer) {
                continue;
            }
            if let Some(amount) = expense.share_of(&self.viewer) {
                *owed.entry(expense.paid_by().to_string()).or_insert(0.0) += amount;
            }
        }

        owed
    }

    /// Unsettled amounts owed to the viewer, grouped by debtor
    pub fn owed_to_you(&self, group: &Group) -> Breakdown {
        let mut owed = Breakdown::new();

        for expense in group.expenses() {
            if expense.paid_by() != self.viewer {
                continue;
            }
            for (person, amount) in expense.outstanding() {
                *owed.entry(person.to_string()).or_insert(0.0) += amount;
            }
        }

        owed
    }

    /// Both directions together, for rendering a dashboard
    pub fn summarize(&self, group: &Group) -> BalanceSummary {
        let you_owe_to = self.you_owe_to(group);
        let owed_to_you = self.owed_to_you(group);

        BalanceSummary {
            viewer: self.viewer.clone(),
            you_owe: you_owe_to.values().sum(),
            you_are_owed: owed_to_you.values().sum(),
            you_owe_to,
            owed_to_you,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Expense, ExpenseId};
    use crate::settlement::mark_paid;
    use crate::split::{compute_splits, ExpenseDraft, SplitInputs};
    use chrono::Utc;

    fn add(group: &mut Group, id: i64, draft: ExpenseDraft) -> ExpenseId {
        let splits = compute_splits(group.members(), &draft).unwrap();
        let id = ExpenseId(id);
        group.append_expense(Expense::new(id, draft.paid_by, draft.total, splits, Utc::now()));
        id
    }

    fn goa() -> Group {
        Group::new("Trip to Goa", vec!["User", "Alice", "Bob"])
    }

    #[test]
    fn test_empty_group_has_zero_balances() {
        let calc = BalanceCalculator::new("User");
        let summary = calc.summarize(&goa());

        assert_eq!(summary.you_owe, 0.0);
        assert_eq!(summary.you_are_owed, 0.0);
        assert!(summary.is_settled_up());
    }

    #[test]
    fn test_viewer_pays_equal_split() {
        let mut group = goa();
        let id = add(&mut group, 1, ExpenseDraft::equal(300.0, "User"));

        let calc = BalanceCalculator::new("User");
        assert_eq!(calc.you_are_owed(&group), 200.0);
        assert_eq!(calc.you_owe(&group), 0.0);

        mark_paid(&mut group, id, "Alice");

        assert_eq!(calc.you_are_owed(&group), 100.0);
        let breakdown = calc.owed_to_you(&group);
        assert_eq!(breakdown.len(), 1);
        assert_eq!(breakdown.get("Bob"), Some(&100.0));
    }

    #[test]
    fn test_someone_else_pays_exact_split() {
        let mut group = goa();
        let inputs: SplitInputs = [("User".to_string(), 30.0), ("Alice".to_string(), 20.0)]
            .into_iter()
            .collect();
        add(&mut group, 1, ExpenseDraft::exact(90.0, "Bob", inputs));

        let calc = BalanceCalculator::new("User");
        assert_eq!(calc.you_owe(&group), 30.0);
        assert_eq!(calc.you_are_owed(&group), 0.0);
        assert_eq!(calc.you_owe_to(&group).get("Bob"), Some(&30.0));
    }

    #[test]
    fn test_two_member_symmetry() {
        let calc = BalanceCalculator::new("A");

        let mut group = Group::new("Pair", vec!["A", "B"]);
        add(&mut group, 1, ExpenseDraft::equal(80.0, "A"));
        assert_eq!(calc.you_owe(&group), 0.0);
        assert_eq!(calc.you_are_owed(&group), 40.0);

        let mut group = Group::new("Pair", vec!["A", "B"]);
        add(&mut group, 1, ExpenseDraft::equal(80.0, "B"));
        assert_eq!(calc.you_owe(&group), 40.0);
        assert_eq!(calc.you_are_owed(&group), 0.0);
    }

    #[test]
    fn test_breakdown_accumulates_per_counterparty() {
        let mut group = goa();
        add(&mut group, 1, ExpenseDraft::equal(90.0, "User"));
        add(&mut group, 2, ExpenseDraft::equal(30.0, "User"));
        add(&mut group, 3, ExpenseDraft::equal(60.0, "Alice"));
        add(&mut group, 4, ExpenseDraft::equal(15.0, "Bob"));

        let summary = BalanceCalculator::new("User").summarize(&group);

        assert_eq!(summary.owed_to_you.get("Alice"), Some(&40.0));
        assert_eq!(summary.owed_to_you.get("Bob"), Some(&40.0));
        assert_eq!(summary.you_owe_to.get("Alice"), Some(&20.0));
        assert_eq!(summary.you_owe_to.get("Bob"), Some(&5.0));
        assert_eq!(summary.you_are_owed, 80.0);
        assert_eq!(summary.you_owe, 25.0);
        assert_eq!(summary.net(), 55.0);
    }

    #[test]
    fn test_settling_viewer_debt_drops_it() {
        let mut group = goa();
        let id = add(&mut group, 1, ExpenseDraft::equal(60.0, "Alice"));

        let calc = BalanceCalculator::new("User");
        assert_eq!(calc.you_owe(&group), 20.0);

        mark_paid(&mut group, id, "User");
        assert_eq!(calc.you_owe(&group), 0.0);
        assert!(calc.you_owe_to(&group).is_empty());
    }

    #[test]
    fn test_other_members_debts_do_not_count() {
        // Alice pays, Bob owes Alice: nothing to do with the viewer
        let mut group = goa();
        let inputs: SplitInputs = [("Bob".to_string(), 10.0)].into_iter().collect();
        add(&mut group, 1, ExpenseDraft::exact(10.0, "Alice", inputs));

        let summary = BalanceCalculator::new("User").summarize(&group);
        assert!(summary.is_settled_up());
    }
}
