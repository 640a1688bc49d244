// 📒 Ledger Store - every group, as one serializable value
//
// Pure data plus structural mutation: create group, add member, append
// expense, flip a settlement flag. Validation of expenses happens in the
// split engine before anything reaches here.
//
// The whole state is persisted as a single blob (see store.rs).

use crate::entities::{Expense, ExpenseId, Group};
use crate::error::{LedgerError, LedgerResult};
use crate::settlement::{self, SettleOutcome};
use serde::{Deserialize, Serialize};

/// Name of the group seeded when nothing has been persisted yet
pub const DEFAULT_GROUP_NAME: &str = "Trip to Goa";

/// Members of the seeded group besides the viewer
pub const DEFAULT_COMPANIONS: [&str; 2] = ["Alice", "Bob"];

/// Default viewer / self identity
pub const DEFAULT_VIEWER: &str = "User";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerState {
    groups: Vec<Group>,
}

/// The seed group: `[viewer, "Alice", "Bob"]`, no expenses
pub fn create_default_group(viewer: &str) -> Group {
    let mut members = vec![viewer.to_string()];
    members.extend(DEFAULT_COMPANIONS.iter().map(|m| m.to_string()));
    Group::new(DEFAULT_GROUP_NAME, members)
}

impl LedgerState {
    /// Empty ledger (no groups)
    pub fn new() -> Self {
        Self::default()
    }

    /// State used only when no persisted state exists
    pub fn seeded(viewer: &str) -> Self {
        LedgerState {
            groups: vec![create_default_group(viewer)],
        }
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Group names in creation order
    pub fn group_names(&self) -> Vec<String> {
        self.groups.iter().map(|g| g.name().to_string()).collect()
    }

    pub fn group(&self, name: &str) -> LedgerResult<&Group> {
        self.groups
            .iter()
            .find(|g| g.name() == name)
            .ok_or_else(|| LedgerError::GroupNotFound(name.to_string()))
    }

    pub fn group_mut(&mut self, name: &str) -> LedgerResult<&mut Group> {
        self.groups
            .iter_mut()
            .find(|g| g.name() == name)
            .ok_or_else(|| LedgerError::GroupNotFound(name.to_string()))
    }

    /// Add a new group whose first member is `owner`
    pub fn create_group(&mut self, name: &str, owner: &str) -> LedgerResult<&Group> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::EmptyName);
        }
        if self.groups.iter().any(|g| g.name() == name) {
            return Err(LedgerError::DuplicateGroup(name.to_string()));
        }

        self.groups.push(Group::new(name, vec![owner]));
        Ok(&self.groups[self.groups.len() - 1])
    }

    /// Highest expense id in any group; new ids are bumped past it so the
    /// audit trail can key events by id alone
    pub fn last_expense_id(&self) -> Option<ExpenseId> {
        self.groups.iter().filter_map(Group::last_expense_id).max()
    }

    pub fn add_member(&mut self, group: &str, name: &str) -> LedgerResult<String> {
        self.group_mut(group)?.add_member(name)
    }

    pub fn append_expense(&mut self, group: &str, expense: Expense) -> LedgerResult<()> {
        self.group_mut(group)?.append_expense(expense);
        Ok(())
    }

    /// Tolerant lookup: an unknown expense id is a no-op outcome, not an error.
    /// An unknown group is still an error.
    pub fn set_settled(
        &mut self,
        group: &str,
        expense_id: ExpenseId,
        person: &str,
    ) -> LedgerResult<SettleOutcome> {
        let group = self.group_mut(group)?;
        Ok(settlement::mark_paid(group, expense_id, person))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Splits;
    use chrono::Utc;

    #[test]
    fn test_seeded_state() {
        let state = LedgerState::seeded("User");

        assert_eq!(state.group_names(), vec!["Trip to Goa".to_string()]);
        let group = state.group("Trip to Goa").unwrap();
        assert_eq!(group.members(), &["User", "Alice", "Bob"]);
        assert!(group.expenses().is_empty());
    }

    #[test]
    fn test_seeded_state_uses_configured_viewer() {
        let state = LedgerState::seeded("Priya");
        let group = state.group(DEFAULT_GROUP_NAME).unwrap();
        assert_eq!(group.members()[0], "Priya");
    }

    #[test]
    fn test_group_lookup_errors() {
        let mut state = LedgerState::seeded("User");
        assert_eq!(
            state.group("Nope").unwrap_err(),
            LedgerError::GroupNotFound("Nope".to_string())
        );
        assert!(state.add_member("Nope", "Carol").is_err());
    }

    #[test]
    fn test_create_group() {
        let mut state = LedgerState::seeded("User");
        state.create_group("Flatmates", "User").unwrap();

        assert_eq!(state.group_names(), vec!["Trip to Goa", "Flatmates"]);
        assert_eq!(state.group("Flatmates").unwrap().members(), &["User"]);

        assert_eq!(
            state.create_group("Flatmates", "User").unwrap_err(),
            LedgerError::DuplicateGroup("Flatmates".to_string())
        );
        assert_eq!(state.create_group("  ", "User").unwrap_err(), LedgerError::EmptyName);
    }

    #[test]
    fn test_set_settled_tolerates_unknown_expense() {
        let mut state = LedgerState::seeded("User");
        let mut splits = Splits::new();
        splits.insert("Alice".to_string(), 5.0);
        state
            .append_expense(
                DEFAULT_GROUP_NAME,
                Expense::new(ExpenseId(1), "User", 15.0, splits, Utc::now()),
            )
            .unwrap();

        let before = state.clone();
        let outcome = state.set_settled(DEFAULT_GROUP_NAME, ExpenseId(2), "Alice").unwrap();
        assert_eq!(outcome, SettleOutcome::ExpenseNotFound);
        assert_eq!(state, before);

        let outcome = state.set_settled(DEFAULT_GROUP_NAME, ExpenseId(1), "Alice").unwrap();
        assert_eq!(outcome, SettleOutcome::Settled);
    }

    #[test]
    fn test_last_expense_id_spans_groups() {
        let mut state = LedgerState::seeded("User");
        state.create_group("Flat", "User").unwrap();
        assert_eq!(state.last_expense_id(), None);

        for (group, id) in [(DEFAULT_GROUP_NAME, 7), ("Flat", 12), (DEFAULT_GROUP_NAME, 9)] {
            state
                .append_expense(group, Expense::new(ExpenseId(id), "User", 10.0, Splits::new(), Utc::now()))
                .unwrap();
        }
        assert_eq!(state.last_expense_id(), Some(ExpenseId(12)));
    }

    #[test]
    fn test_state_json_round_trip() {
        let mut state = LedgerState::seeded("User");
        state.add_member(DEFAULT_GROUP_NAME, "Carol").unwrap();

        let json = serde_json::to_string(&state).unwrap();
        let back: LedgerState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
