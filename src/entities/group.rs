// 👥 Group Entity - members plus their shared expense log
//
// Identity is the group name; members are plain name strings (no ids).
// Member order is insertion order and doubles as display order.
//
// Renaming a member, or two people sharing one display name, is unsupported:
// every split and settlement is keyed by the exact name string.

use crate::entities::expense::{Expense, ExpenseId};
use crate::error::{LedgerError, LedgerResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    name: String,
    members: Vec<String>,
    #[serde(default)]
    expenses: Vec<Expense>,
}

impl Group {
    /// Create a group with an initial member list and an empty expense log.
    /// Duplicate names in `members` are dropped, keeping the first.
    pub fn new<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut group = Group {
            name: name.into(),
            members: Vec::new(),
            expenses: Vec::new(),
        };
        for member in members {
            let member = member.into();
            if !group.is_member(&member) {
                group.members.push(member);
            }
        }
        group
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    /// Case-sensitive exact match
    pub fn is_member(&self, name: &str) -> bool {
        self.members.iter().any(|m| m == name)
    }

    pub fn expense(&self, id: ExpenseId) -> Option<&Expense> {
        self.expenses.iter().find(|e| e.id() == id)
    }

    pub(crate) fn expense_mut(&mut self, id: ExpenseId) -> Option<&mut Expense> {
        self.expenses.iter_mut().find(|e| e.id() == id)
    }

    pub fn last_expense_id(&self) -> Option<ExpenseId> {
        self.expenses.iter().map(|e| e.id()).max()
    }

    /// Append a member, keeping insertion order. Returns the stored name.
    ///
    /// Surrounding whitespace is trimmed. Blank names fail with `EmptyName`,
    /// an exact (case-sensitive) repeat fails with `DuplicateMember`.
    pub fn add_member(&mut self, name: &str) -> LedgerResult<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::EmptyName);
        }
        if self.is_member(name) {
            return Err(LedgerError::DuplicateMember(name.to_string()));
        }

        self.members.push(name.to_string());
        Ok(name.to_string())
    }

    /// Push an already-validated expense. No further checks.
    pub fn append_expense(&mut self, expense: Expense) {
        self.expenses.push(expense);
    }
}
