// 🧾 Expense Entity - one payment, apportioned among the other members
//
// "Who owes the payer how much" lives in `splits`. The payer's own share is
// implicit (total - sum of splits) and is never stored.
//
// An expense is immutable once appended, except for settlement flags, which
// only ever go from absent to true.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Mapping of debtor name -> amount owed to the payer
pub type Splits = BTreeMap<String, f64>;

// ============================================================================
// EXPENSE ID
// ============================================================================

/// Time-derived identifier: creation time in epoch milliseconds
///
/// Strictly increasing across the whole ledger. When two expenses land in the same
/// millisecond (or the clock steps back) the id is bumped past the last one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpenseId(pub i64);

impl ExpenseId {
    pub fn next(last: Option<ExpenseId>, now: DateTime<Utc>) -> ExpenseId {
        let candidate = now.timestamp_millis();
        match last {
            Some(ExpenseId(prev)) if candidate <= prev => ExpenseId(prev + 1),
            _ => ExpenseId(candidate),
        }
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ExpenseId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(ExpenseId)
    }
}

// ============================================================================
// EXPENSE ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    id: ExpenseId,
    paid_by: String,
    total: f64,

    /// Only the people who owe; the payer never appears here
    splits: Splits,

    /// Presence + true means that member's obligation is resolved
    #[serde(default)]
    settled: BTreeMap<String, bool>,

    date: DateTime<Utc>,
}

impl Expense {
    /// Build an expense from a splits mapping produced by the split engine.
    /// No validation happens here.
    pub fn new(
        id: ExpenseId,
        paid_by: impl Into<String>,
        total: f64,
        splits: Splits,
        date: DateTime<Utc>,
    ) -> Self {
        Expense {
            id,
            paid_by: paid_by.into(),
            total,
            splits,
            settled: BTreeMap::new(),
            date,
        }
    }

    pub fn id(&self) -> ExpenseId {
        self.id
    }

    pub fn paid_by(&self) -> &str {
        &self.paid_by
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn splits(&self) -> &Splits {
        &self.splits
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    /// Amount `person` owes the payer on this expense, if any
    pub fn share_of(&self, person: &str) -> Option<f64> {
        self.splits.get(person).copied()
    }

    /// The payer's implicit share
    pub fn payer_share(&self) -> f64 {
        self.total - self.splits.values().sum::<f64>()
    }

    pub fn owes(&self, person: &str) -> bool {
        self.splits.contains_key(person)
    }

    pub fn is_settled(&self, person: &str) -> bool {
        self.settled.get(person).copied().unwrap_or(false)
    }

    /// Every debtor has been marked paid
    pub fn is_fully_settled(&self) -> bool {
        self.splits.keys().all(|person| self.is_settled(person))
    }

    /// Unsettled `(debtor, amount)` lines
    pub fn outstanding(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.splits
            .iter()
            .filter(|(person, _)| !self.is_settled(person))
            .map(|(person, amount)| (person.as_str(), *amount))
    }

    pub fn outstanding_total(&self) -> f64 {
        self.outstanding().map(|(_, amount)| amount).sum()
    }

    /// Flip `person` to settled. Returns false when it already was.
    /// Callers go through the settlement tracker, which checks the person is
    /// actually a debtor first.
    pub(crate) fn settle(&mut self, person: &str) -> bool {
        if self.is_settled(person) {
            return false;
        }
        self.settled.insert(person.to_string(), true);
        true
    }
}
