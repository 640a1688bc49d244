// Entity Models - the ledger's data model
//
// A Group exclusively owns its members and its expense log; each Expense owns
// its own splits and settlement flags. Nothing is shared across groups.

pub mod expense;
pub mod group;

pub use expense::{Expense, ExpenseId, Splits};
pub use group::Group;
