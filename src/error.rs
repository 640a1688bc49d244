// Error taxonomy for the ledger core
//
// Every variant is a validation rejection raised before any mutation, so a
// caller can always correct its input and resubmit. Storage failures from the
// persistence port are folded into `Storage` at the service boundary.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// Total is zero, negative, or not a number
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Member name was blank or the prompt was cancelled
    #[error("Member name cannot be empty")]
    EmptyName,

    #[error("Member already exists: {0}")]
    DuplicateMember(String),

    #[error("Group already exists: {0}")]
    DuplicateGroup(String),

    #[error("Group not found: {0}")]
    GroupNotFound(String),

    #[error("Payer '{0}' is not a member of this group")]
    PayerNotMember(String),

    /// Entered exact amounts overcommit the total
    #[error("Exact amounts exceed total {total:.2} (entered {entered:.2})")]
    ExactSplitExceedsTotal { total: f64, entered: f64 },

    #[error("Percentages exceed 100% (entered {used:.2}%)")]
    PercentExceeds100 { used: f64 },

    #[error("Share for {member} cannot be negative (got {value})")]
    NegativeShare { member: String, value: f64 },

    #[error("Invalid input for {member}: {raw:?}")]
    InvalidInput { member: String, raw: String },

    #[error("Storage failure: {0}")]
    Storage(String),
}

impl From<anyhow::Error> for LedgerError {
    fn from(err: anyhow::Error) -> Self {
        LedgerError::Storage(format!("{:#}", err))
    }
}

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;
