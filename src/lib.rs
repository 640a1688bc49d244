// Split Ledger - Core Library
// Shared-expense groups: who owes whom, how much, for which expense.
// Exposes the ledger and split/settlement engine for the CLI, the TUI, and tests.

pub mod error;
pub mod money;
pub mod entities;
pub mod ledger;
pub mod split;       // Split Engine - equal / exact / percent
pub mod balance;     // Balance Calculator - you owe / you are owed
pub mod settlement;  // Settlement Tracker - monotonic paid flags
pub mod history;     // History Aggregator - per-counterparty line items
pub mod session;     // View context passed by front ends
pub mod store;       // Persistence port + in-memory store
pub mod db;          // SQLite store + audit trail
pub mod service;     // ExpenseTracker - load/mutate/save per action
pub mod export;
pub mod config;

// Re-export commonly used types
pub use error::{LedgerError, LedgerResult};
pub use money::{format_amount, parse_amount, round2};
pub use entities::{Expense, ExpenseId, Group, Splits};
pub use ledger::{
    LedgerState, create_default_group,
    DEFAULT_GROUP_NAME, DEFAULT_VIEWER,
};
pub use split::{
    ExpenseDraft, SplitInputs, SplitMode, SplitPreview, PreviewRow,
    compute_splits, parse_split_inputs, preview,
};
pub use balance::{BalanceCalculator, BalanceSummary, Breakdown};
pub use settlement::{SettleOutcome, SettlementState, mark_paid, settlement_state};
pub use history::{
    History, HistoryAggregator, HistoryItem, HistorySide, HistoryView, CounterpartyHistory,
};
pub use session::Session;
pub use store::{LedgerStore, MemoryStore, STORAGE_KEY};
pub use db::{Entity, Event, EventKind, SqliteStore};
pub use service::ExpenseTracker;
pub use export::write_group_csv;
pub use config::{Config, ConfigError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
