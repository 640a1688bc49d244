// 💾 Persistence port - load/save the whole ledger as one blob
//
// The core only needs "read whole state, mutate in memory, write whole state
// back". Anything that can hold one string under one key can back it.
// Concurrent writers are not coordinated; last write wins.

use crate::db::Event;
use crate::ledger::LedgerState;
use anyhow::{Context, Result};
use std::cell::RefCell;

/// Constant key the serialized ledger lives under
pub const STORAGE_KEY: &str = "expenseDB";

pub trait LedgerStore {
    /// None when nothing has been saved yet
    fn load(&self) -> Result<Option<LedgerState>>;

    fn save(&self, state: &LedgerState) -> Result<()>;

    /// Forget the persisted state
    fn clear(&self) -> Result<()>;

    /// Append to the audit trail, if the store keeps one
    fn record_event(&self, _event: &Event) -> Result<()> {
        Ok(())
    }
}

pub fn encode_state(state: &LedgerState) -> Result<String> {
    serde_json::to_string(state).context("Failed to serialize ledger state")
}

pub fn decode_state(blob: &str) -> Result<LedgerState> {
    serde_json::from_str(blob).context("Failed to deserialize ledger state")
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

/// Keeps the serialized blob in memory. Goes through JSON on every
/// load/save so it behaves exactly like a durable store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blob: RefCell<Option<String>>,
    events: RefCell<Vec<Event>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing state
    pub fn with_state(state: &LedgerState) -> Result<Self> {
        let store = Self::new();
        store.save(state)?;
        Ok(store)
    }

    /// Raw blob, as a browser-style key-value store would hold it
    pub fn raw(&self) -> Option<String> {
        self.blob.borrow().clone()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }
}

impl LedgerStore for MemoryStore {
    fn load(&self) -> Result<Option<LedgerState>> {
        match self.blob.borrow().as_deref() {
            Some(blob) => decode_state(blob).map(Some),
            None => Ok(None),
        }
    }

    fn save(&self, state: &LedgerState) -> Result<()> {
        let blob = encode_state(state)?;
        *self.blob.borrow_mut() = Some(blob);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.blob.borrow_mut() = None;
        Ok(())
    }

    fn record_event(&self, event: &Event) -> Result<()> {
        self.events.borrow_mut().push(event.clone());
        Ok(())
    }
}
