use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use crate::ledger::LedgerState;
use crate::store::{decode_state, encode_state, LedgerStore, STORAGE_KEY};

// ============================================================================
// AUDIT EVENTS
// ============================================================================

/// What an audit event is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Group,
    Expense,
}

impl Entity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::Group => "group",
            Entity::Expense => "expense",
        }
    }
}

/// The four ledger mutations that get audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    GroupCreated,
    MemberAdded,
    ExpenseAdded,
    ExpenseSettled,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::GroupCreated,
        EventKind::MemberAdded,
        EventKind::ExpenseAdded,
        EventKind::ExpenseSettled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::GroupCreated => "group_created",
            EventKind::MemberAdded => "member_added",
            EventKind::ExpenseAdded => "expense_added",
            EventKind::ExpenseSettled => "expense_settled",
        }
    }

    pub fn entity(&self) -> Entity {
        match self {
            EventKind::GroupCreated | EventKind::MemberAdded => Entity::Group,
            EventKind::ExpenseAdded | EventKind::ExpenseSettled => Entity::Expense,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown event type: {0}")]
pub struct UnknownEventKind(String);

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownEventKind(s.to_string()))
    }
}

/// One row of the audit trail
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
    /// Group name or expense id, depending on `kind.entity()`
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(kind: EventKind, entity_id: impl Into<String>, data: serde_json::Value, actor: &str) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            kind,
            entity_id: entity_id.into(),
            data,
            actor: actor.to_string(),
        }
    }
}

fn conversion_failure<E>(column: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(err))
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // WAL mode for crash recovery (no-op for in-memory databases)
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Key-value table: the whole ledger lives under one key
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Events Table (audit trail)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_timestamp ON events(timestamp)",
        [],
    )?;

    Ok(())
}

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &Event) -> Result<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, event_type, entity_type, entity_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.kind.as_str(),
            event.kind.entity().as_str(),
            event.entity_id,
            data_json,
            event.actor,
        ],
    )
    .with_context(|| format!("Failed to record {} event", event.kind))?;

    Ok(())
}

/// Audit trail of one group or expense, newest first
pub fn events_for_entity(conn: &Connection, entity: Entity, entity_id: &str) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_id, data, actor
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY timestamp DESC, id DESC",
    )?;

    let events = stmt
        .query_map(params![entity.as_str(), entity_id], |row| {
            let timestamp: String = row.get(1)?;
            let kind: String = row.get(2)?;
            let data: String = row.get(4)?;

            Ok(Event {
                event_id: row.get(0)?,
                timestamp: DateTime::parse_from_rfc3339(&timestamp)
                    .map_err(|e| conversion_failure(1, e))?
                    .with_timezone(&Utc),
                kind: kind.parse().map_err(|e| conversion_failure(2, e))?,
                entity_id: row.get(3)?,
                data: serde_json::from_str(&data).map_err(|e| conversion_failure(4, e))?,
                actor: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to read audit events")?;

    Ok(events)
}

// ============================================================================
// SQLITE STORE
// ============================================================================

/// Ledger store backed by a SQLite file
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        setup_database(&conn)?;
        debug!(path = %path.display(), "Opened ledger database");
        Ok(SqliteStore { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn)?;
        Ok(SqliteStore { conn })
    }

    pub fn events_for(&self, entity: Entity, entity_id: &str) -> Result<Vec<Event>> {
        events_for_entity(&self.conn, entity, entity_id)
    }
}

impl LedgerStore for SqliteStore {
    fn load(&self) -> Result<Option<LedgerState>> {
        let blob: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![STORAGE_KEY],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to read ledger state")?;

        blob.as_deref().map(decode_state).transpose()
    }

    fn save(&self, state: &LedgerState) -> Result<()> {
        let blob = encode_state(state)?;

        self.conn
            .execute(
                "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![STORAGE_KEY, blob, Utc::now().to_rfc3339()],
            )
            .context("Failed to write ledger state")?;

        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![STORAGE_KEY])
            .context("Failed to clear ledger state")?;
        Ok(())
    }

    fn record_event(&self, event: &Event) -> Result<()> {
        insert_event(&self.conn, event)
    }
}
