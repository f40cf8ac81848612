//! Per-session conversation state with TTL.
//!
//! Single-node deployments keep state in an in-process map. When a shared
//! store path is configured, a SQLite-backed store with the same
//! write-through/TTL semantics takes over, keyed `session:<id>`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, RwLock};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::debug;

use scholar_core::errors::{GatewayError, ScholarResult};
use scholar_core::models::PointPayload;

/// The course a prior class belongs to, kept for the schedule shortcut.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRef {
    pub chunk_id: String,
    pub title: String,
}

/// What the gateway remembers between turns of one session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationState {
    pub active_entity_id: Option<String>,
    pub active_entity_name: Option<String>,
    pub active_entity_type: Option<String>,
    pub active_course: Option<CourseRef>,
    /// Chunk ids from the most recent response, most relevant first.
    pub last_sources: Vec<String>,
    /// Payload snapshots parallel to `last_sources` (missing ones skipped).
    pub last_payloads: Vec<PointPayload>,
}

/// Session persistence seam. Both implementations are write-through with
/// the TTL refreshed on every `put`.
pub trait SessionStore: Send + Sync {
    fn get(&self, session_id: &str) -> ScholarResult<Option<ConversationState>>;
    fn put(&self, session_id: &str, state: &ConversationState) -> ScholarResult<()>;
    fn remove(&self, session_id: &str) -> ScholarResult<()>;
}

fn store_err(e: impl std::fmt::Display) -> scholar_core::errors::ScholarError {
    GatewayError::SessionStore {
        reason: e.to_string(),
    }
    .into()
}

// ---------------------------------------------------------------------------
// In-process store
// ---------------------------------------------------------------------------

pub struct MemorySessionStore {
    ttl: Duration,
    inner: RwLock<HashMap<String, (ConversationState, Instant)>>,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        MemorySessionStore {
            ttl,
            inner: RwLock::new(HashMap::new()),
        }
    }

    fn purge_expired(map: &mut HashMap<String, (ConversationState, Instant)>, ttl: Duration) {
        let now = Instant::now();
        map.retain(|_, (_, refreshed)| now.duration_since(*refreshed) < ttl);
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, session_id: &str) -> ScholarResult<Option<ConversationState>> {
        let map = self.inner.read().map_err(|e| store_err(e.to_string()))?;
        Ok(map.get(session_id).and_then(|(state, refreshed)| {
            if refreshed.elapsed() < self.ttl {
                Some(state.clone())
            } else {
                None
            }
        }))
    }

    fn put(&self, session_id: &str, state: &ConversationState) -> ScholarResult<()> {
        let mut map = self.inner.write().map_err(|e| store_err(e.to_string()))?;
        Self::purge_expired(&mut map, self.ttl);
        map.insert(session_id.to_string(), (state.clone(), Instant::now()));
        Ok(())
    }

    fn remove(&self, session_id: &str) -> ScholarResult<()> {
        let mut map = self.inner.write().map_err(|e| store_err(e.to_string()))?;
        map.remove(session_id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Shared SQLite store
// ---------------------------------------------------------------------------

pub struct SqliteSessionStore {
    conn: Mutex<Connection>,
    ttl: Duration,
}

fn epoch_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn session_key(session_id: &str) -> String {
    format!("session:{session_id}")
}

impl SqliteSessionStore {
    pub fn open(path: impl AsRef<Path>, ttl: Duration) -> ScholarResult<Self> {
        let conn = Connection::open(path.as_ref()).map_err(store_err)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                 key        TEXT PRIMARY KEY,
                 state      TEXT NOT NULL,
                 expires_at INTEGER NOT NULL
             )",
        )
        .map_err(store_err)?;
        debug!(path = %path.as_ref().display(), "shared session store opened");
        Ok(SqliteSessionStore {
            conn: Mutex::new(conn),
            ttl,
        })
    }
}

impl SessionStore for SqliteSessionStore {
    fn get(&self, session_id: &str) -> ScholarResult<Option<ConversationState>> {
        let conn = self.conn.lock().map_err(|e| store_err(e.to_string()))?;
        let row: Option<(String, i64)> = conn
            .query_row(
                "SELECT state, expires_at FROM sessions WHERE key = ?1",
                params![session_key(session_id)],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(store_err)?;
        match row {
            Some((_, expires_at)) if expires_at <= epoch_secs() => {
                conn.execute(
                    "DELETE FROM sessions WHERE key = ?1",
                    params![session_key(session_id)],
                )
                .map_err(store_err)?;
                Ok(None)
            }
            Some((state, _)) => Ok(serde_json::from_str(&state).ok()),
            None => Ok(None),
        }
    }

    fn put(&self, session_id: &str, state: &ConversationState) -> ScholarResult<()> {
        let conn = self.conn.lock().map_err(|e| store_err(e.to_string()))?;
        let serialized = serde_json::to_string(state).map_err(store_err)?;
        let expires = epoch_secs() + self.ttl.as_secs() as i64;
        conn.execute(
            "INSERT INTO sessions (key, state, expires_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET state = excluded.state, expires_at = excluded.expires_at",
            params![session_key(session_id), serialized, expires],
        )
        .map_err(store_err)?;
        // Opportunistic cleanup of anything already expired.
        conn.execute(
            "DELETE FROM sessions WHERE expires_at <= ?1",
            params![epoch_secs()],
        )
        .map_err(store_err)?;
        Ok(())
    }

    fn remove(&self, session_id: &str) -> ScholarResult<()> {
        let conn = self.conn.lock().map_err(|e| store_err(e.to_string()))?;
        conn.execute(
            "DELETE FROM sessions WHERE key = ?1",
            params![session_key(session_id)],
        )
        .map_err(store_err)?;
        Ok(())
    }
}
