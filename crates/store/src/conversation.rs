//! SQLite-backed conversation memory store.
//!
//! Each agent owns an independent store instance, namespaced by agent key
//! (`<data_dir>/<agent>/memory.db`). The log is append-only: records are
//! never updated or deleted, and no retention policy applies. Writes go
//! through WAL with a bounded busy-timeout; a write that cannot acquire the
//! database within that window fails, and the caller logs and swallows the
//! failure rather than failing the user-visible request.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use relay_core::{Error, Result};

/// One recorded turn: a user input paired with the assistant response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: String,
    pub session_id: String,
    pub user_input: String,
    pub assistant_response: String,
    /// Unix seconds.
    pub timestamp: f64,
    /// Placeholder: always false. No cache-hit path sets it.
    pub cached: bool,
}

/// Aggregate store statistics, computed on demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryStats {
    pub total_records: u64,
    pub records_last_24h: u64,
    pub avg_turn_ms: f64,
}

/// Per-agent, session-addressable log of conversation turns.
pub struct ConversationStore {
    agent: String,
    conn: Arc<tokio::sync::Mutex<Connection>>,
}

fn db_err(context: &str, e: impl std::fmt::Display) -> Error {
    Error::storage(format!("{}: {}", context, e))
}

impl ConversationStore {
    /// Open (or create) the store for one agent under `data_dir`.
    pub fn open(agent: &str, data_dir: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
        let dir = data_dir.as_ref().join(agent);
        std::fs::create_dir_all(&dir).map_err(|e| db_err("create data dir", e))?;
        let conn =
            Connection::open(dir.join("memory.db")).map_err(|e| db_err("open database", e))?;
        Self::init(conn, agent, busy_timeout)
    }

    /// Open an in-memory store. Test use only; nothing survives the handle.
    pub fn open_in_memory(agent: &str) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| db_err("open database", e))?;
        Self::init(conn, agent, Duration::from_millis(5000))
    }

    fn init(conn: Connection, agent: &str, busy_timeout: Duration) -> Result<Self> {
        conn.busy_timeout(busy_timeout)
            .map_err(|e| db_err("set busy timeout", e))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| db_err("enable WAL", e))?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(|e| db_err("set synchronous", e))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS conversations (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL,
                user_input TEXT NOT NULL,
                assistant_response TEXT NOT NULL,
                timestamp REAL NOT NULL,
                duration_ms REAL NOT NULL DEFAULT 0,
                cached INTEGER NOT NULL DEFAULT 0
            )",
            [],
        )
        .map_err(|e| db_err("create schema", e))?;

        // Keeps "most recent N for session X" an index walk as the log grows.
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_conversations_session
             ON conversations (session_id, timestamp)",
            [],
        )
        .map_err(|e| db_err("create index", e))?;

        Ok(Self {
            agent: agent.to_string(),
            conn: Arc::new(tokio::sync::Mutex::new(conn)),
        })
    }

    /// Agent key this store is namespaced to.
    pub fn agent(&self) -> &str {
        &self.agent
    }

    /// Append one turn. Returns the generated record id.
    pub async fn append(
        &self,
        session_id: &str,
        user_input: &str,
        assistant_response: &str,
        duration_ms: f64,
    ) -> Result<String> {
        let conn = self.conn.clone();
        let record_id = Uuid::new_v4().to_string();
        let id = record_id.clone();
        let session_id = session_id.to_string();
        let user_input = user_input.to_string();
        let assistant_response = assistant_response.to_string();
        let timestamp = chrono::Utc::now().timestamp_millis() as f64 / 1000.0;

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.execute(
                "INSERT INTO conversations
                 (id, session_id, user_input, assistant_response, timestamp, duration_ms, cached)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)",
                params![id, session_id, user_input, assistant_response, timestamp, duration_ms],
            )
            .map_err(|e| db_err("insert turn", e))?;
            Ok::<_, Error>(id)
        })
        .await
        .map_err(|e| db_err("join insert task", e))??;

        tracing::debug!(
            agent = %self.agent,
            record_id = %record_id,
            "conversation turn recorded"
        );
        Ok(record_id)
    }

    /// The `limit` most recent records for a session, newest first.
    /// An unknown session yields an empty list, not an error.
    pub async fn recent(&self, session_id: &str, limit: usize) -> Result<Vec<ConversationRecord>> {
        let conn = self.conn.clone();
        let session_id = session_id.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn
                .prepare(
                    "SELECT id, session_id, user_input, assistant_response, timestamp, cached
                     FROM conversations
                     WHERE session_id = ?1
                     ORDER BY timestamp DESC, rowid DESC
                     LIMIT ?2",
                )
                .map_err(|e| db_err("prepare recent query", e))?;

            let records = stmt
                .query_map(params![session_id, limit as i64], |row| {
                    Ok(ConversationRecord {
                        id: row.get(0)?,
                        session_id: row.get(1)?,
                        user_input: row.get(2)?,
                        assistant_response: row.get(3)?,
                        timestamp: row.get(4)?,
                        cached: row.get::<_, i64>(5)? != 0,
                    })
                })
                .map_err(|e| db_err("run recent query", e))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| db_err("read recent rows", e))?;

            Ok(records)
        })
        .await
        .map_err(|e| db_err("join recent task", e))?
    }

    /// The single most recent record for a session.
    pub async fn last(&self, session_id: &str) -> Result<Option<ConversationRecord>> {
        Ok(self.recent(session_id, 1).await?.into_iter().next())
    }

    /// Aggregate statistics across all sessions of this agent.
    ///
    /// `avg_turn_ms` averages only rows carrying a recorded duration; rows
    /// inserted without one (duration_ms = 0) are excluded rather than
    /// dragging the average toward zero.
    pub async fn stats(&self) -> Result<MemoryStats> {
        let conn = self.conn.clone();
        let day_ago = chrono::Utc::now().timestamp_millis() as f64 / 1000.0 - 86_400.0;

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let total_records: u64 = conn
                .query_row("SELECT COUNT(*) FROM conversations", [], |row| row.get(0))
                .map_err(|e| db_err("count records", e))?;
            let records_last_24h: u64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM conversations WHERE timestamp > ?1",
                    params![day_ago],
                    |row| row.get(0),
                )
                .map_err(|e| db_err("count recent records", e))?;
            let avg_turn_ms: f64 = conn
                .query_row(
                    "SELECT COALESCE(AVG(duration_ms), 0.0) FROM conversations
                     WHERE duration_ms > 0",
                    [],
                    |row| row.get(0),
                )
                .map_err(|e| db_err("average turn latency", e))?;

            Ok(MemoryStats {
                total_records,
                records_last_24h,
                avg_turn_ms,
            })
        })
        .await
        .map_err(|e| db_err("join stats task", e))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded_store(turns: usize) -> ConversationStore {
        let store = ConversationStore::open_in_memory("testing").unwrap();
        for i in 0..turns {
            store
                .append("s1", &format!("q{}", i), &format!("a{}", i), 10.0)
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn append_then_recent_returns_newest_first() {
        let store = seeded_store(5).await;

        let records = store.recent("s1", 3).await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].user_input, "q4");
        assert_eq!(records[1].user_input, "q3");
        assert_eq!(records[2].user_input, "q2");
    }

    #[tokio::test]
    async fn recent_limit_beyond_history_returns_all() {
        let store = seeded_store(2).await;
        let records = store.recent("s1", 10).await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn unknown_session_yields_empty_history() {
        let store = seeded_store(2).await;
        assert!(store.recent("nope", 5).await.unwrap().is_empty());
        assert!(store.last("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn records_share_supplied_session_id() {
        let store = ConversationStore::open_in_memory("testing").unwrap();
        store.append("shared", "q1", "a1", 1.0).await.unwrap();
        store.append("shared", "q2", "a2", 1.0).await.unwrap();

        let records = store.recent("shared", 10).await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.session_id == "shared"));
        assert!(records.iter().all(|r| !r.cached));
    }

    #[tokio::test]
    async fn stats_reflect_appended_turns() {
        let store = ConversationStore::open_in_memory("testing").unwrap();
        store.append("s1", "q1", "a1", 20.0).await.unwrap();
        store.append("s2", "q2", "a2", 40.0).await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_records, 2);
        assert_eq!(stats.records_last_24h, 2);
        assert!((stats.avg_turn_ms - 30.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn stats_ignore_rows_without_a_recorded_duration() {
        let store = ConversationStore::open_in_memory("testing").unwrap();
        store.append("s1", "q1", "a1", 0.0).await.unwrap();
        store.append("s1", "q2", "a2", 30.0).await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_records, 2);
        assert!((stats.avg_turn_ms - 30.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store =
                ConversationStore::open("deployment", dir.path(), Duration::from_millis(100))
                    .unwrap();
            store.append("s1", "q", "a", 5.0).await.unwrap();
        }
        let store =
            ConversationStore::open("deployment", dir.path(), Duration::from_millis(100)).unwrap();
        assert_eq!(store.recent("s1", 10).await.unwrap().len(), 1);
        assert_eq!(store.agent(), "deployment");
    }
}
