//! SQLite-backed queue.
//!
//! Tables:
//! - `queues`: one row per named queue (name, kind).
//! - `queue_items`: the items, keyed by insertion sequence.
//! - `queue_messages`: messages handlers leave for the operator.
//!
//! 設計:
//! - steal は claimed_at / claimed_by / claims を更新するだけで行は消さない
//! - delete で初めて行が消える（two-phase claim/delete）
//! - プロセスが落ちても claimed な行は残るので、次の run で再度 steal される

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use super::{ClaimedItem, DiscardedItem, TaskQueue};
use crate::domain::{ItemId, QueueKind, QueueName, QueueSpec, RunId, Task};
use crate::error::StoreError;
use crate::observability::QueueCounts;

const SCHEMA_VERSION: i64 = 2;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS queues (
    name        TEXT PRIMARY KEY,
    kind        TEXT NOT NULL,
    created_at  TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS queue_items (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    queue_name    TEXT NOT NULL REFERENCES queues(name),
    weight        INTEGER NOT NULL DEFAULT 0,
    submitted_at  TEXT NOT NULL,
    claimed_at    TEXT,
    claimed_by    TEXT,
    claims        INTEGER NOT NULL DEFAULT 0,
    data          TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS queue_items_order
    ON queue_items (queue_name, weight, id);
CREATE TABLE IF NOT EXISTS queue_messages (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    queue_name   TEXT NOT NULL REFERENCES queues(name),
    message      TEXT NOT NULL,
    recorded_at  TEXT NOT NULL
);
";

/// Handle on a queue database. Cheap to clone; clones share the connection.
#[derive(Clone)]
pub struct QueueStore {
    conn: Arc<Mutex<Connection>>,
}

impl QueueStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.ensure_schema()?;
        Ok(store)
    }

    fn ensure_schema(&self) -> Result<(), StoreError> {
        let conn = lock(&self.conn)?;
        let current: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        if current < SCHEMA_VERSION {
            conn.execute_batch(SCHEMA)?;
            conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        }
        Ok(())
    }

    /// Kind of the named queue, if it exists.
    pub fn find(&self, name: &QueueName) -> Result<Option<QueueKind>, StoreError> {
        let conn = lock(&self.conn)?;
        let kind = conn
            .query_row(
                "SELECT kind FROM queues WHERE name = ?1",
                params![name.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(kind.map(QueueKind::new))
    }

    /// Create the queue, or open it if it already exists.
    /// `reset` discards any items an existing queue still holds.
    pub fn create(&self, spec: &QueueSpec, reset: bool) -> Result<SqliteQueue, StoreError> {
        if let Some(found) = self.find(&spec.name)? {
            if found != spec.kind {
                return Err(StoreError::KindMismatch {
                    name: spec.name.clone(),
                    expected: spec.kind.clone(),
                    found,
                });
            }
        }

        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT OR IGNORE INTO queues (name, kind, created_at) VALUES (?1, ?2, ?3)",
            params![spec.name.as_str(), spec.kind.as_str(), Utc::now().to_rfc3339()],
        )?;
        if reset {
            let removed = tx.execute(
                "DELETE FROM queue_items WHERE queue_name = ?1",
                params![spec.name.as_str()],
            )?;
            tx.execute(
                "DELETE FROM queue_messages WHERE queue_name = ?1",
                params![spec.name.as_str()],
            )?;
            debug!(queue = %spec.name, removed, "queue reset");
        }
        tx.commit()?;

        Ok(SqliteQueue {
            conn: Arc::clone(&self.conn),
            spec: spec.clone(),
        })
    }

    /// Reconstruct a previously persisted queue by name and kind.
    pub fn load(&self, name: &QueueName, kind: &QueueKind) -> Result<SqliteQueue, StoreError> {
        match self.find(name)? {
            None => Err(StoreError::QueueNotFound {
                name: name.clone(),
                kind: kind.clone(),
            }),
            Some(found) if &found != kind => Err(StoreError::KindMismatch {
                name: name.clone(),
                expected: kind.clone(),
                found,
            }),
            Some(_) => Ok(SqliteQueue {
                conn: Arc::clone(&self.conn),
                spec: QueueSpec {
                    name: name.clone(),
                    kind: kind.clone(),
                },
            }),
        }
    }

    /// Remove a queue and all of its items. Missing queues are a no-op.
    pub fn drop_queue(&self, name: &QueueName) -> Result<(), StoreError> {
        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM queue_items WHERE queue_name = ?1",
            params![name.as_str()],
        )?;
        tx.execute(
            "DELETE FROM queue_messages WHERE queue_name = ?1",
            params![name.as_str()],
        )?;
        tx.execute("DELETE FROM queues WHERE name = ?1", params![name.as_str()])?;
        tx.commit()?;
        debug!(queue = %name, "queue dropped");
        Ok(())
    }

    /// Forget the messages of a queue, keeping its items.
    pub fn clear_messages(&self, name: &QueueName) -> Result<(), StoreError> {
        let conn = lock(&self.conn)?;
        let removed = conn.execute(
            "DELETE FROM queue_messages WHERE queue_name = ?1",
            params![name.as_str()],
        )?;
        debug!(queue = %name, removed, "messages cleared");
        Ok(())
    }
}

/// One named queue inside a `QueueStore`.
pub struct SqliteQueue {
    conn: Arc<Mutex<Connection>>,
    spec: QueueSpec,
}

impl SqliteQueue {
    pub fn spec(&self) -> &QueueSpec {
        &self.spec
    }

    fn name(&self) -> &str {
        self.spec.name.as_str()
    }

    fn count_items(&self) -> Result<u64, StoreError> {
        let conn = lock(&self.conn)?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM queue_items WHERE queue_name = ?1",
            params![self.name()],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(n).unwrap_or_default())
    }

    fn steal_head(&self, run_id: RunId) -> Result<Option<ClaimedItem>, StoreError> {
        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;

        let head = tx
            .query_row(
                "SELECT id, claims, data FROM queue_items
                 WHERE queue_name = ?1
                 ORDER BY weight ASC, id ASC
                 LIMIT 1",
                params![self.name()],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, u32>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, claims, data)) = head else {
            return Ok(None);
        };
        let task: Task = serde_json::from_str(&data)?;

        let claimed_at = Utc::now();
        tx.execute(
            "UPDATE queue_items
             SET claimed_at = ?1, claimed_by = ?2, claims = claims + 1
             WHERE id = ?3",
            params![claimed_at.to_rfc3339(), run_id.to_string(), id],
        )?;
        tx.commit()?;

        let item = ClaimedItem {
            id: ItemId::new(id),
            task,
            claims: claims + 1,
            claimed_by: run_id,
            claimed_at,
        };
        debug!(queue = %self.spec.name, item = %item.id, claims = item.claims, "item stolen");
        Ok(Some(item))
    }

    /// Remove the head item without decoding it, so a row that no longer
    /// parses can still be skipped.
    pub fn discard_head(&self) -> Result<Option<DiscardedItem>, StoreError> {
        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;

        let head = tx
            .query_row(
                "SELECT id, data FROM queue_items
                 WHERE queue_name = ?1
                 ORDER BY weight ASC, id ASC
                 LIMIT 1",
                params![self.name()],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        let Some((id, data)) = head else {
            return Ok(None);
        };
        tx.execute("DELETE FROM queue_items WHERE id = ?1", params![id])?;
        tx.commit()?;

        let title = serde_json::from_str::<serde_json::Value>(&data)
            .ok()
            .and_then(|v| v.get("title")?.as_str().map(str::to_owned));
        let item = DiscardedItem {
            id: ItemId::new(id),
            title,
        };
        debug!(queue = %self.spec.name, item = %item.id, readable = item.title.is_some(), "head item discarded");
        Ok(Some(item))
    }

    fn delete_item(&self, item: &ClaimedItem) -> Result<(), StoreError> {
        let conn = lock(&self.conn)?;
        let removed = conn.execute(
            "DELETE FROM queue_items WHERE id = ?1 AND queue_name = ?2",
            params![item.id.get(), self.name()],
        )?;
        debug!(queue = %self.spec.name, item = %item.id, removed, "item deleted");
        Ok(())
    }

    fn insert_item(&self, task: &Task, weight: i64) -> Result<ItemId, StoreError> {
        let data = serde_json::to_string(task)?;
        let conn = lock(&self.conn)?;
        conn.execute(
            "INSERT INTO queue_items (queue_name, weight, submitted_at, data)
             VALUES (?1, ?2, ?3, ?4)",
            params![self.name(), weight, Utc::now().to_rfc3339(), data],
        )?;
        let id = ItemId::new(conn.last_insert_rowid());
        debug!(queue = %self.spec.name, item = %id, weight, title = task.title(), "item enqueued");
        Ok(id)
    }

    fn insert_message(&self, message: &str) -> Result<(), StoreError> {
        let conn = lock(&self.conn)?;
        conn.execute(
            "INSERT INTO queue_messages (queue_name, message, recorded_at) VALUES (?1, ?2, ?3)",
            params![self.name(), message, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn select_messages(&self) -> Result<Vec<String>, StoreError> {
        let conn = lock(&self.conn)?;
        let mut stmt =
            conn.prepare("SELECT message FROM queue_messages WHERE queue_name = ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![self.name()], |row| row.get::<_, String>(0))?;
        let messages = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(messages)
    }

    #[cfg(test)]
    pub(crate) fn insert_raw(&self, data: &str) -> Result<(), StoreError> {
        let conn = lock(&self.conn)?;
        conn.execute(
            "INSERT INTO queue_items (queue_name, submitted_at, data) VALUES (?1, ?2, ?3)",
            params![self.name(), Utc::now().to_rfc3339(), data],
        )?;
        Ok(())
    }

    fn item_counts(&self) -> Result<QueueCounts, StoreError> {
        let conn = lock(&self.conn)?;
        let (pending, claimed): (i64, i64) = conn.query_row(
            "SELECT
                COALESCE(SUM(CASE WHEN claimed_at IS NULL THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN claimed_at IS NULL THEN 0 ELSE 1 END), 0)
             FROM queue_items WHERE queue_name = ?1",
            params![self.name()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(QueueCounts {
            pending: u64::try_from(pending).unwrap_or_default(),
            claimed: u64::try_from(claimed).unwrap_or_default(),
        })
    }
}

#[async_trait]
impl TaskQueue for SqliteQueue {
    async fn count(&self) -> Result<u64, StoreError> {
        self.count_items()
    }

    async fn steal_next(&self, run_id: RunId) -> Result<Option<ClaimedItem>, StoreError> {
        self.steal_head(run_id)
    }

    async fn delete(&self, item: &ClaimedItem) -> Result<(), StoreError> {
        self.delete_item(item)
    }

    async fn enqueue_with_weight(&self, task: Task, weight: i64) -> Result<(), StoreError> {
        self.insert_item(&task, weight).map(|_| ())
    }

    async fn counts(&self) -> Result<QueueCounts, StoreError> {
        self.item_counts()
    }

    async fn record_message(&self, message: &str) -> Result<(), StoreError> {
        self.insert_message(message)
    }

    async fn messages(&self) -> Result<Vec<String>, StoreError> {
        self.select_messages()
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, StoreError> {
    conn.lock().map_err(|_| StoreError::LockPoisoned)
}
