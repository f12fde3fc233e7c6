//! SQLite checkpointer (feature `sqlite`). Survives process restarts.
//!
//! Layout: table `checkpoints` keyed by `(thread_id, checkpoint_ns, seq)` holding
//! the serialized state; latest is `max(seq)`. Table `interrupts` holds at most one
//! row per `(thread_id, checkpoint_ns)`. All SQL runs on the blocking pool.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::graph::{Interrupt, PendingInterrupt};
use crate::memory::checkpoint::{millis_to_system_time, system_time_to_millis};
use crate::memory::checkpointer::thread_key;
use crate::memory::{
    Checkpoint, CheckpointError, CheckpointListItem, CheckpointMetadata, CheckpointSource,
    Checkpointer, RunnableConfig, Serializer,
};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS checkpoints (
    thread_id     TEXT    NOT NULL,
    checkpoint_ns TEXT    NOT NULL,
    seq           INTEGER NOT NULL,
    checkpoint_id TEXT    NOT NULL,
    ts            TEXT    NOT NULL,
    source        TEXT    NOT NULL,
    step          INTEGER NOT NULL,
    node_id       TEXT,
    created_at_ms INTEGER NOT NULL,
    state         BLOB    NOT NULL,
    PRIMARY KEY (thread_id, checkpoint_ns, seq)
);
CREATE INDEX IF NOT EXISTS checkpoints_by_id
    ON checkpoints (thread_id, checkpoint_ns, checkpoint_id);
CREATE TABLE IF NOT EXISTS interrupts (
    thread_id     TEXT    NOT NULL,
    checkpoint_ns TEXT    NOT NULL,
    interrupt_id  TEXT    NOT NULL,
    node_id       TEXT    NOT NULL,
    payload       TEXT    NOT NULL,
    pending       BLOB    NOT NULL,
    state         BLOB    NOT NULL,
    step          INTEGER NOT NULL,
    created_at_ms INTEGER NOT NULL,
    PRIMARY KEY (thread_id, checkpoint_ns)
);
";

const CHECKPOINT_COLUMNS: &str =
    "checkpoint_id, ts, source, step, seq, node_id, created_at_ms, state";

fn storage(e: impl std::fmt::Display) -> CheckpointError {
    CheckpointError::Storage(e.to_string())
}

/// Raw checkpoint row; state bytes are decoded outside the blocking closure.
struct CheckpointRow {
    id: String,
    ts: String,
    metadata: CheckpointMetadata,
    state: Vec<u8>,
}

impl CheckpointRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let source: String = row.get(2)?;
        Ok(Self {
            id: row.get(0)?,
            ts: row.get(1)?,
            metadata: CheckpointMetadata {
                // Rows are only written by `put`, which stores `as_str()`.
                source: source.parse().unwrap_or(CheckpointSource::Loop),
                step: row.get::<_, i64>(3)? as u64,
                seq: row.get::<_, i64>(4)? as u64,
                node_id: row.get(5)?,
                created_at: Some(millis_to_system_time(row.get::<_, i64>(6)? as u64)),
            },
            state: row.get(7)?,
        })
    }
}

struct InterruptRow {
    interrupt: Interrupt,
    pending: Vec<u8>,
    state: Vec<u8>,
    step: u64,
}

/// SQLite-backed checkpointer. `S` is stored through the given `Serializer`
/// (usually `JsonSerializer`).
///
/// One connection guarded by a mutex serializes writers; each `put` assigns the
/// next `seq` and inserts inside a single transaction.
pub struct SqliteSaver<S> {
    conn: Arc<Mutex<Connection>>,
    serializer: Arc<dyn Serializer<S>>,
}

impl<S> SqliteSaver<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Opens (or creates) the database file and its tables.
    pub fn new(
        path: impl AsRef<Path>,
        serializer: Arc<dyn Serializer<S>>,
    ) -> Result<Self, CheckpointError> {
        let conn = Connection::open(path).map_err(storage)?;
        Self::with_connection(conn, serializer)
    }

    /// Private in-memory database; for tests.
    pub fn in_memory(serializer: Arc<dyn Serializer<S>>) -> Result<Self, CheckpointError> {
        let conn = Connection::open_in_memory().map_err(storage)?;
        Self::with_connection(conn, serializer)
    }

    fn with_connection(
        conn: Connection,
        serializer: Arc<dyn Serializer<S>>,
    ) -> Result<Self, CheckpointError> {
        conn.busy_timeout(Duration::from_secs(5)).map_err(storage)?;
        conn.execute_batch(SCHEMA).map_err(storage)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            serializer,
        })
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, CheckpointError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, CheckpointError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| CheckpointError::Storage("sqlite connection lock poisoned".into()))?;
            f(&mut guard)
        })
        .await
        .map_err(storage)?
    }

    fn decode_checkpoint(&self, row: CheckpointRow) -> Result<Checkpoint<S>, CheckpointError> {
        Ok(Checkpoint {
            id: row.id,
            ts: row.ts,
            channel_values: self.serializer.deserialize(&row.state)?,
            metadata: row.metadata,
        })
    }

    fn decode_interrupt(&self, row: InterruptRow) -> Result<PendingInterrupt<S>, CheckpointError> {
        Ok(PendingInterrupt {
            interrupt: row.interrupt,
            pending: self.serializer.deserialize(&row.pending)?,
            state: self.serializer.deserialize(&row.state)?,
            step: row.step,
        })
    }
}

fn read_interrupt(
    conn: &Connection,
    thread_id: &str,
    ns: &str,
) -> Result<Option<InterruptRow>, CheckpointError> {
    let row = conn
        .query_row(
            "SELECT interrupt_id, node_id, payload, pending, state, step, created_at_ms
             FROM interrupts WHERE thread_id = ?1 AND checkpoint_ns = ?2",
            params![thread_id, ns],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Vec<u8>>(3)?,
                    row.get::<_, Vec<u8>>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, i64>(6)?,
                ))
            },
        )
        .optional()
        .map_err(storage)?;
    let Some((id, node_id, payload, pending, state, step, created_at_ms)) = row else {
        return Ok(None);
    };
    let value = serde_json::from_str(&payload)
        .map_err(|e| CheckpointError::Serialization(e.to_string()))?;
    Ok(Some(InterruptRow {
        interrupt: Interrupt {
            id,
            node_id,
            value,
            created_at: millis_to_system_time(created_at_ms as u64),
        },
        pending,
        state,
        step: step as u64,
    }))
}

#[async_trait]
impl<S> Checkpointer<S> for SqliteSaver<S>
where
    S: Clone + Send + Sync + 'static,
{
    async fn put(
        &self,
        config: &RunnableConfig,
        checkpoint: &Checkpoint<S>,
    ) -> Result<String, CheckpointError> {
        let (thread_id, ns) = thread_key(config)?;
        let state = self.serializer.serialize(&checkpoint.channel_values)?;
        let id = checkpoint.id.clone();
        let ts = checkpoint.ts.clone();
        let meta = checkpoint.metadata.clone();
        let created_at_ms = meta.created_at.map(system_time_to_millis).unwrap_or(0) as i64;
        let returned_id = id.clone();
        self.blocking(move |conn| {
            let tx = conn.transaction().map_err(storage)?;
            let seq: i64 = tx
                .query_row(
                    "SELECT COALESCE(MAX(seq), -1) + 1 FROM checkpoints
                     WHERE thread_id = ?1 AND checkpoint_ns = ?2",
                    params![thread_id, ns],
                    |row| row.get(0),
                )
                .map_err(storage)?;
            tx.execute(
                "INSERT INTO checkpoints
                 (thread_id, checkpoint_ns, seq, checkpoint_id, ts, source, step, node_id, created_at_ms, state)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    thread_id,
                    ns,
                    seq,
                    id,
                    ts,
                    meta.source.as_str(),
                    meta.step as i64,
                    meta.node_id,
                    created_at_ms,
                    state
                ],
            )
            .map_err(storage)?;
            tx.commit().map_err(storage)
        })
        .await?;
        Ok(returned_id)
    }

    async fn get_tuple(
        &self,
        config: &RunnableConfig,
    ) -> Result<Option<(Checkpoint<S>, CheckpointMetadata)>, CheckpointError> {
        let (thread_id, ns) = thread_key(config)?;
        let checkpoint_id = config.checkpoint_id.clone();
        let row = self
            .blocking(move |conn| {
                let row = match checkpoint_id {
                    Some(id) => conn
                        .query_row(
                            &format!(
                                "SELECT {} FROM checkpoints
                                 WHERE thread_id = ?1 AND checkpoint_ns = ?2 AND checkpoint_id = ?3
                                 ORDER BY seq DESC LIMIT 1",
                                CHECKPOINT_COLUMNS
                            ),
                            params![thread_id, ns, id],
                            CheckpointRow::from_row,
                        )
                        .optional(),
                    None => conn
                        .query_row(
                            &format!(
                                "SELECT {} FROM checkpoints
                                 WHERE thread_id = ?1 AND checkpoint_ns = ?2
                                 ORDER BY seq DESC LIMIT 1",
                                CHECKPOINT_COLUMNS
                            ),
                            params![thread_id, ns],
                            CheckpointRow::from_row,
                        )
                        .optional(),
                };
                row.map_err(storage)
            })
            .await?;
        match row {
            Some(row) => {
                let checkpoint = self.decode_checkpoint(row)?;
                let metadata = checkpoint.metadata.clone();
                Ok(Some((checkpoint, metadata)))
            }
            None => Ok(None),
        }
    }

    async fn list(
        &self,
        config: &RunnableConfig,
        limit: Option<usize>,
    ) -> Result<Vec<CheckpointListItem>, CheckpointError> {
        let (thread_id, ns) = thread_key(config)?;
        // SQLite treats a negative LIMIT as "no limit".
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        self.blocking(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT checkpoint_id, source, step, seq, node_id, created_at_ms
                     FROM checkpoints WHERE thread_id = ?1 AND checkpoint_ns = ?2
                     ORDER BY seq DESC LIMIT ?3",
                )
                .map_err(storage)?;
            let items = stmt
                .query_map(params![thread_id, ns, limit], |row| {
                    let source: String = row.get(1)?;
                    Ok(CheckpointListItem {
                        checkpoint_id: row.get(0)?,
                        metadata: CheckpointMetadata {
                            source: source.parse().unwrap_or(CheckpointSource::Loop),
                            step: row.get::<_, i64>(2)? as u64,
                            seq: row.get::<_, i64>(3)? as u64,
                            node_id: row.get(4)?,
                            created_at: Some(millis_to_system_time(row.get::<_, i64>(5)? as u64)),
                        },
                    })
                })
                .map_err(storage)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(storage)?;
            Ok(items)
        })
        .await
    }

    async fn history(&self, config: &RunnableConfig) -> Result<Vec<Checkpoint<S>>, CheckpointError> {
        let (thread_id, ns) = thread_key(config)?;
        let rows = self
            .blocking(move |conn| {
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT {} FROM checkpoints
                         WHERE thread_id = ?1 AND checkpoint_ns = ?2 ORDER BY seq ASC",
                        CHECKPOINT_COLUMNS
                    ))
                    .map_err(storage)?;
                let rows = stmt
                    .query_map(params![thread_id, ns], CheckpointRow::from_row)
                    .map_err(storage)?
                    .collect::<rusqlite::Result<Vec<_>>>()
                    .map_err(storage)?;
                Ok(rows)
            })
            .await?;
        rows.into_iter()
            .map(|row| self.decode_checkpoint(row))
            .collect()
    }

    async fn put_interrupt(
        &self,
        config: &RunnableConfig,
        pending: &PendingInterrupt<S>,
    ) -> Result<(), CheckpointError> {
        let (thread_id, ns) = thread_key(config)?;
        let pending_bytes = self.serializer.serialize(&pending.pending)?;
        let state_bytes = self.serializer.serialize(&pending.state)?;
        let payload = serde_json::to_string(&pending.interrupt.value)
            .map_err(|e| CheckpointError::Serialization(e.to_string()))?;
        let interrupt_id = pending.interrupt.id.clone();
        let node_id = pending.interrupt.node_id.clone();
        let created_at_ms = system_time_to_millis(pending.interrupt.created_at) as i64;
        let step = pending.step as i64;
        self.blocking(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO interrupts
                 (thread_id, checkpoint_ns, interrupt_id, node_id, payload, pending, state, step, created_at_ms)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    thread_id,
                    ns,
                    interrupt_id,
                    node_id,
                    payload,
                    pending_bytes,
                    state_bytes,
                    step,
                    created_at_ms
                ],
            )
            .map_err(storage)?;
            Ok(())
        })
        .await
    }

    async fn get_interrupt(
        &self,
        config: &RunnableConfig,
    ) -> Result<Option<PendingInterrupt<S>>, CheckpointError> {
        let (thread_id, ns) = thread_key(config)?;
        let row = self
            .blocking(move |conn| read_interrupt(conn, &thread_id, &ns))
            .await?;
        row.map(|r| self.decode_interrupt(r)).transpose()
    }

    async fn take_interrupt(
        &self,
        config: &RunnableConfig,
    ) -> Result<Option<PendingInterrupt<S>>, CheckpointError> {
        let (thread_id, ns) = thread_key(config)?;
        let row = self
            .blocking(move |conn| {
                let tx = conn.transaction().map_err(storage)?;
                let row = read_interrupt(&tx, &thread_id, &ns)?;
                if row.is_some() {
                    tx.execute(
                        "DELETE FROM interrupts WHERE thread_id = ?1 AND checkpoint_ns = ?2",
                        params![thread_id, ns],
                    )
                    .map_err(storage)?;
                }
                tx.commit().map_err(storage)?;
                Ok(row)
            })
            .await?;
        row.map(|r| self.decode_interrupt(r)).transpose()
    }

    async fn delete_thread(&self, config: &RunnableConfig) -> Result<(), CheckpointError> {
        let (thread_id, ns) = thread_key(config)?;
        self.blocking(move |conn| {
            let tx = conn.transaction().map_err(storage)?;
            tx.execute(
                "DELETE FROM checkpoints WHERE thread_id = ?1 AND checkpoint_ns = ?2",
                params![thread_id, ns],
            )
            .map_err(storage)?;
            tx.execute(
                "DELETE FROM interrupts WHERE thread_id = ?1 AND checkpoint_ns = ?2",
                params![thread_id, ns],
            )
            .map_err(storage)?;
            tx.commit().map_err(storage)
        })
        .await
    }
}
