//! Task store contract and SQLite implementation.
//!
//! # Responsibility
//! - Insert accepted tasks and assign their `RecordId`.
//! - Serve nearest-name queries from the similarity index.
//! - Release the SQLite connection exactly once.
//!
//! # Invariants
//! - Each insert is one statement: a row is fully present or absent.
//! - Stored `created_at` never decreases across inserts; an older stamp is
//!   raised to the newest stored value.
//! - Inserted rows are visible to the very next query.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::task::{
    format_timestamp, Priority, RecordId, SimilarityResult, StoredTask, TaskRecord,
    TaskValidationError,
};
use crate::search::similarity::nearest;
use log::{debug, error, info, warn};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Instant;
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT
    id,
    name,
    priority,
    due_date,
    completed,
    list_name,
    created_at
FROM tasks";

pub type StoreResult<T> = Result<T, StoreError>;

/// Task store error.
#[derive(Debug)]
pub enum StoreError {
    /// Operation attempted after `close()`. Indicates a caller bug.
    Closed,
    /// A record could not be persisted. Nothing was written.
    Write(DbError),
    Db(DbError),
    Validation(TaskValidationError),
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "task store is closed"),
            Self::Write(err) => write!(f, "failed to persist task: {err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Write(err) | Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Closed | Self::InvalidData(_) => None,
        }
    }
}

impl From<TaskValidationError> for StoreError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Durable keeper of accepted tasks.
pub trait TaskStore {
    /// Inserts `record` and returns it exactly as persisted, including a
    /// raised `created_at`. Never retried internally.
    fn insert(&mut self, record: TaskRecord) -> StoreResult<StoredTask>;

    /// Inserts `record` and returns its new id.
    fn add(&mut self, record: &TaskRecord) -> StoreResult<RecordId> {
        self.insert(record.clone()).map(|stored| stored.id)
    }

    /// Returns at most `limit` records nearest to `name`, most similar first.
    fn query_by_name(&self, name: &str, limit: usize) -> StoreResult<Vec<SimilarityResult>>;

    /// Returns every stored record in insertion order.
    fn list_all(&self) -> StoreResult<Vec<StoredTask>>;

    fn len(&self) -> StoreResult<usize>;

    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Releases held resources. Calling it again is a no-op.
    fn close(&mut self) -> StoreResult<()>;
}

/// SQLite-backed task store. Closes itself on drop if still open.
pub struct SqliteTaskStore {
    conn: Option<Connection>,
}

impl SqliteTaskStore {
    /// Opens the task database at `path`, creating it when missing.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps a connection that already went through `db::open_db*`.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn: Some(conn) }
    }

    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    fn conn(&self) -> StoreResult<&Connection> {
        self.conn.as_ref().ok_or(StoreError::Closed)
    }

    fn load_all(conn: &Connection) -> StoreResult<Vec<StoredTask>> {
        let mut stmt = conn.prepare(&format!("{TASK_SELECT_SQL} ORDER BY seq ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();

        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }

        Ok(tasks)
    }
}

impl TaskStore for SqliteTaskStore {
    fn insert(&mut self, mut record: TaskRecord) -> StoreResult<StoredTask> {
        let conn = self.conn()?;
        record.validate()?;

        let started_at = Instant::now();
        let id = Uuid::new_v4();
        let requested = format_timestamp(record.created_at_utc()?);

        let written = insert_task(conn, id, &record, &requested).map_err(|err| {
            error!(
                "event=task_add module=repo status=error duration_ms={} error_code=task_write_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            StoreError::Write(DbError::Sqlite(err))
        })?;

        if written != requested {
            debug!(
                "event=task_add module=repo status=adjusted record_id={} reason=created_at_behind_newest",
                id
            );
        }
        info!(
            "event=task_add module=repo status=ok record_id={} priority={} duration_ms={}",
            id,
            record.priority.as_i64(),
            started_at.elapsed().as_millis()
        );
        record.created_at = written;
        Ok(StoredTask { id, record })
    }

    fn query_by_name(&self, name: &str, limit: usize) -> StoreResult<Vec<SimilarityResult>> {
        let conn = self.conn()?;
        if limit == 0 {
            return Ok(Vec::new());
        }

        let started_at = Instant::now();
        let candidates = Self::load_all(conn)?;
        let results = nearest(name, &candidates, limit);

        debug!(
            "event=task_query module=repo status=ok candidates={} returned={} duration_ms={}",
            candidates.len(),
            results.len(),
            started_at.elapsed().as_millis()
        );
        Ok(results)
    }

    fn list_all(&self) -> StoreResult<Vec<StoredTask>> {
        Self::load_all(self.conn()?)
    }

    fn len(&self) -> StoreResult<usize> {
        let count = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM tasks;", [], |row| row.get::<_, i64>(0))?;
        usize::try_from(count)
            .map_err(|_| StoreError::InvalidData(format!("negative task count `{count}`")))
    }

    fn close(&mut self) -> StoreResult<()> {
        let Some(conn) = self.conn.take() else {
            debug!("event=store_close module=repo status=skipped reason=already_closed");
            return Ok(());
        };

        match conn.close() {
            Ok(()) => {
                info!("event=store_close module=repo status=ok");
                Ok(())
            }
            Err((_conn, err)) => {
                error!(
                    "event=store_close module=repo status=error error_code=store_close_failed error={}",
                    err
                );
                Err(StoreError::Db(DbError::Sqlite(err)))
            }
        }
    }
}

impl Drop for SqliteTaskStore {
    fn drop(&mut self) {
        if self.conn.is_none() {
            return;
        }
        if let Err(err) = self.close() {
            warn!("event=store_close module=repo status=error reason=drop error={err}");
        }
    }
}

/// Writes one row and returns the `created_at` actually stored.
fn insert_task(
    conn: &Connection,
    id: RecordId,
    record: &TaskRecord,
    requested_created_at: &str,
) -> rusqlite::Result<String> {
    let newest = conn.query_row("SELECT MAX(created_at) FROM tasks;", [], |row| {
        row.get::<_, Option<String>>(0)
    })?;
    let created_at = match newest {
        Some(newest) if newest.as_str() > requested_created_at => newest,
        _ => requested_created_at.to_string(),
    };

    conn.execute(
        "INSERT INTO tasks (
            id,
            name,
            priority,
            due_date,
            completed,
            list_name,
            created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        params![
            id.to_string(),
            record.name.as_str(),
            record.priority.as_i64(),
            record.due_date.as_deref(),
            bool_to_int(record.completed),
            record.list_name.as_deref(),
            created_at.as_str(),
        ],
    )?;

    Ok(created_at)
}

fn parse_task_row(row: &Row<'_>) -> StoreResult<StoredTask> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        StoreError::InvalidData(format!("invalid uuid value `{id_text}` in tasks.id"))
    })?;

    let priority_value: i64 = row.get("priority")?;
    let priority = Priority::try_from(priority_value).map_err(|_| {
        StoreError::InvalidData(format!(
            "invalid priority `{priority_value}` in tasks.priority"
        ))
    })?;

    let completed = match row.get::<_, i64>("completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(StoreError::InvalidData(format!(
                "invalid completed value `{other}` in tasks.completed"
            )));
        }
    };

    let record = TaskRecord {
        name: row.get("name")?,
        priority,
        due_date: row.get("due_date")?,
        completed,
        list_name: row.get("list_name")?,
        created_at: row.get("created_at")?,
    };
    record.validate()?;
    Ok(StoredTask { id, record })
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
