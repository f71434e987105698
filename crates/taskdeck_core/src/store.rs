//! Persistence store owning the durable SQLite session.
//!
//! # Responsibility
//! - Open one database session per runtime mode (normal/preview/testing).
//! - Provide scoped save semantics over the session's pending mutations.
//! - Surface storage-engine change notifications as a monotonic tick.
//!
//! # Invariants
//! - Mutations between two saves run inside one explicit transaction.
//! - `scoped_save` never raises; a failed commit is logged and the pending
//!   transaction stays open until the next successful save.
//! - The change tick moves on every row insert/update/delete in the session.

use crate::db::{open_db, open_db_in_memory, DbError, DbResult};
use log::{debug, error};
use rusqlite::hooks::Action;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

const DB_DIR_NAME: &str = "taskdeck";
const DB_FILE_NAME: &str = "taskdeck.sqlite3";
const PREVIEW_SEED_COUNT: usize = 10;

/// Runtime persistence mode selected at process level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    /// File-backed database at the fixed platform data location.
    Normal,
    /// Transient in-memory store pre-seeded with sample tasks.
    Preview,
    /// Transient in-memory store, empty.
    Testing,
}

/// Owner of the single durable SQLite session.
pub struct TaskStore {
    conn: Connection,
    change_tick: Arc<AtomicU64>,
}

impl TaskStore {
    /// Opens the store for the given runtime mode.
    ///
    /// Failure is fatal to the caller: there is no degraded mode, the error
    /// is returned as-is.
    pub fn open(mode: StoreMode) -> DbResult<Self> {
        match mode {
            StoreMode::Normal => Ok(Self::from_connection(open_db(default_db_path()?)?)),
            StoreMode::Preview => {
                let store = Self::from_connection(open_db_in_memory()?);
                store.seed_preview_tasks()?;
                Ok(store)
            }
            StoreMode::Testing => Ok(Self::from_connection(open_db_in_memory()?)),
        }
    }

    /// Opens a file-backed store at an explicit path.
    pub fn open_at(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    fn from_connection(conn: Connection) -> Self {
        let change_tick = Arc::new(AtomicU64::new(0));
        let hook_tick = Arc::clone(&change_tick);
        conn.update_hook(Some(
            move |_action: Action, _db: &str, _table: &str, _rowid: i64| {
                hook_tick.fetch_add(1, Ordering::SeqCst);
            },
        ));
        Self { conn, change_tick }
    }

    /// Commits all pending mutations in the current session, if any exist.
    ///
    /// A no-op when nothing is pending. A failed commit is logged, not
    /// raised: the uncommitted session state remains the working truth until
    /// the next successful save, and a crash before that loses the delta.
    pub fn scoped_save(&self) {
        if self.conn.is_autocommit() {
            return;
        }
        match self.conn.execute_batch("COMMIT;") {
            Ok(()) => debug!("event=scoped_save module=store status=ok"),
            Err(err) => {
                error!("event=scoped_save module=store status=error error={err}");
            }
        }
    }

    /// Whether the session holds mutations not yet committed by a save.
    pub fn has_pending_changes(&self) -> bool {
        !self.conn.is_autocommit()
    }

    /// Monotonic counter of row changes observed in this session.
    pub fn change_tick(&self) -> u64 {
        self.change_tick.load(Ordering::SeqCst)
    }

    /// Opens the write transaction for the current save scope if none is
    /// active yet.
    pub(crate) fn begin_write(&self) -> DbResult<()> {
        if self.conn.is_autocommit() {
            self.conn.execute_batch("BEGIN IMMEDIATE;")?;
        }
        Ok(())
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    fn seed_preview_tasks(&self) -> DbResult<()> {
        for index in 0..PREVIEW_SEED_COUNT {
            self.conn.execute(
                "INSERT INTO tasks (id, title, is_complete) VALUES (?1, ?2, 0);",
                params![Uuid::new_v4().to_string(), format!("Todo {index}")],
            )?;
        }
        Ok(())
    }
}

fn default_db_path() -> DbResult<PathBuf> {
    let base = dirs::data_local_dir().ok_or(DbError::DataDirUnavailable)?;
    let dir = base.join(DB_DIR_NAME);
    std::fs::create_dir_all(&dir)?;
    Ok(dir.join(DB_FILE_NAME))
}
