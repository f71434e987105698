//! Task repository: the authoritative in-process cache of all tasks.
//!
//! # Responsibility
//! - CRUD operations against the persistence store, keyed by task id.
//! - Maintain the live ordered id->task mapping in the active query order.
//! - Notify subscribers whenever the underlying result set changes.
//!
//! # Invariants
//! - The live view is replaced wholesale on change, never mutated in place.
//! - Every storage failure is caught and logged here; no public method
//!   raises to its consumers (best-effort durability contract).
//! - After a mutating call plus save, the live view reflects the session's
//!   current result set, committed or not.

use crate::db::DbError;
use crate::model::task::{Task, TaskId};
use crate::store::TaskStore;
use crossbeam_channel::{unbounded, Receiver, Sender};
use indexmap::IndexMap;
use log::{debug, error};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT id, title, is_complete FROM tasks";

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage-side failures absorbed at the repository boundary.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Column the live view is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Title,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Single configurable sort key for the live view.
///
/// Ties are broken by `id` ascending, which is stable across re-queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortKey {
    fn default() -> Self {
        Self {
            field: SortField::Title,
            direction: SortDirection::Descending,
        }
    }
}

/// Simple substitutable predicate over stored task fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub is_complete: Option<bool>,
    pub title_contains: Option<String>,
}

/// Active query state: optional filter plus the sort key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub filter: Option<TaskFilter>,
    pub sort: SortKey,
}

/// Change event carrying the complete new ordered mapping.
#[derive(Debug, Clone)]
pub struct TasksChanged {
    pub tasks: IndexMap<TaskId, Task>,
}

pub type SubscriptionId = u64;

/// Handle held by one observer of repository change events.
///
/// Dropping the handle alone does not unregister the observer; callers pass
/// `id()` back to [`TaskRepository::unsubscribe`] at teardown. Disconnected
/// channels are also pruned on the next emit.
#[derive(Debug)]
pub struct TaskSubscription {
    id: SubscriptionId,
    receiver: Receiver<TasksChanged>,
}

impl TaskSubscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Channel end receiving one event per observed change.
    pub fn events(&self) -> &Receiver<TasksChanged> {
        &self.receiver
    }
}

/// Single authoritative in-process cache of all tasks, kept consistent with
/// durable storage after any observed change.
pub struct TaskRepository {
    store: TaskStore,
    query: TaskQuery,
    tasks: IndexMap<TaskId, Task>,
    subscribers: Vec<(SubscriptionId, Sender<TasksChanged>)>,
    next_subscriber_id: SubscriptionId,
    synced_tick: u64,
}

impl TaskRepository {
    /// Builds a repository over an injected store and performs the initial
    /// fetch. A failed initial fetch is logged and leaves the view empty.
    pub fn new(store: TaskStore) -> Self {
        let mut repo = Self {
            synced_tick: store.change_tick(),
            store,
            query: TaskQuery::default(),
            tasks: IndexMap::new(),
            subscribers: Vec::new(),
            next_subscriber_id: 0,
        };
        match repo.fetch_tasks() {
            Ok(tasks) => repo.tasks = tasks,
            Err(err) => error!("event=task_fetch module=repo status=error error={err}"),
        }
        repo
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    /// Returns the active query state.
    pub fn query(&self) -> &TaskQuery {
        &self.query
    }

    /// Creates a task with a fresh id, appends a durable record and saves.
    ///
    /// Never fails visibly: a persistence failure is logged and superseded by
    /// the next successful save.
    pub fn create(&mut self, title: impl Into<String>) -> Task {
        let task = Task::new(title);
        match self.insert_record(&task) {
            Ok(()) => debug!("event=task_create module=repo status=ok id={}", task.id),
            Err(err) => error!(
                "event=task_create module=repo status=error id={} error={err}",
                task.id
            ),
        }
        self.store.scoped_save();
        self.sync_changes();
        task
    }

    /// Overwrites the stored record's mutable fields (`title`,
    /// `is_complete`), inserting a new record when the id is unknown.
    ///
    /// The upsert fallback lets callers synthesize an id client-side and rely
    /// on `update` to persist it either way; callers must keep `id` stable
    /// across calls for the same logical task.
    pub fn update(&mut self, task: &Task) {
        if let Err(err) = self.upsert_record(task) {
            error!(
                "event=task_update module=repo status=error id={} error={err}",
                task.id
            );
        }
        self.store.scoped_save();
        self.sync_changes();
    }

    /// Removes the stored record and saves; a silent no-op when the id is
    /// unknown.
    pub fn delete(&mut self, task: &Task) {
        match self.delete_record(task.id) {
            Ok(true) => debug!("event=task_delete module=repo status=ok id={}", task.id),
            Ok(false) => debug!("event=task_delete module=repo status=noop id={}", task.id),
            Err(err) => error!(
                "event=task_delete module=repo status=error id={} error={err}",
                task.id
            ),
        }
        self.store.scoped_save();
        self.sync_changes();
    }

    /// Returns the cached task for `id`, without touching the durable store.
    pub fn get(&self, id: TaskId) -> Option<Task> {
        self.tasks.get(&id).cloned()
    }

    /// Current-snapshot accessor for the live ordered view.
    pub fn snapshot(&self) -> IndexMap<TaskId, Task> {
        self.tasks.clone()
    }

    /// Re-executes the durable-store query. Each `Some` override replaces the
    /// corresponding part of the active query; `None` keeps it.
    ///
    /// On success the whole live view is swapped and observers are notified,
    /// even when the result set is unchanged. A failed fetch is logged and
    /// leaves the view untouched.
    pub fn refresh(&mut self, filter: Option<TaskFilter>, sort: Option<SortKey>) {
        if let Some(filter) = filter {
            self.query.filter = Some(filter);
        }
        if let Some(sort) = sort {
            self.query.sort = sort;
        }
        self.requery();
    }

    /// Clears the filter, restores the default sort key and re-queries.
    pub fn reset(&mut self) {
        self.query = TaskQuery::default();
        self.requery();
    }

    /// Registers an observer of change events.
    pub fn subscribe(&mut self) -> TaskSubscription {
        let (sender, receiver) = unbounded();
        let id = self.next_subscriber_id;
        self.next_subscriber_id += 1;
        self.subscribers.push((id, sender));
        TaskSubscription { id, receiver }
    }

    /// Unregisters the observer with the given id; unknown ids are ignored.
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
    }

    fn requery(&mut self) {
        self.synced_tick = self.store.change_tick();
        match self.fetch_tasks() {
            Ok(tasks) => {
                self.tasks = tasks;
                self.notify();
            }
            Err(err) => error!("event=task_fetch module=repo status=error error={err}"),
        }
    }

    /// Folds storage-engine change notifications into the live view: when the
    /// store's change tick moved since the last synchronization, the active
    /// query is re-run, the view swapped and a change event emitted.
    fn sync_changes(&mut self) {
        if self.store.change_tick() == self.synced_tick {
            return;
        }
        self.requery();
    }

    fn notify(&mut self) {
        let event = TasksChanged {
            tasks: self.tasks.clone(),
        };
        self.subscribers.retain(|(id, sender)| {
            let delivered = sender.send(event.clone()).is_ok();
            if !delivered {
                debug!("event=subscriber_pruned module=repo id={id}");
            }
            delivered
        });
    }

    fn insert_record(&self, task: &Task) -> RepoResult<()> {
        self.store.begin_write()?;
        self.store.conn().execute(
            "INSERT INTO tasks (id, title, is_complete) VALUES (?1, ?2, ?3);",
            params![
                task.id.to_string(),
                task.title.as_str(),
                bool_to_int(task.is_complete)
            ],
        )?;
        Ok(())
    }

    fn upsert_record(&self, task: &Task) -> RepoResult<()> {
        self.store.begin_write()?;
        let changed = self.store.conn().execute(
            "UPDATE tasks SET title = ?2, is_complete = ?3 WHERE id = ?1;",
            params![
                task.id.to_string(),
                task.title.as_str(),
                bool_to_int(task.is_complete)
            ],
        )?;
        if changed == 0 {
            // Unknown id: fall back to insert.
            self.insert_record(task)?;
        }
        Ok(())
    }

    fn delete_record(&self, id: TaskId) -> RepoResult<bool> {
        self.store.begin_write()?;
        let changed = self
            .store
            .conn()
            .execute("DELETE FROM tasks WHERE id = ?1;", [id.to_string()])?;
        Ok(changed > 0)
    }

    fn fetch_tasks(&self) -> RepoResult<IndexMap<TaskId, Task>> {
        let mut sql = format!("{TASK_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(filter) = &self.query.filter {
            if let Some(is_complete) = filter.is_complete {
                sql.push_str(" AND is_complete = ?");
                bind_values.push(Value::Integer(bool_to_int(is_complete)));
            }
            if let Some(fragment) = &filter.title_contains {
                sql.push_str(" AND title LIKE ?");
                bind_values.push(Value::Text(format!("%{fragment}%")));
            }
        }

        sql.push_str(&order_clause(self.query.sort));

        let mut stmt = self.store.conn().prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tasks = IndexMap::new();

        while let Some(row) = rows.next()? {
            let task = parse_task_row(row)?;
            tasks.insert(task.id, task);
        }

        Ok(tasks)
    }
}

fn order_clause(sort: SortKey) -> String {
    let column = match sort.field {
        SortField::Title => "title",
        SortField::CreatedAt => "created_at",
    };
    let direction = match sort.direction {
        SortDirection::Ascending => "ASC",
        SortDirection::Descending => "DESC",
    };
    format!(" ORDER BY {column} {direction}, id ASC")
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in tasks.id"))
    })?;

    let is_complete = match row.get::<_, i64>("is_complete")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_complete value `{other}` in tasks.is_complete"
            )));
        }
    };

    Ok(Task {
        id,
        title: row.get("title")?,
        is_complete,
    })
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
