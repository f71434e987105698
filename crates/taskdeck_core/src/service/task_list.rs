//! Task list presentation model.
//!
//! # Responsibility
//! - Project the repository's live ordered mapping into an ordered sequence.
//! - Expose the add/toggle/delete actions an interface layer invokes.
//!
//! # Invariants
//! - The repository subscription spans construction to drop.
//! - A mutation becomes visible in `tasks()` only after the next
//!   `drain_changes` call on the rendering context, in mutation order.

use crate::model::task::Task;
use crate::repo::task_repo::{TaskRepository, TaskSubscription, TasksChanged};
use log::debug;

/// Ordered task sequence plus semantic actions for one list screen.
pub struct TaskListModel {
    repo: TaskRepository,
    subscription: TaskSubscription,
    tasks: Vec<Task>,
    active_count: usize,
}

impl TaskListModel {
    /// Builds the model over an owned repository, subscribes to its change
    /// stream and seeds the projection from the current snapshot.
    pub fn new(mut repo: TaskRepository) -> Self {
        let subscription = repo.subscribe();
        let tasks: Vec<Task> = repo.snapshot().into_values().collect();
        let active_count = count_active(&tasks);
        Self {
            repo,
            subscription,
            tasks,
            active_count,
        }
    }

    /// Ordered task sequence as of the last applied change event.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Number of incomplete tasks, recomputed on every applied change.
    pub fn active_count(&self) -> usize {
        self.active_count
    }

    pub fn repo(&self) -> &TaskRepository {
        &self.repo
    }

    /// Mutable repository access for explicit re-queries (`refresh`/`reset`).
    pub fn repo_mut(&mut self) -> &mut TaskRepository {
        &mut self.repo
    }

    /// Creates a task unless the submitted title is empty.
    ///
    /// The new task becomes visible once the change event is drained, not
    /// synchronously on return.
    pub fn add_task(&mut self, title: &str) {
        if title.is_empty() {
            debug!("event=add_task module=service status=rejected reason=empty_title");
            return;
        }
        self.repo.create(title);
    }

    /// Flips `is_complete` on a copy of the given task and persists it.
    pub fn toggle_completion(&mut self, task: &Task) {
        let mut updated = task.clone();
        updated.is_complete = !updated.is_complete;
        self.repo.update(&updated);
    }

    /// Deletes the given task; an unknown id is a silent no-op.
    pub fn delete_task(&mut self, task: &Task) {
        self.repo.delete(task);
    }

    /// Applies pending change events on the caller's context.
    ///
    /// Events are coalesced to the latest snapshot, so one drain after a
    /// burst of mutations settles on the final state.
    pub fn drain_changes(&mut self) {
        let mut latest: Option<TasksChanged> = None;
        while let Ok(event) = self.subscription.events().try_recv() {
            latest = Some(event);
        }
        if let Some(event) = latest {
            self.tasks = event.tasks.into_values().collect();
            self.active_count = count_active(&self.tasks);
        }
    }
}

impl Drop for TaskListModel {
    fn drop(&mut self) {
        let id = self.subscription.id();
        self.repo.unsubscribe(id);
    }
}

fn count_active(tasks: &[Task]) -> usize {
    tasks.iter().filter(|task| !task.is_complete).count()
}
