//! Core data-synchronization logic for TaskDeck.
//! This crate is the single source of truth for task list invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use logging::{default_log_level, init_logging};
pub use model::task::{Task, TaskId};
pub use repo::task_repo::{
    RepoError, RepoResult, SortDirection, SortField, SortKey, SubscriptionId, TaskFilter,
    TaskQuery, TaskRepository, TaskSubscription, TasksChanged,
};
pub use service::task_list::TaskListModel;
pub use store::{StoreMode, TaskStore};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
