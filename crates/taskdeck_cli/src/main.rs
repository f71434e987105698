//! CLI smoke entry point.
//!
//! # Responsibility
//! - Select the persistence mode (normal vs. in-memory) from process args.
//! - Verify core crate wiring with a deterministic probe.

use taskdeck_core::{core_version, StoreMode, TaskListModel, TaskRepository, TaskStore};

fn main() {
    let store = match TaskStore::open(store_mode_from_args()) {
        Ok(store) => store,
        Err(err) => {
            // Store-open failure is fatal; there is no degraded mode.
            eprintln!("failed to open task store: {err}");
            std::process::exit(1);
        }
    };

    let repo = TaskRepository::new(store);
    let mut model = TaskListModel::new(repo);
    model.drain_changes();

    println!("taskdeck_core version={}", core_version());
    println!("tasks={} active={}", model.tasks().len(), model.active_count());
}

fn store_mode_from_args() -> StoreMode {
    let mut mode = StoreMode::Normal;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--in-memory" => mode = StoreMode::Testing,
            "--preview" => mode = StoreMode::Preview,
            _ => {}
        }
    }
    mode
}
