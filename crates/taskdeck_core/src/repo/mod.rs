//! Repository layer: live views over durable task storage.
//!
//! # Responsibility
//! - Provide CRUD data access keyed by task id.
//! - Isolate SQLite query details from the presentation layer.
//!
//! # Invariants
//! - Storage errors are absorbed and logged at this boundary; public
//!   repository methods never raise to their consumers.

pub mod task_repo;
