//! Task domain model.
//!
//! # Responsibility
//! - Define the task entity and the text validation it depends on.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`.
//! - Deletion removes a task outright; there are no tombstones.

pub mod task;
pub mod validation;
