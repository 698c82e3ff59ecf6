//! Persistence layer: key-value backends and the task collection adapter.
//!
//! # Responsibility
//! - Define the storage contract the rest of core depends on.
//! - Isolate SQLite and serialization details from the task store.
//!
//! # Invariants
//! - Storage failures are converted to `PersistenceError` at this boundary
//!   and never escape as panics.

pub mod kv_store;
pub mod task_persistence;
