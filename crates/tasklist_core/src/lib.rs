//! Core state and persistence for the task list.
//! This crate is the single source of truth for task invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig, DEFAULT_MAX_TEXT_LEN, DEFAULT_STORAGE_KEY};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::task::{
    format_timestamp, now_millis, DecodeError, Task, TaskId, TaskRecord, Timestamp,
};
pub use model::validation::{validate_text, TaskText, ValidationError};
pub use repo::kv_store::{
    KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore, StorageError, StorageResult,
};
pub use repo::task_persistence::{LoadOutcome, PersistenceError, TaskPersistence};
pub use service::task_store::{
    EditingState, InvalidStatusFilter, StatusFilter, StoreError, TaskStats, TaskStore,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
