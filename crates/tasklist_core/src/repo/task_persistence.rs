//! Whole-collection task persistence over a key-value backend.
//!
//! # Responsibility
//! - Encode the full task collection into one JSON blob under a fixed key.
//! - Decode stored blobs defensively, record by record.
//!
//! # Invariants
//! - `load` never fails: corrupt or unreadable storage yields an empty (or
//!   partially recovered) collection plus at most one warning.
//! - `save` always rewrites the entire collection in a single backend write.
//! - Decoded collections never contain duplicate ids.
//! - Task text never appears in log lines.

use crate::model::task::{DecodeError, Task, TaskId, TaskRecord};
use crate::repo::kv_store::KeyValueStore;
use log::{info, warn};
use serde_json::Value;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Non-fatal storage failure surfaced to callers as a warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// Stored data could not be read or decoded.
    Read { reason: String },
    /// The collection could not be written (e.g. quota exceeded).
    Write { reason: String },
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { reason } => write!(f, "could not read saved tasks: {reason}"),
            Self::Write { reason } => write!(f, "could not save tasks: {reason}"),
        }
    }
}

impl Error for PersistenceError {}

/// Result of reading the stored collection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoadOutcome {
    /// Recovered tasks in stored order.
    pub tasks: Vec<Task>,
    /// Present when anything had to be discarded.
    pub warning: Option<PersistenceError>,
}

/// Persistence adapter binding a backend to the collection key.
pub struct TaskPersistence<S: KeyValueStore> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> TaskPersistence<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn backend(&self) -> &S {
        &self.store
    }

    /// Reads and decodes the stored collection.
    ///
    /// An absent key is a first run and produces no warning.
    pub fn load(&self) -> LoadOutcome {
        let started_at = Instant::now();

        let blob = match self.store.get(&self.key) {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                info!(
                    "event=storage_load module=persistence status=ok count=0 source=absent duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                return LoadOutcome::default();
            }
            Err(err) => {
                warn!(
                    "event=storage_load module=persistence status=error error_code=read_failed error={}",
                    err
                );
                return LoadOutcome {
                    tasks: Vec::new(),
                    warning: Some(PersistenceError::Read {
                        reason: err.to_string(),
                    }),
                };
            }
        };

        let values = match serde_json::from_str::<Vec<Value>>(&blob) {
            Ok(values) => values,
            Err(err) => {
                warn!(
                    "event=storage_load module=persistence status=error error_code=corrupt_blob category={:?} line={} column={} blob_bytes={}",
                    err.classify(),
                    err.line(),
                    err.column(),
                    blob.len()
                );
                return LoadOutcome {
                    tasks: Vec::new(),
                    warning: Some(PersistenceError::Read {
                        reason: "stored data is not a task list; starting empty".to_string(),
                    }),
                };
            }
        };

        let stored_count = values.len();
        let (tasks, rejected) = decode_records(values);
        let warning = rejected.summary().map(|reason| {
            warn!(
                "event=storage_load module=persistence status=partial stored={} kept={} dropped={}",
                stored_count,
                tasks.len(),
                rejected.count
            );
            PersistenceError::Read { reason }
        });

        info!(
            "event=storage_load module=persistence status=ok count={} duration_ms={}",
            tasks.len(),
            started_at.elapsed().as_millis()
        );
        LoadOutcome { tasks, warning }
    }

    /// Rewrites the whole stored collection.
    ///
    /// # Errors
    /// Returns `PersistenceError::Write` when encoding or the backend write
    /// fails. The caller's in-memory tasks are never touched.
    pub fn save(&self, tasks: &[Task]) -> Result<(), PersistenceError> {
        let records = tasks.iter().map(Task::to_record).collect::<Vec<_>>();
        let blob = serde_json::to_string(&records).map_err(|err| {
            warn!(
                "event=storage_save module=persistence status=error error_code=encode_failed error={}",
                err
            );
            PersistenceError::Write {
                reason: err.to_string(),
            }
        })?;

        match self.store.set(&self.key, &blob) {
            Ok(()) => {
                info!(
                    "event=storage_save module=persistence status=ok count={} blob_bytes={}",
                    tasks.len(),
                    blob.len()
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    "event=storage_save module=persistence status=error error_code=write_failed count={} error={}",
                    tasks.len(),
                    err
                );
                Err(PersistenceError::Write {
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Removes the stored blob. Missing data is not an error.
    pub fn clear(&self) -> Result<(), PersistenceError> {
        self.store.remove(&self.key).map_err(|err| {
            warn!(
                "event=storage_clear module=persistence status=error error_code=remove_failed error={}",
                err
            );
            PersistenceError::Write {
                reason: err.to_string(),
            }
        })?;
        info!("event=storage_clear module=persistence status=ok");
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Rejected {
    count: usize,
    first_reason: Option<String>,
}

impl Rejected {
    fn push(&mut self, reason: String) {
        self.count += 1;
        self.first_reason.get_or_insert(reason);
    }

    fn summary(&self) -> Option<String> {
        self.first_reason.as_ref().map(|first| {
            format!(
                "dropped {} unreadable task record(s); first problem: {}",
                self.count, first
            )
        })
    }
}

fn decode_records(values: Vec<Value>) -> (Vec<Task>, Rejected) {
    let mut tasks = Vec::with_capacity(values.len());
    let mut seen: HashSet<TaskId> = HashSet::with_capacity(values.len());
    let mut rejected = Rejected::default();

    for value in values {
        let decoded = serde_json::from_value::<TaskRecord>(value)
            .map_err(|err| DecodeError::Malformed(err.to_string()))
            .and_then(Task::from_record);

        match decoded {
            Ok(task) if seen.insert(task.id().clone()) => tasks.push(task),
            Ok(task) => rejected.push(format!("duplicate task id `{}`", task.id())),
            Err(err) => rejected.push(err.to_string()),
        }
    }

    (tasks, rejected)
}
