//! Task store: the in-memory state machine behind the task list.
//!
//! # Responsibility
//! - Own the task collection and the ephemeral view state.
//! - Validate input, apply CRUD mutations, and persist after each one.
//! - Derive the visible subset and collection statistics.
//!
//! # Invariants
//! - The derived view is recomputed before every mutating call returns.
//! - Stats always describe the full collection, ignoring search and filter.
//! - Persistence failures become queued warnings; they never fail or undo an
//!   in-memory mutation.
//! - View state (search, filter, editing slot) is never persisted.

use crate::config::{ConfigError, CoreConfig};
use crate::model::task::{Task, TaskId};
use crate::model::validation::{validate_text, ValidationError};
use crate::repo::kv_store::KeyValueStore;
use crate::repo::task_persistence::{PersistenceError, TaskPersistence};
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Failure of a store operation. State is unchanged whenever one is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    Validation(ValidationError),
    NotFound(TaskId),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Completion-status filter applied to the derived view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl StatusFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Pending => !task.is_completed(),
            Self::Completed => task.is_completed(),
        }
    }
}

impl Display for StatusFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = InvalidStatusFilter;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            _ => Err(InvalidStatusFilter(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidStatusFilter(pub String);

impl Display for InvalidStatusFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unsupported status filter `{}`; expected all|pending|completed",
            self.0
        )
    }
}

impl Error for InvalidStatusFilter {}

/// Counters over the full collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskStats {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
}

/// Read-side view of the editing slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditingState<'a> {
    Idle,
    Active(&'a Task),
    /// The slot names a task that is no longer in the collection.
    Missing(&'a TaskId),
}

/// Owner of the task collection and view state.
pub struct TaskStore<S: KeyValueStore> {
    persistence: TaskPersistence<S>,
    config: CoreConfig,
    tasks: Vec<Task>,
    search_term: String,
    filter: StatusFilter,
    editing: Option<TaskId>,
    visible: Vec<usize>,
    warnings: Vec<PersistenceError>,
}

impl<S: KeyValueStore> TaskStore<S> {
    /// Builds a store over `backend` and loads the saved collection.
    ///
    /// A load warning (corrupt or unreadable data) is queued for
    /// [`TaskStore::take_warnings`]; it does not fail construction.
    ///
    /// # Errors
    /// Returns `ConfigError` when `config` is unusable.
    pub fn open(backend: S, config: CoreConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let persistence = TaskPersistence::new(backend, config.storage_key.clone());
        let outcome = persistence.load();

        let mut store = Self {
            persistence,
            config,
            tasks: outcome.tasks,
            search_term: String::new(),
            filter: StatusFilter::All,
            editing: None,
            visible: Vec::new(),
            warnings: outcome.warning.into_iter().collect(),
        };
        store.recompute_view();

        info!(
            "event=store_open module=store status=ok count={} warnings={}",
            store.tasks.len(),
            store.warnings.len()
        );
        Ok(store)
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Full collection, newest first.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id() == id)
    }

    /// Tasks matching the active search and filter, in collection order.
    pub fn visible(&self) -> Vec<&Task> {
        self.visible.iter().map(|&index| &self.tasks[index]).collect()
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn filter(&self) -> StatusFilter {
        self.filter
    }

    /// Validates `raw`, prepends a new task, and persists.
    ///
    /// # Errors
    /// Returns `StoreError::Validation` without touching state.
    pub fn add(&mut self, raw: &str) -> Result<Task, StoreError> {
        let text = validate_text(raw, self.config.max_text_len).map_err(|err| {
            debug!("event=task_add module=store status=rejected reason={err:?}");
            err
        })?;

        let task = Task::new(text);
        self.tasks.insert(0, task.clone());
        info!(
            "event=task_add module=store status=ok task_id={}",
            task.id()
        );
        self.commit();
        Ok(task)
    }

    /// Replaces the text of task `id`.
    ///
    /// A successful update of the task being edited returns the editing slot
    /// to idle.
    ///
    /// # Errors
    /// - `NotFound` when `id` is not in the collection.
    /// - `Validation` from re-validating `raw`; the task is left unchanged.
    pub fn update(&mut self, id: &TaskId, raw: &str) -> Result<Task, StoreError> {
        let index = self.position(id)?;
        let max_len = self.config.max_text_len;
        self.tasks[index].update_text(raw, max_len).map_err(|err| {
            debug!("event=task_update module=store status=rejected task_id={id} reason={err:?}");
            err
        })?;

        if self.editing.as_ref() == Some(id) {
            self.editing = None;
        }
        info!("event=task_update module=store status=ok task_id={id}");
        self.commit();
        Ok(self.tasks[index].clone())
    }

    /// Flips completion of task `id`.
    ///
    /// # Errors
    /// `NotFound` when `id` is not in the collection.
    pub fn toggle(&mut self, id: &TaskId) -> Result<Task, StoreError> {
        let index = self.position(id)?;
        self.tasks[index].toggle_complete();
        info!(
            "event=task_toggle module=store status=ok task_id={} completed={}",
            id,
            self.tasks[index].is_completed()
        );
        self.commit();
        Ok(self.tasks[index].clone())
    }

    /// Removes task `id`, keeping the order of the rest.
    ///
    /// # Errors
    /// `NotFound` when `id` is not in the collection.
    pub fn delete(&mut self, id: &TaskId) -> Result<Task, StoreError> {
        let index = self.position(id)?;
        let removed = self.tasks.remove(index);
        info!("event=task_delete module=store status=ok task_id={id}");
        self.commit();
        Ok(removed)
    }

    /// Removes every completed task and returns how many were dropped.
    pub fn clear_completed(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|task| !task.is_completed());
        let removed = before - self.tasks.len();
        if removed > 0 {
            info!("event=task_clear_completed module=store status=ok removed={removed}");
            self.commit();
        }
        removed
    }

    /// Drops the whole collection and the stored blob.
    pub fn clear_all(&mut self) {
        let removed = self.tasks.len();
        self.tasks.clear();
        self.editing = None;
        if let Err(warning) = self.persistence.clear() {
            self.warnings.push(warning);
        }
        info!("event=task_clear_all module=store status=ok removed={removed}");
        self.recompute_view();
    }

    /// Sets the case-insensitive substring search. Blank terms match all.
    pub fn set_search(&mut self, term: &str) {
        self.search_term = term.trim().to_lowercase();
        self.recompute_view();
    }

    pub fn set_filter(&mut self, filter: StatusFilter) {
        self.filter = filter;
        self.recompute_view();
    }

    /// Points the editing slot at `id`. Existence is not checked.
    pub fn start_editing(&mut self, id: TaskId) {
        self.editing = Some(id);
    }

    pub fn stop_editing(&mut self) {
        self.editing = None;
    }

    pub fn editing(&self) -> EditingState<'_> {
        match &self.editing {
            None => EditingState::Idle,
            Some(id) => match self.get(id) {
                Some(task) => EditingState::Active(task),
                None => EditingState::Missing(id),
            },
        }
    }

    pub fn stats(&self) -> TaskStats {
        let completed = self
            .tasks
            .iter()
            .filter(|task| task.is_completed())
            .count();
        TaskStats {
            total: self.tasks.len(),
            pending: self.tasks.len() - completed,
            completed,
        }
    }

    /// Drains persistence warnings queued since the previous call.
    pub fn take_warnings(&mut self) -> Vec<PersistenceError> {
        std::mem::take(&mut self.warnings)
    }

    fn position(&self, id: &TaskId) -> Result<usize, StoreError> {
        self.tasks
            .iter()
            .position(|task| task.id() == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    fn commit(&mut self) {
        if let Err(warning) = self.persistence.save(&self.tasks) {
            self.warnings.push(warning);
        }
        self.recompute_view();
    }

    fn recompute_view(&mut self) {
        let term = self.search_term.as_str();
        let filter = self.filter;
        let visible: Vec<usize> = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| term.is_empty() || task.text().to_lowercase().contains(term))
            .filter(|(_, task)| filter.matches(task))
            .map(|(index, _)| index)
            .collect();
        self.visible = visible;
    }
}

#[cfg(test)]
mod tests {
    use super::{StatusFilter, TaskStore};
    use crate::config::CoreConfig;
    use crate::repo::kv_store::MemoryKeyValueStore;

    #[test]
    fn status_filter_parses_case_insensitively() {
        assert_eq!(" Pending ".parse::<StatusFilter>().unwrap(), StatusFilter::Pending);
        assert_eq!("ALL".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        let err = "done".parse::<StatusFilter>().unwrap_err();
        assert!(err.to_string().contains("all|pending|completed"));
    }

    #[test]
    fn add_prepends_newest_first() {
        let mut store = TaskStore::open(MemoryKeyValueStore::new(), CoreConfig::default()).unwrap();
        store.add("first").unwrap();
        store.add("second").unwrap();

        let texts = store.tasks().iter().map(|task| task.text()).collect::<Vec<_>>();
        assert_eq!(texts, vec!["second", "first"]);
    }

    #[test]
    fn configured_limit_is_enforced() {
        let config = CoreConfig::default().with_max_text_len(5);
        let mut store = TaskStore::open(MemoryKeyValueStore::new(), config).unwrap();
        assert!(store.add("12345").is_ok());
        assert!(store.add("123456").is_err());
    }
}
