use tasklist_core::db::open_db_in_memory;
use tasklist_core::{
    CoreConfig, EditingState, KeyValueStore, MemoryKeyValueStore, PersistenceError,
    SqliteKeyValueStore, StatusFilter, StoreError, TaskId, TaskStats, TaskStore, ValidationError,
};

fn open(backend: &MemoryKeyValueStore) -> TaskStore<&MemoryKeyValueStore> {
    TaskStore::open(backend, CoreConfig::default()).unwrap()
}

fn visible_texts<S: KeyValueStore>(store: &TaskStore<S>) -> Vec<String> {
    store
        .visible()
        .into_iter()
        .map(|task| task.text().to_string())
        .collect()
}

fn assert_stats_consistent<S: KeyValueStore>(store: &TaskStore<S>) {
    let stats = store.stats();
    assert_eq!(stats.total, stats.pending + stats.completed);
    assert_eq!(stats.total, store.tasks().len());
}

#[test]
fn fresh_store_starts_empty_without_warnings() {
    let backend = MemoryKeyValueStore::new();
    let mut store = open(&backend);

    assert!(store.tasks().is_empty());
    assert!(store.visible().is_empty());
    assert_eq!(store.stats(), TaskStats::default());
    assert!(store.take_warnings().is_empty());
}

#[test]
fn add_stores_trimmed_text_and_persists() {
    let backend = MemoryKeyValueStore::new();
    let mut store = open(&backend);

    let task = store.add("   Buy milk  ").unwrap();
    assert_eq!(task.text(), "Buy milk");
    assert!(!task.is_completed());

    let reopened = open(&backend);
    assert_eq!(reopened.tasks(), store.tasks());
}

#[test]
fn add_rejects_empty_and_whitespace_without_mutation() {
    let backend = MemoryKeyValueStore::new();
    let mut store = open(&backend);
    store.add("existing").unwrap();

    assert_eq!(
        store.add(""),
        Err(StoreError::Validation(ValidationError::EmptyInput))
    );
    assert_eq!(
        store.add("   "),
        Err(StoreError::Validation(ValidationError::EmptyInput))
    );
    assert_eq!(store.tasks().len(), 1);
}

#[test]
fn add_enforces_length_boundary() {
    let backend = MemoryKeyValueStore::new();
    let mut store = open(&backend);

    assert!(store.add(&"x".repeat(100)).is_ok());
    assert_eq!(
        store.add(&"x".repeat(101)),
        Err(StoreError::Validation(ValidationError::TooLong {
            len: 101,
            max: 100
        }))
    );
    assert_eq!(store.tasks().len(), 1);
}

#[test]
fn update_replaces_text_and_propagates_validation() {
    let backend = MemoryKeyValueStore::new();
    let mut store = open(&backend);
    let task = store.add("Walk dog").unwrap();

    let err = store.update(task.id(), "  ").unwrap_err();
    assert_eq!(err, StoreError::Validation(ValidationError::EmptyInput));
    assert_eq!(store.get(task.id()).unwrap(), &task);

    let updated = store.update(task.id(), " Walk the dog ").unwrap();
    assert_eq!(updated.text(), "Walk the dog");
    assert_eq!(updated.created_at(), task.created_at());
    assert!(updated.updated_at() > task.updated_at());
}

#[test]
fn unknown_ids_fail_with_not_found() {
    let backend = MemoryKeyValueStore::new();
    let mut store = open(&backend);
    store.add("only").unwrap();
    let missing = TaskId::parse("missing").unwrap();

    assert_eq!(
        store.update(&missing, "x"),
        Err(StoreError::NotFound(missing.clone()))
    );
    assert_eq!(
        store.toggle(&missing),
        Err(StoreError::NotFound(missing.clone()))
    );
    assert_eq!(
        store.delete(&missing),
        Err(StoreError::NotFound(missing.clone()))
    );
    assert_eq!(store.tasks().len(), 1);
}

#[test]
fn toggle_twice_restores_completion_and_advances_timestamp() {
    let backend = MemoryKeyValueStore::new();
    let mut store = open(&backend);
    let task = store.add("Read book").unwrap();

    let first = store.toggle(task.id()).unwrap();
    assert!(first.is_completed());
    assert!(first.updated_at() > task.updated_at());

    let second = store.toggle(task.id()).unwrap();
    assert_eq!(second.is_completed(), task.is_completed());
    assert!(second.updated_at() > first.updated_at());
}

#[test]
fn delete_twice_fails_on_second_call_and_keeps_order() {
    let backend = MemoryKeyValueStore::new();
    let mut store = open(&backend);
    store.add("a").unwrap();
    let middle = store.add("b").unwrap();
    store.add("c").unwrap();

    let removed = store.delete(middle.id()).unwrap();
    assert_eq!(removed.text(), "b");
    assert_eq!(
        store.delete(middle.id()),
        Err(StoreError::NotFound(middle.id().clone()))
    );

    let texts = store
        .tasks()
        .iter()
        .map(|task| task.text())
        .collect::<Vec<_>>();
    assert_eq!(texts, vec!["c", "a"]);
    assert_eq!(open(&backend).tasks().len(), 2);
}

#[test]
fn search_and_filter_compose() {
    let backend = MemoryKeyValueStore::new();
    let mut store = open(&backend);
    store.add("Walk dog").unwrap();
    store.add("Buy milk").unwrap();

    store.set_search("milk");
    assert_eq!(visible_texts(&store), vec!["Buy milk"]);

    store.set_filter(StatusFilter::Completed);
    assert!(store.visible().is_empty());
    assert_eq!(store.stats().total, 2);
}

#[test]
fn search_is_trimmed_and_case_insensitive() {
    let backend = MemoryKeyValueStore::new();
    let mut store = open(&backend);
    store.add("Call MOM").unwrap();
    store.add("Email boss").unwrap();

    store.set_search("  mom ");
    assert_eq!(store.search_term(), "mom");
    assert_eq!(visible_texts(&store), vec!["Call MOM"]);

    store.set_search("   ");
    assert_eq!(visible_texts(&store), vec!["Email boss", "Call MOM"]);
}

#[test]
fn view_tracks_mutations_under_active_filter() {
    let backend = MemoryKeyValueStore::new();
    let mut store = open(&backend);
    let laundry = store.add("laundry").unwrap();
    store.add("dishes").unwrap();

    store.set_filter(StatusFilter::Pending);
    assert_eq!(visible_texts(&store), vec!["dishes", "laundry"]);

    store.toggle(laundry.id()).unwrap();
    assert_eq!(visible_texts(&store), vec!["dishes"]);

    store.set_filter(StatusFilter::Completed);
    assert_eq!(visible_texts(&store), vec!["laundry"]);

    store.add("new laundry").unwrap();
    assert_eq!(visible_texts(&store), vec!["laundry"]);
}

#[test]
fn stats_ignore_search_and_filter() {
    let backend = MemoryKeyValueStore::new();
    let mut store = open(&backend);
    let done = store.add("done").unwrap();
    store.add("todo one").unwrap();
    store.add("todo two").unwrap();
    store.toggle(done.id()).unwrap();

    let expected = TaskStats {
        total: 3,
        pending: 2,
        completed: 1,
    };
    assert_eq!(store.stats(), expected);

    store.set_search("two");
    store.set_filter(StatusFilter::Completed);
    assert_eq!(store.stats(), expected);
    assert_stats_consistent(&store);
}

#[test]
fn view_state_is_not_persisted() {
    let backend = MemoryKeyValueStore::new();
    let mut store = open(&backend);
    store.add("keep").unwrap();
    store.set_search("nothing matches");
    store.set_filter(StatusFilter::Completed);

    let reopened = open(&backend);
    assert_eq!(reopened.search_term(), "");
    assert_eq!(reopened.filter(), StatusFilter::All);
    assert_eq!(reopened.visible().len(), 1);
}

#[test]
fn editing_slot_transitions() {
    let backend = MemoryKeyValueStore::new();
    let mut store = open(&backend);
    let first = store.add("first").unwrap();
    let second = store.add("second").unwrap();

    assert_eq!(store.editing(), EditingState::Idle);

    store.start_editing(first.id().clone());
    assert!(matches!(store.editing(), EditingState::Active(task) if task.id() == first.id()));

    store.start_editing(second.id().clone());
    assert!(matches!(store.editing(), EditingState::Active(task) if task.id() == second.id()));

    store.stop_editing();
    assert_eq!(store.editing(), EditingState::Idle);
}

#[test]
fn successful_update_of_edited_task_ends_editing() {
    let backend = MemoryKeyValueStore::new();
    let mut store = open(&backend);
    let task = store.add("draft").unwrap();
    let other = store.add("other").unwrap();

    store.start_editing(task.id().clone());
    store.update(other.id(), "other edited").unwrap();
    assert!(matches!(store.editing(), EditingState::Active(_)));

    store.update(task.id(), "").unwrap_err();
    assert!(matches!(store.editing(), EditingState::Active(_)));

    store.update(task.id(), "final").unwrap();
    assert_eq!(store.editing(), EditingState::Idle);
}

#[test]
fn editing_deleted_task_reports_missing() {
    let backend = MemoryKeyValueStore::new();
    let mut store = open(&backend);
    let task = store.add("soon gone").unwrap();

    store.start_editing(task.id().clone());
    store.delete(task.id()).unwrap();
    assert_eq!(store.editing(), EditingState::Missing(task.id()));

    let ghost = TaskId::parse("never-existed").unwrap();
    store.start_editing(ghost.clone());
    assert_eq!(store.editing(), EditingState::Missing(&ghost));
}

#[test]
fn corrupt_storage_loads_empty_with_exactly_one_warning() {
    let backend = MemoryKeyValueStore::new();
    backend.set("tasks", "<<not a task list>>").unwrap();

    let mut store = open(&backend);
    assert!(store.tasks().is_empty());

    let warnings = store.take_warnings();
    assert_eq!(warnings.len(), 1);
    assert!(matches!(warnings[0], PersistenceError::Read { .. }));
    assert!(store.take_warnings().is_empty());

    store.add("fresh start").unwrap();
    assert_eq!(open(&backend).tasks().len(), 1);
}

#[test]
fn write_failures_keep_memory_state_and_queue_warnings() {
    let backend = MemoryKeyValueStore::with_quota(200);
    let mut store = open(&backend);

    store.add("fits").unwrap();
    assert!(store.take_warnings().is_empty());

    let big = store.add(&"y".repeat(100)).unwrap();
    assert_eq!(store.tasks().len(), 2);
    assert_eq!(store.tasks()[0].id(), big.id());

    let warnings = store.take_warnings();
    assert_eq!(warnings.len(), 1);
    assert!(matches!(warnings[0], PersistenceError::Write { .. }));

    // The last successful write only holds the first task.
    assert_eq!(open(&backend).tasks().len(), 1);

    store.delete(big.id()).unwrap();
    assert!(store.take_warnings().is_empty());
}

#[test]
fn clear_completed_removes_only_finished_tasks() {
    let backend = MemoryKeyValueStore::new();
    let mut store = open(&backend);
    let done = store.add("done").unwrap();
    store.add("open").unwrap();
    store.toggle(done.id()).unwrap();

    assert_eq!(store.clear_completed(), 1);
    assert_eq!(store.clear_completed(), 0);
    assert_eq!(
        store.stats(),
        TaskStats {
            total: 1,
            pending: 1,
            completed: 0
        }
    );
    assert_eq!(open(&backend).tasks().len(), 1);
}

#[test]
fn clear_all_empties_store_and_storage() {
    let backend = MemoryKeyValueStore::new();
    let mut store = open(&backend);
    let task = store.add("one").unwrap();
    store.add("two").unwrap();
    store.start_editing(task.id().clone());

    store.clear_all();
    assert!(store.tasks().is_empty());
    assert!(store.visible().is_empty());
    assert_eq!(store.editing(), EditingState::Idle);
    assert!(backend.get("tasks").unwrap().is_none());
}

#[test]
fn sqlite_backed_store_survives_reopen() {
    let conn = open_db_in_memory().unwrap();
    let created = {
        let mut store =
            TaskStore::open(SqliteKeyValueStore::new(&conn), CoreConfig::default()).unwrap();
        let task = store.add("persist me").unwrap();
        store.toggle(task.id()).unwrap()
    };

    let store = TaskStore::open(SqliteKeyValueStore::new(&conn), CoreConfig::default()).unwrap();
    assert_eq!(store.tasks(), std::slice::from_ref(&created));
}

#[test]
fn custom_storage_key_is_used() {
    let backend = MemoryKeyValueStore::new();
    let config = CoreConfig::default().with_storage_key("work-tasks");
    let mut store = TaskStore::open(&backend, config).unwrap();
    store.add("report").unwrap();

    assert!(backend.get("work-tasks").unwrap().is_some());
    assert!(backend.get("tasks").unwrap().is_none());
}

#[test]
fn invalid_config_is_rejected() {
    let backend = MemoryKeyValueStore::new();
    let config = CoreConfig::default().with_max_text_len(0);
    assert!(TaskStore::open(&backend, config).is_err());
}
