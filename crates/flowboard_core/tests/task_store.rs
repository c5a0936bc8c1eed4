use flowboard_core::db::{open_db, open_db_in_memory};
use flowboard_core::{
    Priority, SqliteTaskStore, StoreError, Task, TaskContent, TaskPatch, TaskStatus, TaskStore,
};
use uuid::Uuid;

fn task(title: &str, status: TaskStatus) -> Task {
    Task::new(
        status,
        TaskContent::new(title, "details", Priority::Medium).unwrap(),
    )
}

#[test]
fn put_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTaskStore::new(&conn);

    let created = task("Buy milk", TaskStatus::Todo);
    store.put(&created).unwrap();

    let loaded = store.get(created.id).unwrap().unwrap();
    assert_eq!(loaded, created);
    assert!(store.get(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn put_replaces_existing_record() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTaskStore::new(&conn);

    let mut record = task("draft", TaskStatus::Todo);
    store.put(&record).unwrap();
    record.title = "final".to_string();
    record.priority = Priority::Low;
    store.put(&record).unwrap();

    let all = store.list_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].title, "final");
    assert_eq!(all[0].priority, Priority::Low);
}

#[test]
fn put_rejects_blank_text() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTaskStore::new(&conn);

    let mut invalid = task("ok", TaskStatus::Todo);
    invalid.description = "  ".to_string();
    assert!(matches!(
        store.put(&invalid),
        Err(StoreError::Validation(_))
    ));
    assert!(store.list_all().unwrap().is_empty());
}

#[test]
fn patch_merges_only_named_fields() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTaskStore::new(&conn);

    let record = task("keep me", TaskStatus::Todo);
    store.put(&record).unwrap();
    store
        .patch(
            record.id,
            &TaskPatch {
                priority: Some(Priority::High),
                ..TaskPatch::default()
            },
        )
        .unwrap();

    let loaded = store.get(record.id).unwrap().unwrap();
    assert_eq!(loaded.title, "keep me");
    assert_eq!(loaded.priority, Priority::High);
    assert_eq!(loaded.status, TaskStatus::Todo);
}

#[test]
fn patch_missing_record_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTaskStore::new(&conn);

    let missing = Uuid::new_v4();
    let err = store
        .patch(
            missing,
            &TaskPatch {
                synced: Some(false),
                ..TaskPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(id) if id == missing));

    let err = store.patch(missing, &TaskPatch::default()).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[test]
fn list_all_includes_tombstones_and_list_unsynced_filters() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTaskStore::new(&conn);

    let live = task("live", TaskStatus::Todo);
    let mut synced = task("synced", TaskStatus::Done);
    synced.synced = true;
    let gone = task("gone", TaskStatus::InProgress);
    store.put(&live).unwrap();
    store.put(&synced).unwrap();
    store.put(&gone).unwrap();
    store
        .patch(
            gone.id,
            &TaskPatch {
                deleted: Some(true),
                synced: Some(false),
                ..TaskPatch::default()
            },
        )
        .unwrap();

    let all = store.list_all().unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.iter().any(|t| t.id == gone.id && t.deleted));

    let unsynced: Vec<_> = store
        .list_unsynced()
        .unwrap()
        .into_iter()
        .map(|pending| pending.task.id)
        .collect();
    assert_eq!(unsynced, vec![live.id, gone.id]);
}

#[test]
fn status_change_moves_record_to_end_of_placement_order() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTaskStore::new(&conn);

    let a = task("a", TaskStatus::Todo);
    let b = task("b", TaskStatus::Todo);
    store.put(&a).unwrap();
    store.put(&b).unwrap();

    store
        .patch(
            a.id,
            &TaskPatch {
                status: Some(TaskStatus::Done),
                synced: Some(false),
                ..TaskPatch::default()
            },
        )
        .unwrap();
    store
        .patch(
            b.id,
            &TaskPatch {
                title: Some("b2".to_string()),
                ..TaskPatch::default()
            },
        )
        .unwrap();

    let order: Vec<_> = store.list_all().unwrap().into_iter().map(|t| t.id).collect();
    assert_eq!(order, vec![b.id, a.id]);
}

#[test]
fn mark_synced_ignores_superseded_revision() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTaskStore::new(&conn);

    let record = task("v1", TaskStatus::Todo);
    store.put(&record).unwrap();
    let read_at = store.list_unsynced().unwrap()[0].revision;

    store
        .patch(
            record.id,
            &TaskPatch {
                title: Some("v2".to_string()),
                synced: Some(false),
                ..TaskPatch::default()
            },
        )
        .unwrap();

    assert!(!store.mark_synced(record.id, read_at).unwrap());
    let loaded = store.get(record.id).unwrap().unwrap();
    assert!(!loaded.synced);
    assert_eq!(loaded.title, "v2");

    let current = store.list_unsynced().unwrap()[0].revision;
    assert!(current > read_at);
    assert!(store.mark_synced(record.id, current).unwrap());
    assert!(store.get(record.id).unwrap().unwrap().synced);
    assert!(store.mark_synced(record.id, current).unwrap());
}

#[test]
fn purge_removes_only_acknowledged_tombstones() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTaskStore::new(&conn);

    let pending_delete = task("pending", TaskStatus::Todo);
    let acked_delete = task("acked", TaskStatus::Todo);
    let live = task("live", TaskStatus::Todo);
    for record in [&pending_delete, &acked_delete, &live] {
        store.put(record).unwrap();
    }
    for id in [pending_delete.id, acked_delete.id] {
        store
            .patch(
                id,
                &TaskPatch {
                    deleted: Some(true),
                    synced: Some(false),
                    ..TaskPatch::default()
                },
            )
            .unwrap();
    }
    let revision = store
        .list_unsynced()
        .unwrap()
        .into_iter()
        .find(|pending| pending.task.id == acked_delete.id)
        .unwrap()
        .revision;
    store.mark_synced(acked_delete.id, revision).unwrap();
    store.mark_synced(live.id, 1).unwrap();

    assert_eq!(store.purge_synced_tombstones().unwrap(), 1);
    let remaining: Vec<_> = store.list_all().unwrap().into_iter().map(|t| t.id).collect();
    assert_eq!(remaining, vec![pending_delete.id, live.id]);
}

#[test]
fn records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.sqlite3");
    let record = task("persist", TaskStatus::InProgress);

    {
        let conn = open_db(&path).unwrap();
        SqliteTaskStore::new(&conn).put(&record).unwrap();
    }

    let conn = open_db(&path).unwrap();
    let store = SqliteTaskStore::new(&conn);
    assert_eq!(store.get(record.id).unwrap(), Some(record));
    assert_eq!(store.list_unsynced().unwrap().len(), 1);
}

#[test]
fn malformed_rows_are_rejected_on_read() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO tasks (id, title, description, priority, status, position)
         VALUES ('not-a-uuid', 't', 'd', 'LOW', 'todo', 1);",
        [],
    )
    .unwrap();

    let store = SqliteTaskStore::new(&conn);
    assert!(matches!(
        store.list_all(),
        Err(StoreError::InvalidData(_))
    ));
}
