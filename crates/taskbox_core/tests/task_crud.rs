use rusqlite::Connection;
use taskbox_core::db::migrations::latest_version;
use taskbox_core::db::open_db_in_memory;
use taskbox_core::{
    RepoError, SqliteTaskRepository, TaskDraft, TaskPatch, TaskRecord, TaskRepository,
};

fn repo() -> SqliteTaskRepository {
    let conn = open_db_in_memory().unwrap();
    SqliteTaskRepository::try_new(conn).unwrap()
}

fn draft(title: &str) -> TaskDraft {
    TaskDraft::new(title)
}

#[test]
fn insert_assigns_id_and_creation_timestamp() {
    let repo = repo();

    let created = repo.insert(&draft("first task")).unwrap();
    assert_eq!(created.id, 1);
    assert!(created.created_at > 0);
    assert!(!created.completed);
    assert_eq!(created.completed_at, None);

    let loaded = repo.load_all().unwrap();
    assert_eq!(loaded, vec![created]);
}

#[test]
fn insert_completed_draft_stamps_completion() {
    let repo = repo();

    let created = repo
        .insert(&TaskDraft {
            title: "already done".to_string(),
            description: None,
            completed: true,
        })
        .unwrap();

    assert!(created.completed);
    assert_eq!(created.completed_at, Some(created.created_at));
}

#[test]
fn load_all_orders_newest_first() {
    let repo = repo();

    let a = repo.insert(&draft("a")).unwrap();
    let b = repo.insert(&draft("b")).unwrap();
    let c = repo.insert(&draft("c")).unwrap();

    let ids: Vec<_> = repo
        .load_all()
        .unwrap()
        .into_iter()
        .map(|record| record.id)
        .collect();
    assert_eq!(ids, vec![c.id, b.id, a.id]);
}

#[test]
fn identifiers_are_not_reused_after_delete() {
    let repo = repo();

    let a = repo.insert(&draft("a")).unwrap();
    let b = repo.insert(&draft("b")).unwrap();
    assert!(repo.delete(b.id).unwrap());

    let c = repo.insert(&draft("c")).unwrap();
    assert!(c.id > b.id, "id {} reassigned after delete", b.id);
    assert!(b.id > a.id);
}

#[test]
fn update_replaces_fields_but_not_creation_timestamp() {
    let repo = repo();

    let created = repo.insert(&draft("draft title")).unwrap();
    let mut changed = created.clone();
    changed.title = "final title".to_string();
    changed.description = Some("details".to_string());
    changed.set_completed(true, created.created_at + 60_000);

    repo.update(&changed).unwrap();

    let loaded = repo.load_all().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].title, "final title");
    assert_eq!(loaded[0].description.as_deref(), Some("details"));
    assert!(loaded[0].completed);
    assert_eq!(loaded[0].completed_at, Some(created.created_at + 60_000));
    assert_eq!(loaded[0].created_at, created.created_at);
}

#[test]
fn update_missing_id_returns_not_found() {
    let repo = repo();

    let phantom = TaskRecord {
        id: 999,
        title: "phantom".to_string(),
        description: None,
        completed: false,
        created_at: 1,
        completed_at: None,
    };

    let err = repo.update(&phantom).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(999)));
}

#[test]
fn delete_reports_whether_a_row_was_removed() {
    let repo = repo();

    let created = repo.insert(&draft("short-lived")).unwrap();
    assert!(repo.delete(created.id).unwrap());
    assert!(!repo.delete(created.id).unwrap());
    assert!(!repo.delete(created.id).unwrap());
    assert!(repo.load_all().unwrap().is_empty());
}

#[test]
fn validation_failure_blocks_insert_and_update() {
    let repo = repo();

    let err = repo.insert(&draft("   ")).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));

    let created = repo.insert(&draft("valid")).unwrap();
    let mut broken = created.clone();
    broken.completed = true; // no completed_at
    let err = repo.update(&broken).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteTaskRepository::try_new(conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert!(expected_version > 0),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_tasks_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteTaskRepository::try_new(conn),
        Err(RepoError::MissingRequiredTable("tasks"))
    ));
}

#[test]
fn patch_merge_against_store_roundtrips() {
    let repo = repo();

    let created = repo.insert(&draft("merge me")).unwrap();
    let mut merged = created.clone();
    merged.apply_patch(
        &TaskPatch {
            completed: Some(true),
            ..TaskPatch::default()
        },
        created.created_at + 1,
    );
    repo.update(&merged).unwrap();

    let loaded = repo.load_all().unwrap();
    assert!(loaded[0].completed);
    assert_eq!(loaded[0].title, "merge me");
}
