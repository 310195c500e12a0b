use taskbox_core::{JsonFileTaskRepository, RepoError, TaskDraft, TaskRepository};

fn store_at(dir: &tempfile::TempDir) -> JsonFileTaskRepository {
    JsonFileTaskRepository::new(dir.path().join("tasks.json"))
}

#[test]
fn missing_document_reads_as_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    let repo = store_at(&dir);

    assert!(repo.load_all().unwrap().is_empty());
    assert!(!repo.delete(1).unwrap());
}

#[test]
fn insert_and_load_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let repo = store_at(&dir);

    let created = repo.insert(&TaskDraft::new("persisted")).unwrap();
    assert_eq!(created.id, 1);

    let loaded = repo.load_all().unwrap();
    assert_eq!(loaded, vec![created]);
}

#[test]
fn records_survive_reopening_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.json");

    let first = JsonFileTaskRepository::new(&path);
    let created = first.insert(&TaskDraft::new("durable")).unwrap();
    drop(first);

    let second = JsonFileTaskRepository::new(&path);
    let loaded = second.load_all().unwrap();
    assert_eq!(loaded, vec![created]);

    // The id high-water mark survives the restart too.
    let next = second.insert(&TaskDraft::new("after restart")).unwrap();
    assert_eq!(next.id, 2);
}

#[test]
fn identifiers_are_not_reused_after_deleting_the_highest() {
    let dir = tempfile::tempdir().unwrap();
    let repo = store_at(&dir);

    let a = repo.insert(&TaskDraft::new("a")).unwrap();
    let b = repo.insert(&TaskDraft::new("b")).unwrap();
    assert!(repo.delete(b.id).unwrap());

    let c = repo.insert(&TaskDraft::new("c")).unwrap();
    assert!(c.id > b.id, "id {} reassigned after delete", b.id);
    assert!(b.id > a.id);
}

#[test]
fn update_replaces_record_but_keeps_creation_timestamp() {
    let dir = tempfile::tempdir().unwrap();
    let repo = store_at(&dir);

    let created = repo.insert(&TaskDraft::new("before")).unwrap();
    let mut changed = created.clone();
    changed.title = "after".to_string();
    changed.created_at = 1; // must be ignored by the store
    repo.update(&changed).unwrap();

    let loaded = repo.load_all().unwrap();
    assert_eq!(loaded[0].title, "after");
    assert_eq!(loaded[0].created_at, created.created_at);
}

#[test]
fn update_missing_id_returns_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let repo = store_at(&dir);

    let mut phantom = repo.insert(&TaskDraft::new("only one")).unwrap();
    phantom.id += 1;

    let err = repo.update(&phantom).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == phantom.id));
}

#[test]
fn load_all_orders_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let repo = store_at(&dir);

    let a = repo.insert(&TaskDraft::new("a")).unwrap();
    let b = repo.insert(&TaskDraft::new("b")).unwrap();
    let c = repo.insert(&TaskDraft::new("c")).unwrap();

    let ids: Vec<_> = repo
        .load_all()
        .unwrap()
        .into_iter()
        .map(|record| record.id)
        .collect();
    assert_eq!(ids, vec![c.id, b.id, a.id]);
}

#[test]
fn counter_is_reconciled_against_hand_edited_documents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.json");

    // A document whose counter lags behind the ids it contains.
    std::fs::write(
        &path,
        r#"{
            "next_id": 1,
            "tasks": [
                {
                    "id": 9,
                    "title": "imported",
                    "description": null,
                    "completed": false,
                    "createdAt": 1700000000000,
                    "completedAt": null
                }
            ]
        }"#,
    )
    .unwrap();

    let repo = JsonFileTaskRepository::new(&path);
    let created = repo.insert(&TaskDraft::new("fresh")).unwrap();
    assert_eq!(created.id, 10);
}

#[test]
fn corrupt_document_surfaces_a_file_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.json");
    std::fs::write(&path, "not json at all").unwrap();

    let repo = JsonFileTaskRepository::new(&path);
    let err = repo.load_all().unwrap_err();
    assert!(matches!(err, RepoError::File(_)));
}
