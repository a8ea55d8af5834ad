//! Tests for the memory and JSON-file task stores.

use chrono::{NaiveDate, NaiveDateTime};
use schedule_engine::store::TaskStore;
use schedule_engine::{
    BlockId, EngineError, JsonFileStore, MemoryStore, OverlapPolicy, Principal, ScheduledBlock,
    Task, TaskDraft, TaskId,
};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn task(owner: &str, title: &str, start: NaiveDateTime) -> Task {
    TaskDraft::new(title, start, 60)
        .into_task(TaskId::new(), Principal::new(owner))
        .unwrap()
}

fn block_for(task: &Task) -> ScheduledBlock {
    ScheduledBlock {
        id: BlockId::new(),
        task_id: task.id,
        start: task.start,
        end: task.start + chrono::Duration::minutes(60),
    }
}

/// Behaviour every store must share.
fn exercise_store(store: &dyn TaskStore) {
    let later = task("alice", "later", at(16, 9));
    let sooner = task("alice", "sooner", at(15, 9));
    let other = task("bob", "not mine", at(14, 9));

    store.insert_task(later.clone()).unwrap();
    store.insert_task(sooner.clone()).unwrap();
    store.insert_task(other.clone()).unwrap();

    // Listing is per owner and ordered by start.
    let listed = store.list_tasks(&Principal::new("alice")).unwrap();
    let titles: Vec<&str> = listed.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["sooner", "later"]);

    // Duplicate insert is refused.
    assert!(matches!(
        store.insert_task(later.clone()),
        Err(EngineError::Store(_))
    ));

    // Blocks are replaced wholesale.
    store.replace_blocks(later.id, vec![block_for(&later)]).unwrap();
    let replacement = block_for(&later);
    store
        .replace_blocks(later.id, vec![replacement.clone()])
        .unwrap();
    assert_eq!(store.blocks_for_task(later.id).unwrap(), vec![replacement.clone()]);

    store.replace_blocks(other.id, vec![block_for(&other)]).unwrap();
    assert_eq!(
        store.blocks_for_owner(&Principal::new("alice")).unwrap().len(),
        1
    );

    // Single-block update.
    let mut moved = replacement.clone();
    moved.start = at(17, 9);
    moved.end = at(17, 10);
    store.update_block(moved.clone()).unwrap();
    assert_eq!(store.blocks_for_task(later.id).unwrap()[0], moved);

    let ghost = ScheduledBlock {
        id: BlockId::new(),
        ..moved.clone()
    };
    assert!(matches!(
        store.update_block(ghost),
        Err(EngineError::NotFound { kind: "block", .. })
    ));

    // Tags are created once and reused.
    let first = store.upsert_tag("deep-work").unwrap();
    let again = store.upsert_tag("deep-work").unwrap();
    assert_eq!(first, again);
    assert_eq!(store.list_tags().unwrap().len(), 1);

    // Delete removes the task's blocks too.
    store.delete_task(later.id).unwrap();
    assert!(store.get_task(later.id).unwrap().is_none());
    assert!(store.blocks_for_task(later.id).unwrap().is_empty());
    assert!(matches!(
        store.delete_task(later.id),
        Err(EngineError::NotFound { kind: "task", .. })
    ));
}

/// Whole-task saves and checked block moves.
fn exercise_checked_saves(store: &dyn TaskStore) {
    let alice = Principal::new("alice");
    let mut essay = task("alice", "essay", at(15, 9));
    essay.tags.insert("school".to_string());
    let essay_block = block_for(&essay);

    store
        .save_task(essay.clone(), vec![essay_block.clone()], OverlapPolicy::Reject)
        .unwrap();
    assert_eq!(store.get_task(essay.id).unwrap(), Some(essay.clone()));
    assert_eq!(store.blocks_for_task(essay.id).unwrap(), vec![essay_block.clone()]);
    assert_eq!(store.list_tags().unwrap()[0].name, "school");

    // A rejected save writes nothing: no task, no blocks, no tags.
    let mut clash = task("alice", "clash", at(15, 9));
    clash.tags.insert("music".to_string());
    assert!(matches!(
        store.save_task(clash.clone(), vec![block_for(&clash)], OverlapPolicy::Reject),
        Err(EngineError::Overlap { .. })
    ));
    assert!(store.get_task(clash.id).unwrap().is_none());
    assert_eq!(store.blocks_for_owner(&alice).unwrap().len(), 1);
    assert_eq!(store.list_tags().unwrap().len(), 1);

    // Resaving a task is not checked against its own old blocks.
    let mut edited = essay.clone();
    edited.title = "essay v2".to_string();
    let edited_block = ScheduledBlock {
        id: BlockId::new(),
        task_id: essay.id,
        start: at(15, 9),
        end: at(15, 11),
    };
    store
        .save_task(edited.clone(), vec![edited_block.clone()], OverlapPolicy::Reject)
        .unwrap();
    assert_eq!(store.get_task(essay.id).unwrap().unwrap().title, "essay v2");
    assert_eq!(store.blocks_for_task(essay.id).unwrap(), vec![edited_block.clone()]);

    // Moves are checked against the owner's other blocks only.
    let lab = task("alice", "lab", at(16, 9));
    let lab_block = block_for(&lab);
    store
        .save_task(lab.clone(), vec![lab_block.clone()], OverlapPolicy::Reject)
        .unwrap();
    let onto_essay = ScheduledBlock {
        start: at(15, 10),
        end: at(15, 11),
        ..lab_block.clone()
    };
    assert!(matches!(
        store.move_block(onto_essay.clone(), OverlapPolicy::Reject),
        Err(EngineError::Overlap { .. })
    ));
    assert_eq!(store.blocks_for_task(lab.id).unwrap(), vec![lab_block.clone()]);
    store
        .move_block(onto_essay.clone(), OverlapPolicy::Allow)
        .unwrap();
    assert_eq!(store.blocks_for_task(lab.id).unwrap(), vec![onto_essay]);

    let ghost = ScheduledBlock {
        id: BlockId::new(),
        ..lab_block
    };
    assert!(matches!(
        store.move_block(ghost, OverlapPolicy::Allow),
        Err(EngineError::NotFound { kind: "block", .. })
    ));
}

#[test]
fn memory_store_behaviour() {
    exercise_store(&MemoryStore::new());
    exercise_checked_saves(&MemoryStore::new());
}

#[test]
fn json_file_store_behaviour() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::open(dir.path().join("tasks.json")).unwrap();
    exercise_store(&store);

    let saves = JsonFileStore::open(dir.path().join("saves.json")).unwrap();
    exercise_checked_saves(&saves);
}

#[test]
fn json_file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("tasks.json");

    let saved = task("alice", "persisted", at(15, 11));
    let block = block_for(&saved);
    {
        let store = JsonFileStore::open(&path).unwrap();
        store.insert_task(saved.clone()).unwrap();
        store.replace_blocks(saved.id, vec![block.clone()]).unwrap();
        store.upsert_tag("reading").unwrap();
    }

    let reopened = JsonFileStore::open(&path).unwrap();
    assert_eq!(reopened.get_task(saved.id).unwrap(), Some(saved.clone()));
    assert_eq!(reopened.blocks_for_task(saved.id).unwrap(), vec![block]);
    assert_eq!(reopened.list_tags().unwrap()[0].name, "reading");
    assert!(!dir.path().join("nested").join("tasks.json.tmp").exists());
}

#[test]
fn json_file_store_missing_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::open(dir.path().join("absent.json")).unwrap();

    assert!(store.list_tasks(&Principal::new("alice")).unwrap().is_empty());
    assert!(!store.path().exists());
}

#[test]
fn json_file_store_rejects_garbage() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.json");
    std::fs::write(&path, "not json").unwrap();

    assert!(matches!(
        JsonFileStore::open(&path),
        Err(EngineError::Json(_))
    ));
}

#[test]
fn failed_mutation_leaves_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.json");
    let store = JsonFileStore::open(&path).unwrap();

    let saved = task("alice", "kept", at(15, 11));
    store.insert_task(saved.clone()).unwrap();
    let before = std::fs::read_to_string(&path).unwrap();

    // Blocks for an unknown task are refused and nothing is written.
    let stray = task("alice", "never inserted", at(15, 12));
    assert!(store.replace_blocks(stray.id, vec![block_for(&stray)]).is_err());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn rejected_save_leaves_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.json");
    let store = JsonFileStore::open(&path).unwrap();

    let kept = task("alice", "kept", at(15, 11));
    store
        .save_task(kept.clone(), vec![block_for(&kept)], OverlapPolicy::Reject)
        .unwrap();
    let before = std::fs::read_to_string(&path).unwrap();

    let clash = task("alice", "clash", at(15, 11));
    assert!(store
        .save_task(clash.clone(), vec![block_for(&clash)], OverlapPolicy::Reject)
        .is_err());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn temp_file_is_appended_to_the_store_name() {
    let dir = tempfile::tempdir().unwrap();
    let neighbour = dir.path().join("tasks.tmp");
    std::fs::write(&neighbour, "not ours").unwrap();

    let store = JsonFileStore::open(dir.path().join("tasks.json")).unwrap();
    store.insert_task(task("alice", "a", at(15, 9))).unwrap();
    assert_eq!(std::fs::read_to_string(&neighbour).unwrap(), "not ours");
    assert!(!dir.path().join("tasks.json.tmp").exists());

    // A store whose own name ends in .tmp still round-trips.
    let odd_path = dir.path().join("scratch.tmp");
    let saved = task("alice", "b", at(15, 10));
    JsonFileStore::open(&odd_path)
        .unwrap()
        .insert_task(saved.clone())
        .unwrap();
    let reopened = JsonFileStore::open(&odd_path).unwrap();
    assert_eq!(reopened.get_task(saved.id).unwrap(), Some(saved));
}

#[test]
fn task_json_uses_front_end_field_names() {
    let mut saved = task("alice", "named", at(15, 11));
    saved.auto_scheduled = true;
    let value = serde_json::to_value(&saved).unwrap();

    assert_eq!(value["startDate"], "2024-01-15T11:00:00");
    assert_eq!(value["duration"], 60);
    assert_eq!(value["isAutoScheduled"], true);
    assert!(value.get("deadline").is_none());
}
