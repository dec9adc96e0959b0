use chrono::{TimeZone, Utc};
use hearth_core::service::continuity::ARTIFACTS_STATE_KEY;
use hearth_core::{
    ContinuityError, ContinuityTracker, HearthEvent, MemoryStateStore, RecordingSink, SessionId,
    StateStore, TaskRecord,
};
use std::rc::Rc;

fn tracker(backend: Rc<MemoryStateStore>) -> (ContinuityTracker, Rc<RecordingSink>) {
    let events = Rc::new(RecordingSink::new());
    let tracker =
        ContinuityTracker::with_session(SessionId::from("session_abc123xyz_l0"), backend, events.clone());
    (tracker, events)
}

fn card(id: u64, essence: &str, completed: bool) -> TaskRecord {
    let mut record = TaskRecord::new(id, essence, "weaving", None, Utc::now()).unwrap();
    record.completed = completed;
    record
}

fn without_timestamp(prompt: &str) -> String {
    prompt
        .lines()
        .filter(|line| !line.starts_with("TIMESTAMP:"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn record_artifact_tags_session_and_persists_log() {
    let backend = Rc::new(MemoryStateStore::new());
    let (mut tracker, events) = tracker(backend.clone());

    let artifact = tracker
        .record_artifact("module", "card_store", "record lifecycle", "weaving")
        .unwrap();
    assert_eq!(artifact.session.as_str(), "session_abc123xyz_l0");
    assert_eq!(artifact.kind, "module");
    assert_eq!(
        events.take(),
        vec![HearthEvent::ArtifactRecorded {
            kind: "module".to_string(),
            name: "card_store".to_string(),
        }]
    );

    let raw = backend.get(ARTIFACTS_STATE_KEY).unwrap().unwrap();
    let persisted: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(persisted[0]["type"], "module");
    assert_eq!(persisted[0]["session"], "session_abc123xyz_l0");

    // A new session keeps the old log; continuity survives through artifacts.
    let (restored, _) = tracker_with_new_session(backend);
    assert_eq!(restored.artifacts().len(), 1);
    assert_ne!(restored.session(), tracker.session());
}

fn tracker_with_new_session(backend: Rc<MemoryStateStore>) -> (ContinuityTracker, Rc<RecordingSink>) {
    let events = Rc::new(RecordingSink::new());
    (ContinuityTracker::load(backend, events.clone()), events)
}

#[test]
fn blank_artifact_name_is_rejected() {
    let (mut tracker, _) = tracker(Rc::new(MemoryStateStore::new()));
    assert!(matches!(
        tracker.record_artifact("note", "  ", "x", "weaving"),
        Err(ContinuityError::EmptyName)
    ));
    assert!(tracker.artifacts().is_empty());
}

#[test]
fn artifacts_for_intention_preserves_order() {
    let (mut tracker, _) = tracker(Rc::new(MemoryStateStore::new()));
    tracker.record_artifact("a", "one", "p", "weaving").unwrap();
    tracker.record_artifact("a", "two", "p", "code_development").unwrap();
    tracker.record_artifact("a", "three", "p", "weaving").unwrap();

    let names: Vec<&str> = tracker
        .artifacts_for_intention("weaving")
        .into_iter()
        .map(|a| a.name.as_str())
        .collect();
    assert_eq!(names, vec!["one", "three"]);
    assert_eq!(tracker.artifacts_for_intention("creative_flow").len(), 0);
}

#[test]
fn prompt_lists_only_weaving_artifacts_and_splits_cards() {
    let (mut tracker, _) = tracker(Rc::new(MemoryStateStore::new()));
    tracker
        .record_artifact("energy_card", "Wire store", "new task", "weaving")
        .unwrap();
    tracker
        .record_artifact("snippet", "Hidden", "other work", "code_development")
        .unwrap();

    let records = vec![card(1, "Done thing", true), card(2, "Open thing", false)];
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap();
    let prompt = tracker.generate_prompt_at(&records, "code_development", 50, now);

    assert!(prompt.contains("SESSION: session_abc123xyz_l0"));
    assert!(prompt.contains("TIMESTAMP: 2024-06-01T12:30:00.000Z"));
    assert!(prompt.contains("ACTIVE INTENTION: CODE_DEVELOPMENT"));
    assert!(prompt.contains("PROGRESS: 50% Complete"));
    assert!(prompt.contains("• energy_card: Wire store (new task)"));
    assert!(!prompt.contains("Hidden"));
    assert!(prompt.contains("COMPLETED WEAVES:\n✅ Done thing\n"));
    assert!(prompt.contains("PENDING WEAVES:\n⏳ Open thing\n"));
    assert!(!prompt.contains("No artifacts tracked yet"));
}

#[test]
fn prompt_is_deterministic_apart_from_timestamp() {
    let (mut tracker, _) = tracker(Rc::new(MemoryStateStore::new()));
    tracker.record_artifact("doc", "Plan", "outline", "weaving").unwrap();
    let records = vec![card(1, "a", false), card(2, "b", true)];

    let first = tracker.generate_prompt(&records, "weaving", 50);
    let second = tracker.generate_prompt(&records, "weaving", 50);
    assert_eq!(without_timestamp(&first), without_timestamp(&second));

    let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    assert_eq!(
        tracker.generate_prompt_at(&records, "weaving", 50, at),
        tracker.generate_prompt_at(&records, "weaving", 50, at)
    );
}

#[test]
fn corrupt_artifact_log_starts_empty() {
    let backend = Rc::new(MemoryStateStore::new());
    backend.set(ARTIFACTS_STATE_KEY, "[{\"type\":").unwrap();

    let (tracker, _) = tracker(backend);
    assert!(tracker.artifacts().is_empty());
}
