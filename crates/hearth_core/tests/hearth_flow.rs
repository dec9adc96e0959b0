use hearth_core::model::intention::{CODE_DEVELOPMENT, WEAVING};
use hearth_core::service::card_store::CARDS_STATE_KEY;
use hearth_core::{
    ActiveChange, CardPatch, CardStoreError, Hearth, HearthConfig, HearthEvent, IntentionFilter,
    MemoryStateStore, StateStore, StoreError, StoreResult,
};
use std::cell::RefCell;
use std::rc::Rc;

/// Backend that refuses card snapshot writes and accepts everything else.
#[derive(Default)]
struct CardWritesFail {
    inner: MemoryStateStore,
}

impl StateStore for CardWritesFail {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        if key == CARDS_STATE_KEY {
            return Err(StoreError::Unavailable("read-only".to_string()));
        }
        self.inner.set(key, value)
    }
}

#[test]
fn cards_and_artifacts_survive_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let config = HearthConfig::with_base_dir(dir.path());

    {
        let mut hearth = Hearth::open(&config).unwrap();
        hearth.create_card("Buy milk", None).unwrap();
        hearth.set_intention(CODE_DEVELOPMENT);
        hearth.create_card("Fix parser", Some("edge cases")).unwrap();
        hearth.toggle_card(1).unwrap();
    }

    let hearth = Hearth::open(&config).unwrap();
    let stats = hearth.stats();
    assert_eq!((stats.total, stats.completed, stats.progress), (2, 1, 50));
    assert_eq!(hearth.cards().next_id(), 3);
    // The registry is process state; every open starts from the default.
    assert_eq!(hearth.intentions().active(), WEAVING);

    let artifacts = hearth.continuity().artifacts();
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].kind, "energy_card");
    assert_eq!(artifacts[0].name, "Buy milk");
}

#[test]
fn only_weaving_cards_record_artifacts() {
    let mut hearth = Hearth::new(Rc::new(MemoryStateStore::new()));
    hearth.create_card("Woven", None).unwrap();
    hearth.set_intention(CODE_DEVELOPMENT);
    hearth.create_card("Coded", None).unwrap();

    assert_eq!(hearth.continuity().artifacts().len(), 1);
    let active: Vec<&str> = hearth
        .active_cards()
        .into_iter()
        .map(|card| card.essence.as_str())
        .collect();
    assert_eq!(active, vec!["Coded"]);
    assert_eq!(hearth.list(&IntentionFilter::All).len(), 2);
}

#[test]
fn weaving_artifact_is_recorded_even_when_card_snapshot_write_fails() {
    let mut hearth = Hearth::new(Rc::new(CardWritesFail::default()));

    let err = hearth.create_card("Unsaved", None).unwrap_err();
    assert!(matches!(err, CardStoreError::Persistence(_)));
    assert_eq!(hearth.cards().records().len(), 1);

    let artifacts = hearth.continuity().artifacts();
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].name, "Unsaved");
}

#[test]
fn subscribers_see_every_core_event() {
    let mut hearth = Hearth::open_in_memory(WEAVING).unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    hearth.subscribe(move |event| sink.borrow_mut().push(event.clone()));

    let card = hearth.create_card("Plan", None).unwrap();
    hearth.update_card(card.id, &CardPatch::details("more")).unwrap();
    hearth.toggle_card(card.id).unwrap();
    assert_eq!(hearth.set_intention("nope"), ActiveChange::UnknownKey("nope".to_string()));
    hearth.set_intention(CODE_DEVELOPMENT);
    hearth.delete_card(card.id).unwrap();

    assert_eq!(
        *seen.borrow(),
        vec![
            HearthEvent::CardCreated { id: 1 },
            HearthEvent::ArtifactRecorded {
                kind: "energy_card".to_string(),
                name: "Plan".to_string(),
            },
            HearthEvent::CardUpdated { id: 1 },
            HearthEvent::CompletionToggled {
                id: 1,
                completed: true
            },
            HearthEvent::IntentionChanged {
                previous: WEAVING.to_string(),
                active: CODE_DEVELOPMENT.to_string(),
            },
            HearthEvent::CardDeleted { id: 1 },
        ]
    );
}

#[test]
fn continuity_prompt_reflects_current_state() {
    let mut hearth = Hearth::new(Rc::new(MemoryStateStore::new()));
    hearth.create_card("First", None).unwrap();
    hearth.create_card("Second", None).unwrap();
    hearth.create_card("Third", None).unwrap();
    hearth.toggle_cards(&[1, 99]).unwrap();

    let prompt = hearth.continuity_prompt();
    assert!(prompt.contains("ACTIVE INTENTION: WEAVING"));
    assert!(prompt.contains("PROGRESS: 33% Complete"));
    assert!(prompt.contains("✅ First"));
    assert!(prompt.contains("⏳ Second"));
    assert!(prompt.contains("• energy_card: Third (New task created in Sovereign Hearth system)"));
}

#[test]
fn check_all_and_uncheck_all_drive_progress() {
    let mut hearth = Hearth::new(Rc::new(MemoryStateStore::new()));
    hearth.create_card("a", None).unwrap();
    hearth.create_card("b", None).unwrap();

    assert_eq!(hearth.check_all().unwrap(), 2);
    assert_eq!(hearth.stats().progress, 100);
    assert_eq!(hearth.uncheck_all().unwrap(), 2);
    assert_eq!(hearth.stats().progress, 0);
}

#[test]
fn task_context_and_export_import_between_hearths() {
    let mut source = Hearth::new(Rc::new(MemoryStateStore::new()));
    source.set_intention(CODE_DEVELOPMENT);
    let card = source.create_card("Refactor", None).unwrap();
    let context = source.task_context(card.id).unwrap();
    assert!(context.contains("TASK: Refactor"));
    assert_eq!(source.task_context(404), None);

    let exported = source.export_json().unwrap();
    let mut target = Hearth::new(Rc::new(MemoryStateStore::new()));
    let summary = target.import_json(&exported).unwrap();
    assert_eq!(summary.imported, 1);
    assert_eq!(target.cards().get(card.id).unwrap().essence, "Refactor");
    assert_eq!(target.export().stats, source.export().stats);
}
