use chrono::Utc;
use hearth_core::model::intention::{CODE_DEVELOPMENT, LIFE_ORGANIZATION, WEAVING};
use hearth_core::{
    ActiveChange, EventSink, HearthEvent, IntentionDescriptor, IntentionRegistry, RecordingSink,
    RegistryError, TaskRecord,
};
use std::rc::Rc;

fn registry() -> (IntentionRegistry, Rc<RecordingSink>) {
    let events = Rc::new(RecordingSink::new());
    let sink: Rc<dyn EventSink> = events.clone();
    (IntentionRegistry::builtin(sink), events)
}

#[test]
fn builtin_catalog_lists_keys_in_declaration_order() {
    let (registry, _) = registry();
    assert_eq!(
        registry.keys(),
        vec![WEAVING, CODE_DEVELOPMENT, "creative_flow", LIFE_ORGANIZATION]
    );
    let active = registry.active_descriptor();
    assert_eq!(active.key, WEAVING);
    assert_eq!(active.style, "quantum");
    assert_eq!(active.label(), "🌌 Weaving - Quantum System Development");
}

#[test]
fn set_active_switches_and_notifies_once() {
    let (mut registry, events) = registry();

    let change = registry.set_active(CODE_DEVELOPMENT);
    assert_eq!(
        change,
        ActiveChange::Changed {
            previous: WEAVING.to_string()
        }
    );
    assert_eq!(registry.active(), CODE_DEVELOPMENT);
    assert_eq!(
        events.take(),
        vec![HearthEvent::IntentionChanged {
            previous: WEAVING.to_string(),
            active: CODE_DEVELOPMENT.to_string(),
        }]
    );

    assert_eq!(registry.set_active(CODE_DEVELOPMENT), ActiveChange::Unchanged);
    assert!(events.take().is_empty());
}

#[test]
fn unknown_key_is_an_observable_noop() {
    let (mut registry, events) = registry();

    let change = registry.set_active("gardening");
    assert_eq!(change, ActiveChange::UnknownKey("gardening".to_string()));
    assert_eq!(registry.active(), WEAVING);
    assert!(events.take().is_empty());
    assert!(registry.descriptor("gardening").is_none());
}

#[test]
fn task_context_uses_record_intention_generator() {
    let (registry, _) = registry();
    let now = Utc::now();

    let code = TaskRecord::new(1, "Ship parser", CODE_DEVELOPMENT, None, now).unwrap();
    let text = registry.task_context(&code).unwrap();
    assert!(text.starts_with("🔥 CODE DEVELOPMENT CONTEXT"));
    assert!(text.contains("TASK: Ship parser"));

    let weaving = TaskRecord::new(2, "Map flows", WEAVING, Some("keep offline"), now).unwrap();
    assert!(registry
        .task_context(&weaving)
        .unwrap()
        .ends_with("IMPLEMENTATION NOTES:\nkeep offline"));

    let orphan = TaskRecord::new(3, "Lost", "gardening", None, now).unwrap();
    assert_eq!(registry.task_context(&orphan), None);
}

#[test]
fn custom_catalog_validates_keys() {
    let sink: Rc<dyn EventSink> = Rc::new(RecordingSink::new());
    let bad = IntentionDescriptor::new("Deep Work", "Deep", "*", "x", "y", |r| r.essence.clone());

    let err = IntentionRegistry::new(vec![bad], "Deep Work", sink.clone()).err();
    assert_eq!(err, Some(RegistryError::InvalidKey("Deep Work".to_string())));

    let registry =
        IntentionRegistry::builtin_with_default(LIFE_ORGANIZATION, sink).unwrap();
    assert_eq!(registry.active(), LIFE_ORGANIZATION);
}
