//! Collaborator-facing change signals.
//!
//! # Responsibility
//! - Describe every state change presentation layers may react to.
//! - Fan events out to subscribers without exposing component internals.
//!
//! # Invariants
//! - Events are emitted only after the in-memory change is applied.
//! - Listeners observe events in emission order.
//! - A listener subscribed during delivery sees events from the next emit on.

use crate::model::card::CardId;
use std::cell::RefCell;
use std::rc::Rc;

/// Structured change notification emitted by core components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HearthEvent {
    CardCreated { id: CardId },
    CardUpdated { id: CardId },
    CardDeleted { id: CardId },
    CompletionToggled { id: CardId, completed: bool },
    IntentionChanged { previous: String, active: String },
    ImportCompleted { imported: usize },
    ArtifactRecorded { kind: String, name: String },
}

/// Receiver capability handed to components at construction.
pub trait EventSink {
    fn emit(&self, event: &HearthEvent);
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: &HearthEvent) {}
}

type Listener = Rc<dyn Fn(&HearthEvent)>;

/// Fan-out sink owned by the coordinator.
#[derive(Default)]
pub struct EventHub {
    listeners: RefCell<Vec<Listener>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener for all subsequent events.
    pub fn subscribe(&self, listener: impl Fn(&HearthEvent) + 'static) {
        self.listeners.borrow_mut().push(Rc::new(listener));
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl EventSink for EventHub {
    fn emit(&self, event: &HearthEvent) {
        let listeners: Vec<Listener> = self.listeners.borrow().clone();
        for listener in &listeners {
            listener(event);
        }
    }
}

/// Sink that keeps every event; handy for collaborators that poll.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: RefCell<Vec<HearthEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains recorded events in emission order.
    pub fn take(&self) -> Vec<HearthEvent> {
        self.events.borrow_mut().drain(..).collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &HearthEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hub_delivers_to_every_listener_in_order() {
        let hub = EventHub::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        for tag in ["a", "b"] {
            let seen = Rc::clone(&seen);
            hub.subscribe(move |event| seen.borrow_mut().push((tag, event.clone())));
        }

        hub.emit(&HearthEvent::CardDeleted { id: 7 });

        let seen = seen.borrow();
        assert_eq!(hub.listener_count(), 2);
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].0, "a");
        assert_eq!(seen[1], ("b", HearthEvent::CardDeleted { id: 7 }));
    }

    #[test]
    fn listener_may_subscribe_while_an_event_is_delivered() {
        let hub = Rc::new(EventHub::new());
        let late_calls = Rc::new(RefCell::new(0));
        {
            let hub_handle = Rc::downgrade(&hub);
            let late_calls = Rc::clone(&late_calls);
            hub.subscribe(move |_| {
                if let Some(hub) = hub_handle.upgrade() {
                    let late_calls = Rc::clone(&late_calls);
                    hub.subscribe(move |_| *late_calls.borrow_mut() += 1);
                }
            });
        }

        hub.emit(&HearthEvent::CardCreated { id: 1 });
        assert_eq!(hub.listener_count(), 2);
        assert_eq!(*late_calls.borrow(), 0);

        hub.emit(&HearthEvent::CardCreated { id: 2 });
        assert_eq!(*late_calls.borrow(), 1);
    }
}
