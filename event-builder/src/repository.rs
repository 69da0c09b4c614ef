//! Event repository: the state the editor renders from.
//!
//! Holds the canonical event list and a value copy of the event being
//! edited. Readers get shared references; the replacement setters are
//! crate-private so only the reducer can change anything.

use crate::types::{Event, EventId};

/// Events plus the one being edited
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventState {
    events: Vec<Event>,
    current_event: Option<Event>,
    last_error: Option<String>,
}

impl EventState {
    /// Creates an empty repository
    #[must_use]
    pub const fn new() -> Self {
        Self {
            events: Vec::new(),
            current_event: None,
            last_error: None,
        }
    }

    /// All events in creation order
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// The event being edited, if any
    #[must_use]
    pub const fn current_event(&self) -> Option<&Event> {
        self.current_event.as_ref()
    }

    /// Looks up an event by id
    #[must_use]
    pub fn event(&self, id: &EventId) -> Option<&Event> {
        self.events.iter().find(|e| &e.id == id)
    }

    /// Last gateway failure, cleared by the next success
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Number of events
    #[must_use]
    pub fn count(&self) -> usize {
        self.events.len()
    }

    /// `true` when the current event matches its entry in the list
    ///
    /// Vacuously true when there is no current event.
    #[must_use]
    pub fn is_in_sync(&self) -> bool {
        self.current_event
            .as_ref()
            .is_none_or(|current| self.event(&current.id) == Some(current))
    }

    pub(crate) fn replace_events(&mut self, events: Vec<Event>) {
        self.events = events;
    }

    pub(crate) fn set_current_event(&mut self, event: Option<Event>) {
        self.current_event = event;
    }

    pub(crate) fn record_error(&mut self, error: Option<String>) {
        self.last_error = error;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_builder_testing::epoch;

    #[test]
    fn empty_repository() {
        let state = EventState::new();
        assert_eq!(state.count(), 0);
        assert!(state.current_event().is_none());
        assert!(state.last_error().is_none());
        assert!(state.is_in_sync());
    }

    #[test]
    fn current_event_is_a_copy() {
        let event = Event::new(EventId::new("event-1"), "Launch Party", "", epoch());
        let mut state = EventState::new();
        state.replace_events(vec![event.clone()]);
        state.set_current_event(Some(event.clone()));
        assert!(state.is_in_sync());

        let mut renamed = event;
        renamed.title = "Afterparty".to_string();
        state.replace_events(vec![renamed]);
        assert!(!state.is_in_sync());
        assert_eq!(
            state.current_event().map(|e| e.title.as_str()),
            Some("Launch Party")
        );
    }
}
