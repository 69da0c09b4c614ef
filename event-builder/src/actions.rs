//! Async facade over the event store.
//!
//! This is the only way the editor mutates events. Each call sends a
//! command with a fresh [`RequestId`] and waits for the terminal event
//! carrying it. By the time a call returns `Ok`, the merge is already in
//! state; when it returns [`ActionError::Gateway`], nothing was merged.
//!
//! ```ignore
//! let actions = EventActions::new(environment);
//! let event = actions.create_event(NewEvent::new("Launch Party", "")).await?;
//! actions.update_event(&event.id, EventPatch::new().capacity("50")).await?;
//! ```

use crate::catalog;
use crate::error::ActionError;
use crate::reducer::{EventAction, EventEnvironment, EventReducer, RequestId};
use crate::repository::EventState;
use crate::types::{CustomModule, Event, EventId, EventPatch, NewEvent, QuickLink};
use event_builder_core::environment::{IdGenerator, UuidGenerator};
use event_builder_runtime::{Store, StoreError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// The store type the facade drives
pub type EventStore = Store<EventState, EventAction, EventEnvironment, EventReducer>;

/// Uniform action interface over the event repository
#[derive(Clone)]
pub struct EventActions {
    store: EventStore,
    ids: Arc<dyn IdGenerator>,
    timeout: Option<Duration>,
}

impl EventActions {
    /// Fresh, empty repository over `environment`
    #[must_use]
    pub fn new(environment: EventEnvironment) -> Self {
        Self::with_store(Store::new(EventState::new(), EventReducer::new(), environment))
    }

    /// Drive an existing store
    #[must_use]
    pub fn with_store(store: EventStore) -> Self {
        Self {
            store,
            ids: Arc::new(UuidGenerator),
            timeout: None,
        }
    }

    /// Use `ids` for module ids created from quick links
    #[must_use]
    pub fn with_ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Give up waiting for a result after `timeout`; `None` waits forever
    ///
    /// A timed-out call may still land later.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The underlying store
    #[must_use]
    pub const fn store(&self) -> &EventStore {
        &self.store
    }

    /// Creates an event and makes it current
    ///
    /// Returns the event exactly as the gateway echoed it.
    ///
    /// # Errors
    ///
    /// [`ActionError::Gateway`] if the backend fails, [`ActionError::Store`]
    /// if the store is shutting down or the wait times out
    #[tracing::instrument(skip_all, fields(title = %fields.title))]
    pub async fn create_event(&self, fields: NewEvent) -> Result<Event, ActionError> {
        let request_id = RequestId::new();
        match self
            .dispatch(request_id, EventAction::CreateEvent { request_id, fields })
            .await?
        {
            EventAction::EventCreated { event, .. } => {
                tracing::info!(event_id = %event.id, "Event created");
                Ok(event)
            },
            other => Err(unexpected(request_id, &other)),
        }
    }

    /// Shallow-merges `patch` into the event
    ///
    /// An unknown `event_id` still reaches the gateway; the merge is then
    /// a silent no-op and the call succeeds.
    ///
    /// # Errors
    ///
    /// See [`EventActions::create_event`]
    #[tracing::instrument(skip_all, fields(event_id = %event_id))]
    pub async fn update_event(&self, event_id: &EventId, patch: EventPatch) -> Result<(), ActionError> {
        let request_id = RequestId::new();
        self.dispatch(
            request_id,
            EventAction::UpdateEvent {
                request_id,
                event_id: event_id.clone(),
                patch,
            },
        )
        .await
        .map(drop)
    }

    /// Replaces the flyer image
    ///
    /// # Errors
    ///
    /// See [`EventActions::create_event`]
    #[tracing::instrument(skip_all, fields(event_id = %event_id))]
    pub async fn update_event_flyer(
        &self,
        event_id: &EventId,
        image_url: impl Into<String>,
    ) -> Result<(), ActionError> {
        let request_id = RequestId::new();
        self.dispatch(
            request_id,
            EventAction::UpdateFlyer {
                request_id,
                event_id: event_id.clone(),
                image_url: image_url.into(),
            },
        )
        .await
        .map(drop)
    }

    /// Replaces the page background
    ///
    /// # Errors
    ///
    /// See [`EventActions::create_event`]
    #[tracing::instrument(skip_all, fields(event_id = %event_id))]
    pub async fn update_event_background(
        &self,
        event_id: &EventId,
        image_url: impl Into<String>,
    ) -> Result<(), ActionError> {
        let request_id = RequestId::new();
        self.dispatch(
            request_id,
            EventAction::UpdateBackground {
                request_id,
                event_id: event_id.clone(),
                image_url: image_url.into(),
            },
        )
        .await
        .map(drop)
    }

    /// Replaces the flyer headline
    ///
    /// # Errors
    ///
    /// See [`EventActions::create_event`]
    #[tracing::instrument(skip_all, fields(event_id = %event_id))]
    pub async fn update_event_flyer_text(
        &self,
        event_id: &EventId,
        text: impl Into<String>,
    ) -> Result<(), ActionError> {
        let request_id = RequestId::new();
        self.dispatch(
            request_id,
            EventAction::UpdateFlyerText {
                request_id,
                event_id: event_id.clone(),
                text: text.into(),
            },
        )
        .await
        .map(drop)
    }

    /// Appends `module` to the event's modules
    ///
    /// # Errors
    ///
    /// See [`EventActions::create_event`]
    #[tracing::instrument(skip_all, fields(event_id = %event_id, code = %module.code))]
    pub async fn add_module_to_event(
        &self,
        event_id: &EventId,
        module: CustomModule,
    ) -> Result<(), ActionError> {
        let request_id = RequestId::new();
        self.dispatch(
            request_id,
            EventAction::AddModule {
                request_id,
                event_id: event_id.clone(),
                module,
            },
        )
        .await
        .map(drop)
    }

    /// Instantiates `link` and appends the module; returns the module added
    ///
    /// # Errors
    ///
    /// See [`EventActions::create_event`]
    pub async fn add_quick_link_to_event(
        &self,
        event_id: &EventId,
        link: &QuickLink,
    ) -> Result<CustomModule, ActionError> {
        let module = catalog::instantiate(link, self.ids.as_ref());
        self.add_module_to_event(event_id, module.clone()).await?;
        Ok(module)
    }

    /// Makes a copy of the listed event current
    ///
    /// Returns `false`, leaving the current event as it was, when no event
    /// has `event_id`.
    ///
    /// # Errors
    ///
    /// [`ActionError::Store`] if the store is shutting down
    #[tracing::instrument(skip_all, fields(event_id = %event_id))]
    pub async fn set_current_event_by_id(&self, event_id: &EventId) -> Result<bool, ActionError> {
        self.store
            .send(EventAction::SetCurrentEvent {
                event_id: event_id.clone(),
            })
            .await?;
        Ok(self
            .store
            .state(|s| s.current_event().is_some_and(|c| &c.id == event_id))
            .await)
    }

    /// All events in creation order
    pub async fn events(&self) -> Vec<Event> {
        self.store.state(|s| s.events().to_vec()).await
    }

    /// The event being edited
    pub async fn current_event(&self) -> Option<Event> {
        self.store.state(|s| s.current_event().cloned()).await
    }

    /// A listed event by id
    pub async fn event(&self, event_id: &EventId) -> Option<Event> {
        self.store.state(|s| s.event(event_id).cloned()).await
    }

    /// Last gateway failure recorded in state
    pub async fn last_error(&self) -> Option<String> {
        self.store.state(|s| s.last_error().map(str::to_string)).await
    }

    /// Copy of the whole repository
    pub async fn snapshot(&self) -> EventState {
        self.store.state(EventState::clone).await
    }

    /// Every terminal event, successes and failures alike
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EventAction> {
        self.store.subscribe_actions()
    }

    /// Waits for in-flight calls, then rejects new ones
    ///
    /// # Errors
    ///
    /// [`StoreError::ShutdownTimeout`] if calls are still running after `timeout`
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        self.store.shutdown(timeout).await
    }

    async fn dispatch(
        &self,
        request_id: RequestId,
        action: EventAction,
    ) -> Result<EventAction, ActionError> {
        let terminal = self
            .store
            .send_and_wait_for(action, move |a| a.completes(&request_id), self.timeout)
            .await?;

        match terminal {
            EventAction::GatewayFailed {
                operation, error, ..
            } => Err(ActionError::Gateway {
                operation,
                source: error,
            }),
            other => Ok(other),
        }
    }
}

fn unexpected(request_id: RequestId, action: &EventAction) -> ActionError {
    ActionError::UnexpectedResponse {
        request_id,
        action: format!("{action:?}"),
    }
}
