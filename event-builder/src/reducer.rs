//! Reducer for the event repository.
//!
//! Every mutating command issues exactly one gateway call and returns a
//! single [`Effect::Future`] that resolves to a terminal event carrying the
//! command's [`RequestId`]. State only changes when that terminal event is
//! reduced, so a failed gateway call leaves `events` and `current_event`
//! untouched.
//!
//! Merges run against the state as it is when the terminal event arrives,
//! not a snapshot taken when the command was sent. Two in-flight updates to
//! the same event therefore both land; where they touch the same field the
//! one that completes last wins.

use crate::gateway::{BackendGateway, GatewayError, GatewayFuture};
use crate::repository::EventState;
use crate::types::{CustomModule, Event, EventId, EventPatch, NewEvent};
use chrono::{DateTime, Utc};
use event_builder_core::{effect::Effect, environment::Clock, reducer::Reducer, smallvec, SmallVec};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Correlates a command with the terminal event it produces
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new random `RequestId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which gateway call a failure came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GatewayOperation {
    /// `create_event`
    CreateEvent,
    /// `update_event`
    UpdateEvent,
    /// `update_flyer_image`
    UpdateFlyerImage,
    /// `update_background_image`
    UpdateBackgroundImage,
    /// `add_module`
    AddModule,
}

impl GatewayOperation {
    /// Stable name for logs and metric labels
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateEvent => "create_event",
            Self::UpdateEvent => "update_event",
            Self::UpdateFlyerImage => "update_flyer_image",
            Self::UpdateBackgroundImage => "update_background_image",
            Self::AddModule => "add_module",
        }
    }
}

impl fmt::Display for GatewayOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Commands the editor sends and the events they resolve to
#[derive(Clone, Debug, PartialEq)]
pub enum EventAction {
    // ========== Commands ==========
    /// Command: create an event through the gateway
    CreateEvent {
        /// Correlation id
        request_id: RequestId,
        /// Requested fields
        fields: NewEvent,
    },

    /// Command: shallow-merge a partial field set
    UpdateEvent {
        /// Correlation id
        request_id: RequestId,
        /// Target event
        event_id: EventId,
        /// Fields to change
        patch: EventPatch,
    },

    /// Command: replace the flyer image
    UpdateFlyer {
        /// Correlation id
        request_id: RequestId,
        /// Target event
        event_id: EventId,
        /// Image URI or data URI
        image_url: String,
    },

    /// Command: replace the page background
    UpdateBackground {
        /// Correlation id
        request_id: RequestId,
        /// Target event
        event_id: EventId,
        /// Image URI or data URI
        image_url: String,
    },

    /// Command: replace the flyer headline
    UpdateFlyerText {
        /// Correlation id
        request_id: RequestId,
        /// Target event
        event_id: EventId,
        /// New headline
        text: String,
    },

    /// Command: append a module
    AddModule {
        /// Correlation id
        request_id: RequestId,
        /// Target event
        event_id: EventId,
        /// Module to append
        module: CustomModule,
    },

    /// Command: point `current_event` at a copy of a listed event
    ///
    /// Local only; no gateway call and no terminal event.
    SetCurrentEvent {
        /// Event to select
        event_id: EventId,
    },

    // ========== Events ==========
    /// Event: the gateway created an event
    EventCreated {
        /// Correlation id
        request_id: RequestId,
        /// The gateway's echo, trusted as-is
        event: Event,
    },

    /// Event: the gateway acknowledged a field update
    EventUpdated {
        /// Correlation id
        request_id: RequestId,
        /// Target event
        event_id: EventId,
        /// Fields to merge
        patch: EventPatch,
        /// Stamped after the gateway resolved
        updated_at: DateTime<Utc>,
    },

    /// Event: the gateway acknowledged a module
    ModuleAdded {
        /// Correlation id
        request_id: RequestId,
        /// Target event
        event_id: EventId,
        /// Module to append
        module: CustomModule,
        /// Stamped after the gateway resolved
        updated_at: DateTime<Utc>,
    },

    /// Event: the gateway call failed; nothing was merged
    GatewayFailed {
        /// Correlation id
        request_id: RequestId,
        /// The call that failed
        operation: GatewayOperation,
        /// Why
        error: GatewayError,
    },
}

impl EventAction {
    /// Correlation id of a terminal event, `None` for commands
    #[must_use]
    pub const fn terminal_request_id(&self) -> Option<&RequestId> {
        match self {
            Self::EventCreated { request_id, .. }
            | Self::EventUpdated { request_id, .. }
            | Self::ModuleAdded { request_id, .. }
            | Self::GatewayFailed { request_id, .. } => Some(request_id),
            _ => None,
        }
    }

    /// `true` if this is the terminal event for `request_id`
    #[must_use]
    pub fn completes(&self, request_id: &RequestId) -> bool {
        self.terminal_request_id() == Some(request_id)
    }
}

/// Environment dependencies for the event reducer
#[derive(Clone)]
pub struct EventEnvironment {
    /// Stamps `updated_at` after each acknowledged update
    pub clock: Arc<dyn Clock>,
    /// Backend every mutation goes through
    pub gateway: Arc<dyn BackendGateway>,
}

impl EventEnvironment {
    /// Creates a new `EventEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, gateway: Arc<dyn BackendGateway>) -> Self {
        Self { clock, gateway }
    }
}

/// Reducer for the event repository
#[derive(Clone, Debug, Default)]
pub struct EventReducer;

impl EventReducer {
    /// Creates a new `EventReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Awaits an update call, then stamps the success event
    fn acknowledged<F>(
        call: GatewayFuture<()>,
        clock: Arc<dyn Clock>,
        request_id: RequestId,
        operation: GatewayOperation,
        on_success: F,
    ) -> Effect<EventAction>
    where
        F: FnOnce(DateTime<Utc>) -> EventAction + Send + 'static,
    {
        Effect::future(async move {
            Some(match call.await {
                Ok(()) => on_success(clock.now()),
                Err(error) => EventAction::GatewayFailed {
                    request_id,
                    operation,
                    error,
                },
            })
        })
    }

    /// Issues an `update_event` call that merges `patch` on success
    fn patch_effect(
        env: &EventEnvironment,
        request_id: RequestId,
        event_id: EventId,
        patch: EventPatch,
        call: GatewayFuture<()>,
        operation: GatewayOperation,
    ) -> Effect<EventAction> {
        Self::acknowledged(
            call,
            Arc::clone(&env.clock),
            request_id,
            operation,
            move |updated_at| EventAction::EventUpdated {
                request_id,
                event_id,
                patch,
                updated_at,
            },
        )
    }

    /// Applies `change` to the listed event and, if it is current, to the current copy
    ///
    /// Returns `false` when no listed event has `event_id`; state is then
    /// left alone.
    fn merge<F>(state: &mut EventState, event_id: &EventId, change: F) -> bool
    where
        F: Fn(&mut Event),
    {
        if state.event(event_id).is_none() {
            tracing::warn!(%event_id, "Update for unknown event ignored");
            return false;
        }

        let mut events = state.events().to_vec();
        for event in events.iter_mut().filter(|e| &e.id == event_id) {
            change(event);
        }
        state.replace_events(events);

        if let Some(current) = state.current_event().filter(|c| &c.id == event_id) {
            let mut current = current.clone();
            change(&mut current);
            state.set_current_event(Some(current));
        }
        true
    }

    /// Applies an event to state
    fn apply_event(state: &mut EventState, action: &EventAction) {
        match action {
            EventAction::EventCreated { event, .. } => {
                let mut events = state.events().to_vec();
                events.push(event.clone());
                state.replace_events(events);
                state.set_current_event(Some(event.clone()));
                state.record_error(None);
            },
            EventAction::EventUpdated {
                event_id,
                patch,
                updated_at,
                ..
            } => {
                Self::merge(state, event_id, |event| {
                    patch.apply_to(event);
                    event.updated_at = *updated_at;
                });
                state.record_error(None);
            },
            EventAction::ModuleAdded {
                event_id,
                module,
                updated_at,
                ..
            } => {
                Self::merge(state, event_id, |event| {
                    event.modules.push(module.clone());
                    event.updated_at = *updated_at;
                });
                state.record_error(None);
            },
            EventAction::GatewayFailed {
                operation, error, ..
            } => {
                state.record_error(Some(format!("{operation} failed: {error}")));
            },
            // Commands are not applied to state
            EventAction::CreateEvent { .. }
            | EventAction::UpdateEvent { .. }
            | EventAction::UpdateFlyer { .. }
            | EventAction::UpdateBackground { .. }
            | EventAction::UpdateFlyerText { .. }
            | EventAction::AddModule { .. }
            | EventAction::SetCurrentEvent { .. } => {},
        }
    }
}

impl Reducer for EventReducer {
    type State = EventState;
    type Action = EventAction;
    type Environment = EventEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Commands ==========
            EventAction::CreateEvent { request_id, fields } => {
                tracing::debug!(%request_id, title = %fields.title, "Creating event");
                let call = env.gateway.create_event(fields);

                smallvec![Effect::future(async move {
                    Some(match call.await {
                        Ok(event) => EventAction::EventCreated { request_id, event },
                        Err(error) => EventAction::GatewayFailed {
                            request_id,
                            operation: GatewayOperation::CreateEvent,
                            error,
                        },
                    })
                })]
            },

            EventAction::UpdateEvent {
                request_id,
                event_id,
                patch,
            } => {
                tracing::debug!(%request_id, %event_id, "Updating event");
                let call = env.gateway.update_event(&event_id, &patch);
                smallvec![Self::patch_effect(
                    env,
                    request_id,
                    event_id,
                    patch,
                    call,
                    GatewayOperation::UpdateEvent,
                )]
            },

            EventAction::UpdateFlyer {
                request_id,
                event_id,
                image_url,
            } => {
                tracing::debug!(%request_id, %event_id, "Updating flyer image");
                let call = env.gateway.update_flyer_image(&event_id, &image_url);
                smallvec![Self::patch_effect(
                    env,
                    request_id,
                    event_id,
                    EventPatch::new().flyer_image(image_url),
                    call,
                    GatewayOperation::UpdateFlyerImage,
                )]
            },

            EventAction::UpdateBackground {
                request_id,
                event_id,
                image_url,
            } => {
                tracing::debug!(%request_id, %event_id, "Updating background image");
                let call = env.gateway.update_background_image(&event_id, &image_url);
                smallvec![Self::patch_effect(
                    env,
                    request_id,
                    event_id,
                    EventPatch::new().background_image(image_url),
                    call,
                    GatewayOperation::UpdateBackgroundImage,
                )]
            },

            EventAction::UpdateFlyerText {
                request_id,
                event_id,
                text,
            } => {
                tracing::debug!(%request_id, %event_id, "Updating flyer text");
                let patch = EventPatch::new().flyer_text(text);
                let call = env.gateway.update_event(&event_id, &patch);
                smallvec![Self::patch_effect(
                    env,
                    request_id,
                    event_id,
                    patch,
                    call,
                    GatewayOperation::UpdateEvent,
                )]
            },

            EventAction::AddModule {
                request_id,
                event_id,
                module,
            } => {
                tracing::debug!(%request_id, %event_id, code = %module.code, "Adding module");
                let call = env.gateway.add_module(&event_id, &module);
                smallvec![Self::acknowledged(
                    call,
                    Arc::clone(&env.clock),
                    request_id,
                    GatewayOperation::AddModule,
                    move |updated_at| EventAction::ModuleAdded {
                        request_id,
                        event_id,
                        module,
                        updated_at,
                    },
                )]
            },

            EventAction::SetCurrentEvent { event_id } => {
                match state.event(&event_id).cloned() {
                    Some(event) => state.set_current_event(Some(event)),
                    None => tracing::debug!(%event_id, "Current event unchanged, id not found"),
                }
                SmallVec::new()
            },

            // ========== Events ==========
            EventAction::GatewayFailed {
                request_id,
                operation,
                ref error,
            } => {
                tracing::warn!(%request_id, %operation, %error, "Gateway call failed, state unchanged");
                metrics::counter!("event_builder.gateway.failures", "operation" => operation.as_str())
                    .increment(1);
                Self::apply_event(state, &action);
                SmallVec::new()
            },

            EventAction::EventCreated { .. }
            | EventAction::EventUpdated { .. }
            | EventAction::ModuleAdded { .. } => {
                Self::apply_event(state, &action);
                SmallVec::new()
            },
        }
    }
}
