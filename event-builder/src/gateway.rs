//! Backend gateway for event persistence.
//!
//! The action layer talks to the backend only through [`BackendGateway`].
//! [`MockBackend`] simulates the network with fixed latencies and fabricates
//! responses locally; swapping in a real HTTP client means implementing the
//! trait, nothing else.

use crate::types::{CustomModule, Event, EventId, EventPatch, NewEvent, QuickLink};
use event_builder_core::environment::{Clock, IdGenerator, SystemClock, UuidGenerator};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;

/// Gateway result
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Boxed future returned by every gateway call
pub type GatewayFuture<T> = Pin<Box<dyn Future<Output = GatewayResult<T>> + Send>>;

/// Gateway error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Backend could not be reached
    #[error("Backend unavailable")]
    Unavailable,

    /// Backend refused the request
    #[error("Request rejected: {reason}")]
    Rejected {
        /// Rejection reason
        reason: String,
    },

    /// Backend did not answer in time
    #[error("Gateway timeout")]
    Timeout,
}

/// Backend gateway trait
///
/// Update calls acknowledge with `()`: the caller merges its own request
/// into local state and ignores whatever the backend echoes back.
pub trait BackendGateway: Send + Sync {
    /// Persist a new event; the backend assigns id and timestamps
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails
    fn create_event(&self, fields: NewEvent) -> GatewayFuture<Event>;

    /// Replace the flyer image
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails
    fn update_flyer_image(&self, event_id: &EventId, image_url: &str) -> GatewayFuture<()>;

    /// Replace the page background
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails
    fn update_background_image(&self, event_id: &EventId, image_url: &str) -> GatewayFuture<()>;

    /// Apply a partial update
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails
    fn update_event(&self, event_id: &EventId, patch: &EventPatch) -> GatewayFuture<()>;

    /// Attach a module
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails
    fn add_module(&self, event_id: &EventId, module: &CustomModule) -> GatewayFuture<()>;

    /// Fetch the quick-link catalog
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails
    fn get_quick_links(&self) -> GatewayFuture<Vec<QuickLink>>;
}

/// Simulated round-trip times
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayLatency {
    /// `create_event`
    pub create: Duration,
    /// All update calls and `add_module`
    pub update: Duration,
    /// `get_quick_links`
    pub quick_links: Duration,
}

impl GatewayLatency {
    /// No delay at all, for tests
    #[must_use]
    pub const fn none() -> Self {
        Self {
            create: Duration::ZERO,
            update: Duration::ZERO,
            quick_links: Duration::ZERO,
        }
    }
}

impl Default for GatewayLatency {
    fn default() -> Self {
        Self {
            create: Duration::from_millis(500),
            update: Duration::from_millis(300),
            quick_links: Duration::from_millis(200),
        }
    }
}

/// A call received by [`MockBackend`], in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    /// `create_event`
    CreateEvent {
        /// Requested title
        title: String,
    },
    /// `update_flyer_image`
    UpdateFlyerImage {
        /// Target event
        event_id: EventId,
    },
    /// `update_background_image`
    UpdateBackgroundImage {
        /// Target event
        event_id: EventId,
    },
    /// `update_event`
    UpdateEvent {
        /// Target event
        event_id: EventId,
    },
    /// `add_module`
    AddModule {
        /// Target event
        event_id: EventId,
        /// Module code
        code: String,
    },
    /// `get_quick_links`
    GetQuickLinks,
}

#[derive(Debug, Default)]
struct Failures {
    next: Option<GatewayError>,
    all: Option<GatewayError>,
}

impl Failures {
    fn take(&mut self) -> Option<GatewayError> {
        self.next.take().or_else(|| self.all.clone())
    }
}

/// The catalog every mock backend serves
#[must_use]
pub fn default_quick_links() -> Vec<QuickLink> {
    vec![
        QuickLink::new("1", "Ticket Sales", "tickets", "ticket-module"),
        QuickLink::new("2", "RSVP Form", "rsvp", "rsvp-module"),
        QuickLink::new("3", "Countdown Timer", "countdown", "countdown-module"),
        QuickLink::new("4", "Social Share", "social", "social-module"),
    ]
}

/// Mock backend (succeeds unless told otherwise)
///
/// Nothing is stored: creates echo the request back with a fresh id and
/// timestamps, updates are acknowledged after a delay.
pub struct MockBackend {
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    latency: GatewayLatency,
    failures: Mutex<Failures>,
    calls: Mutex<Vec<GatewayCall>>,
}

impl MockBackend {
    /// Wall clock, UUID ids and default latencies
    #[must_use]
    pub fn new() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidGenerator),
            latency: GatewayLatency::default(),
            failures: Mutex::new(Failures::default()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Use `clock` for created and updated timestamps
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use `ids` for event ids
    #[must_use]
    pub fn with_ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Override the simulated latencies
    #[must_use]
    pub const fn with_latency(mut self, latency: GatewayLatency) -> Self {
        self.latency = latency;
        self
    }

    /// Creates an Arc-wrapped instance for sharing
    #[must_use]
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Fail the next call with `error`
    pub fn fail_next(&self, error: GatewayError) {
        lock(&self.failures).next = Some(error);
    }

    /// Fail every call with `error` until [`MockBackend::recover`]
    pub fn fail_all(&self, error: GatewayError) {
        lock(&self.failures).all = Some(error);
    }

    /// Clear both failure switches
    pub fn recover(&self) {
        *lock(&self.failures) = Failures::default();
    }

    /// Calls received so far
    #[must_use]
    pub fn calls(&self) -> Vec<GatewayCall> {
        lock(&self.calls).clone()
    }

    fn record(&self, call: GatewayCall) -> Option<GatewayError> {
        lock(&self.calls).push(call);
        lock(&self.failures).take()
    }

    fn acknowledge(&self, call: GatewayCall) -> GatewayFuture<()> {
        let failure = self.record(call.clone());
        let delay = self.latency.update;
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            if let Some(error) = failure {
                tracing::warn!(?call, %error, "Mock backend failing request");
                return Err(error);
            }
            tracing::info!(?call, "Mock backend acknowledged update");
            Ok(())
        })
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MockBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBackend")
            .field("latency", &self.latency)
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl BackendGateway for MockBackend {
    fn create_event(&self, fields: NewEvent) -> GatewayFuture<Event> {
        let failure = self.record(GatewayCall::CreateEvent {
            title: fields.title.clone(),
        });
        let id = EventId::new(self.ids.next_id("event"));
        let now = self.clock.now();
        let delay = self.latency.create;

        Box::pin(async move {
            // Simulate network delay
            tokio::time::sleep(delay).await;

            if let Some(error) = failure {
                tracing::warn!(%error, "Mock backend failing create");
                return Err(error);
            }

            let event = Event::from_new(id, fields, now);
            tracing::info!(event_id = %event.id, title = %event.title, "Mock event created");
            Ok(event)
        })
    }

    fn update_flyer_image(&self, event_id: &EventId, _image_url: &str) -> GatewayFuture<()> {
        self.acknowledge(GatewayCall::UpdateFlyerImage {
            event_id: event_id.clone(),
        })
    }

    fn update_background_image(&self, event_id: &EventId, _image_url: &str) -> GatewayFuture<()> {
        self.acknowledge(GatewayCall::UpdateBackgroundImage {
            event_id: event_id.clone(),
        })
    }

    fn update_event(&self, event_id: &EventId, _patch: &EventPatch) -> GatewayFuture<()> {
        self.acknowledge(GatewayCall::UpdateEvent {
            event_id: event_id.clone(),
        })
    }

    fn add_module(&self, event_id: &EventId, module: &CustomModule) -> GatewayFuture<()> {
        self.acknowledge(GatewayCall::AddModule {
            event_id: event_id.clone(),
            code: module.code.code().to_string(),
        })
    }

    fn get_quick_links(&self) -> GatewayFuture<Vec<QuickLink>> {
        let failure = self.record(GatewayCall::GetQuickLinks);
        let delay = self.latency.quick_links;
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            match failure {
                Some(error) => Err(error),
                None => Ok(default_quick_links()),
            }
        })
    }
}
