//! Event Builder - state layer for a two-panel event editor
//!
//! A host assembles an event (title, schedule, imagery, optional sections and
//! add-on modules) while every change is persisted through a backend gateway.
//! This crate holds everything below the UI:
//!
//! - **Repository**: the event list plus a value copy of the event being edited
//! - **Action layer**: a reducer and an async facade; the only way to mutate events
//! - **Gateway**: the backend contract and a mock that simulates it
//! - **Module registry**: code-to-view dispatch for add-on modules
//! - **Quick-link catalog**: the module templates a host can add
//! - **Field controller**: which optional form sections are shown and which
//!   quick-add buttons remain
//!
//! # Architecture
//!
//! ```text
//!  FieldController / QuickLinkCatalog
//!                 │
//!                 ▼
//!           EventActions ──send──► Store ──reduce──► EventReducer
//!                 ▲                  │                    │
//!                 │             broadcast           Effect::Future
//!                 │                  │                    │
//!                 └── terminal event ◄──── BackendGateway ◄┘
//! ```
//!
//! A command never changes state by itself. Its effect awaits the gateway and
//! feeds back one terminal event (`EventCreated`, `EventUpdated`,
//! `ModuleAdded` or `GatewayFailed`); only success events are merged.

#![forbid(unsafe_code)]

pub mod actions;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fields;
pub mod gateway;
pub mod modules;
pub mod reducer;
pub mod repository;
pub mod schedule;
pub mod types;

pub use actions::{EventActions, EventStore};
pub use catalog::QuickLinkCatalog;
pub use config::Config;
pub use error::{ActionError, ScheduleError};
pub use fields::{EventDraft, FieldController, FieldEdit, FieldKey};
pub use gateway::{BackendGateway, GatewayError, GatewayLatency, GatewayResult, MockBackend};
pub use modules::{render_module, ModuleKind, ModuleView, RenderContext};
pub use reducer::{EventAction, EventEnvironment, EventReducer, GatewayOperation, RequestId};
pub use repository::EventState;
pub use schedule::{format_date_time, DateRange, DateRangeDraft};
pub use types::{
    CustomModule, Event, EventId, EventPatch, Link, ModuleId, NewEvent, Privacy, QuickLink, Section,
};
