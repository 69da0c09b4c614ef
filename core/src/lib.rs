//! # Event Builder Core
//!
//! Core traits and types for the event builder's state layer.
//!
//! The editor keeps all of its state in a single store that is only ever
//! changed by dispatching actions through a reducer. This crate holds the
//! framework pieces that the runtime and the domain crate share.
//!
//! ## Core Concepts
//!
//! - **State**: The data a feature owns (for the builder: the event list and the current event)
//! - **Action**: All possible inputs to a reducer (commands and the events they produce)
//! - **Reducer**: `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Description of asynchronous work (not its execution)
//! - **Environment**: Injected dependencies (clock, id generation, backend gateway)
//!
//! ## Example
//!
//! ```ignore
//! use event_builder_core::*;
//!
//! impl Reducer for EventReducer {
//!     type State = EventState;
//!     type Action = EventAction;
//!     type Environment = EventEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut EventState,
//!         action: EventAction,
//!         env: &EventEnvironment,
//!     ) -> SmallVec<[Effect<EventAction>; 4]> {
//!         SmallVec::new()
//!     }
//! }
//! ```

// Reducers build their effect lists with these
pub use smallvec::{smallvec, SmallVec};

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
/// Anything asynchronous is returned as an [`Effect`](crate::effect::Effect)
/// and executed by the runtime.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// Updates state in place and returns effect descriptions for the
        /// runtime to execute. Most actions produce zero or one effect, so
        /// the effects live inline in a `SmallVec`.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects are values. They are returned from reducers and executed by the
/// Store, which feeds any produced action back into the reducer.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;

    /// Effect type - describes a side effect to be executed
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Wrap an async block as an effect
        #[must_use]
        pub fn future<F>(fut: F) -> Effect<Action>
        where
            F: Future<Output = Option<Action>> + Send + 'static,
        {
            Effect::Future(Box::pin(fut))
        }

        /// Returns `true` for `Effect::None`
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter, so tests can swap in deterministic
/// implementations.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock used in production
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    /// Generates opaque identifiers
    ///
    /// Ids carry a short prefix (`event`, `module`) so they stay readable
    /// in logs.
    pub trait IdGenerator: Send + Sync {
        /// Produce a new id with the given prefix
        fn next_id(&self, prefix: &str) -> String;
    }

    /// Random v4 UUID ids, e.g. `module-6f0c…`
    #[derive(Debug, Clone, Copy, Default)]
    pub struct UuidGenerator;

    impl IdGenerator for UuidGenerator {
        fn next_id(&self, prefix: &str) -> String {
            format!("{prefix}-{}", uuid::Uuid::new_v4())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::effect::Effect;
    use super::environment::{Clock, IdGenerator, SystemClock, UuidGenerator};

    #[test]
    fn effect_debug_hides_future() {
        let effect: Effect<u32> = Effect::future(async { Some(1) });
        assert_eq!(format!("{effect:?}"), "Effect::Future(<future>)");

        let none: Effect<u32> = Effect::None;
        assert_eq!(format!("{none:?}"), "Effect::None");
        assert!(none.is_none());
    }

    #[test]
    fn future_effect_yields_action() {
        let effect: Effect<u32> = Effect::future(async { Some(7) });
        let Effect::Future(fut) = effect else {
            unreachable!("constructed as a future");
        };
        assert_eq!(tokio_test::block_on(fut), Some(7));
    }

    #[test]
    fn uuid_ids_are_prefixed_and_distinct() {
        let ids = UuidGenerator;
        let a = ids.next_id("event");
        let b = ids.next_id("event");
        assert!(a.starts_with("event-"));
        assert_ne!(a, b);
    }

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock;
        let first = clock.now();
        assert!(clock.now() >= first);
    }
}
