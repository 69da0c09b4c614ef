//! # Event Builder Runtime
//!
//! The Store runtime that coordinates reducer execution and effect handling.
//!
//! ## Core Components
//!
//! - **Store**: Owns the state, runs the reducer, executes effects
//! - **Effect Executor**: Spawns effect futures and feeds their actions back to the reducer
//! - **Waiters**: Request/response calls such as "create this event and give
//!   me the result" each get their own reply channel
//! - **Action Broadcast**: Lets observers see every action produced by effects
//!
//! ## Example
//!
//! ```ignore
//! use event_builder_runtime::Store;
//!
//! let store = Store::new(EventState::new(), EventReducer::new(), environment);
//!
//! // Fire and forget
//! store.send(EventAction::SetCurrentEvent { event_id }).await?;
//!
//! // Read state
//! let count = store.state(|s| s.count()).await;
//! ```

use event_builder_core::{effect::Effect, reducer::Reducer};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock, oneshot, watch};

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timeout waiting for a terminal action
        #[error("Timeout waiting for action")]
        Timeout,

        /// The reply channel closed before a matching action arrived
        #[error("Reply channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;
pub use store::Store;

/// Handle for tracking effect completion
///
/// Returned by [`Store::send`]. Tracks the effects spawned directly by the
/// sent action; actions fed back from those effects are reduced before the
/// handle completes, but any effects *they* return are not tracked.
#[derive(Clone)]
pub struct EffectHandle {
    pending: watch::Receiver<usize>,
}

impl EffectHandle {
    fn new() -> (Self, EffectTracking) {
        let (tx, rx) = watch::channel(0);
        let tracking = EffectTracking {
            counter: Arc::new(AtomicUsize::new(0)),
            notifier: Arc::new(tx),
        };
        (Self { pending: rx }, tracking)
    }

    /// Number of effects still running
    #[must_use]
    pub fn pending(&self) -> usize {
        *self.pending.borrow()
    }

    /// Wait until every tracked effect has finished
    pub async fn wait(&mut self) {
        // Sender dropped means every tracking clone is gone, so nothing is pending.
        let _ = self.pending.wait_for(|pending| *pending == 0).await;
    }

    /// Wait for effects with an upper bound
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if effects are still running when
    /// `timeout` elapses.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.pending())
            .finish()
    }
}

/// Internal: counter shared between a handle and the effects it tracks
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<usize>>,
}

impl EffectTracking {
    fn increment(&self) {
        let pending = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.notifier.send_replace(pending);
    }

    fn decrement(&self) {
        let pending = self.counter.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        self.notifier.send_replace(pending);
    }
}

/// Internal: RAII guard that decrements the effect counter on drop,
/// including when the effect future panics.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Guard that decrements the store-wide pending counter (for shutdown)
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A caller blocked in [`Store::send_and_wait_for`]
struct Waiter<A> {
    matches: Box<dyn Fn(&A) -> bool + Send + Sync>,
    reply: oneshot::Sender<A>,
}

/// Store runtime for coordinating reducer execution and effect handling.
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicCounterGuard, AtomicUsize, DecrementGuard, Duration, Effect,
        EffectHandle, EffectTracking, Mutex, Ordering, Reducer, RwLock, StoreError, Waiter,
        oneshot,
    };
    use tokio::sync::broadcast;

    /// Default capacity of the action broadcast channel
    const DEFAULT_BROADCAST_CAPACITY: usize = 64;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock`; every reducer call takes the write lock)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution, feeding produced actions back into the reducer
    ///
    /// Cloning a Store is cheap; clones share state and environment.
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: Arc<R>,
        environment: Arc<E>,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        /// Callers waiting for a specific effect action; each has its own
        /// reply channel, so a slow broadcast observer never starves them.
        waiters: Arc<Mutex<Vec<Waiter<A>>>>,
        /// Every action produced by an effect is broadcast here after it
        /// has been reduced.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Sync + Clone + std::fmt::Debug + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_broadcast_capacity(
                initial_state,
                reducer,
                environment,
                DEFAULT_BROADCAST_CAPACITY,
            )
        }

        /// Create a new store with a custom action broadcast capacity
        ///
        /// Increase the capacity when many observers subscribe and some of
        /// them are slow to drain.
        #[must_use]
        pub fn with_broadcast_capacity(
            initial_state: S,
            reducer: R,
            environment: E,
            capacity: usize,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(capacity.max(1));

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer: Arc::new(reducer),
                environment: Arc::new(environment),
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                waiters: Arc::new(Mutex::new(Vec::new())),
                action_broadcast,
            }
        }

        /// Send an action to the store
        ///
        /// 1. Acquires the write lock on state
        /// 2. Calls the reducer with (state, action, environment)
        /// 3. Spawns the returned effects
        ///
        /// Returns as soon as the reducer has run; use the returned handle
        /// to wait for effects.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            Ok(self.reduce_and_spawn(action).await)
        }

        /// Runs the reducer and spawns its effects, regardless of shutdown
        async fn reduce_and_spawn(&self, action: A) -> EffectHandle {
            tracing::debug!(?action, "Processing action");
            metrics::counter!("store.commands.total").increment(1);

            let (handle, tracking) = EffectHandle::new();

            let effects = {
                let mut state = self.state.write().await;
                let start = std::time::Instant::now();
                let effects = self.reducer.reduce(&mut *state, action, &self.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());
                effects
            };

            tracing::trace!("Reducer returned {} effects", effects.len());
            for effect in effects {
                self.execute_effect(effect, tracking.clone());
            }

            handle
        }

        /// Send an action and wait for a matching action produced by its effects
        ///
        /// Registers a waiter *before* sending, so the result cannot be
        /// missed however many other actions are in flight. The first
        /// effect action matching `predicate` is handed to this caller
        /// alone, after it has been reduced into state.
        ///
        /// `timeout` of `None` waits indefinitely.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: the timeout elapsed first
        /// - [`StoreError::ChannelClosed`]: the store went away first
        /// - [`StoreError::ShutdownInProgress`]: the store is shutting down
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Option<Duration>,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool + Send + Sync + 'static,
        {
            let (reply, rx) = oneshot::channel();
            self.waiters.lock().await.push(Waiter {
                matches: Box::new(predicate),
                reply,
            });

            // A rejected send drops `rx`; the stale waiter is pruned on the
            // next feedback.
            self.send(action).await?;

            let wait = async { rx.await.map_err(|_| StoreError::ChannelClosed) };

            match timeout {
                Some(limit) => tokio::time::timeout(limit, wait)
                    .await
                    .map_err(|_| StoreError::Timeout)?,
                None => wait.await,
            }
        }

        /// Number of callers still waiting in [`Store::send_and_wait_for`]
        pub async fn waiting(&self) -> usize {
            self.waiters
                .lock()
                .await
                .iter()
                .filter(|waiter| !waiter.reply.is_closed())
                .count()
        }

        /// Subscribe to every action produced by effects
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let count = store.state(|s| s.count()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Number of effects currently running across all sends
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.pending_effects.load(Ordering::Acquire)
        }

        /// Initiate graceful shutdown
        ///
        /// Rejects new actions, then waits for running effects.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if effects are still
        /// running when `timeout` elapses.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            self.shutdown.store(true, Ordering::Release);

            let start = std::time::Instant::now();
            let poll_interval = Duration::from_millis(10);

            loop {
                let pending = self.pending_effects.load(Ordering::Acquire);
                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    return Ok(());
                }
                if start.elapsed() >= timeout {
                    tracing::error!(pending_effects = pending, "Shutdown timed out");
                    return Err(StoreError::ShutdownTimeout(pending));
                }
                tokio::time::sleep(poll_interval).await;
            }
        }

        /// Reduce an action produced by an effect, then hand it to its
        /// waiters and broadcast it
        ///
        /// Runs during shutdown too, so in-flight effects still land.
        async fn feed_back(&self, action: A) {
            self.reduce_and_spawn(action.clone()).await;
            self.resolve_waiters(&action).await;
            // No receivers is fine
            let _ = self.action_broadcast.send(action);
        }

        /// Replies to every waiter `action` matches and drops abandoned ones
        async fn resolve_waiters(&self, action: &A) {
            let ready = {
                let mut waiters = self.waiters.lock().await;
                let (ready, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut *waiters)
                    .into_iter()
                    .filter(|waiter| !waiter.reply.is_closed())
                    .partition(|waiter| (waiter.matches)(action));
                *waiters = pending;
                ready
            };

            for waiter in ready {
                // The caller may have timed out in the meantime
                let _ = waiter.reply.send(action.clone());
            }
        }

        /// Execute an effect with completion tracking
        ///
        /// Effect failures are the effect's business: a future that wants
        /// to report an error returns an action describing it.
        fn execute_effect(&self, effect: Effect<A>, tracking: EffectTracking) {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Future(fut) => {
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                    tracking.increment();
                    self.pending_effects.fetch_add(1, Ordering::SeqCst);
                    let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guard = DecrementGuard(tracking);
                        let _pending_guard = pending_guard;

                        if let Some(action) = fut.await {
                            store.feed_back(action).await;
                        } else {
                            tracing::trace!("Effect::Future completed with no action");
                        }
                    });
                },
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: Arc::clone(&self.reducer),
                environment: Arc::clone(&self.environment),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                waiters: Arc::clone(&self.waiters),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }
}
