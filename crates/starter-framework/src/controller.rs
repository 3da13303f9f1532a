//! # Start Controller
//!
//! The scheduler at the heart of the engine. Components register starters
//! in any order; the controller keeps them in a stable descending-priority
//! queue and, on [`StartController::start`], drains the queue one starter
//! at a time against a fresh [`SharedContext`], firing listeners as each
//! named starter completes.
//!
//! # Concurrency Model
//! Registration may happen from several wiring paths at once (and from
//! inside a running starter's action), so queue mutation sits behind one
//! mutex. The drain loop itself is strictly sequential: one starter runs
//! at a time, synchronously from the loop's point of view, so bootstrap
//! order is deterministic and debuggable. The lock is never held across
//! an `.await`.
//!
//! # One Run Per Controller
//! A controller performs exactly one bootstrap. A second call to
//! [`start`](StartController::start) fails with [`BootError::Consumed`];
//! running again requires constructing and re-registering a new
//! controller.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info};

use crate::context::SharedContext;
use crate::error::{BootError, BoxError};
use crate::starter::Starter;

/// Callback fired with the shared context after a named starter
/// completes successfully.
pub type StartListener = Box<dyn FnMut(&mut SharedContext) -> Result<(), BoxError> + Send>;

struct State {
    /// Every name ever registered, including already-drained ones.
    /// Duplicate detection must outlive the queue entry.
    names: HashSet<String>,
    /// Pending starters, descending priority, stable for ties.
    queue: Vec<Box<dyn Starter>>,
    listeners: HashMap<String, Vec<StartListener>>,
    consumed: bool,
}

/// The bootstrap scheduler.
///
/// Cheap to clone: clones share one underlying queue, so a component can
/// hold a handle and register subordinate starters from inside its own
/// start action.
#[derive(Clone)]
pub struct StartController {
    state: Arc<Mutex<State>>,
}

impl Default for StartController {
    fn default() -> Self {
        Self::new()
    }
}

impl StartController {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                names: HashSet::new(),
                queue: Vec::new(),
                listeners: HashMap::new(),
                consumed: false,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a starter.
    ///
    /// Starters may be registered before or during a run; a registration
    /// made from inside another starter's action is picked up by later
    /// drain iterations. Registering a second starter under an existing
    /// name is a fatal configuration error, even if the first one has
    /// already run.
    pub fn register(&self, starter: impl Starter + 'static) -> Result<(), BootError> {
        self.register_boxed(Box::new(starter))
    }

    pub fn register_boxed(&self, starter: Box<dyn Starter>) -> Result<(), BootError> {
        let name = starter.name().to_string();
        let priority = starter.priority();
        let mut state = self.state();

        if !state.names.insert(name.clone()) {
            error!(starter = %name, "duplicated starter registration");
            return Err(BootError::DuplicateStarter(name));
        }

        // Stable insertion: before the first strictly-lower entry, else at
        // the end. Equal priorities keep registration order.
        let pos = state
            .queue
            .iter()
            .position(|queued| priority > queued.priority())
            .unwrap_or(state.queue.len());
        state.queue.insert(pos, starter);

        debug!(starter = %name, priority, pending = state.queue.len(), "starter registered");
        Ok(())
    }

    /// Registers a listener for `starter_name`.
    ///
    /// Listeners fire in registration order, once, after that starter
    /// completes successfully. The listener may be registered before the
    /// starter itself exists; a listener for a name that never starts
    /// simply never fires.
    pub fn on_started<F>(&self, starter_name: &str, listener: F)
    where
        F: FnMut(&mut SharedContext) -> Result<(), BoxError> + Send + 'static,
    {
        self.state()
            .listeners
            .entry(starter_name.to_string())
            .or_default()
            .push(Box::new(listener));
    }

    /// Runs the bootstrap: drains the queue highest-priority-first and
    /// returns the populated context.
    ///
    /// The first failing starter or listener aborts the run; starters
    /// still in the queue never execute and nothing already completed is
    /// rolled back. The controller is consumed whether the run succeeds
    /// or fails.
    pub async fn start(&self) -> Result<SharedContext, BootError> {
        {
            let mut state = self.state();
            if state.consumed {
                return Err(BootError::Consumed);
            }
            state.consumed = true;
        }

        let mut ctx = SharedContext::new();

        // Re-read the queue each iteration: a starter's action may have
        // registered new starters behind our back.
        loop {
            let next = {
                let mut state = self.state();
                if state.queue.is_empty() {
                    None
                } else {
                    Some(state.queue.remove(0))
                }
            };
            let Some(mut starter) = next else {
                break;
            };
            self.run_one(starter.as_mut(), &mut ctx).await?;
        }

        info!(entries = ctx.len(), "bootstrap complete");
        Ok(ctx)
    }

    async fn run_one(
        &self,
        starter: &mut dyn Starter,
        ctx: &mut SharedContext,
    ) -> Result<(), BootError> {
        let name = starter.name().to_string();
        if starter.started() {
            error!(starter = %name, "starter ran twice");
            return Err(BootError::AlreadyStarted(name));
        }

        debug!(starter = %name, priority = starter.priority(), "starting");
        starter.start(ctx).await.map_err(|source| {
            error!(starter = %name, error = %source, "starter failed");
            BootError::Starter {
                name: name.clone(),
                source,
            }
        })?;
        starter.mark_started();
        info!(starter = %name, "starter started");

        // Take the listener set out so each fires at most once.
        let fired = self.state().listeners.remove(&name);
        if let Some(listeners) = fired {
            for mut listener in listeners {
                listener(ctx).map_err(|source| {
                    error!(starter = %name, error = %source, "listener failed");
                    BootError::Listener {
                        name: name.clone(),
                        source,
                    }
                })?;
            }
        }
        Ok(())
    }

    /// Names and priorities of the pending queue, front first. Intended
    /// for wiring-time diagnostics.
    pub fn pending(&self) -> Vec<(String, i32)> {
        self.state()
            .queue
            .iter()
            .map(|s| (s.name().to_string(), s.priority()))
            .collect()
    }
}
