//! # Starter Contract
//!
//! A starter is the unit of one-time initialization: a name, a priority,
//! a started flag, and an action that may read and write the
//! [`SharedContext`]. Anything that needs to run during bootstrap
//! (logging setup, config loading, connection provisioning, a whole
//! component) implements [`Starter`] and is registered with the
//! [`StartController`](crate::StartController).
//!
//! # Architecture Note
//! The trait has one required capability: run an action against shared
//! mutable context. Name, priority, and the started flag are pure state.
//! The engine, not the implementation, enforces that the action runs at
//! most once; a starter does not need to defend against double starts.
//!
//! The trait is `#[async_trait]` so actions can await (dialing a backend,
//! reading a file through an async runtime), but the engine still drives
//! starters strictly one at a time.

use async_trait::async_trait;

use crate::context::SharedContext;
use crate::error::BoxError;

/// Conventional priority tiers, highest runs first.
///
/// Tiers are grouping conventions, not hard partitions; any `i32` is a
/// legal priority. Logging conventionally boots at `HIGH + 100`, config
/// at a component's own priority, db/cache provisioning at `MIDDLE`.
pub mod priority {
    pub const HIGHEST: i32 = 1000;
    pub const HIGH: i32 = 900;
    pub const MIDDLE: i32 = 600;
    pub const LOW: i32 = 300;
    pub const LOWEST: i32 = 0;
}

/// A named, prioritized unit of one-time initialization logic.
#[async_trait]
pub trait Starter: Send {
    /// Unique name, used as the registration key and listener key.
    fn name(&self) -> &str;

    /// Scheduling priority; higher runs first.
    fn priority(&self) -> i32;

    /// Whether this starter already ran successfully.
    fn started(&self) -> bool;

    /// Records a successful run. Called by the engine exactly once.
    fn mark_started(&mut self);

    /// Performs the initialization work.
    ///
    /// Returning an error aborts the entire bootstrap; no further
    /// starters or listeners run. Optionality, if wanted, belongs inside
    /// the action (swallow the sub-error and return `Ok`).
    async fn start(&mut self, ctx: &mut SharedContext) -> Result<(), BoxError>;
}

/// Boxed future returned by [`FnStarter`] actions.
pub type BoxFuture<'a, T> = std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

type StartAction =
    Box<dyn for<'a> FnMut(&'a mut SharedContext) -> BoxFuture<'a, Result<(), BoxError>> + Send>;

/// A closure-backed [`Starter`], for initialization logic that does not
/// warrant its own type.
///
/// ```
/// use starter_framework::{priority, FnStarter};
///
/// let starter = FnStarter::new("banner", priority::LOW).sync_action(|ctx| {
///     ctx.set("banner.text", String::from("ready"));
///     Ok(())
/// });
/// assert_eq!(starter.name(), "banner");
/// # use starter_framework::Starter;
/// ```
pub struct FnStarter {
    name: String,
    priority: i32,
    started: bool,
    action: Option<StartAction>,
}

impl FnStarter {
    pub fn new(name: impl Into<String>, priority: i32) -> Self {
        Self {
            name: name.into(),
            priority,
            started: false,
            action: None,
        }
    }

    /// Sets an async action. The closure returns a boxed future borrowing
    /// the context, typically `Box::pin(async move { .. })`.
    pub fn action<F>(mut self, action: F) -> Self
    where
        F: for<'a> FnMut(&'a mut SharedContext) -> BoxFuture<'a, Result<(), BoxError>>
            + Send
            + 'static,
    {
        self.action = Some(Box::new(action));
        self
    }

    /// Sets a synchronous action.
    pub fn sync_action<F>(self, mut action: F) -> Self
    where
        F: FnMut(&mut SharedContext) -> Result<(), BoxError> + Send + 'static,
    {
        self.action(move |ctx| {
            let result = action(ctx);
            Box::pin(async move { result })
        })
    }

    pub fn set_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

#[async_trait]
impl Starter for FnStarter {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn started(&self) -> bool {
        self.started
    }

    fn mark_started(&mut self) {
        self.started = true;
    }

    // A starter without an action is legal and succeeds immediately.
    async fn start(&mut self, ctx: &mut SharedContext) -> Result<(), BoxError> {
        match self.action.as_mut() {
            Some(action) => action(ctx).await,
            None => Ok(()),
        }
    }
}
