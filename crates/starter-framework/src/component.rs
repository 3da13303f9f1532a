//! # Component Hierarchy
//!
//! An [`App`] is a named top-level unit that owns its own setup sequence:
//! config provisioning, db/cache provisioning registration, and zero or
//! more mounted subordinate components. The app itself is registered as a
//! starter; its start action performs that sequence.
//!
//! # Mount / Master
//! `mount` absorbs another app as a subordinate: the absorbing app
//! becomes a master, the subordinate's priority is forced strictly below
//! the master's, and the subordinate keeps a back-reference to the master
//! by name (a lookup relation used for config fallback, not ownership).
//!
//! Mounting only wires the hierarchy; the subordinates are registered
//! with the controller when the master itself starts. This two-phase
//! design guarantees the master's provisioning starters are in the queue
//! before any subordinate runs, so subordinates can rely on the master's
//! shared resources being registered (though ordering among them is still
//! priority-driven).

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::{ConfigSource, Configurator};
use crate::context::SharedContext;
use crate::controller::StartController;
use crate::error::BoxError;
use crate::provision::{ConnHandle, Connector, DbStarter, RedisStarter};
use crate::starter::{priority, Starter};

type DbInterest = (String, Box<dyn FnMut(&ConnHandle) + Send>);

/// A named application component, itself a [`Starter`].
pub struct App {
    name: String,
    priority: i32,
    started: bool,
    master: Option<String>,
    is_master: bool,
    mounts: Vec<App>,
    controller: StartController,
    configurator: Configurator,
    db: Option<Arc<dyn Connector>>,
    db_interests: Vec<DbInterest>,
    cache: Option<Arc<dyn Connector>>,
    cache_ready: Option<Box<dyn FnMut(&ConnHandle) + Send>>,
}

impl App {
    /// Creates a component wired to `controller`, at [`priority::HIGH`].
    ///
    /// The app holds a controller handle so it can register its
    /// provisioning starters and mounts from inside its own start action.
    pub fn new(name: impl Into<String>, controller: &StartController) -> Self {
        Self {
            name: name.into(),
            priority: priority::HIGH,
            started: false,
            master: None,
            is_master: false,
            mounts: Vec::new(),
            controller: controller.clone(),
            configurator: Configurator::default(),
            db: None,
            db_interests: Vec::new(),
            cache: None,
            cache_ready: None,
        }
    }

    pub fn set_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_config_source(mut self, source: Arc<dyn ConfigSource>) -> Self {
        self.configurator.set_source(source);
        self
    }

    /// Overrides the config lookup name; defaults to the app name.
    pub fn with_config_file(mut self, name: impl Into<String>) -> Self {
        self.configurator.set_file_name(name);
        self
    }

    /// Typed config subscription, applied when this app's config
    /// document resolves. See [`Configurator::subscribe`].
    pub fn subscribe<T, F>(&mut self, key: impl Into<String>, apply: F)
    where
        T: DeserializeOwned,
        F: FnMut(T) + Send + 'static,
    {
        self.configurator.subscribe(key, apply);
    }

    /// Enables database provisioning through `connector`.
    pub fn with_db(mut self, connector: Arc<dyn Connector>) -> Self {
        self.db = Some(connector);
        self
    }

    /// Registers interest in the database published under
    /// `"db.<logical>"`; forwarded to this app's [`DbStarter`].
    pub fn on_db_ready<F>(&mut self, logical: impl Into<String>, listener: F)
    where
        F: FnMut(&ConnHandle) + Send + 'static,
    {
        self.db_interests.push((logical.into(), Box::new(listener)));
    }

    /// Enables cache provisioning through `connector`.
    pub fn with_cache(mut self, connector: Arc<dyn Connector>) -> Self {
        self.cache = Some(connector);
        self
    }

    /// Receives the cache pool selected by the `"<name>.redis"` config
    /// key once it is available.
    pub fn on_cache_ready<F>(&mut self, listener: F)
    where
        F: FnMut(&ConnHandle) + Send + 'static,
    {
        self.cache_ready = Some(Box::new(listener));
    }

    /// Absorbs `sub` as a subordinate of this app.
    ///
    /// Marks this app a master and forces the subordinate's priority
    /// strictly below this app's: a subordinate at or above the master's
    /// priority is lowered to `master - 1`; one already below keeps its
    /// priority.
    pub fn mount(&mut self, mut sub: App) -> &mut Self {
        self.is_master = true;
        if sub.priority >= self.priority {
            sub.priority = self.priority - 1;
        }
        sub.master = Some(self.name.clone());
        debug!(master = %self.name, sub = %sub.name, priority = sub.priority, "component mounted");
        self.mounts.push(sub);
        self
    }

    pub fn is_master(&self) -> bool {
        self.is_master
    }

    /// Name of the master this app is mounted under, if any.
    pub fn master(&self) -> Option<&str> {
        self.master.as_deref()
    }
}

#[async_trait]
impl Starter for App {
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

    async fn start(&mut self, ctx: &mut SharedContext) -> Result<(), BoxError> {
        self.configurator
            .provision(&self.name, self.master.as_deref(), self.is_master, ctx)?;

        if let Some(connector) = self.db.take() {
            let mut starter = DbStarter::new(self.name.clone(), connector);
            for (logical, listener) in self.db_interests.drain(..) {
                starter.listen(logical, listener);
            }
            self.controller.register(starter)?;
            debug!(component = %self.name, "db starter registered");
        }

        if let Some(connector) = self.cache.take() {
            let mut starter = RedisStarter::new(self.name.clone(), connector);
            if let Some(listener) = self.cache_ready.take() {
                starter.on_ready(listener);
            }
            self.controller.register(starter)?;
            debug!(component = %self.name, "redis starter registered");
        }

        // Deferred subordinate registration: mounts enter the queue only
        // once the master's own setup has been registered.
        if self.is_master {
            for sub in std::mem::take(&mut self.mounts) {
                self.controller.register(sub)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mounting_lowers_equal_or_higher_priority() {
        let controller = StartController::new();
        let mut master = App::new("shop", &controller).set_priority(priority::HIGH);

        let equal = App::new("inventory", &controller).set_priority(priority::HIGH);
        let higher = App::new("billing", &controller).set_priority(priority::HIGHEST);
        master.mount(equal);
        master.mount(higher);

        assert!(master.is_master());
        for sub in &master.mounts {
            assert_eq!(sub.priority(), priority::HIGH - 1);
            assert_eq!(sub.master(), Some("shop"));
        }
    }

    #[test]
    fn mounting_keeps_already_lower_priority() {
        let controller = StartController::new();
        let mut master = App::new("shop", &controller);
        let low = App::new("reports", &controller).set_priority(priority::LOW);
        master.mount(low);

        assert_eq!(master.mounts[0].priority(), priority::LOW);
    }
}
