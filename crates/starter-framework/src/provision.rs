//! # Database & Cache Provisioning
//!
//! Starters that turn configuration into shared connection objects.
//! Actual connection construction is an external collaborator behind the
//! narrow [`Connector`] trait; the engine's contract is:
//!
//! - at most one connection object per distinct logical name across the
//!   whole process: if `"db.<name>"` (or `"redis.<name>"`) is already in
//!   the shared context, the entry is reused rather than reconnecting;
//! - every previously-registered listener for that logical name is
//!   notified once the connection is available.
//!
//! Both starters conventionally run at [`priority::MIDDLE`], after their
//! component's config provisioning has published `"<ns>.config"`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::context::{SharedContext, SharedValue};
use crate::error::BoxError;
use crate::starter::{priority, Starter};

/// An opaque connection object, shared through the context.
pub type ConnHandle = SharedValue;

/// Builds a connection from the settings configured under a logical name.
///
/// Implementations wrap a real driver (an SQL pool, a cache client); the
/// engine never looks inside the handle. Callers recover the concrete
/// type with [`SharedContext::get`].
pub trait Connector: Send + Sync {
    fn connect(&self, logical: &str, settings: &Value) -> Result<ConnHandle, BoxError>;
}

/// Callback invoked when a logical connection becomes available.
pub type ConnListener = Box<dyn FnMut(&ConnHandle) + Send>;

/// Provisions every database configured under the `db` section of
/// `"<namespace>.config"`, publishing each as `"db.<logical>"`.
pub struct DbStarter {
    name: String,
    priority: i32,
    started: bool,
    namespace: String,
    connector: Arc<dyn Connector>,
    listeners: HashMap<String, Vec<ConnListener>>,
}

impl DbStarter {
    pub fn new(namespace: impl Into<String>, connector: Arc<dyn Connector>) -> Self {
        let namespace = namespace.into();
        Self {
            name: format!("{namespace}.db"),
            priority: priority::MIDDLE,
            started: false,
            namespace,
            connector,
            listeners: HashMap::new(),
        }
    }

    pub fn set_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Registers interest in the connection for `logical`. Must be called
    /// before this starter runs.
    pub fn listen<F>(&mut self, logical: impl Into<String>, listener: F)
    where
        F: FnMut(&ConnHandle) + Send + 'static,
    {
        self.listeners
            .entry(logical.into())
            .or_default()
            .push(Box::new(listener));
    }
}

#[async_trait]
impl Starter for DbStarter {
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
        let cfg = ctx.must_get::<Config>(&format!("{}.config", self.namespace))?;

        let Some(Value::Object(databases)) = cfg.section("db") else {
            warn!(starter = %self.name, "no db config found");
            return Ok(());
        };

        for (logical, settings) in databases {
            let key = format!("db.{logical}");
            let handle = match ctx.get_raw(&key) {
                Some(existing) => {
                    debug!(connection = %key, "reusing shared connection");
                    existing
                }
                None => {
                    let handle = self.connector.connect(logical, settings)?;
                    ctx.set_shared(key.clone(), handle.clone());
                    debug!(connection = %key, "connection published");
                    handle
                }
            };

            if let Some(listeners) = self.listeners.get_mut(logical.as_str()) {
                for listener in listeners {
                    listener(&handle);
                }
            }
        }
        Ok(())
    }
}

/// Provisions the cache pool selected by the `"<namespace>.redis"` config
/// key, publishing it as `"redis.<logical>"` and handing it to the
/// component's holder callback.
pub struct RedisStarter {
    name: String,
    priority: i32,
    started: bool,
    namespace: String,
    connector: Arc<dyn Connector>,
    on_ready: Option<ConnListener>,
}

impl RedisStarter {
    pub fn new(namespace: impl Into<String>, connector: Arc<dyn Connector>) -> Self {
        let namespace = namespace.into();
        Self {
            name: format!("{namespace}.redis"),
            priority: priority::MIDDLE,
            started: false,
            namespace,
            connector,
            on_ready: None,
        }
    }

    pub fn set_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Receives the pool once available, whether freshly built or reused.
    pub fn on_ready<F>(&mut self, listener: F)
    where
        F: FnMut(&ConnHandle) + Send + 'static,
    {
        self.on_ready = Some(Box::new(listener));
    }
}

#[async_trait]
impl Starter for RedisStarter {
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
        let cfg = ctx.must_get::<Config>(&format!("{}.config", self.namespace))?;

        // Components opt in by naming a logical pool under "<ns>.redis".
        let Some(logical) = cfg.get_str(&format!("{}.redis", self.namespace)) else {
            return Ok(());
        };
        let logical = logical.to_string();

        let key = format!("redis.{logical}");
        let handle = match ctx.get_raw(&key) {
            Some(existing) => {
                debug!(connection = %key, "reusing shared pool");
                existing
            }
            None => {
                let settings = cfg
                    .section(&format!("redis.{logical}"))
                    .cloned()
                    .ok_or_else(|| format!("no settings configured for pool {logical}"))?;
                let handle = self.connector.connect(&logical, &settings)?;
                ctx.set_shared(key.clone(), handle.clone());
                debug!(connection = %key, "pool published");
                handle
            }
        };

        if let Some(on_ready) = self.on_ready.as_mut() {
            on_ready(&handle);
        }
        Ok(())
    }
}
