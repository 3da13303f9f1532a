//! # Config Provisioning
//!
//! Configuration acquisition is an external collaborator: the engine only
//! needs "give me the config document for component X", expressed by the
//! narrow [`ConfigSource`] trait. Two sources ship with the crate: a
//! JSON-file-per-component directory ([`JsonDirSource`]) and an in-memory
//! map ([`StaticSource`]) for tests and embedded defaults.
//!
//! The [`Configurator`] is the config provisioning step a component runs
//! first when it starts:
//!
//! 1. load the component's own config through the source;
//! 2. if absent and the component is mounted under a master, fall back to
//!    the master's already-published `"<master>.config"` context entry;
//! 3. if absent and the component is a master (or unmounted), fail the
//!    bootstrap;
//! 4. publish the result under `"<name>.config"` and apply any typed
//!    subscriptions.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::context::SharedContext;
use crate::error::{BootError, BoxError};

/// A configuration document: a JSON value with dotted-path access and
/// typed section extraction.
#[derive(Debug, Clone)]
pub struct Config {
    root: Value,
}

impl Config {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// Looks up a dotted path, e.g. `"shop.redis"` reads
    /// `root["shop"]["redis"]`.
    pub fn section(&self, key: &str) -> Option<&Value> {
        key.split('.')
            .try_fold(&self.root, |value, part| value.get(part))
    }

    /// Deserializes the section at `key` into `T`. Absent keys read as
    /// `Ok(None)`; a present but malformed section is an error.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, BoxError> {
        match self.section(key) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.section(key).and_then(Value::as_str)
    }

    pub fn root(&self) -> &Value {
        &self.root
    }
}

/// Construct-on-demand configuration lookup for a named component.
pub trait ConfigSource: Send + Sync {
    /// Returns the component's config document, `Ok(None)` when the
    /// source has nothing for that name. An `Err` means the source found
    /// something but could not produce a document (e.g. a parse failure)
    /// and aborts the bootstrap rather than silently falling back.
    fn load(&self, name: &str) -> Result<Option<Config>, BoxError>;
}

/// Reads `<root>/<name>.json` per component.
pub struct JsonDirSource {
    root: PathBuf,
}

impl JsonDirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ConfigSource for JsonDirSource {
    fn load(&self, name: &str) -> Result<Option<Config>, BoxError> {
        let path = self.root.join(format!("{name}.json"));
        if !path.exists() {
            return Ok(None);
        }
        debug!(config = %path.display(), "loading config file");
        let text = fs::read_to_string(&path)?;
        Ok(Some(Config::new(serde_json::from_str(&text)?)))
    }
}

/// In-memory config documents keyed by component name.
#[derive(Default)]
pub struct StaticSource {
    entries: std::collections::HashMap<String, Value>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, root: Value) -> Self {
        self.entries.insert(name.into(), root);
        self
    }
}

impl ConfigSource for StaticSource {
    fn load(&self, name: &str) -> Result<Option<Config>, BoxError> {
        Ok(self.entries.get(name).cloned().map(Config::new))
    }
}

type SubscriptionApply = Box<dyn FnMut(&Value) -> Result<(), BoxError> + Send>;

struct Subscription {
    key: String,
    apply: SubscriptionApply,
}

/// The config provisioning step of a component's start sequence.
///
/// Owned by an [`App`](crate::App); not usually constructed directly.
#[derive(Default)]
pub struct Configurator {
    file_name: Option<String>,
    source: Option<Arc<dyn ConfigSource>>,
    subscriptions: Vec<Subscription>,
}

impl Configurator {
    pub fn set_source(&mut self, source: Arc<dyn ConfigSource>) {
        self.source = Some(source);
    }

    /// Overrides the lookup name; defaults to the component name.
    pub fn set_file_name(&mut self, name: impl Into<String>) {
        self.file_name = Some(name.into());
    }

    /// Registers a typed subscription: once the config document resolves,
    /// the section at `key` is deserialized into `T` and handed to
    /// `apply`. Absent sections are skipped.
    pub fn subscribe<T, F>(&mut self, key: impl Into<String>, mut apply: F)
    where
        T: DeserializeOwned,
        F: FnMut(T) + Send + 'static,
    {
        self.subscriptions.push(Subscription {
            key: key.into(),
            apply: Box::new(move |value| {
                apply(serde_json::from_value(value.clone())?);
                Ok(())
            }),
        });
    }

    /// Resolves and publishes configuration for the component `name`.
    ///
    /// A master must carry its own configuration; only a mounted
    /// non-master may fall back to its master's published document.
    pub(crate) fn provision(
        &mut self,
        name: &str,
        master: Option<&str>,
        is_master: bool,
        ctx: &mut SharedContext,
    ) -> Result<(), BoxError> {
        let lookup = self.file_name.as_deref().unwrap_or(name);
        let local = match &self.source {
            Some(source) => source.load(lookup)?,
            None => None,
        };

        let config: Arc<Config> = match (local, master) {
            (Some(config), _) => Arc::new(config),
            (None, Some(master)) if !is_master => {
                debug!(component = name, master, "no local config, using master's");
                ctx.must_get::<Config>(&format!("{master}.config"))?
            }
            (None, _) => return Err(BootError::MissingConfig(name.to_string()).into()),
        };

        ctx.set_shared(format!("{name}.config"), config.clone());

        for sub in &mut self.subscriptions {
            match config.section(&sub.key) {
                Some(value) => (sub.apply)(value)?,
                None => debug!(component = name, key = %sub.key, "no config section for subscription"),
            }
        }
        Ok(())
    }
}
