//! In-memory stand-ins for real database and cache drivers.
//!
//! Real deployments would wrap an SQL pool or a redis client here; the
//! engine only cares that a [`Connector`] turns configured settings into
//! a shareable handle.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use starter_framework::{BoxError, ConnHandle, Connector};
use tracing::info;

#[derive(Debug, Deserialize)]
struct PoolSettings {
    uri: String,
    #[serde(default)]
    max_open: Option<u32>,
}

/// A pretend database pool.
#[derive(Debug)]
pub struct MemoryDb {
    pub logical: String,
    pub uri: String,
    pub max_open: u32,
}

impl MemoryDb {
    pub fn ping(&self) -> bool {
        true
    }
}

/// Builds [`MemoryDb`] handles and counts how many it constructed, which
/// makes connection reuse observable in tests.
#[derive(Default)]
pub struct MemoryDbConnector {
    built: AtomicUsize,
}

impl MemoryDbConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn built(&self) -> usize {
        self.built.load(Ordering::SeqCst)
    }
}

impl Connector for MemoryDbConnector {
    fn connect(&self, logical: &str, settings: &Value) -> Result<ConnHandle, BoxError> {
        let settings: PoolSettings = serde_json::from_value(settings.clone())?;
        self.built.fetch_add(1, Ordering::SeqCst);
        info!(logical, uri = %settings.uri, "opening database");
        Ok(Arc::new(MemoryDb {
            logical: logical.to_string(),
            uri: settings.uri,
            max_open: settings.max_open.unwrap_or(4),
        }))
    }
}

/// A pretend cache pool.
#[derive(Debug)]
pub struct MemoryCache {
    pub uri: String,
}

#[derive(Default)]
pub struct MemoryCacheConnector {
    built: AtomicUsize,
}

impl MemoryCacheConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn built(&self) -> usize {
        self.built.load(Ordering::SeqCst)
    }
}

impl Connector for MemoryCacheConnector {
    fn connect(&self, logical: &str, settings: &Value) -> Result<ConnHandle, BoxError> {
        let settings: PoolSettings = serde_json::from_value(settings.clone())?;
        self.built.fetch_add(1, Ordering::SeqCst);
        info!(logical, uri = %settings.uri, "opening cache pool");
        Ok(Arc::new(MemoryCache { uri: settings.uri }))
    }
}
