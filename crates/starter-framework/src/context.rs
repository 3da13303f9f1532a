//! # Shared Context
//!
//! The shared context is the handoff surface between starters: a
//! process-scoped map from string keys to opaque values, created fresh at
//! the beginning of one bootstrap run and handed to the caller when the
//! run completes.
//!
//! # Architecture Note
//! Values are stored type-erased (`Arc<dyn Any + Send + Sync>`) because
//! independently-registered components publish unrelated types (config
//! documents, connection handles) into one map. Typed access is recovered
//! at the read site via [`SharedContext::get`], which downcasts.
//!
//! Keys are namespaced by convention, not enforcement:
//!
//! - `"<component>.config"` for configuration documents
//! - `"db.<logical>"` for database handles
//! - `"redis.<logical>"` for cache pools
//!
//! No key is guaranteed to be present; a starter that reads a key must be
//! scheduled (by priority) after the starter that publishes it.
//!
//! The context has no internal locking: it is mutated only from the
//! single-threaded drain loop, and is effectively read-only published
//! state once the run returns.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::BootError;

/// An opaque shared value, as stored in the context.
pub type SharedValue = Arc<dyn Any + Send + Sync>;

/// String-keyed store of opaque values, live for one bootstrap run.
#[derive(Default)]
pub struct SharedContext {
    values: HashMap<String, SharedValue>,
}

impl SharedContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a value under `key`, replacing any previous entry.
    pub fn set<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), Arc::new(value));
    }

    /// Publishes an already-shared value under `key`.
    ///
    /// Used when the same object must appear under two keys, e.g. a
    /// mounted component republishing its master's config document.
    pub fn set_shared(&mut self, key: impl Into<String>, value: SharedValue) {
        self.values.insert(key.into(), value);
    }

    /// Typed lookup. Returns `None` when the key is absent or the stored
    /// value is not a `T`.
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.values.get(key).cloned().and_then(|v| v.downcast::<T>().ok())
    }

    /// Untyped lookup of the raw shared value.
    pub fn get_raw(&self, key: &str) -> Option<SharedValue> {
        self.values.get(key).cloned()
    }

    /// Typed lookup that treats absence (or a type mismatch) as an error.
    pub fn must_get<T: Any + Send + Sync>(&self, key: &str) -> Result<Arc<T>, BootError> {
        self.get::<T>(key)
            .ok_or_else(|| BootError::MissingContext(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl std::fmt::Debug for SharedContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<&str> = self.values.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("SharedContext").field("keys", &keys).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn typed_roundtrip_and_mismatch() {
        let mut ctx = SharedContext::new();
        ctx.set("answer", 42u32);

        assert_eq!(*ctx.must_get::<u32>("answer").unwrap(), 42);
        // Wrong type reads as absent.
        assert!(ctx.get::<String>("answer").is_none());
        assert!(ctx.contains("answer"));
    }

    #[test]
    fn must_get_reports_missing_entry() {
        let ctx = SharedContext::new();
        let err = ctx.must_get::<u32>("db.main").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Runtime);
        assert!(matches!(err, BootError::MissingContext(k) if k == "db.main"));
    }

    #[test]
    fn set_shared_aliases_one_value() {
        let mut ctx = SharedContext::new();
        ctx.set("shop.config", String::from("cfg"));
        let shared = ctx.get_raw("shop.config").unwrap();
        ctx.set_shared("inventory.config", shared);

        let a = ctx.get::<String>("shop.config").unwrap();
        let b = ctx.get::<String>("inventory.config").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
