//! The sample system: a "shop" master component that mounts an
//! "inventory" subordinate.
//!
//! Shop carries the configuration for the whole deployment; inventory has
//! no config of its own and inherits the master's document. Both enable
//! database provisioning against one shared logical database, so the
//! second provisioning starter exercises the reuse path instead of
//! opening a second connection.

use std::sync::{Arc, Mutex};

use serde::Deserialize;
use serde_json::json;
use starter_framework::{
    priority, App, BootError, FnStarter, StartController, StaticSource,
};
use tracing::info;

use crate::connectors::{MemoryCache, MemoryCacheConnector, MemoryDb, MemoryDbConnector};

/// The `shop` section of the config document.
#[derive(Debug, Clone, Deserialize)]
pub struct ShopSettings {
    pub title: String,
    #[serde(default)]
    pub redis: Option<String>,
}

/// Everything the bootstrap wiring hands back to the caller.
pub struct ShopSystem {
    pub controller: StartController,
    pub db_connector: Arc<MemoryDbConnector>,
    pub cache_connector: Arc<MemoryCacheConnector>,
    /// Filled by the shop's typed config subscription.
    pub settings: Arc<Mutex<Option<ShopSettings>>>,
}

/// The deployment's config document, local to the master only.
fn shop_config() -> Arc<StaticSource> {
    Arc::new(StaticSource::new().with(
        "shop",
        json!({
            "shop": { "title": "Corner Shop", "redis": "cache" },
            "db": { "main": { "uri": "memory://shop-main", "max_open": 8 } },
            "redis": { "cache": { "uri": "memory://shop-cache" } }
        }),
    ))
}

/// Wires the whole system onto `controller`. Nothing runs until the
/// caller invokes `controller.start()`.
pub fn wire(controller: &StartController) -> Result<ShopSystem, BootError> {
    let source = shop_config();
    let db_connector = MemoryDbConnector::new();
    let cache_connector = MemoryCacheConnector::new();
    let settings = Arc::new(Mutex::new(None));

    let mut shop = App::new("shop", controller)
        .with_config_source(source.clone())
        .with_db(db_connector.clone())
        .with_cache(cache_connector.clone());

    let sink = Arc::clone(&settings);
    shop.subscribe::<ShopSettings, _>("shop", move |parsed| {
        *sink.lock().unwrap() = Some(parsed);
    });
    shop.on_cache_ready(|handle| {
        let cache = handle.clone().downcast::<MemoryCache>();
        if let Ok(cache) = cache {
            info!(uri = %cache.uri, "shop cache ready");
        }
    });

    let mut inventory = App::new("inventory", controller)
        .with_config_source(source)
        .with_db(db_connector.clone());
    inventory.on_db_ready("main", |handle| {
        if let Ok(db) = handle.clone().downcast::<MemoryDb>() {
            info!(logical = %db.logical, "inventory sees the shared database");
        }
    });

    shop.mount(inventory);
    controller.register(shop)?;

    // A late banner proves the provisioning above already ran.
    controller.register(FnStarter::new("banner", priority::LOW).sync_action(
        |ctx| {
            let db = ctx.must_get::<MemoryDb>("db.main")?;
            info!(db = %db.uri, alive = db.ping(), "shop is open");
            Ok(())
        },
    ))?;

    Ok(ShopSystem {
        controller: controller.clone(),
        db_connector,
        cache_connector,
        settings,
    })
}
