//! # Starter Framework
//!
//! A process-wide bootstrap scheduler: independently-registered
//! components declare prioritized initialization units ("starters"), and
//! a single [`StartController`] runs them one at a time in descending
//! priority order, handing state between them through a [`SharedContext`]
//! and notifying listeners as each named starter completes.
//!
//! ## Core Abstractions
//!
//! 1. **[`Starter`]** - the unit of one-time initialization: a name, a
//!    priority, and an async action over the shared context.
//! 2. **[`StartController`]** - the scheduler: a stable
//!    descending-priority queue, drained sequentially by
//!    [`start`](StartController::start).
//! 3. **[`SharedContext`]** - the handoff surface: string keys to opaque
//!    values (`"<name>.config"`, `"db.<logical>"`, `"redis.<logical>"`).
//! 4. **[`App`]** - a component that owns its setup sequence (config,
//!    db/cache provisioning) and may mount subordinate components below
//!    its own priority.
//!
//! ## Scheduling Rules
//!
//! - Higher priority runs first; equal priorities run in registration
//!   order (stable insertion).
//! - Registration is allowed mid-run: a starter's action may register
//!   further starters, which join the queue by the same rule and are
//!   picked up by later drain iterations.
//! - Duplicate names and double starts are fatal configuration errors
//!   ([`ErrorKind::Invariant`]); a failing action aborts the whole run
//!   ([`ErrorKind::Runtime`]). Nothing is retried or rolled back.
//! - One run per controller: a second [`start`](StartController::start)
//!   fails with [`BootError::Consumed`].
//!
//! ## Example
//!
//! ```
//! use starter_framework::{priority, FnStarter, StartController};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let controller = StartController::new();
//!
//! controller
//!     .register(FnStarter::new("config", priority::HIGH).sync_action(|ctx| {
//!         ctx.set("greeting.config", String::from("hello"));
//!         Ok(())
//!     }))
//!     .unwrap();
//!
//! controller
//!     .register(FnStarter::new("banner", priority::LOW).sync_action(|ctx| {
//!         let greeting = ctx.must_get::<String>("greeting.config")?;
//!         println!("{greeting}");
//!         Ok(())
//!     }))
//!     .unwrap();
//!
//! controller.on_started("config", |_ctx| {
//!     println!("config is up");
//!     Ok(())
//! });
//!
//! let ctx = controller.start().await.unwrap();
//! assert!(ctx.contains("greeting.config"));
//! # }
//! ```
//!
//! ## Concurrency Model
//!
//! Registration may happen from several threads and from inside running
//! starters; it is guarded by one lock. Execution is deliberately
//! sequential: no two starters ever run concurrently, so start order is
//! deterministic and debuggable. A starter that blocks, blocks the
//! bootstrap; there is no cancellation or timeout at the engine level.

pub mod component;
pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod provision;
pub mod starter;
pub mod tracing;

// Re-export core types for convenience
pub use component::App;
pub use config::{Config, ConfigSource, Configurator, JsonDirSource, StaticSource};
pub use context::{SharedContext, SharedValue};
pub use controller::{StartController, StartListener};
pub use error::{BootError, BoxError, ErrorKind};
pub use provision::{ConnHandle, ConnListener, Connector, DbStarter, RedisStarter};
pub use starter::{priority, BoxFuture, FnStarter, Starter};
pub use crate::tracing::{setup_tracing, LogStarter};
