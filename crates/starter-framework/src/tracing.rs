//! Tracing setup for bootstrap and beyond.

use async_trait::async_trait;

use crate::context::SharedContext;
use crate::error::BoxError;
use crate::starter::{priority, Starter};

/// Initializes structured logging for the process.
///
/// Uses `tracing-subscriber` with environment-based filtering: set
/// `RUST_LOG` to control verbosity (`RUST_LOG=starter_framework=debug`
/// shows the engine's register/start events).
///
/// Call once, before building the controller; or register a
/// [`LogStarter`] to perform it as the first act of the bootstrap.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

/// A starter that initializes logging at `HIGH + 100`, ahead of every
/// conventionally-prioritized component, so the rest of the bootstrap is
/// observable.
pub struct LogStarter {
    started: bool,
}

impl LogStarter {
    pub fn new() -> Self {
        Self { started: false }
    }
}

impl Default for LogStarter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Starter for LogStarter {
    fn name(&self) -> &str {
        "log"
    }

    fn priority(&self) -> i32 {
        priority::HIGH + 100
    }

    fn started(&self) -> bool {
        self.started
    }

    fn mark_started(&mut self) {
        self.started = true;
    }

    async fn start(&mut self, _ctx: &mut SharedContext) -> Result<(), BoxError> {
        // A subscriber may already be installed (tests, embedding hosts);
        // that is not a bootstrap failure.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
        Ok(())
    }
}
