//! # Engine Errors
//!
//! This module defines the error types used throughout the bootstrap engine.
//! Centralizing them keeps error handling consistent across the controller,
//! the component hierarchy, and the provisioning starters.
//!
//! Errors fall into two classes, exposed via [`BootError::kind`]:
//!
//! - [`ErrorKind::Invariant`]: configuration and invariant violations
//!   (duplicate starter name, double start, re-running a consumed
//!   controller). These are programmer errors; there is nothing sensible
//!   to retry.
//! - [`ErrorKind::Runtime`]: ordinary start failures (unreadable config,
//!   unreachable backend). These abort the bootstrap but are legitimate
//!   outcomes a caller may want to report and exit on.

/// Boxed error type for starter actions, listeners, and connectors.
///
/// Starters are heterogeneous and live together in one queue, so their
/// failures are carried as boxed trait objects rather than per-starter
/// associated error types.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Coarse classification of a [`BootError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A configuration or invariant violation; a bug in the wiring code.
    Invariant,
    /// A starter or listener action failed at run time.
    Runtime,
}

/// Errors produced by the bootstrap engine itself.
#[derive(Debug, thiserror::Error)]
pub enum BootError {
    /// A starter with this name was already registered.
    #[error("duplicated starter: {0}")]
    DuplicateStarter(String),

    /// The drain loop reached a starter whose started flag was already set.
    #[error("starter {0} has been started")]
    AlreadyStarted(String),

    /// `start()` was called on a controller that already ran.
    #[error("bootstrap already consumed; build a new controller to run again")]
    Consumed,

    /// A required shared-context entry was absent or of the wrong type.
    #[error("missing context entry: {0}")]
    MissingContext(String),

    /// A master component had no resolvable configuration.
    #[error("no resolvable configuration for component {0}")]
    MissingConfig(String),

    /// A starter's action returned an error; the run was aborted.
    #[error("starter {name} failed: {source}")]
    Starter {
        name: String,
        #[source]
        source: BoxError,
    },

    /// A listener for a completed starter returned an error.
    #[error("listener for starter {name} failed: {source}")]
    Listener {
        name: String,
        #[source]
        source: BoxError,
    },
}

impl BootError {
    /// Whether this error is a wiring bug or an ordinary runtime failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BootError::DuplicateStarter(_)
            | BootError::AlreadyStarted(_)
            | BootError::Consumed => ErrorKind::Invariant,
            BootError::MissingContext(_)
            | BootError::MissingConfig(_)
            | BootError::Starter { .. }
            | BootError::Listener { .. } => ErrorKind::Runtime,
        }
    }
}
