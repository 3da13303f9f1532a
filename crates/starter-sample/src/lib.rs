//! # Starter Sample
//!
//! A complete bootstrap built on `starter-framework`:
//!
//! - **[connectors]**: in-memory database and cache connectors standing
//!   in for real drivers.
//! - **[shop]**: the wiring of a master component ("shop") with a
//!   mounted subordinate ("inventory"), shared connections, typed config
//!   subscriptions, and a trailing low-priority starter.
//!
//! Run the binary with `RUST_LOG=debug` to watch the scheduler order the
//! queue and fire listeners.

pub mod connectors;
pub mod shop;
