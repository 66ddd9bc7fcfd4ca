//! Shared infrastructure for `client-lb`.
//!
//! This crate provides the pieces used by the balancer crate that don't
//! belong to any one module: the event system for observability and the
//! error taxonomy returned by `Next`/`NextFor`.

pub mod error;
pub mod events;

pub use error::LbError;
pub use events::{EventListener, EventListeners, FnListener, LoadBalancerEvent};
