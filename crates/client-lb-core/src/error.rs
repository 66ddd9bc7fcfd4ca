//! Error taxonomy shared by the balancer.

use std::error::Error as StdError;
use thiserror::Error;

/// Errors returned by `LoadBalancer::next`/`next_for`.
#[derive(Debug, Error)]
pub enum LbError {
    /// The strategy was asked to pick from an empty node set, and a
    /// refresh-and-retry did not recover a usable set.
    #[error("empty node set")]
    EmptySet,

    /// `next()` was called on a strategy that requires an input
    /// (the hashed strategy).
    #[error("strategy requires an input, use next_for instead")]
    NeedsInput,

    /// The caller-supplied hash function returned an error.
    #[error("hash function failed: {0}")]
    HashFailure(#[source] Box<dyn StdError + Send + Sync>),
}
