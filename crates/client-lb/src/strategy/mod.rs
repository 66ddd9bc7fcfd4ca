//! Selection strategies: pick the next node from an atomically swappable
//! snapshot.

mod hashed;
mod round_robin;

pub use hashed::HashedStrategy;
pub use round_robin::RoundRobinStrategy;

use crate::node::SharedNode;
use client_lb_core::LbError;

/// Chooses the next node from a sequence installed via [`Strategy::set_nodes`].
///
/// `Input` is the type `next_for` accepts; strategies that don't need an
/// input (round-robin) are generic over it and ignore it, strategies that
/// do (hashed) fix it to their key type.
pub trait Strategy<Input: ?Sized = ()>: Send + Sync {
    /// Atomically installs a new sequence. Readers after this call observe
    /// the new sequence in full; they never see a partial update.
    fn set_nodes(&self, nodes: Vec<SharedNode>);

    /// Returns the next node, or `LbError::EmptySet` / `LbError::NeedsInput`.
    fn next(&self) -> Result<SharedNode, LbError>;

    /// Returns the node assigned to `input`, or `LbError::EmptySet` /
    /// `LbError::HashFailure`.
    fn next_for(&self, input: &Input) -> Result<SharedNode, LbError>;
}
