//! Node providers: the source of truth the balancer refreshes its
//! membership from.

mod rrdns;
mod static_provider;

pub use rrdns::RoundRobinDnsProvider;
pub use static_provider::StaticProvider;

use crate::node::SharedNode;

/// A source of nodes the balancer can refresh from.
///
/// Implementations should treat [`NodeProvider::nodes`] as a cheap
/// snapshot read and keep [`NodeProvider::refresh`] as the only place
/// that does real work (a DNS lookup, a service-discovery call, ...).
/// `refresh` is always driven through the balancer's single-flight guard,
/// so implementations don't need their own deduplication.
pub trait NodeProvider: Send + Sync + 'static {
    /// The most recently fetched set of nodes. Called after every
    /// successful [`NodeProvider::refresh`].
    fn nodes(&self) -> Vec<SharedNode>;

    /// Re-fetches the node set from the source of truth and makes it
    /// visible to subsequent [`NodeProvider::nodes`] calls.
    async fn refresh(&self);

    /// Invoked by the balancer, on a best-effort basis, when a node is
    /// exiled for exceeding its failure ratio. The default
    /// implementation does nothing; providers that want to react (e.g.
    /// to remove a node from an external registry) can override it.
    fn on_node_evicted(&self, _node: &SharedNode) {}
}
