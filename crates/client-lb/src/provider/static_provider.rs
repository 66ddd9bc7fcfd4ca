use super::NodeProvider;
use crate::node::SharedNode;
use arc_swap::ArcSwap;
use std::sync::Arc;

/// A fixed node set that never changes; `refresh` is a no-op.
///
/// Useful for tests and for deployments where the node list is known
/// ahead of time (e.g. read from static configuration).
pub struct StaticProvider {
    nodes: ArcSwap<Vec<SharedNode>>,
}

impl StaticProvider {
    pub fn new(nodes: Vec<SharedNode>) -> Self {
        Self {
            nodes: ArcSwap::from_pointee(nodes),
        }
    }
}

impl NodeProvider for StaticProvider {
    fn nodes(&self) -> Vec<SharedNode> {
        (**self.nodes.load()).clone()
    }

    async fn refresh(&self) {}
}
