use super::Strategy;
use crate::node::SharedNode;
use arc_swap::ArcSwap;
use client_lb_core::LbError;
use std::error::Error as StdError;
use std::sync::Arc;

/// Selects a node by hashing the caller-supplied input.
///
/// `next()` always fails with [`LbError::NeedsInput`]; only `next_for`
/// is meaningful for this strategy. The hash function must be
/// deterministic and pure: the same input always indexes the same node for
/// a given sequence.
pub struct HashedStrategy<K, F>
where
    F: Fn(&K) -> Result<u64, Box<dyn StdError + Send + Sync>> + Send + Sync,
{
    hash_fn: F,
    nodes: ArcSwap<Vec<SharedNode>>,
    _key: std::marker::PhantomData<fn(&K)>,
}

impl<K, F> HashedStrategy<K, F>
where
    F: Fn(&K) -> Result<u64, Box<dyn StdError + Send + Sync>> + Send + Sync,
{
    /// Creates a strategy with an empty sequence and the given hash
    /// function.
    pub fn new(hash_fn: F) -> Self {
        Self {
            hash_fn,
            nodes: ArcSwap::from_pointee(Vec::new()),
            _key: std::marker::PhantomData,
        }
    }
}

impl<K, F> Strategy<K> for HashedStrategy<K, F>
where
    F: Fn(&K) -> Result<u64, Box<dyn StdError + Send + Sync>> + Send + Sync,
{
    fn set_nodes(&self, nodes: Vec<SharedNode>) {
        self.nodes.store(Arc::new(nodes));
    }

    fn next(&self) -> Result<SharedNode, LbError> {
        Err(LbError::NeedsInput)
    }

    fn next_for(&self, input: &K) -> Result<SharedNode, LbError> {
        let nodes = self.nodes.load();
        if nodes.is_empty() {
            return Err(LbError::EmptySet);
        }
        let hash = (self.hash_fn)(input).map_err(LbError::HashFailure)?;
        let idx = (hash % nodes.len() as u64) as usize;
        Ok(nodes[idx].clone())
    }
}
