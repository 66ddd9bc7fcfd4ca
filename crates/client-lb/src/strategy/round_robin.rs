use super::Strategy;
use crate::node::SharedNode;
use arc_swap::ArcSwap;
use client_lb_core::LbError;
use std::sync::atomic::{AtomicU64, Ordering};

/// Round-robin selection over the currently installed sequence.
///
/// The counter is initialized to `u64::MAX` so that the first call to
/// [`Strategy::next`] wraps on its `fetch_add` and returns index `0`,
/// rather than starting at zero and post-incrementing.
pub struct RoundRobinStrategy {
    index: AtomicU64,
    nodes: ArcSwap<Vec<SharedNode>>,
}

impl RoundRobinStrategy {
    /// Creates a strategy with an empty sequence; call [`Strategy::set_nodes`]
    /// to populate it.
    pub fn new() -> Self {
        Self {
            index: AtomicU64::new(u64::MAX),
            nodes: ArcSwap::from_pointee(Vec::new()),
        }
    }
}

impl Default for RoundRobinStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl<Input: ?Sized> Strategy<Input> for RoundRobinStrategy {
    fn set_nodes(&self, nodes: Vec<SharedNode>) {
        self.nodes.store(std::sync::Arc::new(nodes));
    }

    fn next(&self) -> Result<SharedNode, LbError> {
        let nodes = self.nodes.load();
        if nodes.is_empty() {
            return Err(LbError::EmptySet);
        }
        let i = self.index.fetch_add(1, Ordering::Relaxed);
        let idx = (i.wrapping_add(1) as usize) % nodes.len();
        Ok(nodes[idx].clone())
    }

    fn next_for(&self, _input: &Input) -> Result<SharedNode, LbError> {
        <Self as Strategy<Input>>::next(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::StringNode;
    use std::sync::Arc;

    fn nodes(keys: &[&str]) -> Vec<SharedNode> {
        keys.iter()
            .map(|k| Arc::new(StringNode::new(*k)) as SharedNode)
            .collect()
    }

    #[test]
    fn empty_sequence_yields_empty_set() {
        let s = RoundRobinStrategy::new();
        assert!(matches!(
            <RoundRobinStrategy as Strategy>::next(&s),
            Err(LbError::EmptySet)
        ));
    }

    #[test]
    fn cycles_through_all_nodes_first_call_is_index_zero() {
        let s = RoundRobinStrategy::new();
        <RoundRobinStrategy as Strategy>::set_nodes(&s, nodes(&["A", "B", "C", "D"]));

        let seq: Vec<String> = (0..10)
            .map(|_| <RoundRobinStrategy as Strategy>::next(&s).unwrap().key())
            .collect();
        assert_eq!(
            seq,
            vec!["A", "B", "C", "D", "A", "B", "C", "D", "A", "B"]
        );
    }

    #[test]
    fn ten_consecutive_calls_over_four_nodes_visit_each_exactly_twice_or_thrice() {
        let s = RoundRobinStrategy::new();
        <RoundRobinStrategy as Strategy>::set_nodes(&s, nodes(&["A", "B", "C", "D"]));

        let mut counts = std::collections::HashMap::new();
        for _ in 0..8 {
            let key = <RoundRobinStrategy as Strategy>::next(&s).unwrap().key();
            *counts.entry(key).or_insert(0) += 1;
        }
        assert_eq!(counts.len(), 4);
        assert!(counts.values().all(|&c| c == 2));
    }

    #[test]
    fn next_for_delegates_to_next() {
        let s = RoundRobinStrategy::new();
        Strategy::<()>::set_nodes(&s, nodes(&["A", "B"]));
        let first = Strategy::<()>::next_for(&s, &());
        assert!(first.is_ok());
    }
}
