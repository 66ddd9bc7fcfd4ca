//! Membership: the current live set of nodes.

use crate::node::SharedNode;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};

/// The current live set of nodes, plus the original-vs-current size
/// bookkeeping the balancer uses to decide when a healthy floor has been
/// breached.
///
/// `Group` is a concurrent map keyed by [`Node::key`](crate::node::Node::key):
/// `set` replaces the whole membership, `exile` removes a single entry, and
/// `get` takes a snapshot of up to `max_node_count` entries. All operations
/// are lock-free from the caller's perspective (backed by `DashMap`'s
/// sharded locking) and tolerate arbitrary interleaving.
pub struct Group {
    nodes: DashMap<String, SharedNode>,
    original_count: AtomicI64,
    current_count: AtomicI64,
    max_node_count: usize,
}

impl Group {
    /// Creates an empty group that exposes at most `max_node_count` nodes
    /// per [`Group::get`] call.
    pub fn new(max_node_count: usize) -> Self {
        Self {
            nodes: DashMap::new(),
            original_count: AtomicI64::new(0),
            current_count: AtomicI64::new(0),
            max_node_count,
        }
    }

    /// Atomically replaces the membership: after this returns, the key set
    /// equals `nodes`'s key set and `original_count == current_count ==
    /// nodes.len()`.
    pub fn set(&self, nodes: Vec<SharedNode>) {
        let mut seen = hashbrown::HashSet::with_capacity(nodes.len());
        for node in &nodes {
            let key = node.key();
            seen.insert(key.clone());
            self.nodes.insert(key, node.clone());
        }
        self.nodes.retain(|key, _| seen.contains(key));

        self.original_count
            .store(nodes.len() as i64, Ordering::SeqCst);
        self.current_count
            .store(nodes.len() as i64, Ordering::SeqCst);
    }

    /// Snapshot of up to `max_node_count` nodes. Iteration order is
    /// unspecified but every returned node was present in the map at the
    /// moment it was emitted.
    pub fn get(&self) -> Vec<SharedNode> {
        let mut result = Vec::with_capacity(self.max_node_count.min(self.nodes.len()));
        for entry in self.nodes.iter() {
            if result.len() >= self.max_node_count {
                break;
            }
            result.push(entry.value().clone());
        }
        result
    }

    /// Removes a node by key. Returns whether a node was actually removed;
    /// `current_count` is decremented iff it was.
    pub fn exile(&self, key: &str) -> bool {
        let removed = self.nodes.remove(key).is_some();
        if removed {
            self.current_count.fetch_sub(1, Ordering::SeqCst);
        }
        removed
    }

    /// Size of the membership at the last [`Group::set`].
    pub fn original_count(&self) -> i64 {
        self.original_count.load(Ordering::SeqCst)
    }

    /// Size of the membership after any exiles since the last
    /// [`Group::set`].
    pub fn current_count(&self) -> i64 {
        self.current_count.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::StringNode;
    use std::sync::Arc;

    fn node(s: &str) -> SharedNode {
        Arc::new(StringNode::new(s))
    }

    #[test]
    fn set_then_get_round_trips_key_set() {
        let g = Group::new(usize::MAX);
        g.set(vec![node("a"), node("b"), node("c"), node("d")]);

        let mut keys: Vec<String> = g.get().iter().map(|n| n.key()).collect();
        keys.sort();
        assert_eq!(keys, vec!["a", "b", "c", "d"]);
        assert_eq!(g.original_count(), 4);
        assert_eq!(g.current_count(), 4);
    }

    #[test]
    fn exile_removes_and_decrements_current_count_only() {
        let g = Group::new(usize::MAX);
        g.set(vec![node("a"), node("b"), node("c"), node("d")]);

        assert!(g.exile("a"));
        assert_eq!(g.current_count(), 3);
        assert_eq!(g.original_count(), 4);

        // Exiling a key that's not present is a no-op, returns false.
        assert!(!g.exile("a"));
        assert_eq!(g.current_count(), 3);

        let mut keys: Vec<String> = g.get().iter().map(|n| n.key()).collect();
        keys.sort();
        assert_eq!(keys, vec!["b", "c", "d"]);
    }

    #[test]
    fn set_replaces_membership_wholesale() {
        let g = Group::new(usize::MAX);
        g.set(vec![node("a"), node("b")]);
        g.exile("a");
        assert_eq!(g.current_count(), 1);

        g.set(vec![node("c"), node("d"), node("e")]);
        assert_eq!(g.original_count(), 3);
        assert_eq!(g.current_count(), 3);
        let mut keys: Vec<String> = g.get().iter().map(|n| n.key()).collect();
        keys.sort();
        assert_eq!(keys, vec!["c", "d", "e"]);
    }

    #[test]
    fn get_truncates_to_max_node_count() {
        let g = Group::new(2);
        g.set(vec![node("a"), node("b"), node("c"), node("d")]);
        assert_eq!(g.get().len(), 2);
        // The underlying map itself is not capped.
        assert_eq!(g.current_count(), 4);
    }
}
