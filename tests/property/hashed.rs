use client_lb::{HashedStrategy, SharedNode, Strategy, StringNode};
use proptest::prelude::*;
use std::error::Error as StdError;
use std::sync::Arc;

fn nodes(n: usize) -> Vec<SharedNode> {
    (0..n)
        .map(|i| Arc::new(StringNode::new(format!("node-{i}"))) as SharedNode)
        .collect()
}

fn identity_hash() -> impl Fn(&u64) -> Result<u64, Box<dyn StdError + Send + Sync>> {
    |key: &u64| Ok(*key)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// The hashed strategy is a pure function of (hash(input) mod N): the
    /// same input always maps to the same node for a stable sequence,
    /// regardless of how many other lookups happen in between.
    #[test]
    fn same_input_always_maps_to_the_same_node(
        n in 1usize..20,
        key in 0u64..1000,
        other_calls in 0usize..20,
    ) {
        let strategy = HashedStrategy::new(identity_hash());
        strategy.set_nodes(nodes(n));

        let first = strategy.next_for(&key).unwrap().key();
        for i in 0..other_calls {
            let _ = strategy.next_for(&(i as u64)).unwrap();
        }
        let second = strategy.next_for(&key).unwrap().key();

        prop_assert_eq!(first, second);
    }

    /// The selected node's index always equals `hash mod N` for the
    /// identity hash function used here.
    #[test]
    fn selection_matches_hash_modulo_len(n in 1usize..20, key in 0u64..1000) {
        let strategy = HashedStrategy::new(identity_hash());
        strategy.set_nodes(nodes(n));

        let picked = strategy.next_for(&key).unwrap().key();
        let expected = format!("node-{}", key % n as u64);
        prop_assert_eq!(picked, expected);
    }
}
