use client_lb::{RoundRobinStrategy, SharedNode, Strategy, StringNode};
use proptest::prelude::*;
use std::sync::Arc;

fn nodes(n: usize) -> Vec<SharedNode> {
    (0..n)
        .map(|i| Arc::new(StringNode::new(format!("node-{i}"))) as SharedNode)
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Invariant 4: any N consecutive `next()` calls over a stable set of
    /// size N return every node exactly once, regardless of N or of how
    /// far into the cycle we start.
    #[test]
    fn any_n_consecutive_calls_are_a_permutation_of_the_full_set(
        n in 1usize..20,
        warmup in 0usize..40,
    ) {
        let strategy = RoundRobinStrategy::new();
        Strategy::<()>::set_nodes(&strategy, nodes(n));

        for _ in 0..warmup {
            Strategy::<()>::next(&strategy).unwrap();
        }

        let mut seen: Vec<String> = (0..n)
            .map(|_| Strategy::<()>::next(&strategy).unwrap().key())
            .collect();
        seen.sort();
        seen.dedup();
        prop_assert_eq!(seen.len(), n);
    }

    /// Cycle length: selecting 2N times over N nodes visits every node
    /// exactly twice.
    #[test]
    fn two_cycles_visit_every_node_exactly_twice(n in 1usize..15) {
        let strategy = RoundRobinStrategy::new();
        Strategy::<()>::set_nodes(&strategy, nodes(n));

        let mut counts = std::collections::HashMap::new();
        for _ in 0..(2 * n) {
            let key = Strategy::<()>::next(&strategy).unwrap().key();
            *counts.entry(key).or_insert(0u32) += 1;
        }
        prop_assert_eq!(counts.len(), n);
        prop_assert!(counts.values().all(|&c| c == 2));
    }
}
