//! Vector clock causality tests: unit coverage plus property suites for
//! the comparison and merge laws every replica relies on.

use conflux_merge::{Relation, VectorClock};
use proptest::prelude::*;

use crate::fixtures::clock_of;

fn arb_clock() -> impl Strategy<Value = VectorClock> {
    prop::collection::vec(("[a-e]", 1u64..8), 0..5).prop_map(|entries| {
        let mut clock = VectorClock::new();
        for (node, count) in entries {
            for _ in 0..count {
                clock.increment(node.as_str());
            }
        }
        clock
    })
}

#[cfg(test)]
mod comparison_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fresh_clocks_are_equal() {
        let a = VectorClock::new();
        let b = VectorClock::new();
        assert_eq!(a.compare(&b), Relation::Equal);
    }

    #[test]
    fn test_single_writer_ordering() {
        let mut earlier = VectorClock::new();
        earlier.increment("a");
        let mut later = earlier.clone();
        later.increment("a");

        assert_eq!(earlier.compare(&later), Relation::Before);
        assert_eq!(later.compare(&earlier), Relation::After);
    }

    #[test]
    fn test_independent_writers_are_concurrent() {
        let a = clock_of(&[("a", 1)]);
        let b = clock_of(&[("b", 1)]);
        assert_eq!(a.compare(&b), Relation::Concurrent);
    }

    #[test]
    fn test_mixed_progress_is_concurrent() {
        // Each side has seen an update the other has not.
        let a = clock_of(&[("x", 2), ("y", 1)]);
        let b = clock_of(&[("x", 1), ("y", 2)]);
        assert_eq!(a.compare(&b), Relation::Concurrent);
    }

    #[test]
    fn test_superset_dominates() {
        let a = clock_of(&[("x", 1)]);
        let b = clock_of(&[("x", 1), ("y", 4)]);
        assert_eq!(a.compare(&b), Relation::Before);
        assert_eq!(b.compare(&a), Relation::After);
    }

    proptest! {
        #[test]
        fn property_reflexivity(clock in arb_clock()) {
            prop_assert_eq!(clock.compare(&clock), Relation::Equal);
        }

        #[test]
        fn property_antisymmetry(a in arb_clock(), b in arb_clock()) {
            let forward = a.compare(&b);
            let backward = b.compare(&a);
            prop_assert_eq!(forward, backward.invert());
        }

        #[test]
        fn property_concurrency_symmetric(a in arb_clock(), b in arb_clock()) {
            prop_assert_eq!(
                a.compare(&b) == Relation::Concurrent,
                b.compare(&a) == Relation::Concurrent
            );
        }
    }
}

#[cfg(test)]
mod increment_tests {
    use super::*;

    #[test]
    fn test_increment_is_strictly_monotone() {
        let mut clock = clock_of(&[("a", 3), ("b", 1)]);
        let before = clock.get("a");
        clock.increment("a");
        assert_eq!(clock.get("a"), before + 1);
        // Other entries unchanged
        assert_eq!(clock.get("b"), 1);
    }

    proptest! {
        #[test]
        fn property_increment_orders_after(clock in arb_clock(), node in "[a-e]") {
            let before = clock.clone();
            let mut after = clock;
            after.increment(node.as_str());
            prop_assert_eq!(before.compare(&after), Relation::Before);
        }
    }
}

#[cfg(test)]
mod merge_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_merge_takes_pointwise_max() {
        let a = clock_of(&[("x", 3), ("y", 1)]);
        let b = clock_of(&[("y", 5), ("z", 2)]);
        let merged = a.merge(&b);

        assert_eq!(merged.get("x"), 3);
        assert_eq!(merged.get("y"), 5);
        assert_eq!(merged.get("z"), 2);
    }

    #[test]
    fn test_merge_key_set_is_union() {
        let a = clock_of(&[("x", 1)]);
        let b = clock_of(&[("y", 1)]);
        let merged = a.merge(&b);
        let nodes: Vec<_> = merged.nodes().map(|n| n.as_str().to_string()).collect();
        assert_eq!(nodes, vec!["x", "y"]);
    }

    proptest! {
        #[test]
        fn property_merge_dominates_both(a in arb_clock(), b in arb_clock()) {
            let merged = a.merge(&b);
            for side in [&a, &b] {
                let relation = side.compare(&merged);
                prop_assert!(
                    relation == Relation::Before || relation == Relation::Equal,
                    "merge must dominate each input, got {:?}", relation
                );
            }
        }

        #[test]
        fn property_merge_commutative(a in arb_clock(), b in arb_clock()) {
            prop_assert_eq!(a.merge(&b), b.merge(&a));
        }

        #[test]
        fn property_merge_associative(a in arb_clock(), b in arb_clock(), c in arb_clock()) {
            prop_assert_eq!(a.merge(&b).merge(&c), a.merge(&b.merge(&c)));
        }

        #[test]
        fn property_merge_idempotent(a in arb_clock()) {
            prop_assert_eq!(a.merge(&a), a);
        }

        #[test]
        fn property_merge_entrywise_max(a in arb_clock(), b in arb_clock()) {
            let merged = a.merge(&b);
            for (node, counter) in merged.entries() {
                prop_assert_eq!(counter, a.get(node.as_str()).max(b.get(node.as_str())));
            }
        }
    }
}
