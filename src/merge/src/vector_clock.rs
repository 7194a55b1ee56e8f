use crate::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Causal relation between two vector clocks.
///
/// Derived by [`VectorClock::compare`], never stored. Two clocks are
/// `Concurrent` when each has seen an update the other has not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    /// Self happened strictly before other.
    Before,
    /// Self happened strictly after other.
    After,
    /// The clocks are identical.
    Equal,
    /// Neither clock dominates the other.
    Concurrent,
}

impl Relation {
    /// True for the `Concurrent` relation.
    pub fn is_concurrent(&self) -> bool {
        matches!(self, Relation::Concurrent)
    }

    /// The relation as seen from the other side: `a.compare(b)` inverted
    /// is always `b.compare(a)`.
    pub fn invert(self) -> Relation {
        match self {
            Relation::Before => Relation::After,
            Relation::After => Relation::Before,
            Relation::Equal => Relation::Equal,
            Relation::Concurrent => Relation::Concurrent,
        }
    }
}

/// Vector clock for tracking causality across replicas
///
/// Maps node identifiers to monotone update counters. Each replica carries
/// one clock describing its causal history; comparing two clocks yields the
/// partial order the merge engine dispatches on.
///
/// Properties:
/// - Monotonic: counters only increase under [`increment`](Self::increment)
/// - Causal: if update a causes update b, then clock(a) < clock(b)
/// - Concurrent: mutually unordered clocks mark concurrent updates
///
/// Absent nodes are semantically zero on both comparison and merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorClock {
    /// Map from node ID to update counter
    counters: BTreeMap<NodeId, u64>,
}

impl VectorClock {
    /// Create a new empty vector clock.
    pub fn new() -> Self {
        Self {
            counters: BTreeMap::new(),
        }
    }

    /// Get the counter for a node (0 if absent).
    pub fn get(&self, node: &str) -> u64 {
        self.counters.get(node).copied().unwrap_or(0)
    }

    /// Set the counter for a node, keeping the maximum of old and new.
    pub fn set(&mut self, node: impl Into<NodeId>, counter: u64) {
        let current = self.counters.entry(node.into()).or_insert(0);
        *current = (*current).max(counter);
    }

    /// Increment the counter for a node, returning the new value.
    ///
    /// Not synchronized; callers serialize updates per replica.
    pub fn increment(&mut self, node: impl Into<NodeId>) -> u64 {
        let counter = self.counters.entry(node.into()).or_insert(0);
        *counter += 1;
        *counter
    }

    /// Compare this clock against another, classifying the causal relation.
    ///
    /// Single pass over the key union, short-circuiting to `Concurrent` as
    /// soon as updates are observed in both directions. Comparing a clock
    /// to itself yields `Equal`.
    pub fn compare(&self, other: &VectorClock) -> Relation {
        let mut less = false;
        let mut greater = false;

        let all_nodes: std::collections::BTreeSet<&NodeId> =
            self.counters.keys().chain(other.counters.keys()).collect();

        for node in all_nodes {
            let ours = self.get(node.as_str());
            let theirs = other.get(node.as_str());

            if ours < theirs {
                less = true;
            } else if ours > theirs {
                greater = true;
            }
            if less && greater {
                return Relation::Concurrent;
            }
        }

        match (less, greater) {
            (false, false) => Relation::Equal,
            (true, false) => Relation::Before,
            (false, true) => Relation::After,
            (true, true) => unreachable!("short-circuited above"),
        }
    }

    /// Merge two clocks into a new one (pointwise max of the key union).
    ///
    /// Neither input is mutated; the result shares no state with either.
    pub fn merge(&self, other: &VectorClock) -> VectorClock {
        let mut merged = self.clone();
        merged.update(other);
        merged
    }

    /// Update this clock in place with another (pointwise max).
    pub fn update(&mut self, other: &VectorClock) {
        for (node, &counter) in &other.counters {
            let current = self.counters.entry(node.clone()).or_insert(0);
            *current = (*current).max(counter);
        }
    }

    /// Whether this clock has an entry for `node`.
    pub fn contains(&self, node: &str) -> bool {
        self.counters.contains_key(node)
    }

    /// All node IDs known to this clock, in lexicographic order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeId> {
        self.counters.keys()
    }

    /// All (node, counter) entries, in lexicographic node order.
    pub fn entries(&self) -> impl Iterator<Item = (&NodeId, u64)> {
        self.counters.iter().map(|(node, &counter)| (node, counter))
    }

    /// Number of nodes with an entry.
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    /// Whether no node has an entry.
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Sum of all counters.
    pub fn sum(&self) -> u64 {
        self.counters.values().sum()
    }

    /// The largest single-node counter (0 for an empty clock).
    pub fn max_counter(&self) -> u64 {
        self.counters.values().copied().max().unwrap_or(0)
    }
}

impl std::fmt::Display for VectorClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        let mut first = true;
        for (node, counter) in &self.counters {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}:{}", node, counter)?;
            first = false;
        }
        write!(f, "}}")
    }
}

impl<N: Into<NodeId>> FromIterator<(N, u64)> for VectorClock {
    fn from_iter<I: IntoIterator<Item = (N, u64)>>(iter: I) -> Self {
        let mut clock = VectorClock::new();
        for (node, counter) in iter {
            clock.set(node, counter);
        }
        clock
    }
}
