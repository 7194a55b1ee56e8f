//! Rules that resolve concurrent updates by weighing the causal evidence
//! in the two clocks rather than looking at the values. All of them break
//! ties toward local, and all are value-type agnostic.

use crate::{MergeRule, NodeId, VectorClock};
use std::collections::BTreeMap;

/// The side with the greater counter for one designated node wins.
///
/// Useful when a single node is authoritative for a field: whichever
/// replica has seen more of that node's updates carries its verdict.
#[derive(Debug, Clone)]
pub struct NodeAlwaysWins {
    node: NodeId,
}

impl NodeAlwaysWins {
    /// Prefer the side that has seen more updates from `node`.
    pub fn new(node: impl Into<NodeId>) -> Self {
        Self { node: node.into() }
    }
}

impl<V: Clone> MergeRule<V> for NodeAlwaysWins {
    fn merge(
        &self,
        local: &V,
        remote: &V,
        local_clock: &VectorClock,
        remote_clock: &VectorClock,
    ) -> V {
        if remote_clock.get(self.node.as_str()) > local_clock.get(self.node.as_str()) {
            remote.clone()
        } else {
            local.clone()
        }
    }
}

/// The side whose clock has the greater total of counters wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct MostUpdatesWins;

impl<V: Clone> MergeRule<V> for MostUpdatesWins {
    fn merge(
        &self,
        local: &V,
        remote: &V,
        local_clock: &VectorClock,
        remote_clock: &VectorClock,
    ) -> V {
        if remote_clock.sum() > local_clock.sum() {
            remote.clone()
        } else {
            local.clone()
        }
    }
}

/// The side whose clock has the greatest single-node counter wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct HighestNodeContributionWins;

impl<V: Clone> MergeRule<V> for HighestNodeContributionWins {
    fn merge(
        &self,
        local: &V,
        remote: &V,
        local_clock: &VectorClock,
        remote_clock: &VectorClock,
    ) -> V {
        if remote_clock.max_counter() > local_clock.max_counter() {
            remote.clone()
        } else {
            local.clone()
        }
    }
}

/// The side with the greater trust-weighted update total wins.
///
/// Each node's counter is scaled by its weight; nodes without an entry in
/// the weight table count with weight 1.
#[derive(Debug, Clone, Default)]
pub struct TrustWeighted {
    weights: BTreeMap<NodeId, f64>,
}

impl TrustWeighted {
    /// Build from a node→weight table.
    pub fn new(weights: BTreeMap<NodeId, f64>) -> Self {
        Self { weights }
    }

    /// Add or replace one node's weight.
    pub fn with_weight(mut self, node: impl Into<NodeId>, weight: f64) -> Self {
        self.weights.insert(node.into(), weight);
        self
    }

    fn score(&self, clock: &VectorClock) -> f64 {
        clock
            .entries()
            .map(|(node, counter)| {
                let weight = self.weights.get(node).copied().unwrap_or(1.0);
                counter as f64 * weight
            })
            .sum()
    }
}

impl<V: Clone> MergeRule<V> for TrustWeighted {
    fn merge(
        &self,
        local: &V,
        remote: &V,
        local_clock: &VectorClock,
        remote_clock: &VectorClock,
    ) -> V {
        if self.score(remote_clock) > self.score(local_clock) {
            remote.clone()
        } else {
            local.clone()
        }
    }
}

/// The side whose clock knows more nodes wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct MajorityVote;

impl<V: Clone> MergeRule<V> for MajorityVote {
    fn merge(
        &self,
        local: &V,
        remote: &V,
        local_clock: &VectorClock,
        remote_clock: &VectorClock,
    ) -> V {
        if remote_clock.len() > local_clock.len() {
            remote.clone()
        } else {
            local.clone()
        }
    }
}

/// The side whose lexicographically smallest node ID is smaller wins.
///
/// A side with an empty clock has no smallest node and loses to any side
/// that has one; two empty clocks keep local.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicographicNodeWins;

impl<V: Clone> MergeRule<V> for LexicographicNodeWins {
    fn merge(
        &self,
        local: &V,
        remote: &V,
        local_clock: &VectorClock,
        remote_clock: &VectorClock,
    ) -> V {
        match (local_clock.nodes().next(), remote_clock.nodes().next()) {
            (Some(ours), Some(theirs)) if theirs < ours => remote.clone(),
            (None, Some(_)) => remote.clone(),
            _ => local.clone(),
        }
    }
}

/// Pick one side uniformly at random.
///
/// The only nondeterministic rule in the catalog: the two sides of an
/// exchange may resolve differently, so replicas are not guaranteed to
/// converge. Intended for simulations and tie-breaking experiments.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomChoice;

impl<V: Clone> MergeRule<V> for RandomChoice {
    fn merge(&self, local: &V, remote: &V, _: &VectorClock, _: &VectorClock) -> V {
        if rand::random::<bool>() {
            local.clone()
        } else {
            remote.clone()
        }
    }
}
