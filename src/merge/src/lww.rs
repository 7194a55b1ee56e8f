use crate::{MergeRule, Relation, VectorClock};

/// Vector-clock last-writer-wins, the default rule for every mergeable
/// field without an explicit binding.
///
/// Unlike the rest of the catalog, LWW is a full dispatcher: it
/// reproduces the engine's per-relation policy internally (Before and
/// Equal take remote, After takes local) and breaks the concurrent case
/// deterministically toward remote. Both sides of a concurrent exchange
/// therefore converge on the same value without coordination.
#[derive(Debug, Clone, Copy, Default)]
pub struct LastWriteWins;

impl<V: Clone> MergeRule<V> for LastWriteWins {
    fn merge(
        &self,
        local: &V,
        remote: &V,
        local_clock: &VectorClock,
        remote_clock: &VectorClock,
    ) -> V {
        match local_clock.compare(remote_clock) {
            Relation::After => local.clone(),
            Relation::Before | Relation::Equal | Relation::Concurrent => remote.clone(),
        }
    }
}

/// Always keep the local side of a concurrent update.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreferLocal;

impl<V: Clone> MergeRule<V> for PreferLocal {
    fn merge(&self, local: &V, _remote: &V, _: &VectorClock, _: &VectorClock) -> V {
        local.clone()
    }
}

/// Always adopt the remote side of a concurrent update.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreferRemote;

impl<V: Clone> MergeRule<V> for PreferRemote {
    fn merge(&self, _local: &V, remote: &V, _: &VectorClock, _: &VectorClock) -> V {
        remote.clone()
    }
}
