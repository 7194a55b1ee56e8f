use crate::{MergeRule, VectorClock};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;

/// Merge two optional collections: a missing side is treated as empty,
/// so the present side passes through; both present delegates to the
/// collection merge. Results never alias the inputs.
fn merge_option<V: Clone>(
    local: &Option<V>,
    remote: &Option<V>,
    merge_both: impl FnOnce(&V, &V) -> V,
) -> Option<V> {
    match (local, remote) {
        (None, None) => None,
        (Some(local), None) => Some(local.clone()),
        (None, Some(remote)) => Some(remote.clone()),
        (Some(local), Some(remote)) => Some(merge_both(local, remote)),
    }
}

/// Concurrent sets resolve to their union.
///
/// Grow-only semantics: elements are never dropped by a merge, so union
/// is monotone, idempotent, commutative, and associative — replicas
/// converge under any exchange order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetUnion;

impl<E: Clone + Ord> MergeRule<BTreeSet<E>> for SetUnion {
    fn merge(
        &self,
        local: &BTreeSet<E>,
        remote: &BTreeSet<E>,
        _: &VectorClock,
        _: &VectorClock,
    ) -> BTreeSet<E> {
        local.union(remote).cloned().collect()
    }
}

impl<E: Clone + Eq + Hash> MergeRule<HashSet<E>> for SetUnion {
    fn merge(
        &self,
        local: &HashSet<E>,
        remote: &HashSet<E>,
        _: &VectorClock,
        _: &VectorClock,
    ) -> HashSet<E> {
        local.union(remote).cloned().collect()
    }
}

impl<E: Clone + Ord> MergeRule<Option<BTreeSet<E>>> for SetUnion {
    fn merge(
        &self,
        local: &Option<BTreeSet<E>>,
        remote: &Option<BTreeSet<E>>,
        _: &VectorClock,
        _: &VectorClock,
    ) -> Option<BTreeSet<E>> {
        merge_option(local, remote, |local, remote| {
            local.union(remote).cloned().collect()
        })
    }
}

impl<E: Clone + Eq + Hash> MergeRule<Option<HashSet<E>>> for SetUnion {
    fn merge(
        &self,
        local: &Option<HashSet<E>>,
        remote: &Option<HashSet<E>>,
        _: &VectorClock,
        _: &VectorClock,
    ) -> Option<HashSet<E>> {
        merge_option(local, remote, |local, remote| {
            local.union(remote).cloned().collect()
        })
    }
}

/// Concurrent lists concatenate, local items first.
///
/// Duplicates are kept; see [`UniqueAppend`] for deduplicated append.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppendList;

impl<E: Clone> MergeRule<Vec<E>> for AppendList {
    fn merge(&self, local: &Vec<E>, remote: &Vec<E>, _: &VectorClock, _: &VectorClock) -> Vec<E> {
        local.iter().chain(remote.iter()).cloned().collect()
    }
}

impl<E: Clone> MergeRule<Option<Vec<E>>> for AppendList {
    fn merge(
        &self,
        local: &Option<Vec<E>>,
        remote: &Option<Vec<E>>,
        _: &VectorClock,
        _: &VectorClock,
    ) -> Option<Vec<E>> {
        merge_option(local, remote, |local, remote| {
            local.iter().chain(remote.iter()).cloned().collect()
        })
    }
}

/// Concurrent lists concatenate without duplicates: local items in order,
/// followed by remote items not already present, in remote order.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniqueAppend;

fn unique_append<E: Clone + PartialEq>(local: &[E], remote: &[E]) -> Vec<E> {
    let mut merged = local.to_vec();
    for item in remote {
        if !merged.contains(item) {
            merged.push(item.clone());
        }
    }
    merged
}

impl<E: Clone + PartialEq> MergeRule<Vec<E>> for UniqueAppend {
    fn merge(&self, local: &Vec<E>, remote: &Vec<E>, _: &VectorClock, _: &VectorClock) -> Vec<E> {
        unique_append(local, remote)
    }
}

impl<E: Clone + PartialEq> MergeRule<Option<Vec<E>>> for UniqueAppend {
    fn merge(
        &self,
        local: &Option<Vec<E>>,
        remote: &Option<Vec<E>>,
        _: &VectorClock,
        _: &VectorClock,
    ) -> Option<Vec<E>> {
        merge_option(local, remote, |local, remote| unique_append(local, remote))
    }
}

/// Concurrent maps merge per key: keys present on one side pass through;
/// keys present on both are resolved by the inner rule, invoked with the
/// same whole-object clocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct DictionaryMerge<R> {
    inner: R,
}

impl<R> DictionaryMerge<R> {
    /// Merge maps resolving same-key conflicts with `inner`.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

fn merge_btree_map<K, V, R>(
    rule: &R,
    local: &BTreeMap<K, V>,
    remote: &BTreeMap<K, V>,
    local_clock: &VectorClock,
    remote_clock: &VectorClock,
) -> BTreeMap<K, V>
where
    K: Clone + Ord,
    V: Clone,
    R: MergeRule<V>,
{
    let mut merged = local.clone();
    for (key, remote_value) in remote {
        match merged.get_mut(key) {
            Some(local_value) => {
                let resolved = rule.merge(local_value, remote_value, local_clock, remote_clock);
                *local_value = resolved;
            }
            None => {
                merged.insert(key.clone(), remote_value.clone());
            }
        }
    }
    merged
}

fn merge_hash_map<K, V, R>(
    rule: &R,
    local: &HashMap<K, V>,
    remote: &HashMap<K, V>,
    local_clock: &VectorClock,
    remote_clock: &VectorClock,
) -> HashMap<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
    R: MergeRule<V>,
{
    let mut merged = local.clone();
    for (key, remote_value) in remote {
        match merged.get_mut(key) {
            Some(local_value) => {
                let resolved = rule.merge(local_value, remote_value, local_clock, remote_clock);
                *local_value = resolved;
            }
            None => {
                merged.insert(key.clone(), remote_value.clone());
            }
        }
    }
    merged
}

impl<K, V, R> MergeRule<BTreeMap<K, V>> for DictionaryMerge<R>
where
    K: Clone + Ord,
    V: Clone,
    R: MergeRule<V>,
{
    fn merge(
        &self,
        local: &BTreeMap<K, V>,
        remote: &BTreeMap<K, V>,
        local_clock: &VectorClock,
        remote_clock: &VectorClock,
    ) -> BTreeMap<K, V> {
        merge_btree_map(&self.inner, local, remote, local_clock, remote_clock)
    }
}

impl<K, V, R> MergeRule<HashMap<K, V>> for DictionaryMerge<R>
where
    K: Clone + Eq + Hash,
    V: Clone,
    R: MergeRule<V>,
{
    fn merge(
        &self,
        local: &HashMap<K, V>,
        remote: &HashMap<K, V>,
        local_clock: &VectorClock,
        remote_clock: &VectorClock,
    ) -> HashMap<K, V> {
        merge_hash_map(&self.inner, local, remote, local_clock, remote_clock)
    }
}

impl<K, V, R> MergeRule<Option<BTreeMap<K, V>>> for DictionaryMerge<R>
where
    K: Clone + Ord,
    V: Clone,
    R: MergeRule<V>,
{
    fn merge(
        &self,
        local: &Option<BTreeMap<K, V>>,
        remote: &Option<BTreeMap<K, V>>,
        local_clock: &VectorClock,
        remote_clock: &VectorClock,
    ) -> Option<BTreeMap<K, V>> {
        merge_option(local, remote, |local, remote| {
            merge_btree_map(&self.inner, local, remote, local_clock, remote_clock)
        })
    }
}

impl<K, V, R> MergeRule<Option<HashMap<K, V>>> for DictionaryMerge<R>
where
    K: Clone + Eq + Hash,
    V: Clone,
    R: MergeRule<V>,
{
    fn merge(
        &self,
        local: &Option<HashMap<K, V>>,
        remote: &Option<HashMap<K, V>>,
        local_clock: &VectorClock,
        remote_clock: &VectorClock,
    ) -> Option<HashMap<K, V>> {
        merge_option(local, remote, |local, remote| {
            merge_hash_map(&self.inner, local, remote, local_clock, remote_clock)
        })
    }
}
