use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

pub mod vector_clock;
pub mod mergeable;
pub mod engine;
pub mod lww;
pub mod boolean;
pub mod numeric;
pub mod strings;
pub mod collections;
pub mod stamped;
pub mod clock_based;

pub use vector_clock::*;
pub use mergeable::*;
pub use engine::*;
pub use lww::*;
pub use boolean::*;
pub use numeric::*;
pub use strings::*;
pub use collections::*;
pub use stamped::*;
pub use clock_based::*;

/// Deterministic Replica Reconciliation for CONFLUX
///
/// Reconciles two replicas of a structured object in an eventually
/// consistent, multi-master system:
/// - Vector clocks track the causal history of each replica
/// - Clock comparison classifies updates as Before / After / Equal / Concurrent
/// - Causally ordered updates adopt the newer side per field
/// - Truly concurrent updates are delegated to per-field merge rules
///   (set union, boolean OR/AND, numeric max/min/sum, list append, ...)
///
/// Key properties guaranteed:
/// - Determinism: every tie-break is specified; two replicas merging the
///   same inputs produce identical results (excluding `RandomChoice`)
/// - Convergence: with CRDT-style rules bound, replicas converge under
///   arbitrary pairwise exchange
/// - No aliasing: merge results never share mutable state with their inputs

/// Identifier for the logical origin of updates, used as a vector clock key.
///
/// Node IDs are opaque strings. They should be stable across restarts and
/// unique across the fleet of replicas.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a new node ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the string representation of this node ID.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A conflict-resolution rule for one field value type.
///
/// Rules are consulted by the engine only when the object-level causal
/// relation is [`Concurrent`](Relation::Concurrent); causally ordered
/// updates never reach a rule. The one exception is [`LastWriteWins`],
/// which reproduces the engine's full relation policy internally and so
/// behaves identically whether it is the default or an explicit binding.
///
/// Implementations must return an owned value sharing no mutable state
/// with either input, and must be deterministic (every tie broken the
/// same way on every replica) unless explicitly documented otherwise.
pub trait MergeRule<V>: Send + Sync {
    /// Resolve a concurrent update between `local` and `remote`.
    ///
    /// The clocks are the whole-object clocks of the two replicas; rules
    /// that weigh causal evidence (e.g. [`MostUpdatesWins`]) inspect them,
    /// value-directed rules ignore them.
    fn merge(&self, local: &V, remote: &V, local_clock: &VectorClock, remote_clock: &VectorClock)
        -> V;
}

/// Errors that can occur wiring rules into a merge engine.
///
/// Merging itself is infallible: `merge`/`merge_into` never construct an
/// error, and user-supplied rules that panic propagate untouched (the
/// result object is never assembled from a partial merge).
#[derive(thiserror::Error, Debug)]
pub enum MergeError {
    #[error("Unknown mergeable field: {field}")]
    UnknownField { field: String },

    #[error("Rule type mismatch for field '{field}': expected a rule over {expected}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
    },
}

pub type MergeResult<T> = Result<T, MergeError>;
