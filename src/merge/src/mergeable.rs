use crate::engine::FieldDescriptor;
use crate::{NodeId, VectorClock};

/// Capability every reconcilable object type must satisfy.
///
/// A mergeable object carries one [`VectorClock`] describing the causal
/// history of the whole record, plus zero or more data fields. Each data
/// field is either *mergeable* (participates in merge, bound to a rule of
/// its value type) or *ignored* (copied through from the local side).
///
/// The field list is declared once by [`descriptor`](Self::descriptor),
/// the statically-typed stand-in for runtime field introspection: a list
/// of (name, getter, setter, optional rule, optional ignore marker)
/// entries the engine compiles into accessors at construction. Fields not
/// declared there are invisible to the engine and keep their `Default`
/// value in freshly merged results.
///
/// The clock field itself is never declared as a data field; the engine
/// always handles it as a whole via pointwise max.
pub trait Mergeable: Default + Clone + 'static {
    /// The replica's causal history.
    fn clock(&self) -> &VectorClock;

    /// Mutable access to the replica's causal history.
    fn clock_mut(&mut self) -> &mut VectorClock;

    /// Declare the mergeable and ignored data fields of this type.
    ///
    /// Called once per [`MergeEngine`](crate::MergeEngine) construction.
    fn descriptor() -> Vec<FieldDescriptor<Self>>;

    /// Record one local update originating at `node`.
    ///
    /// This is the only mechanism by which clocks advance.
    fn touch(&mut self, node: impl Into<NodeId>) {
        self.clock_mut().increment(node);
    }

    /// Apply an infallible mutation, then advance the clock for `node`.
    ///
    /// The ordering (mutate, then increment) is observable: a panicking
    /// mutation leaves the clock untouched.
    fn update<F>(&mut self, node: impl Into<NodeId>, mutation: F)
    where
        F: FnOnce(&mut Self),
    {
        mutation(self);
        self.touch(node);
    }

    /// Apply a fallible mutation, advancing the clock only on success.
    ///
    /// A mutation returning `Err` leaves the clock exactly as it was; the
    /// error propagates to the caller unchanged.
    fn try_update<F, E>(&mut self, node: impl Into<NodeId>, mutation: F) -> Result<(), E>
    where
        F: FnOnce(&mut Self) -> Result<(), E>,
    {
        mutation(self)?;
        self.touch(node);
        Ok(())
    }
}
