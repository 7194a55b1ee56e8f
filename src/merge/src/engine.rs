use crate::lww::LastWriteWins;
use crate::{MergeError, MergeResult, MergeRule, Mergeable, Relation, VectorClock};
use std::any::Any;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Declaration of one data field of a mergeable type.
///
/// Descriptors are the statically-typed counterpart of field annotations:
/// each names a field, supplies its getter and setter, and either binds a
/// merge rule (explicitly, or the [`LastWriteWins`] default) or marks the
/// field as ignored. The engine compiles descriptors into accessors once,
/// at construction; merging performs no further introspection.
pub struct FieldDescriptor<T> {
    pub(crate) kind: DescriptorKind<T>,
}

pub(crate) enum DescriptorKind<T> {
    Merged(Box<dyn ErasedAccessor<T>>),
    Ignored(IgnoredField<T>),
}

impl<T: Mergeable> FieldDescriptor<T> {
    /// A mergeable field bound to the default vector-clock LWW rule.
    pub fn merged<V>(name: &'static str, get: fn(&T) -> &V, set: fn(&mut T, V)) -> Self
    where
        V: Clone + 'static,
    {
        Self::with_rule(name, get, set, LastWriteWins)
    }

    /// A mergeable field bound to an explicit rule.
    pub fn with_rule<V, R>(
        name: &'static str,
        get: fn(&T) -> &V,
        set: fn(&mut T, V),
        rule: R,
    ) -> Self
    where
        V: Clone + 'static,
        R: MergeRule<V> + 'static,
    {
        Self {
            kind: DescriptorKind::Merged(Box::new(TypedAccessor {
                name,
                rule_name: std::any::type_name::<R>(),
                get,
                set,
                rule: Box::new(rule),
            })),
        }
    }

    /// A field excluded from merging.
    ///
    /// `copy` writes the field from the second argument (the local
    /// replica) into the first (the merge result). Ignored fields are
    /// copied through on [`MergeEngine::merge`] and left untouched by
    /// [`MergeEngine::merge_into`].
    pub fn ignored(name: &'static str, copy: fn(&mut T, &T)) -> Self {
        Self {
            kind: DescriptorKind::Ignored(IgnoredField { name, copy }),
        }
    }
}

/// Handle for a field that bypasses the merge loop.
pub(crate) struct IgnoredField<T> {
    name: &'static str,
    copy: fn(&mut T, &T),
}

impl<T> IgnoredField<T> {
    fn copy_from_local(&self, result: &mut T, local: &T) {
        (self.copy)(result, local);
    }
}

/// Type-erased accessor over one mergeable field.
///
/// Erases the field's value type behind a uniform merge operation while
/// keeping strong typing internally; `merge_field` is the hot path.
pub(crate) trait ErasedAccessor<T>: Send + Sync {
    fn name(&self) -> &'static str;

    fn rule_name(&self) -> &'static str;

    fn merge_field(
        &self,
        result: &mut T,
        local: &T,
        remote: &T,
        relation: Relation,
        local_clock: &VectorClock,
        remote_clock: &VectorClock,
    );

    fn merge_field_in_place(
        &self,
        local: &mut T,
        remote: &T,
        relation: Relation,
        local_clock: &VectorClock,
        remote_clock: &VectorClock,
    );

    /// Replace the bound rule. The box must contain a
    /// `Box<dyn MergeRule<V>>` for this field's value type `V`.
    fn bind_rule(&mut self, rule: Box<dyn Any>, rule_name: &'static str) -> MergeResult<()>;
}

struct TypedAccessor<T, V> {
    name: &'static str,
    rule_name: &'static str,
    get: fn(&T) -> &V,
    set: fn(&mut T, V),
    rule: Box<dyn MergeRule<V>>,
}

impl<T, V> ErasedAccessor<T> for TypedAccessor<T, V>
where
    T: 'static,
    V: Clone + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn rule_name(&self) -> &'static str {
        self.rule_name
    }

    fn merge_field(
        &self,
        result: &mut T,
        local: &T,
        remote: &T,
        relation: Relation,
        local_clock: &VectorClock,
        remote_clock: &VectorClock,
    ) {
        let resolved = match relation {
            Relation::After => (self.get)(local).clone(),
            Relation::Before | Relation::Equal => (self.get)(remote).clone(),
            Relation::Concurrent => self.rule.merge(
                (self.get)(local),
                (self.get)(remote),
                local_clock,
                remote_clock,
            ),
        };
        (self.set)(result, resolved);
    }

    fn merge_field_in_place(
        &self,
        local: &mut T,
        remote: &T,
        relation: Relation,
        local_clock: &VectorClock,
        remote_clock: &VectorClock,
    ) {
        let resolved = match relation {
            // Local already holds the winning value.
            Relation::After => return,
            Relation::Before | Relation::Equal => (self.get)(remote).clone(),
            Relation::Concurrent => self.rule.merge(
                (self.get)(local),
                (self.get)(remote),
                local_clock,
                remote_clock,
            ),
        };
        (self.set)(local, resolved);
    }

    fn bind_rule(&mut self, rule: Box<dyn Any>, rule_name: &'static str) -> MergeResult<()> {
        match rule.downcast::<Box<dyn MergeRule<V>>>() {
            Ok(rule) => {
                self.rule = *rule;
                self.rule_name = rule_name;
                Ok(())
            }
            Err(_) => Err(MergeError::TypeMismatch {
                field: self.name.to_string(),
                expected: std::any::type_name::<V>(),
            }),
        }
    }
}

/// Pluggable module that wires rules into an engine at construction.
///
/// Bindings registered here supersede descriptor-declared rules, which in
/// turn supersede the default LWW. Implemented for any closure of the
/// matching shape, so one-off registration does not require a named type.
pub trait Resolver<T: Mergeable> {
    fn register_rules(&mut self, engine: &mut MergeEngine<T>) -> MergeResult<()>;
}

impl<T, F> Resolver<T> for F
where
    T: Mergeable,
    F: FnMut(&mut MergeEngine<T>) -> MergeResult<()>,
{
    fn register_rules(&mut self, engine: &mut MergeEngine<T>) -> MergeResult<()> {
        self(engine)
    }
}

/// Per-type reconciliation engine.
///
/// Discovers the fields of `T` from its [`Mergeable::descriptor`] at
/// construction and compiles them into typed accessors. After that the
/// engine is stateless beyond its rule bindings: concurrent merges through
/// a shared engine are safe; [`set_rule`](Self::set_rule) takes `&mut self`
/// and so is serialized by the borrow checker.
///
/// Merge decisions are driven by the *object-level* causal relation,
/// computed once per merge: the system stores a single clock per object,
/// so each field's causal fate is tied to the whole record. Field rules
/// are consulted only for the `Concurrent` case.
pub struct MergeEngine<T: Mergeable> {
    accessors: Vec<Box<dyn ErasedAccessor<T>>>,
    index: HashMap<&'static str, usize>,
    ignored: Vec<IgnoredField<T>>,
}

impl<T: Mergeable> MergeEngine<T> {
    /// Build an engine from `T`'s field descriptors.
    pub fn new() -> Self {
        let mut accessors: Vec<Box<dyn ErasedAccessor<T>>> = Vec::new();
        let mut ignored = Vec::new();

        for descriptor in T::descriptor() {
            match descriptor.kind {
                DescriptorKind::Merged(accessor) => accessors.push(accessor),
                DescriptorKind::Ignored(field) => ignored.push(field),
            }
        }

        let index = accessors
            .iter()
            .enumerate()
            .map(|(position, accessor)| (accessor.name(), position))
            .collect();

        debug!(
            object = std::any::type_name::<T>(),
            mergeable = accessors.len(),
            ignored = ignored.len(),
            "merge engine constructed"
        );

        Self {
            accessors,
            index,
            ignored,
        }
    }

    /// Build an engine, then let `resolver` override field rules.
    pub fn with_resolver<R: Resolver<T>>(mut resolver: R) -> MergeResult<Self> {
        let mut engine = Self::new();
        resolver.register_rules(&mut engine)?;
        Ok(engine)
    }

    /// Replace the rule bound to a mergeable field.
    ///
    /// Fails with [`MergeError::UnknownField`] when `field` names an
    /// ignored field, the clock, or nothing at all, and with
    /// [`MergeError::TypeMismatch`] when the rule's value type disagrees
    /// with the field's declared type.
    pub fn set_rule<V, R>(&mut self, field: &str, rule: R) -> MergeResult<()>
    where
        V: 'static,
        R: MergeRule<V> + 'static,
    {
        let position = *self
            .index
            .get(field)
            .ok_or_else(|| MergeError::UnknownField {
                field: field.to_string(),
            })?;

        let boxed: Box<dyn MergeRule<V>> = Box::new(rule);
        self.accessors[position].bind_rule(Box::new(boxed), std::any::type_name::<R>())?;

        debug!(field, rule = std::any::type_name::<R>(), "field rule replaced");
        Ok(())
    }

    /// Merge two replicas into a freshly constructed result.
    ///
    /// The causal relation is computed once for the whole object; each
    /// mergeable field then adopts the causally newer side, or its bound
    /// rule's verdict when the updates are concurrent. Ignored fields are
    /// copied from `local`. The result's clock is the pointwise max of
    /// both input clocks, and the result shares no mutable state with
    /// either input.
    pub fn merge(&self, local: &T, remote: &T) -> T {
        let relation = local.clock().compare(remote.clock());
        trace!(?relation, "merging replicas");

        let mut result = T::default();
        for accessor in &self.accessors {
            accessor.merge_field(
                &mut result,
                local,
                remote,
                relation,
                local.clock(),
                remote.clock(),
            );
        }
        for field in &self.ignored {
            field.copy_from_local(&mut result, local);
        }
        *result.clock_mut() = local.clock().merge(remote.clock());
        result
    }

    /// Merge with the null-side shortcuts: a missing side makes the merge
    /// an identity on the other, with no per-field work.
    pub fn merge_opt(&self, local: Option<&T>, remote: Option<&T>) -> Option<T> {
        match (local, remote) {
            (None, None) => None,
            (Some(local), None) => Some(local.clone()),
            (None, Some(remote)) => Some(remote.clone()),
            (Some(local), Some(remote)) => Some(self.merge(local, remote)),
        }
    }

    /// Merge `remote` into `local` in place, returning `local`.
    ///
    /// Identical merge decisions to [`merge`](Self::merge), written back
    /// into `local`. Ignored fields retain their prior local value, and
    /// `local`'s clock is updated to the pointwise max in place.
    pub fn merge_into<'a>(&self, local: &'a mut T, remote: &T) -> &'a mut T {
        let local_clock = local.clock().clone();
        let relation = local_clock.compare(remote.clock());
        trace!(?relation, "merging replica in place");

        for accessor in &self.accessors {
            accessor.merge_field_in_place(local, remote, relation, &local_clock, remote.clock());
        }
        local.clock_mut().update(remote.clock());
        local
    }

    /// Left fold of [`merge`](Self::merge) over any number of replicas.
    ///
    /// Returns `None` for an empty iterator. With CRDT-style rules bound,
    /// the result is independent of the iteration order.
    pub fn merge_all<'a, I>(&self, replicas: I) -> Option<T>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let mut replicas = replicas.into_iter();
        let first = replicas.next()?.clone();
        Some(replicas.fold(first, |merged, replica| self.merge(&merged, replica)))
    }

    /// Names of the mergeable fields, in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.accessors.iter().map(|accessor| accessor.name())
    }

    /// Names of the ignored fields, in declaration order.
    pub fn ignored_field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.ignored.iter().map(|field| field.name)
    }

    /// Whether `field` names a mergeable field.
    pub fn has_field(&self, field: &str) -> bool {
        self.index.contains_key(field)
    }

    /// Type name of the rule currently bound to a mergeable field.
    pub fn rule_name(&self, field: &str) -> MergeResult<&'static str> {
        let position = *self
            .index
            .get(field)
            .ok_or_else(|| MergeError::UnknownField {
                field: field.to_string(),
            })?;
        Ok(self.accessors[position].rule_name())
    }
}

impl<T: Mergeable> Default for MergeEngine<T> {
    fn default() -> Self {
        Self::new()
    }
}
