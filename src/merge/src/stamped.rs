use crate::{MergeRule, VectorClock};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A value paired with the wall-clock instant of its last write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamped<T> {
    /// The carried value.
    pub value: T,
    /// When the value was written.
    pub at: DateTime<Utc>,
}

impl<T> Stamped<T> {
    /// Pair a value with an explicit instant.
    pub fn new(value: T, at: DateTime<Utc>) -> Self {
        Self { value, at }
    }

    /// Pair a value with the current instant.
    pub fn now(value: T) -> Self {
        Self::new(value, Utc::now())
    }
}

/// Concurrent [`Stamped`] values resolve to the one written later by
/// wall clock; equal instants keep local.
///
/// Wall clocks skew across nodes; prefer the causal rules when the vector
/// clock alone can decide.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampedWins;

impl<T: Clone> MergeRule<Stamped<T>> for TimestampedWins {
    fn merge(
        &self,
        local: &Stamped<T>,
        remote: &Stamped<T>,
        _: &VectorClock,
        _: &VectorClock,
    ) -> Stamped<T> {
        if local.at >= remote.at {
            local.clone()
        } else {
            remote.clone()
        }
    }
}

/// A value paired with an explicit precedence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prioritized<T> {
    /// The carried value.
    pub value: T,
    /// Higher priority wins a concurrent merge.
    pub priority: i64,
}

impl<T> Prioritized<T> {
    /// Pair a value with a priority.
    pub fn new(value: T, priority: i64) -> Self {
        Self { value, priority }
    }
}

/// Concurrent [`Prioritized`] values resolve to the higher priority;
/// equal priorities keep local.
#[derive(Debug, Clone, Copy, Default)]
pub struct PriorityWins;

impl<T: Clone> MergeRule<Prioritized<T>> for PriorityWins {
    fn merge(
        &self,
        local: &Prioritized<T>,
        remote: &Prioritized<T>,
        _: &VectorClock,
        _: &VectorClock,
    ) -> Prioritized<T> {
        if local.priority >= remote.priority {
            local.clone()
        } else {
            remote.clone()
        }
    }
}
