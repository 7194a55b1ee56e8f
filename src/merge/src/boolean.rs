use crate::{MergeRule, VectorClock};

/// Concurrent booleans combine with logical OR: once any replica has set
/// the flag, the merged flag stays set.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrBoolean;

impl MergeRule<bool> for OrBoolean {
    fn merge(&self, local: &bool, remote: &bool, _: &VectorClock, _: &VectorClock) -> bool {
        *local || *remote
    }
}

/// Concurrent booleans combine with logical AND: the merged flag holds
/// only while every replica holds it.
#[derive(Debug, Clone, Copy, Default)]
pub struct AndBoolean;

impl MergeRule<bool> for AndBoolean {
    fn merge(&self, local: &bool, remote: &bool, _: &VectorClock, _: &VectorClock) -> bool {
        *local && *remote
    }
}
