use crate::{MergeRule, VectorClock};

/// Concurrent strings resolve to the longer one (byte length); ties keep
/// local. Over `Option<String>`, a missing value counts as length 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct LongestString;

impl MergeRule<String> for LongestString {
    fn merge(&self, local: &String, remote: &String, _: &VectorClock, _: &VectorClock) -> String {
        if local.len() >= remote.len() {
            local.clone()
        } else {
            remote.clone()
        }
    }
}

impl MergeRule<Option<String>> for LongestString {
    fn merge(
        &self,
        local: &Option<String>,
        remote: &Option<String>,
        _: &VectorClock,
        _: &VectorClock,
    ) -> Option<String> {
        let local_len = local.as_ref().map_or(0, String::len);
        let remote_len = remote.as_ref().map_or(0, String::len);
        if local_len >= remote_len {
            local.clone()
        } else {
            remote.clone()
        }
    }
}

/// Concurrent strings resolve to the shorter one (byte length); ties keep
/// local. Over `Option<String>`, a missing value counts as infinitely
/// long, so any present string beats it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortestString;

impl MergeRule<String> for ShortestString {
    fn merge(&self, local: &String, remote: &String, _: &VectorClock, _: &VectorClock) -> String {
        if local.len() <= remote.len() {
            local.clone()
        } else {
            remote.clone()
        }
    }
}

impl MergeRule<Option<String>> for ShortestString {
    fn merge(
        &self,
        local: &Option<String>,
        remote: &Option<String>,
        _: &VectorClock,
        _: &VectorClock,
    ) -> Option<String> {
        let local_len = local.as_ref().map_or(usize::MAX, String::len);
        let remote_len = remote.as_ref().map_or(usize::MAX, String::len);
        if local_len <= remote_len {
            local.clone()
        } else {
            remote.clone()
        }
    }
}
