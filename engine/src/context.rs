//! Per-branch accumulator of matched raw values.

use std::collections::BTreeMap;

use argmatch_core::ContainerId;

/// Raw values bound so far along one matching branch.
///
/// Values are kept as strings until finalization, in the order they were
/// matched. `reject_options` records that an end-of-options marker has
/// been passed, after which every remaining token is positional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseContext {
    values: BTreeMap<ContainerId, Vec<String>>,
    pub reject_options: bool,
}

impl ParseContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh context that only inherits the end-of-options state.
    pub fn with_reject_options(reject_options: bool) -> Self {
        Self {
            values: BTreeMap::new(),
            reject_options,
        }
    }

    pub fn push(&mut self, id: ContainerId, value: impl Into<String>) {
        self.values.entry(id).or_default().push(value.into());
    }

    /// Appends every value of `other` after the values already held.
    pub fn merge(&mut self, other: ParseContext) {
        for (id, values) in other.values {
            self.values.entry(id).or_default().extend(values);
        }
        self.reject_options |= other.reject_options;
    }

    /// Bound values per container, in ascending id order.
    pub fn values(&self) -> &BTreeMap<ContainerId, Vec<String>> {
        &self.values
    }

    pub fn get(&self, id: ContainerId) -> Option<&[String]> {
        self.values.get(&id).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
