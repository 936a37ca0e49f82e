//! Set difference between previous and desired values

use crate::record::ValueSet;

/// Values to remove from and add to a record set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordDiff {
    pub to_remove: ValueSet,
    pub to_add: ValueSet,
}

impl RecordDiff {
    /// `previous - desired` removed, `desired - previous` added
    pub fn between(previous: &ValueSet, desired: &ValueSet) -> Self {
        Self {
            to_remove: previous.difference(desired).cloned().collect(),
            to_add: desired.difference(previous).cloned().collect(),
        }
    }

    /// Remove every previous value and insert every desired value
    ///
    /// Used when the values must be rewritten even if they did not change,
    /// e.g. to move a record set to a new TTL.
    pub fn replace_all(previous: &ValueSet, desired: &ValueSet) -> Self {
        Self {
            to_remove: previous.clone(),
            to_add: desired.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_remove.is_empty() && self.to_add.is_empty()
    }
}

/// Shorthand for [`RecordDiff::between`]
pub fn diff(previous: &ValueSet, desired: &ValueSet) -> RecordDiff {
    RecordDiff::between(previous, desired)
}
