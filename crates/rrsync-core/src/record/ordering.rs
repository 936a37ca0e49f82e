//! Presentation ordering of record values
//!
//! Servers return answers in arbitrary order. Observed record sets are sorted
//! with the strategy of their kind so that repeated reads, and the plans
//! built from them, come out identical. Ordering never decides set
//! membership; the differ works on unordered sets.

use super::{RecordValue, ServiceTarget};
use std::cmp::Ordering;

/// Strict total order over the values of one record kind
pub trait ValueOrdering: Send + Sync {
    /// Compare two values of the kind
    fn compare(&self, a: &RecordValue, b: &RecordValue) -> Ordering;

    /// Whether `a` sorts strictly before `b`
    fn less_than(&self, a: &RecordValue, b: &RecordValue) -> bool {
        self.compare(a, b) == Ordering::Less
    }

    /// Sort values in place
    fn sort(&self, values: &mut [RecordValue]) {
        values.sort_by(|a, b| self.compare(a, b));
    }
}

/// Addresses, lexicographic on canonical text
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressOrdering;

impl ValueOrdering for AddressOrdering {
    fn compare(&self, a: &RecordValue, b: &RecordValue) -> Ordering {
        match (a, b) {
            (RecordValue::Address(x), RecordValue::Address(y)) => {
                x.to_string().cmp(&y.to_string())
            }
            _ => by_variant(a, b),
        }
    }
}

/// Canonical names, lexicographic on lowercased text
#[derive(Debug, Clone, Copy, Default)]
pub struct NameOrdering;

impl ValueOrdering for NameOrdering {
    fn compare(&self, a: &RecordValue, b: &RecordValue) -> Ordering {
        match (a, b) {
            (RecordValue::CanonicalName(x), RecordValue::CanonicalName(y)) => {
                x.to_lowercase().to_ascii().cmp(&y.to_lowercase().to_ascii())
            }
            _ => by_variant(a, b),
        }
    }
}

/// Service tuples: priority ascending, then weight descending, then target
/// ascending, then port ascending
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceOrdering;

impl ServiceOrdering {
    /// Compare two service tuples
    pub fn compare_targets(&self, a: &ServiceTarget, b: &ServiceTarget) -> Ordering {
        a.priority
            .cmp(&b.priority)
            .then_with(|| b.weight.cmp(&a.weight))
            .then_with(|| {
                a.target
                    .to_lowercase()
                    .to_ascii()
                    .cmp(&b.target.to_lowercase().to_ascii())
            })
            .then_with(|| a.port.cmp(&b.port))
    }

    /// Sort service tuples in place
    pub fn sort_targets(&self, targets: &mut [ServiceTarget]) {
        targets.sort_by(|a, b| self.compare_targets(a, b));
    }
}

impl ValueOrdering for ServiceOrdering {
    fn compare(&self, a: &RecordValue, b: &RecordValue) -> Ordering {
        match (a, b) {
            (RecordValue::Service(x), RecordValue::Service(y)) => self.compare_targets(x, y),
            _ => by_variant(a, b),
        }
    }
}

// Values of a foreign kind never share a record set with the ordering's own
// kind; this keeps the order total anyway.
fn by_variant(a: &RecordValue, b: &RecordValue) -> Ordering {
    fn rank(value: &RecordValue) -> u8 {
        match value {
            RecordValue::Address(_) => 0,
            RecordValue::CanonicalName(_) => 1,
            RecordValue::Service(_) => 2,
        }
    }

    rank(a)
        .cmp(&rank(b))
        .then_with(|| a.to_string().cmp(&b.to_string()))
}
