//! Immutable solve snapshots.

use indexmap::IndexMap;

use strut_core::Variable;

/// A read-only mapping from external variables to their resolved values,
/// taken at the time of the producing `solve()` call.
///
/// Mutating the solver afterwards does not touch existing snapshots; a
/// snapshot taken before an add/remove is stale, not wrong.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Solution {
    values: IndexMap<Variable, f64>,
}

impl Solution {
    pub(crate) fn from_values(values: impl IntoIterator<Item = (Variable, f64)>) -> Self {
        Solution {
            values: values.into_iter().collect(),
        }
    }

    /// Resolved value for a variable, `None` when it was not part of the
    /// solved system.
    pub fn value_of(&self, variable: &Variable) -> Option<f64> {
        self.values.get(variable).copied()
    }

    /// Number of resolved variables.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Variables and values in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&Variable, f64)> {
        self.values.iter().map(|(variable, &value)| (variable, value))
    }
}
