//! External solver variables.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug)]
struct VariableData {
    id: u64,
    name: String,
}

/// A named numeric unknown.
///
/// `Variable` is a cheap-to-clone handle; clones refer to the same unknown.
/// Identity is per [`Variable::new`] call, so two variables may share a
/// display name without colliding. Resolved values are read back from a
/// solution snapshot or from the owning solver, never stored in the handle.
#[derive(Clone)]
pub struct Variable(Arc<VariableData>);

impl Variable {
    /// Create a fresh variable with the given display name.
    pub fn new(name: impl Into<String>) -> Self {
        let id = NEXT_ID.fetch_add(1, AtomicOrdering::Relaxed);
        Variable(Arc::new(VariableData {
            id,
            name: name.into(),
        }))
    }

    /// The display name given at creation.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Stable unique id, shared by all clones of this handle.
    pub fn id(&self) -> u64 {
        self.0.id
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Variable {}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl PartialOrd for Variable {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Variable {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.id.cmp(&other.0.id)
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Variable({}#{})", self.0.name, self.0.id)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}
