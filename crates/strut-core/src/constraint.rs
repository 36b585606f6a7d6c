//! Constraints: a linear expression bound to a relation and a strength.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::errors::ConstraintError;
use crate::expr::LinearExpression;
use crate::strength::Strength;

/// Relational operator comparing a constraint's expression to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    LessOrEqual,
    Equal,
    GreaterOrEqual,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Relation::LessOrEqual => "<=",
            Relation::Equal => "==",
            Relation::GreaterOrEqual => ">=",
        })
    }
}

#[derive(Debug)]
struct ConstraintData {
    expression: LinearExpression,
    relation: Relation,
    strength: Strength,
}

/// A linear constraint `expression (==|<=|>=) 0` at some strength.
///
/// `Constraint` is a cheap-to-clone handle and the solver tracks
/// constraints by handle identity: the handle passed to `add_constraint`
/// is the one to pass back to `remove_constraint`. Two structurally
/// identical constraints built separately are distinct.
#[derive(Clone)]
pub struct Constraint(Arc<ConstraintData>);

impl Constraint {
    /// Build a constraint.
    ///
    /// Rejects degenerate expressions no assignment could be measured
    /// against: empty, or with every coefficient within tolerance of zero.
    pub fn new(
        expression: LinearExpression,
        relation: Relation,
        strength: Strength,
    ) -> Result<Self, ConstraintError> {
        if expression.is_empty() {
            return Err(ConstraintError::MalformedExpression);
        }
        Ok(Constraint(Arc::new(ConstraintData {
            expression,
            relation,
            strength,
        })))
    }

    /// Build a [`Strength::REQUIRED`] constraint.
    pub fn required(
        expression: LinearExpression,
        relation: Relation,
    ) -> Result<Self, ConstraintError> {
        Self::new(expression, relation, Strength::REQUIRED)
    }

    /// The constrained expression.
    pub fn expression(&self) -> &LinearExpression {
        &self.0.expression
    }

    /// The relation to zero.
    pub fn relation(&self) -> Relation {
        self.0.relation
    }

    /// The constraint's strength.
    pub fn strength(&self) -> Strength {
        self.0.strength
    }
}

impl PartialEq for Constraint {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Constraint {}

impl Hash for Constraint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constraint")
            .field("expression", &self.0.expression)
            .field("relation", &self.0.relation)
            .field("strength", &self.0.strength)
            .finish()
    }
}
