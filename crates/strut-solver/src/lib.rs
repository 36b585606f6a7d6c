//! Incremental Cassowary constraint solving for UI auto-layout.
//!
//! This crate implements:
//! - An incremental simplex tableau with per-strength objective rows
//! - Constraint insertion and removal without re-solving from scratch
//! - Solution snapshots mapping variables to resolved values
//!
//! Callers declare relationships between named [`Variable`]s as linear
//! [`Constraint`]s at four priorities; required constraints always hold
//! exactly (or are rejected), soft ones bend weakest-first when the
//! system is over-determined.
//!
//! # Example
//!
//! ```
//! use strut_solver::{Constraint, LinearExpression, Relation, Solver, Strength, Variable};
//!
//! let width_a = Variable::new("width_a");
//! let width_b = Variable::new("width_b");
//!
//! let mut solver = Solver::new();
//! // width_a == width_b
//! solver.add_constraint(Constraint::required(
//!     LinearExpression::difference(&width_a, &width_b),
//!     Relation::Equal,
//! )?)?;
//! // width_a == 120, but only preferred
//! solver.add_constraint(Constraint::new(
//!     LinearExpression::offset_from(&width_a, 120.0),
//!     Relation::Equal,
//!     Strength::STRONG,
//! )?)?;
//!
//! let solution = solver.solve();
//! let width = solution.value_of(&width_b).unwrap();
//! assert!((width - 120.0).abs() < 1e-6);
//! # Ok::<(), strut_core::StrutError>(())
//! ```

mod solution;
mod solver;
mod symbol;
mod tableau;

pub use solution::Solution;
pub use solver::Solver;

pub use strut_core::{
    near_zero, AddConstraintError, Constraint, ConstraintError, InternalSolverError,
    LinearExpression, Relation, RemoveConstraintError, Strength, StrengthLevel, StrutError,
    Variable, EPSILON, LEVEL_BASE, WEIGHT_MAX,
};
