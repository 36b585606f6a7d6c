//! Error types for constraint construction and solving.

use thiserror::Error;

/// Top-level error type for the strut workspace.
#[derive(Debug, Error)]
pub enum StrutError {
    #[error(transparent)]
    Constraint(#[from] ConstraintError),

    #[error(transparent)]
    AddConstraint(#[from] AddConstraintError),

    #[error(transparent)]
    RemoveConstraint(#[from] RemoveConstraintError),

    #[error(transparent)]
    Internal(#[from] InternalSolverError),
}

/// Errors when building a constraint.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintError {
    #[error("constraint expression has no effective variable terms")]
    MalformedExpression,
}

/// Errors when inserting a constraint into a solver.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddConstraintError {
    #[error("constraint was already added to this solver")]
    DuplicateConstraint,

    #[error("required constraint cannot be satisfied")]
    Unsatisfiable,

    #[error(transparent)]
    Internal(#[from] InternalSolverError),
}

/// Errors when removing a constraint from a solver.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoveConstraintError {
    #[error("constraint is not present in this solver")]
    UnknownConstraint,

    #[error(transparent)]
    Internal(#[from] InternalSolverError),
}

/// The pivoting reached a state well-formed input can never produce.
///
/// Indicates a defect in the solver, not a caller error; kept separate so
/// tests can assert it never occurs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("internal solver error: {0}")]
pub struct InternalSolverError(pub &'static str);
