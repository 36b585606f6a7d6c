//! Linear expressions over variables.

use indexmap::IndexMap;

use crate::variable::Variable;

/// Tolerance for floating-point comparisons throughout the workspace.
pub const EPSILON: f64 = 1e-8;

/// Near-zero check against [`EPSILON`].
pub fn near_zero(value: f64) -> bool {
    value.abs() < EPSILON
}

/// A sum of `coefficient * Variable` terms plus a constant offset.
///
/// Terms keep insertion order and hold at most one entry per variable;
/// adding to a variable that is already present accumulates, and terms
/// whose coefficient lands within [`EPSILON`] of zero drop out. The
/// expression is freely mutable while being built and becomes immutable
/// once moved into a [`crate::Constraint`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpression {
    terms: IndexMap<Variable, f64>,
    constant: f64,
}

impl LinearExpression {
    /// An empty expression (no terms, zero constant).
    pub fn new() -> Self {
        Self::default()
    }

    /// A constant expression with no variable terms.
    pub fn from_constant(value: f64) -> Self {
        Self {
            terms: IndexMap::new(),
            constant: value,
        }
    }

    /// The expression `1.0 * variable`.
    pub fn from_variable(variable: &Variable) -> Self {
        Self::term(variable, 1.0)
    }

    /// The expression `coefficient * variable`.
    pub fn term(variable: &Variable, coefficient: f64) -> Self {
        let mut expr = Self::new();
        expr.add_term(variable, coefficient);
        expr
    }

    /// The expression `a - b`, zero when both variables agree.
    pub fn difference(a: &Variable, b: &Variable) -> Self {
        let mut expr = Self::from_variable(a);
        expr.add_term(b, -1.0);
        expr
    }

    /// The expression `variable - value`, zero when the variable resolves
    /// to the value.
    pub fn offset_from(variable: &Variable, value: f64) -> Self {
        let mut expr = Self::from_variable(variable);
        expr.constant = -value;
        expr
    }

    /// Accumulate `coefficient * variable` into the expression.
    pub fn add_term(&mut self, variable: &Variable, coefficient: f64) {
        if near_zero(coefficient) {
            return;
        }
        let entry = self.terms.entry(variable.clone()).or_insert(0.0);
        *entry += coefficient;
        if near_zero(*entry) {
            self.terms.shift_remove(variable);
        }
    }

    /// Set the constant offset.
    pub fn set_constant(&mut self, value: f64) {
        self.constant = value;
    }

    /// Add `multiplier * other` into this expression.
    pub fn add_expression(&mut self, other: &LinearExpression, multiplier: f64) {
        self.constant += other.constant * multiplier;
        for (variable, coefficient) in &other.terms {
            self.add_term(variable, coefficient * multiplier);
        }
    }

    /// Multiply every term and the constant by a scalar.
    pub fn scale(&mut self, factor: f64) {
        self.constant *= factor;
        for coefficient in self.terms.values_mut() {
            *coefficient *= factor;
        }
        self.terms.retain(|_, coefficient| !near_zero(*coefficient));
    }

    /// The constant offset.
    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// Coefficient for a variable, zero when absent.
    pub fn coefficient(&self, variable: &Variable) -> f64 {
        self.terms.get(variable).copied().unwrap_or(0.0)
    }

    /// Terms in insertion order.
    pub fn terms(&self) -> impl Iterator<Item = (&Variable, f64)> {
        self.terms.iter().map(|(variable, &coefficient)| (variable, coefficient))
    }

    /// True when no variable term survived near-zero dropping.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Number of variable terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }
}
