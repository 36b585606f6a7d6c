//! The incremental constraint solver.

use std::collections::HashMap;

use indexmap::IndexMap;

use strut_core::{
    near_zero, AddConstraintError, Constraint, InternalSolverError, Relation,
    RemoveConstraintError, Strength, StrengthLevel, Variable,
};

use crate::solution::Solution;
use crate::symbol::{Symbol, SymbolKind, Tag};
use crate::tableau::{Row, Tableau};

/// Objective-row index for a soft strength, `None` for required.
fn soft_level(strength: Strength) -> Option<usize> {
    match strength.level() {
        StrengthLevel::Weak => Some(0),
        StrengthLevel::Medium => Some(1),
        StrengthLevel::Strong => Some(2),
        StrengthLevel::Required => None,
    }
}

#[derive(Debug)]
struct VariableEntry {
    symbol: Symbol,
    /// Number of tracked constraint terms referencing the variable.
    references: usize,
}

/// The incremental Cassowary solver.
///
/// Constraints go in and out one at a time and the tableau is
/// re-optimized after every mutation, so [`Solver::solve`] is a cheap
/// projection of the current state. Failed mutations roll back fully:
/// either a call succeeds or the solver is left as it was.
#[derive(Debug, Default)]
pub struct Solver {
    tableau: Tableau,
    constraints: HashMap<Constraint, Tag>,
    variables: IndexMap<Variable, VariableEntry>,
    next_symbol: u64,
    cache: Option<Solution>,
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a constraint.
    ///
    /// Only the rows the constraint touches are revisited; the tableau is
    /// never rebuilt. A REQUIRED constraint that no assignment can satisfy
    /// alongside the existing ones fails with
    /// [`AddConstraintError::Unsatisfiable`] and leaves the solver
    /// untouched.
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<(), AddConstraintError> {
        if self.constraints.contains_key(&constraint) {
            return Err(AddConstraintError::DuplicateConstraint);
        }

        let (mut row, tag) = self.build_row(&constraint);

        let subject = match self.choose_subject(&row, tag) {
            Some(subject) => Some(subject),
            None if row.all_dummies() => {
                if !near_zero(row.constant()) {
                    self.unregister_terms(&constraint);
                    return Err(AddConstraintError::Unsatisfiable);
                }
                // Redundant with existing required equalities; the dummy
                // marker enters the basis carrying a zero row.
                Some(tag.marker)
            }
            None => None,
        };

        match subject {
            Some(subject) => {
                row.solve_for(subject);
                self.tableau.substitute(subject, &row);
                self.tableau.insert_row(subject, row);
            }
            None => {
                // The row offers no direct subject; bring it in behind an
                // artificial variable.
                if !self.add_with_artificial(&row)? {
                    self.unregister_terms(&constraint);
                    // The artificial phase may have pivoted away from the
                    // soft optimum; restore it before reporting.
                    self.optimize()?;
                    return Err(AddConstraintError::Unsatisfiable);
                }
            }
        }

        self.constraints.insert(constraint, tag);
        self.optimize()?;
        self.cache = None;
        Ok(())
    }

    /// Insert constraints in order. The first failure stops the walk and
    /// is returned; earlier insertions stay, so outcomes can depend on
    /// order when constraints conflict at equal strength.
    pub fn add_constraints<I>(&mut self, constraints: I) -> Result<(), AddConstraintError>
    where
        I: IntoIterator<Item = Constraint>,
    {
        for constraint in constraints {
            self.add_constraint(constraint)?;
        }
        Ok(())
    }

    /// Remove a previously inserted constraint along with exactly the
    /// rows and solver-private variables it introduced.
    ///
    /// A constraint that was never added, or was already removed, fails
    /// with [`RemoveConstraintError::UnknownConstraint`] without touching
    /// any state.
    pub fn remove_constraint(
        &mut self,
        constraint: &Constraint,
    ) -> Result<(), RemoveConstraintError> {
        let Some(tag) = self.constraints.remove(constraint) else {
            return Err(RemoveConstraintError::UnknownConstraint);
        };

        // Undo the error-variable cost before any pivoting, or the
        // substitutions below would fold stale cost back into the
        // objective.
        self.remove_objective_effects(constraint, tag);

        if self.tableau.take_row(tag.marker).is_none() {
            // The marker is parametric; pivot it into the basis and drop
            // the row that held it.
            let (leaving, mut row) = self
                .tableau
                .marker_leaving_row(tag.marker)
                .ok_or(InternalSolverError("marker is in no row"))?;
            row.solve_for_pair(leaving, tag.marker);
            self.tableau.substitute(tag.marker, &row);
        }

        self.unregister_terms(constraint);
        self.optimize()?;
        self.cache = None;
        Ok(())
    }

    /// Remove constraints in order, stopping at the first failure.
    pub fn remove_constraints<'a, I>(&mut self, constraints: I) -> Result<(), RemoveConstraintError>
    where
        I: IntoIterator<Item = &'a Constraint>,
    {
        for constraint in constraints {
            self.remove_constraint(constraint)?;
        }
        Ok(())
    }

    /// Whether the constraint is currently tracked by this solver.
    pub fn has_constraint(&self, constraint: &Constraint) -> bool {
        self.constraints.contains_key(constraint)
    }

    /// Current value of a variable, `None` when no tracked constraint
    /// references it.
    pub fn value_of(&self, variable: &Variable) -> Option<f64> {
        let entry = self.variables.get(variable)?;
        Some(self.tableau.value_of(entry.symbol))
    }

    /// Snapshot the resolved value of every referenced external variable,
    /// in registration order.
    ///
    /// With no mutations since the previous call the cached snapshot is
    /// returned unchanged.
    pub fn solve(&mut self) -> Solution {
        if let Some(solution) = &self.cache {
            return solution.clone();
        }
        let solution = Solution::from_values(self.variables.iter().map(|(variable, entry)| {
            (variable.clone(), self.tableau.value_of(entry.symbol))
        }));
        self.cache = Some(solution.clone());
        solution
    }

    /// Clear every constraint and variable, returning the solver to its
    /// starting state.
    pub fn reset(&mut self) {
        self.tableau.clear();
        self.constraints.clear();
        self.variables.clear();
        self.next_symbol = 0;
        self.cache = None;
    }

    fn alloc_symbol(&mut self, kind: SymbolKind) -> Symbol {
        let symbol = Symbol::new(self.next_symbol, kind);
        self.next_symbol += 1;
        symbol
    }

    /// Symbol for an external variable, registering it on first use and
    /// counting the reference.
    fn external_symbol(&mut self, variable: &Variable) -> Symbol {
        if let Some(entry) = self.variables.get_mut(variable) {
            entry.references += 1;
            return entry.symbol;
        }
        let symbol = self.alloc_symbol(SymbolKind::External);
        self.variables.insert(
            variable.clone(),
            VariableEntry {
                symbol,
                references: 1,
            },
        );
        symbol
    }

    fn release_variable(&mut self, variable: &Variable) {
        if let Some(entry) = self.variables.get_mut(variable) {
            entry.references -= 1;
            if entry.references == 0 {
                self.variables.shift_remove(variable);
            }
        }
    }

    /// Drop the reference counts a constraint's terms hold, removing
    /// variables whose last reference goes.
    fn unregister_terms(&mut self, constraint: &Constraint) {
        for (variable, coefficient) in constraint.expression().terms() {
            if !near_zero(coefficient) {
                self.release_variable(variable);
            }
        }
    }

    /// Translate a constraint into a tableau row, substituting every
    /// variable that is already basic and allocating the slack, error,
    /// and dummy symbols the constraint owns.
    fn build_row(&mut self, constraint: &Constraint) -> (Row, Tag) {
        let expression = constraint.expression();
        let mut row = Row::new(expression.constant());

        for (variable, coefficient) in expression.terms() {
            if near_zero(coefficient) {
                continue;
            }
            let symbol = self.external_symbol(variable);
            if let Some(basic_row) = self.tableau.row(symbol) {
                row.add_row(basic_row, coefficient);
            } else {
                row.add(symbol, coefficient);
            }
        }

        let strength = constraint.strength();
        let tag = match constraint.relation() {
            Relation::LessOrEqual | Relation::GreaterOrEqual => {
                let coefficient = if constraint.relation() == Relation::LessOrEqual {
                    1.0
                } else {
                    -1.0
                };
                let slack = self.alloc_symbol(SymbolKind::Slack);
                row.insert(slack, coefficient);
                if let Some(level) = soft_level(strength) {
                    let error = self.alloc_symbol(SymbolKind::Error);
                    row.insert(error, -coefficient);
                    self.tableau
                        .objective_mut(level)
                        .add(error, strength.symbolic_weight());
                    Tag {
                        marker: slack,
                        other: Some(error),
                    }
                } else {
                    Tag {
                        marker: slack,
                        other: None,
                    }
                }
            }
            Relation::Equal => {
                if let Some(level) = soft_level(strength) {
                    // expr + e_minus - e_plus == 0
                    let plus = self.alloc_symbol(SymbolKind::Error);
                    let minus = self.alloc_symbol(SymbolKind::Error);
                    row.insert(plus, -1.0);
                    row.insert(minus, 1.0);
                    let weight = strength.symbolic_weight();
                    let objective = self.tableau.objective_mut(level);
                    objective.add(plus, weight);
                    objective.add(minus, weight);
                    Tag {
                        marker: plus,
                        other: Some(minus),
                    }
                } else {
                    let dummy = self.alloc_symbol(SymbolKind::Dummy);
                    row.insert(dummy, 1.0);
                    Tag {
                        marker: dummy,
                        other: None,
                    }
                }
            }
        };

        if row.constant() < 0.0 {
            row.reverse_sign();
        }
        (row, tag)
    }

    /// Pick the symbol the new row will define: the lowest-id external
    /// symbol if there is one, else a pivotable marker whose negative
    /// coefficient keeps the normalized constant non-negative.
    fn choose_subject(&self, row: &Row, tag: Tag) -> Option<Symbol> {
        let external = row
            .cells()
            .filter(|(symbol, _)| symbol.is_external())
            .map(|(symbol, _)| symbol)
            .min();
        if external.is_some() {
            return external;
        }
        tag.symbols()
            .find(|&candidate| candidate.is_pivotable() && row.coefficient(candidate) < 0.0)
    }

    /// Insert a row with no natural subject by driving an artificial
    /// objective to zero. Returns `false` when the row cannot be
    /// satisfied; every trace of the attempt is unwound before returning.
    fn add_with_artificial(&mut self, row: &Row) -> Result<bool, InternalSolverError> {
        let artificial = self.alloc_symbol(SymbolKind::Slack);
        self.tableau.insert_row(artificial, row.clone());

        let mut objective = row.clone();
        self.optimize_row(&mut objective)?;
        let feasible = near_zero(objective.constant());

        if feasible {
            // Retire the artificial variable at zero.
            if let Some(mut art_row) = self.tableau.take_row(artificial) {
                if !art_row.is_constant() {
                    let Some(entering) = art_row.any_pivotable() else {
                        self.tableau.strip_column(artificial);
                        return Ok(false);
                    };
                    art_row.solve_for_pair(artificial, entering);
                    self.tableau.substitute(entering, &art_row);
                    self.tableau.insert_row(entering, art_row);
                }
            }
            self.tableau.strip_column(artificial);
            return Ok(true);
        }

        // Unsatisfiable: drop the row the attempt introduced, the same way
        // a removed constraint's marker is dropped, so feasibility and the
        // prior solution space are preserved.
        if self.tableau.take_row(artificial).is_none() {
            if let Some((leaving, mut art_row)) = self.tableau.marker_leaving_row(artificial) {
                art_row.solve_for_pair(leaving, artificial);
                self.tableau.substitute(artificial, &art_row);
            }
        }
        self.tableau.strip_column(artificial);
        Ok(false)
    }

    /// Subtract a removed constraint's error costs from its level's
    /// objective row.
    fn remove_objective_effects(&mut self, constraint: &Constraint, tag: Tag) {
        let Some(level) = soft_level(constraint.strength()) else {
            return;
        };
        let weight = constraint.strength().symbolic_weight();
        for symbol in tag.symbols() {
            if !symbol.is_error() {
                continue;
            }
            // A basic error variable has been eliminated from the
            // objective; undo its whole row instead.
            if let Some(row) = self.tableau.row(symbol) {
                let row = row.clone();
                self.tableau.objective_mut(level).add_row(&row, -weight);
            } else {
                self.tableau.objective_mut(level).add(symbol, -weight);
            }
        }
    }

    /// Primal simplex over the combined soft objectives: pivot while an
    /// improving entering symbol exists.
    fn optimize(&mut self) -> Result<(), InternalSolverError> {
        while let Some(entering) = self.tableau.entering_symbol() {
            let (leaving, mut row) = self
                .tableau
                .leaving_row(entering)
                .ok_or(InternalSolverError("objective is unbounded"))?;
            row.solve_for_pair(leaving, entering);
            self.tableau.substitute(entering, &row);
            self.tableau.insert_row(entering, row);
        }
        Ok(())
    }

    /// Primal simplex driven by a standalone objective row (the
    /// artificial phase of an insertion).
    fn optimize_row(&mut self, objective: &mut Row) -> Result<(), InternalSolverError> {
        while let Some(entering) = Tableau::entering_in(objective) {
            let (leaving, mut row) = self
                .tableau
                .leaving_row(entering)
                .ok_or(InternalSolverError("objective is unbounded"))?;
            row.solve_for_pair(leaving, entering);
            self.tableau.substitute(entering, &row);
            objective.substitute(entering, &row);
            self.tableau.insert_row(entering, row);
        }
        Ok(())
    }
}
