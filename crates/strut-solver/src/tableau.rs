//! The simplex working representation.
//!
//! A [`Tableau`] maps each basic symbol to a [`Row`] expressing it in
//! terms of non-basic symbols, and carries one objective row per soft
//! strength level. All entering/leaving selection lives here; the policy
//! of when to pivot lives in the solver.

use std::collections::HashMap;

use strut_core::{near_zero, EPSILON};

use crate::symbol::Symbol;

/// Number of soft strength levels carrying an objective row (weak,
/// medium, strong). Required constraints never own error variables, so
/// they have no objective row.
pub(crate) const SOFT_LEVELS: usize = 3;

/// A tableau row: `basic = constant + Σ coefficient * symbol`.
#[derive(Debug, Clone, Default)]
pub(crate) struct Row {
    constant: f64,
    cells: HashMap<Symbol, f64>,
}

impl Row {
    pub(crate) fn new(constant: f64) -> Self {
        Row {
            constant,
            cells: HashMap::new(),
        }
    }

    pub(crate) fn constant(&self) -> f64 {
        self.constant
    }

    pub(crate) fn cells(&self) -> impl Iterator<Item = (Symbol, f64)> + '_ {
        self.cells.iter().map(|(&symbol, &coefficient)| (symbol, coefficient))
    }

    pub(crate) fn coefficient(&self, symbol: Symbol) -> f64 {
        self.cells.get(&symbol).copied().unwrap_or(0.0)
    }

    /// Accumulate `coefficient * symbol`, dropping the cell when the sum
    /// vanishes.
    pub(crate) fn add(&mut self, symbol: Symbol, coefficient: f64) {
        let entry = self.cells.entry(symbol).or_insert(0.0);
        *entry += coefficient;
        if near_zero(*entry) {
            self.cells.remove(&symbol);
        }
    }

    /// Set a coefficient outright.
    pub(crate) fn insert(&mut self, symbol: Symbol, coefficient: f64) {
        if near_zero(coefficient) {
            self.cells.remove(&symbol);
        } else {
            self.cells.insert(symbol, coefficient);
        }
    }

    /// Add `multiplier * other` into this row.
    pub(crate) fn add_row(&mut self, other: &Row, multiplier: f64) {
        self.constant += other.constant * multiplier;
        for (&symbol, &coefficient) in &other.cells {
            self.add(symbol, coefficient * multiplier);
        }
    }

    pub(crate) fn remove(&mut self, symbol: Symbol) {
        self.cells.remove(&symbol);
    }

    /// Negate the whole row.
    pub(crate) fn reverse_sign(&mut self) {
        self.constant = -self.constant;
        for coefficient in self.cells.values_mut() {
            *coefficient = -*coefficient;
        }
    }

    /// Rearrange `0 = constant + ... + coefficient * symbol + ...` into
    /// `symbol = expression`, leaving this row as that expression. The
    /// symbol must be present with a coefficient away from zero.
    pub(crate) fn solve_for(&mut self, symbol: Symbol) {
        debug_assert!(self.cells.contains_key(&symbol));
        let coefficient = self.cells.remove(&symbol).unwrap_or(1.0);
        let multiplier = -1.0 / coefficient;
        self.constant *= multiplier;
        for coefficient in self.cells.values_mut() {
            *coefficient *= multiplier;
        }
    }

    /// Pivot helper: given `basic = this row`, rewrite into
    /// `entering = expression` by reintroducing the old basic symbol.
    pub(crate) fn solve_for_pair(&mut self, basic: Symbol, entering: Symbol) {
        self.insert(basic, -1.0);
        self.solve_for(entering);
    }

    /// Replace every occurrence of `symbol` with the given row.
    pub(crate) fn substitute(&mut self, symbol: Symbol, row: &Row) {
        if let Some(coefficient) = self.cells.remove(&symbol) {
            self.add_row(row, coefficient);
        }
    }

    /// True when only dummy symbols remain.
    pub(crate) fn all_dummies(&self) -> bool {
        self.cells.keys().all(|symbol| symbol.is_dummy())
    }

    /// True when no symbol terms remain.
    pub(crate) fn is_constant(&self) -> bool {
        self.cells.is_empty()
    }

    /// Lowest-id slack or error symbol, if any.
    pub(crate) fn any_pivotable(&self) -> Option<Symbol> {
        self.cells
            .keys()
            .copied()
            .filter(|symbol| symbol.is_pivotable())
            .min()
    }
}

/// Keep whichever candidate has the smaller ratio, ties to the lowest
/// symbol id.
fn prefer(best: Option<(f64, Symbol)>, ratio: f64, symbol: Symbol) -> Option<(f64, Symbol)> {
    match best {
        None => Some((ratio, symbol)),
        Some((best_ratio, best_symbol)) => {
            if ratio < best_ratio || (ratio == best_ratio && symbol < best_symbol) {
                Some((ratio, symbol))
            } else {
                Some((best_ratio, best_symbol))
            }
        }
    }
}

/// The incremental simplex tableau.
#[derive(Debug, Default)]
pub(crate) struct Tableau {
    rows: HashMap<Symbol, Row>,
    objectives: [Row; SOFT_LEVELS],
}

impl Tableau {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn row(&self, symbol: Symbol) -> Option<&Row> {
        self.rows.get(&symbol)
    }

    pub(crate) fn insert_row(&mut self, symbol: Symbol, row: Row) {
        self.rows.insert(symbol, row);
    }

    pub(crate) fn take_row(&mut self, symbol: Symbol) -> Option<Row> {
        self.rows.remove(&symbol)
    }

    pub(crate) fn objective_mut(&mut self, level: usize) -> &mut Row {
        &mut self.objectives[level]
    }

    /// A basic symbol's value is its row constant; non-basic symbols sit
    /// at zero.
    pub(crate) fn value_of(&self, symbol: Symbol) -> f64 {
        self.rows.get(&symbol).map(Row::constant).unwrap_or(0.0)
    }

    /// Eliminate `symbol` from every row and every objective after it
    /// became basic with the given row.
    pub(crate) fn substitute(&mut self, symbol: Symbol, row: &Row) {
        for other in self.rows.values_mut() {
            other.substitute(symbol, row);
        }
        for objective in &mut self.objectives {
            objective.substitute(symbol, row);
        }
    }

    /// Drop a symbol's column from every row and objective. Used to
    /// retire an artificial variable pinned at zero.
    pub(crate) fn strip_column(&mut self, symbol: Symbol) {
        for row in self.rows.values_mut() {
            row.remove(symbol);
        }
        for objective in &mut self.objectives {
            objective.remove(symbol);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.rows.clear();
        for objective in &mut self.objectives {
            *objective = Row::default();
        }
    }

    /// Entering symbol across the level objectives, by combined reduced
    /// cost: most negative wins, ties to the lowest symbol id. The level
    /// weights are already folded into the coefficients, so the sum
    /// realizes strongest-level-first priority arithmetically. Dummies
    /// never enter.
    pub(crate) fn entering_symbol(&self) -> Option<Symbol> {
        let mut combined: HashMap<Symbol, f64> = HashMap::new();
        for objective in &self.objectives {
            for (symbol, coefficient) in objective.cells() {
                if !symbol.is_dummy() {
                    *combined.entry(symbol).or_insert(0.0) += coefficient;
                }
            }
        }
        let mut best: Option<(f64, Symbol)> = None;
        for (symbol, cost) in combined {
            if cost < -EPSILON {
                best = prefer(best, cost, symbol);
            }
        }
        best.map(|(_, symbol)| symbol)
    }

    /// Entering symbol for a standalone objective row (artificial phase).
    pub(crate) fn entering_in(objective: &Row) -> Option<Symbol> {
        let mut best: Option<(f64, Symbol)> = None;
        for (symbol, cost) in objective.cells() {
            if !symbol.is_dummy() && cost < -EPSILON {
                best = prefer(best, cost, symbol);
            }
        }
        best.map(|(_, symbol)| symbol)
    }

    /// Minimum-ratio leaving row for `entering`: restricted rows whose
    /// basic value the entering symbol would drive negative, smallest
    /// ratio first, ties to the lowest basic symbol id. Removes and
    /// returns the winning row. `None` means the objective is unbounded.
    pub(crate) fn leaving_row(&mut self, entering: Symbol) -> Option<(Symbol, Row)> {
        let mut best: Option<(f64, Symbol)> = None;
        for (&basic, row) in &self.rows {
            if basic.is_external() {
                continue;
            }
            let coefficient = row.coefficient(entering);
            if coefficient < -EPSILON {
                best = prefer(best, -row.constant() / coefficient, basic);
            }
        }
        let (_, basic) = best?;
        let row = self.rows.remove(&basic)?;
        Some((basic, row))
    }

    /// Leaving row for pivoting a retiring marker into the basis.
    ///
    /// Preference order keeps the rest of the tableau feasible: restricted
    /// rows with a negative marker coefficient (by ratio), then restricted
    /// rows with a positive coefficient (by ratio), then any external row;
    /// ties to the lowest basic symbol id.
    pub(crate) fn marker_leaving_row(&mut self, marker: Symbol) -> Option<(Symbol, Row)> {
        let mut negative: Option<(f64, Symbol)> = None;
        let mut positive: Option<(f64, Symbol)> = None;
        let mut external: Option<Symbol> = None;
        for (&basic, row) in &self.rows {
            let coefficient = row.coefficient(marker);
            if near_zero(coefficient) {
                continue;
            }
            if basic.is_external() {
                external = match external {
                    Some(best) if best < basic => Some(best),
                    _ => Some(basic),
                };
            } else if coefficient < 0.0 {
                negative = prefer(negative, -row.constant() / coefficient, basic);
            } else {
                positive = prefer(positive, row.constant() / coefficient, basic);
            }
        }
        let basic = negative
            .map(|(_, symbol)| symbol)
            .or_else(|| positive.map(|(_, symbol)| symbol))
            .or(external)?;
        let row = self.rows.remove(&basic)?;
        Some((basic, row))
    }
}
