//! End-to-end solver scenarios: strength trade-offs, incremental
//! add/remove behavior, and failure rollback.

use proptest::prelude::*;

use strut_solver::{
    AddConstraintError, Constraint, LinearExpression, Relation, RemoveConstraintError, Solution,
    Solver, Strength, Variable,
};

const TOLERANCE: f64 = 1e-6;

fn eq(variable: &Variable, value: f64, strength: Strength) -> Constraint {
    Constraint::new(
        LinearExpression::offset_from(variable, value),
        Relation::Equal,
        strength,
    )
    .unwrap()
}

fn geq(variable: &Variable, value: f64, strength: Strength) -> Constraint {
    Constraint::new(
        LinearExpression::offset_from(variable, value),
        Relation::GreaterOrEqual,
        strength,
    )
    .unwrap()
}

fn leq(variable: &Variable, value: f64, strength: Strength) -> Constraint {
    Constraint::new(
        LinearExpression::offset_from(variable, value),
        Relation::LessOrEqual,
        strength,
    )
    .unwrap()
}

fn value(solution: &Solution, variable: &Variable) -> f64 {
    solution
        .value_of(variable)
        .unwrap_or_else(|| panic!("{} missing from solution", variable.name()))
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < TOLERANCE,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn required_equalities_resolve_exactly() {
    let x = Variable::new("x");
    let y = Variable::new("y");
    let z = Variable::new("z");
    let mut solver = Solver::new();

    solver.add_constraint(eq(&x, 10.0, Strength::REQUIRED)).unwrap();

    // y == x + 20
    let mut expr = LinearExpression::difference(&y, &x);
    expr.set_constant(-20.0);
    solver
        .add_constraint(Constraint::required(expr, Relation::Equal).unwrap())
        .unwrap();

    // z == x + y
    let mut expr = LinearExpression::from_variable(&z);
    expr.add_term(&x, -1.0);
    expr.add_term(&y, -1.0);
    solver
        .add_constraint(Constraint::required(expr, Relation::Equal).unwrap())
        .unwrap();

    let solution = solver.solve();
    assert_close(value(&solution, &x), 10.0);
    assert_close(value(&solution, &y), 30.0);
    assert_close(value(&solution, &z), 40.0);
}

#[test]
fn weak_yields_to_required() {
    let x = Variable::new("x");
    let mut solver = Solver::new();
    solver.add_constraint(eq(&x, 10.0, Strength::REQUIRED)).unwrap();
    solver.add_constraint(eq(&x, 0.0, Strength::WEAK)).unwrap();
    assert_close(value(&solver.solve(), &x), 10.0);
}

#[test]
fn equal_widths_follow_the_strong_pull() {
    // w1 == w2 (required), w1 == 100 (strong), w2 == 50 (weak)
    let w1 = Variable::new("w1");
    let w2 = Variable::new("w2");
    let mut solver = Solver::new();

    solver
        .add_constraint(
            Constraint::required(LinearExpression::difference(&w1, &w2), Relation::Equal)
                .unwrap(),
        )
        .unwrap();
    solver.add_constraint(eq(&w1, 100.0, Strength::STRONG)).unwrap();
    solver.add_constraint(eq(&w2, 50.0, Strength::WEAK)).unwrap();

    let solution = solver.solve();
    assert_close(value(&solution, &w1), 100.0);
    assert_close(value(&solution, &w2), 100.0);
}

#[test]
fn required_bound_clips_a_strong_pull() {
    // x >= 0 (required) against x == -5 (strong): the bound holds and the
    // equality is violated by the minimum amount.
    let x = Variable::new("x");
    let mut solver = Solver::new();
    solver.add_constraint(geq(&x, 0.0, Strength::REQUIRED)).unwrap();
    solver.add_constraint(eq(&x, -5.0, Strength::STRONG)).unwrap();
    assert_close(value(&solver.solve(), &x), 0.0);
}

#[test]
fn opposing_required_bounds_pin_the_value() {
    let x = Variable::new("x");
    let mut solver = Solver::new();
    solver.add_constraint(geq(&x, 5.0, Strength::REQUIRED)).unwrap();
    solver.add_constraint(leq(&x, 5.0, Strength::REQUIRED)).unwrap();
    solver.add_constraint(eq(&x, 3.0, Strength::WEAK)).unwrap();
    assert_close(value(&solver.solve(), &x), 5.0);
}

#[test]
fn add_then_remove_restores_the_previous_solution() {
    let x = Variable::new("x");
    let y = Variable::new("y");
    let mut solver = Solver::new();
    solver.add_constraint(eq(&x, 10.0, Strength::REQUIRED)).unwrap();
    solver.add_constraint(geq(&y, 5.0, Strength::REQUIRED)).unwrap();
    solver.add_constraint(eq(&y, 8.0, Strength::WEAK)).unwrap();
    let before = solver.solve();

    // A constraint on a fresh variable, strong enough to shuffle errors.
    let z = Variable::new("z");
    let pull = Constraint::new(
        LinearExpression::difference(&z, &x),
        Relation::Equal,
        Strength::MEDIUM,
    )
    .unwrap();
    solver.add_constraint(pull.clone()).unwrap();
    assert!(solver.value_of(&z).is_some());

    solver.remove_constraint(&pull).unwrap();
    let after = solver.solve();

    assert_eq!(before.len(), after.len());
    for (variable, expected) in before.iter() {
        assert_close(value(&after, variable), expected);
    }
    assert_eq!(after.value_of(&z), None);
}

#[test]
fn order_does_not_matter_for_nonconflicting_constraints() {
    let x = Variable::new("x");
    let y = Variable::new("y");

    let a = eq(&x, 10.0, Strength::REQUIRED);
    let mut expr = LinearExpression::difference(&y, &x);
    expr.set_constant(-5.0);
    let b = Constraint::required(expr, Relation::Equal).unwrap();

    let mut forward = Solver::new();
    forward.add_constraints([a.clone(), b.clone()]).unwrap();
    let mut backward = Solver::new();
    backward.add_constraints([b, a]).unwrap();

    let left = forward.solve();
    let right = backward.solve();
    assert_close(value(&left, &x), value(&right, &x));
    assert_close(value(&left, &y), value(&right, &y));
    assert_close(value(&left, &y), 15.0);
}

#[test]
fn conflicting_required_equalities_fail_and_roll_back() {
    let x = Variable::new("x");
    let mut solver = Solver::new();
    solver.add_constraint(eq(&x, 1.0, Strength::REQUIRED)).unwrap();
    let before = solver.solve();

    let err = solver.add_constraint(eq(&x, 2.0, Strength::REQUIRED));
    assert_eq!(err, Err(AddConstraintError::Unsatisfiable));

    let after = solver.solve();
    assert_eq!(before.len(), after.len());
    assert_close(value(&after, &x), 1.0);
}

#[test]
fn conflicting_required_bounds_fail_and_roll_back() {
    let x = Variable::new("x");
    let mut solver = Solver::new();
    solver.add_constraint(geq(&x, 5.0, Strength::REQUIRED)).unwrap();
    solver.add_constraint(eq(&x, 5.0, Strength::WEAK)).unwrap();
    assert_close(value(&solver.solve(), &x), 5.0);

    let err = solver.add_constraint(leq(&x, 3.0, Strength::REQUIRED));
    assert_eq!(err, Err(AddConstraintError::Unsatisfiable));

    assert_close(value(&solver.solve(), &x), 5.0);
}

#[test]
fn removing_the_blocker_unblocks_a_previously_infeasible_add() {
    let x = Variable::new("x");
    let mut solver = Solver::new();
    let first = eq(&x, 1.0, Strength::REQUIRED);
    solver.add_constraint(first.clone()).unwrap();

    let second = eq(&x, 2.0, Strength::REQUIRED);
    assert_eq!(
        solver.add_constraint(second.clone()),
        Err(AddConstraintError::Unsatisfiable)
    );

    solver.remove_constraint(&first).unwrap();
    solver.add_constraint(second).unwrap();
    assert_close(value(&solver.solve(), &x), 2.0);
}

#[test]
fn many_weak_constraints_lose_to_one_medium() {
    // Dominance boundary: fifty weak pulls in one direction cannot
    // overcome a single medium target.
    let x = Variable::new("x");
    let mut solver = Solver::new();
    for _ in 0..50 {
        solver.add_constraint(eq(&x, 0.0, Strength::WEAK)).unwrap();
    }
    solver.add_constraint(eq(&x, 100.0, Strength::MEDIUM)).unwrap();
    assert_close(value(&solver.solve(), &x), 100.0);
}

#[test]
fn weight_multiplier_scales_within_a_level() {
    // Two weak pulls; the heavier one wins.
    let x = Variable::new("x");
    let mut solver = Solver::new();
    solver.add_constraint(eq(&x, 0.0, Strength::WEAK)).unwrap();
    solver
        .add_constraint(eq(&x, 10.0, Strength::WEAK.with_weight(4.0)))
        .unwrap();
    assert_close(value(&solver.solve(), &x), 10.0);
}

#[test]
fn solve_is_cached_until_the_next_mutation() {
    let x = Variable::new("x");
    let mut solver = Solver::new();
    solver.add_constraint(eq(&x, 10.0, Strength::REQUIRED)).unwrap();

    let first = solver.solve();
    let second = solver.solve();
    assert_eq!(first, second);

    // Snapshots are immutable: mutating the solver afterwards leaves the
    // old snapshot at its old values.
    let pull = eq(&x, 10.0, Strength::WEAK);
    solver.add_constraint(pull).unwrap();
    assert_close(value(&first, &x), 10.0);
}

#[test]
fn remove_twice_reports_unknown_constraint() {
    let x = Variable::new("x");
    let mut solver = Solver::new();
    let c = eq(&x, 1.0, Strength::REQUIRED);
    solver.add_constraint(c.clone()).unwrap();
    solver.remove_constraint(&c).unwrap();
    assert_eq!(
        solver.remove_constraint(&c),
        Err(RemoveConstraintError::UnknownConstraint)
    );
}

#[test]
fn batch_add_and_remove() {
    let x = Variable::new("x");
    let y = Variable::new("y");
    let constraints = vec![
        eq(&x, 10.0, Strength::REQUIRED),
        eq(&y, 20.0, Strength::REQUIRED),
    ];

    let mut solver = Solver::new();
    solver.add_constraints(constraints.clone()).unwrap();
    let solution = solver.solve();
    assert_close(value(&solution, &x), 10.0);
    assert_close(value(&solution, &y), 20.0);

    solver.remove_constraints(&constraints).unwrap();
    assert!(solver.solve().is_empty());
}

#[test]
fn batch_add_stops_at_the_first_failure() {
    let x = Variable::new("x");
    let mut solver = Solver::new();
    let err = solver.add_constraints([
        eq(&x, 1.0, Strength::REQUIRED),
        eq(&x, 2.0, Strength::REQUIRED),
        eq(&x, 3.0, Strength::REQUIRED),
    ]);
    assert_eq!(err, Err(AddConstraintError::Unsatisfiable));

    // The first insertion survives.
    assert_close(value(&solver.solve(), &x), 1.0);
}

fn chain_constraints(variables: &[Variable], offsets: &[f64]) -> Vec<Constraint> {
    let mut constraints =
        vec![eq(&variables[0], offsets[0], Strength::REQUIRED)];
    for i in 1..variables.len() {
        let mut expr = LinearExpression::difference(&variables[i], &variables[i - 1]);
        expr.set_constant(-offsets[i]);
        constraints.push(Constraint::required(expr, Relation::Equal).unwrap());
    }
    constraints
}

proptest! {
    #[test]
    fn chain_solution_is_insertion_order_independent(
        offsets in prop::collection::vec(-100.0f64..100.0, 2..6),
    ) {
        let variables: Vec<Variable> = (0..offsets.len())
            .map(|i| Variable::new(format!("v{i}")))
            .collect();
        let constraints = chain_constraints(&variables, &offsets);

        let mut forward = Solver::new();
        forward.add_constraints(constraints.iter().cloned()).unwrap();
        let mut backward = Solver::new();
        backward.add_constraints(constraints.iter().rev().cloned()).unwrap();

        let left = forward.solve();
        let right = backward.solve();

        let mut expected = 0.0;
        for (variable, offset) in variables.iter().zip(&offsets) {
            expected += offset;
            prop_assert!((value(&left, variable) - expected).abs() < TOLERANCE);
            prop_assert!((value(&left, variable) - value(&right, variable)).abs() < TOLERANCE);
        }
    }

    #[test]
    fn soft_add_remove_round_trips(
        target in -100.0f64..100.0,
        pull in -100.0f64..100.0,
    ) {
        let x = Variable::new("x");
        let mut solver = Solver::new();
        solver.add_constraint(eq(&x, target, Strength::MEDIUM)).unwrap();
        let before = solver.solve();

        let strong = eq(&x, pull, Strength::STRONG);
        solver.add_constraint(strong.clone()).unwrap();
        solver.remove_constraint(&strong).unwrap();
        let after = solver.solve();

        prop_assert!((value(&before, &x) - value(&after, &x)).abs() < TOLERANCE);
    }
}
