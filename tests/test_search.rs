//! End-to-end search scenarios.

mod common;

use common::{brute_force_sat, lit, model_satisfies, solver_from};
use marchsat::{Config, LBool, Lookahead, SolverResult};

#[test]
fn test_trivial_sat() {
    let cnf = vec![vec![1, 2]];
    let mut solver = solver_from(&cnf, 2);
    assert_eq!(solver.search().unwrap(), SolverResult::Sat);
    // 1 must be known true or 2 known true; no known value may be wrong
    assert!(model_satisfies(&solver, &cnf));
}

#[test]
fn test_unit_chain_needs_no_decisions() {
    let cnf = vec![vec![1], vec![-1, 2], vec![-2, 3]];
    let mut solver = solver_from(&cnf, 3);
    assert_eq!(solver.search().unwrap(), SolverResult::Sat);
    assert_eq!(solver.model().value(0), LBool::True);
    assert_eq!(solver.model().value(1), LBool::True);
    assert_eq!(solver.model().value(2), LBool::True);
    assert_eq!(solver.stats().decisions, 0);
}

#[test]
fn test_pigeonhole_two_into_one_unsat() {
    let cnf = vec![vec![1, 2], vec![-1, -2], vec![1, -2], vec![-1, 2]];
    let mut solver = solver_from(&cnf, 2);
    assert_eq!(solver.search().unwrap(), SolverResult::Unsat);
}

#[test]
fn test_pigeonhole_three_into_two_unsat() {
    // pigeon p in hole h is variable 2*(p-1) + h; pigeons 1..3, holes 1..2
    let mut cnf = vec![vec![1, 2], vec![3, 4], vec![5, 6]];
    for h in 1..=2i32 {
        for p in 1..=3i32 {
            for q in (p + 1)..=3i32 {
                cnf.push(vec![-(2 * (p - 1) + h), -(2 * (q - 1) + h)]);
            }
        }
    }
    let mut solver = solver_from(&cnf, 6);
    assert_eq!(solver.search().unwrap(), SolverResult::Unsat);
}

#[test]
fn test_empty_formula_is_sat() {
    let mut solver = solver_from(&[], 0);
    assert_eq!(solver.search().unwrap(), SolverResult::Sat);
}

#[test]
fn test_empty_clause_is_unsat() {
    let mut solver = solver_from(&[], 2);
    solver.add_clause(&[]);
    assert_eq!(solver.search().unwrap(), SolverResult::Unsat);
}

#[test]
fn test_conflicting_units_unsat() {
    let cnf = vec![vec![1], vec![-1]];
    let mut solver = solver_from(&cnf, 1);
    assert_eq!(solver.search().unwrap(), SolverResult::Unsat);
}

#[test]
fn test_search_is_memoryless_across_invocations() {
    let cnf = vec![vec![1, 2, 3], vec![-1, -2, -3], vec![1, -2, 3]];
    let mut solver = solver_from(&cnf, 3);
    let first = solver.search().unwrap();
    let second = solver.search().unwrap();
    assert_eq!(first, SolverResult::Sat);
    assert_eq!(first, second);
    assert!(model_satisfies(&solver, &cnf));
}

#[test]
fn test_fixed_formulas_match_brute_force() {
    let formulas: Vec<Vec<Vec<i32>>> = vec![
        vec![vec![1, 2, 3], vec![-1, -2], vec![-1, -3], vec![-2, -3], vec![1]],
        vec![vec![1, 2], vec![2, 3], vec![3, 4], vec![-1, -3], vec![-2, -4]],
        vec![
            vec![1, 2, 3],
            vec![1, 2, -3],
            vec![1, -2, 3],
            vec![1, -2, -3],
            vec![-1, 2, 3],
            vec![-1, 2, -3],
            vec![-1, -2, 3],
            vec![-1, -2, -3],
        ],
        vec![vec![1, 2, 3, 4], vec![-1, -2, -3, -4], vec![1, -2], vec![3, -4]],
        vec![
            vec![1, -2],
            vec![2, -3],
            vec![3, -4],
            vec![4, -5],
            vec![5, -1],
            vec![1, 2, 3, 4, 5],
        ],
    ];
    for (i, cnf) in formulas.iter().enumerate() {
        let nvars = cnf
            .iter()
            .flat_map(|c| c.iter().map(|x| x.unsigned_abs()))
            .max()
            .unwrap();
        let mut solver = solver_from(cnf, nvars);
        let expected = brute_force_sat(cnf, nvars);
        let got = solver.search().unwrap();
        assert_eq!(
            got == SolverResult::Sat,
            expected,
            "formula {i} disagreed with brute force"
        );
        if got == SolverResult::Sat {
            assert!(model_satisfies(&solver, cnf), "formula {i} model is wrong");
        }
    }
}

#[test]
fn test_cancellation_surfaces_at_checkpoint() {
    let cnf = vec![vec![1, 2, 3], vec![-1, -2, -3]];
    let mut solver = solver_from(&cnf, 3);
    solver.resources().cancel();
    assert_eq!(solver.search(), Err(marchsat::SolverError::Canceled));
    // the solver stays usable once the request is cleared
    solver.resources().reset_cancel();
    assert_eq!(solver.search().unwrap(), SolverResult::Sat);
}

#[test]
fn test_memory_ceiling_surfaces_at_checkpoint() {
    let cnf = vec![vec![1, 2, 3], vec![-1, -2, -3]];
    let mut solver = solver_from(&cnf, 3);
    solver.resources_mut().set_max_memory(1);
    let err = solver.search().unwrap_err();
    assert!(matches!(
        err,
        marchsat::SolverError::OutOfMemory { limit: 1, .. }
    ));
}

#[test]
fn test_eliminated_variables_stay_out_of_the_model() {
    let cnf = vec![vec![1, 2, 3]];
    let mut solver = solver_from(&cnf, 4);
    solver.set_eliminated(3, true);
    assert_eq!(solver.search().unwrap(), SolverResult::Sat);
    assert_eq!(solver.model().value(3), LBool::Undef);
}

#[test]
fn test_seed_changes_are_still_sound() {
    let cnf = vec![
        vec![1, 2, 3],
        vec![-1, 2, -3],
        vec![1, -2, 4],
        vec![-4, 5],
        vec![-5, -1, 3],
    ];
    for seed in [0u64, 1, 7, 1234] {
        let mut config = Config::default();
        config.seed = seed;
        let mut solver = Lookahead::new(config);
        for _ in 0..5 {
            solver.new_var();
        }
        for clause in &cnf {
            let lits: Vec<marchsat::Lit> = clause.iter().map(|&x| lit(x)).collect();
            solver.add_clause(&lits);
        }
        assert_eq!(solver.search().unwrap(), SolverResult::Sat);
        assert!(model_satisfies(&solver, &cnf));
    }
}
