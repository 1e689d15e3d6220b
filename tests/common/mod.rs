//! Shared helpers for the integration tests.
#![allow(dead_code)]

use marchsat::{Config, Lit, Lookahead};

/// Map a DIMACS-style literal (1-based, sign = polarity) to a [`Lit`].
pub fn lit(x: i32) -> Lit {
    assert_ne!(x, 0);
    if x > 0 {
        Lit::positive((x - 1) as u32)
    } else {
        Lit::negative((-x - 1) as u32)
    }
}

/// Build a solver over `nvars` variables from DIMACS-style clauses.
pub fn solver_from(cnf: &[Vec<i32>], nvars: u32) -> Lookahead {
    let mut solver = Lookahead::new(Config::default());
    for _ in 0..nvars {
        solver.new_var();
    }
    for clause in cnf {
        let lits: Vec<Lit> = clause.iter().map(|&x| lit(x)).collect();
        solver.add_clause(&lits);
    }
    solver
}

/// Reference satisfiability by exhaustive enumeration; only for small
/// variable counts.
pub fn brute_force_sat(cnf: &[Vec<i32>], nvars: u32) -> bool {
    assert!(nvars <= 20);
    'outer: for bits in 0u32..(1 << nvars) {
        for clause in cnf {
            let satisfied = clause.iter().any(|&x| {
                let v = x.unsigned_abs() - 1;
                let positive = x > 0;
                ((bits >> v) & 1 == 1) == positive
            });
            if !satisfied {
                continue 'outer;
            }
        }
        return true;
    }
    false
}

/// Check a model against the clauses: every clause must contain a literal
/// the model makes true.
pub fn model_satisfies(solver: &Lookahead, cnf: &[Vec<i32>]) -> bool {
    use marchsat::LBool;
    cnf.iter().all(|clause| {
        clause.iter().any(|&x| {
            let value = solver.model().value((x.unsigned_abs() - 1) as u32);
            if x > 0 {
                value == LBool::True
            } else {
                value == LBool::False
            }
        })
    })
}
