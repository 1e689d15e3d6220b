//! marchsat - a lookahead SAT solver core in the March / sat11 tradition.
//!
//! This crate decides satisfiability of CNF formulas with a lookahead
//! search rather than clause learning: candidate variables are ranked by
//! an iterated clause-weight heuristic, probed by speculative unit
//! propagation, and the probe results (failed literals, windfall
//! binaries, autarkies, equivalences) strengthen the formula before each
//! decision. Strongly connected components of the binary implication
//! graph collapse equivalent literals and order the probes.
//!
//! The solver is a library without a command line surface, single
//! threaded, and memoryless across invocations: every operation rebuilds
//! its working state from the loaded clauses.
//!
//! # Examples
//!
//! ```
//! use marchsat::{Config, LBool, Lookahead, SolverResult};
//!
//! let mut solver = Lookahead::new(Config::default());
//! let x = solver.new_var();
//! let y = solver.new_var();
//! solver.add_clause(&[marchsat::Lit::positive(x)]);
//! solver.add_clause(&[marchsat::Lit::negative(x), marchsat::Lit::positive(y)]);
//!
//! assert_eq!(solver.search().unwrap(), SolverResult::Sat);
//! assert_eq!(solver.model().value(x), LBool::True);
//! assert_eq!(solver.model().value(y), LBool::True);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod clause;
pub mod config;
pub mod error;
pub mod extension;
pub mod literal;
pub mod model;
pub mod proof;
pub mod resource;
pub mod varset;
pub mod watch;

mod binary;
mod probe;
mod propagate;
mod scc;
mod select;
mod solver;

pub use clause::{Clause, ClauseAllocator, ClauseOffset, Ternary};
pub use config::Config;
pub use error::{Result, SolverError};
pub use extension::{ExtOutcome, Extension};
pub use literal::{LBool, Lit, Var};
pub use model::Model;
pub use proof::{ClauseRecorder, ProofSink};
pub use resource::ResourceManager;
pub use solver::{Equivalence, Lookahead, SolverResult, Stats};
