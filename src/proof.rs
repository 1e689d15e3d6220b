//! Proof emission.
//!
//! The solver does not produce certificates itself; when enabled it
//! forwards derived clauses to an opaque, append-only sink. Each record
//! emitted while searching is prefixed with the negations of the current
//! decisions, so the sink receives clauses valid for the input formula.

use crate::literal::Lit;

/// Append-only consumer of derived clause records.
pub trait ProofSink {
    /// A clause was derived; `lits` is the full literal sequence.
    fn add_clause(&mut self, lits: &[Lit]);

    /// A clause was deleted. Provided for the record format; this core
    /// currently emits additions only.
    fn delete_clause(&mut self, _lits: &[Lit]) {}
}

/// Sink that collects every added clause. Intended for tests and
/// debugging.
#[derive(Debug, Default)]
pub struct ClauseRecorder {
    /// All added clauses in emission order.
    pub added: Vec<Vec<Lit>>,
}

impl ProofSink for ClauseRecorder {
    fn add_clause(&mut self, lits: &[Lit]) {
        self.added.push(lits.to_vec());
    }
}
