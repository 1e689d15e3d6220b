//! Extension constraint interface.
//!
//! Cardinality, XOR and pseudo-Boolean layers plug into propagation
//! through this narrow callback. The extension registers watches via
//! [`crate::Lookahead::watch_ext`]; when a watched literal becomes true
//! the engine invokes [`Extension::propagate`] and applies the outcome:
//! implied literals are assigned, a conflict raises the inconsistent
//! flag, and a cleared keep flag drops the watch.

use crate::literal::Lit;
use smallvec::SmallVec;

/// Outcome buffer filled by [`Extension::propagate`].
#[derive(Debug)]
pub struct ExtOutcome {
    /// Literals implied under the triggering assignment.
    pub implied: SmallVec<[Lit; 4]>,
    /// The extension found its constraint falsified.
    pub conflict: bool,
    /// Keep the watch after this call.
    pub keep: bool,
}

impl ExtOutcome {
    pub(crate) fn new() -> Self {
        Self {
            implied: SmallVec::new(),
            conflict: false,
            keep: true,
        }
    }
}

/// A theory extension invoked synchronously from propagation.
pub trait Extension {
    /// `lit` became true and the extension watch `ext_idx` fired.
    fn propagate(&mut self, lit: Lit, ext_idx: u32, out: &mut ExtOutcome);

    /// Justify an implied literal for the enclosing solver: push the
    /// antecedent literals of `lit` under constraint `ext_idx` into `out`.
    fn get_antecedents(&mut self, lit: Lit, ext_idx: u32, out: &mut Vec<Lit>);
}
