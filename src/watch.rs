//! Watch lists.
//!
//! Every literal owns a watch list indexed by the literal itself; an entry
//! in `watches[l]` belongs to a clause containing `¬l` and fires when `l`
//! becomes true. Binary clauses never appear here; they are propagated
//! straight from the adjacency lists, so the tag set is ternary, n-ary
//! clause and extension constraint only.

use crate::clause::ClauseOffset;
use crate::literal::Lit;

/// A watch list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Watched {
    /// Ternary clause; the two literals other than the negation of the
    /// watching literal.
    Ternary(Lit, Lit),
    /// N-ary clause with a blocking literal for the fast satisfied check.
    Clause(Lit, ClauseOffset),
    /// Extension constraint, identified by an extension-local index.
    Ext(u32),
}

/// A single literal's watch list.
pub type WatchList = Vec<Watched>;

/// Remove the ternary watch `{l1, l2}` from a watch list.
///
/// Panics if the watch is absent; a missing watch means the watch lists
/// are corrupted.
pub fn erase_ternary_watch(wlist: &mut WatchList, l1: Lit, l2: Lit) {
    let pos = wlist
        .iter()
        .position(|w| matches!(*w, Watched::Ternary(a, b) if (a == l1 && b == l2) || (a == l2 && b == l1)))
        .expect("ternary watch missing");
    wlist.remove(pos);
}

/// Remove the clause watch for `off` from a watch list.
///
/// Panics if the watch is absent; a missing watch means the watch lists
/// are corrupted.
pub fn erase_clause_watch(wlist: &mut WatchList, off: ClauseOffset) {
    let pos = wlist
        .iter()
        .position(|w| matches!(*w, Watched::Clause(_, o) if o == off))
        .expect("clause watch missing");
    wlist.remove(pos);
}
