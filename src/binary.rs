//! Dynamic binary clauses, stamping epochs and branch prefixes.
//!
//! Binary clauses are not clause objects: a clause `(a | b)` lives as `b`
//! in the adjacency of `¬a` and `a` in the adjacency of `¬b`. Additions
//! are logged on the binary trail so a scope pop can delete them in
//! reverse order.
//!
//! `try_add_binary` performs hyper-binary resolution: before `(u | v)` is
//! recorded, the neighbourhoods of `¬u` and `¬v` are stamped and one step
//! of transitive closure is taken in both directions, which may collapse
//! the addition into a unit.
//!
//! Stamps are epoch ids rather than per-call cleared tables; a wrapped
//! epoch zeroes the table and bumps twice so no stale stamp survives.

use crate::literal::{Lit, Var};
use crate::solver::{Lookahead, Mode};
use smallvec::SmallVec;
use tracing::trace;

impl Lookahead {
    /// Record the binary clause `(l1 | l2)`.
    ///
    /// Tautologies are skipped, as is an addition that duplicates the most
    /// recent binary of `l1`.
    pub(crate) fn add_binary(&mut self, l1: Lit, l2: Lit) {
        trace!(l1 = %l1, l2 = %l2, "add binary");
        debug_assert_ne!(l1, l2);
        if l1.negate() == l2 {
            return;
        }
        let idx1 = l1.negate().index();
        if self.binary[idx1].last() == Some(&l2) {
            return;
        }
        self.binary[idx1].push(l2);
        self.binary[l2.negate().index()].push(l1);
        self.binary_trail.push(idx1 as u32);
        self.stats.add_binary += 1;
        if self.config.drat {
            self.validate_binary(l1, l2);
        }
    }

    /// Delete the most recent binary of the literal whose adjacency index
    /// is `idx`. Used only when unwinding the binary trail.
    pub(crate) fn del_binary(&mut self, idx: usize) {
        let l = self.binary[idx]
            .pop()
            .expect("binary adjacency out of sync with binary trail");
        let partner = self.binary[l.negate().index()]
            .pop()
            .expect("binary adjacency out of sync with binary trail");
        assert_eq!(
            partner,
            Lit::from_index(idx).negate(),
            "binary adjacency out of sync with binary trail"
        );
        self.stats.del_binary += 1;
    }

    fn validate_binary(&mut self, l1: Lit, l2: Lit) {
        if self.mode != Mode::Searching || self.proof.is_none() {
            return;
        }
        let mut cls: SmallVec<[Lit; 16]> = SmallVec::from_slice(&self.assumptions);
        cls.push(l1);
        cls.push(l2);
        if let Some(sink) = self.proof.as_mut() {
            sink.add_clause(&cls);
        }
    }

    // ------------------------------------
    // stamping epochs

    pub(crate) fn inc_bstamp(&mut self) {
        self.bstamp_id = self.bstamp_id.wrapping_add(1);
        if self.bstamp_id == 0 {
            self.bstamp_id = 1;
            self.bstamp.fill(0);
        }
    }

    pub(crate) fn inc_istamp(&mut self) {
        self.istamp_id = self.istamp_id.wrapping_add(1);
        if self.istamp_id == 0 {
            self.istamp_id = 1;
            for info in &mut self.lits {
                info.double_lookahead = 0;
            }
        }
    }

    pub(crate) fn set_bstamp(&mut self, l: Lit) {
        self.bstamp[l.index()] = self.bstamp_id;
    }

    pub(crate) fn is_stamped(&self, l: Lit) -> bool {
        self.bstamp[l.index()] == self.bstamp_id
    }

    /// Stamp `l` together with its binary consequences.
    pub(crate) fn set_bstamps(&mut self, l: Lit) {
        self.inc_bstamp();
        self.set_bstamp(l);
        for i in 0..self.binary[l.index()].len() {
            let w = self.binary[l.index()][i];
            self.set_bstamp(w);
        }
    }

    // ------------------------------------
    // hyper-binary resolution

    /// One step of transitive closure for the new binary `(u | v)`.
    ///
    /// Requires all implicants of `¬u` to be stamped. Returns `false` when
    /// a unit was learned instead.
    fn add_tc1(&mut self, u: Lit, v: Lit) -> bool {
        let sz = self.binary[v.index()].len();
        for i in 0..sz {
            let w = self.binary[v.index()][i];
            // ~v | w
            if !self.is_fixed(w) {
                if self.is_stamped(w.negate()) {
                    // u | v, ~v | w, u | ~w  =>  u
                    trace!(unit = %u, "tc1 unit");
                    self.assign(u);
                    return false;
                }
                if self.num_tc1 < self.config.tc1_limit {
                    self.num_tc1 += 1;
                    self.add_binary(u, w);
                }
            }
        }
        true
    }

    /// Add `(u | v)` dynamically, first trying to strengthen it to a unit
    /// through the stamped neighbourhoods of `¬u` and `¬v`.
    pub(crate) fn try_add_binary(&mut self, u: Lit, v: Lit) {
        debug_assert_eq!(self.mode, Mode::Searching);
        debug_assert_ne!(u.var(), v.var());
        self.set_bstamps(u.negate());
        if self.is_stamped(v.negate()) {
            // u | ~v and u | v
            self.assign(u);
        } else if !self.is_stamped(v) && self.add_tc1(u, v) {
            self.set_bstamps(v.negate());
            if self.is_stamped(u.negate()) {
                // v | ~u and u | v
                self.assign(v);
            } else if self.add_tc1(v, u) {
                self.update_prefix(u);
                self.update_prefix(v);
                self.add_binary(u, v);
            }
        }
    }

    // ------------------------------------
    // branch prefixes

    /// Flip the polarity bit of the current depth after a backtrack.
    pub(crate) fn flip_prefix(&mut self) {
        let d = self.trail_lim.len();
        if d < 64 {
            let mask = 1u64 << d;
            self.prefix = mask | (self.prefix & (mask - 1));
        }
    }

    /// Refresh a variable's prefix key when it participates in a new
    /// dynamic binary.
    pub(crate) fn update_prefix(&mut self, l: Lit) {
        let x = l.var() as usize;
        let p = self.vprefix[x].prefix;
        let len = self.vprefix[x].length;
        let mask = (1u64 << len.min(63)) - 1;
        if len as usize >= self.trail_lim.len() || (p & mask) != (self.prefix & mask) {
            self.vprefix[x].length = self.trail_lim.len() as u32;
            self.vprefix[x].prefix = self.prefix;
        }
    }

    /// Does the variable's stored prefix lie on the current branch?
    pub(crate) fn active_prefix(&self, x: Var) -> bool {
        let lvl = self.trail_lim.len() as u32;
        let p = self.vprefix[x as usize].prefix;
        let len = self.vprefix[x as usize].length;
        if len > lvl {
            return false;
        }
        if len == lvl || len >= 63 {
            return self.prefix == p;
        }
        let mask = (1u64 << len) - 1;
        (self.prefix & mask) == (p & mask)
    }
}

#[cfg(test)]
mod tests {
    use crate::solver::test_util::{lit, solver_from};
    use crate::solver::C_FIXED_TRUTH;

    #[test]
    fn test_add_binary_is_symmetric() {
        let mut s = solver_from(&[], 3);
        s.init();
        s.add_binary(lit(1), lit(2));
        assert!(s.binary[lit(-1).index()].contains(&lit(2)));
        assert!(s.binary[lit(-2).index()].contains(&lit(1)));
    }

    #[test]
    fn test_add_binary_skips_tautology_and_duplicate() {
        let mut s = solver_from(&[], 3);
        s.init();
        s.add_binary(lit(1), lit(-1));
        assert_eq!(s.stats.add_binary, 0);
        s.add_binary(lit(1), lit(2));
        s.add_binary(lit(1), lit(2));
        assert_eq!(s.stats.add_binary, 1);
        assert_eq!(s.binary[lit(-1).index()].len(), 1);
    }

    #[test]
    fn test_binary_additions_reversible() {
        let mut s = solver_from(&[&[1, 2, 3], &[4, 5, 6]], 6);
        s.init();
        let sizes: Vec<usize> = s.binary.iter().map(Vec::len).collect();
        s.push(lit(-1), C_FIXED_TRUTH);
        s.add_binary(lit(4), lit(5));
        s.add_binary(lit(5), lit(6));
        s.pop();
        let after: Vec<usize> = s.binary.iter().map(Vec::len).collect();
        assert_eq!(sizes, after);
    }

    #[test]
    fn test_bstamp_epoch_wrap() {
        let mut s = solver_from(&[], 2);
        s.init();
        s.set_bstamp(lit(1));
        assert!(s.is_stamped(lit(1)));
        s.bstamp_id = u32::MAX;
        s.inc_bstamp();
        assert_eq!(s.bstamp_id, 1);
        // the wrapped epoch must not see stale stamps
        assert!(!s.is_stamped(lit(2)));
    }

    #[test]
    fn test_istamp_epoch_wrap_resets_dl_marks() {
        let mut s = solver_from(&[], 2);
        s.init();
        s.istamp_id = u32::MAX;
        s.lits[lit(1).index()].double_lookahead = u32::MAX;
        s.inc_istamp();
        assert_eq!(s.istamp_id, 1);
        assert_eq!(s.lits[lit(1).index()].double_lookahead, 0);
    }

    #[test]
    fn test_try_add_binary_plain_addition() {
        let mut s = solver_from(&[&[-2, 3]], 3);
        s.init();
        s.try_add_binary(lit(-3), lit(2));
        assert!(!s.inconsistent);
        assert!(s.binary[lit(3).index()].contains(&lit(2)));
    }

    #[test]
    fn test_try_add_binary_derives_unit() {
        // (1 | -2) is known, so the stamped neighbourhood of -1 contains
        // -2; adding (1 | 2) resolves to the unit 1
        let mut s = solver_from(&[&[1, -2]], 2);
        s.init();
        s.try_add_binary(lit(1), lit(2));
        assert!(s.is_true(lit(1)));
    }

    #[test]
    fn test_prefix_flip_and_active() {
        let mut s = solver_from(&[&[1, 2, 3]], 3);
        s.init();
        assert!(s.active_prefix(0));
        s.flip_prefix();
        assert_eq!(s.prefix, 1);
        // a variable refreshed on this branch stays active
        s.update_prefix(lit(1));
        assert!(s.active_prefix(0));
    }
}
