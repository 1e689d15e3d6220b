//! Unit propagation.
//!
//! Fixed-point propagation over the trail with three clause
//! representations: binary implications from the adjacency lists, ternary
//! clauses held inline in watch lists, and n-ary clauses under the
//! two-watched-literal scheme with a blocking literal. For each trail
//! window, binary implications are exhausted before any ternary or n-ary
//! processing of the same window begins.
//!
//! What happens when a clause shrinks to two unassigned literals depends
//! on the propagation mode: while searching the clause is retired and the
//! pair becomes a dynamic binary; during the first lookahead step the pair
//! feeds the weighted-new-binaries score; during the second it is ignored.

use crate::extension::ExtOutcome;
use crate::literal::Lit;
use crate::solver::{Lookahead, Mode};
use crate::watch::Watched;
use tracing::{debug, trace};

impl Lookahead {
    /// Run propagation to fixpoint or first conflict.
    pub(crate) fn propagate(&mut self) {
        while !self.inconsistent && self.qhead < self.trail.len() {
            let sz = self.trail.len();
            let mut i = self.qhead;
            while i < sz && !self.inconsistent {
                let l = self.trail[i];
                self.propagate_binary(l);
                i += 1;
            }
            let mut i = self.qhead;
            while i < sz && !self.inconsistent {
                let l = self.trail[i];
                self.propagate_clauses(l);
                i += 1;
            }
            self.qhead = sz;
        }
        trace!(
            trail = self.trail.len(),
            inconsistent = self.inconsistent,
            "propagate fixpoint"
        );
    }

    fn propagate_binary(&mut self, l: Lit) {
        let sz = self.binary[l.index()].len();
        for i in 0..sz {
            if self.inconsistent {
                break;
            }
            let w = self.binary[l.index()][i];
            self.assign(w);
        }
    }

    /// Record a literal forced by a ternary or n-ary clause. During the
    /// first lookahead step forced literals are remembered as windfall
    /// candidates.
    pub(crate) fn propagated(&mut self, l: Lit) {
        self.assign(l);
        match self.mode {
            Mode::Searching | Mode::Lookahead2 => {}
            Mode::Lookahead1 => self.wstack.push(l),
        }
    }

    fn propagate_clauses(&mut self, l: Lit) {
        debug_assert!(self.is_true(l));
        if self.inconsistent {
            return;
        }
        let nl = l.negate();
        let mut wlist = std::mem::take(&mut self.watches[l.index()]);
        let end = wlist.len();
        let mut i = 0;
        let mut j = 0;
        while i < end && !self.inconsistent {
            let w = wlist[i];
            match w {
                Watched::Ternary(l1, l2) => {
                    let mut keep = true;
                    if self.is_fixed(l1) {
                        if self.is_false(l1) {
                            if self.is_undef(l2) {
                                self.propagated(l2);
                            } else if self.is_false(l2) {
                                trace!(l1 = %l1, l2 = %l2, on = %l, "ternary conflict");
                                self.set_conflict();
                            }
                        }
                        // l1 true: clause satisfied at this level
                    } else if self.is_fixed(l2) {
                        if self.is_false(l2) {
                            self.propagated(l1);
                        }
                    } else {
                        match self.mode {
                            Mode::Searching => {
                                self.detach_ternary(nl, l1, l2);
                                self.try_add_binary(l1, l2);
                                keep = false;
                            }
                            Mode::Lookahead1 => {
                                self.weighted_new_binaries +=
                                    self.h[self.heur][l1.index()] * self.h[self.heur][l2.index()];
                            }
                            Mode::Lookahead2 => {}
                        }
                    }
                    if keep {
                        wlist[j] = w;
                        j += 1;
                    }
                }
                Watched::Clause(blocker, off) => {
                    if self.is_true(blocker) {
                        wlist[j] = w;
                        j += 1;
                        i += 1;
                        continue;
                    }
                    {
                        let c = self.allocator.get_mut(off);
                        if c[0] == nl {
                            c.swap(0, 1);
                        }
                    }
                    let c0 = self.allocator.get(off)[0];
                    if self.is_true(c0) {
                        wlist[j] = Watched::Clause(c0, off);
                        j += 1;
                        i += 1;
                        continue;
                    }
                    let len = self.allocator.get(off).len();
                    let mut repl = None;
                    for k in 2..len {
                        let lk = self.allocator.get(off)[k];
                        if !self.is_false(lk) {
                            repl = Some(k);
                            break;
                        }
                    }
                    if let Some(k) = repl {
                        // move the watch to the replacement literal
                        let c1 = {
                            let c = self.allocator.get_mut(off);
                            let c1 = c[k];
                            c[k] = nl;
                            c[1] = c1;
                            c1
                        };
                        self.watches[c1.negate().index()].push(Watched::Clause(c0, off));
                        trace!(from = %l, to = %c1, "move watch");
                        let mut more = false;
                        for k2 in (k + 1)..len {
                            let lk = self.allocator.get(off)[k2];
                            if !self.is_false(lk) {
                                more = true;
                                break;
                            }
                        }
                        if !more && self.is_undef(c1) && self.is_undef(c0) {
                            // the clause shrank to a binary
                            trace!(c0 = %c0, c1 = %c1, "clause reduced to binary");
                            match self.mode {
                                Mode::Searching => {
                                    self.detach_clause(off);
                                    self.try_add_binary(c0, c1);
                                }
                                Mode::Lookahead1 => {
                                    self.weighted_new_binaries += self.h[self.heur][c0.index()]
                                        * self.h[self.heur][c1.index()];
                                }
                                Mode::Lookahead2 => {}
                            }
                        } else if more
                            && self.mode == Mode::Lookahead1
                            && self.weighted_new_binaries == 0.0
                        {
                            // the clause shrank without becoming binary;
                            // remember that something was reduced
                            let mut any_true = false;
                            for k2 in 2..len {
                                let lk = self.allocator.get(off)[k2];
                                if self.is_true(lk) {
                                    any_true = true;
                                    break;
                                }
                            }
                            if !any_true {
                                self.weighted_new_binaries = 0.001;
                            }
                        }
                        // the entry moved to another list and is dropped here
                    } else if self.is_false(c0) {
                        trace!(on = %l, "clause conflict");
                        self.set_conflict();
                        wlist[j] = w;
                        j += 1;
                    } else {
                        debug_assert!(self.is_undef(c0));
                        trace!(unit = %c0, on = %l, "unit propagation");
                        wlist[j] = w;
                        j += 1;
                        self.propagated(c0);
                    }
                }
                Watched::Ext(idx) => {
                    if self.ext_propagate(l, idx) {
                        wlist[j] = w;
                        j += 1;
                    }
                }
            }
            i += 1;
        }
        while i < end {
            wlist[j] = wlist[i];
            j += 1;
            i += 1;
        }
        wlist.truncate(j);
        let tail = std::mem::take(&mut self.watches[l.index()]);
        wlist.extend(tail);
        self.watches[l.index()] = wlist;
    }

    /// Invoke the extension for a fired watch; returns the keep flag.
    fn ext_propagate(&mut self, l: Lit, idx: u32) -> bool {
        let mut ext = match self.ext.take() {
            Some(ext) => ext,
            None => return true,
        };
        let mut out = ExtOutcome::new();
        ext.propagate(l, idx, &mut out);
        self.ext = Some(ext);
        debug!(
            lit = %l,
            ext_idx = idx,
            implied = out.implied.len(),
            conflict = out.conflict,
            "extension propagation"
        );
        for i in 0..out.implied.len() {
            self.assign(out.implied[i]);
        }
        if out.conflict {
            self.set_conflict();
        }
        out.keep
    }

    pub(crate) fn detach_ternary(&mut self, l1: Lit, l2: Lit, l3: Lit) {
        self.stats.del_ternary += 1;
        self.retired_ternary.push(crate::clause::Ternary::new(l1, l2, l3));
        // the watch of ~l1 is dropped by the caller's compaction
        crate::watch::erase_ternary_watch(&mut self.watches[l2.negate().index()], l1, l3);
        crate::watch::erase_ternary_watch(&mut self.watches[l3.negate().index()], l1, l2);
    }
}
