//! Strongly connected components of the binary implication graph.
//!
//! Candidate literals are stamped, arcs are laid opposite to implication
//! (an implication `l => u` contributes the arc `u -> l` and its
//! contrapositive), and an iterative Tarjan traversal groups the literals
//! into equivalence classes. A class containing a literal and its
//! complement makes the formula unsatisfiable. Classes are then given
//! heights in topological order and threaded into a forest whose preorder
//! yields the lookahead table with even offsets.

use crate::literal::Lit;
use crate::solver::{Lookahead, LookaheadEntry};
use tracing::trace;

/// Tarjan bookkeeping per literal.
///
/// A rank of zero means unvisited and [`u32::MAX`] settled. After the
/// traversal the `min` field is reused to thread forest children.
#[derive(Debug, Clone)]
pub(crate) struct DfsInfo {
    pub rank: u32,
    pub height: u32,
    pub parent: Lit,
    pub link: Lit,
    pub min: Lit,
    /// Cursor into the literal's arc list.
    pub next: u32,
    pub vcomp: Lit,
}

impl Default for DfsInfo {
    fn default() -> Self {
        Self {
            rank: 0,
            height: 0,
            parent: Lit::NULL,
            link: Lit::NULL,
            min: Lit::NULL,
            next: 0,
            vcomp: Lit::NULL,
        }
    }
}

impl Lookahead {
    pub(crate) fn get_rank(&self, l: Lit) -> u32 {
        self.dfs[l.index()].rank
    }

    fn set_rank(&mut self, l: Lit, r: u32) {
        self.dfs[l.index()].rank = r;
    }

    pub(crate) fn get_parent(&self, l: Lit) -> Lit {
        self.dfs[l.index()].parent
    }

    pub(crate) fn set_parent(&mut self, l: Lit, p: Lit) {
        self.dfs[l.index()].parent = p;
    }

    fn get_link(&self, l: Lit) -> Lit {
        self.dfs[l.index()].link
    }

    fn set_link(&mut self, l: Lit, x: Lit) {
        self.dfs[l.index()].link = x;
    }

    fn get_min(&self, l: Lit) -> Lit {
        self.dfs[l.index()].min
    }

    fn set_min(&mut self, l: Lit, x: Lit) {
        self.dfs[l.index()].min = x;
    }

    fn get_height(&self, l: Lit) -> u32 {
        self.dfs[l.index()].height
    }

    fn set_height(&mut self, l: Lit, h: u32) {
        self.dfs[l.index()].height = h;
    }

    fn get_vcomp(&self, l: Lit) -> Lit {
        self.dfs[l.index()].vcomp
    }

    fn set_vcomp(&mut self, l: Lit, x: Lit) {
        self.dfs[l.index()].vcomp = x;
    }

    fn get_rating(&self, l: Lit) -> f64 {
        self.rating[l.var() as usize]
    }

    /// The forest child list head; the null literal addresses the root.
    fn get_child(&self, u: Lit) -> Lit {
        if u.is_null() {
            self.root_child
        } else {
            self.dfs[u.index()].min
        }
    }

    fn set_child(&mut self, v: Lit, u: Lit) {
        if v.is_null() {
            self.root_child = u;
        } else {
            self.dfs[v.index()].min = u;
        }
    }

    fn add_arc(&mut self, u: Lit, v: Lit) {
        self.arcs[u.index()].push(v);
    }

    fn has_arc(&self, u: Lit) -> bool {
        (self.dfs[u.index()].next as usize) < self.arcs[u.index()].len()
    }

    fn pop_arc(&mut self, u: Lit) -> Lit {
        let next = self.dfs[u.index()].next;
        self.dfs[u.index()].next = next + 1;
        self.arcs[u.index()][next as usize]
    }

    fn num_next(&self, u: Lit) -> usize {
        self.arcs[u.index()].len()
    }

    fn get_next(&self, u: Lit, i: usize) -> Lit {
        self.arcs[u.index()][i]
    }

    // ------------------------------------
    // traversal

    /// Run the SCC traversal over both polarities of every candidate.
    pub(crate) fn get_scc(&mut self) {
        let num_candidates = self.candidates.len();
        self.init_scc();
        for i in 0..num_candidates {
            if self.inconsistent {
                break;
            }
            let lit = Lit::positive(self.candidates[i].var);
            if self.get_rank(lit) == 0 {
                self.dfs_scc(lit);
            }
            if self.get_rank(lit.negate()) == 0 {
                self.dfs_scc(lit.negate());
            }
        }
    }

    fn init_scc(&mut self) {
        self.inc_bstamp();
        for i in 0..self.candidates.len() {
            let lit = Lit::positive(self.candidates[i].var);
            self.init_dfs_info(lit);
            self.init_dfs_info(lit.negate());
        }
        for i in 0..self.candidates.len() {
            let lit = Lit::positive(self.candidates[i].var);
            self.init_arcs(lit);
            self.init_arcs(lit.negate());
        }
        self.rank_counter = 0;
        self.active_scc = Lit::NULL;
        self.settled = Lit::NULL;
    }

    fn init_dfs_info(&mut self, l: Lit) {
        self.dfs[l.index()] = DfsInfo::default();
        self.arcs[l.index()].clear();
        self.set_bstamp(l);
    }

    /// Arcs run opposite to implication: `l => u` yields `u -> l` and
    /// `~l -> ~u`. The index comparison adds each binary only once.
    fn init_arcs(&mut self, l: Lit) {
        for i in 0..self.binary[l.index()].len() {
            let u = self.binary[l.index()][i];
            debug_assert_ne!(u, l);
            if u.index() > l.index() && self.is_stamped(u) {
                self.add_arc(l.negate(), u.negate());
                self.add_arc(u, l);
            }
        }
    }

    fn dfs_scc(&mut self, root: Lit) {
        let mut v = root;
        self.set_parent(v, Lit::NULL);
        self.activate_scc(v);
        loop {
            let ll = self.get_min(v);
            if self.has_arc(v) {
                let u = self.pop_arc(v);
                let r = self.get_rank(u);
                if r > 0 {
                    // u was visited before ll
                    if r < self.get_rank(ll) {
                        self.set_min(v, u);
                    }
                } else {
                    // descend into u
                    self.set_parent(u, v);
                    v = u;
                    self.activate_scc(v);
                }
            } else {
                let u = self.get_parent(v);
                if v == ll {
                    self.found_scc(v);
                } else {
                    let mu = self.get_min(u);
                    if self.get_rank(ll) < self.get_rank(mu) {
                        self.set_min(u, ll);
                    }
                }
                v = u;
            }
            if v.is_null() || self.inconsistent {
                break;
            }
        }
    }

    fn activate_scc(&mut self, l: Lit) {
        debug_assert_eq!(self.get_rank(l), 0);
        self.rank_counter += 1;
        let rank = self.rank_counter;
        self.set_rank(l, rank);
        let active = self.active_scc;
        self.set_link(l, active);
        self.set_min(l, l);
        self.active_scc = l;
    }

    /// Make `v` the root of its equivalence class, pick the highest-rated
    /// member as the class representative, and detect a complementary
    /// member, which is a contradiction.
    fn found_scc(&mut self, v: Lit) {
        let mut t = self.active_scc;
        self.active_scc = self.get_link(v);
        let mut best = v;
        let mut best_rating = self.get_rating(v);
        self.set_rank(v, u32::MAX);
        let settled = self.settled;
        self.set_link(v, settled);
        self.settled = t;
        while t != v {
            if t == v.negate() {
                trace!(lit = %v, "contradiction during scc search");
                self.set_conflict();
                break;
            }
            self.set_rank(t, u32::MAX);
            self.set_parent(t, v);
            let t_rating = self.get_rating(t);
            if t_rating > best_rating {
                best = t;
                best_rating = t_rating;
            }
            t = self.get_link(t);
        }
        self.set_parent(v, v);
        self.set_vcomp(v, best);
        if self.get_rank(v.negate()) == u32::MAX {
            let p = self.get_parent(v.negate());
            let vc = self.get_vcomp(p);
            self.set_vcomp(v, vc.negate());
        }
    }

    // ------------------------------------
    // lookahead forest

    /// Assign heights class by class along the settled list, which is
    /// topologically sorted with each class contiguous and its
    /// representative last, and thread every class under its highest
    /// predecessor to form a rooted forest.
    pub(crate) fn find_heights(&mut self) {
        self.root_child = Lit::NULL;
        let mut pp = Lit::NULL;
        let mut h = 0u32;
        let mut w = Lit::NULL;
        let mut u = self.settled;
        while !u.is_null() {
            let uu = self.get_link(u);
            let p = self.get_parent(u);
            if p != pp {
                // new equivalence class
                h = 0;
                w = Lit::NULL;
                pp = p;
            }
            let sz = self.num_next(u.negate());
            for j in 0..sz {
                let v = self.get_next(u.negate(), j).negate();
                let pv = self.get_parent(v);
                if pv == p {
                    continue;
                }
                let hh = self.get_height(pv);
                if hh >= h {
                    h = hh + 1;
                    w = pv;
                }
            }
            if p == u {
                // class representative, processed last
                let v = self.get_child(w);
                self.set_height(u, h);
                self.set_child(u, Lit::NULL);
                self.set_link(u, v);
                self.set_child(w, u);
            }
            u = uu;
        }
    }

    /// Depth-first preorder over the forest, assigning even offsets
    /// 0, 2, 4, ... and re-threading parents to class representatives.
    pub(crate) fn construct_lookahead_table(&mut self) {
        debug_assert!(self.lookahead.is_empty());
        let mut u = self.get_child(Lit::NULL);
        let mut v = Lit::NULL;
        let mut offset = 0u32;
        while !u.is_null() {
            self.set_rank(u, self.lookahead.len() as u32);
            let vc = self.get_vcomp(u);
            self.lookahead.push(LookaheadEntry { lit: vc, offset: 0 });
            if !self.get_child(u).is_null() {
                self.set_parent(u, v);
                v = u;
                u = self.get_child(u);
            } else {
                loop {
                    let r = self.get_rank(u) as usize;
                    self.lookahead[r].offset = offset;
                    offset += 2;
                    let pv = if v.is_null() { v } else { self.get_vcomp(v) };
                    self.set_parent(u, pv);
                    u = self.get_link(u);
                    if u.is_null() && !v.is_null() {
                        u = v;
                        v = self.get_parent(u);
                    } else {
                        break;
                    }
                }
            }
        }
        debug_assert_eq!(2 * self.lookahead.len(), offset as usize);
    }
}
