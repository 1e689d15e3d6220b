//! Candidate pre-selection and clause-weight scores.
//!
//! Before probing, the free variables are ranked by an iterated
//! clause-weight score: each literal's score combines the scores of its
//! binary consequences with products over the remaining pairs of its
//! reduced ternary and n-ary occurrences, renormalised each round so the
//! average stays put. A variable's rating is the product of the scores of
//! its two literals. The candidate set is trimmed to a per-level budget,
//! first by dropping below-mean ratings, then by heap selection.

use crate::literal::Lit;
use crate::solver::{Candidate, Lookahead};
use crate::watch::Watched;
use tracing::trace;

impl Lookahead {
    /// Build the lookahead table for the current level: select candidates,
    /// run SCC over the binary implication graph, assign heights and lay
    /// out the probe order.
    pub(crate) fn pre_select(&mut self) {
        self.lookahead.clear();
        if self.select(self.scope_lvl() as u32) {
            self.get_scc();
            if self.inconsistent {
                return;
            }
            self.find_heights();
            self.construct_lookahead_table();
        }
    }

    /// Gather and trim candidates. Returns `false` when there is nothing
    /// to decide, which with a consistent solver means the formula is
    /// satisfied.
    pub(crate) fn select(&mut self, level: u32) -> bool {
        self.init_pre_selection(level);
        let level_cand = self.config.level_cand.max(self.freevars.len() as u32 / 50);
        let max_num_cand = if level == 0 {
            self.freevars.len() as u32
        } else {
            level_cand / level
        };
        let max_num_cand = max_num_cand.max(self.config.min_cutoff) as usize;

        let mut sum = 0.0;
        for newbies in [false, true] {
            sum = self.init_candidates(newbies);
            if !self.candidates.is_empty() {
                break;
            }
            if self.is_sat() {
                return false;
            }
            // a restricted candidate set can be exhausted before the
            // formula is satisfied; there is nothing left to probe
            if !self.select_lookahead_vars.is_empty() {
                return false;
            }
        }
        if self.candidates.is_empty() {
            debug_assert!(self.is_sat());
            return false;
        }

        // step 1: drop below-mean candidates until close to the budget
        let mut progress = true;
        while progress && self.candidates.len() >= max_num_cand * 2 {
            progress = false;
            let mean = sum / (self.candidates.len() as f64 + 0.0001);
            sum = 0.0;
            let mut i = 0;
            while i < self.candidates.len() && self.candidates.len() >= max_num_cand * 2 {
                if self.candidates[i].rating >= mean {
                    sum += self.candidates[i].rating;
                    i += 1;
                } else {
                    self.candidates.swap_remove(i);
                    progress = true;
                }
            }
        }

        // step 2: sift the rest through a heap keyed by rating
        if self.candidates.len() > max_num_cand {
            let mut j = self.candidates.len() / 2;
            while j > 0 {
                j -= 1;
                self.sift_up(j);
            }
            loop {
                self.candidates[0] = self.candidates[self.candidates.len() - 1];
                self.candidates.pop();
                if self.candidates.len() == max_num_cand {
                    break;
                }
                self.sift_up(0);
            }
        }
        debug_assert!(!self.candidates.is_empty() && self.candidates.len() <= max_num_cand);
        true
    }

    /// Sift the candidate at `j` down a min-heap on rating, so repeated
    /// root removal keeps the highest-rated candidates.
    fn sift_up(&mut self, j: usize) {
        let mut i = j;
        let c = self.candidates[j];
        let mut k = 2 * j + 1;
        while k < self.candidates.len() {
            if k + 1 < self.candidates.len()
                && self.candidates[k].rating < self.candidates[k + 1].rating
            {
                k += 1;
            }
            if c.rating <= self.candidates[k].rating {
                break;
            }
            self.candidates[i] = self.candidates[k];
            i = k;
            k = 2 * k + 1;
        }
        if i > j {
            self.candidates[i] = c;
        }
    }

    fn init_candidates(&mut self, newbies: bool) -> f64 {
        self.candidates.clear();
        let mut sum = 0.0;
        for i in 0..self.freevars.len() {
            let x = self.freevars.at(i);
            debug_assert!(self.is_undef_var(x));
            if !self.select_lookahead_vars.is_empty() {
                if self.select_lookahead_vars.contains(&x) {
                    self.candidates.push(Candidate {
                        var: x,
                        rating: self.rating[x as usize],
                    });
                    sum += self.rating[x as usize];
                }
            } else if newbies || self.active_prefix(x) {
                self.candidates.push(Candidate {
                    var: x,
                    rating: self.rating[x as usize],
                });
                sum += self.rating[x as usize];
            }
        }
        trace!(sum, count = self.candidates.len(), "candidates");
        sum
    }

    // ------------------------------------
    // H-scores

    fn init_pre_selection(&mut self, level: u32) {
        let max_level = self.config.max_hlevel as usize;
        if level <= 1 {
            self.ensure_h(2);
            self.h_scores(0, 1);
            for _ in 0..2 {
                for i in 0..2 {
                    self.h_scores(i + 1, (i + 2) % 3);
                }
            }
            self.heur = 1;
        } else if (level as usize) < max_level {
            let level = level as usize;
            self.ensure_h(level);
            self.h_scores(level - 1, level);
            self.heur = level;
        } else {
            self.ensure_h(max_level);
            self.h_scores(max_level - 1, max_level);
            self.heur = max_level;
        }
    }

    /// Grow the score tables up to and including `level`. The base table
    /// starts every literal at one.
    fn ensure_h(&mut self, level: usize) {
        let width = 2 * self.num_vars as usize;
        while self.h.len() <= level {
            let fill = if self.h.is_empty() { 1.0 } else { 0.0 };
            self.h.push(vec![fill; width]);
        }
    }

    /// One refinement round: compute the table at `dst` from the table at
    /// `src` and refresh the variable ratings.
    fn h_scores(&mut self, src: usize, dst: usize) {
        debug_assert_ne!(src, dst);
        let mut sum = 0.0;
        for i in 0..self.freevars.len() {
            let l = Lit::positive(self.freevars.at(i));
            sum += self.h[src][l.index()] + self.h[src][l.negate().index()];
        }
        if sum == 0.0 {
            sum = 0.0001;
        }
        let factor = 2.0 * self.freevars.len() as f64 / sum;
        let sqfactor = factor * factor;
        let afactor = factor * self.config.alpha;
        let mut hp = std::mem::take(&mut self.h[dst]);
        for i in 0..self.freevars.len() {
            let x = self.freevars.at(i);
            let l = Lit::positive(x);
            let pos = self.l_score(l, src, sqfactor, afactor);
            let neg = self.l_score(l.negate(), src, sqfactor, afactor);
            hp[l.index()] = pos;
            hp[l.negate().index()] = neg;
            self.rating[x as usize] = pos * neg;
        }
        self.h[dst] = hp;
    }

    fn l_score(&self, l: Lit, src: usize, sqfactor: f64, afactor: f64) -> f64 {
        let h = &self.h[src];
        let mut sum = 0.0;
        for &w in &self.binary[l.index()] {
            if self.is_undef(w) {
                sum += h[w.index()];
            }
        }
        let mut tsum = 0.0;
        for w in &self.watches[l.index()] {
            match *w {
                Watched::Ternary(l1, l2) => {
                    tsum += h[l1.index()] * h[l2.index()];
                }
                Watched::Clause(_, off) => {
                    // approximation of the ternary case: take two other
                    // literals of the clause
                    let c = self.allocator.get(off);
                    if c[0] == l.negate() {
                        tsum += h[c[1].index()] * h[c[2].index()];
                    } else {
                        debug_assert_eq!(c[1], l.negate());
                        tsum += h[c[0].index()] * h[c[2].index()];
                    }
                }
                Watched::Ext(_) => {}
            }
        }
        (0.1 + afactor * sum + sqfactor * tsum).min(self.config.max_score)
    }

    // ------------------------------------
    // terminal checks

    /// Some clause is falsified outright.
    pub(crate) fn is_unsat(&self) -> bool {
        self.clauses.iter().any(|&off| {
            let c = self.allocator.get(off);
            c.iter().all(|&l| self.is_false(l))
        })
    }

    /// Every clause, including every binary touching a free variable, is
    /// satisfied.
    pub(crate) fn is_sat(&self) -> bool {
        for i in 0..self.freevars.len() {
            let x = self.freevars.at(i);
            for l in [Lit::positive(x), Lit::negative(x)] {
                if self.binary[l.index()].iter().any(|&w| !self.is_true(w)) {
                    return false;
                }
            }
        }
        self.clauses.iter().all(|&off| {
            let c = self.allocator.get(off);
            c.iter().any(|&l| self.is_true(l))
        })
    }
}
