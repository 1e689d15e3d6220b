//! Lookahead probes.
//!
//! Every entry of the lookahead table is probed at its own even level
//! above a moving base. A failed probe fixes the complement permanently;
//! a successful probe turns the literals it forced (the windfall stack)
//! into permanent binary clauses and, when nothing was reduced, runs the
//! autarky check, which can promote the probe to a permanent assignment
//! or record an equivalence with its parent in the lookahead forest.
//!
//! Probes whose accumulated score crosses an adaptive trigger are
//! re-examined by a nested double lookahead at a higher sentinel level.

use crate::literal::Lit;
use crate::solver::{Lookahead, Mode, C_FIXED_TRUTH};
use crate::error::Result;
use tracing::{debug, info, trace};

/// Combine the two polarities' scores; monotone and symmetric.
fn mix_diff(l: f64, r: f64) -> f64 {
    l + r + 1024.0 * l * r
}

impl Lookahead {
    fn get_wnb(&self, l: Lit) -> f64 {
        self.lits[l.index()].wnb
    }

    fn set_wnb(&mut self, l: Lit, f: f64) {
        self.lits[l.index()].wnb = f;
    }

    fn inc_wnb(&mut self, l: Lit, f: f64) {
        self.lits[l.index()].wnb += f;
    }

    fn dl_enabled(&self, l: Lit) -> bool {
        self.lits[l.index()].double_lookahead != self.istamp_id
    }

    fn dl_disable(&mut self, l: Lit) {
        self.lits[l.index()].double_lookahead = self.istamp_id;
    }

    fn dl_no_overflow(&self, base: u32) -> bool {
        u64::from(base)
            + 2 * self.lookahead.len() as u64 * (u64::from(self.config.dl_max_iterations) + 1)
            < u64::from(C_FIXED_TRUTH)
    }

    // ------------------------------------
    // lookahead windows
    //
    // A window marks the trail and queue head; closing it unassigns
    // everything probed since. The marks live on their own stack so the
    // search scopes stay balanced.

    pub(crate) fn init_wnb(&mut self) {
        self.wnb_marks.push((self.trail.len(), self.qhead));
    }

    pub(crate) fn reset_wnb(&mut self) {
        let (trail_sz, qhead) = self
            .wnb_marks
            .pop()
            .expect("lookahead window closed without open");
        self.qhead = qhead;
        for i in trail_sz..self.trail.len() {
            let l = self.trail[i];
            self.set_undef(l);
        }
        self.trail.truncate(trail_sz);
    }

    /// Reset the per-probe score and seed the literal's accumulated score
    /// from its forest parent.
    fn seed_wnb(&mut self, l: Lit) {
        self.weighted_new_binaries = 0.0;
        let p = self.get_parent(l);
        let seed = if p.is_null() { 0.0 } else { self.get_wnb(p) };
        self.set_wnb(l, seed);
    }

    // ------------------------------------
    // push and pop of probes

    pub(crate) fn push_lookahead1(&mut self, lit: Lit, level: u32) {
        debug_assert_eq!(self.mode, Mode::Searching);
        self.mode = Mode::Lookahead1;
        let saved = self.level;
        self.level = level;
        self.assign(lit);
        self.propagate();
        self.level = saved;
    }

    /// Leave a probe; on success the windfall stack becomes permanent
    /// binaries of the probe's complement.
    pub(crate) fn pop_lookahead1(&mut self, lit: Lit) {
        let unsat = self.inconsistent;
        debug_assert_eq!(self.mode, Mode::Lookahead1);
        self.inconsistent = false;
        self.mode = Mode::Searching;
        if !unsat {
            let nlit = lit.negate();
            for i in 0..self.wstack.len() {
                let l2 = self.wstack[i];
                trace!(probe = %lit, windfall = %l2, "windfall binary");
                self.add_binary(nlit, l2);
            }
            self.stats.windfall_binaries += self.wstack.len() as u64;
        }
        self.wstack.clear();
    }

    /// Nested probe used by double lookahead; returns whether it failed.
    fn push_lookahead2(&mut self, lit: Lit, level: u32) -> bool {
        debug_assert_eq!(self.mode, Mode::Lookahead1);
        let saved = self.level;
        self.level = level;
        self.mode = Mode::Lookahead2;
        self.assign(lit);
        self.propagate();
        let unsat = self.inconsistent;
        self.mode = Mode::Lookahead1;
        self.inconsistent = false;
        self.level = saved;
        unsat
    }

    // ------------------------------------
    // the probe loop

    /// Probe every lookahead table entry, accumulating weighted-new-binary
    /// scores, until no probe fails anymore.
    pub(crate) fn compute_wnb(&mut self) -> Result<()> {
        self.init_wnb();
        let mut base = 2u32;
        let mut change = true;
        let mut first = true;
        while change && !self.inconsistent {
            change = false;
            let mut i = 0;
            while i < self.lookahead.len() && !self.inconsistent {
                if let Err(e) = self.checkpoint() {
                    self.reset_wnb();
                    return Err(e);
                }
                let lit = self.lookahead[i].lit;
                let offset = self.lookahead[i].offset;
                i += 1;
                if self.is_fixed_at(lit, C_FIXED_TRUTH) {
                    continue;
                }
                // double lookahead can push the base close to the fixed
                // sentinel; levels at or above it are not representable
                let wide = u64::from(base) + u64::from(offset);
                if wide >= u64::from(C_FIXED_TRUTH) {
                    break;
                }
                let level = wide as u32;
                if self.stamp[lit.var() as usize] >= level {
                    continue;
                }
                trace!(probe = %lit, offset, "lookahead");
                self.seed_wnb(lit);
                self.push_lookahead1(lit, level);
                if !first {
                    self.do_double(lit, &mut base);
                }
                let unsat = self.inconsistent;
                self.pop_lookahead1(lit);
                if unsat {
                    info!(unit = %lit.negate(), "failed literal");
                    self.reset_wnb();
                    self.assign(lit.negate());
                    self.propagate();
                    self.init_wnb();
                    change = true;
                } else {
                    self.update_wnb(lit);
                }
                debug_assert!(self.inconsistent || !self.is_unsat());
            }
            if u64::from(C_FIXED_TRUTH) < u64::from(base) + 2 * self.lookahead.len() as u64 {
                break;
            }
            if first && !change {
                first = false;
                change = true;
            }
            self.reset_wnb();
            self.init_wnb();
        }
        self.reset_wnb();
        Ok(())
    }

    // ------------------------------------
    // autarky and equivalences

    /// A probe that reduced nothing may be an autarky: every clause it
    /// touches must already contain a true literal, and no binary
    /// implication may still be pending.
    fn check_autarky(&self, l: Lit) -> bool {
        if !self.config.autarky {
            return false;
        }
        for &off in &self.full_watches[l.index()] {
            let c = self.allocator.get(off);
            if !c.iter().any(|&x| self.is_true(x)) {
                debug!(probe = %l, "autarky rejected by unsatisfied clause");
                return false;
            }
        }
        // a pending binary consequence could reduce clauses transitively
        for &l2 in &self.binary[l.index()] {
            if self.is_true(l2) {
                continue;
            }
            debug_assert!(!self.is_false(l2));
            return false;
        }
        true
    }

    fn update_wnb(&mut self, l: Lit) {
        if self.weighted_new_binaries == 0.0 {
            if !self.check_autarky(l) {
                // neither autarky nor equivalence applies
            } else if self.get_wnb(l) == 0.0 {
                self.stats.autarky_propagations += 1;
                info!(lit = %l, "autarky");
                self.reset_wnb();
                self.assign(l);
                self.propagate();
                self.init_wnb();
            } else {
                self.stats.autarky_equivalences += 1;
                // l => p is known; any consequence of l that is not a
                // consequence of p reduces nothing, so p => l is sound
                let p = self.get_parent(l);
                debug_assert!(!p.is_null());
                if !p.is_null() && self.stamp[p.var() as usize] > self.stamp[l.var() as usize] {
                    info!(lit = %l, parent = %p, "lookahead equivalence");
                    self.add_binary(l.negate(), p);
                    self.lift_level(l, p);
                }
            }
        } else {
            let delta = self.weighted_new_binaries;
            self.inc_wnb(l, delta);
        }
    }

    // ------------------------------------
    // double lookahead

    fn do_double(&mut self, l: Lit, base: &mut u32) {
        if self.inconsistent || self.scope_lvl() == 0 || !self.dl_enabled(l) {
            return;
        }
        if self.get_wnb(l) > self.delta_trigger {
            if self.dl_no_overflow(*base) {
                self.stats.double_lookahead_rounds += 1;
                self.double_look(l, base);
                self.delta_trigger = self.get_wnb(l);
                self.dl_disable(l);
            }
        } else {
            self.delta_trigger *= self.config.delta_rho;
        }
    }

    /// Probe `l` once more at a dedicated sentinel level and run
    /// lookahead2 probes under it; failed inner probes promote their
    /// complements to the sentinel level.
    fn double_look(&mut self, l: Lit, base: &mut u32) {
        debug_assert!(!self.inconsistent);
        debug_assert!(self.dl_no_overflow(*base));
        let dl_truth: u32 =
            *base + 2 * self.lookahead.len() as u32 * (self.config.dl_max_iterations + 1);
        let saved = self.level;
        self.level = dl_truth;
        debug!(lit = %l, dl_truth, "double lookahead");
        self.init_wnb();
        self.assign(l);
        self.propagate();
        let mut change = true;
        let mut num_iterations = 0;
        while change && num_iterations < self.config.dl_max_iterations && !self.inconsistent {
            change = false;
            num_iterations += 1;
            *base += 2 * self.lookahead.len() as u32;
            let mut i = 0;
            while i < self.lookahead.len() && !self.inconsistent {
                let lit = self.lookahead[i].lit;
                let offset = self.lookahead[i].offset;
                i += 1;
                if self.is_fixed_at(lit, dl_truth) {
                    continue;
                }
                if self.push_lookahead2(lit, *base + offset) {
                    info!(unit = %lit.negate(), "double lookahead unit");
                    self.stats.double_lookahead_propagations += 1;
                    debug_assert_eq!(self.level, dl_truth);
                    self.reset_wnb();
                    self.assign(lit.negate());
                    self.propagate();
                    change = true;
                    self.init_wnb();
                }
            }
            debug_assert!(u64::from(dl_truth) >= u64::from(*base) + 2 * self.lookahead.len() as u64);
        }
        self.reset_wnb();
        debug_assert_eq!(self.level, dl_truth);
        *base = dl_truth;
        self.level = saved;
    }

    // ------------------------------------
    // decision selection

    /// Pick the table literal with the best combined score of both
    /// polarities, breaking ties uniformly at random; the chosen polarity
    /// is the more constrained side.
    pub(crate) fn select_literal(&mut self) -> Lit {
        let mut l = Lit::NULL;
        let mut h = 0.0;
        let mut count = 1u32;
        for i in 0..self.lookahead.len() {
            let lit = self.lookahead[i].lit;
            if lit.is_negative() || !self.is_undef(lit) {
                continue;
            }
            let diff1 = self.get_wnb(lit);
            let diff2 = self.get_wnb(lit.negate());
            let mixd = mix_diff(diff1, diff2);

            if mixd == h {
                count += 1;
            }
            if mixd > h || (mixd == h && self.rng.below(count) == 0) {
                if mixd > h {
                    count = 1;
                }
                h = mixd;
                l = if diff1 < diff2 { lit } else { lit.negate() };
            }
        }
        trace!(selected = %l, "select literal");
        l
    }
}

#[cfg(test)]
mod tests {
    use super::mix_diff;
    use crate::solver::test_util::{lit, solver_from};
    use crate::solver::C_FIXED_TRUTH;

    #[test]
    fn test_mix_diff_monotone_symmetric() {
        assert_eq!(mix_diff(2.0, 3.0), mix_diff(3.0, 2.0));
        assert!(mix_diff(2.0, 3.0) > mix_diff(2.0, 2.5));
        assert!(mix_diff(2.0, 3.0) > mix_diff(1.5, 3.0));
        assert_eq!(mix_diff(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_windfalls_become_permanent_binaries() {
        // probing 5 assigns -6 through the binary (-5 | -6); the ternary
        // clauses (-5 | 2 | 6) and (-5 | 3 | 6) then force 2 and 3, which
        // are the windfalls of the probe
        let mut s = solver_from(&[&[-5, -6], &[-5, 2, 6], &[-5, 3, 6], &[1, 4, 6]], 6);
        s.init();
        assert!(!s.inconsistent);
        s.pre_select();
        assert!(!s.lookahead.is_empty());

        s.init_wnb();
        s.seed_wnb(lit(5));
        s.push_lookahead1(lit(5), 2 + 2 * s.lookahead.len() as u32);
        assert!(!s.inconsistent);
        assert_eq!(s.wstack, vec![lit(2), lit(3)]);
        s.pop_lookahead1(lit(5));
        s.reset_wnb();

        assert!(s.binary[lit(5).index()].contains(&lit(2)));
        assert!(s.binary[lit(5).index()].contains(&lit(3)));
        assert!(s.binary[lit(-2).index()].contains(&lit(-5)));

        // a fresh probe at a higher level re-derives both through binary
        // propagation alone, with no new windfalls
        s.init_wnb();
        s.push_lookahead1(lit(5), C_FIXED_TRUTH - 2);
        assert!(!s.inconsistent);
        assert!(s.is_true_at(lit(2), C_FIXED_TRUTH - 2));
        assert!(s.is_true_at(lit(3), C_FIXED_TRUTH - 2));
        assert!(s.wstack.is_empty());
        s.pop_lookahead1(lit(5));
        s.reset_wnb();
    }

    #[test]
    fn test_failed_probe_windfalls_are_dropped() {
        let mut s = solver_from(&[&[-5, 2, 6], &[-6, -5]], 6);
        s.init();
        s.pre_select();
        s.init_wnb();
        s.push_lookahead1(lit(5), 2);
        // force a conflict under the probe
        s.set_conflict();
        let binaries = s.stats.add_binary;
        s.pop_lookahead1(lit(5));
        assert_eq!(s.stats.add_binary, binaries);
        assert!(s.wstack.is_empty());
        s.reset_wnb();
    }

    #[test]
    fn test_autarky_disabled_by_config() {
        let mut s = solver_from(&[&[1, 2, 3], &[1, -2, 4]], 4);
        s.config.autarky = false;
        s.init();
        assert!(!s.check_autarky(lit(1)));
    }

    #[test]
    fn test_autarky_check_accepts_untouched_literal() {
        let mut s = solver_from(&[&[1, 2, 3], &[1, -2, 4]], 4);
        s.init();
        // no clause contains -1 and 1 has no binary implications
        assert!(s.check_autarky(lit(1)));
        // clauses contain -2, none satisfied yet
        assert!(!s.check_autarky(lit(2)));
    }

    #[test]
    fn test_wnb_window_restores_trail() {
        let mut s = solver_from(&[&[1, 2, 3], &[-1, 2, 4]], 4);
        s.init();
        s.pre_select();
        let trail = s.trail.len();
        let qhead = s.qhead;
        s.init_wnb();
        s.push_lookahead1(lit(1), 2);
        s.pop_lookahead1(lit(1));
        s.reset_wnb();
        assert_eq!(s.trail.len(), trail);
        assert_eq!(s.qhead, qhead);
        assert!(s.is_undef(lit(1)));
    }
}
