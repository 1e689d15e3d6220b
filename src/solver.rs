//! Lookahead SAT solver in the style of March.
//!
//! The solver decides satisfiability of a CNF formula by combining
//! heuristic pre-selection of candidate variables, unit propagation over
//! specialised binary/ternary/n-ary clause representations, one- and
//! two-step lookahead probes ranked by a weighted count of new binary
//! clauses, strongly-connected-component analysis of the binary
//! implication graph, and autarky detection.
//!
//! Truth is tracked with level stamps rather than a decision-level trail:
//! a literal is fixed at level `L` iff its variable's stamp is at least
//! `L`. Permanent assignments use the [`C_FIXED_TRUTH`] sentinel;
//! lookahead probes assign at strictly smaller, even levels so that
//! leaving a probe makes its assignments invisible without any undo work
//! beyond truncating the trail.
//!
//! ## References
//!
//! - Knuth, "The Art of Computer Programming" pre-fascicle 6a, sat11
//! - Heule et al., the March solver family
//! - Z3's `sat/sat_lookahead.cpp`

use crate::clause::{ClauseAllocator, ClauseOffset, Ternary};
use crate::config::Config;
use crate::error::Result;
use crate::extension::Extension;
use crate::literal::{LBool, Lit, Var};
use crate::model::Model;
use crate::proof::ProofSink;
use crate::resource::ResourceManager;
use crate::scc::DfsInfo;
use crate::varset::VarSet;
use crate::watch::{erase_clause_watch, Watched};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::fmt;
use tracing::{debug, info, trace};

/// Level stamp of permanent assignments. Lookahead levels are strictly
/// smaller and, like this sentinel, always even.
pub(crate) const C_FIXED_TRUTH: u32 = u32::MAX - 1;

/// Propagation behaviour selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Permanent assignments; reduced clauses become dynamic binaries.
    Searching,
    /// One-step probe; reductions feed the weighted-new-binaries score.
    Lookahead1,
    /// Two-step probe; reductions are ignored.
    Lookahead2,
}

/// Entry of the lookahead table: a literal and its even level offset.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LookaheadEntry {
    pub lit: Lit,
    pub offset: u32,
}

/// A pre-selection candidate.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Candidate {
    pub var: Var,
    pub rating: f64,
}

/// Per-literal probe bookkeeping.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct LitInfo {
    /// Accumulated weighted-new-binaries score.
    pub wnb: f64,
    /// istamp epoch in which double lookahead was disabled.
    pub double_lookahead: u32,
}

/// Per-variable branch freshness key.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct VarPrefix {
    pub prefix: u64,
    pub length: u32,
}

/// Result of a completed search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverResult {
    /// A satisfying assignment was found.
    Sat,
    /// The formula is unsatisfiable.
    Unsat,
}

/// A variable equivalence extracted by [`Lookahead::scc`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Equivalence {
    /// The variable to substitute.
    pub var: Var,
    /// The literal it is equivalent to.
    pub root: Lit,
}

/// Solver statistics.
#[derive(Debug, Clone, Default)]
pub struct Stats {
    /// Permanent assignments made while searching.
    pub propagations: u64,
    /// Decisions taken by the search driver.
    pub decisions: u64,
    /// Dynamic binary clauses added.
    pub add_binary: u64,
    /// Dynamic binary clauses removed on backtracking.
    pub del_binary: u64,
    /// Ternary clauses attached.
    pub add_ternary: u64,
    /// Ternary clauses detached.
    pub del_ternary: u64,
    /// Windfall binaries recorded by successful probes.
    pub windfall_binaries: u64,
    /// Literals fixed by the autarky check.
    pub autarky_propagations: u64,
    /// Equivalences recorded by the autarky check.
    pub autarky_equivalences: u64,
    /// Literals fixed by double lookahead.
    pub double_lookahead_propagations: u64,
    /// Double lookahead rounds run.
    pub double_lookahead_rounds: u64,
}

/// Deterministic xorshift generator for heuristic tie-breaks.
#[derive(Debug, Clone)]
pub(crate) struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self {
            state: (seed ^ 0x9e37_79b9_7f4a_7c15) | 1,
        }
    }

    fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_f491_4f6c_dd1d)
    }

    /// Uniform value in `0..n`.
    pub fn below(&mut self, n: u32) -> u32 {
        debug_assert!(n > 0);
        (self.next() % u64::from(n)) as u32
    }
}

/// The lookahead solver.
///
/// Clauses and initial units are loaded through [`add_clause`]; every
/// public operation ([`search`], [`simplify`], [`scc`],
/// [`select_lookahead`]) rebuilds its working state from that input
/// database, so the solver is memoryless across invocations.
///
/// [`add_clause`]: Lookahead::add_clause
/// [`search`]: Lookahead::search
/// [`simplify`]: Lookahead::simplify
/// [`scc`]: Lookahead::scc
/// [`select_lookahead`]: Lookahead::select_lookahead
pub struct Lookahead {
    pub(crate) config: Config,
    pub(crate) resources: ResourceManager,
    pub(crate) stats: Stats,
    pub(crate) rng: Rng,

    // input database
    pub(crate) num_vars: u32,
    pub(crate) input_clauses: Vec<Vec<Lit>>,
    pub(crate) input_binaries: Vec<(Lit, Lit)>,
    pub(crate) input_units: Vec<Lit>,
    pub(crate) input_ext_watches: Vec<(Lit, u32)>,
    pub(crate) input_empty: bool,
    pub(crate) eliminated: Vec<bool>,
    pub(crate) external: Vec<bool>,
    pub(crate) ext: Option<Box<dyn Extension>>,
    pub(crate) proof: Option<Box<dyn ProofSink>>,

    // assignment state
    pub(crate) mode: Mode,
    pub(crate) level: u32,
    pub(crate) prefix: u64,
    pub(crate) inconsistent: bool,
    pub(crate) qhead: usize,
    pub(crate) trail: Vec<Lit>,
    pub(crate) assumptions: Vec<Lit>,
    pub(crate) stamp: Vec<u32>,
    pub(crate) freevars: VarSet,

    // clause database
    pub(crate) allocator: ClauseAllocator,
    pub(crate) clauses: Vec<ClauseOffset>,
    pub(crate) retired_clauses: Vec<ClauseOffset>,
    pub(crate) retired_ternary: Vec<Ternary>,
    pub(crate) watches: Vec<Vec<Watched>>,
    pub(crate) full_watches: Vec<Vec<ClauseOffset>>,

    // dynamic binary graph
    pub(crate) binary: Vec<Vec<Lit>>,
    pub(crate) binary_trail: Vec<u32>,
    pub(crate) num_tc1: u32,
    pub(crate) bstamp: Vec<u32>,
    pub(crate) bstamp_id: u32,
    pub(crate) istamp_id: u32,

    // scope marks
    pub(crate) trail_lim: Vec<usize>,
    pub(crate) binary_trail_lim: Vec<usize>,
    pub(crate) qhead_lim: Vec<usize>,
    pub(crate) retired_clause_lim: Vec<usize>,
    pub(crate) retired_ternary_lim: Vec<usize>,
    pub(crate) num_tc1_lim: Vec<u32>,
    pub(crate) wnb_marks: Vec<(usize, usize)>,

    // heuristics
    pub(crate) lits: Vec<LitInfo>,
    pub(crate) rating: Vec<f64>,
    pub(crate) h: Vec<Vec<f64>>,
    pub(crate) heur: usize,
    pub(crate) vprefix: Vec<VarPrefix>,
    pub(crate) delta_trigger: f64,
    pub(crate) weighted_new_binaries: f64,

    // scc / lookahead table
    pub(crate) dfs: Vec<DfsInfo>,
    pub(crate) arcs: Vec<Vec<Lit>>,
    pub(crate) rank_counter: u32,
    pub(crate) active_scc: Lit,
    pub(crate) settled: Lit,
    pub(crate) root_child: Lit,
    pub(crate) candidates: Vec<Candidate>,
    pub(crate) lookahead: Vec<LookaheadEntry>,
    pub(crate) select_lookahead_vars: FxHashSet<Var>,
    pub(crate) wstack: Vec<Lit>,

    pub(crate) model: Model,
}

impl Lookahead {
    /// Create a solver with the given configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let rng = Rng::new(config.seed);
        Self {
            config,
            resources: ResourceManager::new(),
            stats: Stats::default(),
            rng,
            num_vars: 0,
            input_clauses: Vec::new(),
            input_binaries: Vec::new(),
            input_units: Vec::new(),
            input_ext_watches: Vec::new(),
            input_empty: false,
            eliminated: Vec::new(),
            external: Vec::new(),
            ext: None,
            proof: None,
            mode: Mode::Searching,
            level: C_FIXED_TRUTH,
            prefix: 0,
            inconsistent: false,
            qhead: 0,
            trail: Vec::new(),
            assumptions: Vec::new(),
            stamp: Vec::new(),
            freevars: VarSet::default(),
            allocator: ClauseAllocator::new(),
            clauses: Vec::new(),
            retired_clauses: Vec::new(),
            retired_ternary: Vec::new(),
            watches: Vec::new(),
            full_watches: Vec::new(),
            binary: Vec::new(),
            binary_trail: Vec::new(),
            num_tc1: 0,
            bstamp: Vec::new(),
            bstamp_id: 0,
            istamp_id: 0,
            trail_lim: Vec::new(),
            binary_trail_lim: Vec::new(),
            qhead_lim: Vec::new(),
            retired_clause_lim: Vec::new(),
            retired_ternary_lim: Vec::new(),
            num_tc1_lim: Vec::new(),
            wnb_marks: Vec::new(),
            lits: Vec::new(),
            rating: Vec::new(),
            h: Vec::new(),
            heur: 0,
            vprefix: Vec::new(),
            delta_trigger: 0.0,
            weighted_new_binaries: 0.0,
            dfs: Vec::new(),
            arcs: Vec::new(),
            rank_counter: 0,
            active_scc: Lit::NULL,
            settled: Lit::NULL,
            root_child: Lit::NULL,
            candidates: Vec::new(),
            lookahead: Vec::new(),
            select_lookahead_vars: FxHashSet::default(),
            wstack: Vec::new(),
            model: Model::default(),
        }
    }

    /// Create a solver with an embedded extension.
    #[must_use]
    pub fn with_extension(config: Config, ext: Box<dyn Extension>) -> Self {
        let mut solver = Self::new(config);
        solver.ext = Some(ext);
        solver
    }

    // ------------------------------------
    // input database

    /// Add a fresh variable and return it.
    pub fn new_var(&mut self) -> Var {
        let v = self.num_vars;
        self.num_vars += 1;
        self.eliminated.push(false);
        self.external.push(false);
        v
    }

    /// Number of variables.
    #[must_use]
    pub fn num_vars(&self) -> u32 {
        self.num_vars
    }

    /// Add a clause over existing variables.
    ///
    /// Duplicate literals are removed and tautologies dropped. The empty
    /// clause makes the instance trivially unsatisfiable.
    pub fn add_clause(&mut self, lits: &[Lit]) {
        let mut cl: Vec<Lit> = lits.to_vec();
        cl.sort_unstable_by_key(|l| l.index());
        cl.dedup();
        debug_assert!(cl.iter().all(|l| l.var() < self.num_vars));
        // complementary literals are adjacent after sorting by index
        if cl.windows(2).any(|w| w[0].var() == w[1].var()) {
            return;
        }
        match cl.len() {
            0 => self.input_empty = true,
            1 => self.input_units.push(cl[0]),
            2 => self.input_binaries.push((cl[0], cl[1])),
            _ => self.input_clauses.push(cl),
        }
    }

    /// Mark a variable as eliminated by the enclosing solver. Eliminated
    /// variables are excluded from candidates and initial clause copying.
    pub fn set_eliminated(&mut self, v: Var, eliminated: bool) {
        self.eliminated[v as usize] = eliminated;
    }

    /// Mark a variable as external; external variables are not substituted
    /// by [`Lookahead::scc`].
    pub fn set_external(&mut self, v: Var, external: bool) {
        self.external[v as usize] = external;
    }

    /// Register an extension watch: the extension's `propagate` callback
    /// fires with `ext_idx` whenever `lit` becomes true.
    pub fn watch_ext(&mut self, lit: Lit, ext_idx: u32) {
        self.input_ext_watches.push((lit, ext_idx));
    }

    /// Install a proof sink. Records are only emitted when
    /// [`Config::drat`] is set.
    pub fn set_proof(&mut self, sink: Box<dyn ProofSink>) {
        self.proof = Some(sink);
    }

    /// The solver configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Mutable access to the configuration; effective from the next
    /// operation.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Resource limits consulted at checkpoints.
    #[must_use]
    pub fn resources(&self) -> &ResourceManager {
        &self.resources
    }

    /// Mutable access to the resource limits.
    pub fn resources_mut(&mut self) -> &mut ResourceManager {
        &mut self.resources
    }

    /// Solver statistics, accumulated across invocations.
    #[must_use]
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// The model produced by the last successful [`Lookahead::search`].
    #[must_use]
    pub fn model(&self) -> &Model {
        &self.model
    }

    // ------------------------------------
    // truth values
    //
    // A variable's stamp encodes its assignment level in the high bits and
    // the assigned polarity in the lowest bit; levels are always even.

    pub(crate) fn is_fixed_at(&self, l: Lit, level: u32) -> bool {
        self.stamp[l.var() as usize] >= level
    }

    pub(crate) fn is_fixed(&self, l: Lit) -> bool {
        self.is_fixed_at(l, self.level)
    }

    pub(crate) fn is_undef(&self, l: Lit) -> bool {
        !self.is_fixed(l)
    }

    pub(crate) fn is_true_at(&self, l: Lit, level: u32) -> bool {
        self.is_fixed_at(l, level)
            && (self.stamp[l.var() as usize] & 1) == u32::from(l.is_positive())
    }

    pub(crate) fn is_true(&self, l: Lit) -> bool {
        self.is_true_at(l, self.level)
    }

    pub(crate) fn is_false(&self, l: Lit) -> bool {
        self.is_fixed(l) && !self.is_true(l)
    }

    pub(crate) fn is_undef_var(&self, v: Var) -> bool {
        self.stamp[v as usize] < self.level
    }

    pub(crate) fn set_true(&mut self, l: Lit) {
        debug_assert_eq!(self.level & 1, 0);
        self.stamp[l.var() as usize] = self.level + u32::from(l.is_positive());
    }

    pub(crate) fn set_undef(&mut self, l: Lit) {
        self.stamp[l.var() as usize] = 0;
    }

    /// Lift `d` to the level of `s`, keeping `d`'s truth.
    pub(crate) fn lift_level(&mut self, d: Lit, s: Lit) {
        self.stamp[d.var() as usize] =
            (self.stamp[s.var() as usize] & !1) + u32::from(d.is_positive());
    }

    pub(crate) fn set_conflict(&mut self) {
        self.inconsistent = true;
    }

    pub(crate) fn scope_lvl(&self) -> usize {
        self.trail_lim.len()
    }

    pub(crate) fn assign(&mut self, l: Lit) {
        debug_assert!(self.level > 0);
        if self.is_undef(l) {
            trace!(lit = %l, level = self.level, "assign");
            self.set_true(l);
            self.trail.push(l);
            if self.mode == Mode::Searching {
                self.stats.propagations += 1;
                self.freevars.remove(l.var());
                self.validate_assign(l);
            }
        } else if self.is_false(l) {
            trace!(lit = %l, level = self.level, "conflicting assignment");
            self.validate_assign(l);
            self.set_conflict();
        }
    }

    fn validate_assign(&mut self, l: Lit) {
        if self.config.drat && self.mode == Mode::Searching && self.proof.is_some() {
            let mut cls: SmallVec<[Lit; 16]> = SmallVec::from_slice(&self.assumptions);
            cls.push(l);
            if let Some(sink) = self.proof.as_mut() {
                sink.add_clause(&cls);
            }
        }
    }

    // ------------------------------------
    // clause management

    pub(crate) fn attach_clause(&mut self, off: ClauseOffset) {
        let (len, l0, l1, l2, blocker) = {
            let c = self.allocator.get(off);
            (c.len(), c[0], c[1], c[2], c[c.len() >> 2])
        };
        if len == 3 {
            self.attach_ternary(l0, l1, l2);
        } else {
            self.watches[l0.negate().index()].push(Watched::Clause(blocker, off));
            self.watches[l1.negate().index()].push(Watched::Clause(blocker, off));
        }
    }

    pub(crate) fn detach_clause(&mut self, off: ClauseOffset) {
        let (l0, l1) = {
            let c = self.allocator.get(off);
            (c[0], c[1])
        };
        self.retired_clauses.push(off);
        erase_clause_watch(&mut self.watches[l0.negate().index()], off);
        erase_clause_watch(&mut self.watches[l1.negate().index()], off);
    }

    pub(crate) fn attach_ternary(&mut self, l1: Lit, l2: Lit, l3: Lit) {
        self.stats.add_ternary += 1;
        self.watches[l1.negate().index()].push(Watched::Ternary(l2, l3));
        self.watches[l2.negate().index()].push(Watched::Ternary(l1, l3));
        self.watches[l3.negate().index()].push(Watched::Ternary(l1, l2));
    }

    // ------------------------------------
    // initialization

    /// Rebuild all working state from the input database.
    pub(crate) fn init(&mut self) {
        let nv = self.num_vars as usize;
        self.delta_trigger = nv as f64 / 10.0;
        self.inconsistent = self.input_empty;
        self.qhead = 0;
        self.bstamp_id = 0;
        self.istamp_id = 0;
        self.prefix = 0;
        self.num_tc1 = 0;
        self.weighted_new_binaries = 0.0;
        self.rank_counter = 0;
        self.active_scc = Lit::NULL;
        self.settled = Lit::NULL;
        self.root_child = Lit::NULL;
        self.heur = 0;

        self.trail.clear();
        self.assumptions.clear();
        self.binary.clear();
        self.binary.resize(2 * nv, Vec::new());
        self.binary_trail.clear();
        self.allocator.clear();
        self.clauses.clear();
        self.retired_clauses.clear();
        self.retired_ternary.clear();
        self.watches.clear();
        self.watches.resize(2 * nv, Vec::new());
        self.full_watches.clear();
        self.full_watches.resize(2 * nv, Vec::new());
        self.trail_lim.clear();
        self.binary_trail_lim.clear();
        self.qhead_lim.clear();
        self.retired_clause_lim.clear();
        self.retired_ternary_lim.clear();
        self.num_tc1_lim.clear();
        self.wnb_marks.clear();
        self.stamp.clear();
        self.stamp.resize(nv, 0);
        self.bstamp.clear();
        self.bstamp.resize(2 * nv, 0);
        self.lits.clear();
        self.lits.resize(2 * nv, LitInfo::default());
        self.rating.clear();
        self.rating.resize(nv, 0.0);
        self.h.clear();
        self.vprefix.clear();
        self.vprefix.resize(nv, VarPrefix::default());
        self.dfs.clear();
        self.dfs.resize(2 * nv, DfsInfo::default());
        self.arcs.clear();
        self.arcs.resize(2 * nv, Vec::new());
        self.candidates.clear();
        self.lookahead.clear();
        self.wstack.clear();
        self.freevars.reset(nv);
        for v in 0..self.num_vars {
            if !self.eliminated[v as usize] {
                self.freevars.insert(v);
            }
        }

        // binary clauses
        for i in 0..self.input_binaries.len() {
            let (l1, l2) = self.input_binaries[i];
            if self.eliminated[l1.var() as usize] || self.eliminated[l2.var() as usize] {
                continue;
            }
            self.add_binary(l1, l2);
        }

        self.copy_clauses();

        // units from the enclosing solver's trail
        for i in 0..self.input_units.len() {
            let l = self.input_units[i];
            if self.eliminated[l.var() as usize] {
                continue;
            }
            if self.config.drat {
                if let Some(sink) = self.proof.as_mut() {
                    sink.add_clause(&[l]);
                }
            }
            self.assign(l);
        }

        // extension watches
        for i in 0..self.input_ext_watches.len() {
            let (l, idx) = self.input_ext_watches[i];
            self.watches[l.index()].push(Watched::Ext(idx));
        }

        self.propagate();
        self.qhead = self.trail.len();
    }

    fn copy_clauses(&mut self) {
        for i in 0..self.input_clauses.len() {
            let off = self.allocator.mk_clause(&self.input_clauses[i]);
            self.clauses.push(off);
            self.attach_clause(off);
            let len = self.allocator.get(off).len();
            for k in 0..len {
                let l = self.allocator.get(off)[k];
                debug_assert!(!self.eliminated[l.var() as usize]);
                self.full_watches[l.negate().index()].push(off);
            }
            if self.config.drat {
                if let Some(sink) = self.proof.as_mut() {
                    sink.add_clause(&self.input_clauses[i]);
                }
            }
        }
    }

    // ------------------------------------
    // scoped state

    /// Open a scope, assign `lit` at `level` and propagate.
    pub(crate) fn push(&mut self, lit: Lit, level: u32) {
        debug_assert_eq!(self.mode, Mode::Searching);
        self.binary_trail_lim.push(self.binary_trail.len());
        self.trail_lim.push(self.trail.len());
        self.num_tc1_lim.push(self.num_tc1);
        self.retired_clause_lim.push(self.retired_clauses.len());
        self.retired_ternary_lim.push(self.retired_ternary.len());
        self.qhead_lim.push(self.qhead);
        let saved = self.level;
        self.level = level;
        self.assumptions.push(lit.negate());
        self.assign(lit);
        self.propagate();
        self.level = saved;
    }

    /// Close the innermost scope, undoing every side effect since the
    /// matching [`push`](Lookahead::push).
    pub(crate) fn pop(&mut self) {
        assert!(!self.trail_lim.is_empty(), "pop without matching push");
        debug_assert_eq!(self.mode, Mode::Searching);
        self.assumptions.pop();
        self.inconsistent = false;

        // re-attach clauses retired after the mark
        let old_sz = self
            .retired_clause_lim
            .pop()
            .expect("scope stacks out of sync");
        for i in old_sz..self.retired_clauses.len() {
            let off = self.retired_clauses[i];
            self.attach_clause(off);
        }
        self.retired_clauses.truncate(old_sz);

        // re-attach ternaries
        let old_sz = self
            .retired_ternary_lim
            .pop()
            .expect("scope stacks out of sync");
        for i in old_sz..self.retired_ternary.len() {
            let t = self.retired_ternary[i];
            self.attach_ternary(t.u, t.v, t.w);
        }
        self.retired_ternary.truncate(old_sz);

        // delete binaries added after the mark
        let old_sz = self
            .binary_trail_lim
            .pop()
            .expect("scope stacks out of sync");
        for i in (old_sz..self.binary_trail.len()).rev() {
            let idx = self.binary_trail[i] as usize;
            self.del_binary(idx);
        }
        self.binary_trail.truncate(old_sz);

        // unassign and release variables
        let old_sz = self.trail_lim.pop().expect("scope stacks out of sync");
        for i in (old_sz..self.trail.len()).rev() {
            let l = self.trail[i];
            self.set_undef(l);
            self.freevars.insert(l.var());
        }
        self.trail.truncate(old_sz);

        self.num_tc1 = self.num_tc1_lim.pop().expect("scope stacks out of sync");
        self.qhead = self.qhead_lim.pop().expect("scope stacks out of sync");
    }

    /// Pop every open scope and lookahead window; used to keep the solver
    /// consistent when a resource error unwinds.
    pub(crate) fn unwind(&mut self) {
        while !self.wnb_marks.is_empty() {
            self.reset_wnb();
        }
        self.mode = Mode::Searching;
        self.inconsistent = false;
        while !self.trail_lim.is_empty() {
            self.pop();
        }
    }

    // ------------------------------------
    // resource limits

    pub(crate) fn checkpoint(&self) -> Result<()> {
        let allocated = if self.resources.max_memory().is_some() {
            self.allocated_bytes()
        } else {
            0
        };
        self.resources.check(allocated)
    }

    fn allocated_bytes(&self) -> u64 {
        use std::mem::size_of;
        let mut bytes = self.allocator.allocated_bytes();
        bytes += (self.trail.capacity() * size_of::<Lit>()) as u64;
        let per_lit: usize = self
            .binary
            .iter()
            .map(|v| v.capacity() * size_of::<Lit>())
            .chain(self.watches.iter().map(|v| v.capacity() * size_of::<Watched>()))
            .chain(
                self.full_watches
                    .iter()
                    .map(|v| v.capacity() * size_of::<ClauseOffset>()),
            )
            .chain(self.arcs.iter().map(|v| v.capacity() * size_of::<Lit>()))
            .sum();
        bytes += per_lit as u64;
        bytes += (self.h.len() * 2 * self.num_vars as usize * size_of::<f64>()) as u64;
        bytes += (self.dfs.capacity() * size_of::<DfsInfo>()) as u64;
        bytes
    }

    // ------------------------------------
    // search

    /// Decide satisfiability of the loaded formula.
    pub fn search(&mut self) -> Result<SolverResult> {
        let res = self.search_inner();
        if res.is_err() {
            self.unwind();
        }
        res
    }

    fn search_inner(&mut self) -> Result<SolverResult> {
        self.model = Model::default();
        self.mode = Mode::Searching;
        self.level = C_FIXED_TRUTH;
        self.init();
        let mut decisions: Vec<Lit> = Vec::new();
        loop {
            self.inc_istamp();
            self.checkpoint()?;
            if self.inconsistent {
                if !self.backtrack(&mut decisions) {
                    return Ok(SolverResult::Unsat);
                }
                continue;
            }
            let l = self.choose()?;
            if self.inconsistent {
                if !self.backtrack(&mut decisions) {
                    return Ok(SolverResult::Unsat);
                }
                continue;
            }
            if l.is_null() {
                self.init_model();
                return Ok(SolverResult::Sat);
            }
            debug!(lit = %l, depth = decisions.len(), "decision");
            self.stats.decisions += 1;
            self.push(l, C_FIXED_TRUTH);
            decisions.push(l);
            debug_assert!(self.inconsistent || !self.is_unsat());
        }
    }

    fn backtrack(&mut self, decisions: &mut Vec<Lit>) -> bool {
        while self.inconsistent {
            let last = match decisions.pop() {
                Some(l) => l,
                None => return false,
            };
            self.pop();
            self.flip_prefix();
            self.assign(last.negate());
            self.propagate();
        }
        true
    }

    /// Pre-select candidates, probe them and return the best decision
    /// literal, or [`Lit::NULL`] when the formula is satisfied.
    pub(crate) fn choose(&mut self) -> Result<Lit> {
        let mut l = Lit::NULL;
        while l.is_null() {
            self.pre_select();
            if self.lookahead.is_empty() {
                break;
            }
            self.compute_wnb()?;
            if self.inconsistent {
                break;
            }
            l = self.select_literal();
        }
        debug_assert!(self.inconsistent || !self.is_unsat());
        Ok(l)
    }

    fn init_model(&mut self) {
        let mut values = Vec::with_capacity(self.num_vars as usize);
        for v in 0..self.num_vars {
            let lit = Lit::positive(v);
            let val = if self.is_undef(lit) {
                LBool::Undef
            } else if self.is_true(lit) {
                LBool::True
            } else {
                LBool::False
            };
            values.push(val);
        }
        self.model = Model::from_values(values);
    }

    // ------------------------------------
    // auxiliary modes

    /// Extract units by one lookahead pass at base level.
    ///
    /// Returns the literals fixed by the pass that the input database had
    /// not already assigned, for the enclosing solver to re-assert. An
    /// unsatisfiable instance yields no units; run
    /// [`search`](Lookahead::search) to establish unsatisfiability.
    pub fn simplify(&mut self) -> Result<Vec<Lit>> {
        let res = self.simplify_inner();
        if res.is_err() {
            self.unwind();
        }
        res
    }

    fn simplify_inner(&mut self) -> Result<Vec<Lit>> {
        self.mode = Mode::Searching;
        self.level = C_FIXED_TRUTH;
        self.init();
        if self.inconsistent {
            return Ok(Vec::new());
        }
        self.inc_istamp();
        self.choose()?;
        if self.inconsistent {
            return Ok(Vec::new());
        }
        debug_assert!(self.trail_lim.is_empty());
        let assigned: FxHashSet<Lit> = self.input_units.iter().copied().collect();
        let mut units = Vec::new();
        for &lit in &self.trail {
            if !self.eliminated[lit.var() as usize] && !assigned.contains(&lit) {
                units.push(lit);
            }
        }
        info!(units = units.len(), "lookahead simplification");
        self.lookahead.clear();
        Ok(units)
    }

    /// Extract variable equivalence classes from the binary implication
    /// graph. Each returned pair substitutes `var` by `root` in the
    /// enclosing solver; eliminated and external variables are skipped.
    pub fn scc(&mut self) -> Result<Vec<Equivalence>> {
        let res = self.scc_inner();
        if res.is_err() {
            self.unwind();
        }
        res
    }

    fn scc_inner(&mut self) -> Result<Vec<Equivalence>> {
        self.mode = Mode::Searching;
        self.level = C_FIXED_TRUTH;
        self.init();
        if self.inconsistent {
            return Ok(Vec::new());
        }
        self.inc_istamp();
        self.lookahead.clear();
        let mut eqs = Vec::new();
        if self.select(0) {
            self.get_scc();
            if self.inconsistent {
                return Ok(Vec::new());
            }
            for i in 0..self.candidates.len() {
                let v = self.candidates[i].var;
                let p = self.get_root(v);
                if !p.is_null()
                    && p.var() != v
                    && !self.external[v as usize]
                    && !self.eliminated[v as usize]
                    && !self.eliminated[p.var() as usize]
                {
                    eqs.push(Equivalence { var: v, root: p });
                    let np = p.negate();
                    self.set_parent(np, np);
                }
            }
            info!(equivalences = eqs.len(), "scc equivalence extraction");
        }
        self.lookahead.clear();
        Ok(eqs)
    }

    /// Root literal of a variable's equivalence class.
    ///
    /// Two complementary classes may exist; the class of the variable with
    /// the largest index wins so substitutions converge.
    fn get_root(&self, v: Var) -> Lit {
        let lit = Lit::positive(v);
        let r1 = self.get_parent(lit);
        debug_assert!(!r1.is_null());
        let r2 = self.get_parent(Lit::positive(r1.var()));
        debug_assert_eq!(r1.var(), self.get_parent(Lit::positive(r2.var())).var());
        if r1.var() >= r2.var() {
            r1
        } else if r1.is_negative() {
            r2.negate()
        } else {
            r2
        }
    }

    /// Choose a decision literal for a cooperating solver, restricted to
    /// `vars` (all free variables when empty) under `assumptions`.
    pub fn select_lookahead(
        &mut self,
        assumptions: &[Lit],
        vars: &[Var],
    ) -> Result<Option<Lit>> {
        let res = self.select_lookahead_inner(assumptions, vars);
        if res.is_err() {
            self.unwind();
            self.select_lookahead_vars.clear();
        }
        res
    }

    fn select_lookahead_inner(
        &mut self,
        assumptions: &[Lit],
        vars: &[Var],
    ) -> Result<Option<Lit>> {
        debug!(vars = vars.len(), assumptions = assumptions.len(), "select lookahead");
        self.mode = Mode::Searching;
        self.level = C_FIXED_TRUTH;
        self.init();
        if self.inconsistent {
            return Ok(None);
        }
        self.inc_istamp();
        for &v in vars {
            self.select_lookahead_vars.insert(v);
        }
        for &l in assumptions {
            self.push(l, C_FIXED_TRUTH);
        }
        let mut l = self.choose()?;
        self.select_lookahead_vars.clear();
        if self.inconsistent {
            l = Lit::NULL;
        }
        for _ in assumptions {
            self.pop();
        }
        Ok(if l.is_null() { None } else { Some(l) })
    }
}

impl fmt::Display for Lookahead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "prefix: {:b} depth: {} level: {}",
            self.prefix,
            self.trail_lim.len(),
            self.level
        )?;
        write!(f, "trail:")?;
        for l in &self.trail {
            write!(f, " {l}")?;
        }
        writeln!(f)?;
        for idx in 0..self.binary.len() {
            if !self.binary[idx].is_empty() {
                write!(f, "{} ->", Lit::from_index(idx))?;
                for w in &self.binary[idx] {
                    write!(f, " {w}")?;
                }
                writeln!(f)?;
            }
        }
        for &off in &self.clauses {
            let c = self.allocator.get(off);
            for (k, l) in c.iter().enumerate() {
                if k > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{l}")?;
            }
            writeln!(f)?;
        }
        write!(f, "free:")?;
        for v in self.freevars.iter() {
            write!(f, " {v}")?;
        }
        writeln!(f)
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::*;

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
    pub fn solver_from(cnf: &[&[i32]], nvars: u32) -> Lookahead {
        let mut s = Lookahead::new(Config::default());
        for _ in 0..nvars {
            s.new_var();
        }
        for c in cnf {
            let lits: Vec<Lit> = c.iter().map(|&x| lit(x)).collect();
            s.add_clause(&lits);
        }
        s
    }
}
