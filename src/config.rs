//! Solver configuration.

/// Tuning options for the lookahead solver.
#[derive(Debug, Clone)]
pub struct Config {
    /// Weight of the linear (binary) term in the H-score.
    pub alpha: f64,
    /// Cap applied to each H-score.
    pub max_score: f64,
    /// Number of iterations of the H-score fixpoint.
    pub max_hlevel: u32,
    /// Base candidate budget per search level.
    pub level_cand: u32,
    /// Lower bound on the candidate cutoff.
    pub min_cutoff: u32,
    /// Maximum transitive-closure binaries added per probe.
    pub tc1_limit: u32,
    /// Double-lookahead trigger decay, `0 < delta_rho < 1`.
    pub delta_rho: f64,
    /// Cap on double-lookahead inner iterations.
    pub dl_max_iterations: u32,
    /// Empirical double-lookahead success factor.
    pub dl_success: f64,
    /// Enable the autarky check after zero-reduction probes.
    pub autarky: bool,
    /// Emit proof records to the configured sink.
    pub drat: bool,
    /// Seed for the tie-breaking pseudo random generator.
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            alpha: 3.5,
            max_score: 20.0,
            max_hlevel: 50,
            level_cand: 600,
            min_cutoff: 30,
            tc1_limit: 10_000_000,
            delta_rho: 0.7,
            dl_max_iterations: 32,
            dl_success: 0.8,
            autarky: true,
            drat: false,
            seed: 0,
        }
    }
}
