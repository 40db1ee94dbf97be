use std::time::Duration;

/// Tunables for a [`Solver`](super::Solver) run, built with a chained
/// `with_*` API (grounded on the teacher's `AgentConfig`/`IterativeOptions`
/// builder). None of these change search semantics except `alpha_beta`,
/// which exists purely to let tests confirm pruned and unpruned runs agree.
#[derive(Clone, Copy, Debug)]
pub struct SolverConfig {
    pub(crate) alpha_beta: bool,
    pub(crate) path_capacity: usize,
    pub(crate) progress_interval: Duration,
    pub(crate) checkpoint_interval: Duration,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            alpha_beta: true,
            path_capacity: 64,
            progress_interval: Duration::from_secs(5),
            checkpoint_interval: Duration::from_secs(60),
        }
    }
}

impl SolverConfig {
    pub fn new() -> SolverConfig {
        SolverConfig::default()
    }

    /// Alpha-beta pruning is on by default; turn it off to verify exhaustive
    /// exploration reaches the same outcomes (spec.md 8, property 10).
    pub fn with_alpha_beta(mut self, enabled: bool) -> Self {
        self.alpha_beta = enabled;
        self
    }

    /// Initial capacity reserved for the path set / frame stack. Purely a
    /// preallocation hint; the search is correct at any capacity.
    pub fn with_path_capacity(mut self, capacity: usize) -> Self {
        self.path_capacity = capacity;
        self
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn with_checkpoint_interval(mut self, interval: Duration) -> Self {
        self.checkpoint_interval = interval;
        self
    }
}

/// Running counters mirroring the checkpoint store's `meta` keys (spec.md
/// 6), so a restored solver's stats pick up where a prior run left off.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SolverStats {
    pub positions_evaluated: u64,
    pub cache_hits: u64,
    pub terminal_positions: u64,
    pub cycle_draws: u64,
    pub max_depth: u32,
}

impl SolverStats {
    pub fn to_meta_pairs(&self) -> [(&'static str, String); 5] {
        [
            ("positions_evaluated", self.positions_evaluated.to_string()),
            ("cache_hits", self.cache_hits.to_string()),
            ("terminal_positions", self.terminal_positions.to_string()),
            ("cycle_draws", self.cycle_draws.to_string()),
            ("max_depth", self.max_depth.to_string()),
        ]
    }
}
