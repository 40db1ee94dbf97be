use std::time::Duration;

use clap::Parser;

use crate::solver::SolverConfig;

/// Startup options for the `gobblers` binary (grounded on the teacher's
/// `LTPServerOptions`): logging, checkpoint location/cadence, and the
/// search tunables exposed by [`SolverConfig`].
#[derive(Clone, Debug, Parser)]
#[command(name = "gobblers", about = "Exhaustive solver for Gobblet Gobblers")]
pub struct GobblersOptions {
    /// `flexi_logger` spec string, e.g. "info" or "debug".
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Path to the sled checkpoint database. Omit to run purely in memory.
    #[arg(short, long)]
    pub checkpoint_path: Option<String>,

    #[arg(long, default_value_t = 60)]
    pub checkpoint_interval_secs: u64,

    #[arg(long, default_value_t = false)]
    pub no_alpha_beta: bool,

    /// Progress log cadence, in seconds.
    #[arg(long, default_value_t = 5)]
    pub progress_interval_secs: u64,

    /// A base64 canonical to solve from instead of the empty starting board.
    #[arg(short, long)]
    pub root: Option<String>,
}

impl GobblersOptions {
    pub fn solver_config(&self) -> SolverConfig {
        SolverConfig::new()
            .with_alpha_beta(!self.no_alpha_beta)
            .with_checkpoint_interval(Duration::from_secs(self.checkpoint_interval_secs))
            .with_progress_interval(Duration::from_secs(self.progress_interval_secs))
    }
}
