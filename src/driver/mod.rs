//! The `gobblers` binary's driver glue (spec.md 2, 5): an interactive
//! line-oriented command loop over stdin, modeled on the teacher's
//! `LTPServer`. Owns the one [`Solver`] instance, installs the
//! cooperative-cancellation signal handler, and checkpoints/logs only at
//! well-defined frame-stack boundaries, never mid-frame.

mod options;

use std::process::exit;
use std::sync::atomic::Ordering;

use itertools::Itertools;
pub use options::GobblersOptions;

use crate::boundary::{best_moves, outcome_of_base64};
use crate::checkpoint::CheckpointStore;
use crate::core::encoding::{canonicalize, encode, CanonicalKey};
use crate::core::moves::generate_moves;
use crate::core::notation;
use crate::core::position::Position;
use crate::frontier::{enumerate_frontier, StopConditions};
use crate::solver::Solver;
use crate::utils::prelude::*;

pub struct GobblersServer {
    solver: Solver,
    root: Position,
}

impl GobblersServer {
    /// Builds a server for `options`, loading `store`'s prior table (if
    /// any) and resolving the search root from `--root`, defaulting to the
    /// empty starting position.
    pub fn new(options: GobblersOptions, store: Option<Box<dyn CheckpointStore>>) -> Result<GobblersServer> {
        let mut solver = Solver::new(options.solver_config());
        if let Some(store) = store {
            solver = solver.with_checkpoint_store(store)?;
        }

        let root = match &options.root {
            Some(base64) => crate::core::encoding::decode(CanonicalKey::from_base64(base64)?.0)?,
            None => Position::starting(),
        };

        Ok(GobblersServer { solver, root })
    }

    /// Installs `cancel` as the solver's cooperative cancellation flag, so
    /// a driver-level signal handler can request a clean shutdown.
    pub fn cancel_flag(&self) -> std::sync::Arc<std::sync::atomic::AtomicBool> {
        self.solver.cancel_flag()
    }

    /// Reads commands from stdin until `quit` or EOF.
    pub fn run(&mut self) -> Result<()> {
        loop {
            let mut line = String::new();
            let bytes_read = std::io::stdin().read_line(&mut line)?;
            if bytes_read == 0 {
                return Ok(());
            }

            let args: Vec<&str> = line.split_whitespace().collect();
            let cmd = *args.first().unwrap_or(&"");
            self.apply(cmd, &args[1..]);
        }
    }

    fn apply(&mut self, cmd: &str, args: &[&str]) {
        let result = match cmd {
            "" => Ok(()),
            "solve" => self.solve(),
            "outcome" => self.outcome(args),
            "bestmoves" => self.bestmoves(args),
            "validmoves" => self.validmoves(),
            "frontier" => self.frontier(args),
            "stats" => self.print_stats(),
            "checkpoint" => self.force_checkpoint(),
            "quit" => exit(0),
            _ => Err(anyhow!("unrecognized command {cmd}")),
        };

        match result {
            Ok(()) => {
                log::debug!("command completed: {cmd} {}", args.join(" "));
                println!("ok");
            }
            Err(err) => {
                log::warn!("encountered recoverable error:\n{err}");
                println!("err\n{err}");
            }
        }
    }

    fn solve(&mut self) -> Result<()> {
        let mut position = self.root;
        match self.solver.solve(&mut position) {
            Some(outcome) => {
                println!("{outcome:?}");
                Ok(())
            }
            None => {
                println!("cancelled");
                Ok(())
            }
        }
    }

    fn outcome(&mut self, args: &[&str]) -> Result<()> {
        let base64 = args.first().ok_or_else(|| anyhow!("usage: outcome <base64>"))?;
        println!("{}", outcome_of_base64(&self.solver, base64)?);
        Ok(())
    }

    fn bestmoves(&mut self, args: &[&str]) -> Result<()> {
        let base64 = args.first().ok_or_else(|| anyhow!("usage: bestmoves <base64>"))?;
        for (mv, outcome) in best_moves(&self.solver, base64)? {
            match outcome {
                Some(o) => println!("{} {o:?}", notation::render(mv)),
                None => println!("{} unsolved", notation::render(mv)),
            }
        }
        Ok(())
    }

    /// Prints the current root's legal move count followed by the moves
    /// themselves, one line, semicolon-joined.
    fn validmoves(&mut self) -> Result<()> {
        let moves = generate_moves(&self.root);
        println!("{}", moves.len());
        println!("{}", moves.iter().map(|mv| notation::render(*mv)).join("; "));
        Ok(())
    }

    fn frontier(&mut self, args: &[&str]) -> Result<()> {
        let max_positions = args.first().map(|s| s.parse::<usize>()).transpose()?;
        let mut stop = StopConditions::new().with_cancel(self.solver.cancel_flag());
        if let Some(max) = max_positions {
            stop = stop.with_max_positions(max);
        }
        let root_canonical = canonicalize(encode(&self.root));
        let report = enumerate_frontier(root_canonical, self.solver.table(), &stop);
        println!("{}", report.to_json_value());
        Ok(())
    }

    fn print_stats(&self) -> Result<()> {
        let stats = self.solver.stats();
        println!(
            "positions_evaluated={} cache_hits={} terminal_positions={} cycle_draws={} max_depth={}",
            stats.positions_evaluated, stats.cache_hits, stats.terminal_positions, stats.cycle_draws, stats.max_depth
        );
        Ok(())
    }

    fn force_checkpoint(&mut self) -> Result<()> {
        self.solver.flush_checkpoint()
    }
}

/// Flips `cancel` to request a clean shutdown; wired to `SIGINT`/`SIGTERM`
/// by `main` via the `ctrlc` crate (spec.md 5's cooperative cancellation).
pub fn request_shutdown(cancel: &std::sync::atomic::AtomicBool) {
    cancel.store(true, Ordering::Relaxed);
}
