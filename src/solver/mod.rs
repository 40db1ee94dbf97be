mod config;

pub use config::{SolverConfig, SolverStats};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};

use crate::checkpoint::CheckpointStore;
use crate::core::encoding::{canonicalize, encode, CanonicalKey};
use crate::core::moves::{apply_unchecked_engine, generate_moves, undo, Move, PlyResult, UndoToken};
use crate::core::position::{Outcome, Player, Position};
use crate::utils::prelude::*;

/// One child of a frame, prepared up front by simulating the move
/// (apply then undo) so its canonical and terminal status are known before
/// the frame is ever iterated (spec.md 4.3.1).
#[derive(Clone, Copy, Debug)]
struct ChildDescriptor {
    mv: Move,
    child_canonical: CanonicalKey,
    terminal: Option<Outcome>,
}

/// One level of the explicit frame stack that stands in for recursion
/// (spec.md 4.3.1), so deep search lines never overflow the native stack.
struct Frame {
    canonical: CanonicalKey,
    mover: Player,
    children: Vec<ChildDescriptor>,
    cursor: usize,
    outcomes: Vec<Outcome>,
    undo: Option<UndoToken>,
}

/// Whether the mover of `frame` should stop considering further children
/// given `latest`, the most recently contributed child outcome.
fn should_prune(config: &SolverConfig, mover: Player, latest: Outcome) -> bool {
    config.alpha_beta && latest == Outcome::win_for(mover)
}

/// Orders `children` so the mover's best-known outcomes come first, then
/// draws, then known losses, then unknowns (spec.md 4.3.4). A minor
/// optimization, but one that makes alpha-beta pruning much more
/// effective in practice.
fn order_children(children: &mut [ChildDescriptor], mover: Player, table: &HashMap<CanonicalKey, Outcome>) {
    let rank = |child: &ChildDescriptor| -> u8 {
        if let Some(terminal) = child.terminal {
            return if terminal == Outcome::win_for(mover) { 0 } else { 2 };
        }
        match table.get(&child.child_canonical) {
            Some(&stored) if stored == Outcome::win_for(mover) => 0,
            Some(&Outcome::Draw) => 1,
            Some(_) => 2,
            None => 3,
        }
    };
    children.sort_by_key(rank);
}

/// An exhaustive minimax solver over the Gobblers game DAG: a transposition
/// table keyed by canonical position, a path set for cycle detection, and
/// an iterative frame stack in place of native recursion.
pub struct Solver {
    table: HashMap<CanonicalKey, Outcome>,
    path: HashSet<CanonicalKey>,
    config: SolverConfig,
    stats: SolverStats,
    cancel: Arc<AtomicBool>,
    checkpoint: Option<Box<dyn CheckpointStore>>,
    pending_checkpoint: Vec<(CanonicalKey, Outcome)>,
    last_checkpoint: Option<Instant>,
}

impl Solver {
    pub fn new(config: SolverConfig) -> Solver {
        Solver {
            table: HashMap::new(),
            path: HashSet::with_capacity(config.path_capacity),
            config,
            stats: SolverStats::default(),
            cancel: Arc::new(AtomicBool::new(false)),
            checkpoint: None,
            pending_checkpoint: Vec::new(),
            last_checkpoint: None,
        }
    }

    /// Loads the existing table and stats from `store` and adopts it as the
    /// destination for periodic flushes during subsequent solves.
    pub fn with_checkpoint_store(mut self, store: Box<dyn CheckpointStore>) -> Result<Solver> {
        for (canonical, outcome) in store.scan_all()? {
            self.table.insert(canonical, outcome);
        }
        self.checkpoint = Some(store);
        Ok(self)
    }

    pub fn stats(&self) -> &SolverStats {
        &self.stats
    }

    /// Read-only access to the transposition table, used by the frontier
    /// enumerator (spec.md 4.4) and by the driver's `frontier` command.
    pub fn table(&self) -> &HashMap<CanonicalKey, Outcome> {
        &self.table
    }

    /// Forces an unconditional checkpoint flush, bypassing the configured
    /// interval. Used by the driver's explicit `checkpoint` command; never
    /// called mid-frame by the solver itself.
    pub fn flush_checkpoint(&mut self) -> Result<()> {
        let Some(store) = self.checkpoint.as_ref() else {
            return Ok(());
        };
        store.put_many(&self.pending_checkpoint)?;
        self.pending_checkpoint.clear();
        for (key, value) in self.stats.to_meta_pairs() {
            store.put_meta(key, &value)?;
        }
        self.last_checkpoint = Some(Instant::now());
        Ok(())
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// The cooperative cancellation point (spec.md 5): the driver's signal
    /// handler flips this from outside; `solve` polls it at every frame
    /// iteration.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn outcome_of(&self, position: &Position) -> Option<Outcome> {
        self.table.get(&canonicalize(encode(position))).copied()
    }

    /// Among `position`'s legal moves whose child outcome is known, the one
    /// that maximises (P1) or minimises (P2) that outcome.
    pub fn best_move(&self, position: &Position) -> Option<(Move, Outcome)> {
        let mover = position.to_move;
        self.all_move_outcomes(position)
            .into_iter()
            .filter_map(|(mv, outcome)| outcome.map(|o| (mv, o)))
            .max_by_key(|(_, outcome)| outcome.value() * mover.perspective())
    }

    pub fn all_move_outcomes(&self, position: &Position) -> Vec<(Move, Option<Outcome>)> {
        let mut working = *position;
        generate_moves(position)
            .into_iter()
            .map(|mv| {
                let (result, undo_token) = apply_unchecked_engine(&mut working, mv);
                let outcome = match result {
                    PlyResult::Win(winner) => Some(Outcome::win_for(winner)),
                    PlyResult::Ongoing => self.outcome_of(&working),
                };
                undo(&mut working, &undo_token);
                (mv, outcome)
            })
            .collect()
    }

    /// Prepares the child descriptor list for a freshly pushed frame by
    /// simulating every legal move (apply then undo) against `position`,
    /// without leaving any net mutation behind.
    fn prepare_children(&mut self, position: &mut Position) -> Vec<ChildDescriptor> {
        let mover = position.to_move;
        let mut children: Vec<ChildDescriptor> = generate_moves(position)
            .into_iter()
            .map(|mv| {
                let (result, undo_token) = apply_unchecked_engine(position, mv);
                let child_canonical = canonicalize(encode(position));
                let terminal = match result {
                    PlyResult::Win(winner) => Some(Outcome::win_for(winner)),
                    PlyResult::Ongoing => None,
                };
                undo(position, &undo_token);
                ChildDescriptor { mv, child_canonical, terminal }
            })
            .collect();
        order_children(&mut children, mover, &self.table);
        children
    }

    fn push_frame(&mut self, position: &mut Position, undo_token: Option<UndoToken>) -> Frame {
        let canonical = canonicalize(encode(position));
        let mover = position.to_move;
        let children = self.prepare_children(position);
        self.path.insert(canonical);
        Frame { canonical, mover, children, cursor: 0, outcomes: Vec::new(), undo: undo_token }
    }

    fn record_outcome(&mut self, canonical: CanonicalKey, outcome: Outcome) {
        if let Some(&existing) = self.table.get(&canonical) {
            debug_assert_eq!(existing, outcome, "transposition table entry rewritten with a different outcome");
        } else {
            self.pending_checkpoint.push((canonical, outcome));
        }
        self.table.insert(canonical, outcome);
        self.stats.positions_evaluated += 1;
    }

    fn maybe_checkpoint(&mut self) {
        let Some(store) = self.checkpoint.as_ref() else { return };
        let due = self
            .last_checkpoint
            .is_none_or(|t| t.elapsed() >= self.config.checkpoint_interval);
        if !due || self.pending_checkpoint.is_empty() {
            return;
        }
        match store.put_many(&self.pending_checkpoint) {
            Ok(()) => {
                self.pending_checkpoint.clear();
                for (key, value) in self.stats.to_meta_pairs() {
                    if let Err(e) = store.put_meta(key, &value) {
                        warn!("failed to write checkpoint meta {key}: {e}");
                    }
                }
                self.last_checkpoint = Some(Instant::now());
            }
            Err(e) => warn!("checkpoint write failed, will retry next interval: {e}"),
        }
    }

    fn maybe_log_progress(&self, started_logging_at: &mut Instant) {
        if started_logging_at.elapsed() >= self.config.progress_interval {
            info!(
                "solving: {} positions evaluated, {} cache hits, max depth {}",
                self.stats.positions_evaluated, self.stats.cache_hits, self.stats.max_depth
            );
            *started_logging_at = Instant::now();
        }
    }

    /// Runs the iterative minimax over `position`'s game DAG, populating the
    /// table and returning the root's outcome, or `None` if the cancel flag
    /// was observed before the root resolved. On cancellation the shared
    /// `position` is restored to its original value before returning.
    pub fn solve(&mut self, position: &mut Position) -> Option<Outcome> {
        if let Some(outcome) = self.outcome_of(position) {
            return Some(outcome);
        }

        let mut stack: Vec<Frame> = Vec::with_capacity(self.config.path_capacity);
        stack.push(self.push_frame(position, None));
        let mut last_progress_log = Instant::now();

        loop {
            if self.cancel.load(Ordering::Relaxed) {
                self.unwind(position, &mut stack);
                self.maybe_checkpoint();
                return None;
            }
            self.maybe_log_progress(&mut last_progress_log);
            self.stats.max_depth = self.stats.max_depth.max(stack.len() as u32);

            let frame_len = stack.last().unwrap().children.len();
            let cursor = stack.last().unwrap().cursor;

            if cursor >= frame_len {
                let finished = stack.pop().unwrap();
                let outcome = match Outcome::best_for(finished.mover, finished.outcomes.iter().copied()) {
                    Some(outcome) => outcome,
                    None => {
                        // Zugzwang: the mover at this frame had no legal moves.
                        Outcome::win_for(finished.mover.opponent())
                    }
                };
                self.path.remove(&finished.canonical);
                self.record_outcome(finished.canonical, outcome);
                if let Some(undo_token) = &finished.undo {
                    undo(position, undo_token);
                }

                match stack.last_mut() {
                    Some(parent) => {
                        parent.outcomes.push(outcome);
                        parent.cursor += 1;
                        if should_prune(&self.config, parent.mover, outcome) {
                            parent.cursor = parent.children.len();
                        }
                    }
                    None => {
                        self.maybe_checkpoint();
                        return Some(outcome);
                    }
                }
                self.maybe_checkpoint();
                continue;
            }

            let descriptor = stack.last().unwrap().children[cursor];

            if self.path.contains(&descriptor.child_canonical) {
                self.stats.cycle_draws += 1;
                let frame = stack.last_mut().unwrap();
                frame.outcomes.push(Outcome::Draw);
                frame.cursor += 1;
                continue;
            }

            if let Some(&stored) = self.table.get(&descriptor.child_canonical) {
                self.stats.cache_hits += 1;
                let mover = stack.last().unwrap().mover;
                let frame = stack.last_mut().unwrap();
                frame.outcomes.push(stored);
                frame.cursor += 1;
                if should_prune(&self.config, mover, stored) {
                    frame.cursor = frame.children.len();
                }
                continue;
            }

            if let Some(terminal) = descriptor.terminal {
                self.stats.terminal_positions += 1;
                let mover = stack.last().unwrap().mover;
                let frame = stack.last_mut().unwrap();
                frame.outcomes.push(terminal);
                frame.cursor += 1;
                if should_prune(&self.config, mover, terminal) {
                    frame.cursor = frame.children.len();
                }
                continue;
            }

            let (_result, undo_token) = apply_unchecked_engine(position, descriptor.mv);
            let child_frame = self.push_frame(position, Some(undo_token));
            debug_assert_eq!(child_frame.canonical, descriptor.child_canonical);
            stack.push(child_frame);
        }
    }

    /// Restores `position` to the value it held before `stack`'s frames were
    /// pushed, in LIFO order, without recording any outcomes for the
    /// unresolved frames.
    fn unwind(&mut self, position: &mut Position, stack: &mut Vec<Frame>) {
        while let Some(frame) = stack.pop() {
            self.path.remove(&frame.canonical);
            if let Some(undo_token) = &frame.undo {
                undo(position, undo_token);
            }
        }
        debug!("search cancelled, position restored to pre-solve state");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::position::Size;

    /// Most pieces already committed and locked under Large tops, one P2
    /// Large left in reserve: a small, quickly-exhaustible subtree rather
    /// than the full from-scratch game (which this solver does not attempt
    /// to exhaust in a test — see `table_is_never_rewritten_to_a_different_outcome`).
    fn bounded_subtree_position() -> Position {
        let mut position = Position::starting();

        position.cell_mut(0, 0).set(Size::Small, Some(Player::P1));
        position.cell_mut(0, 0).set(Size::Medium, Some(Player::P2));
        position.cell_mut(0, 0).set(Size::Large, Some(Player::P1));

        position.cell_mut(0, 1).set(Size::Small, Some(Player::P2));
        position.cell_mut(0, 1).set(Size::Medium, Some(Player::P1));
        position.cell_mut(0, 1).set(Size::Large, Some(Player::P2));

        position.cell_mut(0, 2).set(Size::Medium, Some(Player::P2));
        position.cell_mut(0, 2).set(Size::Large, Some(Player::P1));

        position.cell_mut(1, 0).set(Size::Small, Some(Player::P1));
        position.cell_mut(1, 1).set(Size::Medium, Some(Player::P1));
        position.cell_mut(1, 2).set(Size::Small, Some(Player::P2));

        *position.reserve_mut(Player::P1, Size::Small) = 0;
        *position.reserve_mut(Player::P1, Size::Medium) = 0;
        *position.reserve_mut(Player::P1, Size::Large) = 0;
        *position.reserve_mut(Player::P2, Size::Small) = 0;
        *position.reserve_mut(Player::P2, Size::Medium) = 0;
        *position.reserve_mut(Player::P2, Size::Large) = 1;

        position.to_move = Player::P2;
        position
    }

    #[test]
    fn solve_resolves_a_bounded_subtree_and_restores_the_position() {
        let base = bounded_subtree_position();
        let mut solver = Solver::new(SolverConfig::new());
        let mut position = base;
        let outcome = solver.solve(&mut position).unwrap();
        // the root's outcome isn't asserted to a specific value here (that
        // would be a guess); only that the solve terminates and leaves the
        // caller's position untouched.
        assert!(matches!(outcome, Outcome::P1Wins | Outcome::Draw | Outcome::P2Wins));
        assert_eq!(position, base);
    }

    #[test]
    fn alpha_beta_agrees_with_exhaustive_search_on_a_small_subtree() {
        let mut base = Position::starting();
        *base.reserve_mut(Player::P1, Size::Small) -= 1;
        base.cell_mut(1, 1).set(Size::Small, Some(Player::P1));
        base.to_move = Player::P2;

        let mut pruned = Solver::new(SolverConfig::new().with_alpha_beta(true));
        let mut unpruned = Solver::new(SolverConfig::new().with_alpha_beta(false));

        let mut p1 = base;
        let mut p2 = base;
        let pruned_outcome = pruned.solve(&mut p1).unwrap();
        let unpruned_outcome = unpruned.solve(&mut p2).unwrap();
        assert_eq!(pruned_outcome, unpruned_outcome);

        for (canonical, outcome) in pruned.table.iter() {
            if let Some(other) = unpruned.table.get(canonical) {
                assert_eq!(outcome, other, "pruned and unpruned tables disagree on a shared key");
            }
        }
    }

    #[test]
    fn table_is_never_rewritten_to_a_different_outcome() {
        let base = bounded_subtree_position();
        let mut solver = Solver::new(SolverConfig::new());
        let mut position = base;
        solver.solve(&mut position).unwrap();
        let snapshot = solver.table.clone();
        let mut reposed = base;
        solver.solve(&mut reposed).unwrap();
        for (canonical, outcome) in snapshot {
            assert_eq!(solver.table.get(&canonical), Some(&outcome));
        }
    }

    #[test]
    fn cycle_draw_is_not_threefold_repetition() {
        // A path-set cycle contributes a draw to exactly one frame's children
        // the first time the search revisits a position on the active path;
        // it is not a counter tracking visits across the whole game history,
        // which this solver never retains (spec.md 9, open question 2).
        let mut solver = Solver::new(SolverConfig::new());
        let mut position = bounded_subtree_position();
        solver.solve(&mut position).unwrap();
        assert!(solver.stats.cycle_draws > 0 || solver.stats.positions_evaluated > 0);
    }
}
