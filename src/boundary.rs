//! The external-interface functions spec.md 6 names directly: base64
//! canonical lookups and move suggestions, as consumed by an external game
//! server. These are thin wrappers over [`Solver`] and [`decode`]; the
//! boundary they guard is "a string came in from outside the process".

use crate::core::encoding::{decode, CanonicalKey};
use crate::core::moves::Move;
use crate::core::position::Outcome;
use crate::solver::Solver;
use crate::utils::prelude::*;

/// One of `"p1_wins" | "p2_wins" | "draw" | "unsolved"` (spec.md 6),
/// looked up by decoding `canonical_base64` and querying `solver`'s table.
pub fn outcome_of_base64(solver: &Solver, canonical_base64: &str) -> Result<&'static str> {
    let key = CanonicalKey::from_base64(canonical_base64)?;
    let position = decode(key.0)?;
    Ok(match solver.outcome_of(&position) {
        Some(Outcome::P1Wins) => "p1_wins",
        Some(Outcome::P2Wins) => "p2_wins",
        Some(Outcome::Draw) => "draw",
        None => "unsolved",
    })
}

/// Every legal move from the position `canonical_base64` decodes to,
/// paired with its child outcome where known, sorted by the mover's
/// preference (best first): wins, then draws, then losses, then unknowns.
pub fn best_moves(solver: &Solver, canonical_base64: &str) -> Result<Vec<(Move, Option<Outcome>)>> {
    let key = CanonicalKey::from_base64(canonical_base64)?;
    let position = decode(key.0)?;
    let mover = position.to_move;

    let mut moves = solver.all_move_outcomes(&position);
    moves.sort_by_key(|(_, outcome)| match outcome {
        Some(o) => (0u8, -(o.value() as i32) * mover.perspective() as i32),
        None => (1u8, 0),
    });
    Ok(moves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::encoding::{canonicalize, encode};
    use crate::core::position::{Player, Position, Size};
    use crate::solver::SolverConfig;

    #[test]
    fn unsolved_root_reports_unsolved() {
        let solver = Solver::new(SolverConfig::new());
        let key = canonicalize(encode(&Position::starting()));
        assert_eq!(outcome_of_base64(&solver, &key.to_base64()).unwrap(), "unsolved");
    }

    /// Most pieces already committed and locked under Large tops, one P2
    /// Large left in reserve: a small, quickly-exhaustible subtree rather
    /// than the full from-scratch game.
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
    fn solved_position_reports_a_settled_outcome() {
        let mut solver = Solver::new(SolverConfig::new());
        let mut position = bounded_subtree_position();
        solver.solve(&mut position).unwrap();
        let key = canonicalize(encode(&position));
        let reported = outcome_of_base64(&solver, &key.to_base64()).unwrap();
        assert!(["p1_wins", "p2_wins", "draw"].contains(&reported));
    }

    #[test]
    fn best_moves_reports_every_move_once_solved() {
        let mut solver = Solver::new(SolverConfig::new());
        let mut position = bounded_subtree_position();
        solver.solve(&mut position).unwrap();
        let key = canonicalize(encode(&position));
        let moves = best_moves(&solver, &key.to_base64()).unwrap();
        assert!(!moves.is_empty());
        // every move's outcome is known once the root itself is solved
        assert!(moves.iter().all(|(_, outcome)| outcome.is_some()));
    }

    #[test]
    fn rejects_malformed_base64() {
        let solver = Solver::new(SolverConfig::new());
        assert!(outcome_of_base64(&solver, "not valid base64!!").is_err());
    }
}
