use crate::core::consts::{BOARD_SIZE, LINES};
use crate::core::encoding::encode;
use crate::core::error::GobblersError;
use crate::core::position::{Piece, Player, Position, Size};
use crate::utils::prelude::*;

type Coord = (usize, usize);

/// A move a player can make: place a reserve piece, or slide an
/// already-placed piece from one cell to another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Move {
    Place { size: Size, to: Coord },
    Slide { from: Coord, to: Coord },
}

impl Move {
    pub fn to(&self) -> Coord {
        match self {
            Move::Place { to, .. } => *to,
            Move::Slide { to, .. } => *to,
        }
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Move::Place { size, to } => write!(f, "{}[{},{}]", size.notate(), to.0, to.1),
            Move::Slide { from, to } => write!(f, "({},{})->({},{})", from.0, from.1, to.0, to.1),
        }
    }
}

/// The outcome of a single completed ply (spec.md 4.2.4): either the game
/// continues, or one player has just won. Draws are never produced here;
/// the solver derives draws from path-cycle detection, not from `apply`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlyResult {
    Ongoing,
    Win(Player),
}

/// Enough information to exactly reverse one `apply_unchecked_engine` call.
#[derive(Clone, Copy, Debug)]
pub struct UndoToken {
    mv: Move,
    piece: Piece,
    /// Whether the piece actually reached its destination. False only for
    /// a slide that failed the reveal rule and was turned into a loss.
    completed: bool,
    /// Whether `to_move` was flipped and must be flipped back.
    flipped: bool,
}

fn all_cells() -> impl Iterator<Item = Coord> {
    (0..BOARD_SIZE).flat_map(|r| (0..BOARD_SIZE).map(move |c| (r, c)))
}

/// The winning lines for `player` that would appear if the top piece at
/// `origin` were lifted off, without mutating `position`.
fn winning_lines_after_lift(
    position: &Position,
    origin: Coord,
    player: Player,
) -> Vec<&'static [Coord; BOARD_SIZE]> {
    let mut sim = *position;
    sim.cell_mut(origin.0, origin.1).lift_top();
    sim.winning_lines_for(player).collect()
}

/// Cells present in every line of `lines`. Almost always one line, but a
/// lift at a cell shared by a row, column, and diagonal can open more than
/// one simultaneously, and the reveal rule requires blocking all of them.
fn intersection_of_lines(lines: &[&'static [Coord; BOARD_SIZE]]) -> HashSet<Coord> {
    let mut iter = lines.iter();
    let Some(first) = iter.next() else {
        return HashSet::new();
    };
    let mut acc: HashSet<Coord> = first.iter().copied().collect();
    for line in iter {
        let this: HashSet<Coord> = line.iter().copied().collect();
        acc = acc.intersection(&this).copied().collect();
    }
    acc
}

/// Legal destinations for sliding `piece` off of `origin`, respecting both
/// the gobble rule and the reveal rule (spec.md 4.2.1, 4.2.2). Empty if the
/// reveal rule leaves no safe square, in which case this piece cannot be
/// slid at all this turn.
fn slide_destinations(position: &Position, origin: Coord, piece: Piece) -> Vec<Coord> {
    let opponent_wins = winning_lines_after_lift(position, origin, piece.player.opponent());
    let candidates: Box<dyn Iterator<Item = Coord>> = if opponent_wins.is_empty() {
        Box::new(all_cells())
    } else {
        Box::new(intersection_of_lines(&opponent_wins).into_iter())
    };
    candidates
        .filter(|&to| to != origin && position.can_gobble_at(piece, to.0, to.1))
        .collect()
}

/// Enumerates the mover's legal moves in a fixed, deterministic order:
/// placements first (by size, then by cell), then slides (by origin cell,
/// then by destination). Order is irrelevant to correctness (spec.md
/// 4.2.3) but fixed so tests and move ordering can rely on it.
pub fn generate_moves(position: &Position) -> Vec<Move> {
    let mover = position.to_move;
    let mut moves = Vec::new();

    for size in Size::all() {
        if position.reserve(mover, size) == 0 {
            continue;
        }
        let piece = Piece::new(mover, size);
        for (row, col) in all_cells() {
            if position.can_gobble_at(piece, row, col) {
                moves.push(Move::Place { size, to: (row, col) });
            }
        }
    }

    for (row, col) in all_cells() {
        let Some(top) = position.cell(row, col).top() else {
            continue;
        };
        if top.player != mover {
            continue;
        }
        for to in slide_destinations(position, (row, col), top) {
            moves.push(Move::Slide { from: (row, col), to });
        }
    }

    moves
}

fn is_terminal_win(position: &Position, player: Player) -> bool {
    LINES.iter().any(|line| position.line_won_by(line, player))
}

/// Applies `mv` to `position` with no legality check: engine use only,
/// called on moves already produced by [`generate_moves`]. Still
/// re-derives the reveal outcome itself (spec.md 4.2.4's algorithm), so a
/// slide that cannot save against a revealed opponent line is turned into
/// a loss for the mover rather than silently executed.
pub fn apply_unchecked_engine(position: &mut Position, mv: Move) -> (PlyResult, UndoToken) {
    let mover = position.to_move;
    match mv {
        Move::Place { size, to } => {
            let piece = Piece::new(mover, size);
            *position.reserve_mut(mover, size) -= 1;
            position.cell_mut(to.0, to.1).set(size, Some(mover));

            if is_terminal_win(position, mover) {
                (
                    PlyResult::Win(mover),
                    UndoToken { mv, piece, completed: true, flipped: false },
                )
            } else {
                position.to_move = mover.opponent();
                (
                    PlyResult::Ongoing,
                    UndoToken { mv, piece, completed: true, flipped: true },
                )
            }
        }
        Move::Slide { from, to } => {
            let top = position
                .cell(from.0, from.1)
                .top()
                .expect("slide origin must have a piece to lift");
            position.cell_mut(from.0, from.1).lift_top();

            let opponent_wins: Vec<_> = position.winning_lines_for(mover.opponent()).collect();
            if !opponent_wins.is_empty() {
                let saves = to != from
                    && position.can_gobble_at(top, to.0, to.1)
                    && intersection_of_lines(&opponent_wins).contains(&to);
                if !saves {
                    return (
                        PlyResult::Win(mover.opponent()),
                        UndoToken { mv, piece: top, completed: false, flipped: false },
                    );
                }
            }

            position.cell_mut(to.0, to.1).set(top.size, Some(mover));
            if is_terminal_win(position, mover) {
                (
                    PlyResult::Win(mover),
                    UndoToken { mv, piece: top, completed: true, flipped: false },
                )
            } else {
                position.to_move = mover.opponent();
                (
                    PlyResult::Ongoing,
                    UndoToken { mv, piece: top, completed: true, flipped: true },
                )
            }
        }
    }
}

/// Reverses exactly the effects recorded by `token`, bit-for-bit (property
/// test 5: `undo(apply(p, m)) == p`).
pub fn undo(position: &mut Position, token: &UndoToken) {
    match token.mv {
        Move::Place { size, to } => {
            position.cell_mut(to.0, to.1).set(size, None);
            *position.reserve_mut(token.piece.player, size) += 1;
        }
        Move::Slide { from, to } => {
            if token.completed {
                position.cell_mut(to.0, to.1).set(token.piece.size, None);
            }
            position
                .cell_mut(from.0, from.1)
                .set(token.piece.size, Some(token.piece.player));
        }
    }
    if token.flipped {
        position.to_move = position.to_move.opponent();
    }
}

/// The boundary-safe entry point: rejects `mv` with `IllegalMove` unless it
/// is a member of `generate_moves(position)`, leaving `position` untouched
/// on rejection (spec.md 7).
pub fn try_apply(position: &mut Position, mv: Move) -> Result<(PlyResult, UndoToken), GobblersError> {
    if !generate_moves(position).contains(&mv) {
        return Err(GobblersError::IllegalMove(format!(
            "{mv} is not a legal continuation of this position"
        )));
    }
    Ok(apply_unchecked_engine(position, mv))
}

/// A small per-position memoization of `generate_moves`, analogous to the
/// teacher's `_valid_moves_cache`. `Position` itself stays `Copy` (the
/// solver's frame stack relies on cheap position snapshots), so the cache
/// lives alongside it rather than inside it: a caller that needs the same
/// frame's children more than once (a move-ordering pass, then iteration)
/// threads one `MoveCache` through both and only pays for `generate_moves`
/// once per distinct position.
#[derive(Default)]
pub struct MoveCache {
    key: Option<u64>,
    moves: Vec<Move>,
}

impl MoveCache {
    pub fn new() -> MoveCache {
        MoveCache::default()
    }

    /// Returns `position`'s legal moves, recomputing only if `position`
    /// differs (by encoding) from the last position this cache served.
    pub fn legal_moves(&mut self, position: &Position) -> &[Move] {
        let key = encode(position);
        if self.key != Some(key) {
            self.moves = generate_moves(position);
            self.key = Some(key);
        }
        &self.moves
    }
}
