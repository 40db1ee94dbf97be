use std::ops::Neg;

use crate::core::consts::{BOARD_SIZE, LINES, NUM_SIZES, PIECES_PER_SIZE};
use crate::utils::prelude::*;

/// A binary tag identifying one of the two players. The opponent of a
/// player is always the other variant.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Player {
    P1 = 0,
    P2 = 1,
}

impl Player {
    /// The other player.
    pub fn opponent(&self) -> Player {
        -*self
    }

    /// Scoring sign: +1 for P1, -1 for P2. Lets outcome comparisons be
    /// written without a branch on which player is asking.
    pub fn perspective(&self) -> i8 {
        match self {
            Player::P1 => 1,
            Player::P2 => -1,
        }
    }
}

impl Neg for Player {
    type Output = Player;
    fn neg(self) -> Player {
        match self {
            Player::P1 => Player::P2,
            Player::P2 => Player::P1,
        }
    }
}

impl From<u8> for Player {
    fn from(value: u8) -> Self {
        match value {
            0 => Player::P1,
            1 => Player::P2,
            _ => panic!("expected a player bit of 0 or 1, received {value}"),
        }
    }
}

/// The three piece sizes, ordered small to large. A piece can only gobble
/// a piece strictly smaller than itself.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Size {
    Small = 0,
    Medium = 1,
    Large = 2,
}

impl Size {
    pub fn all() -> [Size; NUM_SIZES] {
        [Size::Small, Size::Medium, Size::Large]
    }

    pub fn notate(&self) -> &'static str {
        match self {
            Size::Small => "S",
            Size::Medium => "M",
            Size::Large => "L",
        }
    }
}

impl From<u8> for Size {
    fn from(value: u8) -> Self {
        match value {
            0 => Size::Small,
            1 => Size::Medium,
            2 => Size::Large,
            _ => panic!("expected a size of 0-2, received {value}"),
        }
    }
}

impl std::str::FromStr for Size {
    type Err = Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "S" | "s" => Ok(Size::Small),
            "M" | "m" => Ok(Size::Medium),
            "L" | "l" => Ok(Size::Large),
            _ => Err(anyhow!("invalid notation {s} for Size")),
        }
    }
}

/// A (player, size) pair identifying one physical piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Piece {
    pub player: Player,
    pub size: Size,
}

impl Piece {
    pub fn new(player: Player, size: Size) -> Piece {
        Piece { player, size }
    }

    /// `self` can gobble `other` iff `self` is strictly larger.
    pub fn can_gobble(&self, other: Size) -> bool {
        self.size > other
    }
}

/// A stack of up to three pieces, at most one per size, ordered small at
/// bottom to large at top. Only the top piece is ever visible: it is the
/// only piece that participates in win detection, move origin, or gobble
/// checks. The invariant that sizes strictly increase bottom-to-top is
/// never broken by any legal operation in this module.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Cell {
    slots: [Option<Player>; NUM_SIZES],
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.is_none())
    }

    /// The highest occupied size slot, i.e. the visible piece.
    pub fn top(&self) -> Option<Piece> {
        self.slots
            .iter()
            .enumerate()
            .rev()
            .find_map(|(i, slot)| slot.map(|player| Piece::new(player, Size::from(i as u8))))
    }

    pub fn at(&self, size: Size) -> Option<Player> {
        self.slots[size as usize]
    }

    /// Places a piece into its size slot. Callers are responsible for
    /// checking the gobble rule beforehand; this never checks it.
    pub fn set(&mut self, size: Size, player: Option<Player>) {
        self.slots[size as usize] = player;
    }

    /// Lifts and clears the top piece, returning it.
    pub fn lift_top(&mut self) -> Option<Piece> {
        let top = self.top()?;
        self.slots[top.size as usize] = None;
        Some(top)
    }
}

/// A single board outcome under optimal play: P2 wins, a draw, or P1 wins,
/// with the total order P2Wins < Draw < P1Wins so that minimax reduces to
/// plain `max`/`min` over a slice of outcomes.
#[repr(i8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Outcome {
    P2Wins = -1,
    Draw = 0,
    P1Wins = 1,
}

impl Outcome {
    pub fn value(&self) -> i8 {
        *self as i8
    }

    pub fn from_value(value: i8) -> Result<Outcome> {
        match value {
            -1 => Ok(Outcome::P2Wins),
            0 => Ok(Outcome::Draw),
            1 => Ok(Outcome::P1Wins),
            _ => Err(anyhow!("invalid outcome byte {value}")),
        }
    }

    /// The outcome that favours `winner` absolutely.
    pub fn win_for(winner: Player) -> Outcome {
        match winner {
            Player::P1 => Outcome::P1Wins,
            Player::P2 => Outcome::P2Wins,
        }
    }

    /// Picks the best of `outcomes` from `mover`'s perspective: `max` for
    /// P1, `min` for P2. Returns `None` for an empty slice (the caller's
    /// signal for zugzwang).
    pub fn best_for(mover: Player, outcomes: impl Iterator<Item = Outcome>) -> Option<Outcome> {
        match mover {
            Player::P1 => outcomes.max(),
            Player::P2 => outcomes.min(),
        }
    }
}

/// The complete semantic state the solver reasons over: the board, each
/// player's off-board reserves, and the side to move.
///
/// Invariants, checked by [`Position::check_invariants`] and otherwise
/// guaranteed by construction:
/// 1. `reserve(player, size) + on_board(player, size) == 2` for every pair.
/// 2. Within any cell, occupied slots strictly increase in size bottom-to-top
///    (true by construction: [`Cell`] is indexed by size).
/// 3. No cell contains two pieces of the same size (true by construction).
/// 4. A cell's stack length is in `{0, 1, 2, 3}` (true by construction).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    pub grid: [[Cell; BOARD_SIZE]; BOARD_SIZE],
    reserves: [[u8; NUM_SIZES]; 2],
    pub to_move: Player,
}

impl Position {
    /// The empty board, P1 to move, every reserve full.
    pub fn starting() -> Position {
        Position {
            grid: [[Cell::default(); BOARD_SIZE]; BOARD_SIZE],
            reserves: [[PIECES_PER_SIZE as u8; NUM_SIZES]; 2],
            to_move: Player::P1,
        }
    }

    pub fn reserve(&self, player: Player, size: Size) -> u8 {
        self.reserves[player as usize][size as usize]
    }

    pub(crate) fn reserve_mut(&mut self, player: Player, size: Size) -> &mut u8 {
        &mut self.reserves[player as usize][size as usize]
    }

    pub fn cell(&self, row: usize, col: usize) -> Cell {
        self.grid[row][col]
    }

    pub fn cell_mut(&mut self, row: usize, col: usize) -> &mut Cell {
        &mut self.grid[row][col]
    }

    /// Whether a placement of `piece` onto `(row, col)` is legal under the
    /// gobble rule: the cell is empty, or `piece` strictly exceeds the
    /// current top's size (property test 6).
    pub fn can_gobble_at(&self, piece: Piece, row: usize, col: usize) -> bool {
        match self.grid[row][col].top() {
            None => true,
            Some(top) => piece.can_gobble(top.size),
        }
    }

    /// A line is fully occupied by `player`'s tops, i.e. a completed win
    /// for `player`.
    pub fn line_won_by(&self, line: &[(usize, usize); BOARD_SIZE], player: Player) -> bool {
        line.iter().all(|&(r, c)| {
            self.grid[r][c]
                .top()
                .is_some_and(|piece| piece.player == player)
        })
    }

    /// Every line currently won by `player`.
    pub fn winning_lines_for(&self, player: Player) -> impl Iterator<Item = &'static [(usize, usize); BOARD_SIZE]> {
        LINES.iter().filter(move |line| self.line_won_by(line, player))
    }

    /// Asserts the four position invariants from spec.md 3. Internal
    /// assertion failures here are a solver bug, not a recoverable error
    /// (spec.md 7): the caller should treat a returned `Err` as fatal.
    pub fn check_invariants(&self) -> Result<()> {
        for player in [Player::P1, Player::P2] {
            for size in Size::all() {
                let mut on_board = 0u8;
                for row in &self.grid {
                    for cell in row {
                        if cell.at(size) == Some(player) {
                            on_board += 1;
                        }
                    }
                }
                let reserve = self.reserve(player, size);
                if reserve + on_board != PIECES_PER_SIZE as u8 {
                    return Err(anyhow!(
                        "invariant violated: {player:?} {size:?} reserve {reserve} + on-board {on_board} != {PIECES_PER_SIZE}"
                    ));
                }
            }
        }
        Ok(())
    }
}
