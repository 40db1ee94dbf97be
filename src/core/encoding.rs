use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use serde::Serialize;

use crate::core::consts::{BOARD_SIZE, CELL_BITS, NUM_SIZES, PIECES_PER_SIZE, TO_MOVE_BIT};
use crate::core::error::GobblersError;
use crate::core::position::{Cell, Player, Position, Size};
use crate::utils::prelude::*;

/// The numerically smallest 64-bit encoding among a position's eight D4
/// symmetries. This is the transposition table's key: two board
/// orientations of the same position collide on purpose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalKey(pub u64);

impl CanonicalKey {
    /// Big-endian 8-byte sequence, standard base64, padding omitted
    /// (spec.md 6). Round-trips bit-exactly with [`CanonicalKey::from_base64`].
    pub fn to_base64(&self) -> String {
        STANDARD_NO_PAD.encode(self.0.to_be_bytes())
    }

    pub fn from_base64(s: &str) -> Result<CanonicalKey> {
        let bytes = STANDARD_NO_PAD
            .decode(s)
            .map_err(|e| anyhow!("invalid base64 canonical {s}: {e}"))?;
        let arr: [u8; 8] = bytes
            .try_into()
            .map_err(|_| anyhow!("canonical must decode to exactly 8 bytes"))?;
        Ok(CanonicalKey(u64::from_be_bytes(arr)))
    }
}

impl std::fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_base64())
    }
}

/// Serializes as the raw 64-bit integer (the frontier export's
/// `canonical:u64` field, spec.md 6), not the base64 wire form — callers
/// that want the wire form use [`CanonicalKey::to_base64`] explicitly.
impl Serialize for CanonicalKey {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u64(self.0)
    }
}

fn cell_index(row: usize, col: usize) -> usize {
    row * BOARD_SIZE + col
}

fn slot_value(player: Option<Player>) -> u64 {
    match player {
        None => 0,
        Some(Player::P1) => 1,
        Some(Player::P2) => 2,
    }
}

/// Packs a cell's three size slots into a 6-bit field, Small first (LSB).
fn encode_cell(cell: Cell) -> u64 {
    let mut bits = 0u64;
    for size in Size::all() {
        bits |= slot_value(cell.at(size)) << (2 * size as u32);
    }
    bits
}

/// Packs the board and side-to-move into a 64-bit integer, per the bit
/// layout in spec.md 3: nine row-major 6-bit cells in bits 0..53, the
/// to-move bit at bit 54, and zero above that. Reserves are not encoded;
/// they are fully determined by the board (position invariant 1).
pub fn encode(position: &Position) -> u64 {
    let mut bits = 0u64;
    for row in 0..BOARD_SIZE {
        for col in 0..BOARD_SIZE {
            let cell_bits = encode_cell(position.cell(row, col));
            bits |= cell_bits << (cell_index(row, col) as u32 * CELL_BITS);
        }
    }
    if position.to_move == Player::P2 {
        bits |= 1u64 << TO_MOVE_BIT;
    }
    bits
}

/// Reconstructs a position from its 64-bit encoding, deriving reserves as
/// `2 - on_board_count(player, size)` (spec.md 4.1). Rejects bit patterns
/// that cannot come from a legal position: reserved high bits set, a
/// 2-bit slot holding the unused value 3, or a (player, size) with more
/// than two pieces on the board (property: corrupt encodings never panic,
/// they return `InvalidEncoding`, spec.md 7).
pub fn decode(bits: u64) -> Result<Position, GobblersError> {
    if bits >> (TO_MOVE_BIT + 1) != 0 {
        return Err(GobblersError::InvalidEncoding(format!(
            "bits above {} must be zero, got {bits:#x}",
            TO_MOVE_BIT
        )));
    }

    let mut position = Position::starting();
    let mut on_board = [[0u8; NUM_SIZES]; 2];
    for row in 0..BOARD_SIZE {
        for col in 0..BOARD_SIZE {
            let cell_bits = cell_bits_at(bits, row, col);
            let mut cell = Cell::default();
            for size in Size::all() {
                let v = (cell_bits >> (2 * size as u32)) & 0b11;
                match v {
                    0 => {}
                    1 => {
                        cell.set(size, Some(Player::P1));
                        on_board[Player::P1 as usize][size as usize] += 1;
                    }
                    2 => {
                        cell.set(size, Some(Player::P2));
                        on_board[Player::P2 as usize][size as usize] += 1;
                    }
                    _ => {
                        return Err(GobblersError::InvalidEncoding(format!(
                            "cell ({row},{col}) size {size:?} has unused slot value {v}"
                        )))
                    }
                }
            }
            *position.cell_mut(row, col) = cell;
        }
    }

    for player in [Player::P1, Player::P2] {
        for size in Size::all() {
            let count = on_board[player as usize][size as usize];
            if count > PIECES_PER_SIZE as u8 {
                return Err(GobblersError::InvalidEncoding(format!(
                    "{player:?} has {count} {size:?} pieces on board, more than {PIECES_PER_SIZE}"
                )));
            }
            *position.reserve_mut(player, size) = PIECES_PER_SIZE as u8 - count;
        }
    }

    position.to_move = if (bits >> TO_MOVE_BIT) & 1 == 1 {
        Player::P2
    } else {
        Player::P1
    };
    Ok(position)
}

/// Returns the 6-bit field for the cell at `(row, col)` within `encoded`.
fn cell_bits_at(encoded: u64, row: usize, col: usize) -> u64 {
    let shift = cell_index(row, col) as u32 * CELL_BITS;
    let mask = (1u64 << CELL_BITS) - 1;
    (encoded >> shift) & mask
}

/// Rebuilds an encoding by placing `src`-indexed 6-bit cells at positions
/// given by `reindex(row, col)`, preserving the to-move bit.
fn permute_cells(encoded: u64, reindex: impl Fn(usize, usize) -> (usize, usize)) -> u64 {
    let mut bits = encoded & (1u64 << TO_MOVE_BIT); // keep the to-move bit, drop everything else
    for row in 0..BOARD_SIZE {
        for col in 0..BOARD_SIZE {
            let (new_row, new_col) = reindex(row, col);
            let cell_bits = cell_bits_at(encoded, row, col);
            bits |= cell_bits << (cell_index(new_row, new_col) as u32 * CELL_BITS);
        }
    }
    bits
}

/// Rotates the board 90 degrees: the cell at `(r, c)` moves to `(c, 2-r)`.
pub fn rotate_90(encoded: u64) -> u64 {
    permute_cells(encoded, |r, c| (c, BOARD_SIZE - 1 - r))
}

/// Reflects the board horizontally: the cell at `(r, c)` moves to `(r, 2-c)`.
pub fn reflect_h(encoded: u64) -> u64 {
    permute_cells(encoded, |r, c| (r, BOARD_SIZE - 1 - c))
}

/// All eight D4 symmetries of `e`: `e`, `reflect_h(e)`, and that pair after
/// each of 1, 2, 3 additional 90-degree rotations.
pub fn all_symmetries(e: u64) -> [u64; 8] {
    let mut out = [0u64; 8];
    let mut rotated = e;
    for i in 0..4 {
        out[2 * i] = rotated;
        out[2 * i + 1] = reflect_h(rotated);
        rotated = rotate_90(rotated);
    }
    out
}

/// The numerically smallest encoding among `e`'s eight symmetries.
/// Idempotent: `canonicalize(canonicalize(e)) == canonicalize(e)`.
pub fn canonicalize(e: u64) -> CanonicalKey {
    CanonicalKey(all_symmetries(e).into_iter().min().unwrap())
}

/// The number of distinct encodings among `e`'s eight symmetries; 8 is
/// typical, smaller only for positions with inherent symmetries
/// (property test 4).
pub fn symmetry_count(e: u64) -> usize {
    let mut seen = HashSet::new();
    for sym in all_symmetries(e) {
        seen.insert(sym);
    }
    seen.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::position::{Piece, Size};

    #[test]
    fn s6_empty_base64_decodes_to_starting_position() {
        let key = CanonicalKey::from_base64("AAAAAAAAAAA").unwrap();
        assert_eq!(key.0, 0);
        let position = decode(key.0).unwrap();
        for player in [Player::P1, Player::P2] {
            for size in Size::all() {
                assert_eq!(position.reserve(player, size), 2);
            }
        }
        assert_eq!(position.to_move, Player::P1);
    }

    #[test]
    fn base64_roundtrips_bit_exactly() {
        let key = CanonicalKey(0x1234_5678_9abc_def0 & ((1u64 << (TO_MOVE_BIT + 1)) - 1));
        let s = key.to_base64();
        assert_eq!(CanonicalKey::from_base64(&s).unwrap(), key);
    }

    #[test]
    fn s5_rotation_shares_canonical_key() {
        let mut position = Position::starting();
        *position.reserve_mut(Player::P1, Size::Small) -= 1;
        position.cell_mut(0, 0).set(Size::Small, Some(Player::P1));
        let e = encode(&position);
        let rotated = rotate_90(e);
        assert_ne!(e, rotated);
        assert_eq!(canonicalize(e), canonicalize(rotated));
    }

    #[test]
    fn decode_rejects_overflowing_slot_value() {
        // Cell (0,0)'s small slot set to the unused value 3.
        let bits = 0b11u64;
        assert!(decode(bits).is_err());
    }

    #[test]
    fn decode_rejects_too_many_pieces_of_one_kind() {
        // Three cells each hold a P1 small piece: on-board count of 3 > 2.
        let mut bits = 0u64;
        for cell in 0..3 {
            bits |= 1u64 << (cell as u32 * CELL_BITS);
        }
        assert!(decode(bits).is_err());
    }

    #[test]
    fn decode_rejects_reserved_high_bits() {
        assert!(decode(1u64 << (TO_MOVE_BIT + 1)).is_err());
    }

    #[test]
    fn encode_decode_roundtrip_on_starting_position() {
        let position = Position::starting();
        let decoded = decode(encode(&position)).unwrap();
        assert_eq!(decoded, position);
    }

    #[test]
    fn can_gobble_respects_strict_size_ordering() {
        let mut position = Position::starting();
        position.cell_mut(1, 1).set(Size::Small, Some(Player::P2));
        assert!(!position.can_gobble_at(Piece::new(Player::P1, Size::Small), 1, 1));
        assert!(position.can_gobble_at(Piece::new(Player::P1, Size::Medium), 1, 1));
    }
}
