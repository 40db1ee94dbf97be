/// Board side length; Gobblers is always played on a 3x3 grid.
pub const BOARD_SIZE: usize = 3;

/// Each player starts with two pieces of every size.
pub const PIECES_PER_SIZE: usize = 2;

/// Total distinct sizes a piece can have.
pub const NUM_SIZES: usize = 3;

/// Bit width of one cell's packed encoding (three 2-bit size slots).
pub const CELL_BITS: u32 = 2 * NUM_SIZES as u32;

/// The side-to-move bit's position in the 64-bit canonical encoding.
pub const TO_MOVE_BIT: u32 = (BOARD_SIZE * BOARD_SIZE) as u32 * CELL_BITS;

/// All eight (row, col) lines that can win the game: 3 rows, 3 columns, 2 diagonals.
pub const LINES: [[(usize, usize); BOARD_SIZE]; 8] = [
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    [(0, 0), (1, 1), (2, 2)],
    [(0, 2), (1, 1), (2, 0)],
];
