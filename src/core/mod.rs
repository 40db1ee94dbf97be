pub mod consts;
pub mod encoding;
pub mod error;
pub mod moves;
pub mod notation;
pub mod position;

pub use encoding::{all_symmetries, canonicalize, decode, encode, rotate_90, reflect_h, symmetry_count, CanonicalKey};
pub use error::GobblersError;
pub use moves::{apply_unchecked_engine, generate_moves, try_apply, undo, Move, MoveCache, PlyResult, UndoToken};
pub use position::{Cell, Outcome, Piece, Player, Position, Size};
