use std::fmt;

/// The two error kinds spec.md 7 calls out as needing a specific,
/// matchable variant at a boundary. Everywhere else in the core, errors
/// are plain `anyhow::Error` built with `anyhow!`/`.context(...)`, as in
/// the rest of this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GobblersError {
    /// A consumer submitted a move that `generate_moves` would not have
    /// produced. The core rejects it; no state changes.
    IllegalMove(String),
    /// A base64 blob decoded to 8 bytes but the bit pattern violates a
    /// position invariant (a corrupt or hand-crafted encoding).
    InvalidEncoding(String),
}

impl fmt::Display for GobblersError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GobblersError::IllegalMove(msg) => write!(f, "illegal move: {msg}"),
            GobblersError::InvalidEncoding(msg) => write!(f, "invalid encoding: {msg}"),
        }
    }
}

impl std::error::Error for GobblersError {}
