use std::mem;

use crate::transposition::TranspositionEntry;

/// Score of a forced mate. Every real evaluation stays strictly inside `(-INFINITY, INFINITY)`.
pub const INFINITY: i32 = 999_999;

pub const DRAW: i32 = 0;

/// Iterative deepening runs depths `1..MAX_DEPTH`.
pub const MAX_DEPTH: usize = 15;

/// Milliseconds one `choose_move` call may spend, counted from when it starts.
pub const TIME_THRESHOLD_MS: u64 = 1000;

pub const CACHE_MEMORY_BYTES: usize = 8 * 1024 * 1024;

/// Number of cache entries that fit in [`CACHE_MEMORY_BYTES`].
pub const CACHE_CAPACITY: usize = CACHE_MEMORY_BYTES / mem::size_of::<TranspositionEntry>();

/// Evaluation bonus per castling right still held.
pub const CASTLING_BONUS: i32 = 5;

// Pawn, Knight, Bishop, Rook, Queen, King
pub const PIECE_VALUES: [i32; 6] = [100, 300, 300, 500, 900, 10000];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    /// Exclusive upper bound on the iterative-deepening depth.
    pub max_depth: usize,

    pub time_threshold_ms: u64,

    /// Maximum number of transposition cache entries.
    pub cache_capacity: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            time_threshold_ms: TIME_THRESHOLD_MS,
            cache_capacity: CACHE_CAPACITY,
        }
    }
}
