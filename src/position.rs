//! The narrow interface the search consumes from a game implementation.
//!
//! The search never copies a position: it applies a move, looks at the result and undoes it
//! again on one shared instance, so `make_move` / `undo_move` calls are always strictly nested.

use std::fmt::{Debug, Display};

use crate::board::{Color, Piece};

/// What the search needs to know about a single move.
///
/// `Display` is used when the search logs its progress.
pub trait SearchMove: Copy + PartialEq + Debug + Display {
    fn is_capture(&self) -> bool;

    /// Kind of the piece removed by this move, if any.
    fn captured_piece(&self) -> Option<Piece>;

    fn moving_piece(&self) -> Piece;

    fn is_promotion(&self) -> bool;

    fn promotion_piece(&self) -> Option<Piece>;
}

/// A mutable game state the search can walk.
pub trait Position {
    type Move: SearchMove;

    /// Every legal move in the current state, in the generator's natural order.
    fn legal_moves(&self) -> Vec<Self::Move>;

    /// The subset of [`Position::legal_moves`] that captures a piece.
    fn capture_moves(&self) -> Vec<Self::Move>;

    fn make_move(&mut self, mv: Self::Move);

    /// Reverts `mv`, which must be the most recently applied move that is still in effect.
    fn undo_move(&mut self, mv: Self::Move);

    /// Whether the side to move has been checkmated.
    fn is_checkmate(&self) -> bool;

    fn is_draw(&self) -> bool;

    fn side_to_move(&self) -> Color;

    fn has_kingside_castle_right(&self, color: Color) -> bool;

    fn has_queenside_castle_right(&self, color: Color) -> bool;

    fn piece_count(&self, piece: Piece, color: Color) -> u32;

    /// 64-bit identity of the current state. Equal states must produce equal keys.
    fn key(&self) -> u64;
}
