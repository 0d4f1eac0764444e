use crate::board::{Color, Piece};
use crate::config::{CASTLING_BONUS, PIECE_VALUES};
use crate::position::Position;

/// Static scorer: material plus a small bonus per castling right still held.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator {
    // Pawn, Knight, Bishop, Rook, Queen, King
    pub piece_values: [i32; Piece::COUNT],
    pub castling_bonus: i32,
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            piece_values: PIECE_VALUES,
            castling_bonus: CASTLING_BONUS,
        }
    }

    pub fn piece_value(&self, piece: Piece) -> i32 {
        self.piece_values[piece.index()]
    }

    /// Scores `position` for the side to move: positive means the mover is ahead.
    pub fn evaluate<P: Position>(&self, position: &P) -> i32 {
        let us = position.side_to_move();
        let mut score = 0;

        for color in [Color::White, Color::Black] {
            let sign = if color == us { 1 } else { -1 };

            for piece in Piece::ALL {
                score += sign * self.piece_value(piece) * position.piece_count(piece, color) as i32;
            }

            if position.has_kingside_castle_right(color) {
                score += sign * self.castling_bonus;
            }
            if position.has_queenside_castle_right(color) {
                score += sign * self.castling_bonus;
            }
        }

        score
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;

    fn eval(fen: &str) -> i32 {
        Evaluator::new().evaluate(&Board::from_fen(fen).unwrap())
    }

    #[test]
    fn test_initial_position_is_balanced() {
        assert_eq!(Evaluator::new().evaluate(&Board::new()), 0);
    }

    #[test]
    fn test_material_is_scored_for_side_to_move() {
        // Black is missing the b8 knight
        assert_eq!(eval("r1bqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"), 300);
        assert_eq!(eval("r1bqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR b KQkq - 0 1"), -300);
    }

    #[test]
    fn test_castling_rights_bonus() {
        assert_eq!(eval("r3k2r/8/8/8/8/8/8/R3K2R w KQ - 0 1"), 10);
        assert_eq!(eval("r3k2r/8/8/8/8/8/8/R3K2R b KQ - 0 1"), -10);
        assert_eq!(eval("r3k2r/8/8/8/8/8/8/R3K2R w Kq - 0 1"), 0);
    }

    #[test]
    fn test_evaluation_is_antisymmetric() {
        let white = eval("4k3/8/8/3q4/8/8/PPP5/4K3 w - - 0 1");
        let black = eval("4k3/8/8/3q4/8/8/PPP5/4K3 b - - 0 1");
        assert_eq!(white, 300 - 900);
        assert_eq!(white, -black);
    }
}
