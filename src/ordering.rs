use std::cmp::Reverse;

use crate::board::Piece;
use crate::config::PIECE_VALUES;
use crate::position::{Position, SearchMove};

/// Ranks moves so that likely refutations are searched first.
#[derive(Debug, Clone, Copy)]
pub struct MoveOrderer {
    piece_values: [i32; Piece::COUNT],
}

impl MoveOrderer {
    pub fn new() -> Self {
        Self {
            piece_values: PIECE_VALUES,
        }
    }

    fn value(&self, piece: Piece) -> i32 {
        self.piece_values[piece.index()]
    }

    /// Heuristic score of a single move. Quiet moves score 0.
    ///
    /// Captures score `10 * victim - attacker` (most valuable victim, least valuable attacker)
    /// and promotions add the value of the promoted piece.
    pub fn score<M: SearchMove>(&self, mv: &M) -> i32 {
        let mut score = 0;

        if mv.is_capture() {
            if let Some(victim) = mv.captured_piece() {
                score += 10 * self.value(victim) - self.value(mv.moving_piece());
            }
        }

        if mv.is_promotion() {
            if let Some(promotion) = mv.promotion_piece() {
                score += self.value(promotion);
            }
        }

        score
    }

    /// Sorts `moves` by descending score. Equal scores keep their original order.
    pub fn sort<M: SearchMove>(&self, moves: &mut [M]) {
        moves.sort_by_key(|mv| Reverse(self.score(mv)));
    }

    /// All legal moves of `position`, best candidates first.
    pub fn order<P: Position>(&self, position: &P) -> Vec<P::Move> {
        let mut moves = position.legal_moves();
        self.sort(&mut moves);
        moves
    }

    /// Legal captures of `position`, best candidates first.
    pub fn order_captures<P: Position>(&self, position: &P) -> Vec<P::Move> {
        let mut moves = position.capture_moves();
        self.sort(&mut moves);
        moves
    }
}

impl Default for MoveOrderer {
    fn default() -> Self {
        Self::new()
    }
}
