use std::fmt;

use crate::board::{
    square_name, squares, Board, Color, Piece, BLACK_KINGSIDE, BLACK_QUEENSIDE, WHITE_KINGSIDE,
    WHITE_QUEENSIDE,
};
use crate::position::SearchMove;

#[rustfmt::skip]
const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1), (-2, 1), (-1, -2), (-1, 2),
    (1, -2), (1, 2), (2, -1), (2, 1),
];

#[rustfmt::skip]
const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1), (0, 1),
    (1, -1), (1, 0), (1, 1),
];

const DIAGONALS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const ORTHOGONALS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

const PROMOTIONS: [Piece; 4] = [Piece::Queen, Piece::Rook, Piece::Bishop, Piece::Knight];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub from: u8,
    pub to: u8,
    pub piece: Piece,
    pub captured_piece: Option<Piece>,
    pub promotion: Option<Piece>,
    pub is_en_passant: bool,
    pub is_castling: bool,
}

impl Move {
    pub fn new(from: u8, to: u8, piece: Piece) -> Self {
        Self {
            from,
            to,
            piece,
            captured_piece: None,
            promotion: None,
            is_en_passant: false,
            is_castling: false,
        }
    }

    pub fn new_capture(from: u8, to: u8, piece: Piece, captured_piece: Piece) -> Self {
        Self {
            captured_piece: Some(captured_piece),
            ..Self::new(from, to, piece)
        }
    }

    pub fn new_en_passant(from: u8, to: u8) -> Self {
        Self {
            captured_piece: Some(Piece::Pawn),
            is_en_passant: true,
            ..Self::new(from, to, Piece::Pawn)
        }
    }

    pub fn new_castling(from: u8, to: u8) -> Self {
        Self {
            is_castling: true,
            ..Self::new(from, to, Piece::King)
        }
    }

    pub fn new_promotion(
        from: u8,
        to: u8,
        promotion: Piece,
        captured_piece: Option<Piece>,
    ) -> Self {
        Self {
            captured_piece,
            promotion: Some(promotion),
            ..Self::new(from, to, Piece::Pawn)
        }
    }

    /// Square the captured piece stands on. Differs from `to` only for en passant.
    pub fn captured_square(&self) -> u8 {
        if self.is_en_passant {
            (self.from / 8) * 8 + self.to % 8
        } else {
            self.to
        }
    }

    /// Rook origin and destination when this move castles.
    pub fn castling_rook_squares(&self) -> Option<(u8, u8)> {
        if !self.is_castling {
            return None;
        }
        if self.to > self.from {
            Some((self.from + 3, self.from + 1)) // Kingside
        } else {
            Some((self.from - 4, self.from - 1)) // Queenside
        }
    }
}

impl SearchMove for Move {
    fn is_capture(&self) -> bool {
        self.captured_piece.is_some()
    }

    fn captured_piece(&self) -> Option<Piece> {
        self.captured_piece
    }

    fn moving_piece(&self) -> Piece {
        self.piece
    }

    fn is_promotion(&self) -> bool {
        self.promotion.is_some()
    }

    fn promotion_piece(&self) -> Option<Piece> {
        self.promotion
    }
}

/// Coordinate notation, e.g. `e2e4` or `a7a8q`.
impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", square_name(self.from), square_name(self.to))?;
        if let Some(promotion) = self.promotion {
            write!(f, "{}", promotion.to_char(Color::Black))?;
        }
        Ok(())
    }
}

fn offset(square: u8, dr: i8, df: i8) -> Option<u8> {
    let rank = (square / 8) as i8 + dr;
    let file = (square % 8) as i8 + df;
    if (0..8).contains(&rank) && (0..8).contains(&file) {
        Some((rank * 8 + file) as u8)
    } else {
        None
    }
}

fn occupancy(pieces: &[u64; 6]) -> u64 {
    pieces.iter().fold(0, |acc, bb| acc | bb)
}

/// Whether any of `attackers` (belonging to `attacker_color`) hits `square` given `occupied`.
fn is_attacked(attackers: &[u64; 6], occupied: u64, square: u8, attacker_color: Color) -> bool {
    // Pawns attack diagonally forward, so look one rank behind the target
    let pawn_rank = match attacker_color {
        Color::White => -1,
        Color::Black => 1,
    };
    for df in [-1, 1] {
        if let Some(from) = offset(square, pawn_rank, df) {
            if attackers[Piece::Pawn.index()] & (1u64 << from) != 0 {
                return true;
            }
        }
    }

    for (offsets, piece) in [(KNIGHT_OFFSETS, Piece::Knight), (KING_OFFSETS, Piece::King)] {
        for (dr, df) in offsets {
            if let Some(from) = offset(square, dr, df) {
                if attackers[piece.index()] & (1u64 << from) != 0 {
                    return true;
                }
            }
        }
    }

    let queens = attackers[Piece::Queen.index()];
    for (directions, sliders) in [
        (DIAGONALS, attackers[Piece::Bishop.index()] | queens),
        (ORTHOGONALS, attackers[Piece::Rook.index()] | queens),
    ] {
        for (dr, df) in directions {
            let mut current = square;
            while let Some(next) = offset(current, dr, df) {
                let mask = 1u64 << next;
                if sliders & mask != 0 {
                    return true;
                }
                // Any other piece blocks the ray
                if occupied & mask != 0 {
                    break;
                }
                current = next;
            }
        }
    }

    false
}

// Pawn arrivals on the last rank fan out into one move per promotion piece.
fn push_pawn_move(
    moves: &mut Vec<Move>,
    from: u8,
    to: u8,
    captured: Option<Piece>,
    promotion_rank: u8,
) {
    if to / 8 == promotion_rank {
        for promotion in PROMOTIONS {
            moves.push(Move::new_promotion(from, to, promotion, captured));
        }
    } else {
        moves.push(Move {
            captured_piece: captured,
            ..Move::new(from, to, Piece::Pawn)
        });
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MoveGenerator;

impl MoveGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn is_square_under_attack(&self, board: &Board, square: u8, attacker_color: Color) -> bool {
        is_attacked(board.pieces(attacker_color), board.occupied(), square, attacker_color)
    }

    pub fn is_king_in_check(&self, board: &Board, color: Color) -> bool {
        match board.king_square(color) {
            Some(king_square) => {
                self.is_square_under_attack(board, king_square, color.opposite())
            }
            None => false,
        }
    }

    /// Plays `mv` on a scratch copy of the piece sets and checks the mover's king is safe.
    pub fn is_legal(&self, board: &Board, mv: &Move) -> bool {
        let us = board.side_to_move();
        let mut ours = *board.pieces(us);
        let mut theirs = *board.pieces(us.opposite());

        if let Some(captured) = mv.captured_piece {
            theirs[captured.index()] &= !(1u64 << mv.captured_square());
        }
        ours[mv.piece.index()] &= !(1u64 << mv.from);
        ours[mv.promotion.unwrap_or(mv.piece).index()] |= 1u64 << mv.to;
        if let Some((rook_from, rook_to)) = mv.castling_rook_squares() {
            ours[Piece::Rook.index()] &= !(1u64 << rook_from);
            ours[Piece::Rook.index()] |= 1u64 << rook_to;
        }

        let king = ours[Piece::King.index()];
        if king == 0 {
            return false;
        }
        let occupied = occupancy(&ours) | occupancy(&theirs);
        !is_attacked(&theirs, occupied, king.trailing_zeros() as u8, us.opposite())
    }

    /// All legal moves: pawn moves first, then the other pieces by kind and square, then castling.
    pub fn generate_moves(&self, board: &Board) -> Vec<Move> {
        let mut moves = self.generate_pseudo_legal(board);
        moves.retain(|mv| self.is_legal(board, mv));
        moves
    }

    /// Legal captures only, including en passant and capturing promotions.
    pub fn generate_captures(&self, board: &Board) -> Vec<Move> {
        let mut moves = self.generate_pseudo_legal(board);
        moves.retain(|mv| mv.captured_piece.is_some() && self.is_legal(board, mv));
        moves
    }

    fn generate_pseudo_legal(&self, board: &Board) -> Vec<Move> {
        let mut moves = Vec::with_capacity(64);
        let ours = board.pieces(board.side_to_move());

        self.generate_pawn_moves(board, &mut moves);

        for piece in [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen, Piece::King] {
            for from in squares(ours[piece.index()]) {
                match piece {
                    Piece::Knight => {
                        self.generate_steps(board, from, piece, &KNIGHT_OFFSETS, &mut moves)
                    }
                    Piece::King => {
                        self.generate_steps(board, from, piece, &KING_OFFSETS, &mut moves)
                    }
                    Piece::Bishop => {
                        self.generate_slides(board, from, piece, &DIAGONALS, &mut moves)
                    }
                    Piece::Rook => {
                        self.generate_slides(board, from, piece, &ORTHOGONALS, &mut moves)
                    }
                    Piece::Queen => {
                        self.generate_slides(board, from, piece, &DIAGONALS, &mut moves);
                        self.generate_slides(board, from, piece, &ORTHOGONALS, &mut moves);
                    }
                    Piece::Pawn => unreachable!(),
                }
            }
        }

        self.generate_castling(board, &mut moves);
        moves
    }

    // Quiet move or capture onto `to`, unless our own piece stands there.
    fn target(&self, board: &Board, from: u8, to: u8, piece: Piece) -> Option<Move> {
        let us = board.side_to_move();
        if board.occupancy(us) & (1u64 << to) != 0 {
            return None;
        }
        Some(match board.piece_kind_at(to, us.opposite()) {
            Some(captured) => Move::new_capture(from, to, piece, captured),
            None => Move::new(from, to, piece),
        })
    }

    fn generate_steps(
        &self,
        board: &Board,
        from: u8,
        piece: Piece,
        offsets: &[(i8, i8)],
        moves: &mut Vec<Move>,
    ) {
        for &(dr, df) in offsets {
            if let Some(to) = offset(from, dr, df) {
                moves.extend(self.target(board, from, to, piece));
            }
        }
    }

    fn generate_slides(
        &self,
        board: &Board,
        from: u8,
        piece: Piece,
        directions: &[(i8, i8)],
        moves: &mut Vec<Move>,
    ) {
        let occupied = board.occupied();
        for &(dr, df) in directions {
            let mut current = from;
            while let Some(to) = offset(current, dr, df) {
                moves.extend(self.target(board, from, to, piece));
                if occupied & (1u64 << to) != 0 {
                    break;
                }
                current = to;
            }
        }
    }

    fn generate_pawn_moves(&self, board: &Board, moves: &mut Vec<Move>) {
        let us = board.side_to_move();
        let them = us.opposite();
        let occupied = board.occupied();
        let (forward, start_rank, promotion_rank) = match us {
            Color::White => (1, 1, 7),
            Color::Black => (-1, 6, 0),
        };

        for from in squares(board.pieces(us)[Piece::Pawn.index()]) {
            if let Some(to) = offset(from, forward, 0) {
                if occupied & (1u64 << to) == 0 {
                    push_pawn_move(moves, from, to, None, promotion_rank);
                    if from / 8 == start_rank {
                        if let Some(double) = offset(to, forward, 0) {
                            if occupied & (1u64 << double) == 0 {
                                push_pawn_move(moves, from, double, None, promotion_rank);
                            }
                        }
                    }
                }
            }

            for df in [-1, 1] {
                let Some(to) = offset(from, forward, df) else {
                    continue;
                };
                if let Some(captured) = board.piece_kind_at(to, them) {
                    push_pawn_move(moves, from, to, Some(captured), promotion_rank);
                } else if board.en_passant_square() == Some(to) {
                    moves.push(Move::new_en_passant(from, to));
                }
            }
        }
    }

    fn generate_castling(&self, board: &Board, moves: &mut Vec<Move>) {
        let us = board.side_to_move();
        let them = us.opposite();
        let (king_square, kingside, queenside) = match us {
            Color::White => (4u8, WHITE_KINGSIDE, WHITE_QUEENSIDE),
            Color::Black => (60u8, BLACK_KINGSIDE, BLACK_QUEENSIDE),
        };

        let ours = board.pieces(us);
        if ours[Piece::King.index()] & (1u64 << king_square) == 0
            || self.is_square_under_attack(board, king_square, them)
        {
            return;
        }

        let occupied = board.occupied();
        let rooks = ours[Piece::Rook.index()];
        let empty = |squares: &[u8]| squares.iter().all(|&sq| occupied & (1u64 << sq) == 0);
        let safe = |squares: &[u8]| {
            squares
                .iter()
                .all(|&sq| !self.is_square_under_attack(board, sq, them))
        };

        if board.has_castling_right(kingside)
            && rooks & (1u64 << (king_square + 3)) != 0
            && empty(&[king_square + 1, king_square + 2])
            && safe(&[king_square + 1, king_square + 2])
        {
            moves.push(Move::new_castling(king_square, king_square + 2));
        }

        if board.has_castling_right(queenside)
            && rooks & (1u64 << (king_square - 4)) != 0
            && empty(&[king_square - 1, king_square - 2, king_square - 3])
            && safe(&[king_square - 1, king_square - 2])
        {
            moves.push(Move::new_castling(king_square, king_square - 2));
        }
    }
}
