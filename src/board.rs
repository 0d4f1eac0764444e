use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::movegen::{Move, MoveGenerator};
use crate::position::Position;

pub const STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

pub const WHITE_KINGSIDE: u8 = 0b0001;
pub const WHITE_QUEENSIDE: u8 = 0b0010;
pub const BLACK_KINGSIDE: u8 = 0b0100;
pub const BLACK_QUEENSIDE: u8 = 0b1000;

const ZOBRIST_SEED: u64 = 0x5A1_3011_D00D;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Piece {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl Piece {
    pub const COUNT: usize = 6;

    pub const ALL: [Piece; Piece::COUNT] = [
        Piece::Pawn,
        Piece::Knight,
        Piece::Bishop,
        Piece::Rook,
        Piece::Queen,
        Piece::King,
    ];

    /// Index of this piece in a `[u64; 6]` piece-set array.
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn to_char(self, color: Color) -> char {
        let c = match self {
            Piece::Pawn => 'p',
            Piece::Knight => 'n',
            Piece::Bishop => 'b',
            Piece::Rook => 'r',
            Piece::Queen => 'q',
            Piece::King => 'k',
        };
        match color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    pub fn from_char(c: char) -> Option<(Piece, Color)> {
        let piece = match c.to_ascii_lowercase() {
            'p' => Piece::Pawn,
            'n' => Piece::Knight,
            'b' => Piece::Bishop,
            'r' => Piece::Rook,
            'q' => Piece::Queen,
            'k' => Piece::King,
            _ => return None,
        };
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some((piece, color))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Ongoing,
    /// The contained color delivered mate.
    Checkmate(Color),
    Stalemate,
    InsufficientMaterial,
    FiftyMoveRule,
    ThreefoldRepetition,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("FEN {fen:?} is missing its {field} field")]
    MissingFenField { fen: String, field: &'static str },

    #[error("invalid piece placement {0:?}")]
    InvalidPlacement(String),

    #[error("invalid side to move {0:?}")]
    InvalidSideToMove(String),

    #[error("invalid castling rights {0:?}")]
    InvalidCastling(String),

    #[error("invalid square {0:?}")]
    InvalidSquare(String),

    #[error("invalid move counter {0:?}")]
    InvalidCounter(String),

    #[error("{0:?} is not a legal move in this position")]
    IllegalMove(String),

    #[error("cannot undo {0}: no move has been made")]
    UndoWithoutMove(Move),

    #[error("cannot undo {attempted}: the most recent move was {expected}")]
    UndoOutOfOrder { attempted: Move, expected: Move },
}

/// Everything `make_move` overwrites, captured before the move is applied.
#[derive(Debug, Clone, Copy)]
struct Undo {
    mv: Move,
    white_pieces: [u64; 6],
    black_pieces: [u64; 6],
    castling_rights: u8,
    en_passant_square: Option<u8>,
    halfmove_clock: u16,
    fullmove_number: u16,
    key: u64,
}

struct ZobristKeys {
    pieces: [[[u64; 64]; Piece::COUNT]; 2],
    black_to_move: u64,
    castling: [u64; 16],
    en_passant: [u64; 8],
}

fn zobrist() -> &'static ZobristKeys {
    static KEYS: OnceLock<ZobristKeys> = OnceLock::new();
    KEYS.get_or_init(|| {
        let mut rng = StdRng::seed_from_u64(ZOBRIST_SEED);
        let mut keys = ZobristKeys {
            pieces: [[[0; 64]; Piece::COUNT]; 2],
            black_to_move: rng.gen(),
            castling: [0; 16],
            en_passant: [0; 8],
        };
        for square_keys in keys.pieces.iter_mut().flatten() {
            for key in square_keys.iter_mut() {
                *key = rng.gen();
            }
        }
        for key in keys.castling.iter_mut().chain(keys.en_passant.iter_mut()) {
            *key = rng.gen();
        }
        keys
    })
}

/// Iterates the set squares of a bitboard, lowest first.
pub(crate) fn squares(mut bitboard: u64) -> impl Iterator<Item = u8> {
    std::iter::from_fn(move || {
        if bitboard == 0 {
            return None;
        }
        let square = bitboard.trailing_zeros() as u8;
        bitboard &= bitboard - 1;
        Some(square)
    })
}

pub fn parse_square(text: &str) -> Result<u8, BoardError> {
    match text.as_bytes() {
        [file @ b'a'..=b'h', rank @ b'1'..=b'8'] => Ok((rank - b'1') * 8 + (file - b'a')),
        _ => Err(BoardError::InvalidSquare(text.to_string())),
    }
}

pub fn square_name(square: u8) -> String {
    let mut name = String::with_capacity(2);
    name.push((b'a' + square % 8) as char);
    name.push((b'1' + square / 8) as char);
    name
}

// Rights that survive a move touching `square`.
fn castling_mask(square: u8) -> u8 {
    match square {
        0 => !WHITE_QUEENSIDE,
        4 => !(WHITE_KINGSIDE | WHITE_QUEENSIDE),
        7 => !WHITE_KINGSIDE,
        56 => !BLACK_QUEENSIDE,
        60 => !(BLACK_KINGSIDE | BLACK_QUEENSIDE),
        63 => !BLACK_KINGSIDE,
        _ => 0b1111,
    }
}

#[derive(Debug, Clone)]
pub struct Board {
    pub(crate) white_pieces: [u64; 6], // Pawn, Knight, Bishop, Rook, Queen, King
    pub(crate) black_pieces: [u64; 6], // Pawn, Knight, Bishop, Rook, Queen, King
    pub(crate) side_to_move: Color,
    pub(crate) castling_rights: u8, // 4 bits: KQkq
    pub(crate) en_passant_square: Option<u8>,
    pub(crate) halfmove_clock: u16,
    pub(crate) fullmove_number: u16,
    key: u64,
    history: Vec<Undo>,
}

impl Board {
    pub fn new() -> Self {
        let mut board = Self {
            white_pieces: [
                0x000000000000FF00, // Pawns
                0x0000000000000042, // Knights
                0x0000000000000024, // Bishops
                0x0000000000000081, // Rooks
                0x0000000000000008, // Queen
                0x0000000000000010, // King
            ],
            black_pieces: [
                0x00FF000000000000, // Pawns
                0x4200000000000000, // Knights
                0x2400000000000000, // Bishops
                0x8100000000000000, // Rooks
                0x0800000000000000, // Queen
                0x1000000000000000, // King
            ],
            side_to_move: Color::White,
            castling_rights: 0b1111,
            en_passant_square: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            key: 0,
            history: Vec::new(),
        };
        board.key = board.compute_key();
        board
    }

    fn empty() -> Self {
        Self {
            white_pieces: [0; 6],
            black_pieces: [0; 6],
            side_to_move: Color::White,
            castling_rights: 0,
            en_passant_square: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            key: 0,
            history: Vec::new(),
        }
    }

    /// Parses a position in Forsyth-Edwards Notation.
    ///
    /// The castling, en passant and move counter fields may be omitted, in which case they
    /// default to `-`, `-`, `0` and `1`.
    pub fn from_fen(fen: &str) -> Result<Self, BoardError> {
        let mut fields = fen.split_whitespace();
        let missing = |field| BoardError::MissingFenField {
            fen: fen.to_string(),
            field,
        };
        let placement = fields.next().ok_or_else(|| missing("piece placement"))?;
        let side = fields.next().ok_or_else(|| missing("side to move"))?;
        let castling = fields.next().unwrap_or("-");
        let en_passant = fields.next().unwrap_or("-");
        let halfmove = fields.next().unwrap_or("0");
        let fullmove = fields.next().unwrap_or("1");

        let mut board = Board::empty();
        board.parse_placement(placement)?;

        board.side_to_move = match side {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(BoardError::InvalidSideToMove(other.to_string())),
        };

        if castling != "-" {
            for c in castling.chars() {
                board.castling_rights |= match c {
                    'K' => WHITE_KINGSIDE,
                    'Q' => WHITE_QUEENSIDE,
                    'k' => BLACK_KINGSIDE,
                    'q' => BLACK_QUEENSIDE,
                    _ => return Err(BoardError::InvalidCastling(castling.to_string())),
                };
            }
        }

        board.en_passant_square = match en_passant {
            "-" => None,
            square => Some(parse_square(square)?),
        };
        board.halfmove_clock = halfmove
            .parse()
            .map_err(|_| BoardError::InvalidCounter(halfmove.to_string()))?;
        board.fullmove_number = fullmove
            .parse()
            .map_err(|_| BoardError::InvalidCounter(fullmove.to_string()))?;

        // The side that just moved cannot have left its king attacked
        if MoveGenerator::new().is_king_in_check(&board, board.side_to_move.opposite()) {
            return Err(BoardError::InvalidPlacement(placement.to_string()));
        }

        board.key = board.compute_key();
        Ok(board)
    }

    fn parse_placement(&mut self, placement: &str) -> Result<(), BoardError> {
        let invalid = || BoardError::InvalidPlacement(placement.to_string());
        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(invalid());
        }

        for (i, rank_text) in ranks.iter().enumerate() {
            let rank = 7 - i as u8;
            let mut file = 0u8;
            for c in rank_text.chars() {
                if let Some(skip) = c.to_digit(10) {
                    if !(1..=8).contains(&skip) {
                        return Err(invalid());
                    }
                    file += skip as u8;
                } else {
                    let (piece, color) = Piece::from_char(c).ok_or_else(invalid)?;
                    if file >= 8 {
                        return Err(invalid());
                    }
                    self.pieces_mut(color)[piece.index()] |= 1u64 << (rank * 8 + file);
                    file += 1;
                }
                if file > 8 {
                    return Err(invalid());
                }
            }
            if file != 8 {
                return Err(invalid());
            }
        }

        // Move generation relies on exactly one king per side
        let kings = |pieces: &[u64; 6]| pieces[Piece::King.index()].count_ones();
        if kings(&self.white_pieces) != 1 || kings(&self.black_pieces) != 1 {
            return Err(invalid());
        }
        Ok(())
    }

    pub fn to_fen(&self) -> String {
        let mut fen = String::new();
        for rank in (0..8u8).rev() {
            let mut empty = 0;
            for file in 0..8u8 {
                match self.get_piece_at(rank * 8 + file) {
                    Some((piece, color)) => {
                        if empty > 0 {
                            fen.push_str(&empty.to_string());
                            empty = 0;
                        }
                        fen.push(piece.to_char(color));
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                fen.push_str(&empty.to_string());
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push_str(match self.side_to_move {
            Color::White => " w ",
            Color::Black => " b ",
        });

        if self.castling_rights == 0 {
            fen.push('-');
        } else {
            for (bit, c) in [
                (WHITE_KINGSIDE, 'K'),
                (WHITE_QUEENSIDE, 'Q'),
                (BLACK_KINGSIDE, 'k'),
                (BLACK_QUEENSIDE, 'q'),
            ] {
                if self.castling_rights & bit != 0 {
                    fen.push(c);
                }
            }
        }

        let en_passant = self
            .en_passant_square
            .map(square_name)
            .unwrap_or_else(|| "-".to_string());
        fen.push_str(&format!(
            " {} {} {}",
            en_passant, self.halfmove_clock, self.fullmove_number
        ));
        fen
    }

    pub fn pieces(&self, color: Color) -> &[u64; 6] {
        match color {
            Color::White => &self.white_pieces,
            Color::Black => &self.black_pieces,
        }
    }

    fn pieces_mut(&mut self, color: Color) -> &mut [u64; 6] {
        match color {
            Color::White => &mut self.white_pieces,
            Color::Black => &mut self.black_pieces,
        }
    }

    pub fn occupancy(&self, color: Color) -> u64 {
        self.pieces(color).iter().fold(0, |acc, bb| acc | bb)
    }

    pub fn occupied(&self) -> u64 {
        self.occupancy(Color::White) | self.occupancy(Color::Black)
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn en_passant_square(&self) -> Option<u8> {
        self.en_passant_square
    }

    pub fn has_castling_right(&self, right: u8) -> bool {
        self.castling_rights & right != 0
    }

    /// Zobrist key of the current position.
    pub fn key(&self) -> u64 {
        self.key
    }

    pub fn get_piece_at(&self, square: u8) -> Option<(Piece, Color)> {
        [Color::White, Color::Black]
            .into_iter()
            .find_map(|color| self.piece_kind_at(square, color).map(|piece| (piece, color)))
    }

    pub fn piece_kind_at(&self, square: u8, color: Color) -> Option<Piece> {
        let mask = 1u64 << square;
        self.pieces(color)
            .iter()
            .position(|bb| bb & mask != 0)
            .map(|index| Piece::ALL[index])
    }

    pub fn king_square(&self, color: Color) -> Option<u8> {
        squares(self.pieces(color)[Piece::King.index()]).next()
    }

    fn compute_key(&self) -> u64 {
        let keys = zobrist();
        let mut key = 0;

        for color in [Color::White, Color::Black] {
            for (index, &bitboard) in self.pieces(color).iter().enumerate() {
                for square in squares(bitboard) {
                    key ^= keys.pieces[color.index()][index][square as usize];
                }
            }
        }

        if self.side_to_move == Color::Black {
            key ^= keys.black_to_move;
        }
        key ^= keys.castling[(self.castling_rights & 0b1111) as usize];
        if let Some(square) = self.en_passant_square {
            key ^= keys.en_passant[(square % 8) as usize];
        }
        key
    }

    pub fn make_move(&mut self, mv: Move) {
        self.history.push(Undo {
            mv,
            white_pieces: self.white_pieces,
            black_pieces: self.black_pieces,
            castling_rights: self.castling_rights,
            en_passant_square: self.en_passant_square,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
            key: self.key,
        });

        let us = self.side_to_move;

        if let Some(captured) = mv.captured_piece {
            self.pieces_mut(us.opposite())[captured.index()] &= !(1u64 << mv.captured_square());
        }

        let pieces = self.pieces_mut(us);
        pieces[mv.piece.index()] &= !(1u64 << mv.from);
        pieces[mv.promotion.unwrap_or(mv.piece).index()] |= 1u64 << mv.to;

        if let Some((rook_from, rook_to)) = mv.castling_rook_squares() {
            pieces[Piece::Rook.index()] &= !(1u64 << rook_from);
            pieces[Piece::Rook.index()] |= 1u64 << rook_to;
        }

        self.castling_rights &= castling_mask(mv.from) & castling_mask(mv.to);

        self.en_passant_square = if mv.piece == Piece::Pawn && mv.from.abs_diff(mv.to) == 16 {
            Some((mv.from + mv.to) / 2)
        } else {
            None
        };

        if mv.piece == Piece::Pawn || mv.captured_piece.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }
        if us == Color::Black {
            self.fullmove_number = self.fullmove_number.saturating_add(1);
        }

        self.side_to_move = us.opposite();
        self.key = self.compute_key();
    }

    /// Reverts `mv`, which must be the most recently applied move.
    pub fn try_undo_move(&mut self, mv: Move) -> Result<(), BoardError> {
        let expected = self
            .history
            .last()
            .map(|undo| undo.mv)
            .ok_or(BoardError::UndoWithoutMove(mv))?;
        if expected != mv {
            return Err(BoardError::UndoOutOfOrder {
                attempted: mv,
                expected,
            });
        }

        if let Some(undo) = self.history.pop() {
            self.white_pieces = undo.white_pieces;
            self.black_pieces = undo.black_pieces;
            self.castling_rights = undo.castling_rights;
            self.en_passant_square = undo.en_passant_square;
            self.halfmove_clock = undo.halfmove_clock;
            self.fullmove_number = undo.fullmove_number;
            self.key = undo.key;
            self.side_to_move = self.side_to_move.opposite();
        }
        Ok(())
    }

    /// Reverts `mv`.
    ///
    /// # Panics
    ///
    /// Panics if `mv` is not the most recently applied move. Undo bookkeeping is the
    /// caller's responsibility and a mismatch means the move stack is corrupt.
    pub fn undo_move(&mut self, mv: Move) {
        if let Err(err) = self.try_undo_move(mv) {
            panic!("move stack discipline violated: {err}");
        }
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        MoveGenerator::new().generate_moves(self)
    }

    pub fn capture_moves(&self) -> Vec<Move> {
        MoveGenerator::new().generate_captures(self)
    }

    pub fn is_in_check(&self) -> bool {
        MoveGenerator::new().is_king_in_check(self, self.side_to_move)
    }

    pub fn is_checkmate(&self) -> bool {
        self.is_in_check() && self.legal_moves().is_empty()
    }

    pub fn is_stalemate(&self) -> bool {
        !self.is_in_check() && self.legal_moves().is_empty()
    }

    pub fn is_fifty_move_draw(&self) -> bool {
        self.halfmove_clock >= 100
    }

    /// Bare kings, or a single minor piece against a bare king.
    pub fn is_insufficient_material(&self) -> bool {
        let heavy = |p: &[u64; 6]| {
            p[Piece::Pawn.index()] | p[Piece::Rook.index()] | p[Piece::Queen.index()]
        };
        if heavy(&self.white_pieces) | heavy(&self.black_pieces) != 0 {
            return false;
        }

        let minors = |p: &[u64; 6]| p[Piece::Knight.index()] | p[Piece::Bishop.index()];
        (minors(&self.white_pieces) | minors(&self.black_pieces)).count_ones() <= 1
    }

    pub fn is_threefold_repetition(&self) -> bool {
        // Positions before the last capture or pawn move can never recur
        let window = (self.halfmove_clock as usize).min(self.history.len());
        self.history
            .iter()
            .rev()
            .take(window)
            .filter(|undo| undo.key == self.key)
            .count()
            >= 2
    }

    pub fn is_draw(&self) -> bool {
        self.is_fifty_move_draw()
            || self.is_insufficient_material()
            || self.is_threefold_repetition()
            || self.is_stalemate()
    }

    pub fn game_state(&self) -> GameState {
        if self.legal_moves().is_empty() {
            if self.is_in_check() {
                GameState::Checkmate(self.side_to_move.opposite())
            } else {
                GameState::Stalemate
            }
        } else if self.is_insufficient_material() {
            GameState::InsufficientMaterial
        } else if self.is_fifty_move_draw() {
            GameState::FiftyMoveRule
        } else if self.is_threefold_repetition() {
            GameState::ThreefoldRepetition
        } else {
            GameState::Ongoing
        }
    }

    /// Finds the legal move written in coordinate notation, e.g. `e2e4` or `e7e8q`.
    pub fn parse_move(&self, text: &str) -> Result<Move, BoardError> {
        self.legal_moves()
            .into_iter()
            .find(|mv| mv.to_string() == text)
            .ok_or_else(|| BoardError::IllegalMove(text.to_string()))
    }

    /// Counts the leaf nodes of the legal move tree `depth` plies deep.
    pub fn perft(&mut self, depth: u32) -> u64 {
        if depth == 0 {
            return 1;
        }

        let moves = self.legal_moves();
        if depth == 1 {
            return moves.len() as u64;
        }

        let mut nodes = 0;
        for mv in moves {
            self.make_move(mv);
            nodes += self.perft(depth - 1);
            self.undo_move(mv);
        }
        nodes
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for Board {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Board::from_fen(s)
    }
}

// Two boards are equal when they describe the same position and were reached by the same moves.
impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        self.white_pieces == other.white_pieces
            && self.black_pieces == other.black_pieces
            && self.side_to_move == other.side_to_move
            && self.castling_rights == other.castling_rights
            && self.en_passant_square == other.en_passant_square
            && self.halfmove_clock == other.halfmove_clock
            && self.fullmove_number == other.fullmove_number
            && self.key == other.key
            && self.history.len() == other.history.len()
            && self
                .history
                .iter()
                .zip(&other.history)
                .all(|(a, b)| a.mv == b.mv && a.key == b.key)
    }
}

impl Eq for Board {}

impl Position for Board {
    type Move = Move;

    fn legal_moves(&self) -> Vec<Move> {
        Board::legal_moves(self)
    }

    fn capture_moves(&self) -> Vec<Move> {
        Board::capture_moves(self)
    }

    fn make_move(&mut self, mv: Move) {
        Board::make_move(self, mv)
    }

    fn undo_move(&mut self, mv: Move) {
        Board::undo_move(self, mv)
    }

    fn is_checkmate(&self) -> bool {
        Board::is_checkmate(self)
    }

    fn is_draw(&self) -> bool {
        Board::is_draw(self)
    }

    fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    fn has_kingside_castle_right(&self, color: Color) -> bool {
        self.has_castling_right(match color {
            Color::White => WHITE_KINGSIDE,
            Color::Black => BLACK_KINGSIDE,
        })
    }

    fn has_queenside_castle_right(&self, color: Color) -> bool {
        self.has_castling_right(match color {
            Color::White => WHITE_QUEENSIDE,
            Color::Black => BLACK_QUEENSIDE,
        })
    }

    fn piece_count(&self, piece: Piece, color: Color) -> u32 {
        self.pieces(color)[piece.index()].count_ones()
    }

    fn key(&self) -> u64 {
        self.key
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for rank in (0..8u8).rev() {
            write!(f, "{} ", rank + 1)?;
            for file in 0..8u8 {
                let c = self
                    .get_piece_at(rank * 8 + file)
                    .map(|(piece, color)| piece.to_char(color))
                    .unwrap_or('.');
                write!(f, "{}", c)?;
                if file < 7 {
                    write!(f, " ")?;
                }
            }
            writeln!(f)?;
        }
        write!(f, "  a b c d e f g h")
    }
}
