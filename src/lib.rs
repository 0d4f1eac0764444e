pub mod board;
pub mod config;
pub mod evaluation;
pub mod movegen;
pub mod negamax;
pub mod ordering;
pub mod position;
pub mod quiescence;
pub mod search;
pub mod timer;
pub mod transposition;

pub use board::{Board, BoardError, Color, GameState, Piece};
pub use config::SearchConfig;
pub use movegen::{Move, MoveGenerator};
pub use negamax::SearchOutcome;
pub use position::{Position, SearchMove};
pub use search::{Search, SearchError, SearchReport};
pub use timer::{Timer, TurnTimer};
