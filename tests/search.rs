use std::cell::Cell;

use salmon_bot::config::INFINITY;
use salmon_bot::quiescence::QuiescenceSearcher;
use salmon_bot::transposition::{NodeType, TranspositionEntry, TranspositionTable};
use salmon_bot::{Board, Move, Search, SearchConfig, SearchError, Timer};

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
const ENDGAME: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";
const ITALIAN: &str = "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4";

/// Reports no time passing until `expire_after` queries have been made, then jumps far ahead.
struct CountingTimer {
    queries: Cell<u64>,
    expire_after: u64,
}

impl CountingTimer {
    fn never_expiring() -> Self {
        Self::expiring_after(u64::MAX)
    }

    fn expiring_after(expire_after: u64) -> Self {
        Self {
            queries: Cell::new(0),
            expire_after,
        }
    }

    fn queries(&self) -> u64 {
        self.queries.get()
    }
}

impl Timer for CountingTimer {
    fn elapsed_ms(&self) -> u64 {
        let n = self.queries.get() + 1;
        self.queries.set(n);
        if n > self.expire_after {
            1_000_000
        } else {
            0
        }
    }
}

/// Every query takes two seconds.
struct SlowTimer(Cell<u64>);

impl Timer for SlowTimer {
    fn elapsed_ms(&self) -> u64 {
        self.0.set(self.0.get() + 2000);
        self.0.get()
    }
}

fn board(fen: &str) -> Board {
    Board::from_fen(fen).unwrap()
}

fn search(max_depth: usize) -> Search {
    Search::new(SearchConfig {
        max_depth,
        time_threshold_ms: 1000,
        cache_capacity: 1 << 18,
    })
}

/// Negamax without pruning or caching, sharing the mate and draw rules of the engine.
fn exhaustive(board: &mut Board, depth: usize) -> i32 {
    if depth == 0 {
        let (score, _) = QuiescenceSearcher::default().search(board, -INFINITY, INFINITY);
        return score;
    }

    let mut best = -INFINITY;
    for mv in board.legal_moves() {
        board.make_move(mv);
        if board.is_checkmate() {
            board.undo_move(mv);
            return INFINITY;
        }
        let eval = if board.is_draw() {
            0
        } else {
            -exhaustive(board, depth - 1)
        };
        board.undo_move(mv);
        best = best.max(eval);
    }
    best
}

#[test]
fn test_mate_in_one_is_found_at_every_depth() {
    for max_depth in [0, 1, 2, 3, 6] {
        let mut board = board("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1");
        let report = search(max_depth)
            .think(&mut board, &CountingTimer::never_expiring())
            .unwrap();
        assert_eq!(report.best_move.to_string(), "a1a8");
        assert_eq!(report.score, INFINITY);
        assert_eq!(report.depth, 1);
    }
}

#[test]
fn test_mate_in_two_is_forced() {
    let mut board = board("1k6/8/2K5/8/8/8/8/7R w - - 0 1");
    let report = search(6)
        .think(&mut board, &CountingTimer::never_expiring())
        .unwrap();
    assert_eq!(report.score, INFINITY);
    assert_eq!(report.depth, 3);

    board.make_move(report.best_move);
    let replies = board.legal_moves();
    assert!(!replies.is_empty());
    for reply in replies {
        board.make_move(reply);
        let mates = board.legal_moves().into_iter().any(|mv| {
            board.make_move(mv);
            let mate = board.is_checkmate();
            board.undo_move(mv);
            mate
        });
        assert!(mates, "no mate after {reply}");
        board.undo_move(reply);
    }
}

#[test]
fn test_mate_in_one_for_black() {
    let mut board = board("r5k1/8/8/8/8/8/5PPP/6K1 b - - 0 1");
    let mv = search(4)
        .choose_move(&mut board, &CountingTimer::never_expiring())
        .unwrap();
    assert_eq!(mv.to_string(), "a8a1");
}

#[test]
fn test_chosen_move_delivers_mate() {
    let mut board = board("k7/8/KQ6/8/8/8/8/8 w - - 0 1");
    let report = search(5)
        .think(&mut board, &CountingTimer::never_expiring())
        .unwrap();
    assert_eq!(report.score, INFINITY);

    board.make_move(report.best_move);
    assert!(board.is_checkmate());
}

#[test]
fn test_scholars_mate() {
    let mut board = board(ITALIAN);
    let mv = search(4)
        .choose_move(&mut board, &CountingTimer::never_expiring())
        .unwrap();
    assert_eq!(mv.to_string(), "h5f7");
}

#[test]
fn test_initial_position_depth_one_scores_zero() {
    let mut board = Board::new();
    let mut search = search(2);

    let outcome = search.search_depth(&mut board, 1, &CountingTimer::never_expiring());
    assert!(!outcome.halted);
    assert_eq!(outcome.score, 0);
    let best = outcome.best_move.unwrap();
    assert!(board.legal_moves().contains(&best));

    search.clear_cache();
    let report = search
        .think(&mut board, &CountingTimer::never_expiring())
        .unwrap();
    assert_eq!(report.depth, 1);
    assert_eq!(report.score, 0);
    assert_eq!(board, Board::new());
}

#[test]
fn test_fixed_depth_search_is_deterministic() {
    for (fen, depth) in [(KIWIPETE, 2), (ENDGAME, 3), (ITALIAN, 2)] {
        let mut board = board(fen);
        let mut search = search(8);

        let first = search.search_depth(&mut board, depth, &CountingTimer::never_expiring());
        search.clear_cache();
        let second = search.search_depth(&mut board, depth, &CountingTimer::never_expiring());

        assert_eq!(first.score, second.score, "{fen}");
        assert_eq!(first.best_move, second.best_move, "{fen}");
        assert_eq!(first.nodes, second.nodes, "{fen}");
    }
}

#[test]
fn test_pruning_never_changes_the_score() {
    let corpus = [
        (salmon_bot::board::STARTPOS, 3),
        (KIWIPETE, 2),
        (ENDGAME, 3),
        (ITALIAN, 2),
        ("4k3/8/4p3/3p4/8/8/8/3QK3 w - - 0 1", 3),
        ("r1b1k2r/ppppnppp/2n2q2/2b5/3NP3/2P1B3/PP3PPP/RN1QKB1R w KQkq - 0 1", 2),
    ];

    for (fen, max_depth) in corpus {
        for depth in 1..=max_depth {
            let mut board = board(fen);
            let expected = exhaustive(&mut board, depth);

            let mut search = search(8);
            let outcome = search.search_depth(&mut board, depth, &CountingTimer::never_expiring());
            assert!(!outcome.halted);
            assert_eq!(outcome.score, expected, "{fen} at depth {depth}");
            assert_eq!(board.to_fen(), fen);
        }
    }
}

#[test]
fn test_halted_iteration_is_discarded() {
    let depth = 2;

    // Reference run that stops by itself after completing `depth`
    let mut board = Board::new();
    let timer = CountingTimer::never_expiring();
    let expected = search(depth + 1).think(&mut board, &timer).unwrap();
    assert_eq!(expected.depth, depth);
    let queries = timer.queries();

    // Same search allowed one more iteration, but time runs out inside it
    let mut board = Board::new();
    let timer = CountingTimer::expiring_after(queries + 1);
    let report = search(depth + 2).think(&mut board, &timer).unwrap();

    assert!(timer.queries() > queries + 1);
    assert_eq!(report.depth, depth);
    assert_eq!(report.best_move, expected.best_move);
    assert_eq!(report.score, expected.score);
    assert!(report.nodes > expected.nodes);
    assert_eq!(board, Board::new());
}

#[test]
fn test_exhausted_budget_falls_back_to_first_legal_move() {
    let mut board = board(KIWIPETE);
    let first = board.legal_moves()[0];

    let report = search(10).think(&mut board, &SlowTimer(Cell::new(0))).unwrap();
    assert_eq!(report.depth, 0);
    assert_eq!(report.best_move, first);
    assert_eq!(board.to_fen(), KIWIPETE);
}

#[test]
fn test_no_legal_moves() {
    let mut stalemate = board("8/8/8/8/8/1q6/2k5/K7 w - - 0 1");
    let result: Result<Move, SearchError> =
        search(4).choose_move(&mut stalemate, &CountingTimer::never_expiring());
    assert_eq!(result, Err(SearchError::NoLegalMoves));
}

#[test]
fn test_quiescence_runs_past_the_nominal_depth() {
    // Six captures are available in a row on d5
    let fen = "3r1k2/3r4/3q4/3p4/8/3R4/3R4/3QK3 w - - 0 1";
    let mut board = board(fen);

    let (score, nodes) = QuiescenceSearcher::default().search(&mut board, -INFINITY, INFINITY);
    assert!(score > -INFINITY && score < INFINITY);
    assert!(nodes > 6);
    assert_eq!(board.to_fen(), fen);

    let outcome = search(4).search_depth(&mut board, 1, &CountingTimer::never_expiring());
    assert!(!outcome.halted);
}

#[test]
fn test_cache_never_exceeds_capacity() {
    let mut board = board(KIWIPETE);
    let mut search = Search::new(SearchConfig {
        max_depth: 4,
        time_threshold_ms: 1000,
        cache_capacity: 64,
    });
    search
        .think(&mut board, &CountingTimer::never_expiring())
        .unwrap();

    assert_eq!(search.cache().len(), 64);
    assert_eq!(search.cache().capacity(), 64);
}

#[test]
fn test_cache_evicts_least_recently_accessed() {
    let mut table = TranspositionTable::new(4);
    for key in 0..4 {
        table.store(TranspositionEntry::new(key, 1, 0, NodeType::Exact));
    }

    // A probe touches the entry even when its depth is too shallow to use
    assert_eq!(table.probe(0, 5, -INFINITY, INFINITY), None);
    assert!(table.get(1).is_some());

    for key in 10..12 {
        table.store(TranspositionEntry::new(key, 1, 0, NodeType::Exact));
    }

    assert_eq!(table.len(), 4);
    assert!(!table.contains(2));
    assert!(!table.contains(3));
    assert_eq!(table.keys_by_recency(), vec![11, 10, 1, 0]);
}
