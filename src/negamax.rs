use crate::config::{DRAW, INFINITY};
use crate::evaluation::Evaluator;
use crate::ordering::MoveOrderer;
use crate::position::Position;
use crate::quiescence::QuiescenceSearcher;
use crate::timer::{SearchBudget, Timer};
use crate::transposition::{NodeType, TranspositionEntry, TranspositionTable};

/// What one node of the tree reports back to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOutcome<M> {
    /// Relative to the side to move at the node.
    pub score: i32,

    /// Move that produced `score`. Only the caller of the root node reads it.
    pub best_move: Option<M>,

    /// The budget ran out inside this subtree; `score` and `best_move` are meaningless.
    pub halted: bool,

    pub nodes: u64,
}

impl<M> SearchOutcome<M> {
    fn scored(score: i32, best_move: Option<M>, nodes: u64) -> Self {
        Self {
            score,
            best_move,
            halted: false,
            nodes,
        }
    }

    fn halted(nodes: u64) -> Self {
        Self {
            score: 0,
            best_move: None,
            halted: true,
            nodes,
        }
    }
}

/// Fail-hard alpha-beta negamax over a shared, mutable position.
pub struct Searcher<'a, T: Timer> {
    table: &'a mut TranspositionTable,
    timer: &'a T,
    budget: SearchBudget,
    orderer: MoveOrderer,
    quiescence: QuiescenceSearcher,
}

impl<'a, T: Timer> Searcher<'a, T> {
    pub fn new(table: &'a mut TranspositionTable, timer: &'a T, budget: SearchBudget) -> Self {
        let orderer = MoveOrderer::new();
        Self {
            table,
            timer,
            budget,
            orderer,
            quiescence: QuiescenceSearcher::new(Evaluator::new(), orderer),
        }
    }

    /// Searches `depth` plies below `position` within the window `(alpha, beta)`.
    ///
    /// `position` is left exactly as it was passed in, whether or not the search halts.
    pub fn negamax<P: Position>(
        &mut self,
        position: &mut P,
        depth: usize,
        mut alpha: i32,
        beta: i32,
    ) -> SearchOutcome<P::Move> {
        if depth == 0 {
            let (score, nodes) = self.quiescence.search(position, alpha, beta);
            return SearchOutcome::scored(score, None, nodes);
        }

        let mut nodes = 1;
        if self.budget.is_exhausted(self.timer) {
            return SearchOutcome::halted(nodes);
        }

        let mut best_move = None;
        for mv in self.orderer.order(position) {
            position.make_move(mv);

            if position.is_checkmate() {
                position.undo_move(mv);
                return SearchOutcome::scored(INFINITY, Some(mv), nodes);
            }

            let eval = if position.is_draw() {
                DRAW
            } else {
                let key = position.key();
                // The child sees the window from the other side
                match self.table.probe(key, depth - 1, -beta, -alpha) {
                    Some(score) => -score,
                    None => {
                        let child = self.negamax(position, depth - 1, -beta, -alpha);
                        nodes += child.nodes;
                        if child.halted {
                            position.undo_move(mv);
                            return SearchOutcome::halted(nodes);
                        }

                        let node_type = NodeType::classify(child.score, -beta, -alpha);
                        self.table
                            .store(TranspositionEntry::new(key, depth - 1, child.score, node_type));
                        -child.score
                    }
                }
            };

            position.undo_move(mv);

            if eval >= beta {
                return SearchOutcome::scored(beta, Some(mv), nodes);
            }
            if eval > alpha {
                alpha = eval;
                best_move = Some(mv);
            }
        }

        SearchOutcome::scored(alpha, best_move, nodes)
    }
}
