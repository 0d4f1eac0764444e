use crate::evaluation::Evaluator;
use crate::ordering::MoveOrderer;
use crate::position::Position;

/// Capture-only extension of the main search below its horizon.
///
/// Every capture removes a piece, so the recursion always bottoms out without a depth limit.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuiescenceSearcher {
    evaluator: Evaluator,
    orderer: MoveOrderer,
}

impl QuiescenceSearcher {
    pub fn new(evaluator: Evaluator, orderer: MoveOrderer) -> Self {
        Self { evaluator, orderer }
    }

    /// Fail-hard score of `position` for the side to move, and the number of nodes visited.
    pub fn search<P: Position>(&self, position: &mut P, mut alpha: i32, beta: i32) -> (i32, u64) {
        let mut nodes = 1;

        let stand_pat = self.evaluator.evaluate(position);
        if stand_pat >= beta {
            return (beta, nodes);
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }

        for mv in self.orderer.order_captures(position) {
            position.make_move(mv);
            let (score, visited) = self.search(position, -beta, -alpha);
            position.undo_move(mv);

            nodes += visited;
            let score = -score;
            if score >= beta {
                return (beta, nodes);
            }
            if score > alpha {
                alpha = score;
            }
        }

        (alpha, nodes)
    }
}
