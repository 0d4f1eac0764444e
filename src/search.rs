use log::{debug, info, warn};
use thiserror::Error;

use crate::config::{SearchConfig, INFINITY};
use crate::evaluation::Evaluator;
use crate::negamax::{SearchOutcome, Searcher};
use crate::position::Position;
use crate::timer::{SearchBudget, Timer};
use crate::transposition::TranspositionTable;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("no legal moves in the given position")]
    NoLegalMoves,
}

/// Result of one `think` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchReport<M> {
    pub best_move: M,
    pub score: i32,
    /// Deepest completed iteration, or 0 when none completed and `best_move` is the fallback.
    pub depth: usize,
    /// Nodes visited across all iterations, including a halted one.
    pub nodes: u64,
}

/// Iterative-deepening move chooser. Owns the transposition table for its whole lifetime.
pub struct Search {
    config: SearchConfig,
    table: TranspositionTable,
}

impl Search {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            table: TranspositionTable::new(config.cache_capacity),
            config,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn cache(&self) -> &TranspositionTable {
        &self.table
    }

    pub fn clear_cache(&mut self) {
        self.table.clear();
    }

    /// Picks a move for the side to move in `position`.
    ///
    /// Always returns a legal move when one exists, even if the time budget is already spent.
    pub fn choose_move<P: Position, T: Timer>(
        &mut self,
        position: &mut P,
        timer: &T,
    ) -> Result<P::Move, SearchError> {
        self.think(position, timer).map(|report| report.best_move)
    }

    /// Runs iterative deepening over depths `1..max_depth` (at least depth 1) and reports the
    /// last completed one.
    pub fn think<P: Position, T: Timer>(
        &mut self,
        position: &mut P,
        timer: &T,
    ) -> Result<SearchReport<P::Move>, SearchError> {
        let first = *position
            .legal_moves()
            .first()
            .ok_or(SearchError::NoLegalMoves)?;

        let budget = SearchBudget::starting_now(timer, self.config.time_threshold_ms);
        let mut searcher = Searcher::new(&mut self.table, timer, budget);
        let mut retained: Option<(P::Move, i32, usize)> = None;
        let mut nodes = 0;

        // Depth 1 always runs, whatever the configured bound
        for depth in 1..self.config.max_depth.max(2) {
            let outcome = searcher.negamax(position, depth, -INFINITY, INFINITY);
            nodes += outcome.nodes;

            if outcome.halted {
                debug!("depth {depth} halted after {} nodes, result discarded", outcome.nodes);
                break;
            }

            // Every move loses to mate, so nothing raised alpha
            let best_move = outcome.best_move.unwrap_or(first);
            debug!(
                "depth {depth}: score {} best {best_move} nodes {}",
                outcome.score, outcome.nodes
            );
            retained = Some((best_move, outcome.score, depth));

            if outcome.score.abs() == INFINITY {
                break;
            }
        }

        let report = match retained {
            Some((best_move, score, depth)) => SearchReport {
                best_move,
                score,
                depth,
                nodes,
            },
            None => {
                warn!("no iteration completed within the budget, playing the first legal move");
                SearchReport {
                    best_move: first,
                    score: Evaluator::new().evaluate(position),
                    depth: 0,
                    nodes,
                }
            }
        };

        info!(
            "chose {} (score {}, depth {}, {} nodes)",
            report.best_move, report.score, report.depth, report.nodes
        );
        Ok(report)
    }

    /// A single fixed-depth root search sharing this controller's cache.
    pub fn search_depth<P: Position, T: Timer>(
        &mut self,
        position: &mut P,
        depth: usize,
        timer: &T,
    ) -> SearchOutcome<P::Move> {
        let budget = SearchBudget::starting_now(timer, self.config.time_threshold_ms);
        Searcher::new(&mut self.table, timer, budget).negamax(position, depth, -INFINITY, INFINITY)
    }
}

impl Default for Search {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}
