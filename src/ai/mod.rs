pub mod agents;
pub mod game_tree;
pub mod mcts;
pub mod random_rollout;
pub mod root_parallel;

use thiserror::Error;

/// Errors raised while searching a game tree.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error("cannot choose a move from a terminal state")]
    TerminalNode,

    #[error("UCT selection needs a fully expanded node")]
    Unexpanded,

    #[error("no legal moves available")]
    NoLegalMoves,

    #[error("state transition failed: {0}")]
    Transition(String),

    #[error("a search worker panicked")]
    WorkerPanicked,
}
