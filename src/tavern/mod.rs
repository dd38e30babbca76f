//! Per-player recruit phase: the board state machine and the trigger engine behind it.

pub mod board;
mod engine;
pub mod moves;

use thiserror::Error;
use crate::cards::CardId;

pub use board::TavernBoard;
pub use moves::Move;

/// Broken engine invariants. Ordinary rule violations (not enough gold, full board) are
/// reported as `Ok(false)` by the board operations instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("card {0:?} is not in the catalogue")]
    UnknownCard(CardId),

    #[error("effect refers to card {0:?} which is not in the catalogue")]
    MissingCard(String),

    #[error("pool has no copies of {0:?} left to take")]
    PoolUnderflow(CardId),

    #[error("pool would hold more copies of {0:?} than it started with")]
    PoolOverflow(CardId),

    #[error("{zone} holds {len} minions, above its capacity")]
    Capacity { zone: &'static str, len: usize },
}
