pub mod ai;
pub mod cards;
pub mod combat;
pub mod config;
pub mod game;
pub mod minion;
pub mod pool;
pub mod replay;
pub mod tavern;

use std::fmt::Debug;
use std::hash::Hash;
use rand::{Rng};

pub use ai::{
    SearchError,
    agents::{Agent, GreedyAgent, MctsAgent, RandomAgent},
    game_tree::{
        GameTree,
        node::GameTreeNode,
        edge::GameTreeEdge,
        score::Score,
    },
    mcts::{mcts, MonteCarloTreeSearcher},
    random_rollout::random_rollout,
    root_parallel::root_parallel,
};
pub use cards::{CardId, CardRecord, Catalogue};
pub use combat::{CombatPhaseResult, CombatResolver, Lineup};
pub use config::{BoardConfig, CombatConfig, GameConfig, PairingStrategy, SearchConfig};
pub use game::{BattlegroundsGame, GameError, PlayerId, PlayerPhase};
pub use pool::MinionPool;
pub use replay::{replay, run_game, run_games, GameRecord, GameStatistics};
pub use tavern::{EngineError, Move, TavernBoard};

pub trait Action: Clone {}

pub trait Player: 'static + Copy + Clone + Hash + Eq + PartialEq + Debug {}

pub trait State<A: Action, P: Player>: Sized + Clone {
    type Error: Debug;

    fn actions(&self) -> Vec<A>;
    fn apply_action<R: Rng>(&self, rng: &mut R, action: &A) -> Result<Self, Self::Error>;
    fn outcome(&self) -> Option<Outcome<P>>;

    fn current_player(&self) -> P;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<P: Player> {
    Winner(P),
    Draw(Vec<P>),
    Escape(String),
}
