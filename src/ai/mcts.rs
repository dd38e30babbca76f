use std::time::Instant;
use rand::Rng;
use tracing::debug;
use crate::{Action, GameTree, Player, State};
use crate::ai::SearchError;
use crate::ai::root_parallel::root_parallel;
use crate::config::SearchConfig;

/// Runs `num_simulations` rollouts from `game` and returns the move with the best average
/// reward for the player to move.
pub fn mcts<
    R: Rng,
    S: State<A, P>,
    A: Action,
    P: Player,
>(game: &S, rng: &mut R, num_simulations: u32) -> Result<A, SearchError> {
    let config = SearchConfig::default().with_rollouts(num_simulations);
    let tree = build_monte_carlo_game_tree(game, rng, &config)?;
    tree.choose(rng)
}

/// Grows a tree from `game` within the rollout and time budget of `config`.
pub fn build_monte_carlo_game_tree<
    R: Rng,
    S: State<A, P>,
    A: Action,
    P: Player,
>(game: &S, rng: &mut R, config: &SearchConfig) -> Result<GameTree<S, A, P>, SearchError> {
    let mut tree = GameTree::new(game.clone())
        .with_exploration(config.exploration)
        .with_rollout_depth(config.max_rollout_depth);

    if tree.root().is_terminal() {
        return Ok(tree);
    }

    let started = Instant::now();
    let mut rollouts = 0;
    while rollouts < config.rollouts {
        if config.time_limit.is_some_and(|limit| started.elapsed() >= limit) {
            break;
        }
        tree.rollout(rng)?;
        rollouts += 1;
    }

    debug!(rollouts, elapsed_ms = started.elapsed().as_millis() as u64, "search finished");
    Ok(tree)
}

/// Chooses moves by Monte Carlo tree search, fanning out over independent root replicas
/// when configured to.
#[derive(Debug, Clone, Default)]
pub struct MonteCarloTreeSearcher {
    config: SearchConfig,
}

impl MonteCarloTreeSearcher {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn build_tree<R, S, A, P>(&self, state: &S, rng: &mut R) -> Result<GameTree<S, A, P>, SearchError>
    where
        R: Rng,
        S: State<A, P>,
        A: Action,
        P: Player,
    {
        build_monte_carlo_game_tree(state, rng, &self.config)
    }

    pub fn choose<R, S, A, P>(&self, state: &S, rng: &mut R) -> Result<A, SearchError>
    where
        R: Rng,
        S: State<A, P> + Send,
        A: Action + Eq + std::hash::Hash + Send,
        P: Player + Send,
    {
        if state.outcome().is_some() {
            return Err(SearchError::TerminalNode);
        }
        if self.config.root_replicas > 1 {
            return root_parallel(state, rng, &self.config);
        }
        self.build_tree(state, rng)?.choose(rng)
    }
}
