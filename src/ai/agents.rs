//! Move-picking strategies that can sit in a player's seat.

use std::hash::Hash;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha20Rng;
use crate::{Action, Outcome, Player, State};
use crate::ai::SearchError;
use crate::ai::mcts::MonteCarloTreeSearcher;
use crate::ai::random_rollout::random_rollout;
use crate::config::SearchConfig;

pub trait Agent<S: State<A, P>, A: Action, P: Player> {
    fn name(&self) -> &str;
    fn decide(&self, rng: &mut ChaCha20Rng, state: &S) -> Result<A, SearchError>;
}

/// Picks a uniformly random legal move.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomAgent;

impl<S: State<A, P>, A: Action, P: Player> Agent<S, A, P> for RandomAgent {
    fn name(&self) -> &str {
        "random"
    }

    fn decide(&self, rng: &mut ChaCha20Rng, state: &S) -> Result<A, SearchError> {
        if state.outcome().is_some() {
            return Err(SearchError::TerminalNode);
        }
        state.actions().choose(rng).cloned().ok_or(SearchError::NoLegalMoves)
    }
}

/// Tries every legal move, finishes the game with random play a few times after each, and
/// keeps the move that won most often.
#[derive(Debug, Clone)]
pub struct GreedyAgent {
    pub simulations: u32,
    pub max_rollout_depth: Option<u32>,
}

impl Default for GreedyAgent {
    fn default() -> Self {
        Self { simulations: 8, max_rollout_depth: Some(2000) }
    }
}

impl<S: State<A, P>, A: Action, P: Player> Agent<S, A, P> for GreedyAgent {
    fn name(&self) -> &str {
        "greedy"
    }

    fn decide(&self, rng: &mut ChaCha20Rng, state: &S) -> Result<A, SearchError> {
        if state.outcome().is_some() {
            return Err(SearchError::TerminalNode);
        }

        let me = state.current_player();
        let mut best: Option<(A, u32)> = None;
        for action in state.actions() {
            let mut wins = 0;
            for _ in 0..self.simulations {
                let next = state
                    .apply_action(rng, &action)
                    .map_err(|e| SearchError::Transition(format!("{e:?}")))?;
                if let Outcome::Winner(winner) = random_rollout(&next, rng, self.max_rollout_depth)? {
                    wins += u32::from(winner == me);
                }
            }

            if best.as_ref().map_or(true, |(_, most)| wins > *most) {
                best = Some((action, wins));
            }
        }

        best.map(|(action, _)| action).ok_or(SearchError::NoLegalMoves)
    }
}

/// Picks moves with Monte Carlo tree search.
#[derive(Debug, Clone, Default)]
pub struct MctsAgent {
    searcher: MonteCarloTreeSearcher,
}

impl MctsAgent {
    pub fn new(config: SearchConfig) -> Self {
        Self { searcher: MonteCarloTreeSearcher::new(config) }
    }
}

impl<S, A, P> Agent<S, A, P> for MctsAgent
where
    S: State<A, P> + Send,
    A: Action + Eq + Hash + Send,
    P: Player + Send,
{
    fn name(&self) -> &str {
        "mcts"
    }

    fn decide(&self, rng: &mut ChaCha20Rng, state: &S) -> Result<A, SearchError> {
        self.searcher.choose(state, rng)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use rand::SeedableRng;
    use super::*;
    use crate::cards::Catalogue;
    use crate::config::GameConfig;
    use crate::game::{BattlegroundsGame, PlayerId};
    use crate::tavern::Move;

    fn game(rng: &mut ChaCha20Rng) -> BattlegroundsGame {
        let config = GameConfig::for_testing().with_max_rounds(Some(3)).with_max_actions_per_turn(Some(3));
        BattlegroundsGame::new(config, Arc::new(Catalogue::builtin()), rng).unwrap()
    }

    #[test]
    fn every_agent_picks_a_legal_move() {
        let mut rng = ChaCha20Rng::seed_from_u64(10);
        let state = game(&mut rng);
        let legal = state.legal_moves();

        let agents: Vec<Box<dyn Agent<BattlegroundsGame, Move, PlayerId>>> = vec![
            Box::new(RandomAgent),
            Box::new(GreedyAgent { simulations: 2, max_rollout_depth: Some(200) }),
            Box::new(MctsAgent::new(SearchConfig::for_testing().with_rollouts(10))),
        ];

        for agent in &agents {
            let mv = agent.decide(&mut rng, &state).unwrap();
            assert!(legal.contains(&mv), "{} chose {mv}", agent.name());
        }
    }

    #[test]
    fn agents_refuse_finished_games() {
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let mut state = game(&mut rng);
        while !state.is_over() {
            state.make_move(&mut rng, Move::EndTurn).unwrap();
        }

        let random: &dyn Agent<BattlegroundsGame, Move, PlayerId> = &RandomAgent;
        assert_eq!(random.decide(&mut rng, &state), Err(SearchError::TerminalNode));
        let mcts: &dyn Agent<BattlegroundsGame, Move, PlayerId> = &MctsAgent::default();
        assert_eq!(mcts.decide(&mut rng, &state), Err(SearchError::TerminalNode));
    }
}
