//! Running games with agents and replaying the recorded move log.
//!
//! The game and the agents draw from separate `ChaCha20Rng` streams of the same seed, so a
//! [`GameRecord`] (seed, config and moves) is enough to rebuild the final state no matter
//! how the moves were chosen.
//!
//! [`run_games`] plays a batch of seeded games and tallies them into [`GameStatistics`].

use std::collections::HashMap;
use std::sync::Arc;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use tracing::info;
use crate::Outcome;
use crate::ai::agents::Agent;
use crate::cards::Catalogue;
use crate::config::GameConfig;
use crate::game::{BattlegroundsGame, GameError, PlayerId};
use crate::tavern::Move;

pub type BoxedAgent = Box<dyn Agent<BattlegroundsGame, Move, PlayerId>>;

const AGENT_STREAM: u64 = 1;

/// Width of the window behind [`GameStatistics::rolling_win_rate`].
pub const ROLLING_WINDOW: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub seed: u64,
    pub config: GameConfig,
    pub moves: Vec<(PlayerId, Move)>,
    pub winner: Option<PlayerId>,
    pub rounds: u32,
    pub final_health: Vec<i32>,
}

impl GameRecord {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

fn game_rng(seed: u64) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(seed)
}

/// Plays a full game, asking each player's agent for moves, and returns the final state
/// with its record.
pub fn run_game(
    config: GameConfig,
    catalogue: Arc<Catalogue>,
    seed: u64,
    agents: &HashMap<PlayerId, BoxedAgent>,
) -> Result<(BattlegroundsGame, GameRecord), GameError> {
    let mut rng = game_rng(seed);
    let mut agent_rng = ChaCha20Rng::seed_from_u64(seed);
    agent_rng.set_stream(AGENT_STREAM);

    let mut game = BattlegroundsGame::new(config.clone(), catalogue, &mut rng)?;
    let mut moves = Vec::new();

    while let Some(player) = game.active_player() {
        let agent = agents.get(&player).ok_or(GameError::MissingAgent(player))?;
        let mv = agent.decide(&mut agent_rng, &game)?;
        if !game.make_move_as(player, &mut rng, mv)? {
            return Err(GameError::IllegalMove(mv));
        }
        moves.push((player, mv));
    }

    let winner = match game.outcome() {
        Some(Outcome::Winner(winner)) => Some(winner),
        _ => None,
    };
    info!(seed, moves = moves.len(), rounds = game.round() - 1, winner = ?winner, "game finished");

    let record = GameRecord {
        seed,
        config,
        moves,
        winner,
        rounds: game.round() - 1,
        final_health: game.boards().iter().map(|b| b.hero_health()).collect(),
    };
    Ok((game, record))
}

/// Results of a batch of games, in the order they were played.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GameStatistics {
    /// `None` for a game that ended without a single winner.
    pub winners: Vec<Option<PlayerId>>,
    /// Wins per seat.
    pub wins: Vec<u32>,
    pub draws: u32,
}

impl GameStatistics {
    pub fn new(num_players: usize) -> Self {
        Self { winners: Vec::new(), wins: vec![0; num_players], draws: 0 }
    }

    pub fn record(&mut self, winner: Option<PlayerId>) {
        match winner.and_then(|w| self.wins.get_mut(w.0 as usize)) {
            Some(count) => *count += 1,
            None => self.draws += 1,
        }
        self.winners.push(winner);
    }

    pub fn games(&self) -> usize {
        self.winners.len()
    }

    pub fn win_rate(&self, player: PlayerId) -> f32 {
        match self.games() {
            0 => 0.0,
            n => self.wins.get(player.0 as usize).copied().unwrap_or(0) as f32 / n as f32,
        }
    }

    /// 1 for each game `player` won, 0 otherwise.
    pub fn outcomes(&self, player: PlayerId) -> Vec<u8> {
        self.winners.iter().map(|w| u8::from(*w == Some(player))).collect()
    }

    /// Win rate of `player` over the first `i + 1` games, for each `i`.
    pub fn cumulative_win_rate(&self, player: PlayerId) -> Vec<f32> {
        let mut won = 0u32;
        self.outcomes(player)
            .into_iter()
            .enumerate()
            .map(|(i, outcome)| {
                won += outcome as u32;
                won as f32 / (i + 1) as f32
            })
            .collect()
    }

    /// Win rate of `player` over the last [`ROLLING_WINDOW`] games up to each game.
    pub fn rolling_win_rate(&self, player: PlayerId) -> Vec<f32> {
        let outcomes = self.outcomes(player);
        (1..=outcomes.len())
            .map(|end| {
                let window = &outcomes[end.saturating_sub(ROLLING_WINDOW)..end];
                window.iter().map(|&o| o as u32).sum::<u32>() as f32 / window.len() as f32
            })
            .collect()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Plays `games` games seeded `base_seed`, `base_seed + 1`, and so on.
pub fn run_games(
    config: &GameConfig,
    catalogue: Arc<Catalogue>,
    base_seed: u64,
    games: u32,
    agents: &HashMap<PlayerId, BoxedAgent>,
) -> Result<GameStatistics, GameError> {
    let mut stats = GameStatistics::new(config.num_players);

    for i in 0..games {
        let seed = base_seed.wrapping_add(i as u64);
        let (_, record) = run_game(config.clone(), Arc::clone(&catalogue), seed, agents)?;
        stats.record(record.winner);
    }

    info!(games, wins = ?stats.wins, draws = stats.draws, "batch finished");
    Ok(stats)
}

/// Rebuilds the final state of a recorded game.
pub fn replay(record: &GameRecord, catalogue: Arc<Catalogue>) -> Result<BattlegroundsGame, GameError> {
    let mut rng = game_rng(record.seed);
    let mut game = BattlegroundsGame::new(record.config.clone(), catalogue, &mut rng)?;

    for &(player, mv) in &record.moves {
        if !game.make_move_as(player, &mut rng, mv)? {
            return Err(GameError::IllegalMove(mv));
        }
    }
    Ok(game)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::agents::RandomAgent;

    fn random_agents(n: u8) -> HashMap<PlayerId, BoxedAgent> {
        (0..n).map(|i| (PlayerId(i), Box::new(RandomAgent) as BoxedAgent)).collect()
    }

    #[test]
    fn missing_agent_is_reported() {
        let mut agents = random_agents(2);
        agents.remove(&PlayerId(1));
        let result = run_game(GameConfig::for_testing(), Arc::new(Catalogue::builtin()), 3, &agents);
        assert!(matches!(result, Err(GameError::MissingAgent(PlayerId(1)))));
    }

    #[test]
    fn records_survive_json() {
        let config = GameConfig::for_testing().with_max_rounds(Some(3));
        let (_, record) = run_game(config, Arc::new(Catalogue::builtin()), 4, &random_agents(2)).unwrap();

        let json = record.to_json().unwrap();
        assert_eq!(GameRecord::from_json(&json).unwrap(), record);
        assert!(record.moves.iter().any(|(_, mv)| *mv == Move::EndTurn));
    }

    #[test]
    fn batch_counts_every_game_once() {
        let config = GameConfig::for_testing().with_max_rounds(Some(4));
        let stats = run_games(&config, Arc::new(Catalogue::builtin()), 10, 6, &random_agents(2)).unwrap();

        assert_eq!(stats.games(), 6);
        assert_eq!(stats.wins.len(), 2);
        assert_eq!(stats.wins.iter().sum::<u32>() + stats.draws, 6);

        let (_, first) = run_game(config, Arc::new(Catalogue::builtin()), 10, &random_agents(2)).unwrap();
        assert_eq!(stats.winners[0], first.winner);
    }

    #[test]
    fn win_rates_follow_the_outcomes() {
        let mut stats = GameStatistics::new(2);
        for winner in [Some(PlayerId(0)), Some(PlayerId(1)), None, Some(PlayerId(0))] {
            stats.record(winner);
        }

        assert_eq!(stats.wins, vec![2, 1]);
        assert_eq!(stats.draws, 1);
        assert_eq!(stats.win_rate(PlayerId(0)), 0.5);
        assert_eq!(stats.outcomes(PlayerId(0)), vec![1, 0, 0, 1]);
        assert_eq!(stats.cumulative_win_rate(PlayerId(0)), vec![1.0, 0.5, 1.0 / 3.0, 0.5]);
        assert_eq!(stats.rolling_win_rate(PlayerId(1)), vec![0.0, 0.5, 1.0 / 3.0, 0.25]);
    }

    #[test]
    fn rolling_rate_forgets_old_games() {
        let mut stats = GameStatistics::new(2);
        for _ in 0..ROLLING_WINDOW {
            stats.record(Some(PlayerId(1)));
        }
        for _ in 0..ROLLING_WINDOW {
            stats.record(Some(PlayerId(0)));
        }

        assert_eq!(stats.rolling_win_rate(PlayerId(0)).last(), Some(&1.0));
        assert_eq!(stats.cumulative_win_rate(PlayerId(0)).last(), Some(&0.5));
    }

    #[test]
    fn tampered_records_fail_to_replay() {
        let config = GameConfig::for_testing().with_max_rounds(Some(2));
        let (_, mut record) = run_game(config, Arc::new(Catalogue::builtin()), 5, &random_agents(2)).unwrap();
        // a move for the wrong seat
        record.moves.insert(0, (PlayerId(1), Move::EndTurn));

        assert!(matches!(
            replay(&record, Arc::new(Catalogue::builtin())),
            Err(GameError::NotPlayersTurn(PlayerId(1)))
        ));
    }
}
