//! Tunable parameters for boards, combat, games and search.

use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Economy and capacity rules for one tavern board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub hand_size: usize,
    pub board_size: usize,
    /// Recruit slots offered at tier 1.
    pub initial_recruits: usize,
    pub max_recruits: usize,
    /// Extra recruit slot granted when upgrading away from each tier, indexed by tier - 1.
    pub recruit_progression: [usize; 6],
    /// Upgrade price when leaving each tier, indexed by tier - 1.
    pub upgrade_costs: [u8; 6],
    pub base_gold: u8,
    pub gold_per_turn: u8,
    pub max_gold: u8,
    pub buy_cost: u8,
    pub sell_price: u8,
    pub refresh_cost: u8,
    /// Freeze toggles allowed per turn. `None` means unlimited.
    pub max_freezes: Option<u8>,
    pub starting_health: i32,
    pub starting_tier: u8,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            hand_size: 10,
            board_size: 7,
            initial_recruits: 3,
            max_recruits: 6,
            recruit_progression: [1, 0, 1, 0, 1, 0],
            upgrade_costs: [5, 7, 8, 9, 10, 0],
            base_gold: 0,
            gold_per_turn: 1,
            max_gold: 10,
            buy_cost: 3,
            sell_price: 1,
            refresh_cost: 1,
            max_freezes: Some(5),
            starting_health: 40,
            starting_tier: 1,
        }
    }
}

impl BoardConfig {
    pub fn with_starting_health(mut self, health: i32) -> Self {
        self.starting_health = health;
        self
    }

    pub fn with_gold(mut self, base: u8, per_turn: u8) -> Self {
        self.base_gold = base;
        self.gold_per_turn = per_turn;
        self
    }

    pub fn with_max_freezes(mut self, max: Option<u8>) -> Self {
        self.max_freezes = max;
        self
    }

    /// Gold available at the start of `turn`.
    pub fn gold_for_turn(&self, turn: u32) -> u8 {
        let gold = self.base_gold as u32 + turn * self.gold_per_turn as u32;
        gold.min(self.max_gold as u32) as u8
    }

    /// Base upgrade price at `tier`, or `None` at the top tier.
    pub fn upgrade_cost(&self, tier: u8) -> Option<u8> {
        if tier >= crate::cards::MAX_TIER {
            return None;
        }
        self.upgrade_costs.get(tier.checked_sub(1)? as usize).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PairingStrategy {
    /// Shuffle the alive players and pair neighbours.
    #[default]
    Random,
    /// Sort by hero health and pair neighbours.
    NearestHealth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Randomised playouts per resolution.
    pub playouts: u32,
    /// Worker threads for playouts. Results do not depend on this.
    pub threads: usize,
    /// Attacks after which a playout is declared a tie.
    pub attack_cap: u32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self { playouts: 1000, threads: 1, attack_cap: 500 }
    }
}

impl CombatConfig {
    pub fn for_testing() -> Self {
        Self { playouts: 200, ..Self::default() }
    }

    pub fn with_playouts(mut self, playouts: u32) -> Self {
        self.playouts = playouts;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub num_players: usize,
    pub board: BoardConfig,
    pub combat: CombatConfig,
    pub pairing: PairingStrategy,
    /// Stop after this many rounds; the healthiest survivor wins.
    pub max_rounds: Option<u32>,
    /// Moves a player may make in one turn before only `EndTurn` remains legal.
    pub max_actions_per_turn: Option<u32>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            num_players: 8,
            board: BoardConfig::default(),
            combat: CombatConfig::default().with_playouts(1),
            pairing: PairingStrategy::Random,
            max_rounds: Some(30),
            max_actions_per_turn: Some(30),
        }
    }
}

impl GameConfig {
    /// Two players, short games, few playouts.
    pub fn for_testing() -> Self {
        Self {
            num_players: 2,
            board: BoardConfig::default().with_starting_health(10),
            combat: CombatConfig::default().with_playouts(8),
            pairing: PairingStrategy::Random,
            max_rounds: Some(8),
            max_actions_per_turn: Some(8),
        }
    }

    pub fn with_players(mut self, n: usize) -> Self {
        self.num_players = n;
        self
    }

    pub fn with_pairing(mut self, pairing: PairingStrategy) -> Self {
        self.pairing = pairing;
        self
    }

    pub fn with_max_rounds(mut self, rounds: Option<u32>) -> Self {
        self.max_rounds = rounds;
        self
    }

    pub fn with_max_actions_per_turn(mut self, actions: Option<u32>) -> Self {
        self.max_actions_per_turn = actions;
        self
    }

    pub fn with_board(mut self, board: BoardConfig) -> Self {
        self.board = board;
        self
    }

    pub fn with_combat(mut self, combat: CombatConfig) -> Self {
        self.combat = combat;
        self
    }
}

/// Bounds for one Monte Carlo tree search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Exploration weight `C` of the UCT formula.
    pub exploration: f32,
    pub rollouts: u32,
    /// Wall-clock budget, checked between rollouts.
    pub time_limit: Option<Duration>,
    /// Random moves simulated before a rollout gives up without a winner.
    pub max_rollout_depth: Option<u32>,
    /// Independent trees searched on separate threads.
    pub root_replicas: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            exploration: 2f32.sqrt(),
            rollouts: 1000,
            time_limit: None,
            max_rollout_depth: Some(2000),
            root_replicas: 1,
        }
    }
}

impl SearchConfig {
    pub fn for_testing() -> Self {
        Self { rollouts: 50, max_rollout_depth: Some(500), ..Self::default() }
    }

    pub fn with_rollouts(mut self, rollouts: u32) -> Self {
        self.rollouts = rollouts;
        self
    }

    pub fn with_exploration(mut self, c: f32) -> Self {
        self.exploration = c;
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_root_replicas(mut self, replicas: usize) -> Self {
        self.root_replicas = replicas.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gold_is_capped() {
        let config = BoardConfig::default();
        assert_eq!(config.gold_for_turn(1), 1);
        assert_eq!(config.gold_for_turn(9), 9);
        assert_eq!(config.gold_for_turn(25), 10);
    }

    #[test]
    fn upgrade_costs_by_tier() {
        let config = BoardConfig::default();
        let costs: Vec<_> = (1..=6).map(|tier| config.upgrade_cost(tier)).collect();
        assert_eq!(costs, vec![Some(5), Some(7), Some(8), Some(9), Some(10), None]);
    }

    #[test]
    fn configs_round_trip_through_json() {
        let config = GameConfig::for_testing().with_pairing(PairingStrategy::NearestHealth);
        let json = serde_json::to_string(&config).unwrap();
        let back: GameConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);

        let partial: SearchConfig = serde_json::from_str(r#"{"rollouts": 10}"#).unwrap();
        assert_eq!(partial.rollouts, 10);
        assert_eq!(partial.root_replicas, 1);
    }
}
