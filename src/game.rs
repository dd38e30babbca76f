use std::fmt;
use std::sync::Arc;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use crate::{Outcome, Player, State};
use crate::ai::SearchError;
use crate::cards::Catalogue;
use crate::combat::{CombatPhaseResult, CombatResolver, Lineup};
use crate::config::{GameConfig, PairingStrategy};
use crate::pool::MinionPool;
use crate::tavern::{EngineError, Move, TavernBoard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Player for PlayerId {}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerPhase {
    NotYetTurn,
    TurnInProgress,
    TurnCompleted,
    Eliminated,
}

#[derive(Error, Debug)]
pub enum GameError {
    #[error("a game needs an even number of players, at least two (got {0})")]
    InvalidPlayerCount(usize),

    #[error("the game is already over")]
    GameOver,

    #[error("no player is taking a turn")]
    NoActiveTurn,

    #[error("player {0} has been eliminated")]
    Eliminated(PlayerId),

    #[error("player {0} already completed this round's turn")]
    TurnAlreadyCompleted(PlayerId),

    #[error("it is not player {0}'s turn")]
    NotPlayersTurn(PlayerId),

    #[error("move {0} was rejected")]
    IllegalMove(Move),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Agent(#[from] SearchError),

    #[error("no agent was supplied for player {0}")]
    MissingAgent(PlayerId),
}

/// One pairing of a resolved round, from `player`'s side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatRecord {
    pub round: u32,
    pub player: PlayerId,
    /// `None` for a bye.
    pub opponent: Option<PlayerId>,
    pub result: Option<CombatPhaseResult>,
    pub damage_dealt: i32,
    pub damage_taken: i32,
}

/// A full battlegrounds lobby: the shared pool, one tavern per player and the round loop
/// that pairs boards for combat once every living player has ended their turn.
#[derive(Debug, Clone)]
pub struct BattlegroundsGame {
    config: Arc<GameConfig>,
    pool: MinionPool,
    boards: Vec<TavernBoard>,
    phases: Vec<PlayerPhase>,
    active: Option<PlayerId>,
    round: u32,
    actions_this_turn: u32,
    resolver: CombatResolver,
    last_combats: Vec<CombatRecord>,
    /// Round in which each player was knocked out.
    eliminated_in: Vec<Option<u32>>,
}

impl BattlegroundsGame {
    pub fn new<R: Rng>(config: GameConfig, catalogue: Arc<Catalogue>, rng: &mut R) -> Result<Self, GameError> {
        let n = config.num_players;
        if n < 2 || n % 2 != 0 || n > u8::MAX as usize {
            return Err(GameError::InvalidPlayerCount(n));
        }

        let board_config = Arc::new(config.board.clone());
        let mut game = Self {
            pool: MinionPool::new(catalogue),
            boards: (0..n).map(|_| TavernBoard::new(board_config.clone())).collect(),
            phases: vec![PlayerPhase::NotYetTurn; n],
            active: None,
            round: 1,
            actions_this_turn: 0,
            resolver: CombatResolver::new(config.combat.clone()),
            last_combats: Vec::new(),
            eliminated_in: vec![None; n],
            config: Arc::new(config),
        };

        game.start_turn(PlayerId(0), rng)?;
        Ok(game)
    }

    /// Every move the active player may make. Empty once the game is over.
    pub fn legal_moves(&self) -> Vec<Move> {
        let Some(player) = self.active else { return Vec::new() };
        if self.turn_exhausted() {
            return vec![Move::EndTurn];
        }
        self.boards[player.index()].valid_moves()
    }

    /// Applies a move for the active player. Returns `Ok(false)` when the board rejects it,
    /// leaving the game untouched.
    pub fn make_move<R: Rng>(&mut self, rng: &mut R, mv: Move) -> Result<bool, GameError> {
        if self.is_over() {
            return Err(GameError::GameOver);
        }
        let player = self.active.ok_or(GameError::NoActiveTurn)?;

        if mv == Move::EndTurn {
            self.end_turn(player, rng)?;
            return Ok(true);
        }
        if self.turn_exhausted() {
            return Ok(false);
        }

        let accepted = self.boards[player.index()].make_move(&mut self.pool, rng, mv)?;
        if accepted {
            self.actions_this_turn += 1;
            debug!(player = %player, mv = %mv, gold = self.boards[player.index()].gold(), "move applied");
        }
        Ok(accepted)
    }

    /// Like [`BattlegroundsGame::make_move`], checking that `player` is the one acting.
    pub fn make_move_as<R: Rng>(&mut self, player: PlayerId, rng: &mut R, mv: Move) -> Result<bool, GameError> {
        match self.phases.get(player.index()) {
            None => return Err(GameError::NotPlayersTurn(player)),
            Some(PlayerPhase::Eliminated) => return Err(GameError::Eliminated(player)),
            Some(PlayerPhase::TurnCompleted) => return Err(GameError::TurnAlreadyCompleted(player)),
            Some(PlayerPhase::NotYetTurn) => return Err(GameError::NotPlayersTurn(player)),
            Some(PlayerPhase::TurnInProgress) => {}
        }
        self.make_move(rng, mv)
    }

    fn turn_exhausted(&self) -> bool {
        self.config.max_actions_per_turn.is_some_and(|cap| self.actions_this_turn >= cap)
    }

    fn start_turn<R: Rng>(&mut self, player: PlayerId, rng: &mut R) -> Result<(), GameError> {
        self.boards[player.index()].next_turn(&mut self.pool, rng)?;
        self.phases[player.index()] = PlayerPhase::TurnInProgress;
        self.active = Some(player);
        self.actions_this_turn = 0;
        debug!(player = %player, round = self.round, "turn started");
        Ok(())
    }

    fn end_turn<R: Rng>(&mut self, player: PlayerId, rng: &mut R) -> Result<(), GameError> {
        self.phases[player.index()] = PlayerPhase::TurnCompleted;
        self.active = None;
        debug!(player = %player, actions = self.actions_this_turn, "turn ended");

        match self.phases.iter().position(|p| *p == PlayerPhase::NotYetTurn) {
            Some(next) => self.start_turn(PlayerId(next as u8), rng),
            None => self.resolve_round(rng),
        }
    }

    fn resolve_round<R: Rng>(&mut self, rng: &mut R) -> Result<(), GameError> {
        let pairs = self.pair_players(rng);
        let catalogue = self.pool.catalogue().clone();
        self.last_combats.clear();

        for (a, b) in pairs {
            let Some(b) = b else {
                self.last_combats.push(CombatRecord {
                    round: self.round,
                    player: a,
                    opponent: None,
                    result: None,
                    damage_dealt: 0,
                    damage_taken: 0,
                });
                continue;
            };

            let friendly = Lineup::from_board(&self.boards[a.index()], &catalogue);
            let enemy = Lineup::from_board(&self.boards[b.index()], &catalogue);
            let result = self.resolver.resolve(&friendly, &enemy, rng.gen());

            let damage = result.mean_score.abs().round() as i32;
            let (to_a, to_b) = match result.mean_score {
                s if s > 0.0 => (0, damage),
                s if s < 0.0 => (damage, 0),
                _ => (0, 0),
            };
            self.boards[a.index()].attack_hero(to_a);
            self.boards[b.index()].attack_hero(to_b);

            info!(
                round = self.round,
                a = %a,
                b = %b,
                win = result.win_probability,
                mean = result.mean_score,
                damage,
                "combat resolved"
            );

            self.boards[b.index()].record_combat(result.invert());
            self.boards[a.index()].record_combat(result.clone());
            self.last_combats.push(CombatRecord {
                round: self.round,
                player: a,
                opponent: Some(b),
                result: Some(result.clone()),
                damage_dealt: to_b,
                damage_taken: to_a,
            });
            self.last_combats.push(CombatRecord {
                round: self.round,
                player: b,
                opponent: Some(a),
                result: Some(result.invert()),
                damage_dealt: to_a,
                damage_taken: to_b,
            });
        }

        for i in 0..self.boards.len() {
            if self.phases[i] != PlayerPhase::Eliminated && self.boards[i].is_dead() {
                self.phases[i] = PlayerPhase::Eliminated;
                self.eliminated_in[i] = Some(self.round);
                self.boards[i].release(&mut self.pool)?;
                info!(player = %PlayerId(i as u8), round = self.round, "eliminated");
            }
        }

        for phase in self.phases.iter_mut().filter(|p| **p != PlayerPhase::Eliminated) {
            *phase = PlayerPhase::NotYetTurn;
        }
        self.round += 1;

        if self.is_over() {
            info!(round = self.round - 1, alive = self.alive().len(), "game over");
            return Ok(());
        }
        match self.phases.iter().position(|p| *p == PlayerPhase::NotYetTurn) {
            Some(first) => self.start_turn(PlayerId(first as u8), rng),
            None => Ok(()),
        }
    }

    /// Pairs living players for combat. An odd player out gets a bye.
    fn pair_players<R: Rng>(&self, rng: &mut R) -> Vec<(PlayerId, Option<PlayerId>)> {
        let mut alive = self.alive();
        match self.config.pairing {
            PairingStrategy::Random => alive.shuffle(rng),
            PairingStrategy::NearestHealth => {
                alive.sort_by_key(|p| std::cmp::Reverse(self.boards[p.index()].hero_health()));
            }
        }

        alive.chunks(2).map(|pair| (pair[0], pair.get(1).copied())).collect()
    }

    pub fn alive(&self) -> Vec<PlayerId> {
        (0..self.phases.len())
            .filter(|&i| self.phases[i] != PlayerPhase::Eliminated)
            .map(|i| PlayerId(i as u8))
            .collect()
    }

    pub fn is_over(&self) -> bool {
        self.alive().len() <= 1 || self.config.max_rounds.is_some_and(|max| self.round > max)
    }

    pub fn outcome(&self) -> Option<Outcome<PlayerId>> {
        if !self.is_over() {
            return None;
        }

        let alive = self.alive();
        let contenders = if alive.is_empty() {
            // everyone fell in the same round
            let last = self.eliminated_in.iter().flatten().max().copied();
            (0..self.phases.len())
                .filter(|&i| self.eliminated_in[i] == last)
                .map(|i| PlayerId(i as u8))
                .collect()
        } else {
            let best = alive.iter().map(|p| self.boards[p.index()].hero_health()).max().unwrap_or(0);
            alive
                .into_iter()
                .filter(|p| self.boards[p.index()].hero_health() == best)
                .collect::<Vec<_>>()
        };

        if contenders.len() == 1 {
            Some(Outcome::Winner(contenders[0]))
        } else {
            Some(Outcome::Draw(contenders))
        }
    }

    pub fn active_player(&self) -> Option<PlayerId> {
        self.active
    }

    pub fn phase(&self, player: PlayerId) -> Option<PlayerPhase> {
        self.phases.get(player.index()).copied()
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn board(&self, player: PlayerId) -> Option<&TavernBoard> {
        self.boards.get(player.index())
    }

    pub fn boards(&self) -> &[TavernBoard] {
        &self.boards
    }

    pub fn pool(&self) -> &MinionPool {
        &self.pool
    }

    pub fn catalogue(&self) -> &Catalogue {
        self.pool.catalogue()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn last_combats(&self) -> &[CombatRecord] {
        &self.last_combats
    }

    /// Copies of purchasable cards currently in play or in the pool. Constant for a game.
    pub fn copies_in_circulation(&self) -> u32 {
        self.pool.size() + self.boards.iter().map(TavernBoard::pooled_count).sum::<u32>()
    }
}

impl State<Move, PlayerId> for BattlegroundsGame {
    type Error = GameError;

    fn actions(&self) -> Vec<Move> {
        self.legal_moves()
    }

    fn apply_action<R: Rng>(&self, rng: &mut R, action: &Move) -> Result<Self, GameError> {
        let mut next = self.clone();
        if next.make_move(rng, *action)? {
            Ok(next)
        } else {
            Err(GameError::IllegalMove(*action))
        }
    }

    fn outcome(&self) -> Option<Outcome<PlayerId>> {
        BattlegroundsGame::outcome(self)
    }

    fn current_player(&self) -> PlayerId {
        self.active.unwrap_or(PlayerId(0))
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use super::*;

    fn game(config: GameConfig, seed: u64) -> (BattlegroundsGame, ChaCha20Rng) {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let game = BattlegroundsGame::new(config, Arc::new(Catalogue::builtin()), &mut rng).unwrap();
        (game, rng)
    }

    #[test]
    fn player_count_must_be_even() {
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        let catalogue = Arc::new(Catalogue::builtin());
        for n in [0, 1, 3] {
            let config = GameConfig::for_testing().with_players(n);
            let result = BattlegroundsGame::new(config, catalogue.clone(), &mut rng);
            assert!(matches!(result, Err(GameError::InvalidPlayerCount(_))));
        }
    }

    #[test]
    fn turns_pass_in_order_and_rounds_advance() {
        let (mut game, mut rng) = game(GameConfig::for_testing().with_players(4), 1);
        assert_eq!(game.round(), 1);

        for expected in 0..4 {
            assert_eq!(game.active_player(), Some(PlayerId(expected)));
            assert_eq!(game.phase(PlayerId(expected)), Some(PlayerPhase::TurnInProgress));
            assert!(game.make_move(&mut rng, Move::EndTurn).unwrap());
        }

        assert_eq!(game.round(), 2);
        assert_eq!(game.active_player(), Some(PlayerId(0)));
        assert_eq!(game.last_combats().len(), 4);
        for player in 1..4 {
            assert_eq!(game.phase(PlayerId(player)), Some(PlayerPhase::NotYetTurn));
        }
    }

    #[test]
    fn acting_out_of_turn_is_an_error() {
        let (mut game, mut rng) = game(GameConfig::for_testing(), 2);
        assert!(matches!(
            game.make_move_as(PlayerId(1), &mut rng, Move::Refresh),
            Err(GameError::NotPlayersTurn(PlayerId(1)))
        ));

        game.make_move(&mut rng, Move::EndTurn).unwrap();
        assert!(matches!(
            game.make_move_as(PlayerId(0), &mut rng, Move::Refresh),
            Err(GameError::TurnAlreadyCompleted(PlayerId(0)))
        ));
    }

    #[test]
    fn action_cap_leaves_only_end_turn() {
        let config = GameConfig::for_testing().with_max_actions_per_turn(Some(2));
        let (mut game, mut rng) = game(config, 3);

        assert!(game.make_move(&mut rng, Move::Freeze).unwrap());
        assert!(game.make_move(&mut rng, Move::Freeze).unwrap());
        assert_eq!(game.legal_moves(), vec![Move::EndTurn]);
        assert!(!game.make_move(&mut rng, Move::Freeze).unwrap());
    }

    #[test]
    fn empty_boards_deal_no_damage() {
        let (mut game, mut rng) = game(GameConfig::for_testing(), 4);
        game.make_move(&mut rng, Move::EndTurn).unwrap();
        game.make_move(&mut rng, Move::EndTurn).unwrap();

        for board in game.boards() {
            assert_eq!(board.hero_health(), game.config().board.starting_health);
        }
        let record = &game.last_combats()[0];
        assert_eq!(record.result.as_ref().map(|r| r.tie_probability), Some(1.0));
    }

    #[test]
    fn a_lone_minion_hits_the_empty_board() {
        let config = GameConfig::for_testing();
        let config = config.clone().with_board(config.board.with_gold(2, 1));
        let (mut game, mut rng) = game(config, 5);
        assert!(game.make_move(&mut rng, Move::Buy(0)).unwrap());
        assert!(game.make_move(&mut rng, Move::Play { hand: 0, slot: None }).unwrap());
        game.make_move(&mut rng, Move::EndTurn).unwrap();
        game.make_move(&mut rng, Move::EndTurn).unwrap();

        let starting = game.config().board.starting_health;
        let enemy = game.board(PlayerId(1)).unwrap();
        // tavern tier 1 plus at least one tier 1 survivor
        assert!(enemy.hero_health() <= starting - 2);
        // a homunculus may have hit its own hero
        assert!(game.board(PlayerId(0)).unwrap().hero_health() >= starting - 2);
        assert_eq!(game.board(PlayerId(0)).unwrap().won_previous(), Some(true));
    }

    #[test]
    fn round_cap_ends_the_game() {
        let config = GameConfig::for_testing().with_max_rounds(Some(2));
        let (mut game, mut rng) = game(config, 6);
        while !game.is_over() {
            game.make_move(&mut rng, Move::EndTurn).unwrap();
        }

        assert_eq!(game.round(), 3);
        assert!(game.legal_moves().is_empty());
        assert!(matches!(game.outcome(), Some(Outcome::Draw(players)) if players.len() == 2));
        assert!(matches!(game.make_move(&mut rng, Move::EndTurn), Err(GameError::GameOver)));
    }

    #[test]
    fn rejected_actions_are_errors_through_the_state_interface() {
        let (game, mut rng) = game(GameConfig::for_testing(), 7);
        // no minion in hand to play
        let result = game.apply_action(&mut rng, &Move::Play { hand: 0, slot: None });
        assert!(matches!(result, Err(GameError::IllegalMove(_))));
    }
}
