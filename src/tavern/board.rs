use std::sync::Arc;
use rand::Rng;
use tracing::debug;
use crate::cards::{Catalogue, CardId};
use crate::combat::CombatPhaseResult;
use crate::config::BoardConfig;
use crate::minion::{Minion, MinionView};
use crate::pool::MinionPool;
use super::engine::Event;
use super::{EngineError, Move};
use crate::cards::Trigger;

/// A price change that lasts for a limited number of uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Modifier {
    pub amount: u8,
    pub uses: u8,
}

impl Modifier {
    /// Consumes one use, clearing the modifier when none remain.
    fn consume(slot: &mut Option<Modifier>) {
        if let Some(modifier) = slot {
            modifier.uses = modifier.uses.saturating_sub(1);
            if modifier.uses == 0 {
                *slot = None;
            }
        }
    }
}

/// One player's tavern: hero, economy, hand, board and the recruits on offer.
///
/// Every action validates first and reports a rule violation as `Ok(false)` without
/// touching any state. Triggered effects run through the engine and may draw from or
/// return to the shared pool, which is why actions borrow it.
#[derive(Debug, Clone)]
pub struct TavernBoard {
    pub(super) config: Arc<BoardConfig>,
    pub(super) turn: u32,
    pub(super) hero_health: i32,
    pub(super) tier: u8,
    pub(super) gold: u8,
    pub(super) hand: Vec<Minion>,
    pub(super) board: Vec<Minion>,
    pub(super) recruits: Vec<Option<Minion>>,
    pub(super) recruit_slots: usize,
    pub(super) frozen: bool,
    pub(super) freezes_this_turn: u8,
    pub(super) refresh_override: Option<Modifier>,
    pub(super) upgrade_discount: Option<Modifier>,
    pub(super) combat_history: Vec<CombatPhaseResult>,
    pub(super) bought_this_turn: Vec<CardId>,
    pub(super) played_this_turn: Vec<CardId>,
    pub(super) depth: u32,
}

impl TavernBoard {
    pub fn new(config: Arc<BoardConfig>) -> Self {
        Self {
            turn: 0,
            hero_health: config.starting_health,
            tier: config.starting_tier,
            gold: 0,
            hand: Vec::with_capacity(config.hand_size),
            board: Vec::with_capacity(config.board_size),
            recruits: Vec::new(),
            recruit_slots: config.initial_recruits,
            frozen: false,
            freezes_this_turn: 0,
            refresh_override: None,
            upgrade_discount: None,
            combat_history: Vec::new(),
            bought_this_turn: Vec::new(),
            played_this_turn: Vec::new(),
            depth: 0,
            config,
        }
    }

    /// Starts the next turn: end-of-turn effects, income, a fresh offer unless frozen, then
    /// start-of-turn effects.
    pub fn next_turn<R: Rng>(&mut self, pool: &mut MinionPool, rng: &mut R) -> Result<(), EngineError> {
        if self.turn > 0 {
            self.dispatch(pool, rng, Event::board(Trigger::TurnEnd))?;
        }

        self.bought_this_turn.clear();
        self.played_this_turn.clear();
        self.turn += 1;
        self.gold = self.config.gold_for_turn(self.turn);
        if !self.frozen {
            self.reroll(pool, rng)?;
        }
        self.frozen = false;
        self.freezes_this_turn = 0;

        debug!(turn = self.turn, gold = self.gold, tier = self.tier, "turn started");
        self.dispatch(pool, rng, Event::board(Trigger::TurnStart))
    }

    fn reroll<R: Rng>(&mut self, pool: &mut MinionPool, rng: &mut R) -> Result<(), EngineError> {
        for minion in self.recruits.drain(..).flatten() {
            pool.give_back(&minion)?;
        }

        let slots = self.recruit_slots.min(self.config.max_recruits);
        let drawn = pool.draw(rng, slots, self.tier);
        self.recruits = drawn.into_iter().map(Some).collect();
        self.recruits.resize_with(slots, || None);
        Ok(())
    }

    pub fn refresh_recruits<R: Rng>(
        &mut self,
        pool: &mut MinionPool,
        rng: &mut R,
    ) -> Result<bool, EngineError> {
        let cost = self.refresh_cost();
        if self.frozen || self.gold < cost {
            return Ok(false);
        }

        self.reroll(pool, rng)?;
        self.gold -= cost;
        Modifier::consume(&mut self.refresh_override);
        debug!(cost, gold = self.gold, "refreshed recruits");
        Ok(true)
    }

    pub fn upgrade_tavern(&mut self) -> bool {
        let Some(cost) = self.upgrade_cost() else {
            return false;
        };
        if self.gold < cost {
            return false;
        }

        self.gold -= cost;
        let bonus = self.config.recruit_progression.get(self.tier as usize - 1).copied().unwrap_or(0);
        self.recruit_slots = (self.recruit_slots + bonus).min(self.config.max_recruits);
        self.tier += 1;
        Modifier::consume(&mut self.upgrade_discount);
        debug!(tier = self.tier, cost, "upgraded tavern");
        true
    }

    /// Flips the freeze flag. Fails once the per-turn toggle limit is reached.
    pub fn toggle_freeze(&mut self) -> bool {
        if let Some(max) = self.config.max_freezes {
            if self.freezes_this_turn >= max {
                return false;
            }
        }
        self.frozen = !self.frozen;
        self.freezes_this_turn += 1;
        true
    }

    pub fn buy_minion<R: Rng>(
        &mut self,
        pool: &mut MinionPool,
        rng: &mut R,
        index: usize,
    ) -> Result<bool, EngineError> {
        let cost = self.config.buy_cost;
        if self.gold < cost || self.hand.len() >= self.config.hand_size {
            return Ok(false);
        }
        let Some(minion) = self.recruits.get_mut(index).and_then(Option::take) else {
            return Ok(false);
        };

        debug!(id = minion.id.0, card = minion.card.0, "bought minion");
        self.gold -= cost;
        self.bought_this_turn.push(minion.card);
        self.hand.push(minion);
        self.settle(pool, rng)?;
        Ok(true)
    }

    /// Sells a board minion. Its sell effects fire while it is still on the board, before the
    /// copy goes back to the pool.
    pub fn sell_minion<R: Rng>(
        &mut self,
        pool: &mut MinionPool,
        rng: &mut R,
        index: usize,
    ) -> Result<bool, EngineError> {
        let Some(id) = self.board.get(index).map(|m| m.id) else {
            return Ok(false);
        };

        self.batch(pool, rng, |board, pool, rng| {
            board.run_handlers(pool, rng, &Event::source(Trigger::Sold, id))?;

            if let Some(position) = board.position(id) {
                let minion = board.board.remove(position);
                pool.give_back(&minion)?;
                debug!(id = minion.id.0, "sold minion");
            }
            board.give_gold(board.config.sell_price);
            board.recompute_auras(pool.catalogue());
            Ok(())
        })?;
        Ok(true)
    }

    /// Plays a minion from the hand at `slot` (clamped to the board), or at the right end.
    pub fn play_minion<R: Rng>(
        &mut self,
        pool: &mut MinionPool,
        rng: &mut R,
        hand_index: usize,
        slot: Option<usize>,
    ) -> Result<bool, EngineError> {
        if hand_index >= self.hand.len() || self.board.len() >= self.config.board_size {
            return Ok(false);
        }

        let minion = self.hand.remove(hand_index);
        let subject = Event::subject_of(&minion);
        let id = minion.id;
        let slot = slot.unwrap_or(self.board.len()).min(self.board.len());
        self.played_this_turn.push(minion.card);
        self.board.insert(slot, minion);
        debug!(id = id.0, slot, "played minion");

        self.batch(pool, rng, |board, pool, rng| {
            board.recompute_auras(pool.catalogue());
            board.run_handlers(pool, rng, &Event::source(Trigger::Summoned, id))?;
            board.run_handlers(pool, rng, &Event::any(Trigger::AnySummoned, subject))?;
            board.run_handlers(pool, rng, &Event::source(Trigger::Played, id))?;
            board.run_handlers(pool, rng, &Event::any(Trigger::AnyPlayed, subject))
        })?;
        Ok(true)
    }

    /// Summons a copy of `card` at the right end of the board.
    pub fn summon_minion<R: Rng>(
        &mut self,
        pool: &mut MinionPool,
        rng: &mut R,
        card: CardId,
    ) -> Result<bool, EngineError> {
        if self.board.len() >= self.config.board_size {
            return Ok(false);
        }
        let Some(minion) = pool.acquire(card)? else {
            return Ok(false);
        };

        let position = self.board.len();
        self.place_summon(pool, rng, minion, position)?;
        Ok(true)
    }

    pub fn attack_hero(&mut self, damage: i32) {
        self.hero_health -= damage;
    }

    pub fn is_dead(&self) -> bool {
        self.hero_health <= 0
    }

    pub fn give_gold(&mut self, amount: u8) {
        self.gold = self.gold.saturating_add(amount).min(self.config.max_gold);
    }

    pub fn refresh_cost(&self) -> u8 {
        self.refresh_override.map_or(self.config.refresh_cost, |m| m.amount)
    }

    /// Price of the next upgrade after discounts, or `None` at the top tier.
    pub fn upgrade_cost(&self) -> Option<u8> {
        let cost = self.config.upgrade_cost(self.tier)?;
        let discount = self.upgrade_discount.map_or(0, |m| m.amount);
        Some(cost.saturating_sub(discount))
    }

    pub fn set_refresh_cost(&mut self, cost: u8, uses: u8) {
        self.refresh_override = (uses > 0).then_some(Modifier { amount: cost, uses });
    }

    pub fn set_upgrade_discount(&mut self, amount: u8, uses: u8) {
        self.upgrade_discount = (uses > 0).then_some(Modifier { amount, uses });
    }

    /// Every move the board accepts right now, `EndTurn` last.
    pub fn valid_moves(&self) -> Vec<Move> {
        let mut moves = Vec::new();

        if self.upgrade_cost().is_some_and(|cost| self.gold >= cost) {
            moves.push(Move::Upgrade);
        }
        if !self.frozen && self.gold >= self.refresh_cost() {
            moves.push(Move::Refresh);
        }
        if self.config.max_freezes.map_or(true, |max| self.freezes_this_turn < max) {
            moves.push(Move::Freeze);
        }
        if self.gold >= self.config.buy_cost && self.hand.len() < self.config.hand_size {
            for (i, recruit) in self.recruits.iter().enumerate() {
                if recruit.is_some() {
                    moves.push(Move::Buy(i as u8));
                }
            }
        }
        for i in 0..self.board.len() {
            moves.push(Move::Sell(i as u8));
        }
        if self.board.len() < self.config.board_size {
            for i in 0..self.hand.len() {
                moves.push(Move::Play { hand: i as u8, slot: None });
            }
        }

        moves.push(Move::EndTurn);
        moves
    }

    /// Applies a move. `EndTurn` is accepted without effect; turn flow belongs to the game.
    pub fn make_move<R: Rng>(
        &mut self,
        pool: &mut MinionPool,
        rng: &mut R,
        mv: Move,
    ) -> Result<bool, EngineError> {
        match mv {
            Move::Upgrade => Ok(self.upgrade_tavern()),
            Move::Refresh => self.refresh_recruits(pool, rng),
            Move::Freeze => Ok(self.toggle_freeze()),
            Move::Buy(i) => self.buy_minion(pool, rng, i as usize),
            Move::Sell(i) => self.sell_minion(pool, rng, i as usize),
            Move::Play { hand, slot } => self.play_minion(pool, rng, hand as usize, slot.map(usize::from)),
            Move::EndTurn => Ok(true),
        }
    }

    /// Returns every minion the board holds to the pool, as when its hero is eliminated.
    pub fn release(&mut self, pool: &mut MinionPool) -> Result<(), EngineError> {
        let recruits = self.recruits.drain(..).flatten();
        for minion in self.hand.drain(..).chain(self.board.drain(..)).chain(recruits) {
            pool.give_back(&minion)?;
        }
        Ok(())
    }

    pub fn record_combat(&mut self, result: CombatPhaseResult) {
        self.combat_history.push(result);
    }

    pub fn combat_history(&self) -> &[CombatPhaseResult] {
        &self.combat_history
    }

    /// Whether the most recent combat was won, if there was one.
    pub fn won_previous(&self) -> Option<bool> {
        self.combat_history.last().map(|r| r.win_probability > r.lose_probability)
    }

    /// Cards bought since the current turn started, in order.
    pub fn minions_bought(&self) -> &[CardId] {
        &self.bought_this_turn
    }

    /// Cards played from the hand since the current turn started, in order.
    pub fn minions_played(&self) -> &[CardId] {
        &self.played_this_turn
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn hero_health(&self) -> i32 {
        self.hero_health
    }

    pub fn tier(&self) -> u8 {
        self.tier
    }

    pub fn gold(&self) -> u8 {
        self.gold
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn hand(&self) -> &[Minion] {
        &self.hand
    }

    pub fn board(&self) -> &[Minion] {
        &self.board
    }

    pub fn recruits(&self) -> &[Option<Minion>] {
        &self.recruits
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn board_view(&self, catalogue: &Catalogue) -> Vec<MinionView> {
        Self::views(self.board.iter(), catalogue)
    }

    pub fn hand_view(&self, catalogue: &Catalogue) -> Vec<MinionView> {
        Self::views(self.hand.iter(), catalogue)
    }

    pub fn recruit_view(&self, catalogue: &Catalogue) -> Vec<Option<MinionView>> {
        self.recruits
            .iter()
            .map(|slot| slot.as_ref().map(|m| m.view(&catalogue[m.card].name)))
            .collect()
    }

    fn views<'a>(minions: impl Iterator<Item = &'a Minion>, catalogue: &Catalogue) -> Vec<MinionView> {
        minions.map(|m| m.view(&catalogue[m.card].name)).collect()
    }

    /// Number of pooled copies this board keeps out of the pool.
    pub fn pooled_count(&self) -> u32 {
        let recruits = self.recruits.iter().flatten();
        self.hand.iter().chain(self.board.iter()).chain(recruits).filter(|m| m.pooled).count() as u32
    }
}
