//! Trigger dispatch, effect interpretation and the settle step (deaths, golden merges)
//! for a tavern board.

use std::collections::BTreeMap;
use std::sync::Arc;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, trace};
use crate::cards::{
    AuraScope, CardId, Catalogue, Condition, Effect, Keywords, MinionType, MinionTypes, Scope,
    Tally, Target, Trigger,
};
use crate::minion::{Buff, InstanceId, Minion};
use crate::pool::MinionPool;
use super::board::TavernBoard;
use super::EngineError;

/// The minion an event is about, captured when the event is raised.
#[derive(Debug, Clone, Copy)]
pub(super) struct Subject {
    pub id: InstanceId,
    pub types: MinionTypes,
    pub keywords: Keywords,
}

#[derive(Debug, Clone, Copy)]
pub(super) struct Event {
    pub trigger: Trigger,
    pub source: Option<InstanceId>,
    pub subject: Option<Subject>,
}

impl Event {
    pub fn board(trigger: Trigger) -> Self {
        Self { trigger, source: None, subject: None }
    }

    pub fn source(trigger: Trigger, id: InstanceId) -> Self {
        Self { trigger, source: Some(id), subject: None }
    }

    pub fn any(trigger: Trigger, subject: Subject) -> Self {
        Self { trigger, source: None, subject: Some(subject) }
    }

    pub fn subject_of(minion: &Minion) -> Subject {
        Subject { id: minion.id, types: minion.types, keywords: minion.keywords }
    }
}

impl Condition {
    fn accepts(&self, listener: InstanceId, subject: Option<&Subject>, won_previous: bool) -> bool {
        if self.after_win && !won_previous {
            return false;
        }
        let Some(subject) = subject else {
            return self.subject_type.is_none() && self.subject_keyword.is_none();
        };
        if self.exclude_self && subject.id == listener {
            return false;
        }
        if let Some(minion_type) = self.subject_type {
            if !subject.types.contains(minion_type) {
                return false;
            }
        }
        if let Some(keyword) = self.subject_keyword {
            if !subject.keywords.contains(keyword) {
                return false;
            }
        }
        true
    }
}

impl TavernBoard {
    /// Runs one event and, if this is the outermost dispatch, settles the board afterwards.
    pub(super) fn dispatch<R: Rng>(
        &mut self,
        pool: &mut MinionPool,
        rng: &mut R,
        event: Event,
    ) -> Result<(), EngineError> {
        self.batch(pool, rng, |board, pool, rng| board.run_handlers(pool, rng, &event))
    }

    /// Runs `f` as one dispatch: deaths it causes are only reaped once the outermost batch
    /// returns.
    pub(super) fn batch<R, T, F>(&mut self, pool: &mut MinionPool, rng: &mut R, f: F) -> Result<T, EngineError>
    where
        R: Rng,
        F: FnOnce(&mut Self, &mut MinionPool, &mut R) -> Result<T, EngineError>,
    {
        self.depth += 1;
        let result = f(self, pool, rng);
        self.depth -= 1;

        let value = result?;
        if self.depth == 0 {
            self.settle(pool, rng)?;
        }
        Ok(value)
    }

    pub(super) fn run_handlers<R: Rng>(
        &mut self,
        pool: &mut MinionPool,
        rng: &mut R,
        event: &Event,
    ) -> Result<(), EngineError> {
        let catalogue = Arc::clone(pool.catalogue());
        let won_previous = self.won_previous() == Some(true);

        let listeners: Vec<InstanceId> = match event.trigger.scope() {
            Scope::Source => event.source.into_iter().collect(),
            Scope::Board => self.board.iter().map(|m| m.id).collect(),
        };

        for id in listeners {
            let Some(minion) = self.find(id) else { continue };
            if minion.is_dead() && event.trigger != Trigger::Deathrattle {
                continue;
            }

            let card = minion.card;
            for handler in catalogue[card].handlers_for(event.trigger) {
                if !handler.condition.accepts(id, event.subject.as_ref(), won_previous) {
                    continue;
                }
                // an earlier handler may have killed this minion
                if event.trigger != Trigger::Deathrattle && self.find(id).map_or(true, Minion::is_dead) {
                    break;
                }

                trace!(trigger = ?event.trigger, card = %catalogue[card].name, "handler fired");
                self.apply(pool, rng, &catalogue, id, event, &handler.effect)?;
            }
        }
        Ok(())
    }

    fn apply<R: Rng>(
        &mut self,
        pool: &mut MinionPool,
        rng: &mut R,
        catalogue: &Catalogue,
        this: InstanceId,
        event: &Event,
        effect: &Effect,
    ) -> Result<(), EngineError> {
        match effect {
            Effect::Buff { target, attack, health, abilities } => {
                let buff = Buff { attack: *attack, health: *health, abilities: *abilities, aura: false };
                for id in self.targets(rng, *target, this, event) {
                    if let Some(minion) = self.find_mut(id) {
                        minion.add_buff(buff);
                    }
                }
            }
            Effect::BuffPerTally { target, attack, health, tally, base } => {
                let n = self.tally(catalogue, *tally) as i32 + *base as i32;
                if n > 0 {
                    let buff = Buff::stats(attack.saturating_mul(n), health.saturating_mul(n));
                    for id in self.targets(rng, *target, this, event) {
                        if let Some(minion) = self.find_mut(id) {
                            minion.add_buff(buff);
                        }
                    }
                }
            }
            Effect::Devour { filter, gold, factor } => {
                self.give_gold(*gold);
                let prey = self
                    .board
                    .iter()
                    .filter(|m| !m.is_dead() && m.id != this && m.types.matches(*filter))
                    .map(|m| m.id)
                    .collect::<Vec<_>>()
                    .choose(rng)
                    .copied();

                if let Some(position) = prey.and_then(|id| self.position(id)) {
                    let eaten = self.board.remove(position);
                    let n = *factor as i32;
                    let buff = Buff::stats(eaten.attack().saturating_mul(n), eaten.health().saturating_mul(n));
                    pool.give_back(&eaten)?;
                    if let Some(minion) = self.find_mut(this) {
                        minion.add_buff(buff);
                    }
                    debug!(id = eaten.id.0, "minion devoured");
                    self.recompute_auras(catalogue);
                }
            }
            Effect::Damage { target, amount, times } => {
                for _ in 0..*times {
                    self.damage(rng, *target, this, event, *amount);
                }
            }
            Effect::DamagePerType { target, per, times } => {
                let amount = self
                    .board
                    .iter()
                    .filter(|m| !m.is_dead() && m.types.contains(*per))
                    .count() as i32;
                for _ in 0..*times {
                    self.damage(rng, *target, this, event, amount);
                }
            }
            Effect::Summon { card, golden, count } => {
                let id = catalogue.find(card, *golden).ok_or_else(|| EngineError::MissingCard(card.clone()))?;
                let total = *count as u32 * self.summon_factor(catalogue);
                for _ in 0..total {
                    if self.live_on_board() >= self.config.board_size {
                        break;
                    }
                    let Some(minion) = pool.acquire(id)? else { break };
                    let position = self.position(this).map_or(self.board.len(), |p| p + 1);
                    self.place_summon(pool, rng, minion, position)?;
                }
            }
            Effect::AddToHand { card, golden, count } => {
                let id = catalogue.find(card, *golden).ok_or_else(|| EngineError::MissingCard(card.clone()))?;
                for _ in 0..*count {
                    if self.hand.len() >= self.config.hand_size {
                        break;
                    }
                    let Some(minion) = pool.acquire(id)? else { break };
                    self.hand.push(minion);
                }
            }
            Effect::DamageHero { amount } => self.attack_hero(*amount),
            Effect::GainGold { amount } => self.give_gold(*amount),
            Effect::DiscountUpgrade { amount, uses } => self.set_upgrade_discount(*amount, *uses),
            Effect::SetRefreshCost { cost, uses } => self.set_refresh_cost(*cost, *uses),
        }
        Ok(())
    }

    /// Product of the summon factors of every living board minion.
    fn summon_factor(&self, catalogue: &Catalogue) -> u32 {
        self.board
            .iter()
            .filter(|m| !m.is_dead())
            .map(|m| catalogue[m.card].summon_factor.max(1) as u32)
            .product()
    }

    /// Minions on the board that are not waiting to be reaped.
    pub(super) fn live_on_board(&self) -> usize {
        self.board.iter().filter(|m| !m.is_dead()).count()
    }

    fn tally(&self, catalogue: &Catalogue, tally: Tally) -> u32 {
        let matching = |cards: &[CardId], filter: Option<MinionType>| {
            cards.iter().filter(|card| catalogue[**card].types.matches(filter)).count() as u32
        };
        match tally {
            Tally::BoughtThisTurn(filter) => matching(self.bought_this_turn.as_slice(), filter),
            Tally::PlayedThisTurn(filter) => matching(self.played_this_turn.as_slice(), filter),
            Tally::GoldenOnBoard => self.board.iter().filter(|m| !m.is_dead() && m.golden).count() as u32,
        }
    }

    fn damage<R: Rng>(&mut self, rng: &mut R, target: Target, this: InstanceId, event: &Event, amount: i32) {
        for id in self.targets(rng, target, this, event) {
            if let Some(minion) = self.find_mut(id) {
                minion.take_damage(amount);
            }
        }
    }

    /// Resolves a target to instance ids. There are no enemies in the tavern.
    fn targets<R: Rng>(&self, rng: &mut R, target: Target, this: InstanceId, event: &Event) -> Vec<InstanceId> {
        let friendly = |filter: Option<_>, exclude_self: bool| -> Vec<InstanceId> {
            self.board
                .iter()
                .filter(|m| !m.is_dead() && m.types.matches(filter))
                .filter(|m| !(exclude_self && m.id == this))
                .map(|m| m.id)
                .collect()
        };

        let ids = match target {
            Target::This => vec![this],
            Target::Subject => event.subject.map(|s| s.id).into_iter().collect(),
            Target::RandomFriendly { filter, count, exclude_self } => {
                let candidates = friendly(filter, exclude_self);
                candidates.choose_multiple(rng, count as usize).copied().collect()
            }
            Target::AllFriendly { filter, exclude_self } => friendly(filter, exclude_self),
            Target::RandomEnemy => Vec::new(),
            Target::Recruits => self.recruits.iter().flatten().map(|m| m.id).collect(),
            Target::Adjacent => match self.position(this) {
                Some(p) => [p.checked_sub(1), Some(p + 1)]
                    .into_iter()
                    .flatten()
                    .filter_map(|i| self.board.get(i))
                    .filter(|m| !m.is_dead())
                    .map(|m| m.id)
                    .collect(),
                None => Vec::new(),
            },
            Target::Leftmost => self.board.iter().find(|m| !m.is_dead()).map(|m| m.id).into_iter().collect(),
            Target::DistinctTypes { count } => {
                let mut groups: Vec<(MinionTypes, Vec<InstanceId>)> = Vec::new();
                for minion in self.board.iter().filter(|m| !m.is_dead() && m.id != this) {
                    match groups.iter_mut().find(|(types, _)| *types == minion.types) {
                        Some((_, ids)) => ids.push(minion.id),
                        None => groups.push((minion.types, vec![minion.id])),
                    }
                }
                let picked: Vec<_> = groups.choose_multiple(rng, count as usize).collect();
                picked.into_iter().filter_map(|(_, ids)| ids.choose(rng).copied()).collect()
            }
        };
        ids
    }

    /// Inserts a summoned minion and raises its summon events.
    pub(super) fn place_summon<R: Rng>(
        &mut self,
        pool: &mut MinionPool,
        rng: &mut R,
        minion: Minion,
        position: usize,
    ) -> Result<(), EngineError> {
        if self.live_on_board() >= self.config.board_size {
            return Err(EngineError::Capacity { zone: "board", len: self.board.len() + 1 });
        }

        let id = minion.id;
        let subject = Event::subject_of(&minion);
        self.board.insert(position.min(self.board.len()), minion);

        self.batch(pool, rng, |board, pool, rng| {
            board.recompute_auras(pool.catalogue());
            board.run_handlers(pool, rng, &Event::source(Trigger::Summoned, id))?;
            board.run_handlers(pool, rng, &Event::any(Trigger::AnySummoned, subject))
        })
    }

    /// Reaps dead minions and merges golden triples until the board is stable.
    pub(super) fn settle<R: Rng>(&mut self, pool: &mut MinionPool, rng: &mut R) -> Result<(), EngineError> {
        loop {
            let reaped = self.reap(pool, rng)?;
            let merged = self.merge_golden(pool)?;
            if !reaped && !merged {
                return Ok(());
            }
        }
    }

    /// Removes every dead minion, left to right. Each deathrattle resolves while its minion
    /// still occupies its slot so summons land in place.
    fn reap<R: Rng>(&mut self, pool: &mut MinionPool, rng: &mut R) -> Result<bool, EngineError> {
        let mut reaped = false;

        while let Some(id) = self.board.iter().find(|m| m.is_dead()).map(|m| m.id) {
            self.depth += 1;
            let result = self.run_handlers(pool, rng, &Event::source(Trigger::Deathrattle, id));
            self.depth -= 1;
            result?;

            if let Some(position) = self.position(id) {
                let minion = self.board.remove(position);
                pool.give_back(&minion)?;
                debug!(id = id.0, "minion died");
            }
            self.recompute_auras(pool.catalogue());
            reaped = true;
        }

        Ok(reaped)
    }

    /// Collapses three regular copies of a card across hand and board into one golden copy
    /// in the hand, keeping their permanent buffs. Skipped while the hand has no room.
    fn merge_golden(&mut self, pool: &mut MinionPool) -> Result<bool, EngineError> {
        let catalogue = Arc::clone(pool.catalogue());

        let mut copies: BTreeMap<CardId, usize> = BTreeMap::new();
        for minion in self.hand.iter().chain(self.board.iter()) {
            if !minion.golden && !minion.is_dead() {
                *copies.entry(minion.card).or_default() += 1;
            }
        }

        let candidate = copies.into_iter().filter(|(_, n)| *n >= 3).find_map(|(card, _)| {
            let golden = catalogue.golden_of(card).filter(|g| *g != card)?;
            let in_hand = self.hand.iter().filter(|m| m.card == card).count().min(3);
            (self.hand.len() - in_hand < self.config.hand_size).then_some((card, golden))
        });
        let Some((card, golden)) = candidate else {
            return Ok(false);
        };

        let mut taken = Vec::with_capacity(3);
        while taken.len() < 3 {
            if let Some(i) = self.hand.iter().position(|m| m.card == card) {
                taken.push(self.hand.remove(i));
            } else if let Some(i) = self.board.iter().position(|m| m.card == card && !m.is_dead()) {
                taken.push(self.board.remove(i));
            } else {
                return Err(EngineError::Capacity { zone: "golden merge", len: taken.len() });
            }
        }

        let pooled = taken.iter().filter(|m| m.pooled).count() as u32;
        if pooled > 1 {
            pool.return_copies(card, pooled - 1)?;
        }

        let mut merged = pool.construct(golden, pooled > 0);
        for buff in taken.iter().flat_map(|m| m.permanent_buffs()) {
            merged.add_buff(*buff);
        }
        debug!(card = %catalogue[card].name, id = merged.id.0, "merged golden copy");

        self.hand.push(merged);
        self.recompute_auras(&catalogue);
        Ok(true)
    }

    /// Strips every aura buff and reapplies each live aura, left to right.
    pub(super) fn recompute_auras(&mut self, catalogue: &Catalogue) {
        for minion in self.board.iter_mut() {
            minion.strip_aura_buffs();
        }

        let auras: Vec<_> = self
            .board
            .iter()
            .enumerate()
            .filter(|(_, m)| !m.is_dead())
            .filter_map(|(i, m)| catalogue[m.card].aura.map(|aura| (i, aura)))
            .collect();

        for (source, aura) in auras {
            let buff = Buff { attack: aura.attack, health: aura.health, abilities: aura.abilities, aura: true };
            for (i, minion) in self.board.iter_mut().enumerate() {
                let in_scope = match aura.scope {
                    AuraScope::OtherFriendly => i != source,
                    AuraScope::Adjacent => i + 1 == source || source + 1 == i,
                };
                if in_scope && minion.types.matches(aura.filter) {
                    minion.add_buff(buff);
                }
            }
        }
    }

    pub(super) fn position(&self, id: InstanceId) -> Option<usize> {
        self.board.iter().position(|m| m.id == id)
    }

    fn find(&self, id: InstanceId) -> Option<&Minion> {
        self.board
            .iter()
            .chain(self.hand.iter())
            .chain(self.recruits.iter().flatten())
            .find(|m| m.id == id)
    }

    fn find_mut(&mut self, id: InstanceId) -> Option<&mut Minion> {
        self.board
            .iter_mut()
            .chain(self.hand.iter_mut())
            .chain(self.recruits.iter_mut().flatten())
            .find(|m| m.id == id)
    }
}
