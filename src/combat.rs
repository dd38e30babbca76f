//! Stochastic board-vs-board combat.
//!
//! A [`CombatResolver`] replays the auto-attack sequence many times, each playout on its own
//! `ChaCha20Rng` stream derived from the caller's seed and the playout index, and
//! aggregates the outcomes into a [`CombatPhaseResult`]. Playouts are independent, so they
//! can be spread over threads without changing the result.

use std::cmp::Ordering;
use std::thread;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;
use crate::cards::{Abilities, Ability, CardId, CardTemplate, Catalogue, Effect, MinionType, MinionTypes, Target, Trigger};
use crate::config::CombatConfig;
use crate::minion::Minion;
use crate::tavern::TavernBoard;

/// Most minions a side can hold during combat.
pub const BOARD_CAPACITY: usize = 7;

/// Nesting limit when compiling summons that summon.
const SUMMON_DEPTH: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Friendly,
    Enemy,
}

impl Side {
    fn index(self) -> usize {
        match self {
            Side::Friendly => 0,
            Side::Enemy => 1,
        }
    }

    pub fn opponent(self) -> Side {
        match self {
            Side::Friendly => Side::Enemy,
            Side::Enemy => Side::Friendly,
        }
    }
}

/// A combat-time effect compiled from a card handler.
#[derive(Debug, Clone, PartialEq)]
pub enum CombatEffect {
    Summon { minion: Box<CombatMinion>, count: u8 },
    Buff { target: Target, attack: i32, health: i32, abilities: Abilities },
    Damage { target: Target, amount: i32, times: u8 },
    DamagePerType { target: Target, per: MinionType, times: u8 },
}

impl CombatEffect {
    /// Tavern-only effects have no combat counterpart and compile to `None`.
    fn compile(effect: &Effect, catalogue: &Catalogue, depth: u8) -> Option<Self> {
        match effect {
            Effect::Summon { card, golden, count } => {
                if depth >= SUMMON_DEPTH {
                    return None;
                }
                let template = &catalogue[catalogue.find(card, *golden)?];
                let minion = CombatMinion::build(
                    template,
                    template.attack,
                    template.health,
                    template.abilities,
                    catalogue,
                    depth + 1,
                );
                Some(CombatEffect::Summon { minion: Box::new(minion), count: *count })
            }
            Effect::Buff { target, attack, health, abilities } => Some(CombatEffect::Buff {
                target: *target,
                attack: *attack,
                health: *health,
                abilities: *abilities,
            }),
            Effect::Damage { target, amount, times } => {
                Some(CombatEffect::Damage { target: *target, amount: *amount, times: *times })
            }
            Effect::DamagePerType { target, per, times } => {
                Some(CombatEffect::DamagePerType { target: *target, per: *per, times: *times })
            }
            _ => None,
        }
    }
}

/// A minion as it enters combat: resolved stats plus the effects it can fire there.
#[derive(Debug, Clone, PartialEq)]
pub struct CombatMinion {
    pub card: Option<CardId>,
    pub attack: i32,
    pub health: i32,
    /// Attack a reborn copy comes back with.
    pub base_attack: i32,
    pub tier: u8,
    pub types: MinionTypes,
    pub abilities: Abilities,
    /// The card's own abilities, before any buff. A reborn copy gets these minus Reborn.
    pub base_abilities: Abilities,
    pub golden: bool,
    /// Multiplies the summons of every friendly minion while this one lives.
    pub summon_factor: u8,
    pub start_of_combat: Vec<CombatEffect>,
    pub deathrattle: Vec<CombatEffect>,
}

impl CombatMinion {
    /// A tier 1 neutral minion without effects.
    pub fn vanilla(attack: i32, health: i32) -> Self {
        Self {
            card: None,
            attack,
            health,
            base_attack: attack,
            tier: 1,
            types: MinionTypes::NONE,
            abilities: Abilities::NONE,
            base_abilities: Abilities::NONE,
            golden: false,
            summon_factor: 1,
            start_of_combat: Vec::new(),
            deathrattle: Vec::new(),
        }
    }

    pub fn with(mut self, ability: Ability) -> Self {
        self.abilities.insert(ability);
        self.base_abilities.insert(ability);
        self
    }

    pub fn with_summon_factor(mut self, factor: u8) -> Self {
        self.summon_factor = factor;
        self
    }

    pub fn with_tier(mut self, tier: u8) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_deathrattle(mut self, effect: CombatEffect) -> Self {
        self.deathrattle.push(effect);
        self
    }

    pub fn from_minion(minion: &Minion, catalogue: &Catalogue) -> Self {
        let template = &catalogue[minion.card];
        Self::build(template, minion.attack(), minion.health(), minion.abilities(), catalogue, 0)
    }

    pub fn from_template(template: &CardTemplate, catalogue: &Catalogue) -> Self {
        Self::build(template, template.attack, template.health, template.abilities, catalogue, 0)
    }

    fn build(
        template: &CardTemplate,
        attack: i32,
        health: i32,
        abilities: Abilities,
        catalogue: &Catalogue,
        depth: u8,
    ) -> Self {
        let compile = |trigger: Trigger| -> Vec<CombatEffect> {
            template
                .handlers_for(trigger)
                .filter_map(|handler| CombatEffect::compile(&handler.effect, catalogue, depth))
                .collect()
        };

        Self {
            card: Some(template.id),
            attack,
            health,
            base_attack: template.attack,
            tier: template.tier,
            types: template.types,
            abilities,
            base_abilities: template.abilities,
            golden: template.golden,
            summon_factor: template.summon_factor.max(1),
            start_of_combat: compile(Trigger::CombatStart),
            deathrattle: compile(Trigger::Deathrattle),
        }
    }
}

/// One side of a combat, captured from a board.
#[derive(Debug, Clone, PartialEq)]
pub struct Lineup {
    pub tavern_tier: u8,
    pub hero_health: i32,
    pub minions: Vec<CombatMinion>,
}

impl Lineup {
    pub fn new(tavern_tier: u8, hero_health: i32, minions: Vec<CombatMinion>) -> Self {
        Self { tavern_tier, hero_health, minions }
    }

    pub fn from_board(board: &TavernBoard, catalogue: &Catalogue) -> Self {
        let minions = board
            .board()
            .iter()
            .filter(|m| !m.is_dead())
            .map(|m| CombatMinion::from_minion(m, catalogue))
            .collect();
        Self::new(board.tier(), board.hero_health(), minions)
    }

    pub fn is_empty(&self) -> bool {
        self.minions.is_empty()
    }

    /// Damage this side deals when every one of its minions survives.
    fn full_score(&self) -> i32 {
        self.tavern_tier as i32 + self.minions.iter().map(|m| m.tier as i32).sum::<i32>()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayoutOutcome {
    Win,
    Tie,
    Lose,
}

/// Result of a single playout from the friendly side. `score` is the damage the winner
/// deals, negative when the friendly side lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playout {
    pub outcome: PlayoutOutcome,
    pub score: i32,
}

/// What happened during one playout. Minions are identified by a per-playout uid: the
/// friendly lineup takes `0..n`, the enemy lineup the following ids, and summons count up
/// from there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatEvent {
    StartOfCombat { side: Side, uid: u32 },
    Attack { side: Side, attacker: u32, defender: u32 },
    Damage { side: Side, uid: u32, amount: i32, remaining: i32 },
    ShieldPopped { side: Side, uid: u32 },
    Death { side: Side, uid: u32 },
    Summon { side: Side, uid: u32, card: Option<CardId> },
    Reborn { side: Side, uid: u32 },
    End { outcome: PlayoutOutcome, score: i32 },
}

/// Aggregated combat statistics from the friendly side's perspective.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CombatPhaseResult {
    pub win_probability: f32,
    pub tie_probability: f32,
    pub lose_probability: f32,
    pub mean_score: f32,
    pub median_score: f32,
    pub mean_damage_dealt: f32,
    pub mean_damage_taken: f32,
    /// Share of playouts whose damage would kill the friendly hero.
    pub death_probability: f32,
    pub enemy_death_probability: f32,
    /// Hero health left after the mean damage taken.
    pub expected_hero_health: f32,
    pub expected_enemy_hero_health: f32,
}

impl CombatPhaseResult {
    fn aggregate(playouts: &[Playout], friendly_health: i32, enemy_health: i32) -> Self {
        if playouts.is_empty() {
            return Self {
                tie_probability: 1.0,
                expected_hero_health: friendly_health as f32,
                expected_enemy_hero_health: enemy_health as f32,
                ..Self::default()
            };
        }

        let n = playouts.len() as f32;
        let share = |f: &dyn Fn(&Playout) -> bool| playouts.iter().filter(|p| f(p)).count() as f32 / n;

        let mut scores: Vec<i32> = playouts.iter().map(|p| p.score).collect();
        scores.sort_unstable();
        let mid = scores.len() / 2;
        let median_score = if scores.len() % 2 == 1 {
            scores[mid] as f32
        } else {
            (scores[mid - 1] + scores[mid]) as f32 / 2.0
        };

        let mean_damage_dealt = scores.iter().filter(|s| **s > 0).sum::<i32>() as f32 / n;
        let mean_damage_taken = -(scores.iter().filter(|s| **s < 0).sum::<i32>() as f32) / n;

        Self {
            win_probability: share(&|p| p.outcome == PlayoutOutcome::Win),
            tie_probability: share(&|p| p.outcome == PlayoutOutcome::Tie),
            lose_probability: share(&|p| p.outcome == PlayoutOutcome::Lose),
            mean_score: scores.iter().sum::<i32>() as f32 / n,
            median_score,
            mean_damage_dealt,
            mean_damage_taken,
            death_probability: share(&|p| p.score < 0 && -p.score >= friendly_health),
            enemy_death_probability: share(&|p| p.score > 0 && p.score >= enemy_health),
            expected_hero_health: friendly_health as f32 - mean_damage_taken,
            expected_enemy_hero_health: enemy_health as f32 - mean_damage_dealt,
        }
    }

    /// The same combat seen from the enemy side.
    pub fn invert(&self) -> Self {
        Self {
            win_probability: self.lose_probability,
            tie_probability: self.tie_probability,
            lose_probability: self.win_probability,
            mean_score: -self.mean_score,
            median_score: -self.median_score,
            mean_damage_dealt: self.mean_damage_taken,
            mean_damage_taken: self.mean_damage_dealt,
            death_probability: self.enemy_death_probability,
            enemy_death_probability: self.death_probability,
            expected_hero_health: self.expected_enemy_hero_health,
            expected_enemy_hero_health: self.expected_hero_health,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CombatResolver {
    config: CombatConfig,
}

impl CombatResolver {
    pub fn new(config: CombatConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Estimates the outcome of `friendly` fighting `enemy`. An empty side makes the result
    /// certain and no playouts are run.
    pub fn resolve(&self, friendly: &Lineup, enemy: &Lineup, seed: u64) -> CombatPhaseResult {
        let (fh, eh) = (friendly.hero_health, enemy.hero_health);

        match (friendly.is_empty(), enemy.is_empty()) {
            (true, true) => return CombatPhaseResult::aggregate(&[], fh, eh),
            (false, true) => {
                let certain = Playout { outcome: PlayoutOutcome::Win, score: friendly.full_score() };
                return CombatPhaseResult::aggregate(&[certain], fh, eh);
            }
            (true, false) => {
                let certain = Playout { outcome: PlayoutOutcome::Lose, score: -enemy.full_score() };
                return CombatPhaseResult::aggregate(&[certain], fh, eh);
            }
            (false, false) => {}
        }

        let n = self.config.playouts.max(1) as u64;
        let threads = self.config.threads.max(1) as u64;

        let playouts: Vec<Playout> = if threads == 1 {
            (0..n).map(|i| self.playout(friendly, enemy, seed, i)).collect()
        } else {
            let chunk = n.div_ceil(threads);
            thread::scope(|scope| {
                let handles: Vec<_> = (0..threads)
                    .map(|t| {
                        let range = (t * chunk).min(n)..((t + 1) * chunk).min(n);
                        scope.spawn(move || {
                            range.map(|i| self.playout(friendly, enemy, seed, i)).collect::<Vec<_>>()
                        })
                    })
                    .collect();

                handles
                    .into_iter()
                    .flat_map(|handle| handle.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                    .collect()
            })
        };

        let result = CombatPhaseResult::aggregate(&playouts, fh, eh);
        trace!(playouts = n, win = result.win_probability, mean = result.mean_score, "combat resolved");
        result
    }

    /// Runs playout number `index` of the stream seeded by `seed`.
    pub fn playout(&self, friendly: &Lineup, enemy: &Lineup, seed: u64, index: u64) -> Playout {
        Battle::new(friendly, enemy, Self::stream(seed, index), self.config.attack_cap, false).run().0
    }

    /// Like [`CombatResolver::playout`], also returning the event log.
    pub fn playout_with_log(
        &self,
        friendly: &Lineup,
        enemy: &Lineup,
        seed: u64,
        index: u64,
    ) -> (Playout, Vec<CombatEvent>) {
        Battle::new(friendly, enemy, Self::stream(seed, index), self.config.attack_cap, true).run()
    }

    fn stream(seed: u64, index: u64) -> ChaCha20Rng {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        rng.set_stream(index);
        rng
    }
}

struct Fighter<'a> {
    uid: u32,
    template: &'a CombatMinion,
    attack: i32,
    health: i32,
    abilities: Abilities,
}

impl<'a> Fighter<'a> {
    fn new(uid: u32, template: &'a CombatMinion) -> Self {
        Self { uid, template, attack: template.attack, health: template.health, abilities: template.abilities }
    }

    fn alive(&self) -> bool {
        self.health > 0
    }
}

/// State of one playout.
struct Battle<'a> {
    sides: [Vec<Fighter<'a>>; 2],
    tiers: [u8; 2],
    /// Index of the next minion in line to attack, per side.
    cursor: [usize; 2],
    next_uid: u32,
    rng: ChaCha20Rng,
    attack_cap: u32,
    log: Option<Vec<CombatEvent>>,
}

impl<'a> Battle<'a> {
    fn new(friendly: &'a Lineup, enemy: &'a Lineup, rng: ChaCha20Rng, attack_cap: u32, log: bool) -> Self {
        let mut next_uid = 0;
        let mut deploy = |lineup: &'a Lineup| -> Vec<Fighter<'a>> {
            lineup
                .minions
                .iter()
                .map(|template| {
                    let fighter = Fighter::new(next_uid, template);
                    next_uid += 1;
                    fighter
                })
                .collect()
        };
        let sides = [deploy(friendly), deploy(enemy)];

        Self {
            sides,
            tiers: [friendly.tavern_tier, enemy.tavern_tier],
            cursor: [0, 0],
            next_uid,
            rng,
            attack_cap,
            log: log.then(Vec::new),
        }
    }

    fn run(mut self) -> (Playout, Vec<CombatEvent>) {
        self.start_of_combat();

        let (friendly, enemy) = (self.sides[0].len(), self.sides[1].len());
        let mut active = match friendly.cmp(&enemy) {
            Ordering::Greater => Side::Friendly,
            Ordering::Less => Side::Enemy,
            Ordering::Equal if self.rng.gen_bool(0.5) => Side::Friendly,
            Ordering::Equal => Side::Enemy,
        };

        let mut attacks = 0;
        let mut stalemate = false;
        while !self.sides[0].is_empty() && !self.sides[1].is_empty() {
            if attacks >= self.attack_cap {
                stalemate = true;
                break;
            }

            match self.next_attacker(active) {
                Some(index) => {
                    self.attack_with(active, index);
                    attacks += 1;
                }
                None if self.next_attacker(active.opponent()).is_none() => {
                    stalemate = true;
                    break;
                }
                None => {}
            }
            active = active.opponent();
        }

        let playout = self.outcome(stalemate);
        self.record(CombatEvent::End { outcome: playout.outcome, score: playout.score });
        (playout, self.log.unwrap_or_default())
    }

    fn outcome(&self, stalemate: bool) -> Playout {
        let survivors = |side: usize| -> i32 {
            self.tiers[side] as i32 + self.sides[side].iter().map(|f| f.template.tier as i32).sum::<i32>()
        };

        match (self.sides[0].is_empty(), self.sides[1].is_empty()) {
            _ if stalemate => Playout { outcome: PlayoutOutcome::Tie, score: 0 },
            (false, true) => Playout { outcome: PlayoutOutcome::Win, score: survivors(0) },
            (true, false) => Playout { outcome: PlayoutOutcome::Lose, score: -survivors(1) },
            _ => Playout { outcome: PlayoutOutcome::Tie, score: 0 },
        }
    }

    fn start_of_combat(&mut self) {
        for side in [Side::Friendly, Side::Enemy] {
            let uids: Vec<u32> = self.sides[side.index()]
                .iter()
                .filter(|f| !f.template.start_of_combat.is_empty())
                .map(|f| f.uid)
                .collect();

            for uid in uids {
                let Some(position) = self.position(side, uid) else { continue };
                let template = self.sides[side.index()][position].template;
                self.record(CombatEvent::StartOfCombat { side, uid });
                for effect in &template.start_of_combat {
                    let at = self.position(side, uid).map_or(position, |p| p + 1);
                    self.apply(side, at, Some(uid), effect);
                }
            }
        }
        self.resolve_deaths(Side::Friendly);
    }

    /// The first minion at or after the cursor that can attack, wrapping around.
    fn next_attacker(&self, side: Side) -> Option<usize> {
        let fighters = &self.sides[side.index()];
        let n = fighters.len();
        let start = if self.cursor[side.index()] >= n { 0 } else { self.cursor[side.index()] };
        (0..n).map(|k| (start + k) % n).find(|&i| fighters[i].attack > 0)
    }

    fn attack_with(&mut self, side: Side, index: usize) {
        let fighters = &self.sides[side.index()];
        let uid = fighters[index].uid;
        let next_in_line = fighters.get(index + 1).map(|f| f.uid);
        let swings = if fighters[index].abilities.contains(Ability::Windfury) { 2 } else { 1 };

        for _ in 0..swings {
            let Some(attacker) = self.position(side, uid) else { break };
            if self.sides[side.index()][attacker].attack <= 0 {
                break;
            }
            let Some(defender) = self.pick_defender(side.opponent()) else { break };
            self.strike(side, attacker, defender);
            self.resolve_deaths(side);
        }

        self.cursor[side.index()] = match self.position(side, uid) {
            Some(position) => position + 1,
            None => next_in_line.and_then(|next| self.position(side, next)).unwrap_or(0),
        };
    }

    /// A random Taunt minion if there is one, otherwise any random minion.
    fn pick_defender(&mut self, side: Side) -> Option<usize> {
        let fighters = &self.sides[side.index()];
        let alive: Vec<usize> = (0..fighters.len()).filter(|&i| fighters[i].alive()).collect();
        let taunts: Vec<usize> =
            alive.iter().copied().filter(|&i| fighters[i].abilities.contains(Ability::Taunt)).collect();

        let candidates = if taunts.is_empty() { alive } else { taunts };
        candidates.choose(&mut self.rng).copied()
    }

    /// The attacker's hit lands first; a defender that survives it strikes back.
    fn strike(&mut self, side: Side, attacker: usize, defender: usize) {
        let target = side.opponent();
        let a = &self.sides[side.index()][attacker];
        let (a_uid, a_attack, a_poison) = (a.uid, a.attack, a.abilities.contains(Ability::Poisonous));
        let d = &self.sides[target.index()][defender];
        let (d_uid, d_attack, d_poison) = (d.uid, d.attack, d.abilities.contains(Ability::Poisonous));

        self.record(CombatEvent::Attack { side, attacker: a_uid, defender: d_uid });
        self.hit(target, defender, a_attack, a_poison);
        if self.sides[target.index()][defender].alive() {
            self.hit(side, attacker, d_attack, d_poison);
        }
    }

    /// Deals damage to one minion. A Divine Shield absorbs the hit; Poisonous kills on any
    /// damage that gets through.
    fn hit(&mut self, side: Side, index: usize, amount: i32, poisonous: bool) {
        if amount <= 0 {
            return;
        }

        let fighter = &mut self.sides[side.index()][index];
        let uid = fighter.uid;
        if fighter.abilities.contains(Ability::DivineShield) {
            fighter.abilities.remove(Ability::DivineShield);
            self.record(CombatEvent::ShieldPopped { side, uid });
            return;
        }

        fighter.health -= amount;
        if poisonous {
            fighter.health = fighter.health.min(0);
        }
        let remaining = fighter.health;
        self.record(CombatEvent::Damage { side, uid, amount, remaining });
    }

    /// Removes dead minions side by side, firing deathrattles at their slots and bringing
    /// back reborn minions, until nothing else dies.
    fn resolve_deaths(&mut self, first: Side) {
        loop {
            let mut any = false;
            for side in [first, first.opponent()] {
                while let Some(index) = self.sides[side.index()].iter().position(|f| !f.alive()) {
                    let fighter = self.sides[side.index()].remove(index);
                    any = true;
                    self.record(CombatEvent::Death { side, uid: fighter.uid });

                    let template = fighter.template;
                    let mut at = index;
                    for effect in &template.deathrattle {
                        at = self.apply(side, at, None, effect);
                    }

                    if fighter.abilities.contains(Ability::Reborn)
                        && self.sides[side.index()].len() < BOARD_CAPACITY
                    {
                        let uid = self.alloc_uid();
                        let mut reborn = Fighter::new(uid, template);
                        reborn.attack = template.base_attack;
                        reborn.health = 1;
                        reborn.abilities = template.base_abilities;
                        reborn.abilities.remove(Ability::Reborn);
                        let at = index.min(self.sides[side.index()].len());
                        self.sides[side.index()].insert(at, reborn);
                        self.record(CombatEvent::Reborn { side, uid });
                    }
                }
            }
            if !any {
                return;
            }
        }
    }

    /// Applies an effect owned by a minion of `side`. Summons are inserted from `position`
    /// onwards; returns where the next summon should go.
    fn apply(&mut self, side: Side, position: usize, this: Option<u32>, effect: &'a CombatEffect) -> usize {
        match effect {
            CombatEffect::Summon { minion, count } => {
                let mut at = position.min(self.sides[side.index()].len());
                let factor: u32 = self.sides[side.index()]
                    .iter()
                    .filter(|f| f.alive())
                    .map(|f| f.template.summon_factor.max(1) as u32)
                    .product();
                for _ in 0..*count as u32 * factor {
                    if self.sides[side.index()].len() >= BOARD_CAPACITY {
                        break;
                    }
                    let uid = self.alloc_uid();
                    self.sides[side.index()].insert(at, Fighter::new(uid, minion));
                    self.record(CombatEvent::Summon { side, uid, card: minion.card });
                    at += 1;
                }
                at
            }
            CombatEffect::Buff { target, attack, health, abilities } => {
                for (s, i) in self.targets(side, this, *target) {
                    let fighter = &mut self.sides[s.index()][i];
                    fighter.attack += attack;
                    fighter.health += health;
                    fighter.abilities |= *abilities;
                }
                position
            }
            CombatEffect::Damage { target, amount, times } => {
                for _ in 0..*times {
                    for (s, i) in self.targets(side, this, *target) {
                        self.hit(s, i, *amount, false);
                    }
                }
                position
            }
            CombatEffect::DamagePerType { target, per, times } => {
                let amount = self.sides[side.index()]
                    .iter()
                    .filter(|f| f.alive() && f.template.types.contains(*per))
                    .count() as i32;
                for _ in 0..*times {
                    for (s, i) in self.targets(side, this, *target) {
                        self.hit(s, i, amount, false);
                    }
                }
                position
            }
        }
    }

    fn targets(&mut self, side: Side, this: Option<u32>, target: Target) -> Vec<(Side, usize)> {
        let living = |battle: &Self, side: Side, filter: Option<MinionType>, exclude: Option<u32>| -> Vec<usize> {
            let fighters = &battle.sides[side.index()];
            (0..fighters.len())
                .filter(|&i| fighters[i].alive() && fighters[i].template.types.matches(filter))
                .filter(|&i| exclude != Some(fighters[i].uid))
                .collect()
        };

        let picked: Vec<(Side, usize)> = match target {
            Target::This => this
                .and_then(|uid| self.position(side, uid))
                .filter(|&i| self.sides[side.index()][i].alive())
                .map(|i| (side, i))
                .into_iter()
                .collect(),
            Target::RandomFriendly { filter, count, exclude_self } => {
                let candidates = living(self, side, filter, this.filter(|_| exclude_self));
                candidates
                    .choose_multiple(&mut self.rng, count as usize)
                    .map(|&i| (side, i))
                    .collect()
            }
            Target::AllFriendly { filter, exclude_self } => {
                living(self, side, filter, this.filter(|_| exclude_self))
                    .into_iter()
                    .map(|i| (side, i))
                    .collect()
            }
            Target::RandomEnemy => {
                let enemy = side.opponent();
                let candidates = living(self, enemy, None, None);
                candidates.choose(&mut self.rng).map(|&i| (enemy, i)).into_iter().collect()
            }
            Target::Adjacent => match this.and_then(|uid| self.position(side, uid)) {
                Some(p) => [p.checked_sub(1), Some(p + 1)]
                    .into_iter()
                    .flatten()
                    .filter(|&i| self.sides[side.index()].get(i).is_some_and(Fighter::alive))
                    .map(|i| (side, i))
                    .collect(),
                None => Vec::new(),
            },
            Target::Leftmost => living(self, side, None, None).first().map(|&i| (side, i)).into_iter().collect(),
            Target::DistinctTypes { count } => {
                let mut groups: Vec<(MinionTypes, Vec<usize>)> = Vec::new();
                for i in living(self, side, None, this) {
                    let types = self.sides[side.index()][i].template.types;
                    match groups.iter_mut().find(|(t, _)| *t == types) {
                        Some((_, members)) => members.push(i),
                        None => groups.push((types, vec![i])),
                    }
                }
                let picked: Vec<_> = groups.choose_multiple(&mut self.rng, count as usize).collect();
                picked.into_iter().filter_map(|(_, members)| members.choose(&mut self.rng)).map(|&i| (side, i)).collect()
            }
            Target::Subject | Target::Recruits => Vec::new(),
        };
        picked
    }

    fn position(&self, side: Side, uid: u32) -> Option<usize> {
        self.sides[side.index()].iter().position(|f| f.uid == uid)
    }

    fn alloc_uid(&mut self) -> u32 {
        let uid = self.next_uid;
        self.next_uid += 1;
        uid
    }

    fn record(&mut self, event: CombatEvent) {
        if let Some(log) = &mut self.log {
            log.push(event);
        }
    }
}
