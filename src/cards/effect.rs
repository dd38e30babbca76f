//! Typed effect scripts attached to card templates.
//!
//! A card never carries code of its own. It registers [`Handler`]s, each pairing a
//! [`Trigger`] with an optional [`Condition`] on the event subject and an [`Effect`]. The
//! tavern engine and the combat resolver interpret these scripts.

use serde::{Deserialize, Serialize};
use super::{Abilities, Keyword, MinionType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trigger {
    /// Battlecry: this minion was played from the hand.
    Played,
    /// Any friendly minion was played from the hand.
    AnyPlayed,
    /// This minion entered the board.
    Summoned,
    /// Any friendly minion entered the board.
    AnySummoned,
    /// This minion is being sold.
    Sold,
    TurnStart,
    TurnEnd,
    CombatStart,
    Deathrattle,
}

/// Which minions are consulted when a trigger is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Only the minion the event is about.
    Source,
    /// Every minion on the board, left to right.
    Board,
}

impl Trigger {
    pub fn scope(self) -> Scope {
        match self {
            Trigger::Played | Trigger::Summoned | Trigger::Sold | Trigger::Deathrattle => {
                Scope::Source
            }
            Trigger::AnyPlayed
            | Trigger::AnySummoned
            | Trigger::TurnStart
            | Trigger::TurnEnd
            | Trigger::CombatStart => Scope::Board,
        }
    }

    pub fn keyword(self) -> Option<Keyword> {
        match self {
            Trigger::Played => Some(Keyword::Battlecry),
            Trigger::Deathrattle => Some(Keyword::Deathrattle),
            Trigger::CombatStart => Some(Keyword::StartOfCombat),
            _ => None,
        }
    }
}

/// A filter on the subject of an event (the minion played or summoned).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Condition {
    pub subject_type: Option<MinionType>,
    pub subject_keyword: Option<Keyword>,
    /// Skip the event when the handler's own minion is the subject.
    pub exclude_self: bool,
    /// Only fire when the board won its most recent combat.
    pub after_win: bool,
}

impl Condition {
    pub fn subject(minion_type: MinionType) -> Self {
        Self { subject_type: Some(minion_type), ..Self::default() }
    }

    pub fn keyword(keyword: Keyword) -> Self {
        Self { subject_keyword: Some(keyword), ..Self::default() }
    }

    pub fn other(mut self) -> Self {
        self.exclude_self = true;
        self
    }

    pub fn after_win() -> Self {
        Self { after_win: true, ..Self::default() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    This,
    /// The minion the event is about.
    Subject,
    RandomFriendly {
        filter: Option<MinionType>,
        count: u8,
        exclude_self: bool,
    },
    AllFriendly {
        filter: Option<MinionType>,
        exclude_self: bool,
    },
    RandomEnemy,
    /// Every minion currently offered for purchase.
    Recruits,
    /// The minions directly left and right of this one.
    Adjacent,
    Leftmost,
    /// Up to `count` other friendly minions, each with a different set of types.
    DistinctTypes {
        count: u8,
    },
}

impl Target {
    pub fn random_friendly(filter: Option<MinionType>) -> Self {
        Target::RandomFriendly { filter, count: 1, exclude_self: true }
    }

    pub fn other_friendly(filter: Option<MinionType>) -> Self {
        Target::AllFriendly { filter, exclude_self: true }
    }
}

/// A count read off the board when an effect resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tally {
    BoughtThisTurn(Option<MinionType>),
    PlayedThisTurn(Option<MinionType>),
    GoldenOnBoard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Effect {
    Buff {
        target: Target,
        attack: i32,
        health: i32,
        #[serde(default)]
        abilities: Abilities,
    },
    /// A buff applied `tally + base` times over.
    BuffPerTally {
        target: Target,
        attack: i32,
        health: i32,
        tally: Tally,
        #[serde(default)]
        base: u8,
    },
    /// Remove another random friendly minion and take `factor` times its stats, plus gold.
    Devour {
        filter: Option<MinionType>,
        gold: u8,
        factor: u8,
    },
    Damage {
        target: Target,
        amount: i32,
        times: u8,
    },
    /// Deal damage equal to the number of friendly minions of a type.
    DamagePerType {
        target: Target,
        per: MinionType,
        times: u8,
    },
    Summon {
        card: String,
        golden: bool,
        count: u8,
    },
    AddToHand {
        card: String,
        golden: bool,
        count: u8,
    },
    DamageHero {
        amount: i32,
    },
    GainGold {
        amount: u8,
    },
    DiscountUpgrade {
        amount: u8,
        uses: u8,
    },
    SetRefreshCost {
        cost: u8,
        uses: u8,
    },
}

impl Effect {
    pub fn buff(target: Target, attack: i32, health: i32) -> Self {
        Effect::Buff { target, attack, health, abilities: Abilities::NONE }
    }

    pub fn summon(card: &str) -> Self {
        Effect::Summon { card: card.to_string(), golden: false, count: 1 }
    }

    /// The golden version of this effect. Stat changes and repeat counts scale by `factor`;
    /// summoned tokens become golden. Hero damage does not scale.
    pub fn scaled(&self, factor: u8) -> Effect {
        let f = factor as i32;
        match self.clone() {
            Effect::Buff { target, attack, health, abilities } if attack == 0 && health == 0 => {
                let target = match target {
                    Target::RandomFriendly { filter, count, exclude_self } => {
                        Target::RandomFriendly { filter, count: count.saturating_mul(factor), exclude_self }
                    }
                    other => other,
                };
                Effect::Buff { target, attack, health, abilities }
            }
            Effect::Buff { target, attack, health, abilities } => {
                Effect::Buff { target, attack: attack.saturating_mul(f), health: health.saturating_mul(f), abilities }
            }
            Effect::BuffPerTally { target, attack, health, tally, base } => Effect::BuffPerTally {
                target,
                attack: attack.saturating_mul(f),
                health: health.saturating_mul(f),
                tally,
                base,
            },
            Effect::Devour { filter, gold, factor: n } => Effect::Devour {
                filter,
                gold: gold.saturating_mul(factor),
                factor: n.saturating_mul(factor),
            },
            Effect::Damage { target, amount, times } => {
                Effect::Damage { target, amount, times: times.saturating_mul(factor) }
            }
            Effect::DamagePerType { target, per, times } => {
                Effect::DamagePerType { target, per, times: times.saturating_mul(factor) }
            }
            Effect::Summon { card, count, .. } => Effect::Summon { card, golden: true, count },
            Effect::AddToHand { card, golden, count } => {
                Effect::AddToHand { card, golden, count: count.saturating_mul(factor) }
            }
            Effect::DamageHero { amount } => Effect::DamageHero { amount },
            Effect::GainGold { amount } => Effect::GainGold { amount: amount.saturating_mul(factor) },
            Effect::DiscountUpgrade { amount, uses } => {
                Effect::DiscountUpgrade { amount: amount.saturating_mul(factor), uses }
            }
            Effect::SetRefreshCost { cost, uses } => {
                Effect::SetRefreshCost { cost, uses: uses.saturating_mul(factor) }
            }
        }
    }

    /// Name of the card this effect creates, if any.
    pub fn referenced_card(&self) -> Option<(&str, bool)> {
        match self {
            Effect::Summon { card, golden, .. } | Effect::AddToHand { card, golden, .. } => {
                Some((card.as_str(), *golden))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handler {
    pub trigger: Trigger,
    #[serde(default)]
    pub condition: Condition,
    pub effect: Effect,
}

impl Handler {
    pub fn new(trigger: Trigger, effect: Effect) -> Self {
        Self { trigger, condition: Condition::default(), effect }
    }

    pub fn when(trigger: Trigger, condition: Condition, effect: Effect) -> Self {
        Self { trigger, condition, effect }
    }

    pub fn scaled(&self, factor: u8) -> Self {
        Self { trigger: self.trigger, condition: self.condition, effect: self.effect.scaled(factor) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuraScope {
    OtherFriendly,
    Adjacent,
}

/// A continuous buff recomputed from board composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aura {
    pub attack: i32,
    pub health: i32,
    #[serde(default)]
    pub abilities: Abilities,
    pub filter: Option<MinionType>,
    pub scope: AuraScope,
}

impl Aura {
    pub fn scaled(&self, factor: u8) -> Self {
        let f = factor as i32;
        Self { attack: self.attack.saturating_mul(f), health: self.health.saturating_mul(f), ..*self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn golden_scaling() {
        let buff = Effect::buff(Target::This, 2, 2).scaled(2);
        assert_eq!(buff, Effect::buff(Target::This, 4, 4));

        let summon = Effect::summon("Tabbycat").scaled(2);
        assert_eq!(summon, Effect::Summon { card: "Tabbycat".into(), golden: true, count: 1 });

        let hero = Effect::DamageHero { amount: 2 }.scaled(2);
        assert_eq!(hero, Effect::DamageHero { amount: 2 });
    }

    #[test]
    fn shield_grant_scales_target_count() {
        let grant = Effect::Buff {
            target: Target::random_friendly(None),
            attack: 0,
            health: 0,
            abilities: super::super::Ability::DivineShield.into(),
        };
        match grant.scaled(2) {
            Effect::Buff { target: Target::RandomFriendly { count, .. }, .. } => {
                assert_eq!(count, 2)
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn scaling_saturates_instead_of_overflowing() {
        let damage = Effect::Damage { target: Target::RandomEnemy, amount: 1, times: 200 }.scaled(2);
        assert_eq!(damage, Effect::Damage { target: Target::RandomEnemy, amount: 1, times: u8::MAX });

        let gold = Effect::GainGold { amount: 150 }.scaled(2);
        assert_eq!(gold, Effect::GainGold { amount: u8::MAX });

        let buff = Effect::buff(Target::This, i32::MAX, 1).scaled(2);
        assert_eq!(buff, Effect::buff(Target::This, i32::MAX, 2));
    }

    #[test]
    fn devour_doubles_gold_and_stat_share() {
        let devour = Effect::Devour { filter: Some(MinionType::Demon), gold: 3, factor: 1 }.scaled(2);
        assert_eq!(devour, Effect::Devour { filter: Some(MinionType::Demon), gold: 6, factor: 2 });
    }

    #[test]
    fn effects_round_trip_through_json() {
        let handler = Handler::when(
            Trigger::AnySummoned,
            Condition::subject(MinionType::Murloc).other(),
            Effect::buff(Target::This, 1, 0),
        );
        let json = serde_json::to_string(&handler).unwrap();
        let back: Handler = serde_json::from_str(&json).unwrap();
        assert_eq!(back, handler);
    }
}
