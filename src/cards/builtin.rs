//! The built-in card list. Golden variants are derived by the catalogue loader.

use super::effect::{Aura, AuraScope, Condition, Effect, Tally, Target, Trigger};
use super::{Ability, CardRecord, Keyword, MinionType, MinionTypes, Rarity, MAX_TIER};

use MinionType::*;

const NEUTRAL: MinionTypes = MinionTypes::NONE;

pub fn records() -> Vec<CardRecord> {
    let mut records = tier_one();
    records.extend(tier_two());
    records.extend(tier_three());
    records.extend(tier_four());
    records.extend(tier_five_and_six());
    records
}

fn tier_one() -> Vec<CardRecord> {
    vec![
        CardRecord::minion("Tabbycat", 1, Beast, 1, 1).cost(1).token(),
        CardRecord::minion("Alleycat", 1, Beast, 1, 1)
            .cost(1)
            .on(Trigger::Played, Effect::summon("Tabbycat")),
        CardRecord::minion("Scavenging Hyena", 1, Beast, 2, 2).cost(2),
        CardRecord::minion("Vulgar Homunculus", 1, Demon, 2, 4)
            .cost(2)
            .abilities(Ability::Taunt)
            .on(Trigger::Played, Effect::DamageHero { amount: 2 }),
        CardRecord::minion("Wrath Weaver", 1, NEUTRAL, 1, 3)
            .cost(1)
            .on_if(Trigger::AnyPlayed, Condition::subject(Demon), Effect::buff(Target::This, 2, 2))
            .on_if(Trigger::AnyPlayed, Condition::subject(Demon), Effect::DamageHero { amount: 1 }),
        CardRecord::minion("Dragonspawn Lieutenant", 1, Dragon, 2, 3)
            .cost(2)
            .abilities(Ability::Taunt),
        CardRecord::minion("Red Whelp", 1, Dragon, 1, 2).cost(1).on(
            Trigger::CombatStart,
            Effect::DamagePerType { target: Target::RandomEnemy, per: Dragon, times: 1 },
        ),
        CardRecord::minion("Refreshing Anomaly", 1, Elemental, 1, 3)
            .cost(1)
            .on(Trigger::Played, Effect::SetRefreshCost { cost: 0, uses: 1 }),
        CardRecord::minion("Water Droplet", 1, Elemental, 2, 2).token(),
        CardRecord::minion("Sellemental", 1, Elemental, 2, 2).on(
            Trigger::Sold,
            Effect::AddToHand { card: "Water Droplet".into(), golden: false, count: 1 },
        ),
        CardRecord::minion("Micro Machine", 1, Mech, 1, 2)
            .cost(2)
            .on(Trigger::TurnStart, Effect::buff(Target::This, 1, 0)),
        CardRecord::minion("Micro Mummy", 1, Mech, 1, 2)
            .cost(2)
            .rarity(Rarity::Epic)
            .abilities(Ability::Reborn)
            .on(Trigger::TurnEnd, Effect::buff(Target::random_friendly(None), 1, 0)),
        CardRecord::minion("Murloc Tidecaller", 1, Murloc, 1, 2)
            .cost(1)
            .rarity(Rarity::Rare)
            .on_if(
                Trigger::AnySummoned,
                Condition::subject(Murloc).other(),
                Effect::buff(Target::This, 1, 0),
            ),
        CardRecord::minion("Murloc Scout", 1, Murloc, 1, 1).cost(1).token(),
        CardRecord::minion("Murloc Tidehunter", 1, Murloc, 2, 1)
            .cost(2)
            .on(Trigger::Played, Effect::summon("Murloc Scout")),
        CardRecord::minion("Rockpool Hunter", 1, Murloc, 2, 3)
            .cost(2)
            .on(Trigger::Played, Effect::buff(Target::random_friendly(Some(Murloc)), 1, 1)),
        CardRecord::minion("Deck Swabbie", 1, Pirate, 2, 2)
            .cost(3)
            .on(Trigger::Played, Effect::DiscountUpgrade { amount: 1, uses: 1 }),
        CardRecord::minion("Sky Pirate", 1, Pirate, 1, 1).cost(1).token(),
        CardRecord::minion("Scallywag", 1, Pirate, 2, 1)
            .cost(1)
            .on(Trigger::Deathrattle, Effect::summon("Sky Pirate")),
        CardRecord::minion("Acolyte of C'Thun", 1, NEUTRAL, 2, 2)
            .cost(2)
            .abilities(Ability::Taunt | Ability::Reborn),
        CardRecord::minion("Selfless Hero", 1, NEUTRAL, 2, 1)
            .cost(1)
            .rarity(Rarity::Rare)
            .on(
                Trigger::Deathrattle,
                Effect::Buff {
                    target: Target::random_friendly(None),
                    attack: 0,
                    health: 0,
                    abilities: Ability::DivineShield.into(),
                },
            ),
        CardRecord::minion("Big Bad Wolf", 1, Beast, 3, 2).cost(2).token(),
    ]
}

fn tier_two() -> Vec<CardRecord> {
    vec![
        CardRecord::minion("Kindly Grandmother", 2, Beast, 1, 1)
            .cost(2)
            .on(Trigger::Deathrattle, Effect::summon("Big Bad Wolf")),
        CardRecord::minion("Pack Leader", 2, Beast, 2, 3)
            .cost(2)
            .rarity(Rarity::Rare)
            .on_if(
                Trigger::AnySummoned,
                Condition::subject(Beast).other(),
                Effect::buff(Target::Subject, 2, 0),
            ),
        CardRecord::minion("Rabid Saurolisk", 2, Beast, 3, 2).on_if(
            Trigger::AnyPlayed,
            Condition::keyword(Keyword::Deathrattle).other(),
            Effect::buff(Target::This, 1, 2),
        ),
        CardRecord::minion("Imp", 1, Demon, 1, 1).cost(1).token(),
        CardRecord::minion("Imprisoner", 2, Demon, 3, 3)
            .abilities(Ability::Taunt)
            .on(Trigger::Deathrattle, Effect::summon("Imp")),
        CardRecord::minion("Nathrezim Overseer", 2, Demon, 2, 3)
            .rarity(Rarity::Rare)
            .on(Trigger::Played, Effect::buff(Target::random_friendly(Some(Demon)), 2, 2)),
        CardRecord::minion("Steward of Time", 2, Dragon, 3, 4)
            .cost(4)
            .on(Trigger::Sold, Effect::buff(Target::Recruits, 1, 1)),
        CardRecord::minion("Molten Rock", 2, Elemental, 2, 4)
            .abilities(Ability::Taunt)
            .on_if(
                Trigger::AnyPlayed,
                Condition::subject(Elemental).other(),
                Effect::buff(Target::This, 0, 1),
            ),
        CardRecord::minion("Party Elemental", 2, Elemental, 3, 2)
            .cost(4)
            .on_if(
                Trigger::AnyPlayed,
                Condition::subject(Elemental).other(),
                Effect::buff(Target::random_friendly(Some(Elemental)), 1, 1),
            ),
        CardRecord::minion("Damaged Golem", 1, Mech, 2, 1).cost(1).token(),
        CardRecord::minion("Harvest Golem", 2, Mech, 2, 3)
            .on(Trigger::Deathrattle, Effect::summon("Damaged Golem")),
        CardRecord::minion("Kaboom Bot", 2, Mech, 2, 2).on(
            Trigger::Deathrattle,
            Effect::Damage { target: Target::RandomEnemy, amount: 4, times: 1 },
        ),
        CardRecord::minion("Metaltooth Leaper", 2, Mech, 3, 3)
            .on(Trigger::Played, Effect::buff(Target::other_friendly(Some(Mech)), 2, 0)),
        CardRecord::minion("Annoy-o-Tron", 2, Mech, 1, 2)
            .cost(2)
            .abilities(Ability::Taunt | Ability::DivineShield),
        CardRecord::minion("Murloc Warleader", 2, Murloc, 3, 3).aura(Aura {
            attack: 2,
            health: 0,
            abilities: Default::default(),
            filter: Some(Murloc),
            scope: AuraScope::OtherFriendly,
        }),
        CardRecord::minion("Southsea Captain", 2, Pirate, 3, 3)
            .rarity(Rarity::Epic)
            .aura(Aura {
                attack: 1,
                health: 1,
                abilities: Default::default(),
                filter: Some(Pirate),
                scope: AuraScope::OtherFriendly,
            }),
        CardRecord::minion("Freedealing Gambler", 2, Pirate, 3, 3)
            .on(Trigger::Sold, Effect::GainGold { amount: 2 }),
        CardRecord::minion("Yo-Ho-Ogre", 2, Pirate, 2, 6)
            .cost(6)
            .abilities(Ability::Taunt),
        CardRecord::minion("Menagerie Mug", 2, NEUTRAL, 2, 2)
            .on(Trigger::Played, Effect::buff(Target::DistinctTypes { count: 3 }, 1, 1)),
    ]
}

fn tier_three() -> Vec<CardRecord> {
    vec![
        CardRecord::minion("Houndmaster", 3, NEUTRAL, 4, 3).cost(4).on(
            Trigger::Played,
            Effect::Buff {
                target: Target::random_friendly(Some(Beast)),
                attack: 2,
                health: 2,
                abilities: Ability::Taunt.into(),
            },
        ),
        CardRecord::minion("Dire Wolf Alpha", 3, Beast, 2, 2).cost(2).aura(Aura {
            attack: 1,
            health: 0,
            abilities: Default::default(),
            filter: None,
            scope: AuraScope::Adjacent,
        }),
        CardRecord::minion("Crystalweaver", 3, NEUTRAL, 5, 4)
            .cost(4)
            .on(Trigger::Played, Effect::buff(Target::other_friendly(Some(Demon)), 1, 1)),
        CardRecord::minion("Soul Devourer", 3, Demon, 3, 3)
            .cost(4)
            .on(Trigger::Played, Effect::Devour { filter: Some(Demon), gold: 3, factor: 1 }),
        CardRecord::minion("Bronze Warden", 3, Dragon, 2, 1)
            .cost(4)
            .abilities(Ability::DivineShield | Ability::Reborn),
        CardRecord::minion("Hangry Dragon", 3, Dragon, 4, 4)
            .cost(5)
            .on_if(Trigger::TurnStart, Condition::after_win(), Effect::buff(Target::This, 2, 2)),
        CardRecord::minion("Twilight Emissary", 3, Dragon, 4, 4)
            .cost(6)
            .abilities(Ability::Taunt)
            .on(Trigger::Played, Effect::buff(Target::random_friendly(Some(Dragon)), 2, 2)),
        CardRecord::minion("Crackling Cyclone", 3, Elemental, 4, 1)
            .cost(4)
            .abilities(Ability::DivineShield | Ability::Windfury),
        CardRecord::minion("Arcane Assistant", 3, Elemental, 3, 3)
            .on(Trigger::Played, Effect::buff(Target::other_friendly(Some(Elemental)), 1, 1)),
        CardRecord::minion("Iron Sensei", 3, Mech, 2, 2)
            .rarity(Rarity::Rare)
            .on(Trigger::TurnEnd, Effect::buff(Target::random_friendly(Some(Mech)), 2, 2)),
        CardRecord::minion("Screwjank Clunker", 3, Mech, 2, 5)
            .cost(4)
            .on(Trigger::Played, Effect::buff(Target::random_friendly(Some(Mech)), 2, 2)),
        CardRecord::minion("Coldlight Seer", 3, Murloc, 2, 3)
            .rarity(Rarity::Rare)
            .on(Trigger::Played, Effect::buff(Target::other_friendly(Some(Murloc)), 0, 2)),
        CardRecord::minion("Felfin Navigator", 3, Murloc, 4, 4)
            .on(Trigger::Played, Effect::buff(Target::other_friendly(Some(Murloc)), 1, 1)),
        CardRecord::minion("Bloodsail Cannoneer", 3, Pirate, 4, 3)
            .on(Trigger::Played, Effect::buff(Target::other_friendly(Some(Pirate)), 3, 0)),
        CardRecord::minion("Salty Looter", 3, Pirate, 4, 4).on_if(
            Trigger::AnyPlayed,
            Condition::subject(Pirate).other(),
            Effect::buff(Target::This, 1, 1),
        ),
        CardRecord::minion("Southsea Strongarm", 3, Pirate, 4, 3).cost(5).on(
            Trigger::Played,
            Effect::BuffPerTally {
                target: Target::random_friendly(Some(Pirate)),
                attack: 1,
                health: 1,
                tally: Tally::BoughtThisTurn(Some(Pirate)),
                base: 0,
            },
        ),
        CardRecord::minion("Khadgar", 3, NEUTRAL, 2, 2)
            .cost(2)
            .rarity(Rarity::Legendary)
            .summon_factor(2),
    ]
}

fn tier_four() -> Vec<CardRecord> {
    vec![
        CardRecord::minion("Virmen Sensei", 4, NEUTRAL, 4, 5)
            .rarity(Rarity::Rare)
            .on(Trigger::Played, Effect::buff(Target::random_friendly(Some(Beast)), 2, 2)),
        CardRecord::minion("Hyena", 1, Beast, 2, 2).token(),
        CardRecord::minion("Savannah Highmane", 4, Beast, 6, 5)
            .cost(6)
            .rarity(Rarity::Rare)
            .on(
                Trigger::Deathrattle,
                Effect::Summon { card: "Hyena".into(), golden: false, count: 2 },
            ),
        CardRecord::minion("Siegebreaker", 4, Demon, 5, 8)
            .cost(7)
            .rarity(Rarity::Rare)
            .abilities(Ability::Taunt)
            .aura(Aura {
                attack: 1,
                health: 0,
                abilities: Default::default(),
                filter: Some(Demon),
                scope: AuraScope::OtherFriendly,
            }),
        CardRecord::minion("Cobalt Scalebane", 4, Dragon, 5, 5)
            .cost(5)
            .on(Trigger::TurnEnd, Effect::buff(Target::random_friendly(None), 3, 0)),
        CardRecord::minion("Majordomo Executus", 4, Dragon, 6, 3)
            .cost(6)
            .rarity(Rarity::Legendary)
            .on(
                Trigger::TurnEnd,
                Effect::BuffPerTally {
                    target: Target::Leftmost,
                    attack: 1,
                    health: 1,
                    tally: Tally::PlayedThisTurn(Some(Elemental)),
                    base: 1,
                },
            ),
        CardRecord::minion("Deadly Spore", 4, NEUTRAL, 1, 1)
            .abilities(Ability::Poisonous),
        CardRecord::minion("Robosaur", 1, Mech, 8, 8).cost(8).token(),
        CardRecord::minion("Mechano-Egg", 4, Mech, 0, 5)
            .cost(5)
            .on(Trigger::Deathrattle, Effect::summon("Robosaur")),
        CardRecord::minion("Annoy-o-Module", 4, Mech, 2, 4)
            .cost(4)
            .rarity(Rarity::Rare)
            .abilities(Ability::Taunt | Ability::DivineShield)
            .keywords(Keyword::Magnetic),
        CardRecord::minion("Toxfin", 4, Murloc, 1, 2).cost(1).on(
            Trigger::Played,
            Effect::Buff {
                target: Target::random_friendly(Some(Murloc)),
                attack: 0,
                health: 0,
                abilities: Ability::Poisonous.into(),
            },
        ),
        CardRecord::minion("Goldgrubber", 4, Pirate, 2, 2).cost(5).on(
            Trigger::TurnEnd,
            Effect::BuffPerTally {
                target: Target::This,
                attack: 2,
                health: 2,
                tally: Tally::GoldenOnBoard,
                base: 0,
            },
        ),
        CardRecord::minion("Defender of Argus", 4, NEUTRAL, 2, 3)
            .cost(4)
            .rarity(Rarity::Rare)
            .on(
                Trigger::Played,
                Effect::Buff {
                    target: Target::Adjacent,
                    attack: 1,
                    health: 1,
                    abilities: Ability::Taunt.into(),
                },
            ),
        CardRecord::minion("Menagerie Jug", 4, NEUTRAL, 3, 3)
            .cost(5)
            .on(Trigger::Played, Effect::buff(Target::DistinctTypes { count: 3 }, 2, 2)),
    ]
}

fn tier_five_and_six() -> Vec<CardRecord> {
    vec![
        CardRecord::minion("Mal'Ganis", 5, Demon, 9, 7)
            .cost(9)
            .rarity(Rarity::Legendary)
            .aura(Aura {
                attack: 2,
                health: 2,
                abilities: Default::default(),
                filter: Some(Demon),
                scope: AuraScope::OtherFriendly,
            }),
        CardRecord::minion("King Bagurgle", 5, Murloc, 6, 3)
            .cost(6)
            .rarity(Rarity::Legendary)
            .on(Trigger::Played, Effect::buff(Target::other_friendly(Some(Murloc)), 2, 2))
            .on(Trigger::Deathrattle, Effect::buff(Target::other_friendly(Some(Murloc)), 2, 2)),
        CardRecord::minion("Lightfang Enforcer", 5, NEUTRAL, 2, 2)
            .cost(6)
            .rarity(Rarity::Epic)
            .on(Trigger::TurnEnd, Effect::buff(Target::DistinctTypes { count: 4 }, 2, 1)),
        CardRecord::minion("Maexxna", 6, Beast, 2, 8)
            .cost(6)
            .rarity(Rarity::Legendary)
            .abilities(Ability::Poisonous),
        CardRecord::minion("Zapp Slywick", 6, NEUTRAL, 7, 10)
            .cost(8)
            .rarity(Rarity::Legendary)
            .abilities(Ability::Windfury),
        CardRecord::minion("Nadina the Red", 6, NEUTRAL, 7, 4)
            .cost(6)
            .rarity(Rarity::Legendary)
            .on(
                Trigger::Deathrattle,
                Effect::Buff {
                    target: Target::AllFriendly { filter: Some(Dragon), exclude_self: true },
                    attack: 0,
                    health: 0,
                    abilities: Ability::DivineShield.into(),
                },
            ),
        CardRecord::minion("Foe Reaper 4000", 6, Mech, 6, 9)
            .cost(8)
            .rarity(Rarity::Legendary),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::Catalogue;

    #[test]
    fn tokens_are_not_purchasable() {
        let catalogue = Catalogue::builtin();
        for name in ["Tabbycat", "Water Droplet", "Murloc Scout", "Imp", "Big Bad Wolf"] {
            let id = catalogue.find(name, false).unwrap();
            assert!(!catalogue[id].purchasable, "{name}");
        }
    }

    #[test]
    fn every_tier_has_purchasable_cards() {
        let catalogue = Catalogue::builtin();
        let regular = records().len();
        assert_eq!(catalogue.len(), regular * 2);
        for tier in 1..=MAX_TIER {
            assert!(catalogue.purchasable().any(|t| t.tier == tier), "tier {tier}");
        }
    }

    #[test]
    fn khadgar_golden_triples_summons() {
        let catalogue = Catalogue::builtin();
        let khadgar = catalogue.find("Khadgar", false).unwrap();
        let golden = catalogue.golden_of(khadgar).unwrap();
        assert_eq!(catalogue[khadgar].summon_factor, 2);
        assert_eq!(catalogue[golden].summon_factor, 3);
    }
}
