pub mod builtin;
pub mod catalogue;
pub mod effect;

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use serde::{Deserialize, Serialize};

pub use catalogue::{CardRecord, Catalogue, CatalogueError};
pub use effect::{Aura, AuraScope, Condition, Effect, Handler, Scope, Tally, Target, Trigger};

/// The highest tavern tier, and the highest tier a card can belong to.
pub const MAX_TIER: u8 = 6;

/// Index of a template inside its [`Catalogue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardId(pub u16);

impl CardId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MinionType {
    Beast,
    Demon,
    Dragon,
    Elemental,
    Mech,
    Murloc,
    Pirate,
}

impl MinionType {
    pub const ALL: [MinionType; 7] = [
        MinionType::Beast,
        MinionType::Demon,
        MinionType::Dragon,
        MinionType::Elemental,
        MinionType::Mech,
        MinionType::Murloc,
        MinionType::Pirate,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ability {
    Taunt,
    DivineShield,
    Poisonous,
    Windfury,
    Reborn,
}

impl Ability {
    pub const ALL: [Ability; 5] = [
        Ability::Taunt,
        Ability::DivineShield,
        Ability::Poisonous,
        Ability::Windfury,
        Ability::Reborn,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Keyword {
    Battlecry,
    Deathrattle,
    Magnetic,
    StartOfCombat,
}

impl Keyword {
    pub const ALL: [Keyword; 4] = [
        Keyword::Battlecry,
        Keyword::Deathrattle,
        Keyword::Magnetic,
        Keyword::StartOfCombat,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Rarity {
    #[default]
    Common,
    Rare,
    Epic,
    Legendary,
}

/// Declares a small bitset over a fieldless enum, serialised as a list of variants.
macro_rules! flag_set {
    ($(#[$meta:meta])* $set:ident, $flag:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $set(u8);

        impl Serialize for $set {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                Vec::<$flag>::from(*self).serialize(serializer)
            }
        }

        impl<'de> Deserialize<'de> for $set {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                Vec::<$flag>::deserialize(deserializer).map($set::from)
            }
        }

        impl $set {
            pub const NONE: $set = $set(0);

            fn bit(flag: $flag) -> u8 {
                1 << (flag as u8)
            }

            pub fn contains(self, flag: $flag) -> bool {
                self.0 & Self::bit(flag) != 0
            }

            pub fn contains_all(self, other: $set) -> bool {
                self.0 & other.0 == other.0
            }

            pub fn intersects(self, other: $set) -> bool {
                self.0 & other.0 != 0
            }

            pub fn is_empty(self) -> bool {
                self.0 == 0
            }

            pub fn insert(&mut self, flag: $flag) {
                self.0 |= Self::bit(flag);
            }

            pub fn remove(&mut self, flag: $flag) {
                self.0 &= !Self::bit(flag);
            }

            pub fn iter(self) -> impl Iterator<Item = $flag> {
                $flag::ALL.into_iter().filter(move |flag| self.contains(*flag))
            }
        }

        impl From<$flag> for $set {
            fn from(flag: $flag) -> Self {
                $set(Self::bit(flag))
            }
        }

        impl From<Vec<$flag>> for $set {
            fn from(flags: Vec<$flag>) -> Self {
                flags.into_iter().fold($set::NONE, |set, flag| set | flag)
            }
        }

        impl From<$set> for Vec<$flag> {
            fn from(set: $set) -> Self {
                set.iter().collect()
            }
        }

        impl<T: Into<$set>> BitOr<T> for $set {
            type Output = $set;

            fn bitor(self, rhs: T) -> $set {
                $set(self.0 | rhs.into().0)
            }
        }

        impl BitOr for $flag {
            type Output = $set;

            fn bitor(self, rhs: $flag) -> $set {
                $set::from(self) | rhs
            }
        }

        impl<T: Into<$set>> BitOrAssign<T> for $set {
            fn bitor_assign(&mut self, rhs: T) {
                self.0 |= rhs.into().0;
            }
        }

        impl fmt::Debug for $set {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_set().entries(self.iter()).finish()
            }
        }
    };
}

flag_set!(
    /// Minion types of a card. The empty set is a neutral minion.
    MinionTypes,
    MinionType
);
flag_set!(
    /// Combat mechanics carried by a card or granted by buffs.
    Abilities,
    Ability
);
flag_set!(Keywords, Keyword);

impl MinionTypes {
    pub fn is_neutral(self) -> bool {
        self.is_empty()
    }

    /// Whether a minion with these types counts as `filter`. `None` matches everything.
    pub fn matches(self, filter: Option<MinionType>) -> bool {
        filter.map_or(true, |t| self.contains(t))
    }
}

/// Immutable template for one card variant. Golden variants are separate templates linked
/// to their regular counterpart through `golden_pair`.
#[derive(Debug, Clone, PartialEq)]
pub struct CardTemplate {
    pub id: CardId,
    pub name: String,
    pub golden: bool,
    pub golden_pair: Option<CardId>,
    pub types: MinionTypes,
    pub attack: i32,
    pub health: i32,
    pub cost: u8,
    pub tier: u8,
    pub rarity: Rarity,
    pub abilities: Abilities,
    pub keywords: Keywords,
    pub purchasable: bool,
    pub handlers: Vec<Handler>,
    pub aura: Option<Aura>,
    pub summon_factor: u8,
}

impl CardTemplate {
    pub fn handlers_for(&self, trigger: Trigger) -> impl Iterator<Item = &Handler> {
        self.handlers.iter().filter(move |h| h.trigger == trigger)
    }

    pub fn responds_to(&self, trigger: Trigger) -> bool {
        self.handlers_for(trigger).next().is_some()
    }

    /// The regular card this template belongs to. For regular cards this is the card itself.
    pub fn base_card(&self) -> CardId {
        match (self.golden, self.golden_pair) {
            (true, Some(regular)) => regular,
            _ => self.id,
        }
    }
}

impl fmt::Display for CardTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.golden {
            write!(f, "{}/{} golden {}", self.attack, self.health, self.name)
        } else {
            write!(f, "{}/{} {}", self.attack, self.health, self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_sets_combine_and_serialise_as_lists() {
        let set = Ability::Taunt | Ability::DivineShield;
        assert!(set.contains(Ability::Taunt));
        assert!(!set.contains(Ability::Poisonous));

        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["Taunt","DivineShield"]"#);
        let back: Abilities = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn neutral_matches_only_unfiltered() {
        let neutral = MinionTypes::NONE;
        assert!(neutral.is_neutral());
        assert!(neutral.matches(None));
        assert!(!neutral.matches(Some(MinionType::Beast)));

        let beast: MinionTypes = MinionType::Beast.into();
        assert!(beast.matches(Some(MinionType::Beast)));
    }
}
