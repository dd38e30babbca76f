use std::fmt;
use serde::{Deserialize, Serialize};
use crate::cards::{Abilities, Ability, CardId, CardTemplate, Keywords, MinionTypes};

/// Identity of one minion for the lifetime of a game. Allocated by the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Buff {
    pub attack: i32,
    pub health: i32,
    pub abilities: Abilities,
    /// Aura buffs are stripped and recomputed whenever the board changes.
    pub aura: bool,
}

impl Buff {
    pub fn stats(attack: i32, health: i32) -> Self {
        Self { attack, health, ..Self::default() }
    }

    pub fn granting(abilities: impl Into<Abilities>) -> Self {
        Self { abilities: abilities.into(), ..Self::default() }
    }

    pub fn as_aura(mut self) -> Self {
        self.aura = true;
        self
    }
}

/// A runtime copy of a card template.
#[derive(Debug, Clone, PartialEq)]
pub struct Minion {
    pub id: InstanceId,
    pub card: CardId,
    pub golden: bool,
    /// Whether this copy was drawn from the pool and must go back to it.
    pub pooled: bool,
    pub tier: u8,
    pub types: MinionTypes,
    pub keywords: Keywords,
    base_attack: i32,
    base_health: i32,
    base_abilities: Abilities,
    buffs: Vec<Buff>,
    dead: bool,
}

impl Minion {
    pub fn new(id: InstanceId, template: &CardTemplate, pooled: bool) -> Self {
        Self {
            id,
            card: template.id,
            golden: template.golden,
            pooled,
            tier: template.tier,
            types: template.types,
            keywords: template.keywords,
            base_attack: template.attack,
            base_health: template.health,
            base_abilities: template.abilities,
            buffs: Vec::new(),
            dead: false,
        }
    }

    pub fn attack(&self) -> i32 {
        (self.base_attack + self.buffs.iter().map(|b| b.attack).sum::<i32>()).max(0)
    }

    pub fn health(&self) -> i32 {
        self.base_health + self.buffs.iter().map(|b| b.health).sum::<i32>()
    }

    pub fn abilities(&self) -> Abilities {
        self.buffs.iter().fold(self.base_abilities, |set, buff| set | buff.abilities)
    }

    pub fn has(&self, ability: Ability) -> bool {
        self.abilities().contains(ability)
    }

    pub fn buffs(&self) -> &[Buff] {
        &self.buffs
    }

    pub fn add_buff(&mut self, buff: Buff) {
        self.buffs.push(buff);
        if self.health() <= 0 {
            self.dead = true;
        }
    }

    /// Tavern damage is recorded as a negative health buff so it survives aura recomputes.
    pub fn take_damage(&mut self, amount: i32) {
        if amount > 0 {
            self.add_buff(Buff::stats(0, -amount));
        }
    }

    pub fn strip_aura_buffs(&mut self) {
        self.buffs.retain(|buff| !buff.aura);
    }

    /// Every buff that is not an aura, in application order.
    pub fn permanent_buffs(&self) -> impl Iterator<Item = &Buff> + '_ {
        self.buffs.iter().filter(|buff| !buff.aura)
    }

    pub fn is_dead(&self) -> bool {
        self.dead || self.health() <= 0
    }

    pub fn mark_dead(&mut self) {
        self.dead = true;
    }

    pub fn view(&self, name: &str) -> MinionView {
        MinionView {
            id: self.id,
            name: name.to_string(),
            golden: self.golden,
            tier: self.tier,
            types: self.types,
            attack: self.attack(),
            health: self.health(),
            abilities: self.abilities(),
        }
    }
}

/// Read-only snapshot of a minion with resolved stats, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinionView {
    pub id: InstanceId,
    pub name: String,
    pub golden: bool,
    pub tier: u8,
    pub types: MinionTypes,
    pub attack: i32,
    pub health: i32,
    pub abilities: Abilities,
}

impl fmt::Display for MinionView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let golden = if self.golden { "golden " } else { "" };
        write!(f, "{}/{} {}{}", self.attack, self.health, golden, self.name)?;
        if !self.abilities.is_empty() {
            write!(f, " {:?}", self.abilities)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardRecord, Catalogue, MinionType};

    fn minion() -> Minion {
        let catalogue = Catalogue::from_records(vec![
            CardRecord::minion("Crab", 1, MinionType::Beast, 2, 3),
        ])
        .unwrap();
        let id = catalogue.find("Crab", false).unwrap();
        Minion::new(InstanceId(0), &catalogue[id], true)
    }

    #[test]
    fn stats_are_base_plus_buffs() {
        let mut crab = minion();
        crab.add_buff(Buff::stats(1, 1));
        crab.add_buff(Buff::stats(2, 0).as_aura());
        assert_eq!((crab.attack(), crab.health()), (5, 4));

        crab.strip_aura_buffs();
        assert_eq!((crab.attack(), crab.health()), (3, 4));
    }

    #[test]
    fn lethal_damage_marks_dead() {
        let mut crab = minion();
        crab.take_damage(2);
        assert!(!crab.is_dead());
        crab.take_damage(1);
        assert!(crab.is_dead());
    }

    #[test]
    fn granted_abilities_merge_with_base() {
        let mut crab = minion();
        assert!(!crab.has(Ability::Taunt));
        crab.add_buff(Buff::granting(Ability::Taunt));
        assert!(crab.has(Ability::Taunt));
        assert_eq!(crab.view("Crab").to_string(), "2/3 Crab {Taunt}");
    }
}
