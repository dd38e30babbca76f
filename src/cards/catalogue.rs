use std::collections::{HashMap, HashSet};
use std::ops::Index;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use super::{
    Abilities, Aura, CardId, CardTemplate, Effect, Handler, Keywords, MinionTypes, Rarity,
    Trigger, MAX_TIER,
};

#[derive(Error, Debug)]
pub enum CatalogueError {
    #[error("malformed card list: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no valid card records were supplied")]
    Empty,
}

/// One card as supplied by an external loader. Missing fields take the defaults of a
/// purchasable tier 1 neutral minion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardRecord {
    pub name: Option<String>,
    pub golden: bool,
    /// For golden records, the name of the regular card they upgrade.
    pub golden_pair: Option<String>,
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
    /// Multiplies the number of minions this board's summon effects create.
    pub summon_factor: u8,
}

impl Default for CardRecord {
    fn default() -> Self {
        Self {
            name: None,
            golden: false,
            golden_pair: None,
            types: MinionTypes::NONE,
            attack: 0,
            health: 1,
            cost: 3,
            tier: 1,
            rarity: Rarity::Common,
            abilities: Abilities::NONE,
            keywords: Keywords::NONE,
            purchasable: true,
            handlers: Vec::new(),
            aura: None,
            summon_factor: 1,
        }
    }
}

impl CardRecord {
    pub fn minion(
        name: &str,
        tier: u8,
        types: impl Into<MinionTypes>,
        attack: i32,
        health: i32,
    ) -> Self {
        Self {
            name: Some(name.to_string()),
            types: types.into(),
            attack,
            health,
            tier,
            ..Self::default()
        }
    }

    pub fn cost(mut self, cost: u8) -> Self {
        self.cost = cost;
        self
    }

    pub fn rarity(mut self, rarity: Rarity) -> Self {
        self.rarity = rarity;
        self
    }

    pub fn abilities(mut self, abilities: impl Into<Abilities>) -> Self {
        self.abilities = abilities.into();
        self
    }

    pub fn keywords(mut self, keywords: impl Into<Keywords>) -> Self {
        self.keywords = keywords.into();
        self
    }

    /// Marks the card as a token: it is never offered for purchase and lives outside the pool.
    pub fn token(mut self) -> Self {
        self.purchasable = false;
        self
    }

    pub fn on(mut self, trigger: Trigger, effect: Effect) -> Self {
        self.handlers.push(Handler::new(trigger, effect));
        self
    }

    pub fn on_if(mut self, trigger: Trigger, condition: super::Condition, effect: Effect) -> Self {
        self.handlers.push(Handler::when(trigger, condition, effect));
        self
    }

    pub fn aura(mut self, aura: Aura) -> Self {
        self.aura = Some(aura);
        self
    }

    pub fn summon_factor(mut self, factor: u8) -> Self {
        self.summon_factor = factor;
        self
    }

    /// Turns this record into an explicit golden variant of `regular`.
    pub fn golden_of(mut self, regular: &str) -> Self {
        self.golden = true;
        self.golden_pair = Some(regular.to_string());
        self.purchasable = false;
        self
    }

    fn valid_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|name| !name.is_empty())
    }

    /// Name under which the record is registered. Goldens are keyed by their regular card.
    fn key(&self) -> Option<(String, bool)> {
        let name = self.valid_name()?;
        if self.golden {
            let regular = self.golden_pair.as_deref().unwrap_or(name);
            Some((regular.to_string(), true))
        } else {
            Some((name.to_string(), false))
        }
    }

    fn references(&self) -> impl Iterator<Item = &str> {
        self.handlers
            .iter()
            .filter_map(|handler| handler.effect.referenced_card())
            .map(|(name, _)| name)
    }
}

/// Immutable set of card templates, addressed by [`CardId`].
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    templates: Vec<CardTemplate>,
    by_name: HashMap<(String, bool), CardId>,
}

impl Catalogue {
    /// The built-in catalogue, with purchasable minions on every tavern tier.
    pub fn builtin() -> Self {
        Self::build(super::builtin::records())
    }

    pub fn from_records(records: Vec<CardRecord>) -> Result<Self, CatalogueError> {
        let catalogue = Self::build(records);
        if catalogue.is_empty() {
            return Err(CatalogueError::Empty);
        }
        Ok(catalogue)
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogueError> {
        let records: Vec<CardRecord> = serde_json::from_str(json)?;
        Self::from_records(records)
    }

    fn build(records: Vec<CardRecord>) -> Self {
        let mut seen = HashSet::new();
        let mut accepted = Vec::with_capacity(records.len());

        for record in records {
            let Some(key) = record.key() else {
                warn!(tier = record.tier, "skipping card record without a name");
                continue;
            };
            if record.tier == 0 || record.tier > MAX_TIER {
                warn!(name = %key.0, tier = record.tier, "skipping card record with invalid tier");
                continue;
            }
            if !seen.insert(key.clone()) {
                warn!(name = %key.0, golden = key.1, "skipping duplicate card record");
                continue;
            }
            accepted.push(record);
        }

        // drop records that create cards nobody defined, repeating until nothing changes
        loop {
            let regulars: HashSet<String> = accepted
                .iter()
                .filter_map(|r: &CardRecord| r.key())
                .filter(|(_, golden)| !golden)
                .map(|(name, _)| name)
                .collect();

            let before = accepted.len();
            accepted.retain(|record| {
                let missing = record.references().find(|name| !regulars.contains(*name));
                let orphan = record.golden
                    && record.key().map_or(true, |(regular, _)| !regulars.contains(&regular));

                if let Some(missing) = missing {
                    warn!(name = ?record.name, missing, "skipping card record with unknown reference");
                    false
                } else if orphan {
                    warn!(name = ?record.name, "skipping golden record without a regular card");
                    false
                } else {
                    true
                }
            });

            if accepted.len() == before {
                break;
            }
        }

        let mut catalogue = Catalogue::default();

        let (regulars, goldens): (Vec<CardRecord>, Vec<CardRecord>) =
            accepted.into_iter().partition(|r| !r.golden);

        for record in &regulars {
            catalogue.push(record, None);
        }

        for record in &goldens {
            let Some((regular_name, _)) = record.key() else { continue };
            let Some(&regular) = catalogue.by_name.get(&(regular_name.clone(), false)) else {
                continue;
            };
            let golden = catalogue.push(record, Some((regular_name, regular)));
            catalogue.templates[regular.index()].golden_pair = Some(golden);
        }

        // derive a golden variant for every regular card that did not ship one
        for index in 0..catalogue.templates.len() {
            let regular = &catalogue.templates[index];
            if regular.golden || regular.golden_pair.is_some() {
                continue;
            }

            let golden_id = CardId(catalogue.templates.len() as u16);
            let golden = CardTemplate {
                id: golden_id,
                name: regular.name.clone(),
                golden: true,
                golden_pair: Some(regular.id),
                types: regular.types,
                attack: regular.attack * 2,
                health: regular.health * 2,
                cost: regular.cost,
                tier: regular.tier,
                rarity: regular.rarity,
                abilities: regular.abilities,
                keywords: regular.keywords,
                purchasable: false,
                handlers: regular.handlers.iter().map(|h| h.scaled(2)).collect(),
                aura: regular.aura.map(|aura| aura.scaled(2)),
                // a doubler becomes a tripler
                summon_factor: regular.summon_factor.saturating_sub(1).saturating_mul(2).saturating_add(1),
            };

            catalogue.by_name.insert((golden.name.clone(), true), golden_id);
            catalogue.templates[index].golden_pair = Some(golden_id);
            catalogue.templates.push(golden);
        }

        debug!(templates = catalogue.templates.len(), "card catalogue loaded");
        catalogue
    }

    fn push(&mut self, record: &CardRecord, regular: Option<(String, CardId)>) -> CardId {
        let id = CardId(self.templates.len() as u16);
        let name = record.valid_name().unwrap_or_default().to_string();

        let mut keywords = record.keywords;
        for handler in &record.handlers {
            if let Some(keyword) = handler.trigger.keyword() {
                keywords.insert(keyword);
            }
        }

        let (key, golden_pair) = match regular {
            Some((regular_name, regular_id)) => ((regular_name, true), Some(regular_id)),
            None => ((name.clone(), false), None),
        };

        self.templates.push(CardTemplate {
            id,
            name,
            golden: record.golden,
            golden_pair,
            types: record.types,
            attack: record.attack,
            health: record.health,
            cost: record.cost,
            tier: record.tier,
            rarity: record.rarity,
            abilities: record.abilities,
            keywords,
            purchasable: record.purchasable && !record.golden,
            handlers: record.handlers.clone(),
            aura: record.aura,
            summon_factor: record.summon_factor.max(1),
        });
        self.by_name.insert(key, id);
        id
    }

    pub fn get(&self, id: CardId) -> Option<&CardTemplate> {
        self.templates.get(id.index())
    }

    pub fn find(&self, name: &str, golden: bool) -> Option<CardId> {
        self.by_name.get(&(name.to_string(), golden)).copied()
    }

    pub fn golden_of(&self, id: CardId) -> Option<CardId> {
        let template = self.get(id)?;
        if template.golden {
            Some(id)
        } else {
            template.golden_pair
        }
    }

    /// Cards that may be offered in the tavern, in catalogue order.
    pub fn purchasable(&self) -> impl Iterator<Item = &CardTemplate> {
        self.templates.iter().filter(|t| t.purchasable)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CardTemplate> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Index<CardId> for Catalogue {
    type Output = CardTemplate;

    fn index(&self, id: CardId) -> &CardTemplate {
        &self.templates[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Ability, Keyword, MinionType, Target};

    #[test]
    fn nameless_records_are_skipped() {
        let records = vec![
            CardRecord::minion("Wisp", 1, MinionTypes::NONE, 1, 1),
            CardRecord { name: None, ..CardRecord::default() },
            CardRecord { name: Some("   ".into()), ..CardRecord::default() },
        ];
        let catalogue = Catalogue::from_records(records).unwrap();

        // the wisp and its derived golden
        assert_eq!(catalogue.len(), 2);
        assert!(catalogue.find("Wisp", false).is_some());
    }

    #[test]
    fn only_invalid_records_is_an_error() {
        let records = vec![CardRecord { tier: 9, ..CardRecord::minion("Giant", 9, MinionTypes::NONE, 8, 8) }];
        assert!(matches!(Catalogue::from_records(records), Err(CatalogueError::Empty)));
    }

    #[test]
    fn goldens_are_derived_with_double_stats() {
        let records = vec![
            CardRecord::minion("Cat", 1, MinionType::Beast, 1, 1).token(),
            CardRecord::minion("Alley", 1, MinionType::Beast, 1, 1)
                .on(Trigger::Played, Effect::summon("Cat")),
        ];
        let catalogue = Catalogue::from_records(records).unwrap();

        let regular = catalogue.find("Alley", false).unwrap();
        let golden = catalogue.golden_of(regular).unwrap();
        let template = &catalogue[golden];

        assert!(template.golden);
        assert!(!template.purchasable);
        assert_eq!((template.attack, template.health), (2, 2));
        assert_eq!(template.base_card(), regular);
        assert!(template.keywords.contains(Keyword::Battlecry));
        assert_eq!(
            template.handlers[0].effect,
            Effect::Summon { card: "Cat".into(), golden: true, count: 1 }
        );
    }

    #[test]
    fn explicit_golden_records_replace_derivation() {
        let records = vec![
            CardRecord::minion("Shieldy", 2, MinionTypes::NONE, 2, 2),
            CardRecord::minion("Golden Shieldy", 2, MinionTypes::NONE, 5, 5)
                .abilities(Ability::DivineShield)
                .golden_of("Shieldy"),
        ];
        let catalogue = Catalogue::from_records(records).unwrap();
        assert_eq!(catalogue.len(), 2);

        let golden = catalogue.find("Shieldy", true).unwrap();
        assert_eq!(catalogue[golden].attack, 5);
        assert!(catalogue[golden].abilities.contains(Ability::DivineShield));
    }

    #[test]
    fn unknown_references_are_skipped() {
        let records = vec![
            CardRecord::minion("Summoner", 1, MinionTypes::NONE, 1, 1)
                .on(Trigger::Deathrattle, Effect::summon("Nobody")),
            CardRecord::minion("Buffer", 1, MinionTypes::NONE, 1, 1)
                .on(Trigger::Played, Effect::buff(Target::This, 1, 1)),
        ];
        let catalogue = Catalogue::from_records(records).unwrap();
        assert!(catalogue.find("Summoner", false).is_none());
        assert!(catalogue.find("Buffer", false).is_some());
    }

    #[test]
    fn loads_from_json() {
        let json = r#"[
            {"name": "Scout", "types": ["Murloc"], "attack": 1, "health": 1, "purchasable": false},
            {"name": "Hunter", "types": ["Murloc"], "attack": 2, "health": 1,
             "handlers": [{"trigger": "Played", "effect": {"kind": "Summon", "card": "Scout", "golden": false, "count": 1}}]},
            {"attack": 3}
        ]"#;
        let catalogue = Catalogue::from_json(json).unwrap();
        let hunter = catalogue.find("Hunter", false).unwrap();
        assert!(catalogue[hunter].responds_to(Trigger::Played));
        assert_eq!(catalogue.purchasable().count(), 1);
    }

    #[test]
    fn builtin_catalogue_resolves_every_reference() {
        let catalogue = Catalogue::builtin();
        assert!(!catalogue.is_empty());
        for template in catalogue.iter() {
            for handler in &template.handlers {
                if let Some((name, golden)) = handler.effect.referenced_card() {
                    assert!(catalogue.find(name, golden).is_some(), "{} references {name}", template.name);
                }
            }
        }
    }
}
