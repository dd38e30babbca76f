use std::collections::BTreeMap;
use std::sync::Arc;
use rand::Rng;
use tracing::trace;
use crate::cards::{CardId, Catalogue};
use crate::minion::{InstanceId, Minion};
use crate::tavern::EngineError;

/// Copies of each purchasable card in a fresh pool, indexed by tier - 1.
pub const TIER_COPIES: [u32; 6] = [18, 15, 13, 11, 9, 6];

pub fn copies_for_tier(tier: u8) -> u32 {
    TIER_COPIES.get(tier.saturating_sub(1) as usize).copied().unwrap_or(0)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Copies {
    regular: u32,
    golden: u32,
}

/// The shared, finite supply of purchasable minions for one game.
///
/// Counts are keyed by the regular card; golden copies that leave play are credited to the
/// golden count of their regular card. Tokens never touch the pool. The pool also hands out
/// the [`InstanceId`] of every minion created during the game, so ids stay unique across
/// boards.
#[derive(Debug, Clone)]
pub struct MinionPool {
    catalogue: Arc<Catalogue>,
    counts: BTreeMap<CardId, Copies>,
    next_instance: u32,
}

impl MinionPool {
    pub fn new(catalogue: Arc<Catalogue>) -> Self {
        let counts = catalogue
            .purchasable()
            .map(|template| {
                let copies = Copies { regular: copies_for_tier(template.tier), golden: 0 };
                (template.id, copies)
            })
            .collect();

        Self { catalogue, counts, next_instance: 0 }
    }

    pub fn catalogue(&self) -> &Arc<Catalogue> {
        &self.catalogue
    }

    /// Draws `n` minions without replacement, weighted by remaining copies, restricted to
    /// cards of tier `max_tier` or lower. Returns fewer when the pool runs dry.
    pub fn draw<R: Rng>(&mut self, rng: &mut R, n: usize, max_tier: u8) -> Vec<Minion> {
        let mut drawn = Vec::with_capacity(n);

        for _ in 0..n {
            let eligible: Vec<(CardId, u32)> = self
                .counts
                .iter()
                .filter(|(card, copies)| copies.regular > 0 && self.catalogue[**card].tier <= max_tier)
                .map(|(card, copies)| (*card, copies.regular))
                .collect();

            let total: u32 = eligible.iter().map(|(_, weight)| weight).sum();
            if total == 0 {
                break;
            }

            let mut roll = rng.gen_range(0..total);
            let mut chosen = eligible[0].0;
            for (card, weight) in &eligible {
                if roll < *weight {
                    chosen = *card;
                    break;
                }
                roll -= weight;
            }

            if let Some(copies) = self.counts.get_mut(&chosen) {
                copies.regular -= 1;
            }
            drawn.push(self.construct(chosen, true));
        }

        trace!(drawn = drawn.len(), max_tier, "drew recruits");
        drawn
    }

    /// Removes one regular copy of a purchasable card.
    pub fn take(&mut self, card: CardId) -> Result<(), EngineError> {
        let copies = self.counts.get_mut(&card).ok_or(EngineError::UnknownCard(card))?;
        if copies.regular == 0 {
            return Err(EngineError::PoolUnderflow(card));
        }
        copies.regular -= 1;
        Ok(())
    }

    /// Produces a minion of `card` for an effect. Purchasable cards and their goldens come out
    /// of the pool and yield `None` once exhausted; tokens are always constructed.
    pub fn acquire(&mut self, card: CardId) -> Result<Option<Minion>, EngineError> {
        let template = self.catalogue.get(card).ok_or(EngineError::UnknownCard(card))?;
        let (base, golden) = (template.base_card(), template.golden);

        let Some(copies) = self.counts.get_mut(&base) else {
            return Ok(Some(self.construct(card, false)));
        };

        let available = if golden { &mut copies.golden } else { &mut copies.regular };
        if *available == 0 {
            return Ok(None);
        }
        *available -= 1;
        Ok(Some(self.construct(card, true)))
    }

    /// Creates an instance without touching the counts.
    pub fn construct(&mut self, card: CardId, pooled: bool) -> Minion {
        let id = InstanceId(self.next_instance);
        self.next_instance += 1;
        Minion::new(id, &self.catalogue[card], pooled)
    }

    /// Returns a minion that leaves play. Only pooled copies are credited.
    pub fn give_back(&mut self, minion: &Minion) -> Result<(), EngineError> {
        if !minion.pooled {
            return Ok(());
        }

        let base = self.catalogue[minion.card].base_card();
        let limit = copies_for_tier(self.catalogue[base].tier);
        let copies = self.counts.get_mut(&base).ok_or(EngineError::UnknownCard(base))?;

        if copies.regular + copies.golden + 1 > limit {
            return Err(EngineError::PoolOverflow(base));
        }
        if minion.golden {
            copies.golden += 1;
        } else {
            copies.regular += 1;
        }
        Ok(())
    }

    /// Credits `n` regular copies of `card`, as happens to the surplus copies of a golden merge.
    pub fn return_copies(&mut self, card: CardId, n: u32) -> Result<(), EngineError> {
        let limit = copies_for_tier(self.catalogue[card].tier);
        let copies = self.counts.get_mut(&card).ok_or(EngineError::UnknownCard(card))?;
        if copies.regular + copies.golden + n > limit {
            return Err(EngineError::PoolOverflow(card));
        }
        copies.regular += n;
        Ok(())
    }

    /// Total copies left, regular and golden.
    pub fn size(&self) -> u32 {
        self.counts.values().map(|c| c.regular + c.golden).sum()
    }

    pub fn remaining(&self, card: CardId) -> u32 {
        self.counts.get(&card).map_or(0, |c| c.regular)
    }

    pub fn remaining_golden(&self, card: CardId) -> u32 {
        self.counts.get(&card).map_or(0, |c| c.golden)
    }

    /// Size of a fresh pool built from the same catalogue.
    pub fn initial_size(&self) -> u32 {
        self.counts.keys().map(|card| copies_for_tier(self.catalogue[*card].tier)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn pool() -> MinionPool {
        MinionPool::new(Arc::new(Catalogue::builtin()))
    }

    #[test]
    fn copies_follow_tier() {
        let pool = pool();
        let alleycat = pool.catalogue().find("Alleycat", false).unwrap();
        let warleader = pool.catalogue().find("Murloc Warleader", false).unwrap();
        let tabbycat = pool.catalogue().find("Tabbycat", false).unwrap();

        assert_eq!(pool.remaining(alleycat), 18);
        assert_eq!(pool.remaining(warleader), 15);
        assert_eq!(pool.remaining(tabbycat), 0);
        assert_eq!(pool.size(), pool.initial_size());
    }

    #[test]
    fn draw_respects_tier_and_conserves_copies() {
        let mut pool = pool();
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let drawn = pool.draw(&mut rng, 30, 1);

        assert_eq!(drawn.len(), 30);
        assert!(drawn.iter().all(|m| m.tier == 1 && m.pooled));
        assert_eq!(pool.size() + drawn.len() as u32, pool.initial_size());

        for minion in &drawn {
            pool.give_back(minion).unwrap();
        }
        assert_eq!(pool.size(), pool.initial_size());
    }

    #[test]
    fn tokens_bypass_the_pool() {
        let mut pool = pool();
        let tabbycat = pool.catalogue().find("Tabbycat", false).unwrap();
        let token = pool.acquire(tabbycat).unwrap().unwrap();
        assert!(!token.pooled);
        pool.give_back(&token).unwrap();
        assert_eq!(pool.size(), pool.initial_size());
    }

    #[test]
    fn overflow_and_underflow_are_errors() {
        let mut pool = pool();
        let alleycat = pool.catalogue().find("Alleycat", false).unwrap();
        let extra = pool.construct(alleycat, true);
        assert!(matches!(pool.give_back(&extra), Err(EngineError::PoolOverflow(_))));

        for _ in 0..18 {
            pool.take(alleycat).unwrap();
        }
        assert!(matches!(pool.take(alleycat), Err(EngineError::PoolUnderflow(_))));
        assert!(pool.acquire(alleycat).unwrap().is_none());
    }

    #[test]
    fn instance_ids_are_unique() {
        let mut pool = pool();
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let mut ids: Vec<_> = pool.draw(&mut rng, 10, 6).iter().map(|m| m.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), 10);
    }
}
