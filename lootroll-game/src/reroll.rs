//! Return-then-redraw protocol.
//!
//! A reroll is a gamble: the held item leaves the inventory before the redraw
//! is attempted, and an exhausted pool does not give it back.
use rand::Rng;
use serde::Serialize;

use crate::KeyValueStore;
use crate::catalog::{CatalogLedger, PoolId};
use crate::inventory::{InventoryRecord, InventoryStore};
use crate::sampler::{self, DrawnItem};
use crate::view::tag_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RerollKind {
    /// The redraw produced a pair the player did not hold; it took the slot.
    Replaced,
    /// The redraw produced a pair the player already holds. The draw still
    /// consumed a remaining count and the slot is lost.
    DuplicateDiscarded,
    /// Nothing was left to draw; the slot is lost.
    PoolExhausted,
    /// The record was no longer in the inventory; nothing happened.
    NotHeld,
}

/// Structured result of a reroll, for the presentation layer to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RerollOutcome {
    pub kind: RerollKind,
    pub pool: PoolId,
    pub returned: InventoryRecord,
    pub replacement: Option<DrawnItem>,
    pub accepted: Option<InventoryRecord>,
}

impl RerollOutcome {
    /// Player-facing summary line.
    #[must_use]
    pub fn message(&self) -> String {
        match (&self.kind, &self.replacement) {
            (RerollKind::NotHeld, _) => {
                format!("{} is no longer in the inventory.", self.returned.name)
            }
            (RerollKind::PoolExhausted, _) | (_, None) => {
                format!("No item available from pool {}.", self.pool)
            }
            (RerollKind::Replaced, Some(item)) => format!(
                "Rerolled: {} ({} {})",
                item.name,
                tag_text(&item.category),
                tag_text(&item.kind)
            ),
            (RerollKind::DuplicateDiscarded, Some(item)) => {
                format!("Rerolled: {} (already held, discarded)", item.name)
            }
        }
    }
}

/// Release `record`'s inventory slot and redraw once from its pool.
///
/// The removal is persisted before the redraw and is never rolled back. When
/// the record's pool lists the returned item, its remaining count is restored
/// by one before drawing, so the redraw may land on the same item. Items the
/// pool does not list keep their count.
pub fn reroll<S, R>(
    ledger: &mut CatalogLedger,
    store: &mut InventoryStore<S>,
    record: &InventoryRecord,
    rng: &mut R,
) -> RerollOutcome
where
    S: KeyValueStore,
    R: Rng,
{
    let pool = record.pool_or_default();
    let Some(returned) = store.remove(&record.id) else {
        log::warn!("reroll of {} ignored: record {} not held", record.name, record.id);
        return RerollOutcome {
            kind: RerollKind::NotHeld,
            pool,
            returned: record.clone(),
            replacement: None,
            accepted: None,
        };
    };

    if ledger.lists(pool, &returned.name) {
        ledger.increment_remaining(&returned.name);
    }

    let replacement = sampler::draw(ledger, pool, rng);
    let (kind, accepted) = match &replacement {
        None => (RerollKind::PoolExhausted, None),
        Some(item) => match store.add([item.clone()]).into_iter().next() {
            Some(record) => (RerollKind::Replaced, Some(record)),
            None => (RerollKind::DuplicateDiscarded, None),
        },
    };
    log::debug!("reroll of {} from pool {pool}: {kind:?}", returned.name);

    RerollOutcome {
        kind,
        pool,
        returned,
        replacement,
        accepted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Remaining;
    use crate::constants::INVENTORY_STORAGE_KEY;
    use crate::rng::CountingRng;
    use crate::storage::MemoryStore;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use serde_json::{Value, json};

    fn stale_record(id: &str, name: &str, pool: PoolId) -> InventoryRecord {
        InventoryRecord {
            id: id.to_string(),
            name: name.to_string(),
            category: Default::default(),
            kind: Default::default(),
            source_pool: Some(pool),
            display_category: None,
            display_type: None,
        }
    }

    fn store_with(records: &[InventoryRecord]) -> InventoryStore<MemoryStore> {
        let blob = serde_json::to_string(records).unwrap();
        InventoryStore::restore(
            MemoryStore::new().with_value(INVENTORY_STORAGE_KEY, &blob),
            CountingRng::seeded(1),
        )
    }

    fn ledger(pool_a: &[Value], pool_b: &[Value]) -> CatalogLedger {
        CatalogLedger::load(pool_a, pool_b)
    }

    #[test]
    fn reroll_into_new_pair_keeps_inventory_size() {
        let mut ledger = ledger(
            &[
                json!({ "name": "Paris", "rerolls": 1 }),
                json!({ "name": "Dread", "rerolls": 1 }),
            ],
            &[],
        );
        let mut store = store_with(&[]);
        let mut rng = SmallRng::seed_from_u64(5);
        let item = sampler::draw(&mut ledger, PoolId::General, &mut rng).unwrap();
        let held = store.add([item]).remove(0);

        let outcome = reroll(&mut ledger, &mut store, &held, &mut rng);

        assert_eq!(outcome.kind, RerollKind::Replaced);
        assert_eq!(store.len(), 1);
        assert!(store.get(&held.id).is_none());
        let accepted = outcome.accepted.as_ref().unwrap();
        assert_eq!(store.records()[0].id, accepted.id);
        assert!(outcome.message().starts_with("Rerolled: "));
    }

    // Documented behaviour, not necessarily desirable: a redraw that lands on
    // a held pair is discarded, the slot is lost and the draw's decrement of
    // the duplicate is not given back.
    #[test]
    fn reroll_into_held_pair_shrinks_inventory_and_keeps_decrement() {
        let mut ledger = ledger(&[json!({ "name": "Soma", "rerolls": 5 })], &[]);
        let mut store = store_with(&[stale_record("old", "Lex", PoolId::General)]);
        let mut rng = SmallRng::seed_from_u64(5);
        let soma = sampler::draw(&mut ledger, PoolId::General, &mut rng).unwrap();
        assert_eq!(store.add([soma]).len(), 1);
        assert_eq!(ledger.remaining("Soma"), Some(Remaining::Finite(4)));

        let lex = store.get("old").cloned().unwrap();
        let outcome = reroll(&mut ledger, &mut store, &lex, &mut rng);

        assert_eq!(outcome.kind, RerollKind::DuplicateDiscarded);
        assert_eq!(outcome.replacement.as_ref().unwrap().name, "Soma");
        assert!(outcome.accepted.is_none());
        assert_eq!(store.len(), 1);
        assert_eq!(ledger.remaining("Soma"), Some(Remaining::Finite(3)));
    }

    #[test]
    fn reroll_with_exhausted_pool_still_removes_record() {
        let mut ledger = ledger(
            &[json!({ "name": "Ignis" })],
            &[json!({ "name": "Spent Boss Drop", "rerolls": 0 })],
        );
        let stale = stale_record("stale", "Retired Item", PoolId::Limited);
        let mut store = store_with(&[stale.clone()]);
        let mut rng = SmallRng::seed_from_u64(5);
        let before = ledger.entries().to_vec();

        let outcome = reroll(&mut ledger, &mut store, &stale, &mut rng);

        assert_eq!(outcome.kind, RerollKind::PoolExhausted);
        assert!(store.is_empty());
        assert_eq!(
            store.storage().raw(INVENTORY_STORAGE_KEY).as_deref(),
            Some("[]")
        );
        assert_eq!(ledger.entries(), before.as_slice());
        assert_eq!(outcome.message(), "No item available from pool B.");
    }

    #[test]
    fn exhausted_reroll_leaves_counts_of_items_listed_elsewhere() {
        let mut ledger = ledger(
            &[json!({ "name": "Lex", "rerolls": 1 })],
            &[json!({ "name": "Kuva Bramma", "rerolls": 0 })],
        );
        assert!(ledger.decrement_remaining("Lex"));
        let misfiled = stale_record("misfiled", "Lex", PoolId::Limited);
        let mut store = store_with(&[misfiled.clone()]);
        let mut rng = SmallRng::seed_from_u64(3);
        let before = ledger.entries().to_vec();

        let outcome = reroll(&mut ledger, &mut store, &misfiled, &mut rng);

        assert_eq!(outcome.kind, RerollKind::PoolExhausted);
        assert!(store.is_empty());
        assert_eq!(ledger.remaining("Lex"), Some(Remaining::Finite(0)));
        assert_eq!(ledger.entries(), before.as_slice());
    }

    #[test]
    fn reroll_restores_returned_item_eligibility() {
        let mut ledger = ledger(&[json!({ "name": "Glaive", "rerolls": 1 })], &[]);
        let mut store = store_with(&[]);
        let mut rng = SmallRng::seed_from_u64(9);
        let item = sampler::draw(&mut ledger, PoolId::General, &mut rng).unwrap();
        let held = store.add([item]).remove(0);
        assert_eq!(ledger.remaining("Glaive"), Some(Remaining::Finite(0)));

        let outcome = reroll(&mut ledger, &mut store, &held, &mut rng);

        assert_eq!(outcome.kind, RerollKind::Replaced);
        assert_eq!(store.records()[0].name, "Glaive");
        assert_ne!(store.records()[0].id, held.id);
        assert_eq!(ledger.remaining("Glaive"), Some(Remaining::Finite(0)));
    }

    #[test]
    fn records_without_pool_reroll_from_general() {
        let mut ledger = ledger(
            &[json!({ "name": "Hek" })],
            &[json!({ "name": "Kronen" })],
        );
        let mut legacy = stale_record("legacy", "Old Thing", PoolId::General);
        legacy.source_pool = None;
        let mut store = store_with(&[legacy.clone()]);
        let mut rng = SmallRng::seed_from_u64(2);

        let outcome = reroll(&mut ledger, &mut store, &legacy, &mut rng);

        assert_eq!(outcome.pool, PoolId::General);
        assert_eq!(store.records()[0].name, "Hek");
    }

    #[test]
    fn reroll_of_record_not_held_does_nothing() {
        let mut ledger = ledger(&[json!({ "name": "Kunai" })], &[]);
        let mut store = store_with(&[]);
        let mut rng = SmallRng::seed_from_u64(4);
        let ghost = stale_record("ghost", "Kunai", PoolId::General);

        let outcome = reroll(&mut ledger, &mut store, &ghost, &mut rng);

        assert_eq!(outcome.kind, RerollKind::NotHeld);
        assert!(outcome.replacement.is_none());
        assert!(store.is_empty());
        assert_eq!(store.storage().writes(), 0);
    }
}
