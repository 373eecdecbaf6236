use lootroll_game::{
    CatalogLedger, DrawnItem, INVENTORY_STORAGE_KEY, InventoryStore, MemoryStore, PoolId,
    Remaining, RerollKind, RngBundle, draw, reroll,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde_json::json;

fn shipped_ledger() -> CatalogLedger {
    CatalogLedger::from_json(
        include_str!("../../assets/data/pool_normal.json"),
        include_str!("../../assets/data/pool_limited.json"),
    )
    .unwrap()
}

fn empty_store(storage: &MemoryStore, seed: u64) -> InventoryStore<MemoryStore> {
    let (_, ids) = RngBundle::from_user_seed(seed).into_streams();
    InventoryStore::restore(storage.clone(), ids)
}

fn assert_counters_in_range(ledger: &CatalogLedger) {
    for entry in ledger.entries() {
        match (entry.remaining(), entry.reroll_limit) {
            (Remaining::Finite(left), Some(limit)) => {
                assert!(left <= limit, "{} has {left} of {limit}", entry.name);
            }
            (Remaining::Unbounded, None) => {}
            (remaining, limit) => panic!("{}: {remaining:?} with limit {limit:?}", entry.name),
        }
    }
}

#[test]
fn counters_stay_within_limits_through_draws_and_rerolls() {
    let mut ledger = shipped_ledger();
    let storage = MemoryStore::new();
    let mut store = empty_store(&storage, 1);
    let mut rng = SmallRng::seed_from_u64(0x1007);

    for round in 0..200 {
        let pool = if round % 3 == 0 {
            PoolId::Limited
        } else {
            PoolId::General
        };
        if let Some(item) = draw(&mut ledger, pool, &mut rng) {
            store.add([item]);
        }
        if round % 5 == 0
            && let Some(record) = store.records().first().cloned()
        {
            let outcome = reroll(&mut ledger, &mut store, &record, &mut rng);
            assert_ne!(outcome.kind, RerollKind::NotHeld);
            assert!(store.get(&record.id).is_none());
        }
        assert_counters_in_range(&ledger);
    }
}

#[test]
fn exhausted_pool_draw_is_none_and_leaves_ledger_alone() {
    let mut ledger = CatalogLedger::load(
        &[json!({ "name": "Braton" })],
        &[
            json!({ "name": "Saryn", "rerolls": 0 }),
            json!({ "name": "Galatine", "rerolls": 0 }),
        ],
    );
    let before = ledger.entries().to_vec();
    let mut rng = SmallRng::seed_from_u64(3);
    for _ in 0..10 {
        assert!(draw(&mut ledger, PoolId::Limited, &mut rng).is_none());
    }
    assert_eq!(ledger.entries(), before.as_slice());
}

#[test]
fn one_to_three_weights_converge() {
    let mut ledger = CatalogLedger::load(
        &[
            json!({ "name": "Light", "weight": 1 }),
            json!({ "name": "Heavy", "weight": 3 }),
        ],
        &[],
    );
    let mut rng = SmallRng::seed_from_u64(0xBEEF);
    let trials = 40_000;
    let heavy = (0..trials)
        .filter_map(|_| draw(&mut ledger, PoolId::General, &mut rng))
        .filter(|item| item.name == "Heavy")
        .count();
    let share = heavy as f64 / f64::from(trials);
    assert!((share - 0.75).abs() < 0.02, "heavy share {share}");
}

#[test]
fn limited_single_draws_then_exhaustion() {
    let mut ledger = CatalogLedger::load(
        &[
            json!({ "name": "X", "weight": 1, "rerolls": 1 }),
            json!({ "name": "Y", "weight": 1, "rerolls": 0 }),
        ],
        &[],
    );
    let mut rng = SmallRng::seed_from_u64(8);
    assert_eq!(
        draw(&mut ledger, PoolId::General, &mut rng).map(|item| item.name),
        Some("X".to_string())
    );
    assert!(draw(&mut ledger, PoolId::General, &mut rng).is_none());
}

#[test]
fn duplicate_pair_is_held_once() {
    let storage = MemoryStore::new();
    let mut store = empty_store(&storage, 2);
    let boltor: DrawnItem = serde_json::from_value(json!({
        "name": "Boltor",
        "category": "primary",
        "type": "weapons",
        "sourcePool": "A"
    }))
    .unwrap();
    store.add([boltor.clone()]);
    store.add([boltor]);
    assert_eq!(store.len(), 1);
}

#[test]
fn reroll_removes_even_when_pool_is_exhausted() {
    let mut ledger = CatalogLedger::load(
        &[],
        &[json!({ "name": "Nova Prime", "rerolls": 1 })],
    );
    let storage = MemoryStore::new();
    let mut store = empty_store(&storage, 3);
    let mut rng = SmallRng::seed_from_u64(4);
    let item = draw(&mut ledger, PoolId::Limited, &mut rng).unwrap();
    let held = store.add([item]).remove(0);
    assert_eq!(ledger.available_count(PoolId::Limited), 0);

    let outcome = reroll(&mut ledger, &mut store, &held, &mut rng);
    // The returned count makes Nova Prime drawable again.
    assert_eq!(outcome.kind, RerollKind::Replaced);

    let mut empty_pool = CatalogLedger::load(&[], &[]);
    let again = store.records()[0].clone();
    let outcome = reroll(&mut empty_pool, &mut store, &again, &mut rng);
    assert_eq!(outcome.kind, RerollKind::PoolExhausted);
    assert!(store.is_empty());
    assert_eq!(storage.raw(INVENTORY_STORAGE_KEY).as_deref(), Some("[]"));
}

#[test]
fn clear_then_add_persists_exactly() {
    let storage = MemoryStore::new();
    let mut store = empty_store(&storage, 4);
    let mut ledger = shipped_ledger();
    let mut rng = SmallRng::seed_from_u64(12);
    let batch: Vec<DrawnItem> = (0..8)
        .filter_map(|_| draw(&mut ledger, PoolId::General, &mut rng))
        .collect();
    store.add(batch);
    store.clear();
    let item = draw(&mut ledger, PoolId::General, &mut rng).unwrap();
    store.add([item]);
    assert_eq!(store.len(), 1);

    let more: Vec<DrawnItem> = (0..5)
        .filter_map(|_| draw(&mut ledger, PoolId::Limited, &mut rng))
        .collect();
    store.add(more);
    let restored = empty_store(&storage, 99);
    assert_eq!(restored.records(), store.records());
}
