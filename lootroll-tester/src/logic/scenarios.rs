use std::collections::HashSet;

use anyhow::{Result, ensure};
use lootroll_game::{
    CatalogLedger, ClaimRefusal, PoolId, Remaining, RerollKind, RngBundle, SessionConfig, draw,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::json;

use super::assets::TesterAssets;

pub type ScenarioCheck = fn(TesterAssets, u64) -> Result<()>;

/// A named check run once per seed and iteration.
#[derive(Debug, Clone, Copy)]
pub struct LogicScenario {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub check: ScenarioCheck,
}

const SCENARIOS: &[LogicScenario] = &[
    LogicScenario {
        key: "smoke",
        name: "Smoke",
        description: "Load bundled data, draw from both pools, fill the inventory",
        check: smoke,
    },
    LogicScenario {
        key: "weighted-draw",
        name: "Weighted Draw",
        description: "Draw frequencies follow randomly generated weights",
        check: weighted_draw,
    },
    LogicScenario {
        key: "pool-exhaustion",
        name: "Pool Exhaustion",
        description: "The limited pool yields exactly its remaining counts, then nothing",
        check: pool_exhaustion,
    },
    LogicScenario {
        key: "dedup",
        name: "Inventory Dedup",
        description: "A (name, pool) pair is never held twice",
        check: dedup,
    },
    LogicScenario {
        key: "reroll",
        name: "Reroll Protocol",
        description: "Rerolls always release the slot and keep counters in range",
        check: reroll,
    },
    LogicScenario {
        key: "persistence",
        name: "Persistence",
        description: "Inventory and claimed buttons survive a restart",
        check: persistence,
    },
    LogicScenario {
        key: "reward-board",
        name: "Reward Board",
        description: "Claims, special-button locking, multi-roll and reset",
        check: reward_board,
    },
];

pub fn list_scenarios() -> impl Iterator<Item = (&'static str, &'static str)> {
    SCENARIOS
        .iter()
        .map(|scenario| (scenario.key, scenario.description))
}

pub fn scenario_keys() -> Vec<String> {
    SCENARIOS
        .iter()
        .map(|scenario| scenario.key.to_string())
        .collect()
}

#[must_use]
pub fn get_scenario(key: &str) -> Option<LogicScenario> {
    SCENARIOS
        .iter()
        .find(|scenario| scenario.key.eq_ignore_ascii_case(key.trim()))
        .copied()
}

fn smoke(assets: TesterAssets, seed: u64) -> Result<()> {
    let mut session = assets.session(seed)?;
    ensure!(!session.ledger().is_empty(), "catalog should not be empty");
    ensure!(
        session.ledger().skipped() == 0,
        "bundled catalog has malformed records"
    );
    for pool in PoolId::ALL {
        let record = session.draw_into_inventory(pool);
        ensure!(record.is_some(), "first draw from pool {pool} should be accepted");
    }
    ensure!(
        session.records().len() == 2,
        "expected 2 records, got {}",
        session.records().len()
    );
    Ok(())
}

fn weighted_draw(_assets: TesterAssets, seed: u64) -> Result<()> {
    let mut inputs = ChaCha8Rng::seed_from_u64(seed);
    let light: f64 = inputs.gen_range(1.0..5.0);
    let heavy: f64 = inputs.gen_range(5.0..20.0);
    let mut ledger = CatalogLedger::load(
        &[
            json!({ "name": "Light", "weight": light }),
            json!({ "name": "Heavy", "weight": heavy }),
        ],
        &[],
    );
    let mut streams = RngBundle::from_user_seed(seed);
    let trials = 5_000_u32;
    let mut heavy_hits = 0_u32;
    for _ in 0..trials {
        let item = draw(&mut ledger, PoolId::General, streams.draw_mut())
            .ok_or_else(|| anyhow::anyhow!("unbounded pool ran dry"))?;
        if item.name == "Heavy" {
            heavy_hits += 1;
        }
    }
    let expected = heavy / (light + heavy);
    let observed = f64::from(heavy_hits) / f64::from(trials);
    ensure!(
        (observed - expected).abs() < 0.05,
        "heavy share {observed:.3} too far from {expected:.3}"
    );
    Ok(())
}

fn pool_exhaustion(assets: TesterAssets, seed: u64) -> Result<()> {
    let mut session = assets.session(seed)?;
    let mut seen = HashSet::new();
    let mut budget = 0_u32;
    for entry in session.ledger().pool(PoolId::Limited) {
        if !seen.insert(entry.name.clone()) {
            continue;
        }
        match entry.remaining() {
            Remaining::Finite(left) => budget += left,
            Remaining::Unbounded => {
                anyhow::bail!("{} in the limited pool is unbounded", entry.name);
            }
        }
    }

    let mut drawn = 0_u32;
    while session.draw(PoolId::Limited).is_some() {
        drawn += 1;
        ensure!(drawn <= budget, "drew more than the {budget} remaining");
    }
    ensure!(drawn == budget, "drew {drawn} of {budget} remaining");

    let before = session.ledger().entries().to_vec();
    ensure!(
        session.draw(PoolId::Limited).is_none(),
        "exhausted pool produced an item"
    );
    ensure!(
        session.ledger().entries() == before.as_slice(),
        "failed draw changed the ledger"
    );
    Ok(())
}

fn dedup(assets: TesterAssets, seed: u64) -> Result<()> {
    let mut session = assets.session(seed)?;
    let mut drawn = Vec::new();
    for round in 0..150 {
        let pool = if round % 4 == 0 {
            PoolId::Limited
        } else {
            PoolId::General
        };
        if let Some(item) = session.draw(pool) {
            drawn.push(item);
        }
    }
    session.add(drawn.clone());
    let mut pairs = HashSet::new();
    for record in session.records() {
        ensure!(
            pairs.insert((record.name.clone(), record.source_pool)),
            "{} from pool {:?} is held twice",
            record.name,
            record.source_pool
        );
    }
    let held = session.records().len();
    let accepted = session.add(drawn);
    ensure!(
        accepted.is_empty(),
        "re-adding held items accepted {}",
        accepted.len()
    );
    ensure!(
        session.records().len() == held,
        "re-adding held items changed the size"
    );
    Ok(())
}

fn reroll(assets: TesterAssets, seed: u64) -> Result<()> {
    let mut session = assets.session(seed)?;
    for pool in [PoolId::General, PoolId::General, PoolId::Limited, PoolId::Limited] {
        session.draw_into_inventory(pool);
    }
    let ids: Vec<String> = session.records().iter().map(|r| r.id.clone()).collect();
    for id in ids {
        let before = session.records().len();
        let outcome = session
            .reroll(&id)
            .ok_or_else(|| anyhow::anyhow!("record {id} vanished before its reroll"))?;
        ensure!(
            session.inventory().get(&id).is_none(),
            "rerolled record {id} is still held"
        );
        let after = session.records().len();
        match outcome.kind {
            RerollKind::Replaced => ensure!(after == before, "replacement changed the size"),
            RerollKind::DuplicateDiscarded | RerollKind::PoolExhausted => {
                ensure!(after + 1 == before, "lost slot should shrink the inventory");
            }
            RerollKind::NotHeld => anyhow::bail!("held record {id} reported as not held"),
        }
    }
    for entry in session.ledger().entries() {
        if let (Remaining::Finite(left), Some(limit)) = (entry.remaining(), entry.reroll_limit) {
            ensure!(left <= limit, "{} has {left} of {limit} remaining", entry.name);
        }
    }
    Ok(())
}

fn persistence(assets: TesterAssets, seed: u64) -> Result<()> {
    let engine = assets.engine();
    let mut first = engine.start_session(SessionConfig::with_seed(seed))?;
    first.claim(0)?;
    for _ in 0..5 {
        first.draw_into_inventory(PoolId::General);
    }
    if let Some(id) = first.records().first().map(|r| r.id.clone()) {
        first.remove(&id);
    }
    let held = first.records().to_vec();

    let second = engine.start_session(SessionConfig::with_seed(seed.wrapping_add(1)))?;
    ensure!(second.records() == held.as_slice(), "inventory changed across restart");
    ensure!(second.board().is_used(0), "claimed button forgot its state");
    Ok(())
}

fn reward_board(assets: TesterAssets, seed: u64) -> Result<()> {
    let mut session = assets.session(seed)?;
    let count = session.board().buttons().len();
    for index in 0..count {
        let special = session.board().buttons()[index].sp;
        match session.claim(index) {
            Ok(_) => ensure!(!special, "special button {index} claimed while locked"),
            Err(ClaimRefusal::Locked(_)) => ensure!(special, "button {index} wrongly locked"),
            Err(other) => anyhow::bail!("unexpected refusal: {other}"),
        }
    }
    session.multi_roll()?;
    ensure!(
        session.multi_roll() == Err(ClaimRefusal::MultiRollSpent),
        "multi-roll ran twice"
    );
    for index in 0..count {
        let expected_open = session.board().buttons()[index].sp;
        ensure!(
            session.board().is_enabled(index) == expected_open,
            "button {index} availability wrong after multi-roll"
        );
    }
    session.reset_all();
    ensure!(session.records().is_empty(), "reset left items behind");
    ensure!(
        (0..count).all(|index| !session.board().is_used(index)),
        "reset left buttons claimed"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_scenario_passes_on_a_fixed_seed() {
        let assets = TesterAssets::load_default();
        for scenario in SCENARIOS {
            (scenario.check)(assets, 1337)
                .unwrap_or_else(|err| panic!("{} failed: {err:#}", scenario.key));
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(get_scenario(" Dedup ").map(|s| s.name), Some("Inventory Dedup"));
        assert!(get_scenario("missing").is_none());
        assert_eq!(scenario_keys().len(), list_scenarios().count());
    }
}
