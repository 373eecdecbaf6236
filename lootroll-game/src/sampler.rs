//! Weighted draw-without-replacement over a pool view of the catalog ledger.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogEntry, CatalogLedger, PoolId, Tags, tags};

/// The result of a successful draw: the entry's display fields plus the pool
/// that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawnItem {
    pub name: String,
    #[serde(default, deserialize_with = "tags::deserialize")]
    pub category: Tags,
    #[serde(rename = "type", default, deserialize_with = "tags::deserialize")]
    pub kind: Tags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_type: Option<String>,
    pub source_pool: PoolId,
}

impl DrawnItem {
    #[must_use]
    pub fn from_entry(entry: &CatalogEntry, pool: PoolId) -> Self {
        Self {
            name: entry.name.clone(),
            category: entry.category.clone(),
            kind: entry.kind.clone(),
            display_category: entry.display_category.clone(),
            display_type: entry.display_type.clone(),
            source_pool: pool,
        }
    }
}

/// Draw one item from `pool`, proportional to weight, skipping exhausted
/// entries. The chosen entry's remaining counter is decremented.
///
/// Returns `None` when every entry in the pool is exhausted; the ledger is not
/// touched in that case.
pub fn draw<R: Rng>(ledger: &mut CatalogLedger, pool: PoolId, rng: &mut R) -> Option<DrawnItem> {
    let available: Vec<(usize, f64)> = ledger
        .members(pool)
        .iter()
        .copied()
        .filter(|idx| ledger.entry_at(*idx).is_available())
        .map(|idx| (idx, ledger.entry_at(idx).weight))
        .collect();

    if available.is_empty() {
        log::debug!("pool {pool} exhausted, nothing to draw");
        return None;
    }

    let total_weight: f64 = available.iter().map(|(_, weight)| *weight).sum();
    let roll = rng.r#gen::<f64>() * total_weight;
    let chosen = select_weighted(&available, roll)?;

    if !ledger.decrement_at(chosen) {
        log::warn!(
            "pool {pool} selected exhausted entry {}",
            ledger.entry_at(chosen).name
        );
        return None;
    }

    let item = DrawnItem::from_entry(ledger.entry_at(chosen), pool);
    log::debug!(
        "drew {} from pool {pool} (roll {roll:.3} of {total_weight:.3}, {} candidates)",
        item.name,
        available.len()
    );
    Some(item)
}

/// Walk `weights` in order, subtracting each weight from `roll`; the first
/// candidate that brings the running value to zero or below wins.
///
/// If rounding leaves every candidate unselected the last candidate is
/// returned.
#[must_use]
pub fn select_weighted<T: Copy>(weights: &[(T, f64)], roll: f64) -> Option<T> {
    let mut running = roll;
    for (candidate, weight) in weights {
        running -= *weight;
        if running <= 0.0 {
            return Some(*candidate);
        }
    }
    weights.last().map(|(candidate, _)| *candidate)
}
