//! Persistent, deduplicated inventory of drawn items.
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Builder;

use crate::KeyValueStore;
use crate::catalog::{PoolId, Tags, tags};
use crate::constants::INVENTORY_STORAGE_KEY;
use crate::rng::IdRng;
use crate::sampler::DrawnItem;

/// Persisted form of an accepted draw.
///
/// Field names match the saved-inventory format; fields this crate does not
/// know about are ignored on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRecord {
    #[serde(rename = "_id", default)]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "tags::deserialize")]
    pub category: Tags,
    #[serde(rename = "type", default, deserialize_with = "tags::deserialize")]
    pub kind: Tags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_pool: Option<PoolId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_type: Option<String>,
}

impl InventoryRecord {
    fn from_drawn(item: DrawnItem, id: String) -> Self {
        Self {
            id,
            name: item.name,
            category: item.category,
            kind: item.kind,
            source_pool: Some(item.source_pool),
            display_category: item.display_category,
            display_type: item.display_type,
        }
    }

    /// Whether this record occupies the `(name, pool)` dedup slot.
    #[must_use]
    pub fn holds(&self, name: &str, pool: Option<PoolId>) -> bool {
        self.name == name && self.source_pool == pool
    }

    /// Pool to redraw from; records saved without one belong to the general pool.
    #[must_use]
    pub fn pool_or_default(&self) -> PoolId {
        self.source_pool.unwrap_or_default()
    }
}

fn decode_records(values: &[Value]) -> Vec<InventoryRecord> {
    values
        .iter()
        .enumerate()
        .filter_map(|(position, value)| match InventoryRecord::deserialize(value) {
            Ok(record) => Some(record),
            Err(err) => {
                log::warn!("dropping saved inventory record #{position}: {err}");
                None
            }
        })
        .collect()
}

/// Ordered inventory backed by a key-value store.
///
/// Every mutating call writes the whole collection once under
/// [`INVENTORY_STORAGE_KEY`]. Write failures are logged; the in-memory state
/// stays authoritative for the rest of the session.
#[derive(Debug)]
pub struct InventoryStore<S: KeyValueStore> {
    storage: S,
    records: Vec<InventoryRecord>,
    ids: IdRng,
}

impl<S: KeyValueStore> InventoryStore<S> {
    /// Load the saved inventory from `storage`. Missing or unreadable saves
    /// start an empty inventory; individual records that do not decode are
    /// dropped and the rest are kept.
    pub fn restore(storage: S, ids: IdRng) -> Self {
        let records = match storage.get(INVENTORY_STORAGE_KEY) {
            Ok(Some(blob)) => match serde_json::from_str::<Vec<Value>>(&blob) {
                Ok(values) => decode_records(&values),
                Err(err) => {
                    log::error!("failed to load inventory, starting empty: {err}");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                log::error!("failed to read inventory from storage, starting empty: {err}");
                Vec::new()
            }
        };
        log::debug!("inventory restored with {} records", records.len());
        Self {
            storage,
            records,
            ids,
        }
    }

    #[must_use]
    pub fn records(&self) -> &[InventoryRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&InventoryRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    /// Whether some record already holds `(name, pool)`.
    #[must_use]
    pub fn contains(&self, name: &str, pool: PoolId) -> bool {
        self.records
            .iter()
            .any(|record| record.holds(name, Some(pool)))
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Accept a batch of drawn items.
    ///
    /// Nameless candidates and candidates whose `(name, pool)` pair is already
    /// held (including by an earlier candidate of the same batch) are skipped.
    /// Accepted records get a fresh identifier and are appended in order; the
    /// inventory is persisted once if anything was accepted.
    pub fn add<I>(&mut self, candidates: I) -> Vec<InventoryRecord>
    where
        I: IntoIterator<Item = DrawnItem>,
    {
        let mut accepted = Vec::new();
        for item in candidates {
            if item.name.is_empty() {
                log::warn!("ignoring drawn item without a name");
                continue;
            }
            if self.contains(&item.name, item.source_pool) {
                log::debug!(
                    "duplicate {} from pool {} rejected",
                    item.name,
                    item.source_pool
                );
                continue;
            }
            let record = InventoryRecord::from_drawn(item, self.mint_id());
            self.records.push(record.clone());
            accepted.push(record);
        }
        if !accepted.is_empty() {
            self.persist();
        }
        accepted
    }

    /// Delete the record with `id`. Unknown ids change nothing.
    pub fn remove(&mut self, id: &str) -> Option<InventoryRecord> {
        let position = self.records.iter().position(|record| record.id == id)?;
        let removed = self.records.remove(position);
        self.persist();
        Some(removed)
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        self.records.clear();
        self.persist();
    }

    fn mint_id(&mut self) -> String {
        let bytes: [u8; 16] = self.ids.r#gen();
        Builder::from_random_bytes(bytes).into_uuid().to_string()
    }

    fn persist(&self) {
        let blob = match serde_json::to_string(&self.records) {
            Ok(blob) => blob,
            Err(err) => {
                log::error!("failed to serialize inventory: {err}");
                return;
            }
        };
        if let Err(err) = self.storage.set(INVENTORY_STORAGE_KEY, &blob) {
            log::error!("failed to save inventory: {err}");
        }
    }
}
