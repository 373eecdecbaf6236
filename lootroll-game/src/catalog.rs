//! Catalog ledger: the single authority over item identity and remaining draws.
//!
//! Both pools are views into one shared entry table keyed by trimmed item name,
//! so an item listed in the general and the limited pool has exactly one
//! `remaining` counter.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::constants::DEFAULT_ITEM_WEIGHT;

/// Ordered category/type tags. Most items carry one or two.
pub type Tags = SmallVec<[String; 2]>;

/// Which pool an item is drawn from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PoolId {
    /// General pool (`"A"`).
    #[default]
    #[serde(rename = "A")]
    General,
    /// Limited (boss) pool (`"B"`).
    #[serde(rename = "B")]
    Limited,
}

impl PoolId {
    pub const ALL: [Self; 2] = [Self::General, Self::Limited];

    /// Short code used in persisted records.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::General => "A",
            Self::Limited => "B",
        }
    }

    /// Human-facing pool name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::General => "General Pool",
            Self::Limited => "Boss Pool",
        }
    }

    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "A" | "GENERAL" | "NORMAL" => Some(Self::General),
            "B" | "LIMITED" | "BOSS" => Some(Self::Limited),
            _ => None,
        }
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Draws left for a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Remaining {
    Unbounded,
    Finite(u32),
}

impl Remaining {
    #[must_use]
    pub const fn from_limit(limit: Option<u32>) -> Self {
        match limit {
            Some(count) => Self::Finite(count),
            None => Self::Unbounded,
        }
    }

    /// Whether at least one more draw is allowed.
    #[must_use]
    pub const fn is_available(self) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Finite(count) => count > 0,
        }
    }

    #[must_use]
    pub const fn count(self) -> Option<u32> {
        match self {
            Self::Unbounded => None,
            Self::Finite(count) => Some(count),
        }
    }
}

/// Serde helpers for tag lists that may arrive as a single string.
pub(crate) mod tags {
    use super::Tags;
    use serde::{Deserialize, Deserializer};
    use smallvec::smallvec;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<Option<String>>),
    }

    /// Accepts `"tag"`, `["a", "b"]` or `null`. `null` elements inside a list
    /// are dropped.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Tags, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
            None => Tags::new(),
            Some(OneOrMany::One(tag)) => smallvec![tag],
            Some(OneOrMany::Many(tags)) => tags.into_iter().flatten().collect(),
        })
    }
}

/// A catalog record exactly as it appears in the pool source files.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    name: String,
    #[serde(default, deserialize_with = "tags::deserialize")]
    category: Tags,
    #[serde(rename = "type", default, deserialize_with = "tags::deserialize")]
    kind: Tags,
    #[serde(default)]
    weight: Option<f64>,
    #[serde(default)]
    rerolls: Option<u32>,
    #[serde(default)]
    display_category: Option<String>,
    #[serde(default)]
    display_type: Option<String>,
}

/// Why a raw catalog record was skipped.
#[derive(Debug, Error)]
enum RecordRejection {
    #[error("record does not match the catalog shape: {0}")]
    Shape(#[from] serde_json::Error),
    #[error("record has a blank name")]
    BlankName,
    #[error("weight {0} is not a positive number")]
    Weight(f64),
}

impl RawEntry {
    fn parse(value: &Value) -> Result<Self, RecordRejection> {
        let raw = Self::deserialize(value)?;
        if raw.name.trim().is_empty() {
            return Err(RecordRejection::BlankName);
        }
        if let Some(weight) = raw.weight
            && !(weight.is_finite() && weight > 0.0)
        {
            return Err(RecordRejection::Weight(weight));
        }
        Ok(raw)
    }

    fn into_entry(self) -> CatalogEntry {
        let reroll_limit = self.rerolls;
        CatalogEntry {
            name: normalize_name(&self.name).to_string(),
            category: self.category,
            kind: self.kind,
            weight: self.weight.unwrap_or(DEFAULT_ITEM_WEIGHT),
            reroll_limit,
            remaining: Remaining::from_limit(reroll_limit),
            display_category: self.display_category,
            display_type: self.display_type,
        }
    }
}

/// One unique collectible, shared by every pool that lists it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub name: String,
    pub category: Tags,
    #[serde(rename = "type")]
    pub kind: Tags,
    pub weight: f64,
    /// `None` means the entry can be drawn without limit.
    pub reroll_limit: Option<u32>,
    remaining: Remaining,
    pub display_category: Option<String>,
    pub display_type: Option<String>,
}

impl CatalogEntry {
    #[must_use]
    pub const fn remaining(&self) -> Remaining {
        self.remaining
    }

    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.remaining.is_available()
    }

    fn decrement(&mut self) -> bool {
        match self.remaining {
            Remaining::Unbounded => true,
            Remaining::Finite(0) => false,
            Remaining::Finite(count) => {
                self.remaining = Remaining::Finite(count - 1);
                true
            }
        }
    }

    fn increment(&mut self) -> bool {
        match (self.remaining, self.reroll_limit) {
            (Remaining::Finite(count), Some(limit)) if count < limit => {
                self.remaining = Remaining::Finite(count + 1);
                true
            }
            _ => false,
        }
    }
}

/// Errors raised when a pool source document cannot be read at all.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("pool {pool} source is not a JSON array of records: {source}")]
    Source {
        pool: PoolId,
        #[source]
        source: serde_json::Error,
    },
}

/// Trimmed form of an item name, used as the catalog key everywhere.
#[must_use]
pub fn normalize_name(name: &str) -> &str {
    name.trim()
}

/// Shared name-to-entry table plus the two ordered pool views into it.
#[derive(Debug, Clone, Default)]
pub struct CatalogLedger {
    entries: Vec<CatalogEntry>,
    index: HashMap<String, usize>,
    general: Vec<usize>,
    limited: Vec<usize>,
    skipped: usize,
}

impl CatalogLedger {
    /// Build the ledger from two already-decoded lists of raw records.
    ///
    /// Malformed records are skipped and logged; the rest of the catalog
    /// still loads.
    #[must_use]
    pub fn load(pool_a: &[Value], pool_b: &[Value]) -> Self {
        let mut ledger = Self::default();
        ledger.general = ledger.register_pool(PoolId::General, pool_a);
        ledger.limited = ledger.register_pool(PoolId::Limited, pool_b);
        log::debug!(
            "catalog loaded: {} unique entries, pool A {}, pool B {}, skipped {}",
            ledger.entries.len(),
            ledger.general.len(),
            ledger.limited.len(),
            ledger.skipped
        );
        ledger
    }

    /// Parse two JSON documents and build the ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if either document is not a JSON array. Individual
    /// malformed records inside a valid array are skipped instead.
    pub fn from_json(pool_a: &str, pool_b: &str) -> Result<Self, CatalogError> {
        let parse = |pool: PoolId, json: &str| {
            serde_json::from_str::<Vec<Value>>(json)
                .map_err(|source| CatalogError::Source { pool, source })
        };
        let general = parse(PoolId::General, pool_a)?;
        let limited = parse(PoolId::Limited, pool_b)?;
        Ok(Self::load(&general, &limited))
    }

    fn register_pool(&mut self, pool: PoolId, records: &[Value]) -> Vec<usize> {
        let mut members = Vec::with_capacity(records.len());
        for (position, value) in records.iter().enumerate() {
            let raw = match RawEntry::parse(value) {
                Ok(raw) => raw,
                Err(err) => {
                    log::warn!("skipping pool {pool} record #{position}: {err}");
                    self.skipped += 1;
                    continue;
                }
            };
            let key = normalize_name(&raw.name);
            let idx = if let Some(existing) = self.index.get(key) {
                *existing
            } else {
                let idx = self.entries.len();
                self.index.insert(key.to_string(), idx);
                self.entries.push(raw.into_entry());
                idx
            };
            members.push(idx);
        }
        members
    }

    /// Number of unique entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records dropped as malformed during load.
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.skipped
    }

    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    #[must_use]
    pub fn entry(&self, name: &str) -> Option<&CatalogEntry> {
        self.index_of(name).map(|idx| &self.entries[idx])
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(normalize_name(name)).copied()
    }

    pub(crate) fn members(&self, pool: PoolId) -> &[usize] {
        match pool {
            PoolId::General => &self.general,
            PoolId::Limited => &self.limited,
        }
    }

    /// Whether `pool` lists an entry called `name`.
    #[must_use]
    pub fn lists(&self, pool: PoolId, name: &str) -> bool {
        self.index_of(name)
            .is_some_and(|idx| self.members(pool).contains(&idx))
    }

    pub(crate) fn entry_at(&self, idx: usize) -> &CatalogEntry {
        &self.entries[idx]
    }

    pub(crate) fn decrement_at(&mut self, idx: usize) -> bool {
        self.entries[idx].decrement()
    }

    /// Entries of a pool in source order.
    pub fn pool(&self, pool: PoolId) -> impl Iterator<Item = &CatalogEntry> + '_ {
        self.members(pool).iter().map(|idx| &self.entries[*idx])
    }

    /// Pool listings whose entry can still be drawn.
    #[must_use]
    pub fn available_count(&self, pool: PoolId) -> usize {
        self.pool(pool).filter(|entry| entry.is_available()).count()
    }

    #[must_use]
    pub fn remaining(&self, name: &str) -> Option<Remaining> {
        self.entry(name).map(CatalogEntry::remaining)
    }

    /// Consume one draw of `name`. Refused (returns `false`) once the entry is
    /// exhausted or when the name is unknown.
    pub fn decrement_remaining(&mut self, name: &str) -> bool {
        self.index_of(name)
            .is_some_and(|idx| self.entries[idx].decrement())
    }

    /// Give one draw of `name` back to the pools.
    ///
    /// Never fails: unknown names and unbounded entries are left alone and the
    /// counter never climbs past the entry's reroll limit. Returns whether the
    /// counter moved.
    pub fn increment_remaining(&mut self, name: &str) -> bool {
        self.index_of(name)
            .is_some_and(|idx| self.entries[idx].increment())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_ledger() -> CatalogLedger {
        let pool_a = vec![
            json!({ "name": "Boltor", "category": ["primary"], "type": ["weapons"], "rerolls": 2 }),
            json!({ "name": "  Rhino ", "category": "warframe", "type": "warframe", "weight": 3 }),
        ];
        let pool_b = vec![
            json!({ "name": "Rhino", "category": ["warframe"], "type": ["warframe"], "weight": 9, "rerolls": 1 }),
            json!({ "name": "Nikana Prime", "category": ["melee"], "type": ["weapons"], "rerolls": 1 }),
        ];
        CatalogLedger::load(&pool_a, &pool_b)
    }

    #[test]
    fn pools_share_one_entry_per_name() {
        let ledger = sample_ledger();
        assert_eq!(ledger.len(), 3);
        let rhino = ledger.entry("Rhino").expect("rhino registered");
        // First registration wins: pool A's definition.
        assert!((rhino.weight - 3.0).abs() < f64::EPSILON);
        assert_eq!(rhino.remaining(), Remaining::Unbounded);
        assert_eq!(rhino.category.as_slice(), ["warframe".to_string()]);

        let limited: Vec<&str> = ledger
            .pool(PoolId::Limited)
            .map(|entry| entry.name.as_str())
            .collect();
        assert_eq!(limited, vec!["Rhino", "Nikana Prime"]);
        assert!(std::ptr::eq(
            ledger.pool(PoolId::Limited).next().unwrap(),
            ledger.pool(PoolId::General).nth(1).unwrap()
        ));
    }

    #[test]
    fn malformed_records_are_skipped_not_fatal() {
        let pool_a = vec![
            json!({ "name": "Good" }),
            json!({ "category": ["primary"] }),
            json!({ "name": "   " }),
            json!({ "name": "Zero", "weight": 0 }),
            json!({ "name": "Negative", "rerolls": -1 }),
            json!("not an object"),
            json!({ "name": "Also Good", "rerolls": 0 }),
        ];
        let ledger = CatalogLedger::load(&pool_a, &[]);
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.skipped(), 5);
        assert_eq!(ledger.remaining("Also Good"), Some(Remaining::Finite(0)));
        let good = ledger.entry("Good").unwrap();
        assert!((good.weight - 1.0).abs() < f64::EPSILON);
        assert!(good.category.is_empty());
    }

    #[test]
    fn decrement_stops_at_zero_and_increment_stops_at_limit() {
        let mut ledger = sample_ledger();
        assert!(ledger.decrement_remaining("Boltor"));
        assert!(ledger.decrement_remaining(" Boltor "));
        assert!(!ledger.decrement_remaining("Boltor"));
        assert_eq!(ledger.remaining("Boltor"), Some(Remaining::Finite(0)));

        assert!(ledger.increment_remaining("Boltor"));
        assert!(ledger.increment_remaining("Boltor"));
        assert!(!ledger.increment_remaining("Boltor"));
        assert_eq!(ledger.remaining("Boltor"), Some(Remaining::Finite(2)));

        assert!(!ledger.increment_remaining("Rhino"));
        assert!(!ledger.increment_remaining("Unknown"));
        assert!(!ledger.decrement_remaining("Unknown"));
    }

    #[test]
    fn from_json_rejects_non_array_documents() {
        let err = CatalogLedger::from_json("[]", r#"{"name":"x"}"#).unwrap_err();
        assert!(matches!(err, CatalogError::Source { pool: PoolId::Limited, .. }));

        let ledger = CatalogLedger::from_json(r#"[{"name":"Braton"}]"#, "[]").unwrap();
        assert_eq!(ledger.available_count(PoolId::General), 1);
        assert_eq!(ledger.available_count(PoolId::Limited), 0);
    }

    #[test]
    fn pool_codes_roundtrip() {
        for pool in PoolId::ALL {
            assert_eq!(PoolId::from_code(pool.code()), Some(pool));
        }
        assert_eq!(PoolId::from_code("boss"), Some(PoolId::Limited));
        assert_eq!(PoolId::from_code("C"), None);
        assert_eq!(serde_json::to_string(&PoolId::Limited).unwrap(), "\"B\"");
    }
}
