//! Reward board: one-shot buttons that each grant a fixed number of draws.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::KeyValueStore;
use crate::catalog::PoolId;
use crate::constants::{
    BUTTONS_STORAGE_KEY, DEFAULT_BUTTON_TIER, MULTI_ROLL_GENERAL_DRAWS, MULTI_ROLL_LIMITED_DRAWS,
};
use crate::inventory::InventoryRecord;
use crate::sampler::DrawnItem;

/// Draws granted per pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollCounts {
    #[serde(default)]
    pub pool_normal: u32,
    #[serde(default)]
    pub pool_limited: u32,
}

impl RollCounts {
    #[must_use]
    pub const fn new(pool_normal: u32, pool_limited: u32) -> Self {
        Self {
            pool_normal,
            pool_limited,
        }
    }

    #[must_use]
    pub const fn for_pool(self, pool: PoolId) -> u32 {
        match pool {
            PoolId::General => self.pool_normal,
            PoolId::Limited => self.pool_limited,
        }
    }
}

/// Size of the one-off multi-roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiRollConfig {
    #[serde(default = "MultiRollConfig::default_general")]
    pub general: u32,
    #[serde(default = "MultiRollConfig::default_limited")]
    pub limited: u32,
}

impl MultiRollConfig {
    const fn default_general() -> u32 {
        MULTI_ROLL_GENERAL_DRAWS
    }

    const fn default_limited() -> u32 {
        MULTI_ROLL_LIMITED_DRAWS
    }

    #[must_use]
    pub const fn counts(self) -> RollCounts {
        RollCounts::new(self.general, self.limited)
    }
}

impl Default for MultiRollConfig {
    fn default() -> Self {
        Self {
            general: Self::default_general(),
            limited: Self::default_limited(),
        }
    }
}

/// A button definition from the board data file. Presentation-only fields
/// (label markup, images) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonDef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_tier")]
    pub tier: u8,
    /// Special buttons stay locked until the multi-roll has been used.
    #[serde(default)]
    pub sp: bool,
    #[serde(default)]
    pub rolls: RollCounts,
    #[serde(default)]
    pub popup_message: Option<String>,
}

const fn default_tier() -> u8 {
    DEFAULT_BUTTON_TIER
}

/// Why a claim was not carried out.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq, Serialize)]
pub enum ClaimRefusal {
    #[error("no button at position {0}")]
    UnknownButton(usize),
    #[error("button {0} has already been claimed")]
    AlreadyClaimed(usize),
    #[error("button {0} unlocks after the multi-roll")]
    Locked(usize),
    #[error("the multi-roll has already been used since the last reset")]
    MultiRollSpent,
}

/// Board definitions plus claim state.
#[derive(Debug, Clone, Default)]
pub struct RewardBoard {
    buttons: Vec<ButtonDef>,
    used: Vec<bool>,
    sp_unlocked: bool,
    multi_roll_used: bool,
}

impl RewardBoard {
    #[must_use]
    pub fn new(buttons: Vec<ButtonDef>) -> Self {
        let used = vec![false; buttons.len()];
        Self {
            buttons,
            used,
            sp_unlocked: false,
            multi_roll_used: false,
        }
    }

    /// Parse board definitions from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not an array of button records.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json).map(Self::new)
    }

    #[must_use]
    pub fn buttons(&self) -> &[ButtonDef] {
        &self.buttons
    }

    #[must_use]
    pub fn is_used(&self, index: usize) -> bool {
        self.used.get(index).copied().unwrap_or(false)
    }

    /// Whether the button can be claimed right now.
    #[must_use]
    pub fn is_enabled(&self, index: usize) -> bool {
        self.check_claim(index).is_ok()
    }

    #[must_use]
    pub const fn sp_unlocked(&self) -> bool {
        self.sp_unlocked
    }

    #[must_use]
    pub const fn multi_roll_available(&self) -> bool {
        !self.multi_roll_used
    }

    /// Validate a claim without changing state.
    ///
    /// # Errors
    ///
    /// Returns the refusal reason when the button is unknown, used or locked.
    pub fn check_claim(&self, index: usize) -> Result<&ButtonDef, ClaimRefusal> {
        let button = self
            .buttons
            .get(index)
            .ok_or(ClaimRefusal::UnknownButton(index))?;
        if self.is_used(index) {
            return Err(ClaimRefusal::AlreadyClaimed(index));
        }
        if button.sp && !self.sp_unlocked {
            return Err(ClaimRefusal::Locked(index));
        }
        Ok(button)
    }

    pub(crate) fn mark_used(&mut self, index: usize) {
        if let Some(flag) = self.used.get_mut(index) {
            *flag = true;
        }
    }

    pub(crate) fn finish_multi_roll(&mut self) {
        self.multi_roll_used = true;
        self.sp_unlocked = true;
    }

    pub(crate) fn reset(&mut self) {
        self.used.iter_mut().for_each(|flag| *flag = false);
        self.sp_unlocked = false;
        self.multi_roll_used = false;
    }

    /// Restore claimed flags saved as a positional JSON array of booleans.
    /// Unreadable saves leave every button unclaimed.
    pub fn restore_used<S: KeyValueStore>(&mut self, storage: &S) {
        let saved = match storage.get(BUTTONS_STORAGE_KEY) {
            Ok(Some(blob)) => blob,
            Ok(None) => return,
            Err(err) => {
                log::error!("failed to read button states: {err}");
                return;
            }
        };
        match serde_json::from_str::<Vec<Value>>(&saved) {
            Ok(states) => {
                for (index, flag) in self.used.iter_mut().enumerate() {
                    *flag = states.get(index).and_then(Value::as_bool).unwrap_or(false);
                }
            }
            Err(err) => log::error!("failed to load button states: {err}"),
        }
    }

    pub fn persist_used<S: KeyValueStore>(&self, storage: &S) {
        let blob = match serde_json::to_string(&self.used) {
            Ok(blob) => blob,
            Err(err) => {
                log::error!("failed to serialize button states: {err}");
                return;
            }
        };
        if let Err(err) = storage.set(BUTTONS_STORAGE_KEY, &blob) {
            log::error!("failed to save button states: {err}");
        }
    }
}

/// What a claim or multi-roll produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollSummary {
    pub button: Option<String>,
    pub popup_message: Option<String>,
    /// Every successful draw, in draw order, duplicates included.
    pub drawn: Vec<DrawnItem>,
    /// Draws that entered the inventory.
    pub accepted: Vec<InventoryRecord>,
}

impl RollSummary {
    /// Draws from one pool, in draw order.
    pub fn from_pool(&self, pool: PoolId) -> impl Iterator<Item = &DrawnItem> + '_ {
        self.drawn
            .iter()
            .filter(move |item| item.source_pool == pool)
    }

    pub fn general(&self) -> impl Iterator<Item = &DrawnItem> + '_ {
        self.from_pool(PoolId::General)
    }

    pub fn limited(&self) -> impl Iterator<Item = &DrawnItem> + '_ {
        self.from_pool(PoolId::Limited)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.drawn.is_empty()
    }
}
