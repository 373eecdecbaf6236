//! Centralized constants for Lootroll draw logic.
//!
//! Storage keys are shared with saves written by earlier builds of the game,
//! so they must not change.

// Storage keys -------------------------------------------------------------
pub const INVENTORY_STORAGE_KEY: &str = "inventory";
pub const BUTTONS_STORAGE_KEY: &str = "buttonsUsed";

// Catalog defaults ---------------------------------------------------------
pub(crate) const DEFAULT_ITEM_WEIGHT: f64 = 1.0;
pub(crate) const DEFAULT_BUTTON_TIER: u8 = 1;

// Multi-roll ---------------------------------------------------------------
pub(crate) const MULTI_ROLL_GENERAL_DRAWS: u32 = 60;
pub(crate) const MULTI_ROLL_LIMITED_DRAWS: u32 = 30;

// RNG stream domain tags ---------------------------------------------------
pub(crate) const RNG_DOMAIN_DRAW: &[u8] = b"lootroll.draw";
pub(crate) const RNG_DOMAIN_IDS: &[u8] = b"lootroll.ids";
