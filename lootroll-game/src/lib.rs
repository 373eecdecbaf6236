//! Lootroll Engine
//!
//! Platform-agnostic core for a two-pool loot drawing and collection tracker:
//! a catalog ledger of per-item draw limits, a weighted sampler, a persisted
//! deduplicated inventory with a reroll protocol, and a reward board.
//! This crate has no UI or platform-specific dependencies.

pub mod board;
pub mod catalog;
pub mod constants;
pub mod inventory;
pub mod reroll;
pub mod rng;
pub mod sampler;
pub mod session;
pub mod storage;
pub mod view;

use thiserror::Error;

// Re-export commonly used types
pub use board::{ButtonDef, ClaimRefusal, MultiRollConfig, RewardBoard, RollCounts, RollSummary};
pub use catalog::{CatalogEntry, CatalogError, CatalogLedger, PoolId, Remaining, Tags};
pub use constants::{BUTTONS_STORAGE_KEY, INVENTORY_STORAGE_KEY};
pub use inventory::{InventoryRecord, InventoryStore};
pub use reroll::{RerollKind, RerollOutcome, reroll};
pub use rng::{CountingRng, DrawRng, IdRng, RngBundle};
pub use sampler::{DrawnItem, draw, select_weighted};
pub use session::{ChangeEvent, LootSession, SessionConfig};
pub use storage::{MemoryStore, MemoryStoreError};
pub use view::{CategoryTab, InventoryFilter};

/// Trait for abstracting data loading operations
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the raw JSON array of catalog records for a pool
    ///
    /// # Errors
    ///
    /// Returns an error if the pool document cannot be read.
    fn load_pool(&self, pool: PoolId) -> Result<String, Self::Error>;

    /// Load the raw JSON array of reward board buttons
    ///
    /// # Errors
    ///
    /// Returns an error if the board document cannot be read.
    fn load_board(&self) -> Result<String, Self::Error>;
}

/// Trait for abstracting string key-value persistence
/// Platform-specific implementations should provide this
pub trait KeyValueStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the value stored under `key`
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Replace the value stored under `key`
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the write.
    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error>;
}

/// Failures while assembling a session from its data sources.
#[derive(Debug, Error)]
pub enum EngineError<E>
where
    E: std::error::Error + 'static,
{
    #[error("failed to load data")]
    Loader(#[source] E),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("failed to parse reward board")]
    Board(#[source] serde_json::Error),
}

/// Main engine for creating loot sessions
pub struct LootEngine<L, S>
where
    L: DataLoader,
    S: KeyValueStore,
{
    data_loader: L,
    storage: S,
}

impl<L, S> LootEngine<L, S>
where
    L: DataLoader,
    S: KeyValueStore + Clone,
{
    /// Create a new engine with the provided data loader and storage
    pub const fn new(data_loader: L, storage: S) -> Self {
        Self {
            data_loader,
            storage,
        }
    }

    /// Load both pools into a fresh ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if either pool cannot be loaded or is not a JSON array.
    pub fn load_ledger(&self) -> Result<CatalogLedger, EngineError<L::Error>> {
        let general = self
            .data_loader
            .load_pool(PoolId::General)
            .map_err(EngineError::Loader)?;
        let limited = self
            .data_loader
            .load_pool(PoolId::Limited)
            .map_err(EngineError::Loader)?;
        Ok(CatalogLedger::from_json(&general, &limited)?)
    }

    /// Start a session over freshly loaded data and the engine's storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog or board data cannot be loaded.
    pub fn start_session(
        &self,
        config: SessionConfig,
    ) -> Result<LootSession<S>, EngineError<L::Error>> {
        let ledger = self.load_ledger()?;
        let board_json = self
            .data_loader
            .load_board()
            .map_err(EngineError::Loader)?;
        let board = RewardBoard::from_json(&board_json).map_err(EngineError::Board)?;
        Ok(LootSession::new(
            config,
            ledger,
            board,
            self.storage.clone(),
        ))
    }

    pub const fn storage(&self) -> &S {
        &self.storage
    }
}
