use std::convert::Infallible;

use lootroll_game::{DataLoader, LootEngine, LootSession, MemoryStore, PoolId, SessionConfig};

const POOL_NORMAL: &str = include_str!("../../../assets/data/pool_normal.json");
const POOL_LIMITED: &str = include_str!("../../../assets/data/pool_limited.json");
const BUTTONS: &str = include_str!("../../../assets/data/buttons.json");

/// Data files bundled into the tester binary.
#[derive(Debug, Clone, Copy)]
pub struct TesterAssets {
    pool_normal: &'static str,
    pool_limited: &'static str,
    buttons: &'static str,
}

impl TesterAssets {
    #[must_use]
    pub const fn load_default() -> Self {
        Self {
            pool_normal: POOL_NORMAL,
            pool_limited: POOL_LIMITED,
            buttons: BUTTONS,
        }
    }

    /// Engine over these assets with a fresh in-memory store.
    #[must_use]
    pub fn engine(self) -> LootEngine<Self, MemoryStore> {
        LootEngine::new(self, MemoryStore::new())
    }

    /// Fresh session for `seed` on a fresh store.
    pub fn session(self, seed: u64) -> anyhow::Result<LootSession<MemoryStore>> {
        Ok(self.engine().start_session(SessionConfig::with_seed(seed))?)
    }
}

impl DataLoader for TesterAssets {
    type Error = Infallible;

    fn load_pool(&self, pool: PoolId) -> Result<String, Self::Error> {
        Ok(match pool {
            PoolId::General => self.pool_normal,
            PoolId::Limited => self.pool_limited,
        }
        .to_string())
    }

    fn load_board(&self) -> Result<String, Self::Error> {
        Ok(self.buttons.to_string())
    }
}
