//! Session context owning the ledger, inventory, reward board and RNG streams.
use serde::{Deserialize, Serialize};

use crate::KeyValueStore;
use crate::board::{ClaimRefusal, MultiRollConfig, RewardBoard, RollCounts, RollSummary};
use crate::catalog::{CatalogLedger, PoolId};
use crate::inventory::{InventoryRecord, InventoryStore};
use crate::reroll::{self, RerollOutcome};
use crate::rng::{DrawRng, RngBundle};
use crate::sampler::{self, DrawnItem};

/// Per-session settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    /// User-visible seed; the draw and id streams are derived from it.
    pub seed: u64,
    pub multi_roll: MultiRollConfig,
}

impl SessionConfig {
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }
}

/// Notification sent to subscribers after a call changed session state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ChangeEvent {
    /// A draw consumed a remaining count without touching the inventory.
    Drawn(DrawnItem),
    /// A draw consumed a remaining count but landed on a held pair.
    DrawDiscarded(DrawnItem),
    Added(Vec<InventoryRecord>),
    Removed(InventoryRecord),
    Rerolled(RerollOutcome),
    Cleared,
    Claimed { index: usize, summary: RollSummary },
    MultiRolled(RollSummary),
    Reset,
}

type Listener = Box<dyn FnMut(&ChangeEvent)>;

/// One player's loot session.
///
/// Every operation runs to completion under `&mut self`; listeners are
/// invoked synchronously once the state change is done.
pub struct LootSession<S: KeyValueStore> {
    config: SessionConfig,
    ledger: CatalogLedger,
    inventory: InventoryStore<S>,
    board: RewardBoard,
    draw_rng: DrawRng,
    listeners: Vec<Listener>,
}

impl<S: KeyValueStore> LootSession<S> {
    /// Start a session, restoring the saved inventory and button state from
    /// `storage`.
    pub fn new(
        config: SessionConfig,
        ledger: CatalogLedger,
        board: RewardBoard,
        storage: S,
    ) -> Self {
        let (draw_rng, ids) = RngBundle::from_user_seed(config.seed).into_streams();
        let inventory = InventoryStore::restore(storage, ids);
        let mut board = board;
        board.restore_used(inventory.storage());
        log::debug!(
            "session started: seed {}, {} catalog entries, {} held",
            config.seed,
            ledger.len(),
            inventory.len()
        );
        Self {
            config,
            ledger,
            inventory,
            board,
            draw_rng,
            listeners: Vec::new(),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub const fn ledger(&self) -> &CatalogLedger {
        &self.ledger
    }

    #[must_use]
    pub const fn inventory(&self) -> &InventoryStore<S> {
        &self.inventory
    }

    #[must_use]
    pub fn records(&self) -> &[InventoryRecord] {
        self.inventory.records()
    }

    #[must_use]
    pub const fn board(&self) -> &RewardBoard {
        &self.board
    }

    pub fn storage(&self) -> &S {
        self.inventory.storage()
    }

    /// Random values consumed by draws so far.
    #[must_use]
    pub fn draws_consumed(&self) -> u64 {
        self.draw_rng.draws()
    }

    /// Register a change listener.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&ChangeEvent) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Draw one item without adding it to the inventory.
    pub fn draw(&mut self, pool: PoolId) -> Option<DrawnItem> {
        let item = sampler::draw(&mut self.ledger, pool, &mut self.draw_rng)?;
        self.notify(&ChangeEvent::Drawn(item.clone()));
        Some(item)
    }

    /// Draw one item and try to add it. Returns the new record, or `None`
    /// when the pool is exhausted or the pair is already held.
    pub fn draw_into_inventory(&mut self, pool: PoolId) -> Option<InventoryRecord> {
        let item = sampler::draw(&mut self.ledger, pool, &mut self.draw_rng)?;
        match self.inventory.add([item.clone()]).pop() {
            Some(record) => {
                self.notify(&ChangeEvent::Added(vec![record.clone()]));
                Some(record)
            }
            None => {
                self.notify(&ChangeEvent::DrawDiscarded(item));
                None
            }
        }
    }

    /// Add already-drawn items; see [`InventoryStore::add`].
    pub fn add<I>(&mut self, items: I) -> Vec<InventoryRecord>
    where
        I: IntoIterator<Item = DrawnItem>,
    {
        let accepted = self.inventory.add(items);
        if !accepted.is_empty() {
            self.notify(&ChangeEvent::Added(accepted.clone()));
        }
        accepted
    }

    pub fn remove(&mut self, id: &str) -> Option<InventoryRecord> {
        let removed = self.inventory.remove(id)?;
        self.notify(&ChangeEvent::Removed(removed.clone()));
        Some(removed)
    }

    /// Reroll the record with `id`. Unknown ids are ignored.
    pub fn reroll(&mut self, id: &str) -> Option<RerollOutcome> {
        let Some(record) = self.inventory.get(id).cloned() else {
            log::warn!("reroll ignored: no record with id {id}");
            return None;
        };
        let outcome = reroll::reroll(
            &mut self.ledger,
            &mut self.inventory,
            &record,
            &mut self.draw_rng,
        );
        self.notify(&ChangeEvent::Rerolled(outcome.clone()));
        Some(outcome)
    }

    pub fn clear(&mut self) {
        self.inventory.clear();
        self.notify(&ChangeEvent::Cleared);
    }

    /// Claim the board button at `index`.
    ///
    /// # Errors
    ///
    /// Returns a [`ClaimRefusal`] and changes nothing when the button is
    /// unknown, already claimed or still locked.
    pub fn claim(&mut self, index: usize) -> Result<RollSummary, ClaimRefusal> {
        let button = self.board.check_claim(index)?.clone();
        let (drawn, accepted) = self.roll_batch(button.rolls);
        self.board.mark_used(index);
        self.board.persist_used(self.inventory.storage());
        log::debug!(
            "claimed {}: {} drawn, {} accepted",
            button.name,
            drawn.len(),
            accepted.len()
        );
        let summary = RollSummary {
            button: Some(button.name),
            popup_message: button.popup_message,
            drawn,
            accepted,
        };
        self.notify(&ChangeEvent::Claimed {
            index,
            summary: summary.clone(),
        });
        Ok(summary)
    }

    /// Run the one-off multi-roll and unlock the special buttons.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimRefusal::MultiRollSpent`] if it already ran since the
    /// last reset.
    pub fn multi_roll(&mut self) -> Result<RollSummary, ClaimRefusal> {
        if !self.board.multi_roll_available() {
            return Err(ClaimRefusal::MultiRollSpent);
        }
        let (drawn, accepted) = self.roll_batch(self.config.multi_roll.counts());
        self.board.finish_multi_roll();
        log::debug!(
            "multi-roll: {} drawn, {} accepted",
            drawn.len(),
            accepted.len()
        );
        let summary = RollSummary {
            button: None,
            popup_message: None,
            drawn,
            accepted,
        };
        self.notify(&ChangeEvent::MultiRolled(summary.clone()));
        Ok(summary)
    }

    /// Empty the inventory and return the board to its initial state.
    /// Remaining counts consumed so far stay consumed.
    pub fn reset_all(&mut self) {
        self.inventory.clear();
        self.board.reset();
        self.board.persist_used(self.inventory.storage());
        self.notify(&ChangeEvent::Reset);
    }

    /// General draws first, then limited; exhausted draws are skipped and
    /// the survivors are added as one batch.
    fn roll_batch(&mut self, counts: RollCounts) -> (Vec<DrawnItem>, Vec<InventoryRecord>) {
        let mut drawn = Vec::new();
        for pool in PoolId::ALL {
            for _ in 0..counts.for_pool(pool) {
                if let Some(item) = sampler::draw(&mut self.ledger, pool, &mut self.draw_rng) {
                    drawn.push(item);
                }
            }
        }
        let accepted = self.inventory.add(drawn.clone());
        (drawn, accepted)
    }

    fn notify(&mut self, event: &ChangeEvent) {
        for listener in &mut self.listeners {
            listener(event);
        }
    }
}
