//! Hub - the in-memory state container.
//!
//! The hub owns the invention registry, the essence balance and the
//! upgrades. Every state-changing operation writes the full snapshot to the
//! injected store before returning. Queries never write.

use crate::analytics::{analyze, Analysis};
use crate::config::HubConfig;
use crate::invention::{Draft, Invention, InventionId, Origin, Status};
use crate::persist::{KeyValueStore, PersistError, Persistence, Snapshot};
use crate::sort::{sorted, SortOrder};
use crate::upgrade::Upgrade;
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

/// Errors from hub operations.
///
/// The in-memory change has already been applied when a write fails.
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),
}

/// Outcome of [`Hub::purchase_upgrade`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purchase {
    Accepted {
        /// Level after the purchase.
        level: u32,
        /// Essence deducted.
        paid: u64,
        /// Price of the next level.
        next_cost: u64,
    },
    Rejected(Rejection),
}

impl Purchase {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Purchase::Accepted { .. })
    }
}

/// Why a purchase changed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    UnknownUpgrade,
    MaxLevel,
    InsufficientEssence { cost: u64, available: u64 },
}

/// The hub state container.
pub struct Hub<S> {
    persistence: Persistence<S>,
    state: Snapshot,
    config: HubConfig,
    rng: StdRng,
    revision: u64,
}

impl<S: KeyValueStore> Hub<S> {
    /// Open a hub on `store`, loading the saved snapshot or starting fresh.
    pub fn open(store: S, config: HubConfig) -> Self {
        let persistence = Persistence::with_key(store, config.storage_key.clone());
        let state = match persistence.load() {
            Some(state) => state,
            None => {
                tracing::info!(key = %config.storage_key, "no saved hub state, starting fresh");
                Snapshot::default()
            }
        };
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        tracing::debug!(
            inventions = state.inventions.len(),
            essence = state.essence,
            "hub opened"
        );

        Self {
            persistence,
            state,
            config,
            rng,
            revision: 0,
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// The full current state.
    pub fn snapshot(&self) -> &Snapshot {
        &self.state
    }

    /// Inventions in stored order, newest first.
    pub fn inventions(&self) -> &[Invention] {
        &self.state.inventions
    }

    pub fn invention(&self, id: &InventionId) -> Option<&Invention> {
        self.state.inventions.iter().find(|inv| &inv.id == id)
    }

    pub fn len(&self) -> usize {
        self.state.inventions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.inventions.is_empty()
    }

    pub fn essence(&self) -> u64 {
        self.state.essence
    }

    pub fn upgrades(&self) -> &[Upgrade] {
        &self.state.upgrades
    }

    pub fn upgrade(&self, id: &str) -> Option<&Upgrade> {
        self.state.upgrades.iter().find(|u| u.id == id)
    }

    /// Inventions in the requested display order.
    pub fn sorted(&self, order: SortOrder) -> Vec<&Invention> {
        sorted(&self.state.inventions, order)
    }

    /// Deterministic analysis of an invention.
    pub fn analyze(&self, id: &InventionId) -> Option<Analysis> {
        self.invention(id)
            .map(|inv| analyze(inv.id.as_str(), &inv.name))
    }

    /// Bumped on every state change; readers compare it to decide whether
    /// to re-read.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Close the hub and hand back its store.
    pub fn into_store(self) -> S {
        self.persistence.into_store()
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Add a new invention at the head of the registry.
    ///
    /// Identity, status, scores and counters are assigned here; the score
    /// policy is chosen by `origin`.
    pub fn create_invention(
        &mut self,
        draft: Draft,
        origin: Origin,
    ) -> Result<InventionId, HubError> {
        let id = self.fresh_id();
        let (quantum_stability, energy_output, cyber_sync) =
            self.config.scores_for(origin).sample(&mut self.rng);

        let invention = Invention {
            id: id.clone(),
            name: draft.name,
            description: draft.description,
            category: draft.category,
            status: Status::Prototype,
            quantum_stability,
            energy_output,
            cyber_sync,
            tags: draft.tags,
            notes: String::new(),
            resonance: 0,
            image_url: draft.image_url,
        };

        tracing::info!(id = %id, name = %invention.name, ?origin, "invention created");
        self.state.inventions.insert(0, invention);
        self.commit()?;
        Ok(id)
    }

    /// Add one to an invention's resonance. Unknown ids are ignored.
    pub fn record_engagement(&mut self, id: &InventionId) -> Result<(), HubError> {
        self.update_matching(id, |invention| {
            invention.resonance = invention.resonance.saturating_add(1);
        })
    }

    /// Replace an invention's notes verbatim. Unknown ids are ignored.
    pub fn set_notes(
        &mut self,
        id: &InventionId,
        notes: impl Into<String>,
    ) -> Result<(), HubError> {
        let notes = notes.into();
        self.update_matching(id, |invention| invention.notes.clone_from(&notes))
    }

    /// Add essence to the balance.
    pub fn credit_essence(&mut self, amount: u64) -> Result<(), HubError> {
        self.state.essence = self.state.essence.saturating_add(amount);
        self.commit()
    }

    /// Buy the next level of an upgrade.
    ///
    /// Either everything happens (essence deducted, level raised, cost
    /// grown, snapshot written) or nothing does.
    pub fn purchase_upgrade(&mut self, upgrade_id: &str) -> Result<Purchase, HubError> {
        let available = self.state.essence;
        let Some(upgrade) = self.state.upgrades.iter_mut().find(|u| u.id == upgrade_id) else {
            return Ok(Purchase::Rejected(Rejection::UnknownUpgrade));
        };
        if upgrade.is_maxed() {
            return Ok(Purchase::Rejected(Rejection::MaxLevel));
        }
        if available < upgrade.cost {
            return Ok(Purchase::Rejected(Rejection::InsufficientEssence {
                cost: upgrade.cost,
                available,
            }));
        }

        let paid = upgrade.advance();
        let purchase = Purchase::Accepted {
            level: upgrade.level,
            paid,
            next_cost: upgrade.cost,
        };
        self.state.essence = available - paid;

        tracing::info!(upgrade = upgrade_id, paid, "upgrade purchased");
        self.commit()?;
        Ok(purchase)
    }

    /// Drop the saved record and return to a fresh state.
    pub fn purge(&mut self) -> Result<(), HubError> {
        self.persistence.purge()?;
        self.state = Snapshot::default();
        self.revision += 1;
        tracing::warn!(key = %self.config.storage_key, "hub data purged");
        Ok(())
    }

    /// Apply `update` to every invention carrying `id`, then save. A saved
    /// record may hold duplicate ids; all of them change together.
    fn update_matching(
        &mut self,
        id: &InventionId,
        mut update: impl FnMut(&mut Invention),
    ) -> Result<(), HubError> {
        let mut matched = false;
        for invention in self.state.inventions.iter_mut().filter(|inv| &inv.id == id) {
            update(invention);
            matched = true;
        }
        if !matched {
            return Ok(());
        }
        self.commit()
    }

    /// A token not used by any current invention.
    fn fresh_id(&mut self) -> InventionId {
        loop {
            let id = InventionId::generate(&mut self.rng);
            if self.invention(&id).is_none() {
                return id;
            }
            tracing::debug!(id = %id, "identity collision, regenerating");
        }
    }

    fn commit(&mut self) -> Result<(), HubError> {
        self.revision += 1;
        self.persistence.save(&self.state).map_err(|e| {
            tracing::warn!(error = %e, "failed to save hub state");
            HubError::from(e)
        })
    }
}
