use persistence::{KeyValueStore, SaveAdapter};
use sim_core::Catalog;
use sim_econ::{Economy, Purchase};
use std::sync::Arc;
use tracing::info;

/// A running game: the economy plus where it is saved. This is the surface
/// a front end drives (clicks, purchases, reads for display).
#[derive(Debug)]
pub struct Session<S> {
    economy: Economy,
    saves: SaveAdapter<S>,
}

impl<S: KeyValueStore> Session<S> {
    /// Fresh session with default state; nothing is loaded until
    /// [`Session::load`] runs.
    pub fn new(catalog: Arc<Catalog>, saves: SaveAdapter<S>) -> Self {
        Self {
            economy: Economy::new(catalog),
            saves,
        }
    }

    pub fn economy(&self) -> &Economy {
        &self.economy
    }

    pub fn saves(&self) -> &SaveAdapter<S> {
        &self.saves
    }

    pub fn click(&mut self) -> f64 {
        self.economy.register_click()
    }

    pub fn buy_building(&mut self, id: &str) -> Purchase {
        self.economy.purchase_building(id)
    }

    pub fn buy_upgrade(&mut self, id: &str) -> Purchase {
        self.economy.purchase_upgrade(id)
    }

    /// Buy `id` as a building if the catalog has one by that name, otherwise
    /// as an upgrade.
    pub fn buy(&mut self, id: &str) -> Purchase {
        if self.economy.catalog().building(id).is_some() {
            self.buy_building(id)
        } else {
            self.buy_upgrade(id)
        }
    }

    pub fn advance(&mut self, delta_secs: f64) -> f64 {
        self.economy.advance(delta_secs)
    }

    /// Best-effort write of the current state.
    pub fn save(&mut self) -> bool {
        self.saves.save(self.economy.state())
    }

    /// Replace the in-memory state with the stored one, if any. Returns
    /// whether a save was applied.
    pub fn load(&mut self) -> bool {
        match self.saves.load(self.economy.catalog()) {
            Some(state) => {
                self.economy.restore(state);
                info!(
                    currency = self.economy.currency(),
                    rate = self.economy.total_generation_rate(),
                    "save loaded"
                );
                true
            }
            None => false,
        }
    }

    /// Wipe all progress and the stored snapshot.
    pub fn reset(&mut self) {
        self.economy.reset_all();
        self.saves.clear();
        info!("game reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use persistence::MemoryStore;

    fn session() -> Session<MemoryStore> {
        Session::new(
            Arc::new(Catalog::standard()),
            SaveAdapter::new(MemoryStore::new()),
        )
    }

    #[test]
    fn buy_dispatches_by_catalog() {
        let mut s = session();
        for _ in 0..10 {
            s.click();
        }
        assert!(s.buy("wallet").is_bought());
        assert_eq!(s.buy("click_1"), Purchase::Unaffordable { cost: 500.0 });
        assert_eq!(s.buy("nothing"), Purchase::UnknownId);
        assert_eq!(s.economy().owned("wallet"), 1);
    }

    #[test]
    fn save_load_restores_progress() {
        let mut s = session();
        for _ in 0..30 {
            s.click();
        }
        s.buy_building("wallet");
        assert!(s.save());
        let saved = s.economy().state().clone();

        for _ in 0..5 {
            s.click();
        }
        assert!(s.load());
        assert_eq!(s.economy().state(), &saved);
    }

    #[test]
    fn load_without_save_keeps_state() {
        let mut s = session();
        s.click();
        assert!(!s.load());
        assert_eq!(s.economy().currency(), 1.0);
    }

    #[test]
    fn reset_wipes_state_and_store() {
        let mut s = session();
        for _ in 0..40 {
            s.click();
        }
        s.buy_building("wallet");
        s.buy_upgrade("wallet_1");
        s.advance(12.0);
        assert!(s.save());

        s.reset();
        let state = s.economy().state();
        assert_eq!(state.currency, 0.0);
        assert_eq!(state.lifetime_total, 0.0);
        assert!(state.buildings.values().all(|b| b.owned == 0));
        assert!(state.upgrades.values().all(|u| !u.purchased));
        assert!(s.saves().load(s.economy().catalog()).is_none());
        assert!(s.saves().store().is_empty());
    }
}
