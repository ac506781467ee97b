#![deny(warnings)]

//! Persistence layer: key-value stores and best-effort save snapshots.
//!
//! Saves are a cache, not a ledger. [`SaveAdapter`] never propagates store
//! or decoding failures to its caller; it logs them and reports "nothing
//! saved" / "nothing loaded" instead.

mod snapshot;
mod store;

pub use snapshot::{decode, OwnedEntry, PurchasedEntry, Recovered, SaveSnapshot, SnapshotError};
pub use store::{is_valid_key, FileStore, KeyValueStore, MemoryStore, StoreError};

use sim_core::{Catalog, PlayerState};
use tracing::{debug, warn};

/// Key under which the game state is stored.
pub const SAVE_KEY: &str = "nimclickr_save";

/// Returns the default directory used by [`FileStore`] for local saves.
pub fn default_store_dir() -> &'static str {
    "./saves"
}

/// Reads and writes [`PlayerState`] snapshots under one fixed key.
#[derive(Clone, Debug)]
pub struct SaveAdapter<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> SaveAdapter<S> {
    /// Adapter using [`SAVE_KEY`].
    pub fn new(store: S) -> Self {
        Self::with_key(store, SAVE_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Serialize `state` into the store. Returns whether the write succeeded.
    pub fn save(&mut self, state: &PlayerState) -> bool {
        let json = match SaveSnapshot::from_state(state).to_json() {
            Ok(json) => json,
            Err(e) => {
                warn!(key = %self.key, error = %e, "failed to encode save");
                return false;
            }
        };
        match self.store.set(&self.key, &json) {
            Ok(()) => {
                debug!(key = %self.key, bytes = json.len(), "game saved");
                true
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "failed to write save");
                false
            }
        }
    }

    /// Load the stored state. `None` when nothing is stored or the payload
    /// is unusable; partially readable payloads yield a state with the
    /// unreadable fields at their defaults.
    pub fn load(&self, catalog: &Catalog) -> Option<PlayerState> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %self.key, error = %e, "failed to read save");
                return None;
            }
        };
        match decode(&raw, catalog) {
            Ok(recovered) => {
                for field in &recovered.skipped {
                    warn!(key = %self.key, field = %field, "unreadable save field left at default");
                }
                Some(recovered.state)
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "corrupt save data, starting fresh");
                None
            }
        }
    }

    /// Remove the stored snapshot. Returns whether the removal succeeded.
    pub fn clear(&mut self) -> bool {
        match self.store.remove(&self.key) {
            Ok(()) => true,
            Err(e) => {
                warn!(key = %self.key, error = %e, "failed to clear save");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sim_econ::Economy;
    use std::io;
    use std::sync::Arc;

    /// Store whose every operation fails.
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(io::Error::new(io::ErrorKind::Other, "disk on fire").into())
        }
        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full").into())
        }
        fn remove(&mut self, _key: &str) -> Result<(), StoreError> {
            Err(io::Error::new(io::ErrorKind::Other, "read only").into())
        }
    }

    #[test]
    fn never_written_store_loads_nothing() {
        let saves = SaveAdapter::new(MemoryStore::new());
        assert_eq!(saves.key(), "nimclickr_save");
        assert!(saves.load(&Catalog::standard()).is_none());
    }

    #[test]
    fn save_then_load_round_trips() {
        let catalog = Arc::new(Catalog::standard());
        let mut econ = Economy::new(catalog.clone());
        for _ in 0..25 {
            econ.register_click();
        }
        econ.purchase_building("wallet");
        econ.purchase_building("wallet");
        econ.advance(3.7);

        let mut saves = SaveAdapter::new(MemoryStore::new());
        assert!(saves.save(econ.state()));
        assert_eq!(saves.load(&catalog).as_ref(), Some(econ.state()));
    }

    #[test]
    fn corrupt_payload_loads_nothing() {
        let mut store = MemoryStore::new();
        store.set(SAVE_KEY, "{\"currency\": 1,").unwrap();
        let saves = SaveAdapter::new(store);
        assert!(saves.load(&Catalog::standard()).is_none());
    }

    #[test]
    fn partial_payload_loads_what_it_can() {
        let mut store = MemoryStore::new();
        store
            .set(SAVE_KEY, r#"{"buildings":{"wallet":{"owned":12}}}"#)
            .unwrap();
        let saves = SaveAdapter::new(store);
        let state = saves.load(&Catalog::standard()).unwrap();
        assert_eq!(state.owned("wallet"), 12);
        assert_eq!(state.currency, 0.0);
        assert!(state.upgrades.values().all(|u| !u.purchased));
    }

    #[test]
    fn store_failures_are_swallowed() {
        let mut saves = SaveAdapter::new(BrokenStore);
        let state = PlayerState::new(&Catalog::standard());
        assert!(!saves.save(&state));
        assert!(saves.load(&Catalog::standard()).is_none());
        assert!(!saves.clear());
    }

    #[test]
    fn clear_removes_snapshot() {
        let catalog = Catalog::standard();
        let mut saves = SaveAdapter::with_key(MemoryStore::new(), "slot_a");
        assert!(saves.save(&PlayerState::new(&catalog)));
        assert!(saves.load(&catalog).is_some());
        assert!(saves.clear());
        assert!(saves.load(&catalog).is_none());
        assert!(saves.into_store().is_empty());
    }

    #[test]
    fn file_backed_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let catalog = Catalog::standard();
        let mut state = PlayerState::new(&catalog);
        state.currency = 1234.5678;
        state.lifetime_total = 99_999.25;
        state.upgrades.get_mut("marketing_2").unwrap().purchased = true;

        let mut saves = SaveAdapter::new(FileStore::new(tmp.path()));
        assert!(saves.save(&state));
        let reopened = SaveAdapter::new(FileStore::new(tmp.path()));
        assert_eq!(reopened.load(&catalog), Some(state));
    }

    proptest! {
        #[test]
        fn reachable_states_round_trip(
            clicks in 0u32..400,
            buys in prop::collection::vec(0usize..8, 0..30),
            secs in 0.0f64..10_000.0
        ) {
            let catalog = Arc::new(Catalog::standard());
            let mut econ = Economy::new(catalog.clone());
            for _ in 0..clicks {
                econ.register_click();
            }
            for i in buys {
                let id = catalog.buildings()[i].id.clone();
                econ.purchase_building(id.as_str());
                econ.advance(secs / 30.0);
            }
            let upgrades: Vec<_> = econ.unlocked_available_upgrades().iter().map(|u| u.id.clone()).collect();
            for id in upgrades {
                econ.purchase_upgrade(id.as_str());
            }

            let mut saves = SaveAdapter::new(MemoryStore::new());
            prop_assert!(saves.save(econ.state()));
            let loaded = saves.load(&catalog);
            prop_assert_eq!(loaded.as_ref(), Some(econ.state()));
        }
    }
}
