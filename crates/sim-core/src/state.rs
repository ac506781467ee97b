use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::{BuildingId, Catalog, UpgradeId, ValidationError};

/// Mutable per-building state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingState {
    /// Units owned; only ever incremented by a purchase.
    pub owned: u32,
}

/// Mutable per-upgrade state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeState {
    /// Set once on purchase, cleared only by a full reset.
    pub purchased: bool,
}

/// Root aggregate of everything the player has earned and bought.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Spendable currency.
    pub currency: f64,
    /// Currency ever earned; never decreases except on reset.
    pub lifetime_total: f64,
    /// One entry per catalog building.
    pub buildings: BTreeMap<BuildingId, BuildingState>,
    /// One entry per catalog upgrade.
    pub upgrades: BTreeMap<UpgradeId, UpgradeState>,
}

impl PlayerState {
    /// Fresh all-zero state with an entry for every id in `catalog`.
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            currency: 0.0,
            lifetime_total: 0.0,
            buildings: catalog
                .buildings()
                .iter()
                .map(|b| (b.id.clone(), BuildingState::default()))
                .collect(),
            upgrades: catalog
                .upgrades()
                .iter()
                .map(|u| (u.id.clone(), UpgradeState::default()))
                .collect(),
        }
    }

    /// Restore all-zero defaults in place.
    pub fn reset(&mut self, catalog: &Catalog) {
        *self = Self::new(catalog);
    }

    /// Units of `id` owned; 0 for unknown ids.
    pub fn owned(&self, id: &str) -> u32 {
        self.buildings.get(id).map_or(0, |b| b.owned)
    }

    /// Whether upgrade `id` has been bought; false for unknown ids.
    pub fn is_purchased(&self, id: &str) -> bool {
        self.upgrades.get(id).is_some_and(|u| u.purchased)
    }
}

/// Validate that `state` covers exactly the ids of `catalog` and holds
/// sane balances.
pub fn validate_state(state: &PlayerState, catalog: &Catalog) -> Result<(), ValidationError> {
    if !(state.currency.is_finite() && state.lifetime_total.is_finite()) {
        return Err(ValidationError::NonFinite("currency".to_string()));
    }
    if state.currency < 0.0 || state.lifetime_total < 0.0 {
        return Err(ValidationError::NegativeCurrency);
    }
    for b in catalog.buildings() {
        if !state.buildings.contains_key(b.id.as_str()) {
            return Err(ValidationError::MissingEntry(b.id.0.clone()));
        }
    }
    for u in catalog.upgrades() {
        if !state.upgrades.contains_key(u.id.as_str()) {
            return Err(ValidationError::MissingEntry(u.id.0.clone()));
        }
    }
    if let Some(id) = state
        .buildings
        .keys()
        .find(|id| catalog.building(id.as_str()).is_none())
    {
        return Err(ValidationError::UnknownEntry(id.0.clone()));
    }
    if let Some(id) = state
        .upgrades
        .keys()
        .find(|id| catalog.upgrade(id.as_str()).is_none())
    {
        return Err(ValidationError::UnknownEntry(id.0.clone()));
    }
    Ok(())
}
