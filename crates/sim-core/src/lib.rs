#![deny(warnings)]

//! Core domain models and invariants for NimClickr.
//!
//! This crate defines the static catalog of buildings and upgrades, the
//! mutable player state, and validation helpers that guarantee the basic
//! invariants the economy engine relies on.

mod catalog;
mod state;

pub use catalog::{
    building_cost, generate_upgrades, standard_buildings, validate_building, validate_catalog,
    validate_upgrade, BuildingDef, BuildingId, Catalog, UnlockCondition, UpgradeDef, UpgradeId,
    UpgradeTarget, ValidationError, BUILDING_UNLOCK_STEPS, BUILDING_UPGRADE_COST_MULTIPLIERS,
    BUILDING_UPGRADE_MULTIPLIER, CLICK_RATE_SHARE, CLICK_UNLOCK_RATES, CLICK_UPGRADE_COSTS,
    CLICK_UPGRADE_MULTIPLIER, COST_SCALE, MIN_CLICK_YIELD,
};
pub use state::{validate_state, BuildingState, PlayerState, UpgradeState};
