#![deny(warnings)]

//! Economy engine for NimClickr.
//!
//! [`Economy`] owns one [`PlayerState`] and a shared read-only [`Catalog`].
//! It provides:
//! - Derived quantities (building multipliers, generation rate, click yield,
//!   unlocked upgrades), recomputed from state on every read
//! - Player actions (click, building and upgrade purchases) that degrade to
//!   no-ops instead of failing
//! - Time advance driven by an external scheduler

use serde::Serialize;
use sim_core::{
    building_cost, validate_state, BuildingId, Catalog, PlayerState, UnlockCondition, UpgradeDef,
    UpgradeTarget, CLICK_RATE_SHARE, MIN_CLICK_YIELD,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of a purchase attempt. Anything but [`Purchase::Bought`] left the
/// state untouched.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Purchase {
    /// Currency was debited by `cost`.
    Bought { cost: f64 },
    /// Currency was below `cost`.
    Unaffordable { cost: f64 },
    /// One-shot upgrade already owned.
    AlreadyPurchased,
    /// Id not present in the catalog.
    UnknownId,
}

impl Purchase {
    pub fn is_bought(&self) -> bool {
        matches!(self, Purchase::Bought { .. })
    }
}

/// Point-in-time summary of the economy for display consumers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EconomyStats {
    pub currency: f64,
    pub lifetime_total: f64,
    /// Currency per second from all buildings.
    pub generation_rate: f64,
    pub click_yield: f64,
    /// Number of unlocked, not yet purchased upgrades.
    pub available_upgrades: usize,
}

/// The economy model: player state plus every rule that reads or mutates it.
#[derive(Clone, Debug)]
pub struct Economy {
    catalog: Arc<Catalog>,
    state: PlayerState,
}

impl Economy {
    /// New economy with all-zero state.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        let state = PlayerState::new(&catalog);
        Self { catalog, state }
    }

    /// New economy seeded from `state` (see [`Economy::restore`]).
    pub fn with_state(catalog: Arc<Catalog>, state: PlayerState) -> Self {
        let mut economy = Self::new(catalog);
        economy.restore(state);
        economy
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    pub fn currency(&self) -> f64 {
        self.state.currency
    }

    pub fn lifetime_total(&self) -> f64 {
        self.state.lifetime_total
    }

    pub fn owned(&self, building: &str) -> u32 {
        self.state.owned(building)
    }

    pub fn is_purchased(&self, upgrade: &str) -> bool {
        self.state.is_purchased(upgrade)
    }

    /// Price of the next unit of `building`, or `None` for unknown ids.
    pub fn current_cost(&self, building: &str) -> Option<f64> {
        let def = self.catalog.building(building)?;
        Some(building_cost(def.base_cost, self.state.owned(building)))
    }

    /// Product of the multipliers of every purchased upgrade targeting
    /// `building`; 1 when none apply.
    pub fn building_multiplier(&self, building: &str) -> f64 {
        self.catalog
            .upgrades()
            .iter()
            .filter(|u| matches!(&u.target, UpgradeTarget::Building(id) if id.as_str() == building))
            .filter(|u| self.state.is_purchased(u.id.as_str()))
            .map(|u| u.multiplier)
            .product()
    }

    /// Multiplier of every catalog building, computed in a single pass.
    pub fn building_multipliers(&self) -> BTreeMap<BuildingId, f64> {
        let mut mults: BTreeMap<BuildingId, f64> = self
            .catalog
            .buildings()
            .iter()
            .map(|b| (b.id.clone(), 1.0))
            .collect();
        for upgrade in self.catalog.upgrades() {
            if let UpgradeTarget::Building(id) = &upgrade.target {
                if self.state.is_purchased(upgrade.id.as_str()) {
                    if let Some(m) = mults.get_mut(id.as_str()) {
                        *m *= upgrade.multiplier;
                    }
                }
            }
        }
        mults
    }

    /// Currency generated per second by all owned buildings.
    pub fn total_generation_rate(&self) -> f64 {
        let mults = self.building_multipliers();
        self.catalog
            .buildings()
            .iter()
            .filter_map(|b| {
                let owned = self.state.owned(b.id.as_str());
                if owned == 0 {
                    return None;
                }
                let mult = mults.get(b.id.as_str()).copied().unwrap_or(1.0);
                Some(f64::from(owned) * b.base_rate * mult)
            })
            .sum()
    }

    /// Currency granted per click:
    /// `max(MIN_CLICK_YIELD, rate * CLICK_RATE_SHARE) * click multipliers`.
    pub fn click_yield(&self) -> f64 {
        let multiplier: f64 = self
            .catalog
            .upgrades()
            .iter()
            .filter(|u| u.target == UpgradeTarget::Click)
            .filter(|u| self.state.is_purchased(u.id.as_str()))
            .map(|u| u.multiplier)
            .product();
        (self.total_generation_rate() * CLICK_RATE_SHARE).max(MIN_CLICK_YIELD) * multiplier
    }

    /// Upgrades whose unlock condition holds and which are not yet purchased,
    /// in catalog order.
    pub fn unlocked_available_upgrades(&self) -> Vec<&UpgradeDef> {
        let rate = self.total_generation_rate();
        self.catalog
            .upgrades()
            .iter()
            .filter(|u| !self.state.is_purchased(u.id.as_str()))
            .filter(|u| match &u.unlock {
                UnlockCondition::Owned { building, count } => {
                    self.state.owned(building.as_str()) >= *count
                }
                UnlockCondition::GenerationRate { rate: threshold } => rate >= *threshold,
            })
            .collect()
    }

    pub fn stats(&self) -> EconomyStats {
        EconomyStats {
            currency: self.state.currency,
            lifetime_total: self.state.lifetime_total,
            generation_rate: self.total_generation_rate(),
            click_yield: self.click_yield(),
            available_upgrades: self.unlocked_available_upgrades().len(),
        }
    }

    /// Credit one manual click. Returns the amount earned.
    pub fn register_click(&mut self) -> f64 {
        let earned = self.click_yield();
        self.credit(earned);
        earned
    }

    /// Buy one unit of `building` at its current price.
    pub fn purchase_building(&mut self, building: &str) -> Purchase {
        let Some(cost) = self.current_cost(building) else {
            debug!(building, "unknown building, ignoring purchase");
            return Purchase::UnknownId;
        };
        if self.state.currency < cost {
            debug!(building, cost, currency = self.state.currency, "cannot afford building");
            return Purchase::Unaffordable { cost };
        }
        let Some(entry) = self.state.buildings.get_mut(building) else {
            return Purchase::UnknownId;
        };
        entry.owned += 1;
        self.state.currency -= cost;
        debug!(building, cost, owned = entry.owned, "bought building");
        Purchase::Bought { cost }
    }

    /// Buy upgrade `upgrade`.
    ///
    /// The unlock condition is advisory: it is not re-checked here, callers
    /// are expected to offer only what [`Economy::unlocked_available_upgrades`]
    /// returns.
    pub fn purchase_upgrade(&mut self, upgrade: &str) -> Purchase {
        let Some(def) = self.catalog.upgrade(upgrade) else {
            debug!(upgrade, "unknown upgrade, ignoring purchase");
            return Purchase::UnknownId;
        };
        let cost = def.cost;
        let Some(entry) = self.state.upgrades.get_mut(upgrade) else {
            return Purchase::UnknownId;
        };
        if entry.purchased {
            return Purchase::AlreadyPurchased;
        }
        if self.state.currency < cost {
            debug!(upgrade, cost, currency = self.state.currency, "cannot afford upgrade");
            return Purchase::Unaffordable { cost };
        }
        entry.purchased = true;
        self.state.currency -= cost;
        debug!(upgrade, cost, "bought upgrade");
        Purchase::Bought { cost }
    }

    /// Accrue `rate * delta_secs`. Returns the amount earned.
    ///
    /// Negative and non-finite deltas are clamped to zero.
    pub fn advance(&mut self, delta_secs: f64) -> f64 {
        if !delta_secs.is_finite() || delta_secs < 0.0 {
            warn!(delta_secs, "invalid time delta, clamping to zero");
            return 0.0;
        }
        let earned = self.total_generation_rate() * delta_secs;
        self.credit(earned);
        earned
    }

    /// Wipe all progress back to defaults. Clearing any stored snapshot is
    /// the caller's job.
    pub fn reset_all(&mut self) {
        self.state.reset(&self.catalog);
    }

    /// Replace the current state. Entries for ids unknown to the catalog are
    /// dropped, missing ids keep their defaults, and negative or non-finite
    /// balances are reset to zero.
    pub fn restore(&mut self, state: PlayerState) {
        let mut next = PlayerState::new(&self.catalog);
        next.currency = state.currency;
        next.lifetime_total = state.lifetime_total;
        for (id, building) in state.buildings {
            if let Some(slot) = next.buildings.get_mut(id.as_str()) {
                *slot = building;
            }
        }
        for (id, upgrade) in state.upgrades {
            if let Some(slot) = next.upgrades.get_mut(id.as_str()) {
                *slot = upgrade;
            }
        }
        if let Err(e) = validate_state(&next, &self.catalog) {
            warn!(error = %e, "restored balances out of range, zeroing them");
            next.currency = sane_amount(next.currency);
            next.lifetime_total = sane_amount(next.lifetime_total);
        }
        debug_assert!(validate_state(&next, &self.catalog).is_ok());
        self.state = next;
    }

    fn credit(&mut self, amount: f64) {
        self.state.currency += amount;
        self.state.lifetime_total += amount;
    }
}

fn sane_amount(v: f64) -> f64 {
    if v.is_finite() && v >= 0.0 {
        v
    } else {
        0.0
    }
}
