use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Growth factor applied to a building's price for every unit already owned.
pub const COST_SCALE: f64 = 1.10;

/// Owned-count thresholds unlocking building upgrade levels 1 through 11.
pub const BUILDING_UNLOCK_STEPS: [u32; 11] = [15, 30, 50, 75, 100, 150, 200, 250, 300, 400, 500];

/// Upgrade price per level as a multiple of the building's base cost.
/// Aligned 1:1 with [`BUILDING_UNLOCK_STEPS`].
pub const BUILDING_UPGRADE_COST_MULTIPLIERS: [f64; 11] = [
    10.0,
    50.0,
    150.0,
    500.0,
    1_500.0,
    5_000.0,
    15_000.0,
    50_000.0,
    150_000.0,
    500_000.0,
    1_500_000.0,
];

/// Generation multiplier granted by every building upgrade level.
pub const BUILDING_UPGRADE_MULTIPLIER: f64 = 1.5;

/// Generation-rate thresholds unlocking the click upgrades.
pub const CLICK_UNLOCK_RATES: [f64; 5] = [100.0, 1_000.0, 10_000.0, 100_000.0, 1_000_000.0];

/// Click upgrade prices, aligned 1:1 with [`CLICK_UNLOCK_RATES`].
pub const CLICK_UPGRADE_COSTS: [f64; 5] = [500.0, 5_000.0, 50_000.0, 500_000.0, 5_000_000.0];

/// Click yield multiplier granted by every click upgrade.
pub const CLICK_UPGRADE_MULTIPLIER: f64 = 2.0;

/// Share of the generation rate a single click is worth before click upgrades.
pub const CLICK_RATE_SHARE: f64 = 0.5;

/// Lower bound on the base click yield.
pub const MIN_CLICK_YIELD: f64 = 1.0;

/// Unique identifier for a building, e.g. "wallet".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildingId(pub String);

/// Unique identifier for an upgrade, e.g. "wallet_3" or "click_1".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpgradeId(pub String);

macro_rules! string_id {
    ($ty:ident) => {
        impl $ty {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $ty {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        // Lets maps keyed by the id be queried with a plain `&str`.
        impl Borrow<str> for $ty {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(BuildingId);
string_id!(UpgradeId);

/// A purchasable, repeatable generator of currency.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuildingDef {
    /// Building identifier.
    pub id: BuildingId,
    /// Display name.
    pub name: String,
    /// Price of the first unit.
    pub base_cost: f64,
    /// Currency generated per second by one unit before upgrades (> 0).
    pub base_rate: f64,
    /// Flavour text for display.
    pub description: String,
}

/// What an upgrade multiplies once purchased.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "building", rename_all = "snake_case")]
pub enum UpgradeTarget {
    /// Generation rate of a single building.
    Building(BuildingId),
    /// Manual click yield.
    Click,
}

/// Predicate gating when an upgrade is offered for purchase.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UnlockCondition {
    /// At least `count` units of `building` owned.
    Owned { building: BuildingId, count: u32 },
    /// Total generation rate at or above `rate`.
    GenerationRate { rate: f64 },
}

/// A one-shot purchasable modifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpgradeDef {
    /// Upgrade identifier.
    pub id: UpgradeId,
    /// Display name, e.g. "Wallet Lv.3".
    pub name: String,
    /// Display description.
    pub description: String,
    /// Fixed price.
    pub cost: f64,
    /// Building or click target.
    pub target: UpgradeTarget,
    /// Factor applied to the target once purchased (>= 1).
    pub multiplier: f64,
    /// Condition under which the upgrade is offered.
    pub unlock: UnlockCondition,
}

/// Current price of the next unit: `floor(base * COST_SCALE^owned)`.
///
/// Example:
/// assert_eq!(building_cost(10.0, 0), 10.0);
/// assert_eq!(building_cost(10.0, 1), 11.0);
pub fn building_cost(base_cost: f64, owned: u32) -> f64 {
    (base_cost * COST_SCALE.powf(f64::from(owned))).floor()
}

/// The eight buildings shipped with the game, cheapest first.
pub fn standard_buildings() -> Vec<BuildingDef> {
    const ROWS: [(&str, &str, f64, f64, &str); 8] = [
        ("wallet", "Wallet", 10.0, 0.1, "Transactions are signed manually."),
        ("faucet", "Faucet", 100.0, 0.5, "Drips tokens, one tx at a time."),
        ("dapp", "DApp", 1_000.0, 5.0, "On-chain activity from app users."),
        ("marketing", "Marketing", 8_000.0, 40.0, "Campaigns attract new users."),
        ("spammer", "Spammer", 75_000.0, 300.0, "Bots flood the mempool with txs."),
        ("exchange", "Exchange", 500_000.0, 2_000.0, "High-frequency trading volume."),
        ("market_maker", "Market Maker", 5_000_000.0, 15_000.0, "Algo bots placing continuous orders."),
        ("use_case", "Use Case", 50_000_000.0, 100_000.0, "Killer app drives mass adoption."),
    ];
    ROWS.iter()
        .map(|&(id, name, base_cost, base_rate, description)| BuildingDef {
            id: BuildingId::new(id),
            name: name.to_string(),
            base_cost,
            base_rate,
            description: description.to_string(),
        })
        .collect()
}

/// Generate the upgrade catalog for `buildings`: every building gets one
/// upgrade per entry of [`BUILDING_UNLOCK_STEPS`] (building order, then level
/// order), followed by the click upgrades.
pub fn generate_upgrades(buildings: &[BuildingDef]) -> Vec<UpgradeDef> {
    let mut upgrades =
        Vec::with_capacity(buildings.len() * BUILDING_UNLOCK_STEPS.len() + CLICK_UNLOCK_RATES.len());

    for building in buildings {
        let levels = BUILDING_UNLOCK_STEPS
            .iter()
            .zip(BUILDING_UPGRADE_COST_MULTIPLIERS.iter());
        for (index, (&required, &cost_mul)) in levels.enumerate() {
            let level = index + 1;
            upgrades.push(UpgradeDef {
                id: UpgradeId(format!("{}_{}", building.id, level)),
                name: format!("{} Lv.{}", building.name, level),
                description: format!(
                    "{} TPS x{} (requires {} owned)",
                    building.name, BUILDING_UPGRADE_MULTIPLIER, required
                ),
                cost: (building.base_cost * cost_mul).floor(),
                target: UpgradeTarget::Building(building.id.clone()),
                multiplier: BUILDING_UPGRADE_MULTIPLIER,
                unlock: UnlockCondition::Owned {
                    building: building.id.clone(),
                    count: required,
                },
            });
        }
    }

    let clicks = CLICK_UNLOCK_RATES.iter().zip(CLICK_UPGRADE_COSTS.iter());
    for (index, (&rate, &cost)) in clicks.enumerate() {
        let level = index + 1;
        upgrades.push(UpgradeDef {
            id: UpgradeId(format!("click_{level}")),
            name: format!("Click Power Lv.{level}"),
            description: format!("Double click power (requires {rate} TPS)"),
            cost,
            target: UpgradeTarget::Click,
            multiplier: CLICK_UPGRADE_MULTIPLIER,
            unlock: UnlockCondition::GenerationRate { rate },
        });
    }
    upgrades
}

/// Read-only definitions of every building and upgrade, in catalog order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Catalog {
    buildings: Vec<BuildingDef>,
    upgrades: Vec<UpgradeDef>,
}

impl Catalog {
    /// Build a custom catalog, rejecting definitions that break engine invariants.
    pub fn new(
        buildings: Vec<BuildingDef>,
        upgrades: Vec<UpgradeDef>,
    ) -> Result<Self, ValidationError> {
        let catalog = Self {
            buildings,
            upgrades,
        };
        validate_catalog(&catalog)?;
        Ok(catalog)
    }

    /// The shipped catalog: 8 buildings and 8 x 11 + 5 upgrades.
    pub fn standard() -> Self {
        let buildings = standard_buildings();
        let upgrades = generate_upgrades(&buildings);
        Self {
            buildings,
            upgrades,
        }
    }

    pub fn buildings(&self) -> &[BuildingDef] {
        &self.buildings
    }

    pub fn upgrades(&self) -> &[UpgradeDef] {
        &self.upgrades
    }

    /// Look up a building by id.
    pub fn building(&self, id: &str) -> Option<&BuildingDef> {
        self.buildings.iter().find(|b| b.id.as_str() == id)
    }

    /// Look up an upgrade by id.
    pub fn upgrade(&self, id: &str) -> Option<&UpgradeDef> {
        self.upgrades.iter().find(|u| u.id.as_str() == id)
    }
}

/// Validation errors for catalog and state invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Identifiers must be non-blank.
    #[error("identifier must not be empty")]
    EmptyId,
    /// Two buildings share an id.
    #[error("duplicate building id: {0}")]
    DuplicateBuilding(String),
    /// Two upgrades share an id.
    #[error("duplicate upgrade id: {0}")]
    DuplicateUpgrade(String),
    /// An upgrade targets or is gated on a building that does not exist.
    #[error("upgrade {upgrade} references unknown building {building}")]
    UnknownBuilding { upgrade: String, building: String },
    /// Numeric field must be finite.
    #[error("non-finite numeric value encountered in {0}")]
    NonFinite(String),
    /// Costs must be strictly positive.
    #[error("cost of {0} must be > 0")]
    NonPositiveCost(String),
    /// Base generation rates must be strictly positive.
    #[error("generation rate of {0} must be > 0")]
    NonPositiveRate(String),
    /// Multipliers below 1 would let a purchase lower generation.
    #[error("multiplier of {0} must be >= 1")]
    MultiplierBelowOne(String),
    /// Generation-rate unlock thresholds must be non-negative.
    #[error("unlock threshold of {0} must be >= 0")]
    NegativeThreshold(String),
    /// Player state lacks an entry for a catalog id.
    #[error("state has no entry for {0}")]
    MissingEntry(String),
    /// Player state carries an id the catalog does not know.
    #[error("state has an entry for unknown id {0}")]
    UnknownEntry(String),
    /// Currency balances must be non-negative.
    #[error("negative currency value is invalid")]
    NegativeCurrency,
}

/// Validate a building definition.
pub fn validate_building(b: &BuildingDef) -> Result<(), ValidationError> {
    if b.id.0.trim().is_empty() {
        return Err(ValidationError::EmptyId);
    }
    if !(b.base_cost.is_finite() && b.base_rate.is_finite()) {
        return Err(ValidationError::NonFinite(b.id.0.clone()));
    }
    if b.base_cost <= 0.0 {
        return Err(ValidationError::NonPositiveCost(b.id.0.clone()));
    }
    if b.base_rate <= 0.0 {
        return Err(ValidationError::NonPositiveRate(b.id.0.clone()));
    }
    Ok(())
}

/// Validate an upgrade definition in isolation (cross-references are
/// checked by [`validate_catalog`]).
pub fn validate_upgrade(u: &UpgradeDef) -> Result<(), ValidationError> {
    if u.id.0.trim().is_empty() {
        return Err(ValidationError::EmptyId);
    }
    if !(u.cost.is_finite() && u.multiplier.is_finite()) {
        return Err(ValidationError::NonFinite(u.id.0.clone()));
    }
    if u.cost <= 0.0 {
        return Err(ValidationError::NonPositiveCost(u.id.0.clone()));
    }
    if u.multiplier < 1.0 {
        return Err(ValidationError::MultiplierBelowOne(u.id.0.clone()));
    }
    if let UnlockCondition::GenerationRate { rate } = u.unlock {
        if !rate.is_finite() {
            return Err(ValidationError::NonFinite(u.id.0.clone()));
        }
        if rate < 0.0 {
            return Err(ValidationError::NegativeThreshold(u.id.0.clone()));
        }
    }
    Ok(())
}

/// Validate the whole catalog, including unique ids and building references.
pub fn validate_catalog(catalog: &Catalog) -> Result<(), ValidationError> {
    let mut building_ids: BTreeSet<&str> = BTreeSet::new();
    for b in &catalog.buildings {
        validate_building(b)?;
        if !building_ids.insert(b.id.as_str()) {
            return Err(ValidationError::DuplicateBuilding(b.id.0.clone()));
        }
    }

    let mut upgrade_ids: BTreeSet<&str> = BTreeSet::new();
    for u in &catalog.upgrades {
        validate_upgrade(u)?;
        if !upgrade_ids.insert(u.id.as_str()) {
            return Err(ValidationError::DuplicateUpgrade(u.id.0.clone()));
        }
        let referenced = [
            match &u.target {
                UpgradeTarget::Building(id) => Some(id),
                UpgradeTarget::Click => None,
            },
            match &u.unlock {
                UnlockCondition::Owned { building, .. } => Some(building),
                UnlockCondition::GenerationRate { .. } => None,
            },
        ];
        for building in referenced.into_iter().flatten() {
            if !building_ids.contains(building.as_str()) {
                return Err(ValidationError::UnknownBuilding {
                    upgrade: u.id.0.clone(),
                    building: building.0.clone(),
                });
            }
        }
    }
    Ok(())
}
