use serde::Serialize;
use serde_json::{Map, Value};
use sim_core::{Catalog, PlayerState};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct OwnedEntry {
    pub owned: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PurchasedEntry {
    pub purchased: bool,
}

/// On-disk shape of a save. Reading goes through [`decode`], which
/// tolerates partial and legacy payloads.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSnapshot {
    pub currency: f64,
    pub lifetime_total: f64,
    pub buildings: BTreeMap<String, OwnedEntry>,
    pub upgrades: BTreeMap<String, PurchasedEntry>,
}

impl SaveSnapshot {
    pub fn from_state(state: &PlayerState) -> Self {
        Self {
            currency: state.currency,
            lifetime_total: state.lifetime_total,
            buildings: state
                .buildings
                .iter()
                .map(|(id, b)| (id.0.clone(), OwnedEntry { owned: b.owned }))
                .collect(),
            upgrades: state
                .upgrades
                .iter()
                .map(|(id, u)| {
                    (
                        id.0.clone(),
                        PurchasedEntry {
                            purchased: u.purchased,
                        },
                    )
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Save payloads that cannot be used at all.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot root must be a JSON object")]
    NotAnObject,
}

/// A state rebuilt from a save, with the fields that had to be left at
/// their defaults.
#[derive(Clone, Debug, PartialEq)]
pub struct Recovered {
    pub state: PlayerState,
    /// Dotted paths of missing or malformed fields, e.g. `buildings.wallet`.
    pub skipped: Vec<String>,
}

/// Rebuild a [`PlayerState`] from `raw`, applying every recognized field on
/// its own. Ids the catalog does not know are ignored; malformed fields keep
/// their defaults and are reported in [`Recovered::skipped`].
///
/// Field names written by older builds (`transactions`, `totalTransactions`)
/// are accepted as well.
pub fn decode(raw: &str, catalog: &Catalog) -> Result<Recovered, SnapshotError> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Object(root) = value else {
        return Err(SnapshotError::NotAnObject);
    };
    let mut state = PlayerState::new(catalog);
    let mut skipped = Vec::new();

    match field(&root, &["currency", "transactions"]).and_then(amount) {
        Some(v) => state.currency = v,
        None => skipped.push("currency".to_string()),
    }
    match field(&root, &["lifetimeTotal", "totalTransactions"]).and_then(amount) {
        Some(v) => state.lifetime_total = v,
        None => skipped.push("lifetimeTotal".to_string()),
    }

    match root.get("buildings") {
        Some(Value::Object(entries)) => {
            for (id, entry) in entries {
                let Some(slot) = state.buildings.get_mut(id.as_str()) else {
                    continue;
                };
                match entry.get("owned").and_then(count) {
                    Some(owned) => slot.owned = owned,
                    None => skipped.push(format!("buildings.{id}")),
                }
            }
        }
        _ => skipped.push("buildings".to_string()),
    }

    match root.get("upgrades") {
        Some(Value::Object(entries)) => {
            for (id, entry) in entries {
                let Some(slot) = state.upgrades.get_mut(id.as_str()) else {
                    continue;
                };
                match entry.get("purchased").and_then(Value::as_bool) {
                    Some(purchased) => slot.purchased = purchased,
                    None => skipped.push(format!("upgrades.{id}")),
                }
            }
        }
        _ => skipped.push("upgrades".to_string()),
    }

    Ok(Recovered { state, skipped })
}

fn field<'a>(root: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| root.get(*name))
}

fn amount(value: &Value) -> Option<f64> {
    value.as_f64().filter(|v| v.is_finite() && *v >= 0.0)
}

fn count(value: &Value) -> Option<u32> {
    if let Some(n) = value.as_u64() {
        return u32::try_from(n).ok();
    }
    // Whole numbers written with a fractional part, e.g. `3.0`.
    value
        .as_f64()
        .filter(|v| v.fract() == 0.0 && *v >= 0.0 && *v <= f64::from(u32::MAX))
        .map(|v| v as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::standard()
    }

    #[test]
    fn encodes_documented_field_names() {
        let mut state = PlayerState::new(&catalog());
        state.currency = 12.5;
        state.buildings.get_mut("wallet").unwrap().owned = 2;
        let json = SaveSnapshot::from_state(&state).to_json().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["currency"], 12.5);
        assert_eq!(value["lifetimeTotal"], 0.0);
        assert_eq!(value["buildings"]["wallet"]["owned"], 2);
        assert_eq!(value["upgrades"]["click_1"]["purchased"], false);
        assert_eq!(value["upgrades"].as_object().unwrap().len(), 93);
    }

    #[test]
    fn missing_upgrades_keep_defaults() {
        let raw = r#"{"currency":5,"lifetimeTotal":9,"buildings":{"wallet":{"owned":4}}}"#;
        let rec = decode(raw, &catalog()).unwrap();
        assert_eq!(rec.state.currency, 5.0);
        assert_eq!(rec.state.lifetime_total, 9.0);
        assert_eq!(rec.state.owned("wallet"), 4);
        assert!(rec.state.upgrades.values().all(|u| !u.purchased));
        assert_eq!(rec.skipped, vec!["upgrades".to_string()]);
    }

    #[test]
    fn accepts_legacy_field_names() {
        let raw = r#"{"transactions":12.5,"totalTransactions":40,
            "buildings":{"faucet":{"owned":3}},
            "upgrades":{"click_1":{"purchased":true}}}"#;
        let rec = decode(raw, &catalog()).unwrap();
        assert_eq!(rec.state.currency, 12.5);
        assert_eq!(rec.state.lifetime_total, 40.0);
        assert_eq!(rec.state.owned("faucet"), 3);
        assert!(rec.state.is_purchased("click_1"));
        assert!(rec.skipped.is_empty());
    }

    #[test]
    fn ignores_ids_outside_catalog() {
        let raw = r#"{"currency":1,"lifetimeTotal":1,
            "buildings":{"mainframe":{"owned":7},"dapp":{"owned":1}},
            "upgrades":{"mainframe_1":{"purchased":true}}}"#;
        let rec = decode(raw, &catalog()).unwrap();
        assert_eq!(rec.state.owned("dapp"), 1);
        assert!(!rec.state.buildings.contains_key("mainframe"));
        assert!(!rec.state.upgrades.contains_key("mainframe_1"));
        assert!(rec.skipped.is_empty());
    }

    #[test]
    fn malformed_fields_fall_back_individually() {
        let raw = r#"{"currency":-4,"lifetimeTotal":"lots",
            "buildings":{"wallet":{"owned":-1},"faucet":{"owned":2.0},"dapp":null,"spammer":{"owned":6}},
            "upgrades":{"click_1":{"purchased":"yes"},"click_2":{"purchased":true}}}"#;
        let rec = decode(raw, &catalog()).unwrap();
        assert_eq!(rec.state.currency, 0.0);
        assert_eq!(rec.state.lifetime_total, 0.0);
        assert_eq!(rec.state.owned("wallet"), 0);
        assert_eq!(rec.state.owned("faucet"), 2);
        assert_eq!(rec.state.owned("dapp"), 0);
        assert_eq!(rec.state.owned("spammer"), 6);
        assert!(!rec.state.is_purchased("click_1"));
        assert!(rec.state.is_purchased("click_2"));
        assert_eq!(
            rec.skipped,
            vec![
                "currency",
                "lifetimeTotal",
                "buildings.dapp",
                "buildings.wallet",
                "upgrades.click_1",
            ]
        );
    }

    #[test]
    fn unusable_payloads_are_errors() {
        assert!(matches!(
            decode("{not json", &catalog()),
            Err(SnapshotError::Json(_))
        ));
        assert!(matches!(
            decode("[1,2,3]", &catalog()),
            Err(SnapshotError::NotAnObject)
        ));
        assert!(matches!(
            decode("null", &catalog()),
            Err(SnapshotError::NotAnObject)
        ));
    }
}
