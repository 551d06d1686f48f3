use super::baseline::{MinDkpMap, VacationList};
use super::domain::{DkpRun, Multipliers, PlayerSnapshotRow, RunOptions};
use super::engine::{DkpEngine, DkpInputs};
use super::penalties::PenaltyBook;
use super::store::{SettingsKey, SettingsStore, StoreError};
use super::tiers::PowerRanges;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Everything a run reads, plus the baseline map it writes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DkpSettings {
    pub multipliers: Multipliers,
    pub power_ranges: PowerRanges,
    pub vacation: VacationList,
    pub min_dkp: MinDkpMap,
    pub penalties: PenaltyBook,
}

impl DkpSettings {
    /// Loads every settings document; absent keys fall back to defaults.
    pub fn load<S: SettingsStore + ?Sized>(store: &S) -> Result<Self, StoreError> {
        Ok(Self {
            multipliers: load_key(store, SettingsKey::Multipliers)?.unwrap_or_default(),
            power_ranges: load_key(store, SettingsKey::PowerRanges)?.unwrap_or_default(),
            vacation: load_key(store, SettingsKey::VacationList)?.unwrap_or_default(),
            min_dkp: load_key(store, SettingsKey::MinDkp)?.unwrap_or_default(),
            penalties: load_key(store, SettingsKey::Penalties)?.unwrap_or_default(),
        })
    }

    pub fn save<S: SettingsStore + ?Sized>(
        &self,
        store: &S,
        key: SettingsKey,
    ) -> Result<(), StoreError> {
        debug!(key = key.as_str(), "persisting settings");
        store.save(key, self.encode_section(key)?)
    }

    /// Persists `keys` together; the store keeps all of them or none.
    pub fn save_sections<S: SettingsStore + ?Sized>(
        &self,
        store: &S,
        keys: &[SettingsKey],
    ) -> Result<(), StoreError> {
        let entries = keys
            .iter()
            .map(|key| self.encode_section(*key).map(|value| (*key, value)))
            .collect::<Result<Vec<_>, StoreError>>()?;
        debug!(sections = entries.len(), "persisting settings batch");
        store.save_many(entries)
    }

    pub fn save_all<S: SettingsStore + ?Sized>(&self, store: &S) -> Result<(), StoreError> {
        self.save_sections(store, &SettingsKey::ALL)
    }

    fn encode_section(&self, key: SettingsKey) -> Result<Value, StoreError> {
        match key {
            SettingsKey::Multipliers => encode(&self.multipliers),
            SettingsKey::PowerRanges => encode(&self.power_ranges),
            SettingsKey::VacationList => encode(&self.vacation),
            SettingsKey::MinDkp => encode(&self.min_dkp),
            SettingsKey::Penalties => encode(&self.penalties),
        }
    }

    /// Runs the engine against these settings, seeding new baselines into
    /// `min_dkp`. The borrows are split so only the baseline map is mutable.
    pub fn run(
        &mut self,
        start: &[PlayerSnapshotRow],
        end: &[PlayerSnapshotRow],
        options: RunOptions,
    ) -> DkpRun {
        let inputs = DkpInputs {
            multipliers: &self.multipliers,
            power_ranges: &self.power_ranges,
            vacation: &self.vacation,
            penalties: &self.penalties,
        };
        DkpEngine::new(inputs).run(start, end, &mut self.min_dkp, options)
    }

    pub fn export(&self) -> SettingsBundle {
        SettingsBundle {
            exported_at: Some(Utc::now()),
            multipliers: Some(self.multipliers),
            power_ranges: Some(self.power_ranges.clone()),
            vacation_list: Some(self.vacation.clone()),
            min_dkp: Some(self.min_dkp.clone()),
            penalties: Some(self.penalties.clone()),
        }
    }

    /// Replaces the sections present in `bundle` and reports which keys
    /// changed so the caller can persist them.
    pub fn apply_bundle(&mut self, bundle: SettingsBundle) -> Vec<SettingsKey> {
        let mut changed = Vec::new();
        if let Some(multipliers) = bundle.multipliers {
            self.multipliers = multipliers;
            changed.push(SettingsKey::Multipliers);
        }
        if let Some(power_ranges) = bundle.power_ranges {
            self.power_ranges = power_ranges;
            changed.push(SettingsKey::PowerRanges);
        }
        if let Some(vacation) = bundle.vacation_list {
            self.vacation = vacation;
            changed.push(SettingsKey::VacationList);
        }
        if let Some(min_dkp) = bundle.min_dkp {
            self.min_dkp = min_dkp;
            changed.push(SettingsKey::MinDkp);
        }
        if let Some(penalties) = bundle.penalties {
            self.penalties = penalties;
            changed.push(SettingsKey::Penalties);
        }
        changed
    }
}

/// Single JSON document bundling every settings section for export/import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsBundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multipliers: Option<Multipliers>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_ranges: Option<PowerRanges>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vacation_list: Option<VacationList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_dkp: Option<MinDkpMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penalties: Option<PenaltyBook>,
}

fn load_key<S, T>(store: &S, key: SettingsKey) -> Result<Option<T>, StoreError>
where
    S: SettingsStore + ?Sized,
    T: DeserializeOwned,
{
    match store.load(key)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|source| StoreError::Decode {
                key: key.as_str(),
                source,
            }),
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Value, StoreError> {
    serde_json::to_value(value).map_err(StoreError::Encode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::dkp::store::InMemorySettingsStore;
    use crate::workflows::dkp::tiers::PowerRange;
    use serde_json::json;

    #[test]
    fn load_defaults_when_store_is_empty() {
        let store = InMemorySettingsStore::default();
        let settings = DkpSettings::load(&store).expect("load defaults");
        assert_eq!(settings, DkpSettings::default());
    }

    #[test]
    fn saved_sections_load_back() {
        let store = InMemorySettingsStore::default();
        let mut settings = DkpSettings::default();
        settings.multipliers = Multipliers {
            t4: 10.0,
            t5: 20.0,
            deads: 5.0,
        };
        settings.power_ranges = PowerRanges::new(vec![PowerRange::new(0, None, 0.4)]).expect("valid tier");
        settings.vacation = VacationList::parse("1,2");
        settings.min_dkp.insert_if_absent("1", 4000);
        settings.save_all(&store).expect("save all");

        let loaded = DkpSettings::load(&store).expect("reload");
        assert_eq!(loaded, settings);
    }

    #[test]
    fn invalid_stored_section_reports_its_key() {
        let store = InMemorySettingsStore::default();
        store
            .save(SettingsKey::PowerRanges, json!({"not": "a list"}))
            .expect("seed");

        match DkpSettings::load(&store) {
            Err(StoreError::Decode { key, .. }) => assert_eq!(key, "power_ranges"),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn stored_ranges_are_validated_on_load() {
        let store = InMemorySettingsStore::default();
        store
            .save(
                SettingsKey::PowerRanges,
                json!([{"min_power": 1000, "max_power": 10, "percentage": 0.5}]),
            )
            .expect("seed");

        match DkpSettings::load(&store) {
            Err(StoreError::Decode { key, .. }) => assert_eq!(key, "power_ranges"),
            other => panic!("expected decode error, got {other:?}"),
        }

        let bundle = serde_json::from_value::<SettingsBundle>(json!({
            "power_ranges": [{"min_power": 0, "max_power": 0, "percentage": 0.5}]
        }));
        assert!(bundle.is_err());
    }

    #[test]
    fn bundle_import_only_touches_present_sections() {
        let mut settings = DkpSettings::default();
        settings.vacation = VacationList::parse("9");

        let bundle: SettingsBundle = serde_json::from_value(json!({
            "multipliers": {"t4": 1, "t5": 2, "deads": 3},
            "min_dkp": {"5": 750}
        }))
        .expect("parse bundle");
        let changed = settings.apply_bundle(bundle);

        assert_eq!(changed, vec![SettingsKey::Multipliers, SettingsKey::MinDkp]);
        assert_eq!(settings.multipliers.deads, 3.0);
        assert_eq!(settings.min_dkp.get("5"), Some(750));
        assert!(settings.vacation.contains("9"));
    }

    #[test]
    fn export_includes_every_section() {
        let settings = DkpSettings::default();
        let value = serde_json::to_value(settings.export()).expect("serialize bundle");
        for key in SettingsKey::ALL {
            assert!(value.get(key.as_str()).is_some(), "missing {}", key.as_str());
        }
        assert!(value.get("exported_at").is_some());
    }
}
