use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::baseline::VacationList;
use super::domain::{DkpRun, Multipliers, PlayerSnapshotRow, RunOptions};
use super::penalties::{PenaltyBook, PenaltyError, PenaltyRequest, PenaltyRule};
use super::settings::{DkpSettings, SettingsBundle};
use super::store::{SettingsKey, SettingsStore, StoreError};
use super::tiers::{PowerRange, PowerRangeError, PowerRanges};

/// A completed run as retained by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub calculated_at: DateTime<Utc>,
    pub options: RunOptions,
    pub run: DkpRun,
}

/// Service owning the settings state, its store, and the latest results.
///
/// Every run and mutation goes through one lock, so baseline assignment and
/// penalty capture never interleave.
pub struct DkpService<S> {
    store: Arc<S>,
    state: Mutex<ServiceState>,
}

struct ServiceState {
    settings: DkpSettings,
    latest: Option<RunReport>,
}

impl<S> DkpService<S>
where
    S: SettingsStore + 'static,
{
    /// Builds the service from whatever the store currently holds.
    pub fn load(store: Arc<S>) -> Result<Self, DkpServiceError> {
        let settings = DkpSettings::load(store.as_ref())?;
        info!(
            power_ranges = settings.power_ranges.len(),
            baselines = settings.min_dkp.len(),
            penalties = settings.penalties.rule_count(),
            "dkp settings loaded"
        );
        Ok(Self::with_settings(store, settings))
    }

    pub fn with_settings(store: Arc<S>, settings: DkpSettings) -> Self {
        Self {
            store,
            state: Mutex::new(ServiceState {
                settings,
                latest: None,
            }),
        }
    }

    /// Scores two snapshots, persists any new baselines, and keeps the
    /// result as the latest run.
    pub fn run(
        &self,
        start: &[PlayerSnapshotRow],
        end: &[PlayerSnapshotRow],
        options: RunOptions,
    ) -> Result<RunReport, DkpServiceError> {
        let mut state = self.state()?;
        let mut draft = state.settings.clone();
        let known_baselines = draft.min_dkp.len();
        let run = draft.run(start, end, options);

        if draft.min_dkp.len() != known_baselines {
            draft.save(self.store.as_ref(), SettingsKey::MinDkp)?;
        }

        let report = RunReport {
            calculated_at: Utc::now(),
            options,
            run,
        };
        state.settings = draft;
        state.latest = Some(report.clone());
        Ok(report)
    }

    pub fn latest(&self) -> Result<Option<RunReport>, DkpServiceError> {
        Ok(self.state()?.latest.clone())
    }

    pub fn settings(&self) -> Result<DkpSettings, DkpServiceError> {
        Ok(self.state()?.settings.clone())
    }

    pub fn set_multipliers(&self, multipliers: Multipliers) -> Result<Multipliers, DkpServiceError> {
        self.update(SettingsKey::Multipliers, |settings| {
            settings.multipliers = multipliers;
            Ok(multipliers)
        })
    }

    pub fn add_power_range(&self, range: PowerRange) -> Result<PowerRanges, DkpServiceError> {
        self.update(SettingsKey::PowerRanges, |settings| {
            settings.power_ranges.insert(range)?;
            Ok(settings.power_ranges.clone())
        })
    }

    pub fn update_power_range(
        &self,
        index: usize,
        range: PowerRange,
    ) -> Result<PowerRanges, DkpServiceError> {
        self.update(SettingsKey::PowerRanges, |settings| {
            settings.power_ranges.update(index, range)?;
            Ok(settings.power_ranges.clone())
        })
    }

    pub fn remove_power_range(&self, index: usize) -> Result<PowerRange, DkpServiceError> {
        self.update(SettingsKey::PowerRanges, |settings| {
            Ok(settings.power_ranges.remove(index)?)
        })
    }

    pub fn replace_power_ranges(
        &self,
        ranges: Vec<PowerRange>,
    ) -> Result<PowerRanges, DkpServiceError> {
        let table = PowerRanges::new(ranges)?;
        self.update(SettingsKey::PowerRanges, |settings| {
            settings.power_ranges = table;
            Ok(settings.power_ranges.clone())
        })
    }

    pub fn set_vacation_list(&self, vacation: VacationList) -> Result<VacationList, DkpServiceError> {
        self.update(SettingsKey::VacationList, |settings| {
            settings.vacation = vacation;
            Ok(settings.vacation.clone())
        })
    }

    /// Drops every stored baseline; the next run recomputes them from the
    /// current tiers. Returns how many were cleared.
    pub fn clear_min_dkp(&self) -> Result<usize, DkpServiceError> {
        let mut state = self.state()?;
        let cleared = state.settings.min_dkp.len();
        self.store.remove(SettingsKey::MinDkp)?;
        state.settings.min_dkp.clear();
        info!(cleared, "min dkp baselines cleared");
        Ok(cleared)
    }

    /// Records a penalty. Checkpoint penalties are captured against the
    /// latest run and fail when there is none.
    pub fn add_penalty(&self, request: PenaltyRequest) -> Result<PenaltyRule, DkpServiceError> {
        let mut state = self.state()?;
        let mut draft = state.settings.clone();
        let rule = draft
            .penalties
            .add(request, state.latest.as_ref().map(|report| &report.run))?;
        draft.save(self.store.as_ref(), SettingsKey::Penalties)?;
        state.settings = draft;
        Ok(rule)
    }

    pub fn remove_penalty(
        &self,
        player_id: &str,
        index: usize,
    ) -> Result<PenaltyRule, DkpServiceError> {
        self.update(SettingsKey::Penalties, |settings| {
            Ok(settings.penalties.remove(player_id, index)?)
        })
    }

    pub fn penalties(&self) -> Result<PenaltyBook, DkpServiceError> {
        Ok(self.state()?.settings.penalties.clone())
    }

    pub fn export_settings(&self) -> Result<SettingsBundle, DkpServiceError> {
        Ok(self.state()?.settings.export())
    }

    /// Applies the sections present in `bundle`. The changed sections are
    /// persisted as one batch, so a failed write leaves store and memory on
    /// the previous settings.
    pub fn import_settings(&self, bundle: SettingsBundle) -> Result<Vec<SettingsKey>, DkpServiceError> {
        let mut state = self.state()?;
        let mut draft = state.settings.clone();
        let changed = draft.apply_bundle(bundle);
        draft.save_sections(self.store.as_ref(), &changed)?;
        state.settings = draft;
        info!(sections = changed.len(), "settings imported");
        Ok(changed)
    }

    fn update<T, F>(&self, key: SettingsKey, change: F) -> Result<T, DkpServiceError>
    where
        F: FnOnce(&mut DkpSettings) -> Result<T, DkpServiceError>,
    {
        let mut state = self.state()?;
        let mut draft = state.settings.clone();
        let outcome = change(&mut draft)?;
        draft.save(self.store.as_ref(), key)?;
        state.settings = draft;
        Ok(outcome)
    }

    fn state(&self) -> Result<MutexGuard<'_, ServiceState>, DkpServiceError> {
        self.state.lock().map_err(|_| DkpServiceError::StatePoisoned)
    }
}

/// Error raised by the DKP service.
#[derive(Debug, thiserror::Error)]
pub enum DkpServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Penalty(#[from] PenaltyError),
    #[error(transparent)]
    PowerRange(#[from] PowerRangeError),
    #[error("dkp state lock poisoned")]
    StatePoisoned,
}
