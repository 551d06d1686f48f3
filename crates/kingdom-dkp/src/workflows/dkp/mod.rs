//! Kingdom DKP scoring: snapshot joining, tiered minimum-DKP baselines,
//! penalties, persisted settings, and the HTTP surface over them.

pub mod baseline;
pub mod domain;
pub mod engine;
pub mod penalties;
pub mod router;
pub mod service;
pub mod settings;
pub mod store;
pub mod tiers;

#[cfg(test)]
mod tests;

pub use baseline::{MinDkpMap, VacationList};
pub use domain::{
    round_half_up, DkpRun, GainMode, Multipliers, PlayerSnapshotRow, PlayerStatus, ResultRow,
    RunOptions,
};
pub use engine::{DkpEngine, DkpInputs, CITY_HALL_THRESHOLD};
pub use penalties::{
    Adjustment, AdjustmentKind, CheckpointColumn, CheckpointPenalty, DeltaColumn, DeltaPenalty,
    PenaltyBook, PenaltyColumn, PenaltyError, PenaltyRequest, PenaltyRule,
};
pub use router::{dkp_router, RunRequest};
pub use service::{DkpService, DkpServiceError, RunReport};
pub use settings::{DkpSettings, SettingsBundle};
pub use store::{
    InMemorySettingsStore, JsonFileSettingsStore, SettingsKey, SettingsStore, StoreError,
};
pub use tiers::{
    resolve_min_dkp_percentage, PowerRange, PowerRangeError, PowerRanges,
    FALLBACK_MIN_DKP_PERCENTAGE,
};
