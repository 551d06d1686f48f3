use super::baseline::{MinDkpMap, VacationList};
use super::domain::{
    round_half_up, round_to_places, DkpRun, GainMode, Multipliers, PlayerSnapshotRow,
    PlayerStatus, ResultRow, RunOptions,
};
use super::penalties::{CheckpointColumn, DeltaColumn, PenaltyBook};
use super::tiers::PowerRanges;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Players below this city-hall level in both scans are not scored.
pub const CITY_HALL_THRESHOLD: f64 = 25.0;

/// Read-only configuration consumed by a run.
#[derive(Debug, Clone, Copy)]
pub struct DkpInputs<'a> {
    pub multipliers: &'a Multipliers,
    pub power_ranges: &'a PowerRanges,
    pub vacation: &'a VacationList,
    pub penalties: &'a PenaltyBook,
}

/// Scores two roster scans against the configured tiers and penalties.
///
/// The only state a run writes is the baseline map handed to [`DkpEngine::run`].
pub struct DkpEngine<'a> {
    inputs: DkpInputs<'a>,
}

impl<'a> DkpEngine<'a> {
    pub fn new(inputs: DkpInputs<'a>) -> Self {
        Self { inputs }
    }

    pub fn run(
        &self,
        start: &[PlayerSnapshotRow],
        end: &[PlayerSnapshotRow],
        baselines: &mut MinDkpMap,
        options: RunOptions,
    ) -> DkpRun {
        let joined = JoinedSnapshots::new(start, end);
        let eligible: Vec<&str> = if options.ignore_city_hall {
            joined.ids.clone()
        } else {
            joined
                .ids
                .iter()
                .copied()
                .filter(|id| joined.meets_city_hall(id))
                .collect()
        };
        let skipped = joined.ids.len() - eligible.len();
        if skipped > 0 {
            info!(skipped, "skipped players below city hall {CITY_HALL_THRESHOLD}");
        }

        let missing_power = self.assign_baselines(&joined, &eligible, baselines);
        let baselines: &MinDkpMap = baselines;

        let mut rows: Vec<ResultRow> = eligible
            .iter()
            .map(|id| self.score_player(id, &joined, baselines, options.mode))
            .collect();
        rows.sort_by(|left, right| right.dkp.cmp(&left.dkp));

        info!(
            rows = rows.len(),
            skipped,
            mode = options.mode.label(),
            "dkp run complete"
        );

        DkpRun {
            rows,
            skipped,
            missing_power,
        }
    }

    /// Seeds a baseline for every eligible player that has none yet. Returns
    /// the players with no usable power in either scan.
    fn assign_baselines(
        &self,
        joined: &JoinedSnapshots<'_>,
        eligible: &[&str],
        baselines: &mut MinDkpMap,
    ) -> Vec<String> {
        let mut missing = Vec::new();
        for id in eligible {
            if baselines.contains(id) {
                continue;
            }
            let power = joined
                .start(id)
                .and_then(|row| row.power)
                .or_else(|| joined.end(id).and_then(|row| row.power));
            let Some(power) = power else {
                warn!(player_id = %id, "no power for player, skipping min dkp baseline");
                missing.push(id.to_string());
                continue;
            };
            let min_dkp = self.inputs.power_ranges.min_dkp_for(power);
            baselines.insert_if_absent(id, min_dkp);
            debug!(player_id = %id, power, min_dkp, "assigned min dkp baseline");
        }
        missing
    }

    fn score_player(
        &self,
        id: &str,
        joined: &JoinedSnapshots<'_>,
        baselines: &MinDkpMap,
        mode: GainMode,
    ) -> ResultRow {
        let start = joined.start(id);
        let end = joined.end(id);
        let penalties = self.inputs.penalties;

        let name = end
            .and_then(|row| row.name.clone())
            .or_else(|| start.and_then(|row| row.name.clone()))
            .unwrap_or_else(|| "Missing".to_string());
        let power = end
            .and_then(|row| row.power)
            .or_else(|| start.and_then(|row| row.power))
            .unwrap_or(0.0);

        let gains = RawGains::between(start, end, mode);

        let t4_gained = penalties.apply_delta(id, DeltaColumn::T4Gained, round_half_up(gains.t4));
        let t5_gained = penalties.apply_delta(id, DeltaColumn::T5Gained, round_half_up(gains.t5));
        let deads_gained =
            penalties.apply_delta(id, DeltaColumn::DeadsGained, round_half_up(gains.deaths));

        let dkp_raw = self.inputs.multipliers.weigh(t4_gained, t5_gained, deads_gained);
        let dkp = penalties.apply_checkpoint(id, CheckpointColumn::Dkp, dkp_raw);
        let kp_gained = penalties.apply_checkpoint(
            id,
            CheckpointColumn::KpGained,
            round_half_up(gains.killpoints),
        );

        let min_dkp = baselines
            .get(id)
            .unwrap_or_else(|| self.inputs.power_ranges.min_dkp_for(power));
        let dkp_percent = if min_dkp != 0 {
            round_to_places(dkp as f64 / min_dkp as f64, 4)
        } else {
            0.0
        };

        let status = if start.and_then(|row| row.power).is_none() {
            PlayerStatus::MissingInStart
        } else if end.and_then(|row| row.power).is_none() {
            PlayerStatus::MissingInNew
        } else {
            PlayerStatus::Ok
        };

        let mut row = ResultRow {
            id: id.to_string(),
            name,
            power,
            kp_gained,
            t4_gained,
            t5_gained,
            deads_gained,
            min_dkp,
            dkp,
            dkp_percent,
            vacation: self.inputs.vacation.contains(id),
            status,
            t4_kills: start.map(|row| row.t4_kills).unwrap_or(0.0),
            t5_kills: start.map(|row| row.t5_kills).unwrap_or(0.0),
            killpoints: start.map(|row| row.killpoints).unwrap_or(0.0),
            deads: start.map(PlayerSnapshotRow::deaths).unwrap_or(0.0),
            power_diff: round_half_up(
                end.and_then(|row| row.power).unwrap_or(0.0)
                    - start.and_then(|row| row.power).unwrap_or(0.0),
            ),
            acclaim: end.map(|row| row.acclaim).unwrap_or(0.0),
        };

        if !status.is_ok() {
            row.zero_stats();
        }
        row
    }
}

/// ID-indexed view over both scans. IDs keep first-appearance order, start
/// scan first, which is the order ties keep after ranking.
struct JoinedSnapshots<'a> {
    start: HashMap<&'a str, &'a PlayerSnapshotRow>,
    end: HashMap<&'a str, &'a PlayerSnapshotRow>,
    ids: Vec<&'a str>,
}

impl<'a> JoinedSnapshots<'a> {
    fn new(start: &'a [PlayerSnapshotRow], end: &'a [PlayerSnapshotRow]) -> Self {
        let mut ids = Vec::new();
        let mut seen = HashSet::new();
        let start = index_rows(start, &mut ids, &mut seen);
        let end = index_rows(end, &mut ids, &mut seen);
        Self { start, end, ids }
    }

    fn start(&self, id: &str) -> Option<&'a PlayerSnapshotRow> {
        self.start.get(id).copied()
    }

    fn end(&self, id: &str) -> Option<&'a PlayerSnapshotRow> {
        self.end.get(id).copied()
    }

    fn meets_city_hall(&self, id: &str) -> bool {
        let qualifies = |row: Option<&PlayerSnapshotRow>| {
            row.and_then(|row| row.city_hall)
                .map(|level| level >= CITY_HALL_THRESHOLD)
                .unwrap_or(false)
        };
        qualifies(self.start(id)) || qualifies(self.end(id))
    }
}

fn index_rows<'a>(
    rows: &'a [PlayerSnapshotRow],
    ids: &mut Vec<&'a str>,
    seen: &mut HashSet<&'a str>,
) -> HashMap<&'a str, &'a PlayerSnapshotRow> {
    let mut index = HashMap::with_capacity(rows.len());
    for row in rows {
        let id = row.id.trim();
        if id.is_empty() {
            continue;
        }
        if seen.insert(id) {
            ids.push(id);
        }
        index.insert(id, row);
    }
    index
}

struct RawGains {
    t4: f64,
    t5: f64,
    deaths: f64,
    killpoints: f64,
}

impl RawGains {
    fn between(
        start: Option<&PlayerSnapshotRow>,
        end: Option<&PlayerSnapshotRow>,
        mode: GainMode,
    ) -> Self {
        let end_value = |pick: fn(&PlayerSnapshotRow) -> f64| end.map(pick).unwrap_or(0.0);
        let start_value = |pick: fn(&PlayerSnapshotRow) -> f64| start.map(pick).unwrap_or(0.0);
        let gain = |pick: fn(&PlayerSnapshotRow) -> f64| match mode {
            GainMode::Default => end_value(pick) - start_value(pick),
            GainMode::LilithData => end_value(pick),
        };

        // Lilith exports carry per-period deaths only in the tier columns.
        let deaths = match mode {
            GainMode::Default => gain(PlayerSnapshotRow::deaths),
            GainMode::LilithData => end_value(PlayerSnapshotRow::tier_death_total),
        };

        Self {
            t4: gain(|row| row.t4_kills),
            t5: gain(|row| row.t5_kills),
            deaths,
            killpoints: gain(|row| row.killpoints),
        }
    }
}
