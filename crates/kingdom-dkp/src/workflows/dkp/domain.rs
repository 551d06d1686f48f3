use serde::{Deserialize, Serialize};

/// One player's row in a roster snapshot, after header normalization.
///
/// Cumulative counters default to zero when a scan omits them; `power`,
/// `deads`, and `city_hall` stay optional because their absence carries
/// meaning for status and eligibility.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSnapshotRow {
    pub id: String,
    pub name: Option<String>,
    pub power: Option<f64>,
    pub killpoints: f64,
    pub t4_kills: f64,
    pub t5_kills: f64,
    pub deads: Option<f64>,
    pub tier_deaths: [f64; 5],
    pub city_hall: Option<f64>,
    pub acclaim: f64,
}

impl PlayerSnapshotRow {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_power(mut self, power: f64) -> Self {
        self.power = Some(power);
        self
    }

    pub fn with_city_hall(mut self, level: f64) -> Self {
        self.city_hall = Some(level);
        self
    }

    pub fn with_kills(mut self, t4_kills: f64, t5_kills: f64) -> Self {
        self.t4_kills = t4_kills;
        self.t5_kills = t5_kills;
        self
    }

    pub fn with_deads(mut self, deads: f64) -> Self {
        self.deads = Some(deads);
        self
    }

    pub fn with_killpoints(mut self, killpoints: f64) -> Self {
        self.killpoints = killpoints;
        self
    }

    /// Total deaths: the `Deads` column when the scan has one, otherwise the
    /// per-tier death columns summed.
    pub fn deaths(&self) -> f64 {
        self.deads.unwrap_or_else(|| self.tier_death_total())
    }

    /// T1..T5 Deaths summed, ignoring any `Deads` column.
    pub fn tier_death_total(&self) -> f64 {
        self.tier_deaths.iter().copied().sum()
    }
}

/// Convention used to turn two scans into per-player gains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GainMode {
    /// Gains are the end scan minus the start scan.
    #[default]
    Default,
    /// The end scan already holds per-period gains.
    LilithData,
}

impl GainMode {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::LilithData => "lilithdata",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "default" | "delta" => Some(Self::Default),
            "lilithdata" | "lilith" | "cumulative" => Some(Self::LilithData),
            _ => None,
        }
    }
}

/// Caller-supplied switches for a single engine run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    pub mode: GainMode,
    pub ignore_city_hall: bool,
}

/// Per-unit point weights applied to the final gains.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Multipliers {
    pub t4: f64,
    pub t5: f64,
    pub deads: f64,
}

impl Multipliers {
    pub fn weigh(&self, t4_gained: i64, t5_gained: i64, deads_gained: i64) -> i64 {
        round_half_up(
            t4_gained as f64 * self.t4 + t5_gained as f64 * self.t5 + deads_gained as f64 * self.deads,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "missing in start")]
    MissingInStart,
    #[serde(rename = "missing in new")]
    MissingInNew,
}

impl PlayerStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::MissingInStart => "missing in start",
            Self::MissingInNew => "missing in new",
        }
    }

    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Ranked engine output for one eligible player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Power")]
    pub power: f64,
    #[serde(rename = "KP gained")]
    pub kp_gained: i64,
    #[serde(rename = "T4 gained")]
    pub t4_gained: i64,
    #[serde(rename = "T5 gained")]
    pub t5_gained: i64,
    #[serde(rename = "Deads gained")]
    pub deads_gained: i64,
    #[serde(rename = "Min DKP")]
    pub min_dkp: i64,
    #[serde(rename = "DKP")]
    pub dkp: i64,
    #[serde(rename = "DKP%")]
    pub dkp_percent: f64,
    #[serde(rename = "Vacation", with = "yes_no")]
    pub vacation: bool,
    #[serde(rename = "Status")]
    pub status: PlayerStatus,
    #[serde(rename = "T4 Kills")]
    pub t4_kills: f64,
    #[serde(rename = "T5 Kills")]
    pub t5_kills: f64,
    #[serde(rename = "Killpoints")]
    pub killpoints: f64,
    #[serde(rename = "Deads")]
    pub deads: f64,
    #[serde(rename = "Power diff")]
    pub power_diff: i64,
    #[serde(rename = "Acclaim")]
    pub acclaim: f64,
}

impl ResultRow {
    /// Clears every computed figure; identity, power, status and vacation survive.
    pub(crate) fn zero_stats(&mut self) {
        self.kp_gained = 0;
        self.t4_gained = 0;
        self.t5_gained = 0;
        self.deads_gained = 0;
        self.min_dkp = 0;
        self.dkp = 0;
        self.dkp_percent = 0.0;
        self.t4_kills = 0.0;
        self.t5_kills = 0.0;
        self.killpoints = 0.0;
        self.deads = 0.0;
        self.power_diff = 0;
        self.acclaim = 0.0;
    }
}

/// Complete output of one engine invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DkpRun {
    pub rows: Vec<ResultRow>,
    /// Players dropped by the city-hall gate.
    pub skipped: usize,
    /// Players for whom no power value existed to seed a baseline.
    pub missing_power: Vec<String>,
}

impl DkpRun {
    pub fn find(&self, player_id: &str) -> Option<&ResultRow> {
        self.rows.iter().find(|row| row.id == player_id)
    }

    pub fn summary(&self) -> String {
        format!(
            "Calculated {} rows (skipped {} due to CH<25).",
            self.rows.len(),
            self.skipped
        )
    }
}

/// Rounds halves toward positive infinity, the convention the stored
/// baselines and checkpoints were produced with.
pub fn round_half_up(value: f64) -> i64 {
    if value.is_finite() {
        (value + 0.5).floor() as i64
    } else {
        0
    }
}

pub(crate) fn round_to_places(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    let scaled = (value * factor + 0.5).floor() / factor;
    if scaled.is_finite() {
        scaled
    } else {
        0.0
    }
}

mod yes_no {
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(if *value { "YES" } else { "NO" })
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.trim().eq_ignore_ascii_case("yes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_half_up_matches_stored_convention() {
        assert_eq!(round_half_up(2.5), 3);
        assert_eq!(round_half_up(-2.5), -2);
        assert_eq!(round_half_up(-2.6), -3);
        assert_eq!(round_half_up(f64::NAN), 0);
    }

    #[test]
    fn deaths_fall_back_to_tier_columns() {
        let mut row = PlayerSnapshotRow::new("7");
        row.tier_deaths = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(row.deaths(), 15.0);

        let row = row.with_deads(40.0);
        assert_eq!(row.deaths(), 40.0);
        assert_eq!(row.tier_death_total(), 15.0);
    }

    #[test]
    fn result_row_serializes_with_report_headers() {
        let row = ResultRow {
            id: "1".to_string(),
            name: "Alpha".to_string(),
            power: 2100.0,
            kp_gained: 5,
            t4_gained: 30,
            t5_gained: 0,
            deads_gained: 0,
            min_dkp: 1000,
            dkp: 30,
            dkp_percent: 0.03,
            vacation: true,
            status: PlayerStatus::MissingInNew,
            t4_kills: 100.0,
            t5_kills: 0.0,
            killpoints: 0.0,
            deads: 0.0,
            power_diff: 100,
            acclaim: 0.0,
        };

        let value = serde_json::to_value(&row).expect("serialize row");
        assert_eq!(value["Vacation"], "YES");
        assert_eq!(value["Status"], "missing in new");
        assert_eq!(value["DKP%"], 0.03);
        assert_eq!(value["Min DKP"], 1000);
    }

    #[test]
    fn gain_mode_parses_labels() {
        assert_eq!(GainMode::parse(" LilithData "), Some(GainMode::LilithData));
        assert_eq!(GainMode::parse("default"), Some(GainMode::Default));
        assert_eq!(GainMode::parse("weekly"), None);
        assert_eq!(
            serde_json::to_value(GainMode::LilithData).expect("serialize mode"),
            "lilithdata"
        );
    }
}
