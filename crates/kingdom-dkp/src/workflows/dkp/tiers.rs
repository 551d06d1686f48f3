use super::domain::round_half_up;
use serde::{Deserialize, Serialize};

/// Minimum-DKP percentage used when no configured range covers a power value.
pub const FALLBACK_MIN_DKP_PERCENTAGE: f64 = 0.6;

/// Half-open power bracket: `min_power` inclusive, `max_power` exclusive,
/// unbounded above when `max_power` is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerRange {
    pub min_power: i64,
    pub max_power: Option<i64>,
    pub percentage: f64,
}

impl PowerRange {
    pub fn new(min_power: i64, max_power: Option<i64>, percentage: f64) -> Self {
        Self {
            min_power,
            max_power,
            percentage,
        }
    }

    pub fn contains(&self, power: f64) -> bool {
        let min = self.min_power as f64;
        match self.max_power {
            None => power >= min,
            Some(max) => power >= min && power < max as f64,
        }
    }

    pub fn validate(&self) -> Result<(), PowerRangeError> {
        if !self.percentage.is_finite() {
            return Err(PowerRangeError::NonFinitePercentage);
        }
        if let Some(max) = self.max_power {
            if max <= self.min_power {
                return Err(PowerRangeError::EmptyRange {
                    min_power: self.min_power,
                    max_power: max,
                });
            }
        }
        Ok(())
    }
}

/// Returns the percentage of the first range containing `power`.
///
/// Ranges are consulted in the order given; callers keep them sorted by
/// `min_power` so overlaps resolve toward the lower bracket.
pub fn resolve_min_dkp_percentage(power: f64, ranges: &[PowerRange]) -> f64 {
    ranges
        .iter()
        .find(|range| range.contains(power))
        .map(|range| range.percentage)
        .unwrap_or(FALLBACK_MIN_DKP_PERCENTAGE)
}

/// Power-tier table kept sorted ascending by `min_power`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PowerRange>", into = "Vec<PowerRange>")]
pub struct PowerRanges {
    ranges: Vec<PowerRange>,
}

impl PowerRanges {
    pub fn new(ranges: Vec<PowerRange>) -> Result<Self, PowerRangeError> {
        for range in &ranges {
            range.validate()?;
        }
        let mut table = Self { ranges };
        table.sort();
        Ok(table)
    }

    pub fn as_slice(&self) -> &[PowerRange] {
        &self.ranges
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PowerRange> {
        self.ranges.iter()
    }

    pub fn resolve(&self, power: f64) -> f64 {
        resolve_min_dkp_percentage(power, &self.ranges)
    }

    /// Minimum DKP implied by the tier table at `power`.
    pub fn min_dkp_for(&self, power: f64) -> i64 {
        round_half_up(power * self.resolve(power))
    }

    pub fn insert(&mut self, range: PowerRange) -> Result<(), PowerRangeError> {
        range.validate()?;
        self.ranges.push(range);
        self.sort();
        Ok(())
    }

    pub fn update(&mut self, index: usize, range: PowerRange) -> Result<(), PowerRangeError> {
        range.validate()?;
        let slot = self
            .ranges
            .get_mut(index)
            .ok_or(PowerRangeError::UnknownIndex(index))?;
        *slot = range;
        self.sort();
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<PowerRange, PowerRangeError> {
        if index >= self.ranges.len() {
            return Err(PowerRangeError::UnknownIndex(index));
        }
        Ok(self.ranges.remove(index))
    }

    fn sort(&mut self) {
        self.ranges.sort_by_key(|range| range.min_power);
    }
}

impl TryFrom<Vec<PowerRange>> for PowerRanges {
    type Error = PowerRangeError;

    fn try_from(ranges: Vec<PowerRange>) -> Result<Self, Self::Error> {
        Self::new(ranges)
    }
}

impl From<PowerRanges> for Vec<PowerRange> {
    fn from(table: PowerRanges) -> Self {
        table.ranges
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PowerRangeError {
    #[error("percentage must be a finite number (e.g. 0.6)")]
    NonFinitePercentage,
    #[error("max power {max_power} must be greater than min power {min_power}")]
    EmptyRange { min_power: i64, max_power: i64 },
    #[error("no power range at index {0}")]
    UnknownIndex(usize),
}
