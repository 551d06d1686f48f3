use super::super::domain::round_half_up;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Gain columns whose penalties are re-applied to the fresh value every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeltaColumn {
    T4Gained,
    T5Gained,
    DeadsGained,
}

/// Columns whose penalties anchor to a value captured at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckpointColumn {
    KpGained,
    Dkp,
}

/// Result column a penalty targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PenaltyColumn {
    Delta(DeltaColumn),
    Checkpoint(CheckpointColumn),
}

impl PenaltyColumn {
    pub const ALL: [Self; 5] = [
        Self::Checkpoint(CheckpointColumn::Dkp),
        Self::Delta(DeltaColumn::T4Gained),
        Self::Delta(DeltaColumn::T5Gained),
        Self::Delta(DeltaColumn::DeadsGained),
        Self::Checkpoint(CheckpointColumn::KpGained),
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Delta(DeltaColumn::T4Gained) => "T4 gained",
            Self::Delta(DeltaColumn::T5Gained) => "T5 gained",
            Self::Delta(DeltaColumn::DeadsGained) => "Deads gained",
            Self::Checkpoint(CheckpointColumn::KpGained) => "KP gained",
            Self::Checkpoint(CheckpointColumn::Dkp) => "DKP",
        }
    }

    pub fn parse(value: &str) -> Result<Self, PenaltyParseError> {
        let wanted = value.trim();
        Self::ALL
            .into_iter()
            .find(|column| column.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| PenaltyParseError::UnknownColumn(value.to_string()))
    }

    pub const fn is_checkpoint(self) -> bool {
        matches!(self, Self::Checkpoint(_))
    }
}

impl fmt::Display for PenaltyColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<String> for PenaltyColumn {
    type Error = PenaltyParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PenaltyColumn> for String {
    fn from(column: PenaltyColumn) -> Self {
        column.label().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentKind {
    /// Scale by `1 + value`; `-0.2` removes a fifth.
    Percent,
    /// Replace outright with `value`.
    Absolute,
}

impl AdjustmentKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Percent => "percent",
            Self::Absolute => "absolute",
        }
    }

    pub fn parse(value: &str) -> Result<Self, PenaltyParseError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "percent" | "percentage" | "%" => Ok(Self::Percent),
            "absolute" | "abs" => Ok(Self::Absolute),
            _ => Err(PenaltyParseError::UnknownKind(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjustment {
    pub kind: AdjustmentKind,
    pub value: f64,
}

impl Adjustment {
    pub fn percent(value: f64) -> Self {
        Self {
            kind: AdjustmentKind::Percent,
            value,
        }
    }

    pub fn absolute(value: f64) -> Self {
        Self {
            kind: AdjustmentKind::Absolute,
            value,
        }
    }

    pub fn apply(&self, current: f64) -> f64 {
        match self.kind {
            AdjustmentKind::Percent => current * (1.0 + self.value),
            AdjustmentKind::Absolute => self.value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeltaPenalty {
    pub column: DeltaColumn,
    pub adjustment: Adjustment,
}

impl DeltaPenalty {
    /// Transforms the current gain; rounding happens once the whole rule
    /// chain for the column has run.
    pub fn apply(&self, current: f64) -> f64 {
        self.adjustment.apply(current)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckpointPenalty {
    pub column: CheckpointColumn,
    pub adjustment: Adjustment,
    pub checkpoint: i64,
    pub applied_value: i64,
}

impl CheckpointPenalty {
    /// Captures the penalty against `current`, the column's value in the
    /// latest results.
    pub fn capture(column: CheckpointColumn, adjustment: Adjustment, current: i64) -> Self {
        let applied_value = round_half_up(adjustment.apply(current as f64));
        Self {
            column,
            adjustment,
            checkpoint: current,
            applied_value,
        }
    }

    /// Penalized floor plus whatever was gained past the checkpoint.
    pub fn apply(&self, raw: i64) -> i64 {
        self.applied_value + (raw - self.checkpoint).max(0)
    }
}

/// A recorded penalty. Persisted in the flat
/// `{column, type, value, checkpoint, appliedValue}` shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PenaltyRecord", into = "PenaltyRecord")]
pub enum PenaltyRule {
    Delta(DeltaPenalty),
    Checkpoint(CheckpointPenalty),
}

impl PenaltyRule {
    pub fn column(&self) -> PenaltyColumn {
        match self {
            Self::Delta(rule) => PenaltyColumn::Delta(rule.column),
            Self::Checkpoint(rule) => PenaltyColumn::Checkpoint(rule.column),
        }
    }

    pub fn adjustment(&self) -> Adjustment {
        match self {
            Self::Delta(rule) => rule.adjustment,
            Self::Checkpoint(rule) => rule.adjustment,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PenaltyRecord {
    column: String,
    #[serde(rename = "type")]
    kind: String,
    value: f64,
    #[serde(default)]
    checkpoint: Option<f64>,
    #[serde(default, rename = "appliedValue")]
    applied_value: Option<f64>,
}

impl TryFrom<PenaltyRecord> for PenaltyRule {
    type Error = PenaltyParseError;

    fn try_from(record: PenaltyRecord) -> Result<Self, Self::Error> {
        let column = PenaltyColumn::parse(&record.column)?;
        let kind = AdjustmentKind::parse(&record.kind)?;
        if !record.value.is_finite() {
            return Err(PenaltyParseError::NonFiniteValue);
        }
        let adjustment = Adjustment {
            kind,
            value: record.value,
        };

        match column {
            PenaltyColumn::Delta(column) => Ok(Self::Delta(DeltaPenalty { column, adjustment })),
            PenaltyColumn::Checkpoint(checkpoint_column) => {
                match (record.checkpoint, record.applied_value) {
                    (Some(checkpoint), Some(applied_value)) => {
                        Ok(Self::Checkpoint(CheckpointPenalty {
                            column: checkpoint_column,
                            adjustment,
                            checkpoint: round_half_up(checkpoint),
                            applied_value: round_half_up(applied_value),
                        }))
                    }
                    _ => Err(PenaltyParseError::MissingCheckpoint(column.label())),
                }
            }
        }
    }
}

impl From<PenaltyRule> for PenaltyRecord {
    fn from(rule: PenaltyRule) -> Self {
        let adjustment = rule.adjustment();
        let (checkpoint, applied_value) = match rule {
            PenaltyRule::Delta(_) => (None, None),
            PenaltyRule::Checkpoint(rule) => (
                Some(rule.checkpoint as f64),
                Some(rule.applied_value as f64),
            ),
        };
        Self {
            column: rule.column().label().to_string(),
            kind: adjustment.kind.label().to_string(),
            value: adjustment.value,
            checkpoint,
            applied_value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PenaltyParseError {
    #[error("unknown penalty column '{0}'")]
    UnknownColumn(String),
    #[error("unknown penalty type '{0}' (expected percent or absolute)")]
    UnknownKind(String),
    #[error("penalty value must be a finite number")]
    NonFiniteValue,
    #[error("penalty on '{0}' is missing its checkpoint or applied value")]
    MissingCheckpoint(&'static str),
}
