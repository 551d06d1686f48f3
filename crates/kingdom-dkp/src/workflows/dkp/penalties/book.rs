use super::rules::{
    Adjustment, AdjustmentKind, CheckpointColumn, CheckpointPenalty, DeltaColumn, DeltaPenalty,
    PenaltyColumn, PenaltyRule,
};
use super::super::domain::{round_half_up, DkpRun};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Request to record a new penalty for a player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenaltyRequest {
    pub player_id: String,
    pub column: PenaltyColumn,
    #[serde(rename = "type")]
    pub kind: AdjustmentKind,
    pub value: f64,
}

impl PenaltyRequest {
    pub fn adjustment(&self) -> Adjustment {
        Adjustment {
            kind: self.kind,
            value: self.value,
        }
    }
}

/// Ordered penalty rules per player ID.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, PenaltyEntries>",
    into = "BTreeMap<String, Vec<PenaltyRule>>"
)]
pub struct PenaltyBook {
    rules: BTreeMap<String, Vec<PenaltyRule>>,
}

/// Stored penalty entries: a list, or the older single-rule object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PenaltyEntries {
    Many(Vec<PenaltyRule>),
    One(PenaltyRule),
}

impl PenaltyBook {
    pub fn rules_for(&self, player_id: &str) -> &[PenaltyRule] {
        self.rules
            .get(player_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PenaltyRule])> {
        self.rules
            .iter()
            .map(|(id, rules)| (id.as_str(), rules.as_slice()))
    }

    pub fn player_count(&self) -> usize {
        self.rules.len()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Runs every delta rule recorded for `column`, in insertion order, and
    /// rounds the outcome.
    pub fn apply_delta(&self, player_id: &str, column: DeltaColumn, value: i64) -> i64 {
        let mut matched = false;
        let adjusted = self
            .rules_for(player_id)
            .iter()
            .filter_map(|rule| match rule {
                PenaltyRule::Delta(rule) if rule.column == column => Some(rule),
                _ => None,
            })
            .fold(value as f64, |current, rule| {
                matched = true;
                rule.apply(current)
            });

        if matched {
            round_half_up(adjusted)
        } else {
            value
        }
    }

    /// Replays the first checkpoint rule recorded for `column`.
    pub fn apply_checkpoint(&self, player_id: &str, column: CheckpointColumn, raw: i64) -> i64 {
        self.rules_for(player_id)
            .iter()
            .find_map(|rule| match rule {
                PenaltyRule::Checkpoint(rule) if rule.column == column => Some(rule.apply(raw)),
                _ => None,
            })
            .unwrap_or(raw)
    }

    /// Records a new rule.
    ///
    /// Checkpoint rules capture the column's value from `latest`, so they
    /// need a completed run that includes the player.
    pub fn add(
        &mut self,
        request: PenaltyRequest,
        latest: Option<&DkpRun>,
    ) -> Result<PenaltyRule, PenaltyError> {
        let player_id = request.player_id.trim().to_string();
        if player_id.is_empty() {
            return Err(PenaltyError::BlankPlayer);
        }
        if !request.value.is_finite() {
            return Err(PenaltyError::NonFiniteValue);
        }

        let adjustment = request.adjustment();
        let rule = match request.column {
            PenaltyColumn::Delta(column) => PenaltyRule::Delta(DeltaPenalty { column, adjustment }),
            PenaltyColumn::Checkpoint(column) => {
                let run = latest.ok_or(PenaltyError::ResultsRequired)?;
                let row = run
                    .find(&player_id)
                    .ok_or_else(|| PenaltyError::PlayerNotInResults(player_id.clone()))?;
                let current = match column {
                    CheckpointColumn::Dkp => row.dkp,
                    CheckpointColumn::KpGained => row.kp_gained,
                };
                PenaltyRule::Checkpoint(CheckpointPenalty::capture(column, adjustment, current))
            }
        };

        self.rules.entry(player_id).or_default().push(rule);
        Ok(rule)
    }

    /// Removes the rule at `index`; a player with no rules left is dropped.
    pub fn remove(&mut self, player_id: &str, index: usize) -> Result<PenaltyRule, PenaltyError> {
        let unknown = || PenaltyError::UnknownRule {
            player_id: player_id.to_string(),
            index,
        };
        let rules = self.rules.get_mut(player_id).ok_or_else(unknown)?;
        if index >= rules.len() {
            return Err(unknown());
        }
        let removed = rules.remove(index);
        if rules.is_empty() {
            self.rules.remove(player_id);
        }
        Ok(removed)
    }

    pub fn clear(&mut self) {
        self.rules.clear();
    }
}

impl From<BTreeMap<String, PenaltyEntries>> for PenaltyBook {
    fn from(raw: BTreeMap<String, PenaltyEntries>) -> Self {
        let rules = raw
            .into_iter()
            .map(|(id, entries)| {
                let rules = match entries {
                    PenaltyEntries::Many(rules) => rules,
                    PenaltyEntries::One(rule) => vec![rule],
                };
                (id.trim().to_string(), rules)
            })
            .filter(|(id, rules)| !id.is_empty() && !rules.is_empty())
            .collect();
        Self { rules }
    }
}

impl From<PenaltyBook> for BTreeMap<String, Vec<PenaltyRule>> {
    fn from(book: PenaltyBook) -> Self {
        book.rules
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PenaltyError {
    #[error("penalty requires a player ID")]
    BlankPlayer,
    #[error("penalty value must be a finite number")]
    NonFiniteValue,
    #[error("run DKP once before adding checkpoint penalties")]
    ResultsRequired,
    #[error("player {0} not found in the latest results")]
    PlayerNotInResults(String),
    #[error("player {player_id} has no penalty at index {index}")]
    UnknownRule { player_id: String, index: usize },
}
