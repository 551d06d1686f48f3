//! Manually configured score adjustments.
//!
//! Delta rules rewrite a gain column every time it is recomputed. Checkpoint
//! rules capture the column once, against the latest results, and afterwards
//! only let the player accrue on top of the penalized floor.

mod book;
mod rules;

pub use book::{PenaltyBook, PenaltyEntries, PenaltyError, PenaltyRequest};
pub use rules::{
    Adjustment, AdjustmentKind, CheckpointColumn, CheckpointPenalty, DeltaColumn, DeltaPenalty,
    PenaltyColumn, PenaltyParseError, PenaltyRule,
};
