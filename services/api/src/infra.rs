use kingdom_dkp::workflows::dkp::{AdjustmentKind, GainMode, PenaltyColumn};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn parse_mode(raw: &str) -> Result<GainMode, String> {
    GainMode::parse(raw).ok_or_else(|| format!("unknown mode '{raw}' (expected default or lilithdata)"))
}

pub(crate) fn parse_penalty_column(raw: &str) -> Result<PenaltyColumn, String> {
    PenaltyColumn::parse(raw).map_err(|err| {
        let known: Vec<&str> = PenaltyColumn::ALL.iter().map(|column| column.label()).collect();
        format!("{err} (expected one of: {})", known.join(", "))
    })
}

pub(crate) fn parse_adjustment_kind(raw: &str) -> Result<AdjustmentKind, String> {
    AdjustmentKind::parse(raw).map_err(|err| err.to_string())
}
