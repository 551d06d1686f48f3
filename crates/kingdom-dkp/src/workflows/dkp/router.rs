use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use super::baseline::VacationList;
use super::domain::{GainMode, Multipliers, RunOptions};
use super::penalties::{PenaltyError, PenaltyRequest};
use super::service::{DkpService, DkpServiceError, RunReport};
use super::settings::SettingsBundle;
use super::store::SettingsStore;
use super::tiers::{PowerRange, PowerRangeError};
use crate::workflows::roster::{RosterImportError, RosterImporter};

/// Body of a run request: two raw roster exports plus the run switches.
#[derive(Debug, Clone, Deserialize)]
pub struct RunRequest {
    pub start_csv: String,
    pub end_csv: String,
    #[serde(default)]
    pub mode: GainMode,
    #[serde(default)]
    pub ignore_city_hall: bool,
}

/// Router builder exposing DKP runs, settings, and penalties.
pub fn dkp_router<S>(service: Arc<DkpService<S>>) -> Router
where
    S: SettingsStore + 'static,
{
    Router::new()
        .route("/api/v1/dkp/run", post(run_handler::<S>))
        .route("/api/v1/dkp/results", get(results_handler::<S>))
        .route(
            "/api/v1/settings/multipliers",
            get(get_multipliers::<S>).put(put_multipliers::<S>),
        )
        .route(
            "/api/v1/settings/power-ranges",
            get(list_power_ranges::<S>)
                .put(replace_power_ranges::<S>)
                .post(add_power_range::<S>),
        )
        .route(
            "/api/v1/settings/power-ranges/:index",
            put(update_power_range::<S>).delete(remove_power_range::<S>),
        )
        .route(
            "/api/v1/settings/vacation",
            get(get_vacation::<S>).put(put_vacation::<S>),
        )
        .route("/api/v1/settings/min-dkp", delete(clear_min_dkp::<S>))
        .route("/api/v1/settings/export", get(export_settings::<S>))
        .route("/api/v1/settings/import", post(import_settings::<S>))
        .route(
            "/api/v1/penalties",
            get(list_penalties::<S>).post(add_penalty::<S>),
        )
        .route(
            "/api/v1/penalties/:player_id/:index",
            delete(remove_penalty::<S>),
        )
        .with_state(service)
}

pub(crate) async fn run_handler<S>(
    State(service): State<Arc<DkpService<S>>>,
    Json(request): Json<RunRequest>,
) -> Response
where
    S: SettingsStore + 'static,
{
    let parsed = RosterImporter::from_csv_str(&request.start_csv).and_then(|start| {
        RosterImporter::from_csv_str(&request.end_csv).map(|end| (start, end))
    });
    let (start, end) = match parsed {
        Ok(snapshots) => snapshots,
        Err(error) => return roster_error_response(error),
    };

    let options = RunOptions {
        mode: request.mode,
        ignore_city_hall: request.ignore_city_hall,
    };
    match service.run(&start, &end, options) {
        Ok(report) => (StatusCode::OK, Json(run_payload(&report))).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn results_handler<S>(State(service): State<Arc<DkpService<S>>>) -> Response
where
    S: SettingsStore + 'static,
{
    match service.latest() {
        Ok(Some(report)) => (StatusCode::OK, Json(run_payload(&report))).into_response(),
        Ok(None) => error_payload(StatusCode::NOT_FOUND, "no dkp results calculated yet"),
        Err(error) => service_error_response(error),
    }
}

async fn get_multipliers<S>(State(service): State<Arc<DkpService<S>>>) -> Response
where
    S: SettingsStore + 'static,
{
    respond(service.settings().map(|settings| settings.multipliers))
}

async fn put_multipliers<S>(
    State(service): State<Arc<DkpService<S>>>,
    Json(multipliers): Json<Multipliers>,
) -> Response
where
    S: SettingsStore + 'static,
{
    respond(service.set_multipliers(multipliers))
}

async fn list_power_ranges<S>(State(service): State<Arc<DkpService<S>>>) -> Response
where
    S: SettingsStore + 'static,
{
    respond(service.settings().map(|settings| settings.power_ranges))
}

async fn replace_power_ranges<S>(
    State(service): State<Arc<DkpService<S>>>,
    Json(ranges): Json<Vec<PowerRange>>,
) -> Response
where
    S: SettingsStore + 'static,
{
    respond(service.replace_power_ranges(ranges))
}

async fn add_power_range<S>(
    State(service): State<Arc<DkpService<S>>>,
    Json(range): Json<PowerRange>,
) -> Response
where
    S: SettingsStore + 'static,
{
    match service.add_power_range(range) {
        Ok(ranges) => (StatusCode::CREATED, Json(ranges)).into_response(),
        Err(error) => service_error_response(error),
    }
}

async fn update_power_range<S>(
    State(service): State<Arc<DkpService<S>>>,
    Path(index): Path<usize>,
    Json(range): Json<PowerRange>,
) -> Response
where
    S: SettingsStore + 'static,
{
    respond(service.update_power_range(index, range))
}

async fn remove_power_range<S>(
    State(service): State<Arc<DkpService<S>>>,
    Path(index): Path<usize>,
) -> Response
where
    S: SettingsStore + 'static,
{
    respond(service.remove_power_range(index))
}

async fn get_vacation<S>(State(service): State<Arc<DkpService<S>>>) -> Response
where
    S: SettingsStore + 'static,
{
    respond(service.settings().map(|settings| settings.vacation))
}

async fn put_vacation<S>(
    State(service): State<Arc<DkpService<S>>>,
    Json(ids): Json<Vec<String>>,
) -> Response
where
    S: SettingsStore + 'static,
{
    respond(service.set_vacation_list(VacationList::new(ids)))
}

async fn clear_min_dkp<S>(State(service): State<Arc<DkpService<S>>>) -> Response
where
    S: SettingsStore + 'static,
{
    respond(service.clear_min_dkp().map(|cleared| json!({ "cleared": cleared })))
}

async fn export_settings<S>(State(service): State<Arc<DkpService<S>>>) -> Response
where
    S: SettingsStore + 'static,
{
    respond(service.export_settings())
}

async fn import_settings<S>(
    State(service): State<Arc<DkpService<S>>>,
    Json(bundle): Json<SettingsBundle>,
) -> Response
where
    S: SettingsStore + 'static,
{
    respond(
        service
            .import_settings(bundle)
            .map(|keys| json!({ "imported": keys })),
    )
}

async fn list_penalties<S>(State(service): State<Arc<DkpService<S>>>) -> Response
where
    S: SettingsStore + 'static,
{
    respond(service.penalties())
}

pub(crate) async fn add_penalty<S>(
    State(service): State<Arc<DkpService<S>>>,
    Json(request): Json<PenaltyRequest>,
) -> Response
where
    S: SettingsStore + 'static,
{
    match service.add_penalty(request) {
        Ok(rule) => (StatusCode::CREATED, Json(rule)).into_response(),
        Err(error) => service_error_response(error),
    }
}

async fn remove_penalty<S>(
    State(service): State<Arc<DkpService<S>>>,
    Path((player_id, index)): Path<(String, usize)>,
) -> Response
where
    S: SettingsStore + 'static,
{
    respond(service.remove_penalty(&player_id, index))
}

fn run_payload(report: &RunReport) -> Value {
    json!({
        "calculated_at": report.calculated_at,
        "mode": report.options.mode.label(),
        "ignore_city_hall": report.options.ignore_city_hall,
        "calculated": report.run.rows.len(),
        "skipped": report.run.skipped,
        "missing_power": report.run.missing_power,
        "summary": report.run.summary(),
        "rows": report.run.rows,
    })
}

fn respond<T: serde::Serialize>(result: Result<T, DkpServiceError>) -> Response {
    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(error) => service_error_response(error),
    }
}

/// HTTP status for a service failure, shared with `AppError`.
pub(crate) fn service_error_status(error: &DkpServiceError) -> StatusCode {
    match error {
        DkpServiceError::Penalty(PenaltyError::UnknownRule { .. })
        | DkpServiceError::PowerRange(PowerRangeError::UnknownIndex(_)) => StatusCode::NOT_FOUND,
        DkpServiceError::Penalty(_) | DkpServiceError::PowerRange(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        DkpServiceError::Store(_) | DkpServiceError::StatePoisoned => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn service_error_response(error: DkpServiceError) -> Response {
    let status = service_error_status(&error);
    if status.is_server_error() {
        warn!(%error, "dkp request failed");
    }
    error_payload(status, &error.to_string())
}

fn roster_error_response(error: RosterImportError) -> Response {
    error_payload(StatusCode::BAD_REQUEST, &error.to_string())
}

fn error_payload(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
