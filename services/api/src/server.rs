use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_dkp_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use kingdom_dkp::config::AppConfig;
use kingdom_dkp::error::AppError;
use kingdom_dkp::telemetry;
use kingdom_dkp::workflows::dkp::{DkpService, JsonFileSettingsStore};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs, settings: Option<PathBuf>) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(path) = settings {
        config.storage.settings_path = path;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(JsonFileSettingsStore::new(&config.storage.settings_path));
    let dkp_service = Arc::new(DkpService::load(store)?);

    let app = with_dkp_routes(dkp_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        settings = %config.storage.settings_path.display(),
        "kingdom dkp service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
