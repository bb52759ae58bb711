use crate::cli::ServeArgs;
use crate::infra::{cors_layer, AppState};
use crate::routes::with_api_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use talent_forge::assessments::AssessmentService;
use talent_forge::auth::{
    AuthService, GoTrueIdentityProvider, IdentityProvider, MemoryIdentityProvider, TokenIssuer,
};
use talent_forge::config::AppConfig;
use talent_forge::error::AppError;
use talent_forge::store::{MemoryStore, RestStore, Store};
use talent_forge::telemetry;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let tokens = Arc::new(TokenIssuer::from_config(&config.auth));
    match config.database.clone() {
        Some(database) => {
            info!(url = %database.url, "using hosted store");
            let store = Arc::new(RestStore::new(&database)?);
            let identity = Arc::new(GoTrueIdentityProvider::new(&database)?);
            serve(config, store, identity, tokens).await
        }
        None => {
            warn!("hosted store not configured; assessments are kept in memory");
            let store = Arc::new(MemoryStore::new());
            let identity = Arc::new(MemoryIdentityProvider::from_config(&config.auth));
            serve(config, store, identity, tokens).await
        }
    }
}

async fn serve<S, I>(
    config: AppConfig,
    store: Arc<S>,
    identity: Arc<I>,
    tokens: Arc<TokenIssuer>,
) -> Result<(), AppError>
where
    S: Store + 'static,
    I: IdentityProvider + 'static,
{
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let assessments = Arc::new(AssessmentService::new(store));
    let auth = Arc::new(AuthService::new(identity, tokens.clone()));

    let app = with_api_routes(assessments, auth, tokens)
        .layer(Extension(app_state))
        .layer(cors_layer(&config.cors))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "talent forge api ready");

    axum::serve(listener, app).await?;
    Ok(())
}
