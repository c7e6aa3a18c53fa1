//! Athena API
//!
//! REST entry point for the contract intelligence platform.
//! Handles:
//! - JWT authentication and scope checks
//! - CRUD and finder routes for every domain resource
//! - Rate limiting
//! - Observability (logging, metrics, health probes)

mod handlers;
mod middleware;
mod routes;

use athena_common::{
    auth::JwtManager,
    cache::Cache,
    config::AppConfig,
    errors::{AppError, Result},
    metrics::{self, LATENCY_BUCKETS, LLM_BUCKETS},
    VERSION,
};
use athena_core::{DbPool, Services};
use axum::extract::FromRef;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DbPool,
    pub services: Arc<Services>,
    pub jwt: Arc<JwtManager>,
    /// Absent when Redis was unreachable at startup
    pub cache: Option<Arc<Cache>>,
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, db: DbPool, cache: Option<Arc<Cache>>) -> Result<Self> {
        let secret = config
            .auth
            .jwt_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::Configuration {
                message: "auth.jwt_secret is not set".to_string(),
            })?;

        Ok(Self {
            jwt: Arc::new(JwtManager::new(secret, config.auth.jwt_expiration_secs)),
            services: Arc::new(Services::new(db.clone())),
            config,
            db,
            cache,
            prometheus: None,
        })
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}

impl FromRef<AppState> for Arc<JwtManager> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

/// Lets handlers extract a single service with `State<XService>`
macro_rules! service_state {
    ($($field:ident => $service:ty),* $(,)?) => {
        $(
            impl FromRef<AppState> for $service {
                fn from_ref(state: &AppState) -> Self {
                    state.services.$field.clone()
                }
            }
        )*
    };
}

service_state! {
    agencies => athena_core::services::AgencyService,
    alerts => athena_core::services::AlertService,
    attachments => athena_core::services::AttachmentService,
    awards => athena_core::services::AwardService,
    competitor_intel => athena_core::services::CompetitorIntelService,
    contacts => athena_core::services::ContactService,
    contract_vehicles => athena_core::services::ContractVehicleService,
    historical_data => athena_core::services::HistoricalDataService,
    naics => athena_core::services::NaicsService,
    notice_types => athena_core::services::NoticeTypeService,
    opportunities => athena_core::services::OpportunityService,
    opportunity_scores => athena_core::services::OpportunityScoreService,
    organizations => athena_core::services::OrganizationService,
    saved_searches => athena_core::services::SavedSearchService,
    set_asides => athena_core::services::SetAsideService,
    sync_logs => athena_core::services::SyncLogService,
    teams => athena_core::services::TeamService,
    team_members => athena_core::services::TeamMemberService,
    users => athena_core::services::UserService,
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    init_tracing(&config);
    info!(service = %config.observability.service_name, "Starting Athena API v{}", VERSION);

    let config = Arc::new(config);

    let prometheus = if config.observability.metrics_enabled {
        Some(install_prometheus()?)
    } else {
        None
    };
    metrics::register_metrics();

    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;
    if config.database.run_migrations {
        db.run_migrations().await?;
    }

    info!("Connecting to Redis...");
    let cache = match Cache::new(&config.redis).await {
        Ok(cache) => Some(Arc::new(cache)),
        Err(e) => {
            warn!(error = %e, "Redis unavailable, readiness will report it down");
            None
        }
    };

    let mut state = AppState::new(config.clone(), db, cache)?;
    if let Some(handle) = prometheus {
        state = state.with_prometheus(handle);
    }

    let app = routes::create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn install_prometheus() -> std::result::Result<PrometheusHandle, Box<dyn std::error::Error>> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Suffix("request_duration_seconds".to_string()), LATENCY_BUCKETS)?
        .set_buckets_for_metric(Matcher::Suffix("llm_duration_seconds".to_string()), LLM_BUCKETS)?
        .install_recorder()?;
    Ok(handle)
}

/// `RUST_LOG` wins over the configured level
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.observability.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
