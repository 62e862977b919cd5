use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use rust_decimal::Decimal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod auth;
mod config;
mod db;
mod metrics;
mod models;
mod services;
mod utils;

use crate::auth::rate_limit::RateLimiter;
use crate::config::AppConfig;
use crate::db::Database;
use crate::services::click::ClickService;
use crate::services::commission::CommissionService;
use crate::services::notification::Notifier;
use crate::services::payment::PaymentGateway;
use crate::services::withdrawal::WithdrawalService;

pub struct AppState {
    pub config: AppConfig,
    pub db: Database,
    pub click_service: Arc<ClickService>,
    pub commission_service: Arc<CommissionService>,
    pub withdrawal_service: Arc<WithdrawalService>,
    pub notifier: Arc<Notifier>,
    pub payment_gateway: Arc<PaymentGateway>,
    pub click_limiter: Arc<RateLimiter>,
    pub metrics_handle: PrometheusHandle,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = AppConfig::load()?;

    tracing::info!("Starting storefront backend v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.environment);

    // Install Prometheus recorder before anything emits metrics
    let metrics_handle = metrics::init_metrics();

    // Initialize database (runs migrations)
    let db = Database::connect(&config.database_url).await?;
    tracing::info!("Database connected");

    // Core services
    let click_service = Arc::new(ClickService::new(
        db.pool.clone(),
        config.click_dedup_hours,
        config.click_retention_days,
    ));
    let commission_service = Arc::new(CommissionService::new(db.pool.clone()));
    let withdrawal_service = Arc::new(WithdrawalService::new(
        db.pool.clone(),
        Decimal::from(config.min_withdrawal),
    ));
    tracing::info!(
        "Affiliate services initialized (min withdrawal: {}, click dedup: {}h, retention: {}d)",
        config.min_withdrawal,
        config.click_dedup_hours,
        config.click_retention_days
    );

    // External collaborators
    let notifier = Arc::new(Notifier::new(
        &config.mail_relay_url,
        &config.mail_from,
        &config.admin_email,
    ));
    if config.mail_relay_url.is_empty() {
        tracing::warn!("Mail relay not configured; notifications disabled");
    }
    let payment_gateway = Arc::new(PaymentGateway::new(
        &config.payment_api_url,
        &config.payment_key_id,
        &config.payment_key_secret,
        &config.currency,
    ));
    tracing::info!("Payment gateway: {} ({})", config.payment_api_url, config.currency);

    // Rate limiter for the public click endpoint
    let click_limiter = Arc::new(RateLimiter::new(
        config.click_rate_limit_per_minute,
        Duration::from_secs(60),
    ));

    // Click-log reaper: deletes events past their retention window
    let reaper_service = click_service.clone();
    let reaper_interval = config.click_reaper_interval_secs;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(reaper_interval));
        loop {
            interval.tick().await;
            match reaper_service.purge_expired().await {
                Ok(0) => {}
                Ok(n) => tracing::info!("Click-log reaper deleted {} expired events", n),
                Err(e) => tracing::error!("Click-log reaper failed: {}", e),
            }
        }
    });
    tracing::info!("Click-log reaper started (every {}s)", reaper_interval);

    // Rate-limiter window eviction
    let limiter_for_cleanup = click_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(120));
        loop {
            interval.tick().await;
            limiter_for_cleanup.evict_expired();
        }
    });

    let port = config.port;

    // Build application state
    let state = Arc::new(AppState {
        config,
        db,
        click_service,
        commission_service,
        withdrawal_service,
        notifier,
        payment_gateway,
        click_limiter,
        metrics_handle,
    });

    // Build router
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(render_metrics))
        .nest("/api/v1", api::routes::create_router(state.clone()))
        .layer(axum::middleware::from_fn(
            api::middleware::metrics::metrics_middleware,
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}

async fn render_metrics(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
) -> String {
    state.metrics_handle.render()
}
