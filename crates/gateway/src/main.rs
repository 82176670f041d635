//! MathForge API Gateway
//!
//! The HTTP surface over the tutoring pipeline.
//! Handles:
//! - The chat endpoint
//! - Rate limiting
//! - Request routing
//! - Observability (logging, metrics, tracing)

mod handlers;
mod middleware;

use anyhow::Context;
use axum::{
    extract::Request,
    middleware::Next,
    routing::{get, post},
    Router,
};
use mathforge_common::{
    config::AppConfig,
    metrics::{self, EXPLANATION_BUCKETS, LATENCY_BUCKETS},
    ConversationOrchestrator,
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{signal, sync::oneshot};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tutor: Arc<ConversationOrchestrator>,
    pub metrics: Option<PrometheusHandle>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config);

    info!(
        service = %config.observability.service_name,
        "Starting MathForge API Gateway v{}",
        mathforge_common::VERSION
    );

    let config = Arc::new(config);

    // Initialize metrics
    let metrics = if config.observability.metrics_enabled {
        let handle = install_metrics_recorder()?;
        metrics::register_metrics();
        Some(handle)
    } else {
        None
    };

    let tutor = ConversationOrchestrator::from_config(&config)
        .context("Failed to build tutoring pipeline")?;
    info!(
        explainer = tutor.explainer_provider(),
        max_turns = config.session.max_turns,
        "Tutoring pipeline ready"
    );

    // Create app state
    let state = AppState {
        config: config.clone(),
        tutor: Arc::new(tutor),
        metrics,
    };

    // Build the router
    let app = create_router(state)?;

    // Start the server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server.host / server.port")?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // In-flight requests get `shutdown_timeout_secs` to drain after the signal
    let (signalled_tx, signalled_rx) = oneshot::channel();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(signalled_tx))
        .into_future();
    let drain_limit = config.shutdown_timeout();

    tokio::select! {
        result = server => result?,
        _ = drain_deadline(signalled_rx, drain_limit) => {
            warn!(
                timeout_secs = drain_limit.as_secs(),
                "Graceful shutdown timed out, dropping open connections"
            );
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

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

fn install_metrics_recorder() -> anyhow::Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Suffix("request_duration_seconds".to_string()),
            LATENCY_BUCKETS,
        )?
        .set_buckets_for_metric(
            Matcher::Suffix("explanation_duration_seconds".to_string()),
            EXPLANATION_BUCKETS,
        )?
        .install_recorder()
        .context("Failed to install Prometheus recorder")
}

/// Create the main application router
fn create_router(state: AppState) -> mathforge_common::Result<Router> {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let api_routes = Router::new()
        .route("/chat", post(handlers::chat::chat))
        .layer(TimeoutLayer::new(state.config.request_timeout()));

    let mut app = Router::new()
        // Health and metrics endpoints (never rate limited)
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .route("/metrics", get(handlers::health::metrics));

    let rate_limit = &state.config.rate_limit;
    if rate_limit.enabled {
        let limiter =
            middleware::rate_limit::create_rate_limiter(rate_limit.requests_per_second, rate_limit.burst)?;
        let limit = rate_limit.requests_per_second;
        app = app.merge(api_routes.layer(axum::middleware::from_fn(
            move |request: Request, next: Next| {
                middleware::rate_limit::rate_limit_middleware(request, next, limiter.clone(), limit)
            },
        )));
    } else {
        warn!("Rate limiting disabled");
        app = app.merge(api_routes);
    }

    // Compose the app
    Ok(app
        .layer(axum::middleware::from_fn(middleware::track_requests))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state))
}

/// Resolves `limit` after the shutdown signal fired
async fn drain_deadline(signalled: oneshot::Receiver<()>, limit: std::time::Duration) {
    if signalled.await.is_err() {
        std::future::pending::<()>().await;
    }
    tokio::time::sleep(limit).await;
}

/// Graceful shutdown signal handler
async fn shutdown_signal(signalled: oneshot::Sender<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
    let _ = signalled.send(());
}
