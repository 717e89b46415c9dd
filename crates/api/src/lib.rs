//! Student Risk API Server
//!
//! REST API serving dropout/graduate predictions for stored demo students.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

pub mod config;
pub mod error;
pub mod routes;

use crate::config::{LoggingConfig, ServiceConfig};
use crate::error::api_error;
use feature_engine::{ArtifactCache, FeatureRowBuilder, TransformFitter};
use inference_engine::{load_classifier, InferenceEngine};
use storage::{load_enrolled_students, LoadOutcome, StudentRepository};

/// Application state shared across handlers
pub struct AppState {
    /// Student storage
    pub repository: StudentRepository,
    pub engine: InferenceEngine,
    pub row_builder: FeatureRowBuilder,
    /// Prometheus exposition
    pub metrics: PrometheusHandle,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: Instant,
}

impl AppState {
    pub fn new(repository: StudentRepository, engine: InferenceEngine, metrics: PrometheusHandle) -> Self {
        Self {
            repository,
            engine,
            row_builder: FeatureRowBuilder::new(),
            metrics,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
        }
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub student_count: usize,
    /// Empty until the fitted artifacts exist
    pub classes: Vec<String>,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/students", get(routes::students::list_students))
        .route(
            "/api/v1/students/:id/predict",
            post(routes::predictions::predict_student),
        )
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> axum::response::Response {
    let student_count = match state.repository.count().await {
        Ok(count) => count,
        Err(e) => {
            return api_error(
                StatusCode::SERVICE_UNAVAILABLE,
                &format!("storage unavailable: {}", e),
            )
        }
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        student_count,
        classes: state.engine.class_names().unwrap_or_default(),
    })
    .into_response()
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Initialize logging
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let level: Level = config
        .level
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid log level {:?}", config.level))?;

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

/// Install the global Prometheus recorder
pub fn install_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics recorder: {}", e))?;
    Ok(handle)
}

/// Load the classifier and fit the transforms. Either failing means the
/// service cannot serve.
pub fn build_engine(config: &ServiceConfig) -> anyhow::Result<InferenceEngine> {
    let classifier = load_classifier(&config.model.weights_path)?;

    let cache = ArtifactCache::from_dataset(
        config.data.dataset_path.clone(),
        config.data.outlier_filter(),
        TransformFitter::new(config.data.fitter_config()),
    );
    let engine = InferenceEngine::new(classifier, Arc::new(cache))?;

    let classes = engine.warm_up()?;
    info!("Inference engine ready, classes {:?}", classes);
    Ok(engine)
}

/// Run the server
pub async fn run_server(config: ServiceConfig) -> anyhow::Result<()> {
    let metrics = install_metrics()?;
    let repository = StudentRepository::connect(&config.database.url).await?;
    let engine = build_engine(&config)?;

    let state = Arc::new(AppState::new(repository, engine, metrics));
    let app = create_router(state);

    info!("Starting API server on {}", config.server.addr);

    let listener = tokio::net::TcpListener::bind(&config.server.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

/// Seed the student table from the dataset
pub async fn load_students(config: &ServiceConfig, force: bool) -> anyhow::Result<LoadOutcome> {
    let repository = StudentRepository::connect(&config.database.url).await?;
    let options = config.loader.options(&config.data.excluded_label, force);
    let outcome = load_enrolled_students(&repository, &config.data.dataset_path, &options).await?;
    Ok(outcome)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
