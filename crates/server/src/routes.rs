use std::sync::Arc;

use axum::{http::StatusCode, routing::get, Json, Router};
use axum::extract::State;
use service::counter::CounterService;
use service::store::CounterStore;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{warn, Level};

use common::types::Health;

use crate::observability;

pub mod version;

/// Shared handler state: one long-lived counter service over one store handle.
#[derive(Clone)]
pub struct AppState {
    pub counter: CounterService,
}

impl AppState {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { counter: CounterService::new(store) }
    }
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Readiness: the store must answer a ping.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Health>) {
    match state.counter.store_ready().await {
        Ok(()) => (StatusCode::OK, Json(Health { status: "ok" })),
        Err(e) => {
            warn!(error = %e, "readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, Json(Health { status: "unavailable" }))
        }
    }
}

/// Build the full application router
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/version", get(version::get_version))
        .route("/increment", get(version::increment_version))
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/metrics", get(observability::metrics))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 5xx
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
