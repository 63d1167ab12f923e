use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};
use service::errors::ServiceError;

// Prometheus metrics (default registry)
pub static REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "version_counter_requests_total",
        "Counter requests by endpoint and outcome",
        &["endpoint", "outcome"]
    )
    .expect("register requests_total")
});

pub static STORE_ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "version_counter_store_errors_total",
        "Store failures by operation",
        &["operation"]
    )
    .expect("register store_errors_total")
});

fn outcome(err: &ServiceError) -> &'static str {
    match err {
        ServiceError::Validation(_) => "invalid",
        ServiceError::NotFound(_) => "not_found",
        ServiceError::CorruptState { .. } => "corrupt",
        ServiceError::StoreUnavailable(_) => "store_error",
    }
}

/// Count one request against `endpoint`.
pub fn record<T>(endpoint: &str, res: &Result<T, ServiceError>) {
    match res {
        Ok(_) => REQUESTS_TOTAL.with_label_values(&[endpoint, "ok"]).inc(),
        Err(e) => {
            REQUESTS_TOTAL.with_label_values(&[endpoint, outcome(e)]).inc();
            if matches!(e, ServiceError::StoreUnavailable(_)) {
                STORE_ERRORS_TOTAL.with_label_values(&[endpoint]).inc();
            }
        }
    }
}

pub fn encode_metrics() -> (StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (StatusCode::INTERNAL_SERVER_ERROR, format!("metrics encode error: {e}"));
    }
    (StatusCode::OK, String::from_utf8(buffer).unwrap_or_default())
}

pub async fn metrics() -> impl IntoResponse {
    let (status, body) = encode_metrics();
    (status, [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body)
}
