use axum::{
    extract::{Query, State},
    Json,
};
use common::types::VersionResponse;
use serde::Deserialize;

use super::AppState;
use crate::errors::JsonApiError;
use crate::observability;

/// `?target=<t>&branch=<b>`; both are checked by the service, not by the extractor,
/// so a missing one yields the JSON validation error.
#[derive(Debug, Deserialize)]
pub struct VersionQuery {
    pub target: Option<String>,
    pub branch: Option<String>,
}

/// `GET /version`: the stored value for the key.
pub async fn get_version(
    State(state): State<AppState>,
    Query(q): Query<VersionQuery>,
) -> Result<Json<VersionResponse>, JsonApiError> {
    let res = state.counter.get(q.target.as_deref(), q.branch.as_deref()).await;
    observability::record("version", &res);
    let version = res?;
    Ok(Json(VersionResponse { version: version.into_inner() }))
}

/// `GET /increment`: bump the counter and return the new value.
pub async fn increment_version(
    State(state): State<AppState>,
    Query(q): Query<VersionQuery>,
) -> Result<Json<VersionResponse>, JsonApiError> {
    let res = state.counter.increment(q.target.as_deref(), q.branch.as_deref()).await;
    observability::record("increment", &res);
    let version = res?;
    Ok(Json(VersionResponse { version: version.to_string() }))
}
