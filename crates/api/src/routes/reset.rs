//! Reset Route

use axum::{extract::State, http::StatusCode};
use std::sync::Arc;
use tracing::info;

use crate::error::ApiError;
use crate::AppState;

/// Delete every recorded sum. Answers 204 with no body.
pub async fn reset(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    let deleted = state.store.reset_all().await?;
    info!(deleted, "Deleted recorded sums");
    Ok(StatusCode::NO_CONTENT)
}
