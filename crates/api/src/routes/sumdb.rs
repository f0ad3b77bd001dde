//! Persisted Sum Route

use axum::{extract::State, response::Response};
use std::sync::Arc;

use super::plain_text;
use crate::error::ApiError;
use crate::params::Operands;
use crate::AppState;

/// Record the sum of the two query operands and return how many sums are
/// stored now.
pub async fn sum_db(
    State(state): State<Arc<AppState>>,
    Operands { a, b }: Operands,
) -> Result<Response, ApiError> {
    let count = state.store.record_sum(a, b).await?;
    Ok(plain_text(count.to_string()))
}
