//! Sum Route

use axum::response::Response;

use super::plain_text;
use crate::error::ApiError;
use crate::params::Operands;

/// Add the two query operands and return the decimal result.
pub async fn sum(Operands { a, b }: Operands) -> Result<Response, ApiError> {
    let total = a.checked_add(b).ok_or(ApiError::Overflow { a, b })?;
    Ok(plain_text(total.to_string()))
}
