//! Greeting Route

use axum::response::Response;

use super::plain_text;

pub const GREETING: &str = "Hello Chameleon";

/// Always answers with the greeting; query parameters are ignored.
pub async fn hello() -> Response {
    plain_text(GREETING.to_string())
}
