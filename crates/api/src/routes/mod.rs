//! Endpoint handlers

pub mod hello;
pub mod reset;
pub mod sum;
pub mod sumdb;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::error::TEXT_PLAIN_UTF8;

/// 200 response with a plain-text body
pub(crate) fn plain_text(body: String) -> Response {
    (StatusCode::OK, [(header::CONTENT_TYPE, TEXT_PLAIN_UTF8)], body).into_response()
}
