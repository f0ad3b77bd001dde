//! Request Logging Middleware
//!
//! Logs every routed request before and after the handler runs, and feeds
//! request counters and latencies into the `metrics` facade.

use axum::{
    extract::{ConnectInfo, OriginalUri, Request},
    middleware::{self, Next},
    response::Response,
    Router,
};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tower_http::timeout::TimeoutLayer;
use tracing::info;

/// Bound every route of `router` by `write_timeout` and log it.
///
/// Logging sits outside the timeout so requests cut off by it still get a
/// completion line and metrics.
pub fn with_request_layers<S>(router: Router<S>, write_timeout: Duration) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .route_layer(TimeoutLayer::new(write_timeout))
        .route_layer(middleware::from_fn(log_request))
}

/// Wrap a handler with start/finish logging. The response is passed through
/// untouched.
pub async fn log_request(req: Request, next: Next) -> Response {
    let started = Instant::now();

    let protocol = req.version();
    let remote = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());
    let method = req.method().clone();
    let uri = req
        .extensions()
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri.clone())
        .unwrap_or_else(|| req.uri().clone());

    info!(?protocol, %remote, %method, %uri, "Request received");

    let response = next.run(req).await;

    let elapsed = started.elapsed();
    let status = response.status().as_u16();
    info!(?protocol, %remote, %method, %uri, status, ?elapsed, "Request processed");

    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .record(elapsed.as_secs_f64());

    response
}
