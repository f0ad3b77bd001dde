//! Chameleon API Server
//!
//! HTTPS server exposing the arithmetic endpoints:
//!
//! - `GET {prefix}/hello` - fixed greeting
//! - `GET {prefix}/sum` - sum of two query operands
//! - `GET {prefix}/sumdb` - record the sum, answer with the number of stored sums
//! - `GET {prefix}/reset` - delete all stored sums

use axum::{routing::get, Router};
use axum_server::tls_rustls::{RustlsAcceptor, RustlsConfig};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

pub mod config;
pub mod conn_timeout;
pub mod error;
pub mod params;
pub mod request_log;
pub mod routes;
pub mod tls;

pub use config::AppConfig;
pub use error::{ApiError, ServerError};

use conn_timeout::{ConnTimeouts, DeadlineAcceptor};
use storage::SumStore;

/// Application state shared across handlers
pub struct AppState {
    /// Sum store
    pub store: SumStore,
}

impl AppState {
    pub fn new(store: SumStore) -> Self {
        Self { store }
    }
}

/// Create the application router.
///
/// Endpoints are mounted under `config.api_prefix`. Only matched routes are
/// logged and bounded by the write timeout; anything else falls through to
/// axum's 404.
pub fn create_router(state: Arc<AppState>, config: &AppConfig) -> Router {
    let api = Router::new()
        .route("/hello", get(routes::hello::hello))
        .route("/sum", get(routes::sum::sum))
        .route("/sumdb", get(routes::sumdb::sum_db))
        .route("/reset", get(routes::reset::reset));

    let api = request_log::with_request_layers(api, config.write_timeout()).with_state(state);

    Router::new().nest(&config.api_prefix, api)
}

/// Initialize logging
pub fn init_logging(level: &str, json: bool) {
    let parsed = level.parse::<Level>().ok();
    let max_level = parsed.unwrap_or(Level::INFO);

    let installed = if json {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(max_level)
            .with_target(true)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(max_level)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    };

    if installed.is_err() {
        warn!("Tracing subscriber already installed");
    } else if parsed.is_none() {
        warn!(requested = level, "Unknown log level, using INFO");
    }
}

/// Prepare the sum table and serve HTTPS until the listener fails.
pub async fn run_server(config: AppConfig) -> Result<(), ServerError> {
    let store = SumStore::new(&config.database_path);
    store.ensure_schema().await?;

    if let Some(addr) = config.metrics_addr {
        PrometheusBuilder::new().with_http_listener(addr).install()?;
        info!(%addr, "Prometheus exporter listening");
    }

    let tls = tls::load_server_config(&config.cert_path, &config.key_path)?;
    let addr = config.socket_addr()?;

    let state = Arc::new(AppState::new(store));
    let app = create_router(state, &config);

    let acceptor = RustlsAcceptor::new(RustlsConfig::from_config(tls)).acceptor(DeadlineAcceptor::new(
        ConnTimeouts {
            read: config.read_timeout(),
            idle: config.idle_timeout(),
        },
    ));
    let server = axum_server::bind(addr).acceptor(acceptor);

    info!(
        %addr,
        prefix = %config.api_prefix,
        database = %config.database_path.display(),
        "Starting API server"
    );

    server
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .map_err(ServerError::Serve)
}
