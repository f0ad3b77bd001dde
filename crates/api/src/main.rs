//! Chameleon API - Main Entry Point

use api::{init_logging, run_server, AppConfig};
use tracing::{error, info};

/// Exit status for any startup or serving failure
const EXIT_FAILURE: i32 = 7;

#[tokio::main]
async fn main() {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(EXIT_FAILURE);
        }
    };

    init_logging(&config.log_level, config.log_json);

    info!("=== Chameleon API v{} ===", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run_server(config).await {
        error!(error = %e, "Server stopped");
        std::process::exit(EXIT_FAILURE);
    }
}
