//! Service binary: config, observability, facade, HTTP server.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use stress_predictor::config::ServiceConfig;
use stress_predictor::{init_tracing, metrics, StressService};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = init_tracing() {
        eprintln!("failed to initialise tracing: {e}");
        return ExitCode::FAILURE;
    }
    if let Err(e) = metrics::init_metrics() {
        error!(error = %e, "failed to initialise metrics");
        return ExitCode::FAILURE;
    }

    let config = match std::env::args().nth(1) {
        Some(path) => {
            let path = PathBuf::from(path);
            match ServiceConfig::from_file(&path) {
                Ok(config) => {
                    info!(path = %path.display(), "configuration loaded");
                    config
                }
                Err(e) => {
                    error!(error = %e, "failed to load configuration");
                    return ExitCode::FAILURE;
                }
            }
        }
        None => ServiceConfig::default(),
    };

    let service = Arc::new(StressService::initialize(&config));
    if !service.is_ready() {
        error!("running degraded: every prediction will use the fallback response");
    }

    #[cfg(feature = "web-api")]
    {
        let server_config = stress_predictor::web_api::ServerConfig {
            host: config.server.host.clone(),
            port: config.server.port,
        };
        if let Err(e) = stress_predictor::web_api::start_server(server_config, service).await {
            error!(error = %e, "web API server failed");
            return ExitCode::FAILURE;
        }
    }

    #[cfg(not(feature = "web-api"))]
    {
        let _ = service;
        error!("built without the web-api feature; nothing to serve");
        return ExitCode::FAILURE;
    }

    #[cfg(feature = "web-api")]
    ExitCode::SUCCESS
}
