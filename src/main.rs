use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};

use feedcast::{build_controller, Config, Scheduler};

/// Config path: first CLI argument, then `FEEDCAST_CONFIG`, then `config.toml`.
fn config_path() -> String {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var("FEEDCAST_CONFIG").ok())
        .unwrap_or_else(|| "config.toml".to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    let path = config_path();
    let mut config = match Config::load(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {path}: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };
    config.apply_env_overrides();

    if let Err(e) = feedcast::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        feedcast::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    let controller = match build_controller(&config) {
        Ok(controller) => Arc::new(controller),
        Err(e) => {
            error!("Failed to start publisher: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!("feedcast starting with {} feed(s)", config.feeds.len());
    let scheduler = Scheduler::new(controller, &config.publisher);

    tokio::select! {
        _ = scheduler.run() => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!("Failed to listen for shutdown signal: {e}");
                return ExitCode::FAILURE;
            }
            info!("Shutdown signal received");
        }
    }

    ExitCode::SUCCESS
}
