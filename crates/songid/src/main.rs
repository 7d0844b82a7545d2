mod config;
mod covers;
mod logging;
mod recognizer;
mod signal;

use std::sync::Arc;
use std::time::Duration;

use config::{config_path, load_config, ConfigError, LogLevel};
use covers::HttpCovers;
use metadata::LoftyTagStore;
use pipeline::{Pipeline, TokioClock};
use recognizer::HttpRecognizer;
use reqwest::Client;
use signal::SignalNotifier;
use tracing::{error, info, warn};

const HTTP_TIMEOUT: Duration = Duration::from_secs(20);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut logging = logging::init(LogLevel::Info);

    let config_path = config_path(std::env::args().nth(1));
    let config = load_config(&config_path)?;
    logging.apply(config.log_level()?);
    info!(
        "Loaded config from {:?}; watching {} folder(s)",
        config_path,
        config.monitored_paths.len()
    );

    let client = Client::builder()
        .user_agent(concat!("songid/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let recognizer = HttpRecognizer::new(
        client.clone(),
        config.recognizer_endpoint.trim(),
        config.recognizer_timeout(),
    );
    let pipeline = Pipeline::new(
        Arc::new(recognizer),
        Arc::new(LoftyTagStore),
        Arc::new(HttpCovers::new(client.clone(), HTTP_TIMEOUT)),
        Arc::new(SignalNotifier::new(client, HTTP_TIMEOUT)),
    );

    let reload = || {
        let config = load_config(&config_path)?;
        logging.apply(config.log_level()?);
        Ok::<_, ConfigError>(config.to_cycle_settings())
    };

    let clock = TokioClock;
    tokio::select! {
        err = pipeline.run(&clock, reload) => {
            error!("Stopping: {}", err);
            Err(err.into())
        }
        _ = shutdown_signal() => Ok(()),
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = match signal(SignalKind::terminate()) {
            Ok(signal) => signal,
            Err(err) => {
                warn!("Failed to install terminate signal handler: {}", err);
                if let Err(err) = tokio::signal::ctrl_c().await {
                    warn!("Failed to listen for ctrl-c: {}", err);
                }
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {}", err);
        }
    }

    info!("Shutdown signal received.");
}
