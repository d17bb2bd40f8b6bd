use pr_reviewer_assignment::config::Config;
use pr_reviewer_assignment::server;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("[server] Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                log::info!("[server] Shutdown signal received");
                signal_token.cancel();
            }
            Err(e) => log::error!("[server] Failed to listen for shutdown signal: {}", e),
        }
    });

    match server::run(config, shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("[server] {}", e);
            ExitCode::FAILURE
        }
    }
}
